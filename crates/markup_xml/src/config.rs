use crate::driver::sink::ProcessingOrder;
use crate::errors::Error;
use serde::Deserialize;
use std::str::FromStr;

/// Flavour of the markup language being parsed
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    #[default]
    Xml,
    Html,
}

impl Dialect {
    /// Compares two tag names the way this dialect does: exact in XML, ASCII case-insensitive in
    /// HTML
    pub fn names_match(&self, a: &str, b: &str) -> bool {
        match self {
            Dialect::Xml => a == b,
            Dialect::Html => a.eq_ignore_ascii_case(b),
        }
    }
}

/// DtdContext defines which production of the DTD grammar is the entry point. Every context but
/// `MarkupDecl` starts lexing inside a markup declaration.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DtdContext {
    /// A complete DTD: declarations, comments, conditional sections
    #[default]
    MarkupDecl,
    /// The content model of an element declaration, e.g. `(a, b*)`
    ElementContentSpec,
    /// The body of an attribute list declaration, e.g. `id ID #REQUIRED`
    AttributeList,
    /// An attribute default value
    AttributeValue,
    /// A single attribute declaration
    AttributeDecl,
    /// The value part of an entity declaration
    EntityDeclContent,
    /// An enumerated attribute type, e.g. `(yes|no)`
    EnumeratedType,
}

impl FromStr for DtdContext {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let context = match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "markup_decl" | "dtd" => DtdContext::MarkupDecl,
            "element_content_spec" => DtdContext::ElementContentSpec,
            "attribute_list" => DtdContext::AttributeList,
            "attribute_value" => DtdContext::AttributeValue,
            "attribute_decl" => DtdContext::AttributeDecl,
            "entity_decl_content" => DtdContext::EntityDeclContent,
            "enumerated_type" => DtdContext::EnumeratedType,
            _ => return Err(Error::UnknownContext(s.to_string())),
        };

        Ok(context)
    }
}

/// ParserConfig holds the configuration for a parse and the driver run that follows it
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    /// Markup flavour of the source
    pub dialect: Dialect,
    /// When set, the source is parsed as DTD text starting at the given production
    pub dtd_context: Option<DtdContext>,
    /// Optional source filename or url
    pub source: Option<String>,
    /// Events the builder driver emits
    pub processing_order: ProcessingOrder,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            dialect: Dialect::Xml,
            dtd_context: None,
            source: None,
            processing_order: ProcessingOrder::TagsAndAttributesAndTexts,
        }
    }
}

impl ParserConfig {
    /// Loads a configuration from its JSON representation. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, Error> {
        let config: ParserConfig = serde_json::from_str(json)?;
        if config.dialect == Dialect::Html && config.dtd_context.is_some() {
            return Err(Error::Config(
                "html dialect cannot be combined with a dtd context".into(),
            ));
        }

        Ok(config)
    }
}
