//! Error tolerant parser for XML, HTML and DTD text.
//!
//! The parser never fails. Every source produces a lossless [`SyntaxTree`]: all tokens of the
//! input are leaves of the tree and malformed input shows up as error nodes. A [`BuilderDriver`]
//! walks a finished tree and reports tags, attributes and text to an [`EventSink`].
use crate::config::ParserConfig;

pub mod config;
pub mod driver;
pub mod entities;
pub mod errors;
pub mod lexer;
pub mod parser;
pub mod syntax;
pub mod tree_builder;
pub mod walker;

pub use driver::sink::{Event, EventCollector, EventSink, ProcessingOrder};
pub use driver::{drive_builder, BuilderDriver};
pub use parser::reparse::reparse_tag_by_name;
pub use parser::{parse_dtd, parse_html_like, parse_xml_like};
pub use syntax::{NodeKind, SyntaxElement, SyntaxTree, ThreeState};

/// Parses the source the way the configuration asks for: as DTD text when a DTD context is set,
/// otherwise as a document of the configured dialect
pub fn parse_with_config(source: &str, config: &ParserConfig) -> SyntaxTree {
    if let Some(name) = &config.source {
        log::debug!("parsing {name}");
    }

    match (config.dtd_context, config.dialect) {
        (Some(context), _) => parse_dtd(source, context),
        (None, config::Dialect::Xml) => parse_xml_like(source),
        (None, config::Dialect::Html) => parse_html_like(source),
    }
}
