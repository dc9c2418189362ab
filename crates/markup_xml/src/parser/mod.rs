use crate::config::{Dialect, DtdContext};
use crate::lexer::state::LexerMode;
use crate::lexer::token::TokenKind;
use crate::lexer::tokenize;
use crate::syntax::{NodeKind, SyntaxTree};
use crate::tree_builder::{Marker, TreeBuilder};

mod content_spec;
mod document;
mod dtd;
pub mod reparse;
mod tag;

/// Maximum number of open tags. Deeper nesting is not parsed into nested tags anymore.
pub const BALANCING_DEPTH_THRESHOLD: usize = 1000;

/// Recursive descent parser for XML, HTML and DTD text. It drives a `TreeBuilder` and never fails;
/// malformed input ends up as error nodes in the tree.
pub struct MarkupParser<'src> {
    pub(crate) p: TreeBuilder<'src>,
    /// Names of the currently open tags, innermost last
    tag_names: Vec<String>,
    /// Set once the depth guard has been hit, so the warning is only logged once per parse
    depth_warned: bool,
}

impl<'src> MarkupParser<'src> {
    pub fn new(source: &'src str, mode: LexerMode, dialect: Dialect) -> Self {
        let tokens = tokenize(source, mode);
        log::trace!("lexed {} tokens in {:?} mode", tokens.len(), mode);

        Self {
            p: TreeBuilder::new(source, tokens, dialect),
            tag_names: Vec::new(),
            depth_warned: false,
        }
    }

    pub fn finish(self) -> SyntaxTree {
        self.p.finish()
    }

    fn dialect(&self) -> Dialect {
        self.p.dialect()
    }

    fn is_html(&self) -> bool {
        self.dialect() == Dialect::Html
    }

    fn token(&self) -> Option<TokenKind> {
        self.p.current_token_kind()
    }

    fn at(&self, kind: TokenKind) -> bool {
        self.token() == Some(kind)
    }

    fn token_text(&self) -> &'src str {
        self.p.current_token_text()
    }

    fn advance(&mut self) {
        self.p.advance();
    }

    fn eof(&self) -> bool {
        self.p.eof()
    }

    fn mark(&mut self) -> Marker {
        self.p.mark()
    }

    fn error(&mut self, message: &str) {
        self.p.error(message);
    }

    fn error_token(&mut self, message: &str) {
        self.p.error_token(message);
    }

    /// Consumes the current token when it has the given kind
    fn eat(&mut self, kind: TokenKind) -> bool {
        if self.at(kind) {
            self.advance();
            return true;
        }
        false
    }

    /// Consumes the current token when it has the given kind, otherwise adds the error
    fn expect(&mut self, kind: TokenKind, message: &str) -> bool {
        if self.eat(kind) {
            return true;
        }
        self.error(message);
        false
    }
}

/// Parses an XML document
pub fn parse_xml_like(source: &str) -> SyntaxTree {
    parse_markup(source, LexerMode::Xml, Dialect::Xml)
}

/// Parses an HTML document. The grammar is the one used for XML, with a more tolerant lexer and
/// HTML element rules.
pub fn parse_html_like(source: &str) -> SyntaxTree {
    parse_markup(source, LexerMode::Html, Dialect::Html)
}

fn parse_markup(source: &str, mode: LexerMode, dialect: Dialect) -> SyntaxTree {
    let mut parser = MarkupParser::new(source, mode, dialect);
    parser
        .p
        .set_custom_reparse_comparator(reparse::reparse_tag_by_name);
    parser.parse_document();
    parser.finish()
}

/// Parses DTD text, starting at the production selected by the context
pub fn parse_dtd(source: &str, context: DtdContext) -> SyntaxTree {
    let mode = match context {
        DtdContext::MarkupDecl => LexerMode::Dtd,
        _ => LexerMode::DtdDeclaration,
    };

    let mut parser = MarkupParser::new(source, mode, Dialect::Xml);
    let root = parser.mark();
    parser.parse_dtd_context(context);

    if !parser.eof() {
        let garbage = parser.mark();
        while !parser.eof() {
            parser.advance();
        }
        garbage.close_as_error(&mut parser.p, "Unexpected tokens");
    }

    root.close_as(&mut parser.p, NodeKind::MarkupDecl);
    parser.finish()
}
