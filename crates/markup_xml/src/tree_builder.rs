//! Marker based tree building
//!
//! The parser never creates nodes directly. It opens markers on the token stream and closes them
//! with a node kind once a production is complete. Opening and closing is recorded in a flat
//! production list, which `finish` turns into a `SyntaxTree` in one pass.
use crate::config::Dialect;
use crate::lexer::token::{Token, TokenKind};
use crate::syntax::{NodeKind, ReparseComparator, SyntaxElement, SyntaxNode, SyntaxTree};
use markup_shared::location::TextRange;
use markup_shared::node::{NodeId, TokenId};

#[derive(Clone, Debug, PartialEq, Eq)]
enum MarkerState {
    Open,
    Closed {
        kind: NodeKind,
        error: Option<String>,
        /// Token index the node ends on (exclusive)
        end: usize,
    },
    Dropped,
}

#[derive(Clone, Debug)]
struct MarkerData {
    /// Token index of the first significant token inside the marker
    start: usize,
    state: MarkerState,
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum Production {
    Open(usize),
    Close(usize),
    /// Zero width error in front of the given token index
    Error { at: usize, message: String },
}

/// Handle of an open marker. Every marker must be consumed by exactly one of its terminal
/// operations.
#[must_use = "markers must be closed, dropped or rolled back"]
#[derive(Debug, PartialEq, Eq)]
pub struct Marker {
    id: usize,
}

impl Marker {
    /// Closes the marker as a node of the given kind
    pub fn close_as(self, p: &mut TreeBuilder, kind: NodeKind) {
        p.close(self.id, kind, None, p.pos);
    }

    /// Closes the marker as an error node carrying the given message
    pub fn close_as_error(self, p: &mut TreeBuilder, message: &str) {
        p.close(self.id, NodeKind::Error, Some(message.to_string()), p.pos);
    }

    /// Closes the marker in front of `before`, which must have been opened after this marker and
    /// must still be open. Everything from `before` onwards ends up after the closed node. With a
    /// message, a zero width error is added as the last child of the closed node.
    pub fn close_before(
        self,
        p: &mut TreeBuilder,
        before: &Marker,
        kind: NodeKind,
        message: Option<&str>,
    ) {
        if p.markers[self.id].state != MarkerState::Open {
            log::warn!("close_before on marker {} which is not open", self.id);
            return;
        }
        let Some(idx) = p.open_index(before.id) else {
            log::warn!("close_before on a marker that is not open");
            p.close(self.id, kind, None, p.pos);
            return;
        };

        let start = p.markers[self.id].start;
        let mut end = p.markers[before.id].start;
        while end > start && p.tokens[end - 1].kind.is_trivia() {
            end -= 1;
        }

        p.productions.insert(idx, Production::Close(self.id));
        if let Some(message) = message {
            p.productions.insert(
                idx,
                Production::Error {
                    at: end,
                    message: message.to_string(),
                },
            );
        }
        p.markers[self.id].state = MarkerState::Closed {
            kind,
            error: None,
            end,
        };
    }

    /// Forgets the marker. The tokens it covered stay in the tree, owned by the enclosing node.
    pub fn drop(self, p: &mut TreeBuilder) {
        if let Some(idx) = p.open_index(self.id) {
            p.productions.remove(idx);
        }
        p.markers[self.id].state = MarkerState::Dropped;
    }

    /// Forgets the marker and everything recorded since it was opened, and moves the token
    /// position back to where the marker started
    pub fn rollback(self, p: &mut TreeBuilder) {
        let Some(idx) = p.open_index(self.id) else {
            return;
        };

        for production in p.productions.drain(idx..) {
            if let Production::Open(id) = production {
                p.markers[id].state = MarkerState::Dropped;
            }
        }
        p.markers[self.id].state = MarkerState::Dropped;
        p.pos = p.markers[self.id].start;
    }
}

/// Cursor over the token vector plus the production list of the tree under construction
pub struct TreeBuilder<'src> {
    source: &'src str,
    tokens: Vec<Token>,
    /// Index of the next token to consume. Trivia in front of it has not been consumed yet.
    pos: usize,
    markers: Vec<MarkerData>,
    productions: Vec<Production>,
    dialect: Dialect,
    comparator: Option<ReparseComparator>,
}

impl<'src> TreeBuilder<'src> {
    pub fn new(source: &'src str, tokens: Vec<Token>, dialect: Dialect) -> Self {
        Self {
            source,
            tokens,
            pos: 0,
            markers: Vec::new(),
            productions: Vec::new(),
            dialect,
            comparator: None,
        }
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Index of the next significant token
    fn current_index(&self) -> usize {
        let mut idx = self.pos;
        while idx < self.tokens.len() && self.tokens[idx].kind.is_trivia() {
            idx += 1;
        }
        idx
    }

    /// Kind of the current token, trivia skipped. `None` at the end of the input.
    pub fn current_token_kind(&self) -> Option<TokenKind> {
        self.tokens.get(self.current_index()).map(|t| t.kind)
    }

    /// Raw text of the current token, or an empty string at the end of the input
    pub fn current_token_text(&self) -> &'src str {
        self.tokens
            .get(self.current_index())
            .map_or("", |t| t.text(self.source))
    }

    /// Consumes the current token together with the trivia in front of it
    pub fn advance(&mut self) {
        let idx = self.current_index();
        if idx < self.tokens.len() {
            self.pos = idx + 1;
        }
    }

    pub fn eof(&self) -> bool {
        self.current_index() >= self.tokens.len()
    }

    /// Looks back from the current token, trivia included. `lookback(1)` is the token directly in
    /// front of the current one.
    pub fn lookback(&self, offset: usize) -> Option<TokenKind> {
        let idx = self.current_index().checked_sub(offset)?;
        self.tokens.get(idx).map(|t| t.kind)
    }

    /// Gives the current token a different kind
    pub fn remap_current_token(&mut self, kind: TokenKind) {
        let idx = self.current_index();
        if let Some(token) = self.tokens.get_mut(idx) {
            token.kind = kind;
        }
    }

    /// Registers the comparator that is handed over to the finished tree
    pub fn set_custom_reparse_comparator(&mut self, comparator: ReparseComparator) {
        self.comparator = Some(comparator);
    }

    /// Opens a new marker on the current token
    pub fn mark(&mut self) -> Marker {
        let id = self.markers.len();
        self.markers.push(MarkerData {
            start: self.current_index(),
            state: MarkerState::Open,
        });
        self.productions.push(Production::Open(id));

        Marker { id }
    }

    /// Adds a zero width error node directly after the last consumed token
    pub fn error(&mut self, message: &str) {
        if let Some(Production::Error { at, message: last }) = self.productions.last() {
            if *at == self.pos && last == message {
                return;
            }
        }

        self.productions.push(Production::Error {
            at: self.pos,
            message: message.to_string(),
        });
    }

    /// Consumes the current token wrapped in an error node
    pub fn error_token(&mut self, message: &str) {
        let m = self.mark();
        self.advance();
        m.close_as_error(self, message);
    }

    fn open_index(&self, id: usize) -> Option<usize> {
        self.productions
            .iter()
            .rposition(|p| *p == Production::Open(id))
    }

    fn close(&mut self, id: usize, kind: NodeKind, error: Option<String>, end: usize) {
        if self.markers[id].state != MarkerState::Open {
            log::warn!("closing marker {id} which is not open");
            return;
        }

        self.markers[id].state = MarkerState::Closed { kind, error, end };
        self.productions.push(Production::Close(id));
    }

    /// Materializes the production list into a syntax tree. The first opened marker becomes the
    /// root and receives every token not claimed by an inner node.
    pub fn finish(self) -> SyntaxTree {
        let mut materializer = Materializer {
            tokens: &self.tokens,
            source_len: self.source.len(),
            nodes: Vec::new(),
            stack: Vec::new(),
            cursor: 0,
            root: None,
        };

        for production in &self.productions {
            match production {
                Production::Open(id) => {
                    let marker = &self.markers[*id];
                    match &marker.state {
                        MarkerState::Closed { kind, error, .. } => {
                            materializer.open(marker.start, *kind, error.clone());
                        }
                        _ => log::warn!("marker {id} was never closed"),
                    }
                }
                Production::Close(id) => {
                    if let MarkerState::Closed { end, .. } = self.markers[*id].state {
                        materializer.close(end);
                    }
                }
                Production::Error { at, message } => materializer.error(*at, message),
            }
        }

        while !materializer.stack.is_empty() {
            materializer.close(self.tokens.len());
        }

        let root = match materializer.root {
            Some(root) => root,
            None => {
                // nothing was ever closed: wrap all tokens into an empty document
                materializer.open(0, NodeKind::Document, None);
                materializer.close(self.tokens.len());
                materializer.root.unwrap_or_default()
            }
        };

        let nodes = materializer.nodes;
        SyntaxTree::new(
            self.source.to_string(),
            self.tokens,
            nodes,
            root,
            self.dialect,
            self.comparator,
        )
    }
}

struct PendingNode {
    kind: NodeKind,
    error: Option<String>,
    start: usize,
    children: Vec<SyntaxElement>,
}

struct Materializer<'a> {
    tokens: &'a [Token],
    source_len: usize,
    nodes: Vec<SyntaxNode>,
    stack: Vec<PendingNode>,
    /// Index of the first token that has not been placed in the tree yet
    cursor: usize,
    root: Option<NodeId>,
}

impl Materializer<'_> {
    fn offset(&self, idx: usize) -> usize {
        self.tokens.get(idx).map_or(self.source_len, |t| t.range.start)
    }

    fn flush_tokens(&mut self, until: usize) {
        let until = until.min(self.tokens.len());
        if let Some(top) = self.stack.last_mut() {
            while self.cursor < until {
                top.children
                    .push(SyntaxElement::Token(TokenId::from(self.cursor)));
                self.cursor += 1;
            }
        }
    }

    fn open(&mut self, start: usize, kind: NodeKind, error: Option<String>) {
        let start = if self.stack.is_empty() {
            self.cursor
        } else {
            start.max(self.cursor)
        };
        self.flush_tokens(start);
        self.stack.push(PendingNode {
            kind,
            error,
            start,
            children: Vec::new(),
        });
    }

    fn close(&mut self, end: usize) {
        let end = if self.stack.len() == 1 {
            self.tokens.len()
        } else {
            end.max(self.cursor)
        };
        self.flush_tokens(end);

        let Some(pending) = self.stack.pop() else {
            return;
        };

        let start_offset = self.offset(pending.start);
        let end_offset = if end > pending.start {
            self.tokens
                .get(end - 1)
                .map_or(self.source_len, |t| t.range.end)
        } else {
            start_offset
        };

        let id = NodeId::from(self.nodes.len());
        self.nodes.push(SyntaxNode {
            kind: pending.kind,
            range: TextRange::new(start_offset, end_offset),
            children: pending.children,
            error: pending.error,
        });

        match self.stack.last_mut() {
            Some(parent) => parent.children.push(SyntaxElement::Node(id)),
            None => self.root = self.root.or(Some(id)),
        }
    }

    fn error(&mut self, at: usize, message: &str) {
        if self.stack.is_empty() {
            return;
        }

        self.flush_tokens(at);
        let offset = self.offset(self.cursor);
        let id = NodeId::from(self.nodes.len());
        self.nodes.push(SyntaxNode {
            kind: NodeKind::Error,
            range: TextRange::empty(offset),
            children: Vec::new(),
            error: Some(message.to_string()),
        });
        if let Some(parent) = self.stack.last_mut() {
            parent.children.push(SyntaxElement::Node(id));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::state::LexerMode;
    use crate::lexer::tokenize;

    fn builder(source: &str) -> TreeBuilder<'_> {
        TreeBuilder::new(source, tokenize(source, LexerMode::Xml), Dialect::Xml)
    }

    #[test]
    fn cursor_skips_trivia() {
        let mut p = builder("<a  b>");
        assert_eq!(p.current_token_kind(), Some(TokenKind::StartTagStart));
        p.advance();
        p.advance();
        assert_eq!(p.current_token_kind(), Some(TokenKind::Name));
        assert_eq!(p.current_token_text(), "b");
        assert_eq!(p.lookback(1), Some(TokenKind::Whitespace));
        assert_eq!(p.lookback(2), Some(TokenKind::Name));
        p.advance();
        p.advance();
        assert!(p.eof());
        assert_eq!(p.current_token_kind(), None);
        assert_eq!(p.current_token_text(), "");
    }

    #[test]
    fn nested_markers() {
        let source = "<a b>";
        let mut p = builder(source);
        let root = p.mark();
        p.advance();
        p.advance();
        let inner = p.mark();
        p.advance();
        inner.close_as(&mut p, NodeKind::Attribute);
        p.advance();
        root.close_as(&mut p, NodeKind::Tag);

        let tree = p.finish();
        let root = tree.root();
        assert_eq!(tree.kind(root), NodeKind::Tag);
        assert_eq!(tree.node(root).range, TextRange::new(0, 5));
        let attr = tree.child_of_kind(root, NodeKind::Attribute).unwrap();
        assert_eq!(tree.text_of(attr), "b");
        // the whitespace in front of the attribute belongs to the tag
        assert_eq!(tree.children_of(root).len(), 5);
        assert_eq!(tree.reconstruct(), source);
    }

    #[test]
    fn trailing_trivia_stays_outside() {
        let source = "<a b c>";
        let mut p = builder(source);
        let root = p.mark();
        p.advance();
        p.advance();
        let inner = p.mark();
        p.advance();
        let error = p.mark();
        p.advance();
        inner.close_before(&mut p, &error, NodeKind::Attribute, Some("cut"));
        error.close_as_error(&mut p, "oops");
        p.advance();
        root.close_as(&mut p, NodeKind::Tag);

        let tree = p.finish();
        let root = tree.root();
        let attr = tree.child_of_kind(root, NodeKind::Attribute).unwrap();
        assert_eq!(tree.text_of(attr), "b");
        assert_eq!(
            tree.errors()
                .iter()
                .map(|e| e.message.as_str())
                .collect::<Vec<_>>(),
            vec!["cut", "oops"]
        );
        let oops = tree.child_of_kind(root, NodeKind::Error).unwrap();
        assert_eq!(tree.text_of(oops), "c");
        assert_eq!(tree.reconstruct(), source);
    }

    #[test]
    fn drop_and_rollback() {
        let source = "<a b>";
        let mut p = builder(source);
        let root = p.mark();
        let dropped = p.mark();
        p.advance();
        dropped.drop(&mut p);

        let attempt = p.mark();
        p.advance();
        let nested = p.mark();
        p.advance();
        nested.close_as(&mut p, NodeKind::Attribute);
        attempt.rollback(&mut p);
        assert_eq!(p.current_token_kind(), Some(TokenKind::Name));
        assert_eq!(p.current_token_text(), "a");

        while !p.eof() {
            p.advance();
        }
        root.close_as(&mut p, NodeKind::Tag);

        let tree = p.finish();
        assert_eq!(tree.node_count(), 1);
        assert_eq!(tree.children_of(tree.root()).len(), 5);
        assert!(!tree.has_errors());
    }

    #[test]
    fn zero_width_errors_and_remap() {
        let source = "a b";
        let mut p = builder(source);
        let root = p.mark();
        p.advance();
        p.error("first");
        p.error("first");
        p.remap_current_token(TokenKind::Name);
        assert_eq!(p.current_token_kind(), Some(TokenKind::Name));
        p.error_token("second");
        root.close_as(&mut p, NodeKind::Document);

        let tree = p.finish();
        let errors = tree.errors();
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].range, TextRange::empty(1));
        assert_eq!(errors[1].range, TextRange::new(1, 2));
        assert_eq!(tree.reconstruct(), source);
    }

    #[test]
    fn root_claims_leftover_tokens() {
        let source = "  <a> ";
        let mut p = builder(source);
        let root = p.mark();
        p.advance();
        root.close_as(&mut p, NodeKind::Document);

        let tree = p.finish();
        assert_eq!(tree.node(tree.root()).range, TextRange::new(0, source.len()));
        assert_eq!(tree.reconstruct(), source);
    }
}
