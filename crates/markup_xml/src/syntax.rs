use crate::config::Dialect;
use crate::lexer::token::{Token, TokenKind};
use markup_shared::errors::ParseError;
use markup_shared::location::TextRange;
use markup_shared::node::{NodeId, TokenId};
use std::fmt;

/// Kinds of the nodes in a syntax tree
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Document,
    Prolog,
    Doctype,
    XmlDecl,
    ProcessingInstruction,
    Tag,
    Attribute,
    AttributeValue,
    Text,
    Comment,
    Cdata,
    EntityRef,
    /// Root of a DTD, or the internal subset of a doctype
    MarkupDecl,
    ElementDecl,
    AttlistDecl,
    AttributeDecl,
    EntityDecl,
    NotationDecl,
    ElementContentSpec,
    ElementContentGroup,
    ElementContentName,
    EnumeratedType,
    EntityDeclContent,
    ConditionalSection,
    Error,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

/// Outcome of comparing an old tree node against a freshly parsed one
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ThreeState {
    /// The old node can definitely not be reused
    No,
    /// The old node can be reused
    Yes,
    /// No opinion; a structural comparison has to decide
    Unsure,
}

/// Predicate deciding whether `old_node` of `old_tree` may be reused for `new_node` of `new_tree`
pub type ReparseComparator = fn(&SyntaxTree, NodeId, &SyntaxTree, NodeId) -> ThreeState;

/// A child of a node: either another node or a single token
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SyntaxElement {
    Node(NodeId),
    Token(TokenId),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SyntaxNode {
    pub kind: NodeKind,
    pub range: TextRange,
    pub children: Vec<SyntaxElement>,
    /// Message of an `Error` node
    pub error: Option<String>,
}

/// A finished, lossless syntax tree. Every token of the source is a leaf of exactly one node.
pub struct SyntaxTree {
    source: String,
    tokens: Vec<Token>,
    nodes: Vec<SyntaxNode>,
    root: NodeId,
    dialect: Dialect,
    comparator: Option<ReparseComparator>,
}

impl fmt::Debug for SyntaxTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyntaxTree")
            .field("dialect", &self.dialect)
            .field("nodes", &self.nodes.len())
            .field("tokens", &self.tokens.len())
            .finish()
    }
}

impl SyntaxTree {
    pub(crate) fn new(
        source: String,
        tokens: Vec<Token>,
        nodes: Vec<SyntaxNode>,
        root: NodeId,
        dialect: Dialect,
        comparator: Option<ReparseComparator>,
    ) -> Self {
        Self {
            source,
            tokens,
            nodes,
            root,
            dialect,
            comparator,
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Returns the comparator registered while parsing, if any
    pub fn reparse_comparator(&self) -> Option<ReparseComparator> {
        self.comparator
    }

    /// Returns the node with the given id. Ids are only handed out by this tree.
    pub fn node(&self, id: NodeId) -> &SyntaxNode {
        &self.nodes[usize::from(id)]
    }

    pub fn kind(&self, id: NodeId) -> NodeKind {
        self.node(id).kind
    }

    pub fn children_of(&self, id: NodeId) -> &[SyntaxElement] {
        &self.node(id).children
    }

    /// Child nodes of the given node, tokens left out
    pub fn child_nodes(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.children_of(id).iter().filter_map(|child| match child {
            SyntaxElement::Node(node) => Some(*node),
            SyntaxElement::Token(_) => None,
        })
    }

    /// Direct token children of the given node
    pub fn child_tokens(&self, id: NodeId) -> impl Iterator<Item = TokenId> + '_ {
        self.children_of(id).iter().filter_map(|child| match child {
            SyntaxElement::Token(token) => Some(*token),
            SyntaxElement::Node(_) => None,
        })
    }

    /// Direct, non-trivia token children of the given node
    pub fn significant_tokens(&self, id: NodeId) -> impl Iterator<Item = TokenId> + '_ {
        self.child_tokens(id)
            .filter(|token| !self.token(*token).kind.is_trivia())
    }

    /// First child node of the given kind
    pub fn child_of_kind(&self, id: NodeId, kind: NodeKind) -> Option<NodeId> {
        self.child_nodes(id).find(|child| self.kind(*child) == kind)
    }

    /// First direct token child of the given kind
    pub fn token_of_kind(&self, id: NodeId, kind: TokenKind) -> Option<TokenId> {
        self.child_tokens(id)
            .find(|token| self.token(*token).kind == kind)
    }

    pub fn token(&self, id: TokenId) -> &Token {
        &self.tokens[usize::from(id)]
    }

    pub fn token_text_of(&self, id: TokenId) -> &str {
        self.token(id).text(&self.source)
    }

    /// Source text covered by the given node
    pub fn text_of(&self, id: NodeId) -> &str {
        let range = self.node(id).range;
        self.source.get(range.start..range.end).unwrap_or("")
    }

    /// All nodes below the given node, in source order (pre-order)
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut result = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            result.push(current);
            let children: Vec<NodeId> = self.child_nodes(current).collect();
            stack.extend(children.into_iter().rev());
        }

        result
    }

    /// Every error node of the tree in source order
    pub fn errors(&self) -> Vec<ParseError> {
        self.descendants(self.root)
            .into_iter()
            .filter_map(|id| {
                let node = self.node(id);
                node.error
                    .as_deref()
                    .map(|message| ParseError::new(message, node.range))
            })
            .collect()
    }

    pub fn has_errors(&self) -> bool {
        self.nodes.iter().any(|node| node.kind == NodeKind::Error)
    }

    /// Concatenated text of all tokens in the tree
    pub fn reconstruct(&self) -> String {
        let mut out = String::with_capacity(self.source.len());
        let mut stack = vec![SyntaxElement::Node(self.root)];
        while let Some(element) = stack.pop() {
            match element {
                SyntaxElement::Token(token) => out.push_str(self.token_text_of(token)),
                SyntaxElement::Node(node) => {
                    stack.extend(self.children_of(node).iter().rev().copied());
                }
            }
        }

        out
    }
}
