use derive_more::Display;

/// A `NodeId` is a unique identifier for a node in a syntax tree. It is an index into the node
/// arena of the tree that created it.
#[derive(Clone, Copy, Debug, Default, Display, Eq, Hash, PartialEq, PartialOrd, Ord)]
pub struct NodeId(usize);

impl From<NodeId> for usize {
    /// Converts a `NodeId` into a usize
    fn from(value: NodeId) -> Self {
        value.0
    }
}

impl From<usize> for NodeId {
    /// Converts a usize into a `NodeId`
    fn from(value: usize) -> Self {
        Self(value)
    }
}

/// A `TokenId` points to a single lexeme in the token vector of a syntax tree.
#[derive(Clone, Copy, Debug, Default, Display, Eq, Hash, PartialEq, PartialOrd, Ord)]
pub struct TokenId(usize);

impl From<TokenId> for usize {
    fn from(value: TokenId) -> Self {
        value.0
    }
}

impl From<usize> for TokenId {
    fn from(value: usize) -> Self {
        Self(value)
    }
}
