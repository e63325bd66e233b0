use std::fmt;

use crate::tree::NodeId;
use crate::value::Value;

/// Slot address inside a node: an object key or a sequence index.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Key {
    Name(String),
    Index(usize),
}

impl Key {
    pub fn as_name(&self) -> Option<&str> {
        match self {
            Key::Name(name) => Some(name),
            Key::Index(_) => None,
        }
    }

    pub fn as_index(&self) -> Option<usize> {
        match self {
            Key::Index(i) => Some(*i),
            Key::Name(_) => None,
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Name(name) => f.write_str(name),
            Key::Index(i) => write!(f, "{i}"),
        }
    }
}

impl From<&str> for Key {
    fn from(name: &str) -> Self {
        Key::Name(name.to_owned())
    }
}

impl From<String> for Key {
    fn from(name: String) -> Self {
        Key::Name(name)
    }
}

impl From<usize> for Key {
    fn from(index: usize) -> Self {
        Key::Index(index)
    }
}

/// `beforeChange` payload: a write that has not happened yet.
///
/// Bubbles to every ancestor unchanged.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingChange {
    /// Node whose slot is about to be written.
    pub target: NodeId,
    pub key: Key,
    pub before: Value,
    pub after: Value,
}

/// `onChange` payload: a write that has been committed to the source.
#[derive(Debug, Clone, PartialEq)]
pub struct Change {
    /// Leading node arguments, nearest first.
    ///
    /// At a mutated object node this is `[self]`; at a mutated sequence node
    /// it is empty. Each ancestor sees `[child] ++ child's chain`, so the
    /// first entry is always the immediate child the change came through.
    pub chain: Vec<NodeId>,
    /// Node whose slot was written.
    pub target: NodeId,
    pub key: Key,
    pub before: Value,
    pub after: Value,
}

impl Change {
    /// The node this firing identifies as its origin: the immediate child
    /// at an ancestor, the node itself at a mutated object node.
    pub fn origin(&self) -> Option<NodeId> {
        self.chain.first().copied()
    }

    /// Whether this firing is a pass-through from a descendant.
    pub fn is_bubbled(&self, at: NodeId) -> bool {
        self.target != at
    }
}
