use thiserror::Error;

use crate::factory::Kind;
use crate::tree::NodeId;

/// Boxed error raised by a subscriber or a method.
pub type BoxError = Box<dyn std::error::Error + 'static>;

#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("node {0:?} does not exist")]
    UnknownNode(NodeId),
    /// The key was not present on the source when the node was built.
    #[error("key {0:?} is not exposed by this node")]
    UnknownKey(String),
    #[error("node does not wrap an object")]
    NotObject,
    #[error("node does not wrap a sequence")]
    NotSequence,
    #[error("member {0:?} is not callable")]
    NotCallable(String),
    #[error("member {0:?} is a method and cannot be assigned")]
    MethodSlot(String),
    /// Sequence writes are limited to [`MAX_INDEX`](crate::node::MAX_INDEX).
    #[error("index {0} is beyond the largest writable index")]
    IndexOutOfRange(usize),
    #[error("cannot wrap a {0:?} value as a node")]
    NotWrappable(Kind),
    #[error("subscriber failed: {0}")]
    Subscriber(#[source] BoxError),
    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),
    #[error("invalid path")]
    InvalidPath,
}

impl ProxyError {
    /// Wrap any error raised from inside a handler or method.
    pub fn subscriber<E>(err: E) -> Self
    where
        E: Into<BoxError>,
    {
        ProxyError::Subscriber(err.into())
    }
}
