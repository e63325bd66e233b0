//! Value classification and the result type of wrapping.
//!
//! Node construction itself lives on [`Tree::create`](crate::Tree::create),
//! which owns the arena; this module decides what gets a node.

use crate::tree::NodeId;
use crate::value::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Undefined,
    Null,
    /// Strings, numbers, booleans and dates.
    Primitive,
    Sequence,
    Object,
    /// Functions stored in objects. Exposed as methods, never wrapped.
    Callable,
}

pub fn classify(value: &Value) -> Kind {
    match value {
        Value::Undefined => Kind::Undefined,
        Value::Null => Kind::Null,
        Value::Bool(_) | Value::Number(_) | Value::String(_) | Value::Date(_) => Kind::Primitive,
        Value::Array(_) => Kind::Sequence,
        Value::Object(_) => Kind::Object,
        Value::Callable(_) => Kind::Callable,
    }
}

/// Whether a freshly written value would get a cached child node.
pub fn can_wrap(value: &Value) -> bool {
    matches!(classify(value), Kind::Sequence | Kind::Object)
}

/// What a read through a node returns: a child node, or the raw value when
/// it cannot be wrapped.
#[derive(Debug, Clone, PartialEq)]
pub enum Proxied {
    Value(Value),
    Node(NodeId),
}

impl Proxied {
    pub fn as_node(&self) -> Option<NodeId> {
        match self {
            Proxied::Node(id) => Some(*id),
            Proxied::Value(_) => None,
        }
    }

    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Proxied::Value(v) => Some(v),
            Proxied::Node(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        self.as_value().and_then(Value::as_str)
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, Proxied::Value(Value::Undefined))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Proxied::Value(Value::Null))
    }
}

impl From<NodeId> for Proxied {
    fn from(id: NodeId) -> Self {
        Proxied::Node(id)
    }
}
