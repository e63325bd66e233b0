//! Node variants.
//!
//! | Variant        | Source      | Slots           | Child cache                 |
//! |----------------|-------------|-----------------|-----------------------------|
//! | `ObjectNode`   | `ObjectRef` | accessor table  | `HashMap<String, NodeId>`   |
//! | `SequenceNode` | `ArrayRef`  | `0..len`        | `BTreeMap<usize, NodeId>`   |
//!
//! Both are reached through [`NodeKind`], which is all the tree's read,
//! write and bubbling code ever sees.

use std::collections::{BTreeMap, HashMap};

use indexmap::IndexMap;

use crate::channel::{Channel, Context};
use crate::error::ProxyError;
use crate::events::{Change, Key, PendingChange};
use crate::tree::{NodeId, Tree};
use crate::value::{ArrayRef, Callable, ObjectRef, Value};

/// Largest index a sequence write may address, the array index limit of
/// JSON-like hosts (`2^32 - 2`).
pub const MAX_INDEX: usize = u32::MAX as usize - 1;

/// One entry of an object node's accessor table.
#[derive(Debug, Clone)]
pub enum Accessor {
    /// Get/set pair over the source slot of the same name.
    Property,
    /// Source function, invoked with the node as receiver.
    Method(Callable),
}

#[derive(Debug)]
pub struct ObjectNode {
    source: ObjectRef,
    accessors: IndexMap<String, Accessor>,
    children: HashMap<String, NodeId>,
}

impl ObjectNode {
    /// Builds the accessor table from the keys present right now. Keys added
    /// to the source later are never exposed.
    pub(crate) fn new(source: ObjectRef) -> Self {
        let accessors = source
            .borrow()
            .iter()
            .map(|(key, value)| {
                let accessor = match value {
                    Value::Callable(f) => Accessor::Method(f.clone()),
                    _ => Accessor::Property,
                };
                (key.clone(), accessor)
            })
            .collect();
        Self {
            source,
            accessors,
            children: HashMap::new(),
        }
    }

    pub fn source(&self) -> &ObjectRef {
        &self.source
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.accessors.keys().map(String::as_str)
    }

    pub fn accessor(&self, key: &str) -> Option<&Accessor> {
        self.accessors.get(key)
    }

    fn property(&self, key: &str) -> Result<(), ProxyError> {
        match self.accessors.get(key) {
            Some(Accessor::Property) => Ok(()),
            Some(Accessor::Method(_)) => Err(ProxyError::MethodSlot(key.to_owned())),
            None => Err(ProxyError::UnknownKey(key.to_owned())),
        }
    }
}

#[derive(Debug)]
pub struct SequenceNode {
    source: ArrayRef,
    children: BTreeMap<usize, NodeId>,
}

impl SequenceNode {
    pub(crate) fn new(source: ArrayRef) -> Self {
        Self {
            source,
            children: BTreeMap::new(),
        }
    }

    pub fn source(&self) -> &ArrayRef {
        &self.source
    }

    pub fn len(&self) -> usize {
        self.source.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Append to the source, returning the new element's index.
    pub(crate) fn append(&self, value: Value) -> usize {
        let mut items = self.source.borrow_mut();
        items.push(value);
        items.len() - 1
    }
}

#[derive(Debug)]
pub enum NodeKind {
    Object(ObjectNode),
    Sequence(SequenceNode),
}

impl NodeKind {
    /// Bring a key into the shape this node addresses slots by. Objects
    /// accept indices as their decimal names; sequences accept numeric names.
    pub(crate) fn normalize(&self, key: Key) -> Result<Key, ProxyError> {
        match (self, key) {
            (NodeKind::Object(_), Key::Index(i)) => Ok(Key::Name(i.to_string())),
            (NodeKind::Object(_), key @ Key::Name(_)) => Ok(key),
            (NodeKind::Sequence(_), key @ Key::Index(_)) => Ok(key),
            (NodeKind::Sequence(_), Key::Name(name)) => name
                .parse::<usize>()
                .map(Key::Index)
                .map_err(|_| ProxyError::UnknownKey(name)),
        }
    }

    /// Current raw value in a slot. Sequence reads past the end are
    /// `Undefined`.
    pub(crate) fn read(&self, key: &Key) -> Result<Value, ProxyError> {
        match (self, key) {
            (NodeKind::Object(obj), Key::Name(name)) => {
                if obj.accessors.get(name.as_str()).is_none() {
                    return Err(ProxyError::UnknownKey(name.clone()));
                }
                Ok(obj.source.borrow().get(name.as_str()).cloned().unwrap_or_default())
            }
            (NodeKind::Sequence(seq), Key::Index(i)) => {
                Ok(seq.source.borrow().get(*i).cloned().unwrap_or_default())
            }
            (NodeKind::Object(_), Key::Index(_)) => Err(ProxyError::NotSequence),
            (NodeKind::Sequence(_), Key::Name(_)) => Err(ProxyError::NotObject),
        }
    }

    /// Reject writes to slots that have no setter.
    pub(crate) fn check_writable(&self, key: &Key) -> Result<(), ProxyError> {
        match (self, key) {
            (NodeKind::Object(obj), Key::Name(name)) => obj.property(name),
            (NodeKind::Sequence(_), Key::Index(i)) if *i > MAX_INDEX => {
                Err(ProxyError::IndexOutOfRange(*i))
            }
            (NodeKind::Sequence(_), Key::Index(_)) => Ok(()),
            (NodeKind::Object(_), Key::Index(_)) => Err(ProxyError::NotSequence),
            (NodeKind::Sequence(_), Key::Name(_)) => Err(ProxyError::NotObject),
        }
    }

    /// Store `value` in the source. Writing past the end of a sequence pads
    /// the gap with `Undefined`. Callers run [`NodeKind::check_writable`]
    /// first.
    pub(crate) fn commit(&self, key: &Key, value: Value) {
        match (self, key) {
            (NodeKind::Object(obj), Key::Name(name)) => {
                obj.source.borrow_mut().insert(name.clone(), value);
            }
            (NodeKind::Sequence(seq), Key::Index(i)) => {
                let mut items = seq.source.borrow_mut();
                if let Some(slot) = items.get_mut(*i) {
                    *slot = value;
                } else {
                    items.resize(*i, Value::Undefined);
                    items.push(value);
                }
            }
            _ => {}
        }
    }

    pub(crate) fn cached(&self, key: &Key) -> Option<NodeId> {
        match (self, key) {
            (NodeKind::Object(obj), Key::Name(name)) => obj.children.get(name.as_str()).copied(),
            (NodeKind::Sequence(seq), Key::Index(i)) => seq.children.get(i).copied(),
            _ => None,
        }
    }

    pub(crate) fn cache(&mut self, key: Key, child: NodeId) {
        match (self, key) {
            (NodeKind::Object(obj), Key::Name(name)) => {
                obj.children.insert(name, child);
            }
            (NodeKind::Sequence(seq), Key::Index(i)) => {
                seq.children.insert(i, child);
            }
            _ => {}
        }
    }

    pub(crate) fn evict(&mut self, key: &Key) -> Option<NodeId> {
        match (self, key) {
            (NodeKind::Object(obj), Key::Name(name)) => obj.children.remove(name.as_str()),
            (NodeKind::Sequence(seq), Key::Index(i)) => seq.children.remove(i),
            _ => None,
        }
    }

    /// The wrapped source as a value (shares the allocation).
    pub fn source(&self) -> Value {
        match self {
            NodeKind::Object(obj) => Value::Object(obj.source.clone()),
            NodeKind::Sequence(seq) => Value::Array(seq.source.clone()),
        }
    }

    /// Leading node arguments for a change fired directly on this node:
    /// object nodes name themselves, sequence nodes do not.
    pub(crate) fn direct_chain(&self, me: NodeId) -> Vec<NodeId> {
        match self {
            NodeKind::Object(_) => vec![me],
            NodeKind::Sequence(_) => Vec::new(),
        }
    }
}

/// Where a node hangs in the tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Link {
    pub(crate) parent: NodeId,
    pub(crate) key: Key,
}

/// Arena slot.
#[derive(Debug)]
pub(crate) struct NodeData {
    pub(crate) kind: NodeKind,
    pub(crate) parent: Option<Link>,
    pub(crate) before_change: Channel<PendingChange, Tree>,
    pub(crate) on_change: Channel<Change, Tree>,
}

impl NodeData {
    pub(crate) fn new(id: NodeId, kind: NodeKind, parent: Option<Link>) -> Self {
        Self {
            kind,
            parent,
            before_change: Channel::new(Context::Node(id)),
            on_change: Channel::new(Context::Node(id)),
        }
    }
}
