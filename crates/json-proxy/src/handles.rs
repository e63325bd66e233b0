//! Borrowed per-node views.
//!
//! A handle pairs `&mut Tree` with one node id so call sites read like
//! property access on the wrapped value:
//!
//! ```
//! use json_proxy::{Tree, Value};
//! use serde_json::json;
//!
//! let mut tree = Tree::new();
//! let root = tree.wrap(Value::from(json!({"title": "a", "tags": ["x"]}))).unwrap();
//!
//! tree.object(root).unwrap().set("title", "b").unwrap();
//! let tags = tree.object(root).unwrap().get("tags").unwrap().as_node().unwrap();
//! tree.sequence(tags).unwrap().push("y").unwrap();
//!
//! assert_eq!(
//!     tree.source(root).unwrap().to_json(),
//!     json!({"title": "b", "tags": ["x", "y"]})
//! );
//! ```

use crate::channel::{Delivery, Flow, Outcome};
use crate::error::ProxyError;
use crate::events::{Change, PendingChange};
use crate::factory::{Kind, Proxied};
use crate::tree::{NodeId, Tree};
use crate::value::Value;

pub struct ObjectHandle<'a> {
    tree: &'a mut Tree,
    id: NodeId,
}

pub struct SequenceHandle<'a> {
    tree: &'a mut Tree,
    id: NodeId,
}

impl Tree {
    pub fn object(&mut self, id: NodeId) -> Result<ObjectHandle<'_>, ProxyError> {
        match self.kind(id)? {
            Kind::Object => Ok(ObjectHandle { tree: self, id }),
            _ => Err(ProxyError::NotObject),
        }
    }

    pub fn sequence(&mut self, id: NodeId) -> Result<SequenceHandle<'_>, ProxyError> {
        match self.kind(id)? {
            Kind::Sequence => Ok(SequenceHandle { tree: self, id }),
            _ => Err(ProxyError::NotSequence),
        }
    }
}

impl<'a> ObjectHandle<'a> {
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn tree(&mut self) -> &mut Tree {
        self.tree
    }

    pub fn keys(&self) -> Result<Vec<String>, ProxyError> {
        self.tree.keys(self.id)
    }

    pub fn get(&mut self, name: &str) -> Result<Proxied, ProxyError> {
        self.tree.get(self.id, name)
    }

    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> Result<Outcome, ProxyError> {
        self.tree.set(self.id, name, value)
    }

    pub fn call(&mut self, name: &str, args: &[Value]) -> Result<Value, ProxyError> {
        self.tree.call(self.id, name, args)
    }

    pub fn source(&self) -> Result<Value, ProxyError> {
        self.tree.source(self.id)
    }

    /// Subscribe to `onChange` with the node as context.
    pub fn on_change<F>(&mut self, handler: F) -> Result<(), ProxyError>
    where
        F: Fn(&mut Tree, &Delivery<'_, Change>) -> Result<Flow, ProxyError> + 'static,
    {
        self.tree.on_change_mut(self.id)?.subscribe(handler, None, None);
        Ok(())
    }

    /// Subscribe to `beforeChange` with the node as context.
    pub fn before_change<F>(&mut self, handler: F) -> Result<(), ProxyError>
    where
        F: Fn(&mut Tree, &Delivery<'_, PendingChange>) -> Result<Flow, ProxyError> + 'static,
    {
        self.tree.before_change_mut(self.id)?.subscribe(handler, None, None);
        Ok(())
    }
}

impl<'a> SequenceHandle<'a> {
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn tree(&mut self) -> &mut Tree {
        self.tree
    }

    pub fn length(&self) -> Result<usize, ProxyError> {
        self.tree.length(self.id)
    }

    pub fn item(&mut self, index: usize) -> Result<Proxied, ProxyError> {
        self.tree.item(self.id, index)
    }

    pub fn set(&mut self, index: usize, value: impl Into<Value>) -> Result<Outcome, ProxyError> {
        self.tree.set_item(self.id, index, value)
    }

    pub fn push(&mut self, value: impl Into<Value>) -> Result<Outcome, ProxyError> {
        self.tree.push(self.id, value)
    }

    pub fn items(&mut self) -> Result<Vec<Proxied>, ProxyError> {
        self.tree.items(self.id)
    }

    pub fn for_each<F>(&mut self, f: F) -> Result<(), ProxyError>
    where
        F: FnMut(&mut Tree, usize, Proxied) -> Result<(), ProxyError>,
    {
        self.tree.for_each(self.id, f)
    }

    pub fn source(&self) -> Result<Value, ProxyError> {
        self.tree.source(self.id)
    }

    pub fn on_change<F>(&mut self, handler: F) -> Result<(), ProxyError>
    where
        F: Fn(&mut Tree, &Delivery<'_, Change>) -> Result<Flow, ProxyError> + 'static,
    {
        self.tree.on_change_mut(self.id)?.subscribe(handler, None, None);
        Ok(())
    }

    pub fn before_change<F>(&mut self, handler: F) -> Result<(), ProxyError>
    where
        F: Fn(&mut Tree, &Delivery<'_, PendingChange>) -> Result<Flow, ProxyError> + 'static,
    {
        self.tree.before_change_mut(self.id)?.subscribe(handler, None, None);
        Ok(())
    }
}
