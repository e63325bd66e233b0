//! Node arena and the read/write/dispatch paths.
//!
//! # Overview
//!
//! [`Tree`] owns every node created over a source graph. Nodes are addressed
//! by [`NodeId`]; an id stays valid for the life of the tree, even after its
//! node has been evicted from its parent's cache.
//!
//! - Reads ([`Tree::child`], [`Tree::get`], [`Tree::item`]) create child
//!   nodes lazily and cache them per slot, so repeated reads return the
//!   same id until the slot is written.
//! - Writes ([`Tree::write`], [`Tree::set`], [`Tree::set_item`],
//!   [`Tree::push`]) fire `beforeChange` from the written node up to the
//!   root, commit unless vetoed, then fire `onChange` from the written node
//!   up to the root.
//!
//! A node's own subscribers always finish before its parent's run. Bubbling
//! follows the parent link set when the child was created; it is not a
//! subscription, so clearing a channel never severs it.

use crate::channel::{dispatch, Channel, Context, Outcome};
use crate::config::{PushPolicy, TreeConfig};
use crate::error::ProxyError;
use crate::events::{Change, Key, PendingChange};
use crate::factory::{can_wrap, classify, Kind, Proxied};
use crate::node::{Accessor, Link, NodeData, NodeKind, ObjectNode, SequenceNode};
use crate::path::parse_pointer;
use crate::value::Value;

/// Stable handle of a node in a [`Tree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

pub type BeforeChange = Channel<PendingChange, Tree>;
pub type OnChange = Channel<Change, Tree>;

#[derive(Debug, Default)]
pub struct Tree {
    nodes: Vec<NodeData>,
    config: TreeConfig,
    next_token: u64,
}

impl Tree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: TreeConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &TreeConfig {
        &self.config
    }

    /// Number of nodes ever created, evicted ones included.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// A fresh subscription context, distinct from every node and every
    /// other token of this tree.
    pub fn context_token(&mut self) -> Context {
        self.next_token += 1;
        Context::Token(self.next_token)
    }

    // ── Construction ─────────────────────────────────────────────────────

    /// Wrap a root object or sequence.
    pub fn wrap(&mut self, source: Value) -> Result<NodeId, ProxyError> {
        match self.create(source.clone()) {
            Proxied::Node(id) => Ok(id),
            Proxied::Value(_) => Err(ProxyError::NotWrappable(classify(&source))),
        }
    }

    /// Wrap `value` if it can be wrapped, otherwise hand it back unchanged.
    ///
    /// Every call that wraps makes a new node, even over a source that
    /// already has one.
    pub fn create(&mut self, value: Value) -> Proxied {
        self.create_linked(value, None)
    }

    fn create_linked(&mut self, value: Value, parent: Option<Link>) -> Proxied {
        let kind = match value {
            Value::Object(obj) => NodeKind::Object(ObjectNode::new(obj)),
            Value::Array(arr) => NodeKind::Sequence(SequenceNode::new(arr)),
            other => return Proxied::Value(other),
        };
        let id = NodeId(self.nodes.len());
        tracing::trace!(node = ?id, parent = ?parent.as_ref().map(|l| l.parent), "created node");
        self.nodes.push(NodeData::new(id, kind, parent));
        Proxied::Node(id)
    }

    // ── Introspection ────────────────────────────────────────────────────

    fn node(&self, id: NodeId) -> Result<&NodeData, ProxyError> {
        self.nodes.get(id.index()).ok_or(ProxyError::UnknownNode(id))
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut NodeData, ProxyError> {
        self.nodes.get_mut(id.index()).ok_or(ProxyError::UnknownNode(id))
    }

    pub fn kind(&self, id: NodeId) -> Result<Kind, ProxyError> {
        Ok(match self.node(id)?.kind {
            NodeKind::Object(_) => Kind::Object,
            NodeKind::Sequence(_) => Kind::Sequence,
        })
    }

    /// The raw source the node wraps. For inspection; writing to it directly
    /// bypasses notification and cache invalidation.
    pub fn source(&self, id: NodeId) -> Result<Value, ProxyError> {
        Ok(self.node(id)?.kind.source())
    }

    /// Parent node, or `None` for roots and evicted nodes.
    pub fn parent(&self, id: NodeId) -> Result<Option<NodeId>, ProxyError> {
        Ok(self.node(id)?.parent.as_ref().map(|l| l.parent))
    }

    /// Parent and the key this node is cached under there.
    pub fn slot(&self, id: NodeId) -> Result<Option<(NodeId, Key)>, ProxyError> {
        Ok(self.node(id)?.parent.as_ref().map(|l| (l.parent, l.key.clone())))
    }

    /// Names exposed by an object node, methods included, in source order.
    pub fn keys(&self, id: NodeId) -> Result<Vec<String>, ProxyError> {
        match &self.node(id)?.kind {
            NodeKind::Object(obj) => Ok(obj.keys().map(str::to_owned).collect()),
            NodeKind::Sequence(_) => Err(ProxyError::NotObject),
        }
    }

    /// Length of a sequence node's source.
    pub fn length(&self, id: NodeId) -> Result<usize, ProxyError> {
        match &self.node(id)?.kind {
            NodeKind::Sequence(seq) => Ok(seq.len()),
            NodeKind::Object(_) => Err(ProxyError::NotSequence),
        }
    }

    pub fn before_change(&self, id: NodeId) -> Result<&BeforeChange, ProxyError> {
        Ok(&self.node(id)?.before_change)
    }

    pub fn before_change_mut(&mut self, id: NodeId) -> Result<&mut BeforeChange, ProxyError> {
        Ok(&mut self.node_mut(id)?.before_change)
    }

    pub fn on_change(&self, id: NodeId) -> Result<&OnChange, ProxyError> {
        Ok(&self.node(id)?.on_change)
    }

    pub fn on_change_mut(&mut self, id: NodeId) -> Result<&mut OnChange, ProxyError> {
        Ok(&mut self.node_mut(id)?.on_change)
    }

    // ── Reads ────────────────────────────────────────────────────────────

    /// Read a slot through the node.
    ///
    /// Returns the cached child when there is one; otherwise wraps the
    /// current source value, caching the result only if it is a node.
    pub fn child(&mut self, id: NodeId, key: impl Into<Key>) -> Result<Proxied, ProxyError> {
        let node = self.node(id)?;
        let key = node.kind.normalize(key.into())?;
        if let Some(child) = node.kind.cached(&key) {
            return Ok(Proxied::Node(child));
        }
        let raw = node.kind.read(&key)?;
        let link = Link {
            parent: id,
            key: key.clone(),
        };
        let proxied = self.create_linked(raw, Some(link));
        if let Proxied::Node(child) = proxied {
            self.node_mut(id)?.kind.cache(key, child);
        }
        Ok(proxied)
    }

    /// Read a property of an object node.
    pub fn get(&mut self, id: NodeId, name: &str) -> Result<Proxied, ProxyError> {
        self.expect_object(id)?;
        self.child(id, Key::from(name))
    }

    /// Read an element of a sequence node. Past the end this is
    /// `Undefined`, not an error.
    pub fn item(&mut self, id: NodeId, index: usize) -> Result<Proxied, ProxyError> {
        self.expect_sequence(id)?;
        self.child(id, Key::Index(index))
    }

    /// Every element of a sequence node, wrapped exactly as [`Tree::item`]
    /// wraps it.
    pub fn items(&mut self, id: NodeId) -> Result<Vec<Proxied>, ProxyError> {
        let len = self.length(id)?;
        (0..len).map(|i| self.item(id, i)).collect()
    }

    /// Visit every element of a sequence node in order, wrapped as
    /// [`Tree::item`] wraps it. The length is re-read after each visit, so
    /// elements pushed by `f` are visited too.
    pub fn for_each<F>(&mut self, id: NodeId, mut f: F) -> Result<(), ProxyError>
    where
        F: FnMut(&mut Tree, usize, Proxied) -> Result<(), ProxyError>,
    {
        let mut index = 0;
        while index < self.length(id)? {
            let element = self.item(id, index)?;
            f(self, index, element)?;
            index += 1;
        }
        Ok(())
    }

    /// Resolve a JSON Pointer below `id`, creating nodes along the way as
    /// reads would. Walking past a non-node value yields `Undefined`.
    pub fn find(&mut self, id: NodeId, pointer: &str) -> Result<Proxied, ProxyError> {
        let mut current = Proxied::Node(id);
        for key in parse_pointer(pointer)? {
            current = match current {
                Proxied::Node(node) => self.child(node, key)?,
                Proxied::Value(_) => return Ok(Proxied::Value(Value::Undefined)),
            };
        }
        Ok(current)
    }

    // ── Writes ───────────────────────────────────────────────────────────

    /// Write a slot through the node.
    ///
    /// Fires `beforeChange(key, prior, value)` up the tree; a veto leaves the
    /// source untouched and returns [`Outcome::Cancelled`]. Otherwise commits,
    /// drops a cached child the new value no longer matches, and fires
    /// `onChange` up the tree. Subscriber errors propagate: from
    /// `beforeChange` before the commit, from `onChange` after it.
    pub fn write(
        &mut self,
        id: NodeId,
        key: impl Into<Key>,
        value: Value,
    ) -> Result<Outcome, ProxyError> {
        let node = self.node(id)?;
        let key = node.kind.normalize(key.into())?;
        node.kind.check_writable(&key)?;
        let before = node.kind.read(&key)?;

        let pending = PendingChange {
            target: id,
            key: key.clone(),
            before: before.clone(),
            after: value.clone(),
        };
        if self.emit_before(id, &pending)?.is_cancelled() {
            tracing::debug!(node = ?id, %key, "write vetoed");
            return Ok(Outcome::Cancelled);
        }

        let node = self.node(id)?;
        node.kind.commit(&key, value.clone());
        let chain = node.kind.direct_chain(id);
        self.refresh_cache(id, &key, &value)?;

        self.emit_change(
            id,
            Change {
                chain,
                target: id,
                key,
                before,
                after: value,
            },
        )?;
        Ok(Outcome::Completed)
    }

    /// Assign a property of an object node.
    pub fn set(
        &mut self,
        id: NodeId,
        name: &str,
        value: impl Into<Value>,
    ) -> Result<Outcome, ProxyError> {
        self.expect_object(id)?;
        self.write(id, Key::from(name), value.into())
    }

    /// Assign an element of a sequence node.
    pub fn set_item(
        &mut self,
        id: NodeId,
        index: usize,
        value: impl Into<Value>,
    ) -> Result<Outcome, ProxyError> {
        self.expect_sequence(id)?;
        self.write(id, Key::Index(index), value.into())
    }

    /// Append to a sequence node and fire `onChange(len, Undefined, value)`.
    ///
    /// Under [`PushPolicy::Ungated`] no `beforeChange` fires and a push cannot
    /// be vetoed; under [`PushPolicy::Gated`] it goes through the same gate
    /// as [`Tree::set_item`].
    pub fn push(&mut self, id: NodeId, value: impl Into<Value>) -> Result<Outcome, ProxyError> {
        let value = value.into();
        let index = self.length(id)?;
        if self.config.push == PushPolicy::Gated {
            let pending = PendingChange {
                target: id,
                key: Key::Index(index),
                before: Value::Undefined,
                after: value.clone(),
            };
            if self.emit_before(id, &pending)?.is_cancelled() {
                tracing::debug!(node = ?id, index, "push vetoed");
                return Ok(Outcome::Cancelled);
            }
        }

        let node = self.node(id)?;
        let index = match &node.kind {
            NodeKind::Sequence(seq) => seq.append(value.clone()),
            NodeKind::Object(_) => return Err(ProxyError::NotSequence),
        };
        let chain = node.kind.direct_chain(id);
        self.emit_change(
            id,
            Change {
                chain,
                target: id,
                key: Key::Index(index),
                before: Value::Undefined,
                after: value,
            },
        )?;
        Ok(Outcome::Completed)
    }

    /// Invoke a method of an object node with the node as receiver.
    pub fn call(&mut self, id: NodeId, name: &str, args: &[Value]) -> Result<Value, ProxyError> {
        let method = match &self.node(id)?.kind {
            NodeKind::Object(obj) => match obj.accessor(name) {
                Some(Accessor::Method(f)) => f.clone(),
                Some(Accessor::Property) => return Err(ProxyError::NotCallable(name.to_owned())),
                None => return Err(ProxyError::UnknownKey(name.to_owned())),
            },
            NodeKind::Sequence(_) => return Err(ProxyError::NotObject),
        };
        tracing::trace!(node = ?id, name, "calling method");
        method.invoke(self, id, args)
    }

    // ── Internals ────────────────────────────────────────────────────────

    fn expect_object(&self, id: NodeId) -> Result<(), ProxyError> {
        match self.node(id)?.kind {
            NodeKind::Object(_) => Ok(()),
            NodeKind::Sequence(_) => Err(ProxyError::NotObject),
        }
    }

    fn expect_sequence(&self, id: NodeId) -> Result<(), ProxyError> {
        match self.node(id)?.kind {
            NodeKind::Sequence(_) => Ok(()),
            NodeKind::Object(_) => Err(ProxyError::NotSequence),
        }
    }

    /// Drop the cached child at `key` unless it wraps exactly `value`.
    /// An unwrappable value always evicts.
    fn refresh_cache(&mut self, id: NodeId, key: &Key, value: &Value) -> Result<(), ProxyError> {
        let Some(cached) = self.node(id)?.kind.cached(key) else {
            return Ok(());
        };
        if can_wrap(value) && self.node(cached)?.kind.source().same(value) {
            return Ok(());
        }
        self.node_mut(id)?.kind.evict(key);
        self.node_mut(cached)?.parent = None;
        tracing::debug!(node = ?id, %key, evicted = ?cached, "evicted cached child");
        Ok(())
    }

    /// Fire `beforeChange` at `id` and each ancestor. Stops at the first
    /// veto.
    fn emit_before(&mut self, id: NodeId, event: &PendingChange) -> Result<Outcome, ProxyError> {
        let mut current = Some(id);
        while let Some(node) = current {
            let subs = self.node(node)?.before_change.subscriptions().to_vec();
            tracing::trace!(node = ?node, handlers = subs.len(), "beforeChange");
            if dispatch(self, &subs, event)?.is_cancelled() {
                return Ok(Outcome::Cancelled);
            }
            current = self.parent(node)?;
        }
        Ok(Outcome::Completed)
    }

    /// Fire `onChange` at `id`, then at each ancestor with the child it came
    /// through prepended to the chain. A handler returning `Cancel` ends the
    /// dispatch there, ancestors included; the write itself stands.
    fn emit_change(&mut self, id: NodeId, mut event: Change) -> Result<(), ProxyError> {
        let mut current = id;
        loop {
            let subs = self.node(current)?.on_change.subscriptions().to_vec();
            tracing::trace!(node = ?current, handlers = subs.len(), "onChange");
            if dispatch(self, &subs, &event)?.is_cancelled() {
                return Ok(());
            }
            let Some(parent) = self.parent(current)? else {
                return Ok(());
            };
            event.chain.insert(0, current);
            current = parent;
        }
    }
}
