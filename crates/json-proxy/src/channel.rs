//! Ordered, cancellable publish/subscribe.
//!
//! A [`Channel`] carries one kind of event for one owner. Handlers run in
//! subscription order with a `&mut` to the dispatch environment, so a handler
//! may read and write the tree that fired it; nested dispatch runs to
//! completion before the outer loop resumes.
//!
//! A handler stops the dispatch by returning [`Flow::Cancel`]. A handler
//! error is not caught: it ends the dispatch and is returned to whoever
//! triggered it.

use std::fmt;
use std::rc::Rc;

use crate::error::ProxyError;
use crate::tree::NodeId;
use crate::value::Value;

/// Identity a subscription is bound to. `clear` matches on it exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Context {
    Node(NodeId),
    Token(u64),
}

impl From<NodeId> for Context {
    fn from(id: NodeId) -> Self {
        Context::Node(id)
    }
}

/// Handler verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Flow {
    #[default]
    Continue,
    /// Stop dispatch. On `beforeChange` this vetoes the write.
    Cancel,
}

impl From<bool> for Flow {
    fn from(proceed: bool) -> Self {
        if proceed {
            Flow::Continue
        } else {
            Flow::Cancel
        }
    }
}

impl From<()> for Flow {
    fn from(_: ()) -> Self {
        Flow::Continue
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Completed,
    Cancelled,
}

impl Outcome {
    pub fn is_cancelled(self) -> bool {
        self == Outcome::Cancelled
    }
}

/// What a handler receives.
#[derive(Debug)]
pub struct Delivery<'a, E> {
    /// The subscription's bound receiver.
    pub context: Context,
    pub event: &'a E,
    /// Static data given at subscribe time.
    pub data: Option<&'a Value>,
}

pub type Handler<E, T> = Rc<dyn Fn(&mut T, &Delivery<'_, E>) -> Result<Flow, ProxyError>>;

pub struct Subscription<E, T> {
    handler: Handler<E, T>,
    context: Context,
    data: Option<Value>,
}

impl<E, T> Subscription<E, T> {
    pub fn context(&self) -> Context {
        self.context
    }

    pub fn data(&self) -> Option<&Value> {
        self.data.as_ref()
    }
}

impl<E, T> Clone for Subscription<E, T> {
    fn clone(&self) -> Self {
        Self {
            handler: Rc::clone(&self.handler),
            context: self.context,
            data: self.data.clone(),
        }
    }
}

impl<E, T> fmt::Debug for Subscription<E, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("context", &self.context)
            .field("data", &self.data)
            .finish_non_exhaustive()
    }
}

pub struct Channel<E, T> {
    owner: Context,
    subscriptions: Vec<Subscription<E, T>>,
}

impl<E, T> Channel<E, T> {
    pub fn new(owner: Context) -> Self {
        Self {
            owner,
            subscriptions: Vec::new(),
        }
    }

    pub fn owner(&self) -> Context {
        self.owner
    }

    /// Append a subscription. `context` defaults to the channel owner.
    /// Nothing is de-duplicated.
    pub fn subscribe<F>(&mut self, handler: F, context: Option<Context>, data: Option<Value>)
    where
        F: Fn(&mut T, &Delivery<'_, E>) -> Result<Flow, ProxyError> + 'static,
    {
        self.subscriptions.push(Subscription {
            handler: Rc::new(handler),
            context: context.unwrap_or(self.owner),
            data,
        });
    }

    /// Remove subscriptions bound to `context`, or all of them when `None`.
    /// Returns how many were removed.
    pub fn clear(&mut self, context: Option<Context>) -> usize {
        let before = self.subscriptions.len();
        match context {
            Some(ctx) => self.subscriptions.retain(|s| s.context != ctx),
            None => self.subscriptions.clear(),
        }
        before - self.subscriptions.len()
    }

    pub fn len(&self) -> usize {
        self.subscriptions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscriptions.is_empty()
    }

    pub fn subscriptions(&self) -> &[Subscription<E, T>] {
        &self.subscriptions
    }

    /// Fire on a channel that is not itself part of `env`.
    pub fn fire(&self, env: &mut T, event: &E) -> Result<Outcome, ProxyError> {
        let snapshot = self.subscriptions.clone();
        dispatch(env, &snapshot, event)
    }
}

impl<E, T> fmt::Debug for Channel<E, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Channel")
            .field("owner", &self.owner)
            .field("subscriptions", &self.subscriptions.len())
            .finish()
    }
}

/// Run `subscriptions` in order against `env`.
///
/// Callers that keep the channel inside `env` clone the subscription list
/// first and pass the snapshot here.
pub fn dispatch<E, T>(
    env: &mut T,
    subscriptions: &[Subscription<E, T>],
    event: &E,
) -> Result<Outcome, ProxyError> {
    for (position, sub) in subscriptions.iter().enumerate() {
        let delivery = Delivery {
            context: sub.context,
            event,
            data: sub.data.as_ref(),
        };
        if (sub.handler)(env, &delivery)? == Flow::Cancel {
            tracing::debug!(position, context = ?sub.context, "dispatch cancelled by subscriber");
            return Ok(Outcome::Cancelled);
        }
    }
    Ok(Outcome::Completed)
}
