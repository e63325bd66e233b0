//! Observable proxies over shared JSON-like data.
//!
//! A [`Tree`] wraps a source object or array in a node. Reading through a
//! node returns child nodes for nested containers and raw values for
//! everything else; writing through a node fires a cancellable
//! `beforeChange`, commits to the source in place, then fires `onChange`.
//! Both notifications bubble from the written node to every ancestor.
//!
//! ```
//! use std::cell::RefCell;
//! use std::rc::Rc;
//!
//! use json_proxy::{Flow, Tree, Value};
//! use serde_json::json;
//!
//! let mut tree = Tree::new();
//! let model = tree.wrap(Value::from(json!({"a": {"b": "B"}}))).unwrap();
//!
//! let seen = Rc::new(RefCell::new(Vec::new()));
//! let sink = Rc::clone(&seen);
//! tree.on_change_mut(model).unwrap().subscribe(
//!     move |_, d| {
//!         sink.borrow_mut().push(d.event.clone());
//!         Ok(Flow::Continue)
//!     },
//!     None,
//!     None,
//! );
//!
//! let a = tree.get(model, "a").unwrap().as_node().unwrap();
//! tree.set(a, "b", "C").unwrap();
//!
//! let seen = seen.borrow();
//! assert_eq!(seen.len(), 1);
//! assert_eq!(seen[0].origin(), Some(a));
//! assert_eq!(seen[0].after, Value::from("C"));
//! ```
//!
//! # Module layout
//!
//! | Module      | Contents                                              |
//! |-------------|-------------------------------------------------------|
//! | [`value`]   | source data model with shared objects and arrays      |
//! | [`channel`] | ordered, cancellable publish/subscribe                |
//! | [`factory`] | value classification, [`Proxied`]                     |
//! | [`node`]    | object and sequence node variants                     |
//! | [`tree`]    | node arena, reads, writes, bubbling                   |
//! | [`handles`] | borrowed per-node views                               |
//! | [`events`]  | event payloads                                        |
//! | [`config`]  | tree configuration                                    |

pub mod channel;
pub mod config;
pub mod error;
pub mod events;
pub mod factory;
pub mod handles;
pub mod node;
pub mod path;
pub mod tree;
pub mod value;

pub use channel::{Channel, Context, Delivery, Flow, Outcome, Subscription};
pub use config::{PushPolicy, TreeConfig};
pub use error::{BoxError, ProxyError};
pub use events::{Change, Key, PendingChange};
pub use factory::{can_wrap, classify, Kind, Proxied};
pub use handles::{ObjectHandle, SequenceHandle};
pub use path::parse_pointer;
pub use tree::{BeforeChange, NodeId, OnChange, Tree};
pub use value::{ArrayRef, Callable, ObjectRef, Value};
