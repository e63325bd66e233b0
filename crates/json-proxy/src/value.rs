//! Source data model.
//!
//! A [`Value`] is the raw, externally owned data a [`Tree`](crate::Tree)
//! observes. Objects and arrays are shared cells: cloning a `Value` clones
//! the reference, so the caller and every node wrapping the same object see
//! one piece of data, and writes made through the tree land in that data in
//! place.
//!
//! | Variant     | Wrapped as      | Notes                                   |
//! |-------------|-----------------|-----------------------------------------|
//! | `Undefined` | itself          | absent slot                             |
//! | `Null`      | itself          |                                         |
//! | `Bool`      | itself          | primitive                               |
//! | `Number`    | itself          | primitive, `serde_json::Number`         |
//! | `String`    | itself          | primitive                               |
//! | `Date`      | itself          | primitive, ms since the Unix epoch      |
//! | `Object`    | `ObjectNode`    | insertion-ordered keys                  |
//! | `Array`     | `SequenceNode`  |                                         |
//! | `Callable`  | method on owner | never wrapped on its own                |

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;
use serde_json::{Map, Number};

use crate::error::ProxyError;
use crate::tree::{NodeId, Tree};

/// Shared keyed source object.
pub type ObjectRef = Rc<RefCell<IndexMap<String, Value>>>;

/// Shared ordered source sequence.
pub type ArrayRef = Rc<RefCell<Vec<Value>>>;

type MethodFn = dyn Fn(&mut Tree, NodeId, &[Value]) -> Result<Value, ProxyError>;

/// A function stored in a source object.
///
/// When the owning object is wrapped, the function becomes a method of the
/// node: it is invoked with the tree and the node's id, so anything it writes
/// through the tree goes through the node's accessors and is observed.
#[derive(Clone)]
pub struct Callable(Rc<MethodFn>);

impl Callable {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&mut Tree, NodeId, &[Value]) -> Result<Value, ProxyError> + 'static,
    {
        Self(Rc::new(f))
    }

    pub fn invoke(
        &self,
        tree: &mut Tree,
        node: NodeId,
        args: &[Value],
    ) -> Result<Value, ProxyError> {
        (self.0)(tree, node, args)
    }
}

impl fmt::Debug for Callable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Callable({:p})", Rc::as_ptr(&self.0))
    }
}

impl PartialEq for Callable {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

/// Raw source value.
///
/// `PartialEq` is structural (deep) equality; use [`Value::same`] for
/// identity.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Value {
    #[default]
    Undefined,
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    /// Date-like timestamp in milliseconds since the Unix epoch.
    Date(i64),
    Object(ObjectRef),
    Array(ArrayRef),
    Callable(Callable),
}

impl Value {
    /// New shared object from key/value pairs, keeping their order.
    pub fn object<K, I>(entries: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Value)>,
    {
        let map: IndexMap<String, Value> =
            entries.into_iter().map(|(k, v)| (k.into(), v)).collect();
        Value::Object(Rc::new(RefCell::new(map)))
    }

    /// New shared array.
    pub fn array<I>(items: I) -> Self
    where
        I: IntoIterator<Item = Value>,
    {
        Value::Array(Rc::new(RefCell::new(items.into_iter().collect())))
    }

    pub fn callable<F>(f: F) -> Self
    where
        F: Fn(&mut Tree, NodeId, &[Value]) -> Result<Value, ProxyError> + 'static,
    {
        Value::Callable(Callable::new(f))
    }

    pub fn date(millis: i64) -> Self {
        Value::Date(millis)
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Number(n) => n.as_i64(),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => n.as_f64(),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Value::Object(obj) => Some(obj),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&ArrayRef> {
        match self {
            Value::Array(arr) => Some(arr),
            _ => None,
        }
    }

    /// Identity comparison.
    ///
    /// Objects, arrays and callables are the same only when they are the
    /// same allocation; everything else compares by value.
    pub fn same(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Object(a), Value::Object(b)) => Rc::ptr_eq(a, b),
            (Value::Array(a), Value::Array(b)) => Rc::ptr_eq(a, b),
            (Value::Callable(a), Value::Callable(b)) => a == b,
            (Value::Object(_) | Value::Array(_) | Value::Callable(_), _)
            | (_, Value::Object(_) | Value::Array(_) | Value::Callable(_)) => false,
            (a, b) => a == b,
        }
    }

    /// Render a JSON snapshot of the current data.
    ///
    /// `Undefined` and callables are dropped from objects and become `null`
    /// in arrays; dates render as their millisecond number.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Undefined | Value::Null | Value::Callable(_) => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Number(n) => serde_json::Value::Number(n.clone()),
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::Date(ms) => serde_json::Value::Number(Number::from(*ms)),
            Value::Object(obj) => {
                let mut out = Map::new();
                for (k, v) in obj.borrow().iter() {
                    if matches!(v, Value::Undefined | Value::Callable(_)) {
                        continue;
                    }
                    out.insert(k.clone(), v.to_json());
                }
                serde_json::Value::Object(out)
            }
            Value::Array(arr) => {
                serde_json::Value::Array(arr.borrow().iter().map(Value::to_json).collect())
            }
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => Value::Number(n),
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => Value::array(items.into_iter().map(Value::from)),
            serde_json::Value::Object(map) => {
                Value::object(map.into_iter().map(|(k, v)| (k, Value::from(v))))
            }
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<f64> for Value {
    /// Non-finite numbers have no JSON number form and become `Null`.
    fn from(n: f64) -> Self {
        Number::from_f64(n).map_or(Value::Null, Value::Number)
    }
}

macro_rules! impl_from_int {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Value {
                fn from(n: $t) -> Self {
                    Value::Number(Number::from(n))
                }
            }
        )*
    };
}

impl_from_int!(i32, i64, u32, u64, usize);

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        opt.map_or(Value::Null, Into::into)
    }
}
