#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;

use json_proxy::{Change, Context, Flow, NodeId, PendingChange, Tree, Value};
use serde_json::json;

/// One `onChange` delivery as a subscriber saw it.
#[derive(Debug, Clone, PartialEq)]
pub struct Seen {
    pub at: NodeId,
    pub context: Context,
    pub change: Change,
}

pub type Log = Rc<RefCell<Vec<Seen>>>;

pub fn new_log() -> Log {
    Rc::new(RefCell::new(Vec::new()))
}

/// Subscribe a recorder to `onChange` on `at`, bound to `context` (default:
/// the node).
pub fn log_changes(tree: &mut Tree, at: NodeId, log: &Log, context: Option<Context>) {
    let sink = Rc::clone(log);
    tree.on_change_mut(at).unwrap().subscribe(
        move |_, d| {
            sink.borrow_mut().push(Seen {
                at,
                context: d.context,
                change: d.event.clone(),
            });
            Ok(Flow::Continue)
        },
        context,
        None,
    );
}

/// Subscribe a recorder to `beforeChange` on `at`.
pub fn log_pending(tree: &mut Tree, at: NodeId) -> Rc<RefCell<Vec<PendingChange>>> {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    tree.before_change_mut(at).unwrap().subscribe(
        move |_, d| {
            sink.borrow_mut().push(d.event.clone());
            Ok(Flow::Continue)
        },
        None,
        None,
    );
    seen
}

/// Subscribe a `beforeChange` handler that vetoes everything.
pub fn veto_all(tree: &mut Tree, at: NodeId) {
    tree.before_change_mut(at)
        .unwrap()
        .subscribe(|_, _| Ok(Flow::Cancel), None, None);
}

/// A rich enough record to exercise objects, nulls and nested sequences.
pub fn dummy_model() -> Value {
    Value::from(json!({
        "title": "name1",
        "description": "description1",
        "owner": null,
        "product": {
            "name": "MarkLogic Server",
            "version": "4.2-1"
        },
        "tags": ["security", "standards"]
    }))
}
