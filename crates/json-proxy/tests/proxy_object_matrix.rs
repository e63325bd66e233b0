mod common;

use common::{dummy_model, log_changes, log_pending, new_log, veto_all};
use json_proxy::{Context, Flow, Key, Outcome, Proxied, ProxyError, Tree, Value};
use serde_json::json;

#[test]
fn proxy_object_matrix_property_writes_reach_the_source() {
    let rfe = dummy_model();
    let mut tree = Tree::new();
    let model = tree.wrap(rfe.clone()).unwrap();
    let log = new_log();
    log_changes(&mut tree, model, &log, None);

    assert_eq!(tree.get(model, "title").unwrap().as_str(), Some("name1"));

    tree.set(model, "title", "another new name").unwrap();
    assert_eq!(tree.get(model, "title").unwrap().as_str(), Some("another new name"));
    assert_eq!(rfe.to_json()["title"], json!("another new name"));
    assert_eq!(log.borrow().len(), 1);

    tree.set(model, "owner", "jmakeig").unwrap();
    assert_eq!(rfe.to_json()["owner"], json!("jmakeig"));
    assert_eq!(log.borrow().len(), 2);

    let last = log.borrow()[1].clone();
    assert_eq!(last.change.chain, vec![model]);
    assert_eq!(last.change.key, Key::from("owner"));
    assert_eq!(last.change.before, Value::Null);
    assert_eq!(last.change.after, Value::from("jmakeig"));
}

#[test]
fn proxy_object_matrix_methods_run_against_the_node() {
    let obj = Value::object([
        ("a", Value::from("asdf")),
        ("b", Value::callable(|tree, me, _| tree.source(me))),
        ("c", Value::date(1_286_668_800_000)),
        ("e", Value::from(44)),
        ("f", Value::from(json!({"a": "asdf"}))),
        (
            "g",
            Value::callable(|tree, me, args| {
                let value = args.first().cloned().unwrap_or_default();
                tree.set(me, "e", value)?;
                Ok(Value::Undefined)
            }),
        ),
        ("h", Value::callable(|tree, me, _| tree.call(me, "b", &[]))),
    ]);
    let mut tree = Tree::new();
    let model = tree.wrap(obj.clone()).unwrap();
    let log = new_log();
    log_changes(&mut tree, model, &log, None);

    assert!(tree.call(model, "b", &[]).unwrap().same(&obj));
    assert!(log.borrow().is_empty());

    tree.call(model, "g", &[Value::from("new value")]).unwrap();
    assert_eq!(tree.get(model, "e").unwrap().as_str(), Some("new value"));
    assert_eq!(log.borrow().len(), 1);
    assert_eq!(obj.to_json()["e"], json!("new value"));

    assert!(tree.call(model, "h", &[]).unwrap().same(&obj));
    assert!(matches!(tree.call(model, "a", &[]), Err(ProxyError::NotCallable(_))));
    assert!(matches!(tree.set(model, "g", 1), Err(ProxyError::MethodSlot(_))));
}

#[test]
fn proxy_object_matrix_child_and_parent_both_notified() {
    let mut tree = Tree::new();
    let model = tree.wrap(dummy_model()).unwrap();
    let log = new_log();
    log_changes(&mut tree, model, &log, None);

    let product = tree.get(model, "product").unwrap().as_node().unwrap();
    log_changes(&mut tree, product, &log, None);
    assert_eq!(tree.on_change(product).unwrap().len(), 1);

    tree.set(product, "name", "RFE Track").unwrap();
    let log = log.borrow();
    assert_eq!(log.len(), 2);

    // The child's own subscribers run first, then the parent's.
    assert_eq!(log[0].at, product);
    assert_eq!(log[0].context, Context::Node(product));
    assert_eq!(log[0].change.chain, vec![product]);
    assert_eq!(log[1].at, model);
    assert_eq!(log[1].context, Context::Node(model));
    assert_eq!(log[1].change.chain, vec![product, product]);
    assert_eq!(log[1].change.key, Key::from("name"));
    assert_eq!(log[1].change.after, Value::from("RFE Track"));
    assert_ne!(log[0].context, log[1].context);
}

#[test]
fn proxy_object_matrix_bubbled_change_names_the_child() {
    let mut tree = Tree::new();
    let model = tree.wrap(Value::from(json!({"a": {"b": "B"}}))).unwrap();
    let log = new_log();
    log_changes(&mut tree, model, &log, None);

    let a = tree.get(model, "a").unwrap().as_node().unwrap();
    tree.set(a, "b", "C").unwrap();

    let log = log.borrow();
    assert_eq!(log.len(), 1);
    let change = &log[0].change;
    assert_eq!(change.origin(), Some(tree.get(model, "a").unwrap().as_node().unwrap()));
    assert_eq!(change.target, a);
    assert!(change.is_bubbled(model));
    assert_eq!(change.key, Key::from("b"));
    assert_eq!(change.before, Value::from("B"));
    assert_eq!(change.after, Value::from("C"));
}

#[test]
fn proxy_object_matrix_every_ancestor_fires_once() {
    let mut tree = Tree::new();
    let root = tree.wrap(Value::from(json!({"x": {"y": {"z": 1}}}))).unwrap();
    let x = tree.find(root, "/x").unwrap().as_node().unwrap();
    let y = tree.find(root, "/x/y").unwrap().as_node().unwrap();

    let log = new_log();
    for node in [root, x, y] {
        log_changes(&mut tree, node, &log, None);
    }
    tree.set(y, "z", 2).unwrap();

    let log = log.borrow();
    let seen: Vec<_> = log.iter().map(|s| (s.at, s.change.chain.clone())).collect();
    assert_eq!(
        seen,
        vec![(y, vec![y]), (x, vec![y, y]), (root, vec![x, y, y])]
    );
}

#[test]
fn proxy_object_matrix_veto_leaves_source_untouched() {
    let rfe = dummy_model();
    let mut tree = Tree::new();
    let model = tree.wrap(rfe.clone()).unwrap();
    let log = new_log();
    log_changes(&mut tree, model, &log, None);
    veto_all(&mut tree, model);

    let before = tree.get(model, "owner").unwrap();
    let outcome = tree.set(model, "owner", "something new").unwrap();
    assert_eq!(outcome, Outcome::Cancelled);
    assert_eq!(tree.get(model, "owner").unwrap(), before);
    assert_eq!(rfe.to_json()["owner"], json!(null));
    assert!(log.borrow().is_empty());
}

#[test]
fn proxy_object_matrix_ancestor_veto_cancels_nested_write() {
    let mut tree = Tree::new();
    let model = tree.wrap(dummy_model()).unwrap();
    let product = tree.get(model, "product").unwrap().as_node().unwrap();
    let pending = log_pending(&mut tree, product);
    let log = new_log();
    log_changes(&mut tree, product, &log, None);
    veto_all(&mut tree, model);

    assert!(tree.set(product, "version", "5.0").unwrap().is_cancelled());
    assert_eq!(tree.get(product, "version").unwrap().as_str(), Some("4.2-1"));
    assert_eq!(pending.borrow().len(), 1);
    assert_eq!(pending.borrow()[0].target, product);
    assert!(log.borrow().is_empty());
}

#[test]
fn proxy_object_matrix_null_then_object_assignment() {
    let rfe = dummy_model();
    let mut tree = Tree::new();
    let model = tree.wrap(rfe.clone()).unwrap();
    let log = new_log();
    log_changes(&mut tree, model, &log, None);

    let product = tree.get(model, "product").unwrap().as_node().unwrap();
    tree.set(model, "product", Value::Null).unwrap();
    assert_eq!(log.borrow().len(), 1);
    assert!(tree.get(model, "product").unwrap().is_null());
    assert_eq!(tree.parent(product).unwrap(), None);

    tree.set(model, "product", Value::from(json!({"a": "sdf", "b": "qwer"}))).unwrap();
    assert_eq!(log.borrow().len(), 2);
    let fresh = tree.get(model, "product").unwrap().as_node().unwrap();
    assert_ne!(fresh, product);
    assert_eq!(tree.get(fresh, "a").unwrap().as_str(), Some("sdf"));

    // The source holds plain data, never nodes.
    let raw = rfe.as_object().unwrap().borrow().get("product").cloned().unwrap();
    assert_eq!(raw.to_json(), json!({"a": "sdf", "b": "qwer"}));
}

#[test]
fn proxy_object_matrix_key_set_is_fixed_at_construction() {
    let source = Value::from(json!({"a": 1}));
    let mut tree = Tree::new();
    let model = tree.wrap(source.clone()).unwrap();
    source
        .as_object()
        .unwrap()
        .borrow_mut()
        .insert("late".into(), Value::from(2));

    assert_eq!(tree.keys(model).unwrap(), vec!["a".to_string()]);
    assert!(matches!(tree.get(model, "late"), Err(ProxyError::UnknownKey(k)) if k == "late"));

    // A node built afterwards over the same source sees the new key.
    let later = tree.wrap(source).unwrap();
    assert_ne!(later, model);
    assert_eq!(tree.get(later, "late").unwrap(), Proxied::Value(Value::from(2)));
}

#[test]
fn proxy_object_matrix_subscriber_errors_surface_around_the_commit() {
    let mut tree = Tree::new();
    let model = tree.wrap(Value::from(json!({"k": 1}))).unwrap();

    tree.before_change_mut(model)
        .unwrap()
        .subscribe(|_, _| Err(ProxyError::subscriber("rejected")), None, None);
    assert!(matches!(tree.set(model, "k", 2), Err(ProxyError::Subscriber(_))));
    assert_eq!(tree.get(model, "k").unwrap(), Proxied::Value(Value::from(1)));

    tree.before_change_mut(model).unwrap().clear(None);
    tree.on_change_mut(model)
        .unwrap()
        .subscribe(|_, _| Err(ProxyError::subscriber("too late")), None, None);
    assert!(matches!(tree.set(model, "k", 3), Err(ProxyError::Subscriber(_))));
    assert_eq!(tree.get(model, "k").unwrap(), Proxied::Value(Value::from(3)));
}

#[test]
fn proxy_object_matrix_handle_subscriptions_use_node_context() {
    let mut tree = Tree::new();
    let model = tree.wrap(Value::from(json!({"k": 1}))).unwrap();
    let mut obj = tree.object(model).unwrap();
    obj.on_change(|_, d| {
        assert_eq!(d.context, Context::Node(d.event.target));
        Ok(Flow::Continue)
    })
    .unwrap();
    obj.before_change(|_, d| Ok(Flow::from(d.event.after != Value::from(0)))).unwrap();

    assert_eq!(obj.set("k", 0).unwrap(), Outcome::Cancelled);
    assert_eq!(obj.set("k", 5).unwrap(), Outcome::Completed);
    assert_eq!(obj.source().unwrap().to_json(), json!({"k": 5}));
}
