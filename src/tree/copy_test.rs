use std::sync::Arc;

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::Rng;
use rand::SeedableRng;

use super::*;

fn shape(node: &ConfigNode) -> String {
    let children: Vec<String> = node.children().iter().map(shape).collect();
    format!("{}={:?}[{}]", node.name(), node.value(), children.join(","))
}

/// Shape with children in name order, for merges that keep existing order.
fn sorted_shape(node: &ConfigNode) -> String {
    let mut children: Vec<String> = node.children().iter().map(sorted_shape).collect();
    children.sort();
    format!("{}={:?}[{}]", node.name(), node.value(), children.join(","))
}

fn count_events(node: &ConfigNode) -> (Arc<Mutex<usize>>, Subscription) {
    let count = Arc::new(Mutex::new(0));
    let sink = count.clone();
    let subscription = node.subscribe_fn(None, move |_| *sink.lock() += 1);
    (count, subscription)
}

fn random_tree(
    rng: &mut StdRng,
    node: &ConfigNode,
    depth: usize,
) {
    for _ in 0..rng.gen_range(0..4) {
        let name = ["a", "b", "c", "d"][rng.gen_range(0..4)];
        let child = node.add(name).unwrap();
        if rng.gen_bool(0.5) {
            child.set_value(Some(&rng.gen_range(0..3).to_string())).unwrap();
        }
        if depth > 0 {
            random_tree(rng, &child, depth - 1);
        }
    }
}

#[test]
fn test_copy_into_empty_node() {
    let source = ConfigNode::new_root("source").unwrap();
    source.set("server/host", Some("localhost")).unwrap();
    source.set("server/port", Some("8080")).unwrap();
    let target = ConfigNode::new_root("target").unwrap();

    target.copy_from(&source, true).unwrap();

    assert_eq!(target.get("server/host").unwrap(), Some("localhost".to_string()));
    assert_eq!(target.get("server/port").unwrap(), Some("8080".to_string()));
}

#[test]
fn test_copy_keeps_matched_children_by_identity() {
    let source = ConfigNode::new_root("source").unwrap();
    source.set("a", Some("1")).unwrap();
    source.set("b", Some("2")).unwrap();
    let target = ConfigNode::new_root("target").unwrap();
    let a = target.add("a").unwrap();
    let (count, _subscription) = count_events(&target);

    target.copy_from(&source, true).unwrap();

    assert_eq!(target.child_named("a"), Some(a.clone()));
    assert_eq!(a.value(), Some("1".to_string()));
    // one set on a, one add of b
    assert_eq!(*count.lock(), 2);
}

#[test]
fn test_copy_remove_extras() {
    let source = ConfigNode::new_root("source").unwrap();
    source.add("keep").unwrap();
    let target = ConfigNode::new_root("target").unwrap();
    target.add("extra").unwrap();
    target.add("keep").unwrap();

    target.copy_from(&source, false).unwrap();
    let names: Vec<String> = target.children().iter().map(ConfigNode::name).collect();
    assert_eq!(names, vec!["extra", "keep"]);

    target.copy_from(&source, true).unwrap();
    let names: Vec<String> = target.children().iter().map(ConfigNode::name).collect();
    assert_eq!(names, vec!["keep"]);
}

#[test]
fn test_copy_inserts_in_source_order() {
    let source = ConfigNode::new_root("source").unwrap();
    for name in ["a", "b", "c", "d"] {
        source.add(name).unwrap();
    }
    let target = ConfigNode::new_root("target").unwrap();
    target.add("b").unwrap();
    target.add("d").unwrap();

    target.copy_from(&source, true).unwrap();
    assert_eq!(shape(&target).replace("target", "source"), shape(&source));
}

#[test]
fn test_copy_twice_is_idempotent_on_random_trees() {
    let mut rng = StdRng::seed_from_u64(0x0b5e);
    for _ in 0..50 {
        let source = ConfigNode::new_root("root").unwrap();
        random_tree(&mut rng, &source, 2);
        let target = ConfigNode::new_root("root").unwrap();
        random_tree(&mut rng, &target, 2);

        target.copy_from(&source, true).unwrap();
        assert_eq!(sorted_shape(&target), sorted_shape(&source));

        let (count, subscription) = count_events(&target);
        target.copy_from(&source, true).unwrap();
        assert_eq!(*count.lock(), 0);
        drop(subscription);
    }
}

#[test]
fn test_copy_pairs_children_by_name_in_any_order() {
    let source = ConfigNode::new_root("source").unwrap();
    source.set("a", Some("2")).unwrap();
    source.set("b", Some("2")).unwrap();
    let target = ConfigNode::new_root("target").unwrap();
    let b = target.add("b").unwrap();
    b.set_value(Some("1")).unwrap();
    let keep = b.add("keep").unwrap();
    let a = target.add("a").unwrap();
    a.set_value(Some("1")).unwrap();

    target.copy_from(&source, false).unwrap();

    assert_eq!(target.children(), vec![b.clone(), a.clone()]);
    assert_eq!(target.children_named("b").len(), 1);
    assert_eq!(b.value().as_deref(), Some("2"));
    assert_eq!(a.value().as_deref(), Some("2"));
    assert_eq!(b.children(), vec![keep]);
}

#[test]
fn test_copy_remove_extras_keeps_reordered_children() {
    let source = ConfigNode::new_root("source").unwrap();
    source.set("a", Some("2")).unwrap();
    source.set("b/keep", Some("x")).unwrap();
    let target = ConfigNode::new_root("target").unwrap();
    target.set("b/keep", Some("y")).unwrap();
    target.set("a", Some("1")).unwrap();
    let b = target.require("b").unwrap();
    let keep = target.require("b/keep").unwrap();

    target.copy_from(&source, true).unwrap();

    assert!(!b.is_removed());
    assert!(!keep.is_removed());
    assert_eq!(target.child_count(), 2);
    assert_eq!(target.child_named("b"), Some(b));
    assert_eq!(keep.value().as_deref(), Some("x"));
    assert_eq!(target.get("a").unwrap().as_deref(), Some("2"));

    let (count, _subscription) = count_events(&target);
    target.copy_from(&source, true).unwrap();
    assert_eq!(*count.lock(), 0);
}

#[test]
fn test_copy_appends_same_named_children_after_paired_ones() {
    let source = ConfigNode::new_root("source").unwrap();
    for (name, value) in [("x", "2"), ("a", "0"), ("x", "3")] {
        source.add(name).unwrap().set_value(Some(value)).unwrap();
    }
    let target = ConfigNode::new_root("target").unwrap();
    target.add("a").unwrap().set_value(Some("0")).unwrap();
    target.add("x").unwrap().set_value(Some("1")).unwrap();

    target.copy_from(&source, true).unwrap();
    let values: Vec<Option<String>> = target.children_named("x").iter().map(ConfigNode::value).collect();
    assert_eq!(values, vec![Some("2".to_string()), Some("3".to_string())]);

    let (count, _subscription) = count_events(&target);
    target.copy_from(&source, true).unwrap();
    assert_eq!(*count.lock(), 0);
}

#[test]
fn test_copy_within_same_tree() {
    let root = ConfigNode::new_root("config").unwrap();
    root.set("template/port", Some("80")).unwrap();
    let target = root.add("instance").unwrap();

    target.copy_from(&root.require("template").unwrap(), true).unwrap();
    assert_eq!(root.get("instance/port").unwrap(), Some("80".to_string()));
}

#[test]
fn test_copy_into_removed_node_fails() {
    let root = ConfigNode::new_root("config").unwrap();
    let gone = root.add("gone").unwrap();
    gone.remove();
    let source = ConfigNode::new_root("source").unwrap();
    assert!(gone.copy_from(&source, true).unwrap_err().is_illegal_state());
}
