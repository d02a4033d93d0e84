use std::sync::Arc;

use parking_lot::Mutex;

use super::*;
use crate::ConfigPath;
use crate::Error;

fn recorder(node: &ConfigNode) -> (Arc<Mutex<Vec<ConfigEvent>>>, Subscription) {
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = events.clone();
    let subscription = node.subscribe_fn(None, move |event| sink.lock().push(event.clone()));
    (events, subscription)
}

fn names(nodes: &[ConfigNode]) -> Vec<String> {
    nodes.iter().map(ConfigNode::name).collect()
}

#[test]
fn test_new_root_rejects_empty_name() {
    let err = ConfigNode::new_root("").unwrap_err();
    assert!(err.is_illegal_argument());
}

#[test]
fn test_root_has_no_parent_or_element() {
    let root = ConfigNode::new_root("config").unwrap();
    assert!(root.parent().is_none());
    assert!(root.element_id().is_none());
    assert_eq!(root.depth(), 0);
    assert_eq!(root.path_string(), "config");
}

#[test]
fn test_add_child_placement() {
    let root = ConfigNode::new_root("config").unwrap();
    let a = root.add("a").unwrap();
    let c = root.add("c").unwrap();
    let b = root
        .add_child(Placement::after(a.element_id().unwrap()), "b", |_| Ok(()))
        .unwrap();
    let first = root.add_child(Placement::first(), "first", |_| Ok(())).unwrap();
    let before_c = root
        .add_child(Placement::before(c.element_id().unwrap()), "before-c", |_| Ok(()))
        .unwrap();

    assert_eq!(names(&root.children()), vec!["first", "a", "b", "before-c", "c"]);
    assert_eq!(root.index_of(b.element_id().unwrap()), Some(2));
    assert_eq!(root.child_at(0), Some(first));
    assert_eq!(before_c.parent(), Some(root.clone()));
    assert_eq!(root.child_count(), 5);
}

#[test]
fn test_add_child_between_bounds() {
    let root = ConfigNode::new_root("config").unwrap();
    let a = root.add("a").unwrap();
    let b = root.add("b").unwrap();
    let c = root.add("c").unwrap();
    let placement = Placement::between(a.element_id().unwrap(), c.element_id().unwrap());

    root.add_child(placement, "first-slot", |_| Ok(())).unwrap();
    root.add_child(placement.prefer_first(false), "last-slot", |_| Ok(())).unwrap();
    assert_eq!(names(&root.children()), vec!["a", "first-slot", "b", "last-slot", "c"]);

    let inverted = Placement::between(c.element_id().unwrap(), b.element_id().unwrap());
    assert!(root.add_child(inverted, "x", |_| Ok(())).unwrap_err().is_illegal_argument());
}

#[test]
fn test_add_child_rejects_empty_name() {
    let root = ConfigNode::new_root("config").unwrap();
    let err = root.add("").unwrap_err();
    assert!(matches!(err, Error::IllegalArgument(_)));
    assert_eq!(root.child_count(), 0);
}

#[test]
fn test_pre_init_builds_child_before_single_add_event() {
    let root = ConfigNode::new_root("config").unwrap();
    let (events, _subscription) = recorder(&root);

    let server = root
        .add_child(Placement::last(), "server", |server| {
            server.add("host")?.set_value(Some("localhost"))?;
            server.add("port")?.set_value(Some("8080"))
        })
        .unwrap();

    let events = events.lock();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].kind(), ChangeKind::Add);
    assert_eq!(events[0].relative_path(), &[server.clone()]);
    assert_eq!(server.get("port").unwrap(), Some("8080".to_string()));
}

#[test]
fn test_pre_init_failure_adds_nothing() {
    let root = ConfigNode::new_root("config").unwrap();
    let err = root
        .add_child(Placement::last(), "server", |_| {
            Err(Error::IllegalState("not ready".to_string()))
        })
        .unwrap_err();
    assert!(err.is_illegal_state());
    assert_eq!(root.child_count(), 0);
}

#[test]
fn test_structural_identity_resolves_until_removed() {
    let root = ConfigNode::new_root("config").unwrap();
    let a = root.add("a").unwrap();
    let b = root.add("b").unwrap();
    let id = b.element_id().unwrap();
    assert_eq!(root.child(id).unwrap(), b);

    a.remove();
    assert_eq!(root.child(id).unwrap(), b);
    assert_eq!(root.index_of(id), Some(0));

    b.remove();
    assert!(b.is_removed());
    assert!(b.element_id().is_none());
    assert!(b.parent().is_none());
    assert!(root.child(id).unwrap_err().is_illegal_state());

    // A reused slot does not revive the stale identity
    let c = root.add("c").unwrap();
    assert_ne!(c.element_id(), Some(id));
    assert!(root.child(id).is_err());
}

#[test]
fn test_remove_is_idempotent() {
    let root = ConfigNode::new_root("config").unwrap();
    let child = root.add("child").unwrap();
    let (events, _subscription) = recorder(&root);

    child.remove();
    child.remove();
    root.remove();

    assert_eq!(events.lock().len(), 1);
    assert!(!root.is_removed());
}

#[test]
fn test_remove_after_parent_dropped_clears_identity() {
    let root = ConfigNode::new_root("config").unwrap();
    let child = root.add("child").unwrap();
    assert!(child.element_id().is_some());
    drop(root);

    child.remove();
    assert_eq!(child.element_id(), None);
    assert!(child.is_removed());
    assert!(child.set_value(Some("x")).unwrap_err().is_illegal_state());
}

#[test]
fn test_mutating_removed_node_is_illegal_state() {
    let root = ConfigNode::new_root("config").unwrap();
    let child = root.add("child").unwrap();
    child.remove();

    assert!(child.set_value(Some("x")).unwrap_err().is_illegal_state());
    assert!(child.set_name("other").unwrap_err().is_illegal_state());
    assert!(child.add("grandchild").unwrap_err().is_illegal_state());
}

#[test]
fn test_remove_completes_own_listeners_and_bubbles() {
    let root = ConfigNode::new_root("config").unwrap();
    let server = root.add("server").unwrap();
    let port = server.add("port").unwrap();

    let mut own = MockConfigObserver::new();
    own.expect_on_event().times(0);
    own.expect_on_completed().times(1).returning(|event| {
        assert_eq!(event.kind(), ChangeKind::Remove);
        assert!(event.relative_path().is_empty());
    });
    let _own = port.subscribe(None, Arc::new(own));
    let (events, _subscription) = recorder(&root);

    port.remove();

    assert_eq!(port.listener_count(), 0);
    let events = events.lock();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].relative_path(), &[server.clone(), port.clone()]);
    assert_eq!(events[0].old_name(), "port");
    assert_eq!(events[0].target(), &port);
}

#[test]
fn test_set_value_event_carries_old_value() {
    let root = ConfigNode::new_root("config").unwrap();
    root.set("server/port", Some("8080")).unwrap();
    let (events, _subscription) = recorder(&root);

    root.set("server/port", Some("9090")).unwrap();

    let events = events.lock();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].kind(), ChangeKind::Set);
    assert_eq!(events[0].old_value(), Some("8080"));
    assert_eq!(names(events[0].relative_path()), vec!["server", "port"]);
}

#[test]
fn test_set_name_event_carries_old_name() {
    let root = ConfigNode::new_root("config").unwrap();
    let child = root.add("before").unwrap();
    let (events, _subscription) = recorder(&root);

    child.set_name("after").unwrap();

    assert_eq!(child.name(), "after");
    let events = events.lock();
    assert_eq!(events[0].old_name(), "before");
    assert!(child.set_name("").unwrap_err().is_illegal_argument());
}

#[test]
fn test_event_bubbles_once_per_ancestor() {
    let root = ConfigNode::new_root("config").unwrap();
    let leaf = root.set("a/b/c", Some("1")).and_then(|_| root.require("a/b/c")).unwrap();
    let a = root.require("a").unwrap();
    let b = root.require("a/b").unwrap();
    let (at_root, _s1) = recorder(&root);
    let (at_a, _s2) = recorder(&a);
    let (at_b, _s3) = recorder(&b);
    let (at_leaf, _s4) = recorder(&leaf);

    leaf.set_value(Some("2")).unwrap();

    assert_eq!(at_leaf.lock()[0].relative_path().len(), 0);
    assert_eq!(at_b.lock()[0].relative_path().len(), 1);
    assert_eq!(at_a.lock()[0].relative_path().len(), 2);
    assert_eq!(at_root.lock()[0].relative_path().len(), 3);
    for events in [&at_root, &at_a, &at_b, &at_leaf] {
        assert_eq!(events.lock().len(), 1);
    }
    assert_eq!(at_root.lock()[0].target(), &leaf);
}

#[test]
fn test_path_filtered_subscription() {
    let root = ConfigNode::new_root("config").unwrap();
    root.set("server/port", Some("8080")).unwrap();
    root.set("client/port", Some("1")).unwrap();
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = events.clone();
    let _subscription = root.subscribe_fn(Some(ConfigPath::parse("server/*").unwrap()), move |event| {
        sink.lock().push(event.to_string())
    });

    root.set("server/port", Some("9090")).unwrap();
    root.set("client/port", Some("2")).unwrap();
    root.set("server/host/name", Some("x")).unwrap();

    assert_eq!(*events.lock(), vec!["config:set server/port", "config:add server/host"]);
}

#[test]
fn test_unsubscribe_from_inside_callback() {
    let root = ConfigNode::new_root("config").unwrap();
    let slot: Arc<Mutex<Option<Subscription>>> = Arc::new(Mutex::new(None));
    let calls = Arc::new(Mutex::new(0));
    let (slot_in, calls_in) = (slot.clone(), calls.clone());
    let subscription = root.subscribe_fn(None, move |_| {
        *calls_in.lock() += 1;
        slot_in.lock().take();
    });
    *slot.lock() = Some(subscription);

    root.add("a").unwrap();
    root.add("b").unwrap();

    assert_eq!(*calls.lock(), 1);
    assert_eq!(root.listener_count(), 0);
}

#[test]
fn test_listener_may_mutate_during_dispatch() {
    let root = ConfigNode::new_root("config").unwrap();
    let mirror = root.add("mirror").unwrap();
    let source = root.add("source").unwrap();
    let target = mirror.clone();
    let _subscription = source.subscribe_fn(None, move |event| {
        if event.kind() == ChangeKind::Set {
            let _ = target.set_value(event.config().value().as_deref());
        }
    });

    source.set_value(Some("42")).unwrap();
    assert_eq!(mirror.value(), Some("42".to_string()));
}

#[test]
fn test_move_child_keeps_content_and_flags_move() {
    let root = ConfigNode::new_root("config").unwrap();
    let a = root.add("a").unwrap();
    a.set("inner", Some("v")).unwrap();
    let b = root.add("b").unwrap();
    let (events, _subscription) = recorder(&root);
    let removed_seen = Arc::new(Mutex::new(false));
    let flag = removed_seen.clone();

    let moved = root
        .move_child(&a, Placement::after(b.element_id().unwrap()), |old| {
            *flag.lock() = old.is_removed();
        })
        .unwrap();

    assert!(*removed_seen.lock());
    assert_eq!(names(&root.children()), vec!["b", "a"]);
    assert_eq!(moved.get("inner").unwrap(), Some("v".to_string()));
    assert_ne!(moved, a);
    let events = events.lock();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].kind(), ChangeKind::Remove);
    assert_eq!(events[1].kind(), ChangeKind::Add);
    assert!(events.iter().all(ConfigEvent::is_move));
}

#[test]
fn test_move_child_rejects_foreign_child() {
    let root = ConfigNode::new_root("config").unwrap();
    let a = root.add("a").unwrap();
    let nested = a.add("nested").unwrap();
    let err = root.move_child(&nested, Placement::first(), |_| {}).unwrap_err();
    assert!(err.is_illegal_argument());
    let err = root
        .move_child(&a, Placement::after(a.element_id().unwrap()), |_| {})
        .unwrap_err();
    assert!(err.is_illegal_argument());
}

#[test]
fn test_stamps_track_structure() {
    let root = ConfigNode::new_root("config").unwrap();
    let deep = root.set("a/b/c", Some("1")).and_then(|_| root.require("a/b/c")).unwrap();
    let stamp = root.stamp();
    let child_stamp = root.child_stamp();

    deep.set_value(Some("2")).unwrap();
    assert_eq!(root.stamp(), stamp + 1);
    assert_eq!(root.child_stamp(), child_stamp);

    root.require("a").unwrap().set_name("renamed").unwrap();
    assert_eq!(root.child_stamp(), child_stamp + 1);
}

#[test]
fn test_navigation_helpers() {
    let root = ConfigNode::new_root("config").unwrap();
    root.set("servers/server{id=1}/host", Some("alpha")).unwrap();
    root.set("servers/server{id=2}/host", Some("beta")).unwrap();

    let servers = root.require("servers").unwrap();
    assert_eq!(servers.children_named("server").len(), 2);
    assert_eq!(root.get("servers/server{id=2}/host").unwrap(), Some("beta".to_string()));
    assert_eq!(root.get("servers/missing").unwrap(), None);
    assert!(root.require("servers/missing").unwrap_err().is_not_found());
    assert!(root.get_child(&ConfigPath::parse("servers/*").unwrap(), false).unwrap_err().is_illegal_argument());

    root.set("servers/server{id=1}", None).unwrap();
    assert_eq!(servers.children_named("server").len(), 1);
}

#[test]
fn test_unmodifiable_view_rejects_mutation() {
    let root = ConfigNode::new_root("config").unwrap();
    root.set("server/port", Some("8080")).unwrap();
    let view = root.unmodifiable();

    assert_eq!(view.get("server/port").unwrap(), Some("8080".to_string()));
    assert_eq!(view.children()[0].name(), "server");
    assert!(view.set("server/port", Some("1")).unwrap_err().is_unsupported());
    assert!(view.set_value(Some("1")).unwrap_err().is_unsupported());
    assert!(view.set_name("x").unwrap_err().is_unsupported());
    assert!(view.remove().unwrap_err().is_unsupported());
    assert!(view.copy_from(&root, true).unwrap_err().is_unsupported());
    assert!(view.add_child(Placement::last(), "x", |_| Ok(())).unwrap_err().is_unsupported());
    assert!(view.lock(true).unwrap_err().is_unsupported());
    let child = view.children().remove(0);
    assert!(view.move_child(&child, Placement::first()).unwrap_err().is_unsupported());
    assert!(view.lock(false).is_ok());
    assert_eq!(root.get("server/port").unwrap(), Some("8080".to_string()));
}

#[test]
fn test_display_and_debug() {
    let root = ConfigNode::new_root("config").unwrap();
    root.set("server/port", Some("8080")).unwrap();
    let port = root.require("server/port").unwrap();
    assert_eq!(port.to_string(), "config/server/port=8080");
    assert!(format!("{:?}", port).contains("8080"));
}
