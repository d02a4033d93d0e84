use std::sync::Arc;

use parking_lot::Mutex;

use super::*;
use crate::ChangeKind;
use crate::ConfigEvent;
use crate::ConfigNode;

fn sample_tree() -> ConfigNode {
    let root = ConfigNode::new_root("config").unwrap();
    root.set("a/b/x", Some("1")).unwrap();
    root.set("a/c/x", Some("2")).unwrap();
    root
}

#[test]
fn test_parse_literal_path() {
    let path = ConfigPath::parse("server/port").unwrap();
    assert_eq!(path.elements().len(), 2);
    assert_eq!(path.elements()[0].name(), "server");
    assert!(!path.is_multi());
    assert_eq!(path.to_string(), "server/port");
}

#[test]
fn test_parse_wildcards() {
    let path = ConfigPath::parse("servers/server*/**").unwrap();
    let elements = path.elements();
    assert!(!elements[0].is_multi());
    assert!(elements[1].is_multi());
    assert_eq!(elements[1].name(), "server");
    assert!(elements[2].is_multi_depth());
    assert!(path.is_multi());
}

#[test]
fn test_parse_attributes() {
    let path = ConfigPath::parse("a/*{x=1, y}").unwrap();
    let last = path.last().unwrap();
    assert!(last.is_multi());
    assert_eq!(last.name(), "");
    assert_eq!(last.attributes().get("x"), Some(&Some("1".to_string())));
    assert_eq!(last.attributes().get("y"), Some(&None));
    assert_eq!(path.to_string(), "a/*{x=1,y}");
}

#[test]
fn test_round_trip() {
    for text in ["a", "a/b*", "*", "a/**", "**", "a{k=v}/b*{x=1,y}/c", "item*{enabled=true}"] {
        let path = ConfigPath::parse(text).unwrap();
        assert_eq!(path.to_string(), text);
        assert_eq!(ConfigPath::parse(&path.to_string()).unwrap(), path);
    }
}

#[test]
fn test_parse_errors() {
    assert!(matches!(
        ConfigPath::parse("a//b"),
        Err(PathSyntaxError::EmptySegment { index: 1, .. })
    ));
    assert!(matches!(
        ConfigPath::parse("a/"),
        Err(PathSyntaxError::EmptySegment { index: 1, .. })
    ));
    assert!(matches!(
        ConfigPath::parse("a{x=1"),
        Err(PathSyntaxError::UnbalancedBraces { .. })
    ));
    assert!(matches!(
        ConfigPath::parse("ax=1}"),
        Err(PathSyntaxError::UnbalancedBraces { .. })
    ));
    assert!(matches!(
        ConfigPath::parse("a{=1}"),
        Err(PathSyntaxError::EmptyAttributeName { .. })
    ));
    assert!(matches!(
        ConfigPath::parse("a{}"),
        Err(PathSyntaxError::EmptyAttributeName { .. })
    ));
    assert!(matches!(
        ConfigPath::parse("a{x=1,x=2}"),
        Err(PathSyntaxError::DuplicateAttribute { .. })
    ));
    assert!(matches!(
        ConfigPath::parse("a{x=1}b"),
        Err(PathSyntaxError::TrailingCharacters { .. })
    ));
    assert!(matches!(
        ConfigPath::parse("a/**/b"),
        Err(PathSyntaxError::MultiDepthNotLast { .. })
    ));
    assert!(matches!(
        ConfigPath::parse("**{x=1}"),
        Err(PathSyntaxError::AttributesOnMultiDepth { .. })
    ));
}

#[test]
fn test_empty_path_matches_only_self() {
    let root = sample_tree();
    let path = ConfigPath::parse("").unwrap();
    assert!(path.is_empty());
    assert!(path.matches(&[]));
    assert!(!path.matches(&[root.require("a").unwrap()]));
}

#[test]
fn test_matches_literal_and_wildcard() {
    let root = sample_tree();
    let a = root.require("a").unwrap();
    let b = root.require("a/b").unwrap();
    let x = root.require("a/b/x").unwrap();

    assert!(ConfigPath::parse("a/b").unwrap().matches(&[a.clone(), b.clone()]));
    assert!(!ConfigPath::parse("a/c").unwrap().matches(&[a.clone(), b.clone()]));
    assert!(ConfigPath::parse("a/*").unwrap().matches(&[a.clone(), b.clone()]));
    assert!(!ConfigPath::parse("a/*").unwrap().matches(&[a.clone(), b.clone(), x.clone()]));
    assert!(!ConfigPath::parse("a/*").unwrap().matches(&[a.clone()]));
}

#[test]
fn test_multi_depth_matches_any_remainder() {
    let root = sample_tree();
    let a = root.require("a").unwrap();
    let b = root.require("a/b").unwrap();
    let x = root.require("a/b/x").unwrap();
    let path = ConfigPath::parse("a/**").unwrap();

    assert!(path.matches(&[a.clone()]));
    assert!(path.matches(&[a.clone(), b.clone()]));
    assert!(path.matches(&[a, b, x]));
    assert!(ConfigPath::parse("**").unwrap().matches(&[]));
}

#[test]
fn test_attribute_predicate_selects_sibling() {
    let root = sample_tree();
    let a = root.require("a").unwrap();
    let b = root.require("a/b").unwrap();
    let c = root.require("a/c").unwrap();
    let path = ConfigPath::parse("a/*{x=1}").unwrap();

    assert!(path.matches(&[a.clone(), b]));
    assert!(!path.matches(&[a.clone(), c.clone()]));
    assert!(ConfigPath::parse("a/*{x}").unwrap().matches(&[a, c]));
}

#[test]
fn test_path_element_parse_and_named() {
    let element = PathElement::parse("port").unwrap();
    assert_eq!(element, PathElement::named("port"));
    assert!(matches!(PathElement::parse(""), Err(PathSyntaxError::EmptySegment { .. })));
}

#[test]
fn test_parent_last_and_then() {
    let path = ConfigPath::parse("a/b/c").unwrap();
    assert_eq!(path.parent().unwrap().to_string(), "a/b");
    assert_eq!(path.last().unwrap().name(), "c");
    assert!(ConfigPath::parse("a").unwrap().parent().is_none());

    let extended = path.then(PathElement::named("d")).unwrap();
    assert_eq!(extended.to_string(), "a/b/c/d");
    let deep = ConfigPath::parse("a/**").unwrap();
    assert!(deep.then(PathElement::named("d")).is_err());
}

#[test]
fn test_builder() {
    let path = ConfigPath::build("servers")
        .and_then("server")
        .unwrap()
        .multi(false)
        .unwrap()
        .with_attribute("enabled", Some("true"))
        .unwrap()
        .build()
        .unwrap();
    assert_eq!(path.to_string(), "servers/server*{enabled=true}");
    assert_eq!(path, ConfigPath::parse("servers/server*{enabled=true}").unwrap());
}

#[test]
fn test_builder_rejects_reuse() {
    let mut builder = ConfigPath::build("a");
    let _next = builder.and_then("b").unwrap();
    assert!(builder.build().unwrap_err().is_illegal_state());
    assert!(builder.multi(false).unwrap_err().is_illegal_state());
    assert!(builder.with_attribute("x", None).unwrap_err().is_illegal_state());
}

#[test]
fn test_builder_rejects_multi_depth_before_more_segments() {
    let mut builder = ConfigPath::build("a");
    builder.multi(true).unwrap();
    assert!(builder.and_then("b").unwrap_err().is_illegal_argument());
}

#[test]
fn test_populate_adds_attribute_children() {
    let root = ConfigNode::new_root("config").unwrap();
    let path = ConfigPath::parse("servers/server*{enabled=true,id}").unwrap();
    let element = path.last().unwrap();
    let server = root.add(element.name()).unwrap();
    element.populate(&server).unwrap();

    assert_eq!(server.get("enabled").unwrap(), Some("true".to_string()));
    assert!(server.child_named("id").is_some());
    assert!(element.matches(&server));

    element.populate(&server).unwrap();
    assert_eq!(server.child_count(), 2);
}

fn record_at(root: &ConfigNode) -> (Arc<Mutex<Vec<ConfigEvent>>>, crate::Subscription) {
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = events.clone();
    let subscription = root.subscribe_fn(None, move |event| sink.lock().push(event.clone()));
    (events, subscription)
}

#[test]
fn test_matched_before_attribute_value_change() {
    let root = sample_tree();
    let a = root.require("a").unwrap();
    let c = root.require("a/c").unwrap();
    let element = PathElement::parse("*{x=1}").unwrap();
    let (events, _subscription) = record_at(&a);

    root.require("a/c/x").unwrap().set_value(Some("1")).unwrap();

    let event = events.lock().last().cloned().unwrap();
    assert_eq!(event.kind(), ChangeKind::Set);
    assert_eq!(event.relative_path().len(), 2);
    assert!(element.matches(&c));
    assert!(!element.matched_before(&c, &event));
}

#[test]
fn test_matched_before_rename() {
    let root = sample_tree();
    let a = root.require("a").unwrap();
    let b = root.require("a/b").unwrap();
    let element = PathElement::parse("b").unwrap();
    let (events, _subscription) = record_at(&a);

    b.set_name("renamed").unwrap();

    let event = events.lock().last().cloned().unwrap();
    assert!(!element.matches(&b));
    assert!(element.matched_before(&b, &event));
}

#[test]
fn test_listener_tells_entering_from_leaving() {
    let root = sample_tree();
    let a = root.require("a").unwrap();
    let element = PathElement::parse("*{x=1}").unwrap();
    let transitions = Arc::new(Mutex::new(Vec::new()));
    let sink = transitions.clone();
    let _subscription = a.subscribe_fn(None, move |event| {
        let Some(child) = event.relative_path().first() else {
            return;
        };
        sink.lock().push((
            child.name(),
            element.matched_before(child, event),
            element.matches(child),
        ));
    });

    root.require("a/c/x").unwrap().set_value(Some("1")).unwrap();
    root.require("a/b/x").unwrap().set_value(Some("3")).unwrap();

    assert_eq!(
        *transitions.lock(),
        vec![("c".to_string(), false, true), ("b".to_string(), true, false)]
    );
}

#[test]
fn test_matched_before_add_is_false() {
    let root = sample_tree();
    let a = root.require("a").unwrap();
    let element = PathElement::parse("*").unwrap();
    let (events, _subscription) = record_at(&a);

    let d = a.add("d").unwrap();

    let event = events.lock().last().cloned().unwrap();
    assert_eq!(event.kind(), ChangeKind::Add);
    assert!(element.matches(&d));
    assert!(!element.matched_before(&d, &event));
}

#[test]
fn test_matched_before_removed_attribute() {
    let root = sample_tree();
    let a = root.require("a").unwrap();
    let b = root.require("a/b").unwrap();
    let element = PathElement::parse("*{x=1}").unwrap();
    let (events, _subscription) = record_at(&a);

    root.require("a/b/x").unwrap().remove();

    let event = events.lock().last().cloned().unwrap();
    assert_eq!(event.kind(), ChangeKind::Remove);
    assert!(!element.matches(&b));
    assert!(element.matched_before(&b, &event));
}
