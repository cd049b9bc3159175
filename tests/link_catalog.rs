//! Integration tests for link and attribute tables against a canned store.

use h5rest::catalog::{
    build_attribute_table, build_link_table, build_link_table_recursive, traverse_links, IndexType, IterOrder,
    LinkClass, VisitControl,
};
use h5rest::transport::MemoryTransport;
use h5rest::ObjectKind;

const FILE: &str = "/home/test/cycle.h5";

fn hard(title: &str, created: f64, id: &str) -> String {
    format!(
        r#"{{"title": "{title}", "created": {created}, "class": "H5L_TYPE_HARD", "id": "{id}", "collection": "groups"}}"#
    )
}

fn listing(entries: &[String]) -> String {
    format!(r#"{{"links": [{}], "hrefs": []}}"#, entries.join(", "))
}

#[test]
fn test_cycle_a_b_a_terminates() {
    let a = listing(&[hard("b", 1.0, "g-b")]);
    let transport = MemoryTransport::new().with(FILE, "/groups/g-b/links", listing(&[hard("back", 2.0, "g-a")]));

    let table = build_link_table_recursive(&a, IndexType::Name, &transport, FILE, "g-a").expect("table");
    let b = table.find("b").expect("b");
    let b_tree = b.subtree.as_ref().expect("b subtree");
    let back = b_tree.find("back").expect("back link");
    assert_eq!(
        back.class,
        LinkClass::Hard {
            target_uri: "g-a".into(),
            collection: ObjectKind::Group
        }
    );
    assert!(back.subtree.is_none());
    assert_eq!(transport.request_count(), 1);
}

#[test]
fn test_diamond_visits_shared_group_once() {
    // root -> x, root -> y, x -> shared, y -> shared
    let root = listing(&[hard("x", 1.0, "g-x"), hard("y", 2.0, "g-y")]);
    let transport = MemoryTransport::new()
        .with(FILE, "/groups/g-x/links", listing(&[hard("s", 3.0, "g-s")]))
        .with(FILE, "/groups/g-y/links", listing(&[hard("s", 4.0, "g-s")]))
        .with(FILE, "/groups/g-s/links", listing(&[]));

    let table = build_link_table_recursive(&root, IndexType::Name, &transport, FILE, "g-root").expect("table");
    let mut paths = Vec::new();
    traverse_links(&table, IterOrder::Increasing, None, |path, entry| {
        paths.push((path.to_string(), entry.subtree.is_some()));
        Ok(VisitControl::Continue)
    })
    .expect("traverse");

    assert_eq!(
        paths,
        vec![
            ("x".to_string(), true),
            ("x/s".to_string(), true),
            ("y".to_string(), true),
            ("y/s".to_string(), false),
        ]
    );
    assert_eq!(transport.request_count(), 3);
}

#[test]
fn test_missing_subgroup_listing_fails() {
    let root = listing(&[hard("gone", 1.0, "g-gone")]);
    let transport = MemoryTransport::new();
    let err = build_link_table_recursive(&root, IndexType::Name, &transport, FILE, "g-root").unwrap_err();
    assert!(err.is_not_found());
}

#[test]
fn test_creation_order_and_resume() {
    let json = r#"{"links": [
        {"title": "a", "created": 3, "class": "H5L_TYPE_SOFT", "h5path": "/x"},
        {"title": "b", "created": 1, "class": "H5L_TYPE_SOFT", "h5path": "/y"},
        {"title": "c", "created": 2, "class": "H5L_TYPE_SOFT", "h5path": "/z"}
    ]}"#;
    let table = build_link_table(json, IndexType::CreationOrder).expect("table");
    let names: Vec<&str> = table.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, vec!["b", "c", "a"]);
    assert_eq!(table.entry_by_index(IterOrder::Decreasing, 0).map(|e| e.name.as_str()), Some("a"));

    let by_name = build_link_table(json, IndexType::Name).expect("table");
    let mut seen = Vec::new();
    let outcome = traverse_links(&by_name, IterOrder::Increasing, Some(2), |path, _| {
        seen.push(path.to_string());
        Ok(VisitControl::Continue)
    })
    .expect("traverse");
    assert_eq!(seen, vec!["c"]);
    assert_eq!(outcome.last_index, Some(2));
    assert!(!outcome.stopped_early);
}

#[test]
fn test_attribute_listing() {
    let json = r#"{"attributes": [
        {"name": "units", "created": 2.0,
         "type": {"class": "H5T_STRING", "charSet": "H5T_CSET_ASCII", "strPad": "H5T_STR_NULLPAD", "length": 4},
         "shape": {"class": "H5S_SIMPLE", "dims": [2]}},
        {"name": "count", "created": 1.0,
         "type": {"class": "H5T_INTEGER", "base": "H5T_STD_U32LE"},
         "shape": {"class": "H5S_SCALAR"}}
    ]}"#;
    let table = build_attribute_table(json, IndexType::CreationOrder).expect("table");
    let sizes: Vec<(&str, Option<u64>)> = table
        .iter()
        .map(|e| (e.name.as_str(), e.info.data_size()))
        .collect();
    assert_eq!(sizes, vec![("count", Some(4)), ("units", Some(8))]);
}
