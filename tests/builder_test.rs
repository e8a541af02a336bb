//! Tests for TreeBuilder: nested and flat record input, validation failures

use std::fs;

use rstest::rstest;
use serde_json::{json, Value};

use checktree::domain::{CheckState, NodeId, TreeBuilder, ValidationError};
use checktree::util::testing;

fn load_records(name: &str) -> Vec<Value> {
    testing::init_test_setup();
    let content = fs::read_to_string(testing::resource_dir().join(name)).expect("read fixture");
    serde_json::from_str(&content).expect("parse fixture")
}

#[test]
fn given_nested_records_when_building_then_preserves_order_and_parents() {
    // Arrange
    let records = load_records("ten_nodes.json");

    // Act
    let (tree, store) = TreeBuilder::new().build(&records).unwrap();

    // Assert
    assert_eq!(tree.len(), 10);
    assert_eq!(store.len(), 10);
    assert_eq!(tree.roots().len(), 2);
    let preorder: Vec<&str> = tree.iter().map(|(_, node)| node.data.id.as_str()).collect();
    assert_eq!(preorder, vec!["1", "2", "3", "4", "5", "6", "7", "8", "9", "10"]);

    let tokyo = tree.index_of("6").unwrap();
    let japan = tree.index_of("5").unwrap();
    assert_eq!(tree.parent_of(tokyo), Some(japan));
    assert!(tree.is_leaf(tokyo));
}

#[test]
fn given_checked_flags_when_building_then_store_holds_seed_values() {
    let records = load_records("scenario_a.json");

    let (tree, store) = TreeBuilder::new().build(&records).unwrap();

    let seed = |id: &str| store.get(tree.index_of(id).unwrap());
    assert_eq!(seed("A1"), Some(CheckState::Checked));
    assert_eq!(seed("A2"), Some(CheckState::Unchecked));
    // Not reconciled yet
    assert_eq!(seed("A"), Some(CheckState::Unchecked));
}

#[test]
fn given_flat_records_when_building_then_links_by_parent_id() {
    let records = load_records("flat.json");

    let (tree, store) = TreeBuilder::new().build_flat(&records).unwrap();

    let roots: Vec<&str> = tree
        .roots()
        .iter()
        .filter_map(|&root| tree.node_id(root))
        .map(NodeId::as_str)
        .collect();
    assert_eq!(roots, vec!["1", "5"]);
    let preorder: Vec<&str> = tree.iter().map(|(_, node)| node.data.id.as_str()).collect();
    assert_eq!(preorder, vec!["1", "2", "3", "4", "5"]);
    assert_eq!(
        store.get(tree.index_of("3").unwrap()),
        Some(CheckState::Checked)
    );
}

#[test]
fn given_flat_child_before_parent_when_building_then_still_links() {
    let records = vec![
        json!({ "id": "c", "parentId": "p" }),
        json!({ "id": "p" }),
    ];

    let (tree, _) = TreeBuilder::new().build_flat(&records).unwrap();

    let c = tree.index_of("c").unwrap();
    assert_eq!(tree.parent_of(c), tree.index_of("p"));
}

#[test]
fn given_parent_chain_loop_when_building_flat_then_cycle_detected() {
    let records = load_records("cycle.json");

    let err = TreeBuilder::new().build_flat(&records).unwrap_err();

    assert_eq!(err, ValidationError::CycleDetected(NodeId::from("a")));
}

#[test]
fn given_self_parent_only_when_building_flat_then_cycle_detected() {
    let records = vec![json!({ "id": "x", "parentId": "x" })];

    let err = TreeBuilder::new().build_flat(&records).unwrap_err();

    assert_eq!(err, ValidationError::CycleDetected(NodeId::from("x")));
}

#[test]
fn given_duplicate_id_when_building_then_rejected() {
    let records = load_records("duplicate.json");

    let err = TreeBuilder::new().build(&records).unwrap_err();

    assert_eq!(err, ValidationError::DuplicateId(NodeId::from("y")));
}

#[test]
fn given_unknown_parent_when_building_flat_then_rejected() {
    let records = vec![json!({ "id": "a", "parentId": "ghost" })];

    let err = TreeBuilder::new().build_flat(&records).unwrap_err();

    assert_eq!(
        err,
        ValidationError::UnknownParent {
            id: NodeId::from("a"),
            parent: NodeId::from("ghost"),
        }
    );
}

#[rstest]
#[case(json!([{ "text": "no id" }]))]
#[case(json!([{ "id": null }]))]
fn given_record_without_id_when_building_then_missing_id(#[case] records: Value) {
    let records = records.as_array().unwrap().clone();

    let err = TreeBuilder::new().build(&records).unwrap_err();

    assert!(matches!(err, ValidationError::MissingId { ref path, .. } if path == "/0"));
}

#[rstest]
#[case(json!([{ "id": true }]))]
#[case(json!([{ "id": ["a"] }]))]
fn given_non_scalar_id_when_building_then_invalid_id(#[case] records: Value) {
    let records = records.as_array().unwrap().clone();

    let err = TreeBuilder::new().build(&records).unwrap_err();

    assert!(matches!(err, ValidationError::InvalidId { .. }));
}

#[test]
fn given_nested_child_not_object_when_building_then_reports_path() {
    let records = vec![json!({ "id": "a", "children": [{ "id": "b" }, 7] })];

    let err = TreeBuilder::new().build(&records).unwrap_err();

    assert_eq!(
        err,
        ValidationError::NotAnObject {
            path: "/0/children/1".to_string()
        }
    );
}

#[test]
fn given_non_boolean_checked_when_building_then_rejected() {
    let records = vec![json!({ "id": "a", "checked": "yes" })];

    let err = TreeBuilder::new().build(&records).unwrap_err();

    assert!(matches!(err, ValidationError::InvalidField { ref field, .. } if field == "checked"));
}

#[test]
fn given_custom_field_names_when_building_then_reads_them() {
    let records = vec![json!({
        "key": "root",
        "on": true,
        "items": [{ "key": "leaf", "on": true }]
    })];

    let (tree, store) = TreeBuilder::new()
        .with_id_field("key")
        .with_checked_field("on")
        .with_children_field("items")
        .build(&records)
        .unwrap();

    assert_eq!(tree.len(), 2);
    assert_eq!(
        store.get(tree.index_of("leaf").unwrap()),
        Some(CheckState::Checked)
    );
}
