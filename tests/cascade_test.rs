//! Behavioral tests for tri-state cascading through `CheckTree`.
//!
//! Trees come from fixtures in `tests/resources/trees` or inline records.

use std::fs;

use rstest::{fixture, rstest};
use serde_json::{json, Value};

use checktree::application::{CheckTree, Checkable};
use checktree::config::Settings;
use checktree::domain::{derive_state, CheckState, NodeId, NotFoundError};
use checktree::util::testing;

fn load_records(name: &str) -> Vec<Value> {
    testing::init_test_setup();
    let path = testing::resource_dir().join(name);
    let content = fs::read_to_string(&path).expect("read fixture");
    serde_json::from_str(&content).expect("parse fixture")
}

fn settings(cascade: bool) -> Settings {
    Settings {
        cascade,
        ..Default::default()
    }
}

#[fixture]
fn scenario_a() -> CheckTree {
    CheckTree::from_records(&load_records("scenario_a.json"), &settings(true)).unwrap()
}

#[fixture]
fn ten_nodes() -> CheckTree {
    CheckTree::from_records(&load_records("ten_nodes.json"), &settings(true)).unwrap()
}

/// Every node with children holds the value derived from its children.
fn assert_derivation_holds(check_tree: &CheckTree) {
    let tree = check_tree.tree();
    for (idx, node) in tree.iter() {
        if node.children.is_empty() {
            continue;
        }
        let derived = derive_state(
            node.children
                .iter()
                .map(|&child| check_tree.store().get(child).unwrap()),
        );
        assert_eq!(
            check_tree.store().get(idx),
            Some(derived),
            "node {} out of sync with its children",
            node.data.id
        );
    }
}

fn state(check_tree: &CheckTree, id: &str) -> CheckState {
    check_tree.state_of(id).unwrap()
}

#[rstest]
fn given_mixed_children_when_loaded_then_parent_indeterminate(scenario_a: CheckTree) {
    assert_eq!(state(&scenario_a, "A1"), CheckState::Checked);
    assert_eq!(state(&scenario_a, "A2"), CheckState::Unchecked);
    assert_eq!(state(&scenario_a, "A"), CheckState::Indeterminate);
    assert_eq!(state(&scenario_a, "root"), CheckState::Indeterminate);
    assert_derivation_holds(&scenario_a);
}

#[rstest]
fn given_scenario_a_when_checking_parent_then_subtree_and_ancestors_checked(
    mut scenario_a: CheckTree,
) {
    // Act
    let changed = scenario_a.check("A").unwrap();

    // Assert
    assert_eq!(state(&scenario_a, "A"), CheckState::Checked);
    assert_eq!(state(&scenario_a, "A1"), CheckState::Checked);
    assert_eq!(state(&scenario_a, "A2"), CheckState::Checked);
    // root has A as its only child
    assert_eq!(state(&scenario_a, "root"), CheckState::Checked);
    // A, A2 and root changed; A1 was already checked
    assert_eq!(changed, 3);
    assert_derivation_holds(&scenario_a);
}

#[rstest]
fn given_checked_subtree_when_unchecking_one_leaf_then_sibling_unaffected(
    mut scenario_a: CheckTree,
) {
    // Arrange
    scenario_a.check("A").unwrap();

    // Act
    scenario_a.uncheck("A1").unwrap();

    // Assert
    assert_eq!(state(&scenario_a, "A1"), CheckState::Unchecked);
    assert_eq!(state(&scenario_a, "A2"), CheckState::Checked);
    assert_eq!(state(&scenario_a, "A"), CheckState::Indeterminate);
    assert_eq!(state(&scenario_a, "root"), CheckState::Indeterminate);
    assert_derivation_holds(&scenario_a);
}

#[rstest]
fn given_unknown_id_when_checking_then_not_found_and_store_unchanged(mut scenario_a: CheckTree) {
    let before = scenario_a.store().clone();

    let err = scenario_a.check("nonexistent-id").unwrap_err();

    assert_eq!(err, NotFoundError(NodeId::from("nonexistent-id")));
    assert_eq!(scenario_a.store(), &before);
}

#[rstest]
fn given_ten_node_tree_when_checking_all_then_all_ids_in_preorder(mut ten_nodes: CheckTree) {
    // Act
    let changed = ten_nodes.check_all();

    // Assert
    assert_eq!(changed, 10);
    let ids: Vec<&str> = ten_nodes.checked_ids().map(NodeId::as_str).collect();
    assert_eq!(ids, vec!["1", "2", "3", "4", "5", "6", "7", "8", "9", "10"]);
    assert_eq!(ten_nodes.tree().depth(), 3);
}

#[rstest]
fn given_checked_tree_when_unchecking_all_then_nothing_checked(mut ten_nodes: CheckTree) {
    ten_nodes.check_all();

    assert_eq!(ten_nodes.uncheck_all(), 10);
    assert_eq!(ten_nodes.checked_ids().count(), 0);
    assert_eq!(ten_nodes.uncheck_all(), 0);
}

#[rstest]
fn given_same_check_twice_when_applied_then_second_changes_nothing(mut ten_nodes: CheckTree) {
    ten_nodes.check("2").unwrap();
    let after_first = ten_nodes.store().clone();

    let changed = ten_nodes.check("2").unwrap();

    assert_eq!(changed, 0);
    assert_eq!(ten_nodes.store(), &after_first);
}

#[rstest]
fn given_any_node_when_checked_then_node_and_descendants_checked(
    mut ten_nodes: CheckTree,
    #[values("1", "2", "3", "4", "5", "6", "7", "8", "9", "10")] id: &str,
) {
    // Act
    ten_nodes.check(id).unwrap();

    // Assert
    assert_eq!(state(&ten_nodes, id), CheckState::Checked);
    let descendants: Vec<String> = ten_nodes
        .descendants_of(id)
        .unwrap()
        .map(|node_id| node_id.to_string())
        .collect();
    for descendant in &descendants {
        assert_eq!(
            state(&ten_nodes, descendant),
            CheckState::Checked,
            "descendant {descendant} of {id}"
        );
    }
    assert_derivation_holds(&ten_nodes);
}

#[rstest]
fn given_ten_node_tree_when_listing_then_every_id_is_covered(ten_nodes: CheckTree) {
    // Keeps the per-id cases above in step with the fixture
    let ids: Vec<String> = ten_nodes
        .tree()
        .iter()
        .map(|(_, node)| node.data.id.to_string())
        .collect();
    assert_eq!(ids, ["1", "2", "3", "4", "5", "6", "7", "8", "9", "10"]);
    assert_eq!(ten_nodes.tree().leaf_nodes().len(), 5);
}

#[rstest]
fn given_leaf_checked_when_sibling_unchecked_then_walk_stops_below_unchanged_ancestor(
    mut ten_nodes: CheckTree,
) {
    // Arrange: 3 checked makes 2 and 1 indeterminate
    ten_nodes.check("3").unwrap();
    assert_eq!(state(&ten_nodes, "1"), CheckState::Indeterminate);

    // Act: 6 makes 5 checked; 1 was already indeterminate
    let changed = ten_nodes.check("6").unwrap();

    // Assert: only 6 and 5 were written
    assert_eq!(changed, 2);
    assert_eq!(state(&ten_nodes, "5"), CheckState::Checked);
    assert_eq!(state(&ten_nodes, "1"), CheckState::Indeterminate);
    assert_derivation_holds(&ten_nodes);
}

#[rstest]
fn given_cascade_disabled_when_checking_parent_then_children_keep_state() {
    let mut check_tree =
        CheckTree::from_records(&load_records("scenario_a.json"), &settings(false)).unwrap();

    let changed = check_tree.check("A").unwrap();

    // A and its only ancestor; nothing below A is written
    assert_eq!(changed, 2);
    assert_eq!(state(&check_tree, "A"), CheckState::Checked);
    assert_eq!(state(&check_tree, "A1"), CheckState::Checked);
    assert_eq!(state(&check_tree, "A2"), CheckState::Unchecked);
    assert_eq!(state(&check_tree, "root"), CheckState::Checked);
}

#[rstest]
fn given_cascade_disabled_when_checking_leaf_then_ancestors_still_derived() {
    let mut check_tree =
        CheckTree::from_records(&load_records("scenario_a.json"), &settings(false)).unwrap();

    check_tree.check("A2").unwrap();

    assert_eq!(state(&check_tree, "A"), CheckState::Checked);
    assert_eq!(state(&check_tree, "root"), CheckState::Checked);
}

#[rstest]
fn given_consistent_seed_when_loaded_then_reconciliation_changes_nothing() {
    let records = vec![json!({
        "id": "p",
        "checked": true,
        "children": [{ "id": "a", "checked": true }, { "id": "b", "checked": true }]
    })];

    let check_tree = CheckTree::from_records(&records, &settings(true)).unwrap();

    assert_eq!(state(&check_tree, "p"), CheckState::Checked);
    assert_derivation_holds(&check_tree);
}

#[rstest]
fn given_parent_seeded_checked_with_unchecked_children_when_loaded_then_children_win() {
    let records = vec![json!({
        "id": "p",
        "checked": true,
        "children": [{ "id": "a" }, { "id": "b" }]
    })];

    let check_tree = CheckTree::from_records(&records, &settings(true)).unwrap();

    assert_eq!(state(&check_tree, "p"), CheckState::Unchecked);
    assert_eq!(state(&check_tree, "a"), CheckState::Unchecked);
}

#[rstest]
#[case("check:3", &["3"])]
#[case("check:2", &["2", "3", "4"])]
#[case("check:1", &["1", "2", "3", "4", "5", "6"])]
#[case("check-all", &["1", "2", "3", "4", "5", "6", "7", "8", "9", "10"])]
fn given_operation_when_applied_then_checked_ids_match(
    mut ten_nodes: CheckTree,
    #[case] op: &str,
    #[case] expected: &[&str],
) {
    ten_nodes.apply(&op.parse().unwrap()).unwrap();

    let ids: Vec<&str> = ten_nodes.checked_ids().map(NodeId::as_str).collect();
    assert_eq!(ids, expected);
    assert_derivation_holds(&ten_nodes);
}

#[rstest]
fn given_sequence_of_operations_when_applied_then_derivation_always_holds(
    mut ten_nodes: CheckTree,
) {
    for op in [
        "check:1", "uncheck:4", "check:9", "uncheck:2", "check:4", "uncheck-all", "check:10",
        "check:6",
    ] {
        ten_nodes.apply(&op.parse().unwrap()).unwrap();
        assert_derivation_holds(&ten_nodes);
    }
    assert_eq!(state(&ten_nodes, "7"), CheckState::Indeterminate);
    assert_eq!(state(&ten_nodes, "1"), CheckState::Indeterminate);
}

#[rstest]
fn given_checked_ids_iterator_when_cloned_then_restarts_from_clone_point(mut ten_nodes: CheckTree) {
    ten_nodes.check("2").unwrap();
    let mut ids = ten_nodes.checked_ids();
    assert_eq!(ids.next().map(NodeId::as_str), Some("2"));

    let rest: Vec<_> = ids.clone().map(NodeId::as_str).collect();
    let again: Vec<_> = ids.map(NodeId::as_str).collect();

    assert_eq!(rest, vec!["3", "4"]);
    assert_eq!(rest, again);
}
