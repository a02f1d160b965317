//! Normalization across nested repeaters.

use kiln_model::{FieldNode, GroupSlot, RuntimeState};
use kiln_state::{expand_nested_rows, expand_rows, normalize_group_state_tree, normalize_in_place};
use proptest::prelude::*;
use serde_json::{Value, json};

fn household() -> Vec<FieldNode> {
    vec![
        FieldNode::leaf("applicant", "text"),
        FieldNode::container(
            "c1",
            vec![
                FieldNode::leaf("f1", "text"),
                FieldNode::container(
                    "box",
                    vec![FieldNode::container("n1", vec![FieldNode::leaf("x", "text")]).repeatable()],
                ),
            ],
        )
        .repeatable(),
    ]
}

fn groups_json(state: &RuntimeState) -> Value {
    serde_json::to_value(&state.group_state).expect("serialize group state")
}

#[test]
fn nested_rows_are_attached_to_each_parent_row() {
    let items = household();
    let mut state = RuntimeState::new();
    state.publish("applicant", json!("Pat"));
    state.publish("c1-g1-f1", json!("A"));
    state.publish("c1-g2-f1", json!("B"));
    state.publish("c1-g2-n1-r1-x", json!("x1"));
    state.publish("c1-g2-n1-r2-x", json!("x2"));

    normalize_in_place(&items, &mut state);
    assert_eq!(
        groups_json(&state),
        json!({
            "c1": [
                {"f1": "A", "n1": []},
                {"f1": "B", "n1": [{"x": "x1"}, {"x": "x2"}]}
            ]
        })
    );
}

#[test]
fn bare_ids_are_rebuilt_in_list_order() {
    let items = household();
    let mut state = RuntimeState::new();
    state.publish("c1-g1-f1", json!("A"));
    state.publish("c1-g2-f1", json!("B"));
    state.publish("c1-g1-n1-r9-x", json!("deep"));
    state.set_group_ids("c1", ["g2", "g1"]);

    normalize_in_place(&items, &mut state);
    assert_eq!(
        groups_json(&state)["c1"],
        json!([
            {"f1": "B", "n1": []},
            {"f1": "A", "n1": [{"x": "deep"}]}
        ])
    );
}

#[test]
fn bare_ids_missing_from_active_groups_are_stale() {
    let items = household();
    let mut state = RuntimeState::new();
    state.publish("c1-g1-f1", json!("A"));
    state.publish("c1-g2-f1", json!("B"));
    state.set_group_ids("c1", ["g1", "g2"]);
    state.set_active_groups("c1", ["g2"]);

    let rows = expand_rows(&items[1], "c1", &state);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].get("f1"), Some(&json!("B")));
}

#[test]
fn stored_rows_only_gain_missing_nested_arrays() {
    let items = household();
    let mut state = RuntimeState::new();
    state.publish("c1-g1-n1-r1-x", json!("from-keys"));
    state.set_active_groups("c1", ["g1", "g2"]);
    state.set_group_rows(
        "c1",
        vec![
            json!({"f1": "kept"}).as_object().cloned().expect("object"),
            json!({"f1": "also", "n1": [{"x": "own"}]})
                .as_object()
                .cloned()
                .expect("object"),
        ],
    );

    normalize_in_place(&items, &mut state);
    assert_eq!(
        groups_json(&state)["c1"],
        json!([
            {"f1": "kept", "n1": [{"x": "from-keys"}]},
            {"f1": "also", "n1": [{"x": "own"}]}
        ])
    );
}

#[test]
fn foreign_slots_are_dropped_from_row_lists() {
    let items = household();
    let mut state = RuntimeState::from_value(json!({
        "groupState": {"c1": [{"f1": "A"}, 42, "g9"]}
    }))
    .expect("parse state");

    normalize_in_place(&items, &mut state);
    let slots = state.group("c1");
    assert_eq!(slots.len(), 1);
    assert!(matches!(&slots[0], GroupSlot::Row(row) if row.get("f1") == Some(&json!("A"))));
}

#[test]
fn nested_expansion_reads_normalized_rows() {
    let items = household();
    let mut state = RuntimeState::new();
    state.publish("c1-g1-f1", json!("A"));
    state.publish("c1-g1-n1-r1-x", json!("x1"));
    normalize_in_place(&items, &mut state);

    let container = &items[1];
    let rows = expand_rows(container, "c1", &state);
    let nested = container.nested_repeaters();
    let inner = expand_nested_rows(nested[0], "c1", &rows[0], &state);
    assert_eq!(inner.len(), 1);
    assert_eq!(inner[0].get("x"), Some(&json!("x1")));
}

fn arb_state() -> impl Strategy<Value = RuntimeState> {
    let key = prop::sample::select(vec![
        "c1-g1-f1",
        "c1-g2-f1",
        "c1-g-3-f1",
        "c1-g1-n1-r1-x",
        "c1-g2-n1-r1-x",
        "c1-g2-n1-r2-x",
        "applicant",
        "c1-g1-zz",
    ]);
    let group = prop::sample::select(vec!["g1", "g2", "g-3", "gone"]);
    (
        prop::collection::vec((key, "[a-z]{0,3}"), 0..8),
        prop::option::of(prop::collection::vec(group.clone(), 0..4)),
        prop::option::of(prop::collection::vec(group, 0..4)),
    )
        .prop_map(|(entries, active, bare)| {
            let mut state = RuntimeState::new();
            for (key, value) in entries {
                state.publish(key, json!(value));
            }
            if let Some(active) = active {
                state.set_active_groups("c1", active);
            }
            if let Some(bare) = bare {
                state.set_group_ids("c1", bare);
            }
            state
        })
}

proptest! {
    #[test]
    fn normalization_is_idempotent(state in arb_state()) {
        let items = household();
        let once = normalize_group_state_tree(&items, &state);

        let mut again = state.clone();
        again.group_state = once.clone();
        let twice = normalize_group_state_tree(&items, &again);
        prop_assert_eq!(once, twice);
    }
}
