//! Group state normalization.
//!
//! Every repeatable container reached outside a row ends up with a list of
//! row objects in `groupState`, and every row object carries an array for
//! each repeater nested in it. Rows that already exist keep their values and
//! only gain missing nested arrays, so normalizing normalized state is a
//! no-op.

use kiln_model::{FieldNode, GroupSlot, GroupState, RuntimeState, StateMap};
use serde_json::Value;
use tracing::debug;

use crate::rows::expand_rows;

/// Compute normalized group state for `items` without touching `state`.
pub fn normalize_group_state_tree(items: &[FieldNode], state: &RuntimeState) -> GroupState {
    let mut normalized = state.group_state.clone();
    for item in items {
        normalize_node(item, state, &mut normalized);
    }
    normalized
}

/// Normalize and store the result back into `state`.
pub fn normalize_in_place(items: &[FieldNode], state: &mut RuntimeState) {
    let normalized = normalize_group_state_tree(items, state);
    state.group_state = normalized;
}

fn normalize_node(node: &FieldNode, state: &RuntimeState, out: &mut GroupState) {
    if node.is_repeatable() {
        let rows = normalized_rows(node, &node.uuid, state);
        debug!(container = %node.uuid, rows = rows.len(), "normalized repeatable container");
        // An empty result leaves whatever the UI stored untouched.
        if rows.is_empty() {
            return;
        }
        out.insert(node.uuid.clone(), rows.into_iter().map(GroupSlot::Row).collect());
        return;
    }
    if node.is_container() {
        for child in node.children() {
            normalize_node(child, state, out);
        }
    }
}

/// Row objects of one container instance with nested arrays attached.
fn normalized_rows(container: &FieldNode, container_key: &str, state: &RuntimeState) -> Vec<StateMap> {
    let nested = container.nested_repeaters();
    expand_rows(container, container_key, state)
        .into_iter()
        .map(|row| {
            let mut values = row.values.clone();
            for repeater in &nested {
                if matches!(values.get(&repeater.uuid), Some(Value::Array(_))) {
                    continue;
                }
                let nested_rows = row
                    .nested_key(container_key, &repeater.uuid)
                    .map(|key| normalized_rows(repeater, &key, state))
                    .unwrap_or_default();
                values.insert(
                    repeater.uuid.clone(),
                    Value::Array(nested_rows.into_iter().map(Value::Object).collect()),
                );
            }
            values
        })
        .collect()
}
