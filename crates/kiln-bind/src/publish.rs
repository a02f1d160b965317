//! Seeds runtime state from a bound tree, the way rendered fields publish
//! their initial values.

use kiln_model::value::attr_str;
use kiln_model::{FieldNode, RuntimeState, StateMap};
use serde_json::Value;
use tracing::debug;

/// Publish every bound leaf value under its uuid (and `attributes.id` when
/// set), and every repeater's bound rows as stored row objects.
///
/// Returns the number of state entries written.
pub fn publish_bound_values(items: &[FieldNode], state: &mut RuntimeState) -> usize {
    let mut written = 0;
    for item in items {
        written += publish_item(item, state);
    }
    debug!(written, "published bound values");
    written
}

fn publish_item(item: &FieldNode, state: &mut RuntimeState) -> usize {
    if item.is_repeater() {
        let Some(rows) = item.repeater_data.as_ref() else {
            return 0;
        };
        let rows: Vec<StateMap> = rows.iter().filter_map(Value::as_object).cloned().collect();
        if rows.is_empty() {
            return 0;
        }
        state.set_group_rows(item.uuid.clone(), rows);
        return 1;
    }

    if let Some(children) = item.children.as_deref().or(item.container_items.as_deref()) {
        return children.iter().map(|child| publish_item(child, state)).sum();
    }

    let Some(value) = item.value.as_ref() else {
        return 0;
    };
    state.publish(item.uuid.clone(), value.clone());
    let mut written = 1;
    if let Some(alias) = attr_str(&item.attributes, "id")
        && alias != item.uuid
    {
        state.publish(alias, value.clone());
        written += 1;
    }
    written
}
