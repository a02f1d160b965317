//! Read-only marking for display modes.

use kiln_model::{FieldNode, FormDefinition, FormMode};
use serde_json::Value;
use tracing::debug;

/// Mark every node `is_read_only` when `mode` is a read-only mode.
/// Returns the number of nodes marked.
pub fn apply_form_mode(definition: &mut FormDefinition, mode: FormMode) -> usize {
    if !mode.is_read_only() {
        return 0;
    }
    let marked = definition.items_mut().map_or(0, |items| mark_read_only(items));
    debug!(mode = %mode, marked, "applied read-only form mode");
    marked
}

/// Set `is_read_only = true` on `items` and all of their descendants.
pub fn mark_read_only(items: &mut [FieldNode]) -> usize {
    let mut marked = 0;
    for item in items {
        item.is_read_only = Some(Value::Bool(true));
        marked += 1;
        if let Some(children) = item.children.as_mut() {
            marked += mark_read_only(children);
        }
        if let Some(children) = item.container_items.as_mut() {
            marked += mark_read_only(children);
        }
    }
    marked
}
