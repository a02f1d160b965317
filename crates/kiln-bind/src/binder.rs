//! Injects a flat external data map into a copy of a form definition.

use kiln_model::{FieldKind, FieldNode, FormDefinition, StateMap};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::coerce::coerce_value;

/// A bound copy of a definition plus what was injected where.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoundForm {
    pub definition: FormDefinition,
    /// Injected value per data key. Repeaters record `"[repeater] N rows"`.
    pub debug: StateMap,
}

/// Bind `data` onto a clone of `definition`. The input is never modified.
///
/// Data is looked up by each node's [`FieldNode::data_key`]. A definition
/// without items is returned unchanged with an empty debug map.
pub fn bind_data_to_form(data: &StateMap, definition: &FormDefinition) -> BoundForm {
    let mut bound = definition.clone();
    let mut notes = StateMap::new();

    match bound.items_mut() {
        Some(items) => bind_items(items, data, &mut notes),
        None => warn!(
            form_id = definition.form_id.as_deref().unwrap_or_default(),
            "definition has no items to bind"
        ),
    }

    debug!(bound = notes.len(), "bound data to form");
    BoundForm {
        definition: bound,
        debug: notes,
    }
}

fn bind_items(items: &mut [FieldNode], data: &StateMap, notes: &mut StateMap) {
    for item in items {
        bind_item(item, data, notes);
    }
}

fn bind_item(item: &mut FieldNode, data: &StateMap, notes: &mut StateMap) {
    let key = item.data_key();
    let entry = data.get(&key);

    if item.is_repeater()
        && let Some(Value::Array(rows)) = entry
    {
        notes.insert(key, Value::String(format!("[repeater] {} rows", rows.len())));
        item.repeater_data = Some(rows.clone());
        return;
    }

    if let Some(children) = item.children.as_mut() {
        bind_items(children, data, notes);
        return;
    }
    if let Some(children) = item.container_items.as_mut() {
        bind_items(children, data, notes);
        return;
    }
    if item.is_repeater() {
        return;
    }

    if let Some(raw) = entry {
        let value = coerce_value(&item.kind(), raw);
        inject(item, value.clone());
        notes.insert(key, value);
    }
}

/// Set `value` and mirror it into the attributes the renderer reads.
fn inject(item: &mut FieldNode, value: Value) {
    let kind = item.kind();
    let attributes = &mut item.attributes;
    attributes.retain(|name, _| name != "defaultValue");
    match kind {
        FieldKind::Checkbox => {
            attributes.insert("checked".to_string(), value.clone());
        }
        FieldKind::Select | FieldKind::Radio => {
            attributes.insert("selected".to_string(), value.clone());
        }
        _ => {}
    }
    attributes.insert("value".to_string(), value.clone());
    item.value = Some(value);
}
