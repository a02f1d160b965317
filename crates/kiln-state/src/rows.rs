//! Row expansion for repeatable containers.
//!
//! A container instance gets its rows from one of three places, checked in
//! order:
//!
//! 1. bare group ids in `groupState[key]`, read back from `formState`,
//! 2. row objects already stored in `groupState[key]`,
//! 3. inference over `formState` keys that start with `{key}-`.
//!
//! A non-empty `activeGroups[key]` decides which groups are live and, for
//! inferred rows, their order.

use std::collections::HashMap;

use kiln_model::stable_key::{self, StableKeyDecoder};
use kiln_model::{FieldNode, GroupShape, RuntimeState, StateMap, classify_group};
use serde_json::Value;
use tracing::debug;

/// Where a container's rows came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowSource {
    BareIds,
    RowObjects,
    Inferred,
    /// Rows embedded in the parent row object of a nested repeater.
    ParentRow,
}

/// One row of a repeatable container.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContainerRow {
    /// Group id, when known. Rows taken from stored row objects beyond the
    /// length of the known id order have none.
    pub group_id: Option<String>,
    /// Row field values keyed by child uuid. May also hold nested row arrays.
    pub values: StateMap,
}

impl ContainerRow {
    pub fn get(&self, uuid: &str) -> Option<&Value> {
        self.values.get(uuid)
    }

    /// Instance key of a nested repeater inside this row.
    pub fn nested_key(&self, container_key: &str, nested_uuid: &str) -> Option<String> {
        self.group_id
            .as_deref()
            .map(|group| stable_key::nested_container_key(container_key, group, nested_uuid))
    }
}

/// Which of the three sources [`expand_rows`] will read for `container_key`.
pub fn row_source(container_key: &str, state: &RuntimeState) -> RowSource {
    match classify_group(state.group(container_key)) {
        GroupShape::Ids(_) => RowSource::BareIds,
        GroupShape::Rows(_) => RowSource::RowObjects,
        GroupShape::Empty => RowSource::Inferred,
    }
}

/// Expand the rows of one repeatable container instance.
pub fn expand_rows(
    container: &FieldNode,
    container_key: &str,
    state: &RuntimeState,
) -> Vec<ContainerRow> {
    let rows = match classify_group(state.group(container_key)) {
        GroupShape::Ids(ids) => rows_from_ids(container, container_key, &ids, state),
        GroupShape::Rows(stored) => {
            let order = group_order(container, container_key, state);
            stored
                .into_iter()
                .enumerate()
                .map(|(index, values)| ContainerRow {
                    group_id: order.get(index).cloned(),
                    values: values.clone(),
                })
                .collect()
        }
        GroupShape::Empty => infer_rows(container, container_key, state),
    };
    debug!(
        container = %container.uuid,
        container_key,
        source = ?row_source(container_key, state),
        rows = rows.len(),
        "expanded container rows"
    );
    rows
}

/// Rows of a repeater nested inside `parent_row` of the container keyed
/// `parent_key`.
///
/// An array stored on the parent row under the nested uuid wins, even an
/// empty one; otherwise the nested instance key is expanded like any other
/// container.
pub fn expand_nested_rows(
    nested: &FieldNode,
    parent_key: &str,
    parent_row: &ContainerRow,
    state: &RuntimeState,
) -> Vec<ContainerRow> {
    let nested_key = parent_row.nested_key(parent_key, &nested.uuid);

    if let Some(Value::Array(embedded)) = parent_row.get(&nested.uuid) {
        let order = nested_key
            .as_deref()
            .map(|key| group_order(nested, key, state))
            .unwrap_or_default();
        return embedded
            .iter()
            .filter_map(Value::as_object)
            .enumerate()
            .map(|(index, values)| ContainerRow {
                group_id: order.get(index).cloned(),
                values: values.clone(),
            })
            .collect();
    }

    match nested_key {
        Some(key) => expand_rows(nested, &key, state),
        None => Vec::new(),
    }
}

fn rows_from_ids(
    container: &FieldNode,
    container_key: &str,
    ids: &[&str],
    state: &RuntimeState,
) -> Vec<ContainerRow> {
    let fields = container.row_fields();
    let active = live_groups(container_key, state);
    ids.iter()
        .copied()
        .filter(|id| active.is_none_or(|live| live.iter().any(|a| a == id)))
        .map(|id| {
            let mut values = StateMap::new();
            for field in &fields {
                let key = stable_key::encode(container_key, id, &field.uuid);
                if let Some(value) = state.value(&key) {
                    values.insert(field.uuid.clone(), value.clone());
                }
            }
            ContainerRow {
                group_id: Some(id.to_string()),
                values,
            }
        })
        .collect()
}

/// Non-empty `activeGroups[key]`. An empty list carries no information.
fn live_groups<'s>(container_key: &str, state: &'s RuntimeState) -> Option<&'s [String]> {
    state.active(container_key).filter(|ids| !ids.is_empty())
}

/// Group id order used to label stored row objects. Matches the order
/// inference produces, which is the order normalization writes rows in.
fn group_order(container: &FieldNode, container_key: &str, state: &RuntimeState) -> Vec<String> {
    let mut scan = scan_groups(container, container_key, state);
    inferred_ids(&mut scan, container_key, state)
}

struct Scan {
    order: Vec<String>,
    values: HashMap<String, StateMap>,
}

/// Collect row values by group id from stable keys, in first-seen order.
fn scan_groups(container: &FieldNode, container_key: &str, state: &RuntimeState) -> Scan {
    let fields = container.row_fields();
    let nested: Vec<&str> = container
        .nested_repeaters()
        .iter()
        .map(|node| node.uuid.as_str())
        .collect();
    let decoder = StableKeyDecoder::new(container_key, fields.iter().map(|f| f.uuid.as_str()));

    let mut scan = Scan {
        order: Vec::new(),
        values: HashMap::new(),
    };
    for (key, value) in &state.form_state {
        if !decoder.owns(key) {
            continue;
        }
        if let Some(decoded) = decoder.decode(key) {
            scan.row(decoded.group_id)
                .insert(decoded.child_uuid.to_string(), value.clone());
        } else if let Some(group) = decoder.group_of(key, &nested) {
            // Row known only through a nested repeater instance.
            scan.row(group);
        }
    }
    scan
}

impl Scan {
    fn row(&mut self, group: &str) -> &mut StateMap {
        if !self.values.contains_key(group) {
            self.order.push(group.to_string());
        }
        self.values.entry(group.to_string()).or_default()
    }
}

fn infer_rows(container: &FieldNode, container_key: &str, state: &RuntimeState) -> Vec<ContainerRow> {
    let mut scan = scan_groups(container, container_key, state);
    inferred_ids(&mut scan, container_key, state)
        .into_iter()
        .map(|id| {
            let values = scan.values.remove(&id).unwrap_or_default();
            ContainerRow {
                group_id: Some(id),
                values,
            }
        })
        .collect()
}

/// Live group ids: `activeGroups[key]` filtered to present groups, else the
/// first-seen scan order.
fn inferred_ids(scan: &mut Scan, container_key: &str, state: &RuntimeState) -> Vec<String> {
    match live_groups(container_key, state) {
        Some(active) => {
            let present: Vec<String> = active
                .iter()
                .filter(|id| {
                    let prefix = stable_key::row_prefix(container_key, id);
                    state.form_state.keys().any(|key| key.starts_with(&prefix))
                })
                .cloned()
                .collect();
            let stale = scan.order.iter().filter(|id| !active.contains(id)).count();
            if stale > 0 {
                debug!(container_key, stale, "skipped stale groups absent from activeGroups");
            }
            present
        }
        None => std::mem::take(&mut scan.order),
    }
}
