//! Runtime state published by the rendering layer.
//!
//! The engine never reads ambient globals; every pass receives a
//! [`RuntimeState`] snapshot by reference. Writers go through the small
//! publishing API at the bottom of this module.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;
use crate::value::StateMap;

/// One entry of a container's group list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GroupSlot {
    /// Bare group id; values live in `formState` under stable keys.
    Id(String),
    /// Materialized row object keyed by child uuid.
    Row(StateMap),
    /// Anything else the UI left behind. Ignored by the engine.
    Other(Value),
}

impl GroupSlot {
    pub fn as_id(&self) -> Option<&str> {
        match self {
            GroupSlot::Id(id) => Some(id),
            _ => None,
        }
    }

    pub fn as_row(&self) -> Option<&StateMap> {
        match self {
            GroupSlot::Row(row) => Some(row),
            _ => None,
        }
    }
}

/// Container key to group list.
pub type GroupState = BTreeMap<String, Vec<GroupSlot>>;

/// Container key to live group ids, in display order.
pub type ActiveGroups = BTreeMap<String, Vec<String>>;

/// How a container's group list should be read.
#[derive(Debug, Clone, PartialEq)]
pub enum GroupShape<'a> {
    /// Missing, empty, or holding only foreign values.
    Empty,
    /// Only bare ids.
    Ids(Vec<&'a str>),
    /// At least one row object; rows are taken in order, other slots skipped.
    Rows(Vec<&'a StateMap>),
}

/// Classify a group list. Any row object makes the list a row list.
pub fn classify_group(slots: &[GroupSlot]) -> GroupShape<'_> {
    let rows: Vec<&StateMap> = slots.iter().filter_map(GroupSlot::as_row).collect();
    if !rows.is_empty() {
        return GroupShape::Rows(rows);
    }
    let ids: Vec<&str> = slots.iter().filter_map(GroupSlot::as_id).collect();
    if ids.is_empty() {
        GroupShape::Empty
    } else {
        GroupShape::Ids(ids)
    }
}

/// Flat form state plus the repeatable-group bookkeeping that goes with it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RuntimeState {
    /// Field values keyed by uuid (top level) or stable key (inside rows).
    pub form_state: StateMap,
    pub group_state: GroupState,
    /// When present for a container, the only source of row order and
    /// liveness.
    pub active_groups: ActiveGroups,
}

impl RuntimeState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json_str(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn from_value(value: Value) -> Result<Self> {
        Ok(serde_json::from_value(value)?)
    }

    pub fn value(&self, key: &str) -> Option<&Value> {
        self.form_state.get(key)
    }

    pub fn group(&self, container_key: &str) -> &[GroupSlot] {
        self.group_state
            .get(container_key)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn active(&self, container_key: &str) -> Option<&[String]> {
        self.active_groups.get(container_key).map(Vec::as_slice)
    }

    /// Record a field value.
    pub fn publish(&mut self, key: impl Into<String>, value: Value) {
        self.form_state.insert(key.into(), value);
    }

    /// Replace the live group ids of a container.
    pub fn set_active_groups<I, S>(&mut self, container_key: impl Into<String>, ids: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.active_groups
            .insert(container_key.into(), ids.into_iter().map(Into::into).collect());
    }

    /// Replace a container's group list with bare ids.
    pub fn set_group_ids<I, S>(&mut self, container_key: impl Into<String>, ids: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let slots = ids.into_iter().map(|id| GroupSlot::Id(id.into())).collect();
        self.group_state.insert(container_key.into(), slots);
    }

    /// Replace a container's group list with row objects.
    pub fn set_group_rows(&mut self, container_key: impl Into<String>, rows: Vec<StateMap>) {
        let slots = rows.into_iter().map(GroupSlot::Row).collect();
        self.group_state.insert(container_key.into(), slots);
    }
}
