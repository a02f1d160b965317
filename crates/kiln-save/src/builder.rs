//! Save payload construction.
//!
//! Rows come from the same expansion validation uses, so every row that is
//! validated is also the row that is saved.

use chrono::{DateTime, SecondsFormat, Utc};
use kiln_model::{
    EngineOptions, FieldNode, FormDefinition, FormTemplate, RenderMode, RuntimeState, StateMap,
};
use kiln_state::{ContainerRow, expand_nested_rows, expand_rows};
use kiln_validate::should_field_be_included_for_saving;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use crate::error::Result;

/// Payload handed to the persistence transport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedData {
    /// Leaf values by uuid; repeatable containers hold arrays of row objects.
    pub data: StateMap,
    pub form_definition: FormTemplate,
    /// Caller metadata plus `updated_date`.
    pub metadata: StateMap,
}

/// Builder for [`SavedData`].
#[derive(Debug, Clone)]
pub struct SaveDataBuilder<'a> {
    definition: &'a FormDefinition,
    metadata: StateMap,
    options: EngineOptions,
    timestamp: Option<DateTime<Utc>>,
}

impl<'a> SaveDataBuilder<'a> {
    /// `definition` is the template the payload snapshots, not the bound tree.
    pub fn new(definition: &'a FormDefinition) -> Self {
        Self {
            definition,
            metadata: StateMap::new(),
            options: EngineOptions::default(),
            timestamp: None,
        }
    }

    #[must_use]
    pub fn with_metadata(mut self, metadata: StateMap) -> Self {
        self.metadata = metadata;
        self
    }

    /// Render mode whose visibility flags decide inclusion.
    #[must_use]
    pub fn with_mode(mut self, mode: RenderMode) -> Self {
        self.options.render_mode = mode;
        self
    }

    #[must_use]
    pub fn with_options(mut self, options: EngineOptions) -> Self {
        self.options = options;
        self
    }

    /// Fix the `updated_date` stamp instead of reading the clock.
    #[must_use]
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Walk `items` against `state` and assemble the payload.
    pub fn build(&self, items: &[FieldNode], state: &RuntimeState) -> Result<SavedData> {
        let form_definition = FormTemplate::from_definition(self.definition)?;

        let collector = Collector {
            state,
            mode: self.options.render_mode,
        };
        let mut data = StateMap::new();
        for item in items {
            collector.item(item, &mut data);
        }

        let stamp = self.timestamp.unwrap_or_else(Utc::now);
        let mut metadata = self.metadata.clone();
        metadata.insert(
            "updated_date".to_string(),
            Value::String(stamp.to_rfc3339_opts(SecondsFormat::Millis, true)),
        );

        info!(fields = data.len(), "built save payload");
        Ok(SavedData {
            data,
            form_definition,
            metadata,
        })
    }
}

/// Build a payload with default options and the current time.
pub fn create_saved_data(
    items: &[FieldNode],
    state: &RuntimeState,
    definition: &FormDefinition,
    metadata: StateMap,
) -> Result<SavedData> {
    SaveDataBuilder::new(definition)
        .with_metadata(metadata)
        .build(items, state)
}

struct Collector<'a> {
    state: &'a RuntimeState,
    mode: RenderMode,
}

impl Collector<'_> {
    fn item(&self, item: &FieldNode, out: &mut StateMap) {
        if item.is_repeatable() {
            let rows = expand_rows(item, &item.uuid, self.state);
            let saved = self.rows(item, &item.uuid, &rows);
            if !saved.is_empty() {
                out.insert(item.uuid.clone(), Value::Array(saved));
            }
        } else if item.is_container() {
            for child in item.children() {
                self.item(child, out);
            }
        } else {
            let values = &self.state.form_state;
            if let Some(value) = values.get(&item.uuid)
                && should_field_be_included_for_saving(item, self.mode, values)
            {
                out.insert(item.uuid.clone(), value.clone());
            }
        }
    }

    /// Saved row objects of one container instance. Rows left without any
    /// field are dropped.
    fn rows(&self, container: &FieldNode, container_key: &str, rows: &[ContainerRow]) -> Vec<Value> {
        let fields = container.row_fields();
        let nested = container.nested_repeaters();

        let mut saved = Vec::with_capacity(rows.len());
        for row in rows {
            let mut object = StateMap::new();
            for field in &fields {
                if let Some(value) = row.get(&field.uuid)
                    && should_field_be_included_for_saving(field, self.mode, &row.values)
                {
                    object.insert(field.uuid.clone(), value.clone());
                }
            }
            for repeater in &nested {
                let nested_rows = expand_nested_rows(repeater, container_key, row, self.state);
                let nested_key = row
                    .nested_key(container_key, &repeater.uuid)
                    .unwrap_or_else(|| repeater.uuid.clone());
                let nested_saved = self.rows(repeater, &nested_key, &nested_rows);
                if !nested_saved.is_empty() {
                    object.insert(repeater.uuid.clone(), Value::Array(nested_saved));
                }
            }

            if object.is_empty() {
                debug!(container = %container.uuid, group = ?row.group_id, "dropping empty row");
            } else {
                saved.push(Value::Object(object));
            }
        }
        saved
    }
}
