//! Whole-form validation.
//!
//! Walks the definition tree the same way the save builder does: plain
//! containers are transparent, repeatable containers expand into rows and
//! every visible field of every row is validated against that row's values.

use std::collections::BTreeMap;

use kiln_model::{EngineOptions, FieldNode, RenderMode, RuntimeState, StateMap};
use kiln_state::{ContainerRow, expand_nested_rows, expand_rows};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};

use crate::rules::rules_from_attributes;
use crate::value::{ValidateOptions, validate_value};
use crate::visibility::is_field_visible;

const ALL_VALID: &str = "All fields are valid.";
const FIX_HEADER: &str = "Please fix the following errors:";

/// Result of validating every visible field of a form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormValidation {
    pub is_valid: bool,
    /// First error per field key. Repeated fields are keyed
    /// `{uuid}__row_{index}`.
    pub errors: BTreeMap<String, String>,
    pub error_list: Vec<String>,
    pub consolidated_message: String,
}

impl FormValidation {
    pub fn error_count(&self) -> usize {
        self.errors.len()
    }
}

/// Validate all visible fields of `items` against the runtime state.
pub fn validate_all_fields(
    items: &[FieldNode],
    state: &RuntimeState,
    options: &EngineOptions,
) -> FormValidation {
    let mut walker = Walker {
        state,
        options,
        errors: BTreeMap::new(),
        error_list: Vec::new(),
    };
    for item in items {
        walker.item(item, &Scope::root());
    }

    let is_valid = walker.errors.is_empty();
    let consolidated_message = if is_valid {
        ALL_VALID.to_string()
    } else {
        std::iter::once(FIX_HEADER.to_string())
            .chain(walker.error_list.iter().map(|entry| format!("• {entry}")))
            .collect::<Vec<_>>()
            .join("\n")
    };
    info!(
        valid = is_valid,
        errors = walker.errors.len(),
        "validated form"
    );

    FormValidation {
        is_valid,
        errors: walker.errors,
        error_list: walker.error_list,
        consolidated_message,
    }
}

/// Where a field sits: the path segments shown to users and the row indices
/// that disambiguate its error key.
#[derive(Debug, Clone, Default)]
struct Scope {
    path: Vec<String>,
    rows: Vec<usize>,
}

impl Scope {
    fn root() -> Self {
        Self::default()
    }

    fn container(&self, container: &FieldNode) -> Self {
        let mut next = self.clone();
        next.path.push(container.legend().to_string());
        next
    }

    fn row(&self, container: &FieldNode, index: usize) -> Self {
        let mut next = self.clone();
        next.path.push(format!("{} #{}", container.legend(), index + 1));
        next.rows.push(index);
        next
    }

    fn error_key(&self, uuid: &str) -> String {
        if self.rows.is_empty() {
            return uuid.to_string();
        }
        let indices: Vec<String> = self.rows.iter().map(usize::to_string).collect();
        format!("{uuid}__row_{}", indices.join("_"))
    }
}

struct Walker<'a> {
    state: &'a RuntimeState,
    options: &'a EngineOptions,
    errors: BTreeMap<String, String>,
    error_list: Vec<String>,
}

impl Walker<'_> {
    fn item(&mut self, item: &FieldNode, scope: &Scope) {
        if item.is_repeatable() {
            let rows = expand_rows(item, &item.uuid, self.state);
            self.rows(item, &item.uuid, &rows, scope);
        } else if item.is_container() {
            let inner = scope.container(item);
            for child in item.children() {
                self.item(child, &inner);
            }
        } else {
            let form_state = &self.state.form_state;
            self.field(item, form_state, scope);
        }
    }

    fn rows(
        &mut self,
        container: &FieldNode,
        container_key: &str,
        rows: &[ContainerRow],
        scope: &Scope,
    ) {
        for (index, row) in rows.iter().enumerate() {
            let row_scope = scope.row(container, index);
            self.row_members(container.children(), container_key, row, &row_scope);
        }
    }

    /// Members of one row in tree order. Plain containers inside the row add
    /// their legend to the path like they do at the top level.
    fn row_members(
        &mut self,
        children: &[FieldNode],
        container_key: &str,
        row: &ContainerRow,
        scope: &Scope,
    ) {
        for child in children {
            if child.is_repeatable() {
                let nested_rows = expand_nested_rows(child, container_key, row, self.state);
                let nested_key = row
                    .nested_key(container_key, &child.uuid)
                    .unwrap_or_else(|| child.uuid.clone());
                self.rows(child, &nested_key, &nested_rows, scope);
            } else if child.is_container() {
                self.row_members(child.children(), container_key, row, &scope.container(child));
            } else {
                self.field(child, &row.values, scope);
            }
        }
    }

    fn field(&mut self, item: &FieldNode, values: &StateMap, scope: &Scope) {
        if !is_field_visible(item, RenderMode::Web, values) {
            debug!(field = %item.uuid, "skipping hidden field");
            return;
        }

        let value_type = item.value_type();
        let rules = rules_from_attributes(&item.attributes, item.is_required(), value_type);
        let label = item.label().unwrap_or(self.options.default_label.as_str());
        let value = effective_value(item, values.get(&item.uuid));

        let verdict = validate_value(value, &rules, ValidateOptions::new(value_type, label));
        let Some(first) = verdict.first_error else {
            return;
        };

        let key = scope.error_key(&item.uuid);
        if self.errors.contains_key(&key) {
            return;
        }
        self.error_list.push(list_entry(&scope.path, label, &first));
        self.errors.insert(key, first);
    }
}

/// State value, else the node's preloaded `attributes.value`, else `value`,
/// when the state holds nothing usable.
fn effective_value<'a>(item: &'a FieldNode, stored: Option<&'a Value>) -> Option<&'a Value> {
    match stored {
        Some(Value::String(s)) if s.is_empty() => {}
        Some(Value::Null) | None => {}
        Some(value) => return Some(value),
    }
    item.attributes
        .get("value")
        .or(item.value.as_ref())
        .or(stored)
}

fn list_entry(path: &[String], label: &str, message: &str) -> String {
    let detail = message
        .strip_prefix(label)
        .map(str::trim_start)
        .filter(|rest| !rest.is_empty())
        .unwrap_or(message);
    if path.is_empty() {
        format!("{label} - {detail}")
    } else {
        format!("{}: {label} - {detail}", path.join(" > "))
    }
}
