//! Form definition tree nodes.
//!
//! A definition is a tree of [`FieldNode`]s. Leaves hold a single value;
//! containers group children and may be marked repeatable, in which case
//! their children act as a row template instantiated once per group.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::value::{Attributes, is_truthy, js_string};

/// Node type discriminant, parsed from the raw `type` string.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FieldKind {
    Container,
    Text,
    TextArea,
    Number,
    Date,
    Checkbox,
    Select,
    Radio,
    Info,
    Other(String),
}

impl FieldKind {
    /// Classify a raw `type` string. Both the short names and the
    /// `*-input` widget names used by form builders are accepted.
    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            "container" => FieldKind::Container,
            "text" | "text-input" => FieldKind::Text,
            "textarea" | "text-area" => FieldKind::TextArea,
            "number" | "number-input" => FieldKind::Number,
            "date" | "date-picker" => FieldKind::Date,
            "checkbox" | "checkbox-input" | "toggle" => FieldKind::Checkbox,
            "select" | "select-input" | "dropdown" => FieldKind::Select,
            "radio" | "radio-input" => FieldKind::Radio,
            "info" | "text-info" => FieldKind::Info,
            other => FieldKind::Other(other.to_string()),
        }
    }

    /// Semantic type used by validation.
    pub fn value_type(&self) -> ValueType {
        match self {
            FieldKind::Number => ValueType::Number,
            FieldKind::Date => ValueType::Date,
            FieldKind::Checkbox => ValueType::Boolean,
            _ => ValueType::String,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            FieldKind::Container => "container",
            FieldKind::Text => "text",
            FieldKind::TextArea => "textarea",
            FieldKind::Number => "number",
            FieldKind::Date => "date",
            FieldKind::Checkbox => "checkbox",
            FieldKind::Select => "select",
            FieldKind::Radio => "radio",
            FieldKind::Info => "info",
            FieldKind::Other(raw) => raw.as_str(),
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Semantic value type of a field for validation purposes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    #[default]
    String,
    Number,
    Date,
    Boolean,
}

/// A single node of a form definition: a leaf field or a container.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldNode {
    pub uuid: String,
    #[serde(rename = "type", default)]
    pub field_type: String,
    /// External data key; preferred over `uuid` when binding data.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub attributes: Attributes,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<FieldNode>>,
    #[serde(
        rename = "containerItems",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub container_items: Option<Vec<FieldNode>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_required: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visible_web: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visible_pdf: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub save_on_submit: Option<bool>,
    /// Visibility predicate source, evaluated against row or form state.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_visibility: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_read_only: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    /// Raw rows injected by the binder for repeatable containers.
    #[serde(
        rename = "repeaterData",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub repeater_data: Option<Vec<Value>>,
    /// Keys this engine does not interpret (options, order, help text, ...).
    #[serde(flatten)]
    pub extra: Attributes,
}

impl FieldNode {
    /// Create a leaf node of the given type.
    pub fn leaf(uuid: impl Into<String>, field_type: impl Into<String>) -> Self {
        Self {
            uuid: uuid.into(),
            field_type: field_type.into(),
            ..Self::default()
        }
    }

    /// Create a container node with the given children.
    pub fn container(uuid: impl Into<String>, children: Vec<FieldNode>) -> Self {
        Self {
            uuid: uuid.into(),
            field_type: "container".to_string(),
            children: Some(children),
            ..Self::default()
        }
    }

    /// Mark this node repeatable (`attributes.isRepeatable = true`).
    #[must_use]
    pub fn repeatable(mut self) -> Self {
        self.attributes
            .insert("isRepeatable".to_string(), Value::Bool(true));
        self
    }

    /// Set an attribute.
    #[must_use]
    pub fn with_attribute(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.to_string(), value.into());
        self
    }

    #[must_use]
    pub fn required(mut self) -> Self {
        self.is_required = Some(true);
        self
    }

    pub fn kind(&self) -> FieldKind {
        FieldKind::parse(&self.field_type)
    }

    pub fn value_type(&self) -> ValueType {
        self.kind().value_type()
    }

    /// A container is a `container` node that carries a child list.
    pub fn is_container(&self) -> bool {
        self.kind() == FieldKind::Container && self.children.is_some()
    }

    /// Repeatable containers have `attributes.isRepeatable === true`.
    pub fn is_repeatable(&self) -> bool {
        self.is_container() && self.attributes.get("isRepeatable") == Some(&Value::Bool(true))
    }

    /// Legacy repeater marker honoured by the binder in addition to
    /// `isRepeatable`.
    pub fn is_repeater(&self) -> bool {
        self.attributes.get("isRepeatable").is_some_and(is_truthy)
            || self.extra.get("repeater").is_some_and(is_truthy)
    }

    pub fn is_required(&self) -> bool {
        self.is_required == Some(true)
    }

    pub fn children(&self) -> &[FieldNode] {
        self.children.as_deref().unwrap_or(&[])
    }

    /// Key used to look up this node in an external data map: the string
    /// form of `id` when present and non-empty, else `uuid`.
    pub fn data_key(&self) -> String {
        match &self.id {
            Some(Value::Null) | None => self.uuid.clone(),
            Some(id) => {
                let key = js_string(id);
                if key.is_empty() {
                    self.uuid.clone()
                } else {
                    key
                }
            }
        }
    }

    /// Human label used in validation messages.
    pub fn label(&self) -> Option<&str> {
        self.attributes
            .get("labelText")
            .and_then(Value::as_str)
            .or(self.name.as_deref())
    }

    /// Display label falling back through `labelText`, `text` and `name`.
    pub fn display_label(&self) -> String {
        self.attributes
            .get("labelText")
            .and_then(Value::as_str)
            .or_else(|| self.attributes.get("text").and_then(Value::as_str))
            .or(self.name.as_deref())
            .unwrap_or_default()
            .to_string()
    }

    /// Container caption used in error paths: `legend`, `name`, then `uuid`.
    pub fn legend(&self) -> &str {
        self.attributes
            .get("legend")
            .and_then(Value::as_str)
            .or(self.name.as_deref())
            .unwrap_or(&self.uuid)
    }

    /// Leaf descendants that belong to one row of this container: direct
    /// leaf children plus leaves of non-repeatable child containers.
    pub fn row_fields(&self) -> Vec<&FieldNode> {
        let mut fields = Vec::new();
        collect_row_members(self.children(), &mut fields, &mut Vec::new());
        fields
    }

    /// Repeatable containers nested inside one row of this container.
    pub fn nested_repeaters(&self) -> Vec<&FieldNode> {
        let mut nested = Vec::new();
        collect_row_members(self.children(), &mut Vec::new(), &mut nested);
        nested
    }

    /// Depth-first search for a node by uuid.
    pub fn find(&self, uuid: &str) -> Option<&FieldNode> {
        if self.uuid == uuid {
            return Some(self);
        }
        self.children().iter().find_map(|child| child.find(uuid))
    }
}

fn collect_row_members<'a>(
    children: &'a [FieldNode],
    fields: &mut Vec<&'a FieldNode>,
    nested: &mut Vec<&'a FieldNode>,
) {
    for child in children {
        if child.is_repeatable() {
            nested.push(child);
        } else if child.is_container() {
            collect_row_members(child.children(), fields, nested);
        } else {
            fields.push(child);
        }
    }
}

/// Find a node by uuid anywhere in a list of root items.
pub fn find_node<'a>(items: &'a [FieldNode], uuid: &str) -> Option<&'a FieldNode> {
    items.iter().find_map(|item| item.find(uuid))
}
