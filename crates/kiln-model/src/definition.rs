//! Form definitions and the template snapshot stored with saved data.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::Result;
use crate::node::FieldNode;
use crate::value::Attributes;

/// `data` block of a definition. Items usually live here.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DefinitionData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Vec<FieldNode>>,
    #[serde(flatten)]
    pub extra: Attributes,
}

/// A form definition as delivered by the form repository.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FormDefinition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub form_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<DefinitionData>,
    /// Alternate item list used by older definitions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elements: Option<Vec<FieldNode>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_date: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_by: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_date: Option<Value>,
    #[serde(flatten)]
    pub extra: Attributes,
}

impl FormDefinition {
    pub fn from_json_str(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn from_value(value: Value) -> Result<Self> {
        Ok(serde_json::from_value(value)?)
    }

    /// Build a definition whose items live in `data.items`.
    pub fn with_items(form_id: impl Into<String>, items: Vec<FieldNode>) -> Self {
        Self {
            form_id: Some(form_id.into()),
            data: Some(DefinitionData {
                items: Some(items),
                extra: Map::new(),
            }),
            ..Self::default()
        }
    }

    /// Root items: `data.items` when present, else `elements`.
    pub fn items(&self) -> Option<&[FieldNode]> {
        self.data
            .as_ref()
            .and_then(|data| data.items.as_deref())
            .or(self.elements.as_deref())
    }

    pub fn has_items(&self) -> bool {
        self.items().is_some()
    }

    /// Mutable access to whichever item list [`FormDefinition::items`] reads.
    pub fn items_mut(&mut self) -> Option<&mut Vec<FieldNode>> {
        let in_data = self
            .data
            .as_ref()
            .is_some_and(|data| data.items.is_some());
        if in_data {
            self.data.as_mut().and_then(|data| data.items.as_mut())
        } else {
            self.elements.as_mut()
        }
    }
}

const TEMPLATE_DEFAULTED: [&str; 7] = [
    "id",
    "version",
    "status",
    "created_by",
    "created_date",
    "updated_by",
    "updated_date",
];

/// Normalized definition snapshot stored in a save payload.
///
/// Audit and identity fields are always present (empty string when the
/// definition had none) and `data` is always an object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormTemplate {
    pub id: Value,
    pub version: Value,
    pub status: Value,
    pub data: Value,
    pub created_by: Value,
    pub created_date: Value,
    pub updated_by: Value,
    pub updated_date: Value,
    /// Everything else the definition carried, in source order.
    #[serde(flatten)]
    pub rest: Attributes,
}

impl FormTemplate {
    pub fn from_definition(definition: &FormDefinition) -> Result<Self> {
        let Value::Object(mut fields) = serde_json::to_value(definition)? else {
            return Err(crate::ModelError::Message(
                "form definition did not serialize to an object".to_string(),
            ));
        };

        let mut take = |key: &str| match fields.get_mut(key).map(Value::take) {
            None | Some(Value::Null) => Value::String(String::new()),
            Some(value) => value,
        };
        let id = take("id");
        let version = take("version");
        let status = take("status");
        let created_by = take("created_by");
        let created_date = take("created_date");
        let updated_by = take("updated_by");
        let updated_date = take("updated_date");
        let data = match fields.get_mut("data").map(Value::take) {
            None | Some(Value::Null) => Value::Object(Map::new()),
            Some(value) => value,
        };

        let rest = fields
            .into_iter()
            .filter(|(key, _)| key != "data" && !TEMPLATE_DEFAULTED.contains(&key.as_str()))
            .collect();

        Ok(Self {
            id,
            version,
            status,
            data,
            created_by,
            created_date,
            updated_by,
            updated_date,
            rest,
        })
    }
}
