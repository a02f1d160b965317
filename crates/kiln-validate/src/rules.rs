//! Validation rules derived from declarative node attributes.

use std::fmt;
use std::sync::Arc;

use kiln_model::value::{attr_flag, attr_number};
use kiln_model::{Attributes, ValueType};
use serde_json::Value;
use tracing::warn;

use crate::mask::{CompiledMask, compile_mask};

/// Caller-supplied check returning an error message on failure.
pub type CustomValidator = Arc<dyn Fn(&Value) -> Option<String> + Send + Sync>;

/// Normalized rule set for one field.
#[derive(Clone, Default)]
pub struct ValidationRules {
    pub required: bool,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub length: Option<f64>,
    pub min_length: Option<f64>,
    pub max_length: Option<f64>,
    pub step: Option<f64>,
    pub pattern: Option<CompiledMask>,
    pub is_integer: bool,
    pub is_email: bool,
    pub is_url: bool,
    pub ten_digit_phone: bool,
    pub custom: Vec<CustomValidator>,
}

impl fmt::Debug for ValidationRules {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidationRules")
            .field("required", &self.required)
            .field("min", &self.min)
            .field("max", &self.max)
            .field("length", &self.length)
            .field("min_length", &self.min_length)
            .field("max_length", &self.max_length)
            .field("step", &self.step)
            .field("pattern", &self.pattern.as_ref().map(CompiledMask::source))
            .field("is_integer", &self.is_integer)
            .field("is_email", &self.is_email)
            .field("is_url", &self.is_url)
            .field("ten_digit_phone", &self.ten_digit_phone)
            .field("custom", &self.custom.len())
            .finish()
    }
}

impl ValidationRules {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    #[must_use]
    pub fn with_range(mut self, min: Option<f64>, max: Option<f64>) -> Self {
        self.min = min;
        self.max = max;
        self
    }

    #[must_use]
    pub fn with_step(mut self, step: f64) -> Self {
        self.step = Some(step);
        self
    }

    #[must_use]
    pub fn with_pattern(mut self, pattern: CompiledMask) -> Self {
        self.pattern = Some(pattern);
        self
    }

    /// Append a custom validator. Validators run in insertion order.
    #[must_use]
    pub fn with_custom<F>(mut self, validator: F) -> Self
    where
        F: Fn(&Value) -> Option<String> + Send + Sync + 'static,
    {
        self.custom.push(Arc::new(validator));
        self
    }

    /// True when no rule would ever reject a value.
    pub fn is_empty(&self) -> bool {
        !self.required
            && self.min.is_none()
            && self.max.is_none()
            && self.length.is_none()
            && self.min_length.is_none()
            && self.max_length.is_none()
            && self.step.is_none()
            && self.pattern.is_none()
            && !self.is_integer
            && !self.is_email
            && !self.is_url
            && !self.ten_digit_phone
            && self.custom.is_empty()
    }
}

/// Derive rules from a node's attributes.
///
/// Malformed `pattern`/`mask` attributes are logged and dropped.
pub fn rules_from_attributes(
    attributes: &Attributes,
    is_required: bool,
    value_type: ValueType,
) -> ValidationRules {
    let mut rules = ValidationRules {
        required: is_required || attr_flag(attributes, "required"),
        max_length: attr_number(attributes, "maxLength").or_else(|| attr_number(attributes, "maxCount")),
        min_length: attr_number(attributes, "minLength"),
        length: attr_number(attributes, "length"),
        step: attr_number(attributes, "step"),
        is_integer: attr_flag(attributes, "integer"),
        is_email: attr_flag(attributes, "email"),
        is_url: attr_flag(attributes, "url"),
        ten_digit_phone: attr_flag(attributes, "phone")
            || attributes.get("maskType").and_then(Value::as_str) == Some("phone"),
        ..ValidationRules::default()
    };

    if value_type != ValueType::Date {
        rules.min = attr_number(attributes, "min");
        rules.max = attr_number(attributes, "max");
    }

    if !rules.is_email && !rules.is_url {
        rules.pattern = derive_pattern(attributes, value_type);
    }

    rules
}

fn derive_pattern(attributes: &Attributes, value_type: ValueType) -> Option<CompiledMask> {
    let (attribute, raw) = match attributes.get("pattern").and_then(Value::as_str) {
        Some(pattern) if !pattern.trim().is_empty() => ("pattern", pattern),
        _ if value_type == ValueType::Number => return None,
        _ => match attributes.get("mask").and_then(Value::as_str) {
            Some(mask) if !mask.trim().is_empty() => ("mask", mask),
            _ => return None,
        },
    };
    match compile_mask(raw) {
        Ok(compiled) => Some(compiled),
        Err(err) => {
            warn!(attribute, raw, error = %err, "dropping malformed pattern constraint");
            None
        }
    }
}
