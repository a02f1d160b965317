//! Field validation issues.
//!
//! Each variant carries only the data its message needs.

use std::fmt;

use kiln_model::value::format_number;
use serde::{Deserialize, Serialize};

/// Stable message key of a violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    #[serde(rename = "required")]
    Required,
    #[serde(rename = "type_number")]
    TypeNumber,
    #[serde(rename = "type_integer")]
    TypeInteger,
    #[serde(rename = "range")]
    Range,
    #[serde(rename = "min")]
    Min,
    #[serde(rename = "max")]
    Max,
    #[serde(rename = "length_exact")]
    LengthExact,
    #[serde(rename = "minLength")]
    MinLength,
    #[serde(rename = "maxLength")]
    MaxLength,
    #[serde(rename = "pattern")]
    Pattern,
    #[serde(rename = "step")]
    Step,
    #[serde(rename = "email")]
    Email,
    #[serde(rename = "url")]
    Url,
    #[serde(rename = "ten_digit_phone")]
    TenDigitPhone,
    #[serde(rename = "custom")]
    Custom,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::Required => "required",
            ErrorKind::TypeNumber => "type_number",
            ErrorKind::TypeInteger => "type_integer",
            ErrorKind::Range => "range",
            ErrorKind::Min => "min",
            ErrorKind::Max => "max",
            ErrorKind::LengthExact => "length_exact",
            ErrorKind::MinLength => "minLength",
            ErrorKind::MaxLength => "maxLength",
            ErrorKind::Pattern => "pattern",
            ErrorKind::Step => "step",
            ErrorKind::Email => "email",
            ErrorKind::Url => "url",
            ErrorKind::TenDigitPhone => "ten_digit_phone",
            ErrorKind::Custom => "custom",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A rule violation, before it is rendered for a particular label.
#[derive(Debug, Clone, PartialEq)]
pub enum Violation {
    Required,
    TypeNumber,
    TypeInteger,
    Range { min: f64, max: f64 },
    Min { min: f64 },
    Max { max: f64 },
    LengthExact { length: f64 },
    MinLength { min_length: f64 },
    MaxLength { max_length: f64 },
    /// `mask` is set for formatting masks, which are quoted back to the user.
    Pattern { mask: Option<String> },
    /// `base` is the configured `min`, when there is one.
    Step { step: f64, base: Option<f64> },
    Email,
    Url,
    TenDigitPhone,
}

impl Violation {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Violation::Required => ErrorKind::Required,
            Violation::TypeNumber => ErrorKind::TypeNumber,
            Violation::TypeInteger => ErrorKind::TypeInteger,
            Violation::Range { .. } => ErrorKind::Range,
            Violation::Min { .. } => ErrorKind::Min,
            Violation::Max { .. } => ErrorKind::Max,
            Violation::LengthExact { .. } => ErrorKind::LengthExact,
            Violation::MinLength { .. } => ErrorKind::MinLength,
            Violation::MaxLength { .. } => ErrorKind::MaxLength,
            Violation::Pattern { .. } => ErrorKind::Pattern,
            Violation::Step { .. } => ErrorKind::Step,
            Violation::Email => ErrorKind::Email,
            Violation::Url => ErrorKind::Url,
            Violation::TenDigitPhone => ErrorKind::TenDigitPhone,
        }
    }

    /// Render the message for a field label.
    pub fn message(&self, label: &str) -> String {
        match self {
            Violation::Required => format!("{label} is required."),
            Violation::TypeNumber => format!("{label} must be a number."),
            Violation::TypeInteger => format!("{label} must be an integer."),
            Violation::Range { min, max } => format!(
                "{label} must be between {} and {}.",
                format_number(*min),
                format_number(*max)
            ),
            Violation::Min { min } => {
                format!("{label} must be at least {}.", format_number(*min))
            }
            Violation::Max { max } => {
                format!("{label} must be at most {}.", format_number(*max))
            }
            Violation::LengthExact { length } => format!(
                "{label} must be exactly {} characters.",
                format_number(*length)
            ),
            Violation::MinLength { min_length } => format!(
                "{label} must be at least {} characters.",
                format_number(*min_length)
            ),
            Violation::MaxLength { max_length } => format!(
                "{label} must be at most {} characters.",
                format_number(*max_length)
            ),
            Violation::Pattern { mask: Some(mask) } => {
                format!("{label} doesn't match the required format of {mask}.")
            }
            Violation::Pattern { mask: None } => {
                format!("{label} doesn't match the required format.")
            }
            Violation::Step {
                step,
                base: Some(base),
            } => format!(
                "{label} must align to steps of {} starting at {}.",
                format_number(*step),
                format_number(*base)
            ),
            Violation::Step { step, base: None } => {
                format!("{label} must align to steps of {}.", format_number(*step))
            }
            Violation::Email => format!("{label} must be a valid email address."),
            Violation::Url => format!("{label} must be a valid URL."),
            Violation::TenDigitPhone => format!("{label} must have 10 digits."),
        }
    }
}

/// One rendered error of a field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub kind: ErrorKind,
    pub message: String,
}

impl FieldError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_render_numbers_like_the_browser() {
        assert_eq!(
            Violation::Range { min: 1.0, max: 2.5 }.message("Age"),
            "Age must be between 1 and 2.5."
        );
        assert_eq!(
            Violation::Step {
                step: 0.5,
                base: Some(1.0)
            }
            .message("Dose"),
            "Dose must align to steps of 0.5 starting at 1."
        );
        assert_eq!(
            Violation::Step {
                step: 5.0,
                base: None
            }
            .message("Dose"),
            "Dose must align to steps of 5."
        );
    }

    #[test]
    fn pattern_message_quotes_formatting_masks() {
        let with_mask = Violation::Pattern {
            mask: Some("###-###-####".to_string()),
        };
        assert_eq!(
            with_mask.message("Phone"),
            "Phone doesn't match the required format of ###-###-####."
        );
        assert_eq!(
            Violation::Pattern { mask: None }.message("Code"),
            "Code doesn't match the required format."
        );
    }

    #[test]
    fn kinds_serialize_to_message_keys() {
        for kind in [ErrorKind::MinLength, ErrorKind::TenDigitPhone, ErrorKind::Custom] {
            let json = serde_json::to_value(kind).expect("serialize kind");
            assert_eq!(json, kind.as_str());
        }
    }
}
