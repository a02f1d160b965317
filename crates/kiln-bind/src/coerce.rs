//! Type-aware coercion of bound values.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use kiln_model::FieldKind;
use kiln_model::value::{is_truthy, js_string, number_value};
use serde_json::Value;

/// Strings accepted as `true` by checkbox fields, compared case-insensitively.
const TRUTHY_WORDS: [&str; 5] = ["true", "1", "yes", "on", "y"];

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Coerce an external value for a field of `kind`.
pub fn coerce_value(kind: &FieldKind, raw: &Value) -> Value {
    match kind {
        FieldKind::Checkbox => Value::Bool(coerce_bool(raw)),
        FieldKind::Number => coerce_number(raw),
        FieldKind::Date => coerce_date(raw),
        FieldKind::Text | FieldKind::TextArea => match raw {
            Value::Null => Value::Null,
            Value::String(_) => raw.clone(),
            other => Value::String(js_string(other)),
        },
        _ => raw.clone(),
    }
}

/// Permissive boolean parsing.
pub fn coerce_bool(raw: &Value) -> bool {
    match raw {
        Value::String(s) => {
            let s = s.trim();
            TRUTHY_WORDS.iter().any(|word| s.eq_ignore_ascii_case(word))
        }
        other => is_truthy(other),
    }
}

/// Numbers pass through; numeric strings parse; anything else is `null`.
pub fn coerce_number(raw: &Value) -> Value {
    match raw {
        Value::Number(_) => raw.clone(),
        Value::Bool(b) => number_value(if *b { 1.0 } else { 0.0 }),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|n| n.is_finite())
            .map_or(Value::Null, number_value),
        _ => Value::Null,
    }
}

/// ISO timestamps become `YYYY-MM-DD`; other values pass through.
pub fn coerce_date(raw: &Value) -> Value {
    let Value::String(s) = raw else {
        return raw.clone();
    };
    match timestamp_date(s.trim()) {
        Some(date) => Value::String(date.format(DATE_FORMAT).to_string()),
        None => raw.clone(),
    }
}

/// Calendar date of an ISO 8601 timestamp, as written (no zone shift).
fn timestamp_date(raw: &str) -> Option<NaiveDate> {
    if !raw.contains('T') {
        return None;
    }
    if let Ok(stamp) = DateTime::parse_from_rfc3339(raw) {
        return Some(stamp.date_naive());
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .map(|stamp| stamp.date())
}
