//! JSON value helpers with the coercion rules form definitions are authored
//! against (string conversion, truthiness, lenient float parsing).

use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Number, Value};

/// Open key-value map used for node attributes and row objects.
pub type Attributes = Map<String, Value>;

/// Flat, insertion-ordered map of field values. Used both for the form-wide
/// state and for a single row of a repeatable container.
pub type StateMap = Map<String, Value>;

static FLOAT_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[+-]?(?:Infinity|(?:\d+\.?\d*|\.\d+)(?:[eE][+-]?\d+)?)")
        .expect("Invalid float prefix regex")
});

/// Format a float the way a browser prints numbers: integral values
/// without a fractional part, exponent notation below 1e-6 and from 1e21.
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        return "NaN".to_string();
    }
    if n.is_infinite() {
        return if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    let abs = n.abs();
    if abs != 0.0 && !(1e-6..1e21).contains(&abs) {
        let exp = format!("{n:e}");
        return match exp.split_once('e') {
            Some((mantissa, power)) if !power.starts_with('-') => format!("{mantissa}e+{power}"),
            _ => exp,
        };
    }
    if n == n.trunc() {
        return format!("{}", n as i128);
    }
    format!("{n}")
}

/// String conversion of a JSON value with browser semantics.
pub fn js_string(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => number_to_string(n),
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::Null => String::new(),
                other => js_string(other),
            })
            .collect::<Vec<_>>()
            .join(","),
        Value::Object(_) => "[object Object]".to_string(),
    }
}

fn number_to_string(n: &Number) -> String {
    if let Some(i) = n.as_i64() {
        return i.to_string();
    }
    if let Some(u) = n.as_u64() {
        return u.to_string();
    }
    n.as_f64().map(format_number).unwrap_or_default()
}

/// Truthiness with browser semantics.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Parse the longest numeric prefix of a string, like `parseFloat`.
/// Returns `None` where `parseFloat` would produce `NaN`.
pub fn parse_float_prefix(raw: &str) -> Option<f64> {
    let trimmed = raw.trim_start();
    let matched = FLOAT_PREFIX.find(trimmed)?.as_str();
    match matched {
        "Infinity" | "+Infinity" => Some(f64::INFINITY),
        "-Infinity" => Some(f64::NEG_INFINITY),
        number => number.parse::<f64>().ok(),
    }
}

/// Numeric reading of a value as `parseFloat(value)` would see it.
pub fn value_as_float(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => parse_float_prefix(s),
        _ => None,
    }
}

/// Read a numeric attribute written either as a JSON number or a numeric
/// string. Non-numeric values are treated as absent.
pub fn attr_number(attributes: &Attributes, key: &str) -> Option<f64> {
    match attributes.get(key)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                None
            } else {
                trimmed.parse::<f64>().ok().filter(|n| !n.is_nan())
            }
        }
        _ => None,
    }
}

/// True when `attributes[key] === true`.
pub fn attr_flag(attributes: &Attributes, key: &str) -> bool {
    attributes.get(key) == Some(&Value::Bool(true))
}

/// Non-empty string attribute.
pub fn attr_str<'a>(attributes: &'a Attributes, key: &str) -> Option<&'a str> {
    attributes
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
}

/// Build a JSON number from a float, keeping integral values as integers.
pub fn number_value(n: f64) -> Value {
    if n == n.trunc() && n.abs() < 9.007_199_254_740_992e15 {
        return Value::from(n as i64);
    }
    Number::from_f64(n).map_or(Value::Null, Value::Number)
}
