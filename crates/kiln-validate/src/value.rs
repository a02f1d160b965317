//! Single-value validation.

use std::sync::LazyLock;

use kiln_model::value::{js_string, value_as_float};
use kiln_model::{DEFAULT_FIELD_LABEL, ValueType};
use regex::Regex;
use serde::Serialize;
use serde_json::Value;

use crate::issue::{ErrorKind, FieldError, Violation};
use crate::rules::ValidationRules;

static EMAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("Invalid email regex"));

/// Tolerance when checking step alignment.
const STEP_EPSILON: f64 = 1e-9;

/// Type and label context for one validation call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidateOptions<'a> {
    pub value_type: ValueType,
    pub label: &'a str,
}

impl Default for ValidateOptions<'_> {
    fn default() -> Self {
        Self {
            value_type: ValueType::String,
            label: DEFAULT_FIELD_LABEL,
        }
    }
}

impl<'a> ValidateOptions<'a> {
    pub fn new(value_type: ValueType, label: &'a str) -> Self {
        Self { value_type, label }
    }
}

/// Outcome of validating one value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValueVerdict {
    pub valid: bool,
    pub errors: Vec<FieldError>,
    pub first_error: Option<String>,
}

impl ValueVerdict {
    fn from_errors(errors: Vec<FieldError>) -> Self {
        Self {
            valid: errors.is_empty(),
            first_error: errors.first().map(|error| error.message.clone()),
            errors,
        }
    }

    pub fn messages(&self) -> impl Iterator<Item = &str> {
        self.errors.iter().map(|error| error.message.as_str())
    }
}

/// Type-aware emptiness.
pub fn is_empty_value(value: Option<&Value>, value_type: ValueType) -> bool {
    let Some(value) = value else {
        return true;
    };
    match (value_type, value) {
        (_, Value::Null) => true,
        (ValueType::Boolean, Value::Bool(false)) => true,
        (ValueType::Boolean, _) => false,
        (ValueType::Number | ValueType::Date, Value::String(s)) => s.is_empty(),
        (ValueType::Number | ValueType::Date, _) => false,
        (ValueType::String, other) => js_string(other).trim().is_empty(),
    }
}

/// Validate one value against a rule set, collecting every violation.
pub fn validate_value(
    value: Option<&Value>,
    rules: &ValidationRules,
    options: ValidateOptions<'_>,
) -> ValueVerdict {
    let label = options.label;

    if is_empty_value(value, options.value_type) {
        if rules.required {
            return ValueVerdict::from_errors(vec![render(&Violation::Required, label)]);
        }
        return ValueVerdict::from_errors(Vec::new());
    }
    let Some(value) = value else {
        return ValueVerdict::from_errors(Vec::new());
    };

    let mut violations = Vec::new();
    if options.value_type == ValueType::Number {
        check_number(value, rules, &mut violations);
    }

    let text = js_string(value);
    check_text(&text, rules, &mut violations);

    let mut errors: Vec<FieldError> = violations
        .iter()
        .map(|violation| render(violation, label))
        .collect();
    for validator in &rules.custom {
        if let Some(message) = validator(value).filter(|message| !message.is_empty()) {
            errors.push(FieldError::new(ErrorKind::Custom, message));
        }
    }
    ValueVerdict::from_errors(errors)
}

fn render(violation: &Violation, label: &str) -> FieldError {
    FieldError::new(violation.kind(), violation.message(label))
}

fn check_number(value: &Value, rules: &ValidationRules, out: &mut Vec<Violation>) {
    let Some(n) = value_as_float(value).filter(|n| !n.is_nan()) else {
        out.push(Violation::TypeNumber);
        return;
    };

    if rules.is_integer && (!n.is_finite() || n.fract() != 0.0) {
        out.push(Violation::TypeInteger);
    }

    let below = rules.min.is_some_and(|min| n < min);
    let above = rules.max.is_some_and(|max| n > max);
    match (rules.min, rules.max) {
        (Some(min), Some(max)) if below || above => out.push(Violation::Range { min, max }),
        (Some(min), _) if below => out.push(Violation::Min { min }),
        (_, Some(max)) if above => out.push(Violation::Max { max }),
        _ => {}
    }

    // A non-positive step never constrains.
    if let Some(step) = rules.step.filter(|step| *step > 0.0) {
        let base = rules.min.unwrap_or(0.0);
        let quotient = (n - base) / step;
        let aligned = (quotient - quotient.round()).abs() < STEP_EPSILON;
        if !aligned {
            out.push(Violation::Step {
                step,
                base: rules.min,
            });
        }
    }
}

fn check_text(text: &str, rules: &ValidationRules, out: &mut Vec<Violation>) {
    let length = text.chars().count() as f64;
    if let Some(expected) = rules.length
        && length != expected
    {
        out.push(Violation::LengthExact { length: expected });
    }
    if let Some(min_length) = rules.min_length
        && length < min_length
    {
        out.push(Violation::MinLength { min_length });
    }
    if let Some(max_length) = rules.max_length
        && length > max_length
    {
        out.push(Violation::MaxLength { max_length });
    }
    if let Some(pattern) = &rules.pattern
        && !pattern.is_match(text)
    {
        out.push(Violation::Pattern {
            mask: pattern.display_mask().map(str::to_string),
        });
    }
    if rules.is_email && !EMAIL.is_match(text) {
        out.push(Violation::Email);
    }
    if rules.is_url && url::Url::parse(text).is_err() {
        out.push(Violation::Url);
    }
    if rules.ten_digit_phone && text.chars().filter(char::is_ascii_digit).count() != 10 {
        out.push(Violation::TenDigitPhone);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mask::compile_mask;
    use serde_json::json;

    fn number(label: &str) -> ValidateOptions<'_> {
        ValidateOptions::new(ValueType::Number, label)
    }

    #[test]
    fn required_short_circuits() {
        let rules = ValidationRules::new().required();
        let verdict = validate_value(None, &rules, ValidateOptions::new(ValueType::String, "Name"));
        assert!(!verdict.valid);
        assert_eq!(verdict.errors.len(), 1);
        assert_eq!(verdict.first_error.as_deref(), Some("Name is required."));
    }

    #[test]
    fn whitespace_is_empty_for_strings_only() {
        assert!(is_empty_value(Some(&json!("  ")), ValueType::String));
        assert!(!is_empty_value(Some(&json!("  ")), ValueType::Number));
        assert!(is_empty_value(Some(&json!(false)), ValueType::Boolean));
        assert!(!is_empty_value(Some(&json!(false)), ValueType::String));
        assert!(is_empty_value(Some(&Value::Null), ValueType::Date));
    }

    #[test]
    fn optional_empty_values_skip_every_check() {
        let rules = ValidationRules::new().with_custom(|_| Some("never".to_string()));
        let verdict = validate_value(Some(&json!("")), &rules, ValidateOptions::default());
        assert!(verdict.valid);
        assert!(verdict.first_error.is_none());
    }

    #[test]
    fn non_numeric_input_reports_type() {
        let verdict = validate_value(Some(&json!("abc")), &ValidationRules::new(), number("Age"));
        assert_eq!(verdict.first_error.as_deref(), Some("Age must be a number."));
        let verdict = validate_value(Some(&json!("12abc")), &ValidationRules::new(), number("Age"));
        assert!(verdict.valid);
    }

    #[test]
    fn range_message_wins_when_both_bounds_are_set() {
        let rules = ValidationRules::new().with_range(Some(1.0), Some(10.0));
        let verdict = validate_value(Some(&json!(0)), &rules, number("Age"));
        assert_eq!(verdict.first_error.as_deref(), Some("Age must be between 1 and 10."));
        let verdict = validate_value(Some(&json!("11")), &rules, number("Age"));
        assert_eq!(verdict.errors.len(), 1);

        let only_min = ValidationRules::new().with_range(Some(1.0), None);
        let verdict = validate_value(Some(&json!(0)), &only_min, number("Age"));
        assert_eq!(verdict.first_error.as_deref(), Some("Age must be at least 1."));

        let only_max = ValidationRules::new().with_range(None, Some(3.0));
        let verdict = validate_value(Some(&json!(4)), &only_max, number("Age"));
        assert_eq!(verdict.first_error.as_deref(), Some("Age must be at most 3."));
    }

    #[test]
    fn integer_then_range_then_step() {
        let mut rules = ValidationRules::new()
            .with_range(Some(0.0), Some(1.0))
            .with_step(0.25);
        rules.is_integer = true;
        let verdict = validate_value(Some(&json!(1.3)), &rules, number("Qty"));
        let kinds: Vec<ErrorKind> = verdict.errors.iter().map(|e| e.kind).collect();
        assert_eq!(
            kinds,
            vec![ErrorKind::TypeInteger, ErrorKind::Range, ErrorKind::Step]
        );
        assert_eq!(
            verdict.errors[2].message,
            "Qty must align to steps of 0.25 starting at 0."
        );
    }

    #[test]
    fn step_is_relative_to_min_with_tolerance() {
        let rules = ValidationRules::new()
            .with_range(Some(0.1), None)
            .with_step(0.2);
        assert!(validate_value(Some(&json!(0.7)), &rules, number("X")).valid);
        assert!(!validate_value(Some(&json!(0.8)), &rules, number("X")).valid);

        let no_min = ValidationRules::new().with_step(5.0);
        let verdict = validate_value(Some(&json!(7)), &no_min, number("X"));
        assert_eq!(verdict.first_error.as_deref(), Some("X must align to steps of 5."));

        let zero_step = ValidationRules::new().with_step(0.0);
        assert!(validate_value(Some(&json!(7)), &zero_step, number("X")).valid);
    }

    #[test]
    fn length_checks_count_characters() {
        let rules = ValidationRules {
            length: Some(3.0),
            ..ValidationRules::default()
        };
        assert!(validate_value(Some(&json!("héé")), &rules, ValidateOptions::default()).valid);
        let verdict = validate_value(Some(&json!("ab")), &rules, ValidateOptions::default());
        assert_eq!(
            verdict.first_error.as_deref(),
            Some("This field must be exactly 3 characters.")
        );

        let bounds = ValidationRules {
            min_length: Some(2.0),
            max_length: Some(4.0),
            ..ValidationRules::default()
        };
        let verdict = validate_value(Some(&json!("abcde")), &bounds, ValidateOptions::default());
        assert_eq!(
            verdict.first_error.as_deref(),
            Some("This field must be at most 4 characters.")
        );
    }

    #[test]
    fn pattern_message_names_formatting_masks() {
        let rules = ValidationRules::new().with_pattern(compile_mask("###-###-####").expect("mask"));
        let options = ValidateOptions::new(ValueType::String, "Phone");
        assert!(validate_value(Some(&json!("123-456-7890")), &rules, options).valid);
        let verdict = validate_value(Some(&json!("abc-456-7890")), &rules, options);
        assert_eq!(
            verdict.first_error.as_deref(),
            Some("Phone doesn't match the required format of ###-###-####.")
        );

        let regex = ValidationRules::new().with_pattern(compile_mask("^[A-Z]+$").expect("mask"));
        let verdict = validate_value(Some(&json!("abc")), &regex, options);
        assert_eq!(
            verdict.first_error.as_deref(),
            Some("Phone doesn't match the required format.")
        );
    }

    #[test]
    fn email_url_and_phone() {
        let options = ValidateOptions::new(ValueType::String, "Contact");
        let email = ValidationRules {
            is_email: true,
            ..ValidationRules::default()
        };
        assert!(validate_value(Some(&json!("a@b.ca")), &email, options).valid);
        assert!(!validate_value(Some(&json!("a@b")), &email, options).valid);

        let url = ValidationRules {
            is_url: true,
            ..ValidationRules::default()
        };
        assert!(validate_value(Some(&json!("https://gov.bc.ca/x")), &url, options).valid);
        let verdict = validate_value(Some(&json!("gov.bc.ca")), &url, options);
        assert_eq!(verdict.first_error.as_deref(), Some("Contact must be a valid URL."));

        let phone = ValidationRules {
            ten_digit_phone: true,
            ..ValidationRules::default()
        };
        assert!(validate_value(Some(&json!("(250) 555-1234")), &phone, options).valid);
        let verdict = validate_value(Some(&json!("555-1234")), &phone, options);
        assert_eq!(verdict.first_error.as_deref(), Some("Contact must have 10 digits."));
    }

    #[test]
    fn custom_validators_run_last_in_order() {
        let rules = ValidationRules {
            min_length: Some(5.0),
            ..ValidationRules::default()
        }
        .with_custom(|value| (value == "bad").then(|| "Value is bad.".to_string()))
        .with_custom(|_| Some("Always.".to_string()));
        let verdict = validate_value(Some(&json!("bad")), &rules, ValidateOptions::default());
        let messages: Vec<&str> = verdict.messages().collect();
        assert_eq!(
            messages,
            vec![
                "This field must be at least 5 characters.",
                "Value is bad.",
                "Always."
            ]
        );
        assert_eq!(verdict.errors[1].kind, ErrorKind::Custom);
    }

    #[test]
    fn booleans_stringify_for_text_checks() {
        let rules = ValidationRules {
            length: Some(4.0),
            ..ValidationRules::default()
        };
        let options = ValidateOptions::new(ValueType::Boolean, "Agree");
        assert!(validate_value(Some(&json!(true)), &rules, options).valid);
    }
}
