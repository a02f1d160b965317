//! Field and form validation for Kiln.
//!
//! - [`mask`] compiles regex, character-class and formatting masks.
//! - [`rules`] derives a rule set from node attributes.
//! - [`value`] validates one value against a rule set.
//! - [`visibility`] decides which fields are shown and saved, using the
//!   restricted predicate language in [`expr`].
//! - [`form`] validates every visible field of a form.

pub mod expr;
pub mod form;
pub mod issue;
pub mod mask;
pub mod rules;
pub mod value;
pub mod visibility;

pub use expr::{Expr, ExprError, evaluate_expression};
pub use form::{FormValidation, validate_all_fields};
pub use issue::{ErrorKind, FieldError, Violation};
pub use mask::{CompiledMask, MaskError, MaskKind, compile_mask, compile_mask_to_regex};
pub use rules::{CustomValidator, ValidationRules, rules_from_attributes};
pub use value::{ValidateOptions, ValueVerdict, is_empty_value, validate_value};
pub use visibility::{baseline_visibility, is_field_visible, should_field_be_included_for_saving};
