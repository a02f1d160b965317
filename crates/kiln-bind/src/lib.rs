//! Data binding for Kiln form definitions.
//!
//! [`bind_data_to_form`] injects an external data map into a copy of a
//! definition, coercing each value for its field kind. [`apply_form_mode`]
//! marks a bound tree read-only for display modes, and
//! [`publish_bound_values`] seeds runtime state from it.

pub mod binder;
pub mod coerce;
pub mod mode;
pub mod publish;

pub use binder::{BoundForm, bind_data_to_form};
pub use coerce::{coerce_bool, coerce_date, coerce_number, coerce_value};
pub use mode::{apply_form_mode, mark_read_only};
pub use publish::publish_bound_values;
