//! Save payloads for Kiln forms.
//!
//! [`SaveDataBuilder`] walks the definition tree against runtime state and
//! produces the `{data, form_definition, metadata}` payload a transport
//! persists.

pub mod builder;
pub mod error;

pub use builder::{SaveDataBuilder, SavedData, create_saved_data};
pub use error::{Result, SaveError};
