//! Data model for the Kiln form engine: definition trees, runtime state,
//! and the stable key scheme that ties repeated rows to flat state.

pub mod definition;
pub mod error;
pub mod node;
pub mod options;
pub mod stable_key;
pub mod state;
pub mod value;

pub use definition::{DefinitionData, FormDefinition, FormTemplate};
pub use error::{ModelError, Result};
pub use node::{FieldKind, FieldNode, ValueType, find_node};
pub use options::{DEFAULT_FIELD_LABEL, EngineOptions, FormMode, RenderMode};
pub use stable_key::{DecodedKey, StableKeyDecoder};
pub use state::{ActiveGroups, GroupShape, GroupSlot, GroupState, RuntimeState, classify_group};
pub use value::{Attributes, StateMap};
