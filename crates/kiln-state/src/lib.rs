//! Reconciles flat form state with the tree of repeatable containers.
//!
//! [`rows`] rebuilds ordered row objects for one container instance and is
//! shared by validation and saving. [`normalize`] applies it across a whole
//! definition tree.

pub mod normalize;
pub mod rows;

pub use normalize::{normalize_group_state_tree, normalize_in_place};
pub use rows::{ContainerRow, RowSource, expand_nested_rows, expand_rows};
