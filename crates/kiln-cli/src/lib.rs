//! CLI library components for the Kiln form engine.

pub mod commands;
pub mod io;
pub mod logging;
