//! JSON input and output for the CLI.

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use anyhow::{Context, Result, bail};
use kiln_model::{FormDefinition, RuntimeState, StateMap};
use serde::Serialize;
use serde_json::Value;

pub fn load_definition(path: &Path) -> Result<FormDefinition> {
    let raw = read(path)?;
    FormDefinition::from_json_str(&raw)
        .with_context(|| format!("parse form definition {}", path.display()))
}

pub fn load_state(path: &Path) -> Result<RuntimeState> {
    let raw = read(path)?;
    RuntimeState::from_json_str(&raw)
        .with_context(|| format!("parse runtime state {}", path.display()))
}

/// Read a JSON file that must hold an object.
pub fn load_object(path: &Path) -> Result<StateMap> {
    let raw = read(path)?;
    let value: Value =
        serde_json::from_str(&raw).with_context(|| format!("parse {}", path.display()))?;
    match value {
        Value::Object(map) => Ok(map),
        other => bail!(
            "{} must contain a JSON object, found {}",
            path.display(),
            kind_name(&other)
        ),
    }
}

/// Pretty-print `value` to `output`, or to stdout when no path is given.
pub fn write_json<T: Serialize>(output: Option<&Path>, value: &T) -> Result<()> {
    let mut rendered = serde_json::to_string_pretty(value).context("serialize output")?;
    rendered.push('\n');
    match output {
        Some(path) => {
            fs::write(path, rendered).with_context(|| format!("write {}", path.display()))
        }
        None => io::stdout()
            .lock()
            .write_all(rendered.as_bytes())
            .context("write stdout"),
    }
}

fn read(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("read {}", path.display()))
}

fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
