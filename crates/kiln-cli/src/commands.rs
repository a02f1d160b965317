//! Subcommand implementations. Each reads its inputs, runs one engine pass
//! and returns the result for the caller to print.

use std::path::Path;

use anyhow::{Context, Result};
use kiln_bind::{BoundForm, apply_form_mode, bind_data_to_form};
use kiln_model::value::js_string;
use kiln_model::{EngineOptions, FieldNode, FormDefinition, FormMode, RuntimeState};
use kiln_save::{SaveDataBuilder, SavedData};
use kiln_state::normalize_in_place;
use kiln_validate::{FormValidation, validate_all_fields};
use tracing::{info, info_span, trace, warn};

use crate::io::{load_definition, load_object, load_state};
use crate::logging::redact_value;

/// Outcome of `save`: the validation verdict when one was run, and the
/// payload unless validation blocked it.
#[derive(Debug, Clone)]
pub struct SaveOutcome {
    pub validation: Option<FormValidation>,
    pub payload: Option<SavedData>,
}

pub fn run_bind(definition: &Path, data: &Path, mode: FormMode) -> Result<BoundForm> {
    let span = info_span!("bind", mode = %mode);
    let _guard = span.enter();

    let template = load_definition(definition)?;
    let data = load_object(data)?;
    let mut bound = bind_data_to_form(&data, &template);
    let marked = apply_form_mode(&mut bound.definition, mode);
    for (key, value) in &bound.debug {
        trace!(key = %key, value = redact_value(&js_string(value)), "bound value");
    }
    info!(bound = bound.debug.len(), marked, "bound data to definition");
    Ok(bound)
}

pub fn run_normalize(definition: &Path, state: &Path) -> Result<RuntimeState> {
    let span = info_span!("normalize");
    let _guard = span.enter();

    let (definition, mut state) = load_inputs(definition, state)?;
    normalize_in_place(root_items(&definition)?, &mut state);
    info!(containers = state.group_state.len(), "normalized group state");
    Ok(state)
}

pub fn run_validate(
    definition: &Path,
    state: &Path,
    options: &EngineOptions,
) -> Result<FormValidation> {
    let span = info_span!("validate");
    let _guard = span.enter();

    let (definition, mut state) = load_inputs(definition, state)?;
    let items = root_items(&definition)?;
    normalize_in_place(items, &mut state);
    Ok(validate_all_fields(items, &state, options))
}

/// Normalize, optionally validate, then build the save payload.
pub fn run_save(
    definition: &Path,
    state: &Path,
    metadata: Option<&Path>,
    options: &EngineOptions,
    validate: bool,
) -> Result<SaveOutcome> {
    let span = info_span!("save");
    let _guard = span.enter();

    let (definition, mut state) = load_inputs(definition, state)?;
    let metadata = metadata.map(load_object).transpose()?.unwrap_or_default();
    let items = root_items(&definition)?;
    normalize_in_place(items, &mut state);

    let validation = validate.then(|| validate_all_fields(items, &state, options));
    if let Some(result) = validation.as_ref().filter(|result| !result.is_valid) {
        warn!(errors = result.error_count(), "validation failed, payload not built");
        return Ok(SaveOutcome {
            validation,
            payload: None,
        });
    }

    let payload = SaveDataBuilder::new(&definition)
        .with_metadata(metadata)
        .with_options(options.clone())
        .build(items, &state)
        .context("build save payload")?;
    Ok(SaveOutcome {
        validation,
        payload: Some(payload),
    })
}

fn load_inputs(definition: &Path, state: &Path) -> Result<(FormDefinition, RuntimeState)> {
    Ok((load_definition(definition)?, load_state(state)?))
}

fn root_items(definition: &FormDefinition) -> Result<&[FieldNode]> {
    definition
        .items()
        .context("form definition has neither data.items nor elements")
}
