//! Field visibility and save inclusion.

use kiln_model::{FieldNode, RenderMode, StateMap};
use tracing::debug;

use crate::expr::Expr;

/// Visibility from `visible_web` / `visible_pdf` alone.
pub fn baseline_visibility(item: &FieldNode, mode: RenderMode) -> bool {
    let flag = match mode {
        RenderMode::Web => item.visible_web,
        RenderMode::Pdf => item.visible_pdf,
    };
    flag != Some(false)
}

/// Whether a field is shown, given the state its predicate should see (the
/// row for fields inside a repeatable container, else the form state).
///
/// A `custom_visibility` predicate overrides the baseline. Predicates that
/// fail to parse fall back to the baseline.
pub fn is_field_visible(item: &FieldNode, mode: RenderMode, state: &StateMap) -> bool {
    let baseline = baseline_visibility(item, mode);
    let Some(source) = item
        .custom_visibility
        .as_deref()
        .filter(|source| !source.trim().is_empty())
    else {
        return baseline;
    };
    match Expr::parse(source) {
        Ok(expr) => expr.evaluate(state),
        Err(err) => {
            debug!(
                field = %item.uuid,
                expression = source,
                error = %err,
                "visibility predicate rejected, using baseline"
            );
            baseline
        }
    }
}

/// Visible fields are saved, and so are hidden ones marked `save_on_submit`.
pub fn should_field_be_included_for_saving(
    item: &FieldNode,
    mode: RenderMode,
    state: &StateMap,
) -> bool {
    is_field_visible(item, mode, state) || item.save_on_submit == Some(true)
}
