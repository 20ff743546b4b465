//! # Visibility Evaluator
//!
//! Decides which fields are currently relevant. A field is visible when it
//! is not plain text and its `showIf` condition (if any) holds. This is the
//! single source of truth for both "what must be validated" and "what gets
//! submitted".
//!
//! ## Pruning
//!
//! Whenever state changes, values of fields that are now hidden are
//! deleted so they never reach validation, drafts, or payloads. Pruning
//! runs to a fixpoint: removing a governing field's value can hide fields
//! gated on it, regardless of their order in the schema.

use formstage_core::{Field, FormState, Schema, ShowIf, StageScope};

/// Strict equality between the governing field's stored value and the
/// expected value. An absent value never matches.
pub fn evaluate_condition(condition: &ShowIf, state: &FormState) -> bool {
    state.get(&condition.field) == Some(&condition.equals)
}

/// Whether a field's `showIf` condition holds (true when it has none).
pub fn should_display(field: &Field, state: &FormState) -> bool {
    field
        .show_if
        .as_ref()
        .map_or(true, |cond| evaluate_condition(cond, state))
}

/// The visible, stateful fields of `scope`, in form order.
pub fn visible_fields<'s>(schema: &'s Schema, state: &FormState, scope: StageScope) -> Vec<&'s Field> {
    schema
        .fields_in(scope)
        .iter()
        .filter(|f| !f.is_plain_text())
        .filter(|f| should_display(f, state))
        .collect()
}

/// Delete stored values of hidden fields until none remain.
///
/// Returns the removed field names in removal order. Calling it again on
/// the result removes nothing.
pub fn prune_hidden(schema: &Schema, state: &mut FormState) -> Vec<String> {
    let mut removed = Vec::new();
    loop {
        let hidden: Vec<String> = schema
            .fields()
            .iter()
            .filter(|f| !f.is_plain_text())
            .filter(|f| state.contains(&f.name) && !should_display(f, state))
            .map(|f| f.name.clone())
            .collect();
        if hidden.is_empty() {
            break;
        }
        for name in hidden {
            tracing::debug!(field = %name, "pruning hidden field value");
            state.remove(&name);
            removed.push(name);
        }
    }
    removed
}
