//! # Stage Validator
//!
//! Validates the visible fields of one stage, or of the whole form, in a
//! single pass:
//!
//! ```text
//! prune hidden ──▶ visible fields ──▶ snapshots ──▶ rules ──▶ commit | error map
//! ```
//!
//! Fields validate in isolation. If every rule passes, normalized values
//! are committed back into state (checkboxes as booleans, numbers as
//! numbers, text trimmed, empty optional values deleted). If any rule
//! fails, state is left untouched and the error map carries one message
//! per failing field.

use std::collections::BTreeMap;

use formstage_core::{ErrorKind, FormState, Schema, StageScope};
use serde::{Serialize, Serializer};

use crate::messages::MessageCatalog;
use crate::rules::{build_rule, Normalized};
use crate::visibility::{prune_hidden, visible_fields};

// ─── Error Map ───────────────────────────────────────────────────────

/// One field's reported failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    /// What went wrong.
    pub kind: ErrorKind,
    /// Resolved human-readable message.
    pub message: String,
}

/// Field name → first failing rule's message. Empty means valid.
///
/// Serializes as a plain `{name: message}` object.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorMap(BTreeMap<String, FieldError>);

impl ErrorMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// The error reported for a field.
    pub fn get(&self, name: &str) -> Option<&FieldError> {
        self.0.get(name)
    }

    /// The message reported for a field.
    pub fn message(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(|e| e.message.as_str())
    }

    /// The kind reported for a field.
    pub fn kind(&self, name: &str) -> Option<ErrorKind> {
        self.0.get(name).map(|e| e.kind)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn insert(&mut self, name: impl Into<String>, error: FieldError) -> Option<FieldError> {
        self.0.insert(name.into(), error)
    }

    pub fn remove(&mut self, name: &str) -> Option<FieldError> {
        self.0.remove(name)
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    /// Names of failing fields in name order.
    pub fn names(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &FieldError)> {
        self.0.iter()
    }

    /// Plain `{name: message}` view.
    pub fn messages(&self) -> BTreeMap<String, String> {
        self.0
            .iter()
            .map(|(k, v)| (k.clone(), v.message.clone()))
            .collect()
    }
}

impl Serialize for ErrorMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.0.iter().map(|(k, v)| (k, &v.message)))
    }
}

// ─── Verdict ─────────────────────────────────────────────────────────

/// A normalized value to write back, or a key to delete.
#[derive(Debug, Clone, PartialEq)]
pub struct Commit {
    pub name: String,
    pub value: Normalized,
}

/// Result of evaluating a scope without touching state.
#[derive(Debug, Clone, PartialEq)]
pub enum StageVerdict {
    /// Every rule passed; these writes normalize state.
    Valid(Vec<Commit>),
    /// At least one rule failed.
    Invalid(ErrorMap),
}

impl StageVerdict {
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid(_))
    }
}

// ─── Validator ───────────────────────────────────────────────────────

/// Runs field rules over a scope and resolves failure messages.
#[derive(Debug, Clone, Default)]
pub struct StageValidator {
    catalog: MessageCatalog,
}

impl StageValidator {
    /// A validator using the given default messages.
    pub fn new(catalog: MessageCatalog) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &MessageCatalog {
        &self.catalog
    }

    /// Evaluate the visible fields of `scope` against `state`.
    ///
    /// Pure: state is only read. Hidden fields are ignored even if stale
    /// values for them remain in state.
    pub fn evaluate(&self, schema: &Schema, state: &FormState, scope: StageScope) -> StageVerdict {
        let fields = visible_fields(schema, state, scope);
        if fields.is_empty() {
            return StageVerdict::Valid(Vec::new());
        }

        let mut commits = Vec::with_capacity(fields.len());
        let mut errors = ErrorMap::new();
        for field in fields {
            let rule = build_rule(field);
            let snapshot = rule.snapshot(state.get(&field.name));
            match rule.apply(&snapshot) {
                Ok(value) => commits.push(Commit {
                    name: field.name.clone(),
                    value,
                }),
                Err(failure) => {
                    let message = self
                        .catalog
                        .resolve(field, failure.kind, failure.bound.as_deref());
                    errors.insert(
                        field.name.clone(),
                        FieldError {
                            kind: failure.kind,
                            message,
                        },
                    );
                }
            }
        }

        if errors.is_empty() {
            StageVerdict::Valid(commits)
        } else {
            StageVerdict::Invalid(errors)
        }
    }

    /// Prune, evaluate, and commit on success.
    ///
    /// Returns an empty map when `scope` is valid. On failure state keeps
    /// every value it had after pruning.
    pub fn validate(&self, schema: &Schema, state: &mut FormState, scope: StageScope) -> ErrorMap {
        prune_hidden(schema, state);
        match self.evaluate(schema, state, scope) {
            StageVerdict::Valid(commits) => {
                apply_commits(state, commits);
                ErrorMap::new()
            }
            StageVerdict::Invalid(errors) => {
                tracing::debug!(%scope, invalid = errors.len(), "validation failed");
                errors
            }
        }
    }
}

/// Write normalized values back into state.
pub fn apply_commits(state: &mut FormState, commits: Vec<Commit>) {
    for commit in commits {
        match commit.value {
            Normalized::Value(v) => {
                state.insert(commit.name, v);
            }
            Normalized::Absent => {
                state.remove(&commit.name);
            }
        }
    }
}

/// Validate `scope` with the default English catalogue.
pub fn validate_stage(schema: &Schema, state: &mut FormState, scope: StageScope) -> ErrorMap {
    StageValidator::default().validate(schema, state, scope)
}
