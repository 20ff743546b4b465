//! # Form Session — Stage Navigation State Machine
//!
//! Owns the mutable state of one form fill: field values, the errors of the
//! last validation pass, the current stage, and the furthest stage reached.
//!
//! ## Transitions
//!
//! ```text
//!            next (stage valid)            next (stage valid)
//!   Stage 0 ──────────────────▶ Stage 1 ──────────────────▶ ... ──▶ Stage N-1
//!      ▲          prev            │                                   │
//!      └──────────────────────────┘                                   │
//!      ▲                                                              │
//!      │   go_to(k), k <= furthest reached                            │
//!      │                                                              │
//!      └──────────── submit (transport accepted) / reset ◀────────────┘
//! ```
//!
//! `next` clamps at the last stage. `prev` is always allowed. `go_to`
//! never reaches past the high-water mark. `submit` may be called from any
//! stage; if a field on another stage is invalid the session jumps to the
//! earliest such stage.
//!
//! ## Mutation discipline
//!
//! Every accepted mutation prunes hidden values and then persists a draft.
//! Storage failures are logged and never abort the operation. A refused
//! transition leaves navigation where it was.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use formstage_core::{FieldValue, FormState, Schema, StageScope};
use formstage_schema::{
    apply_commits, build_submission_payload, prune_hidden, visible_fields, ErrorMap, Payload,
    StageValidator, StageVerdict,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::SessionConfig;
use crate::draft::{draft_key, DraftStore};
use crate::transport::{SubmissionTransport, TransportError};

// ─── Errors ──────────────────────────────────────────────────────────

/// A refused stage transition.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum NavigationError {
    /// Validation failed; the session is now on `stage` showing `errors`.
    #[error("stage {stage} has {} invalid field(s)", .errors.len())]
    Blocked {
        /// Stage holding the (earliest) invalid field.
        stage: usize,
        /// Failing fields and their messages.
        errors: ErrorMap,
    },

    /// The requested stage does not exist.
    #[error("stage {requested} does not exist (form has {stage_count} stage(s))")]
    OutOfRange { requested: usize, stage_count: usize },

    /// The requested stage has not been reached yet.
    #[error("stage {requested} has not been reached (furthest reached: {furthest})")]
    Locked { requested: usize, furthest: usize },
}

/// Errors returned by session operations.
#[derive(Error, Debug)]
pub enum SessionError {
    /// No field with this name exists in the schema.
    #[error("unknown field '{name}'")]
    UnknownField { name: String },

    /// The field is display-only and holds no value.
    #[error("field '{name}' is plain text and cannot hold a value")]
    NotInput { name: String },

    /// A navigation or submit transition was refused.
    #[error(transparent)]
    Navigation(#[from] NavigationError),

    /// The transport did not accept the payload; state is kept.
    #[error("submission failed: {0}")]
    Transport(#[from] TransportError),
}

// ─── Transition Log ──────────────────────────────────────────────────

/// Why the current stage changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionKind {
    Next,
    Previous,
    Jump,
    /// Submit moved to the earliest stage holding an invalid field.
    SubmitCorrection,
    /// Accepted submission returned the session to its start.
    Submitted,
    Reset,
}

/// Record of a stage transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageTransitionRecord {
    pub from: usize,
    pub to: usize,
    pub kind: TransitionKind,
    pub timestamp: DateTime<Utc>,
}

/// One line of the read-only recap shown on a summary stage.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryEntry {
    /// Stage the field belongs to.
    pub stage: usize,
    pub name: String,
    pub label: String,
    /// Stored value, if any.
    pub value: Option<FieldValue>,
    /// Value as shown: option label for choice fields, text otherwise.
    pub display: String,
}

// ─── Session ─────────────────────────────────────────────────────────

/// An in-progress fill of one form.
#[derive(Debug)]
pub struct FormSession<S: DraftStore> {
    schema: Arc<Schema>,
    store: S,
    key: String,
    validator: StageValidator,
    state: FormState,
    errors: ErrorMap,
    current: usize,
    furthest: usize,
    transitions: Vec<StageTransitionRecord>,
}

impl<S: DraftStore> FormSession<S> {
    /// Open a session, seeding state from the stored draft.
    ///
    /// A missing, unreadable, or malformed draft yields empty state. The
    /// seeded state is pruned and written back.
    pub fn open(schema: Arc<Schema>, store: S, config: &SessionConfig) -> Self {
        let key = draft_key(&schema);
        let state = match store.load(&key) {
            Ok(Some(snapshot)) => FormState::from_json(&snapshot).unwrap_or_else(|e| {
                tracing::warn!(%key, error = %e, "discarding malformed draft");
                FormState::new()
            }),
            Ok(None) => FormState::new(),
            Err(e) => {
                tracing::warn!(%key, error = %e, "draft could not be read");
                FormState::new()
            }
        };
        let mut session = Self {
            schema,
            store,
            key,
            validator: StageValidator::new(config.catalog()),
            state,
            errors: ErrorMap::new(),
            current: 0,
            furthest: 0,
            transitions: Vec::new(),
        };
        prune_hidden(&session.schema, &mut session.state);
        session.persist();
        tracing::info!(key = %session.key, values = session.state.len(), "form session opened");
        session
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn state(&self) -> &FormState {
        &self.state
    }

    /// Errors of the last validation pass, minus fields edited since.
    pub fn errors(&self) -> &ErrorMap {
        &self.errors
    }

    pub fn current_stage(&self) -> usize {
        self.current
    }

    /// High-water mark of stages reached since the last reset.
    pub fn furthest_stage(&self) -> usize {
        self.furthest
    }

    pub fn transitions(&self) -> &[StageTransitionRecord] {
        &self.transitions
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn draft_key(&self) -> &str {
        &self.key
    }

    /// Whether the session is on a summary stage.
    pub fn on_summary(&self) -> bool {
        self.schema.is_summary_stage(self.current)
    }

    /// The visible fields of the current stage.
    pub fn visible_field_names(&self) -> Vec<&str> {
        visible_fields(&self.schema, &self.state, StageScope::Stage(self.current))
            .into_iter()
            .map(|f| f.name.as_str())
            .collect()
    }

    // ── Mutation ─────────────────────────────────────────────────────

    /// Store a raw value for a field.
    ///
    /// Returns the names of fields whose values were pruned because this
    /// change hid them.
    pub fn set_value(
        &mut self,
        name: &str,
        value: impl Into<FieldValue>,
    ) -> Result<Vec<String>, SessionError> {
        self.require_input(name)?;
        self.state.insert(name, value);
        Ok(self.after_mutation(name))
    }

    /// Remove a field's value.
    pub fn clear_value(&mut self, name: &str) -> Result<Vec<String>, SessionError> {
        self.require_input(name)?;
        self.state.remove(name);
        Ok(self.after_mutation(name))
    }

    fn require_input(&self, name: &str) -> Result<(), SessionError> {
        match self.schema.field(name) {
            None => Err(SessionError::UnknownField { name: name.into() }),
            Some(f) if f.is_plain_text() => Err(SessionError::NotInput { name: name.into() }),
            Some(_) => Ok(()),
        }
    }

    fn after_mutation(&mut self, name: &str) -> Vec<String> {
        self.errors.remove(name);
        let pruned = prune_hidden(&self.schema, &mut self.state);
        for hidden in &pruned {
            self.errors.remove(hidden);
        }
        self.persist();
        pruned
    }

    // ── Navigation ───────────────────────────────────────────────────

    /// Validate the current stage and advance, clamped to the last stage.
    pub fn next(&mut self) -> Result<usize, NavigationError> {
        let errors = self.validator.validate(
            &self.schema,
            &mut self.state,
            StageScope::Stage(self.current),
        );
        if !errors.is_empty() {
            tracing::debug!(stage = self.current, invalid = errors.len(), "next refused");
            self.errors = errors.clone();
            return Err(NavigationError::Blocked {
                stage: self.current,
                errors,
            });
        }
        self.errors.clear();
        self.persist();
        let to = (self.current + 1).min(self.last_stage());
        self.do_transition(to, TransitionKind::Next);
        Ok(to)
    }

    /// Step back one stage. Always allowed.
    pub fn prev(&mut self) -> usize {
        let to = self.current.saturating_sub(1);
        self.errors.clear();
        self.do_transition(to, TransitionKind::Previous);
        to
    }

    /// Jump to a stage already reached.
    pub fn go_to(&mut self, stage: usize) -> Result<(), NavigationError> {
        let stage_count = self.schema.stage_count();
        if stage >= stage_count {
            return Err(NavigationError::OutOfRange {
                requested: stage,
                stage_count,
            });
        }
        if stage > self.furthest {
            return Err(NavigationError::Locked {
                requested: stage,
                furthest: self.furthest,
            });
        }
        self.errors.clear();
        self.do_transition(stage, TransitionKind::Jump);
        Ok(())
    }

    // ── Submission ───────────────────────────────────────────────────

    /// Validate and hand the payload to `transport`.
    ///
    /// The active stage is validated first, then the whole form. When a
    /// field on another stage fails, the session moves to the earliest
    /// stage holding an invalid field. A refused submit leaves every value
    /// as it was; normalized values are committed only once the whole form
    /// passes. On acceptance the draft is cleared and the session returns
    /// to its initial state.
    pub fn submit<T>(&mut self, transport: &mut T) -> Result<Payload, SessionError>
    where
        T: SubmissionTransport + ?Sized,
    {
        if let StageVerdict::Invalid(active) =
            self.validator
                .evaluate(&self.schema, &self.state, StageScope::Stage(self.current))
        {
            self.errors = active.clone();
            return Err(NavigationError::Blocked {
                stage: self.current,
                errors: active,
            }
            .into());
        }

        let commits = match self
            .validator
            .evaluate(&self.schema, &self.state, StageScope::Whole)
        {
            StageVerdict::Valid(commits) => commits,
            StageVerdict::Invalid(whole) => {
                let earliest = whole
                    .names()
                    .filter_map(|name| self.schema.stage_of(name))
                    .min()
                    .unwrap_or(self.current);
                if earliest != self.current {
                    self.do_transition(earliest, TransitionKind::SubmitCorrection);
                }
                self.errors = whole.clone();
                return Err(NavigationError::Blocked {
                    stage: earliest,
                    errors: whole,
                }
                .into());
            }
        };

        self.errors.clear();
        apply_commits(&mut self.state, commits);
        self.persist();
        let payload = build_submission_payload(&self.schema, &self.state);
        if let Err(e) = transport.submit(&payload) {
            tracing::warn!(key = %self.key, error = %e, "submission failed; keeping state");
            return Err(e.into());
        }

        tracing::info!(key = %self.key, fields = payload.len(), "form submitted");
        self.clear_draft();
        self.state.clear();
        self.furthest = 0;
        self.do_transition(0, TransitionKind::Submitted);
        Ok(payload)
    }

    /// Discard all values and navigation, and remove the draft.
    pub fn reset(&mut self) {
        self.state.clear();
        self.errors.clear();
        self.furthest = 0;
        self.clear_draft();
        self.do_transition(0, TransitionKind::Reset);
        tracing::info!(key = %self.key, "form reset");
    }

    // ── Summary ──────────────────────────────────────────────────────

    /// Read-only recap of every visible field, in form order.
    pub fn summary(&self) -> Vec<SummaryEntry> {
        visible_fields(&self.schema, &self.state, StageScope::Whole)
            .into_iter()
            .map(|field| {
                let value = self.state.get(&field.name).cloned();
                let display = match (&value, &field.options) {
                    (Some(v), Some(options)) if field.field_type.is_choice() => {
                        let text = v.to_text();
                        let text = text.trim();
                        options
                            .iter()
                            .find(|o| o.value_text() == text)
                            .map_or_else(|| text.to_string(), |o| o.label_text())
                    }
                    (Some(v), _) => v.to_text(),
                    (None, _) => String::new(),
                };
                SummaryEntry {
                    stage: self.schema.stage_of(&field.name).unwrap_or(0),
                    name: field.name.clone(),
                    label: field.display_label().to_string(),
                    value,
                    display,
                }
            })
            .collect()
    }

    // ── Internals ────────────────────────────────────────────────────

    fn last_stage(&self) -> usize {
        self.schema.stage_count().saturating_sub(1)
    }

    fn do_transition(&mut self, to: usize, kind: TransitionKind) {
        tracing::info!(from = self.current, to, ?kind, "stage transition");
        self.transitions.push(StageTransitionRecord {
            from: self.current,
            to,
            kind,
            timestamp: Utc::now(),
        });
        self.current = to;
        self.furthest = self.furthest.max(to);
    }

    fn persist(&mut self) {
        let snapshot = match self.state.to_json() {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!(key = %self.key, error = %e, "draft could not be encoded");
                return;
            }
        };
        if let Err(e) = self.store.save(&self.key, &snapshot) {
            tracing::warn!(key = %self.key, error = %e, "draft could not be saved");
        }
    }

    fn clear_draft(&mut self) {
        if let Err(e) = self.store.clear(&self.key) {
            tracing::warn!(key = %self.key, error = %e, "draft could not be cleared");
        }
    }
}
