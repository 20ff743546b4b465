//! # formstage-schema — Schema Interpretation & Validation
//!
//! Everything that reads a [`Schema`](formstage_core::Schema) and a
//! [`FormState`](formstage_core::FormState) and decides something about
//! them. No module here holds navigation state or performs IO other than
//! reading schema files.
//!
//! ## Loading (`loader`, `lint`)
//!
//! [`SchemaLoader`] parses JSON or YAML, checks the document against the
//! embedded structural schema, builds the indexed schema, and rejects it
//! if [`lint_schema`] reports errors such as a `showIf` cycle.
//!
//! ## Evaluation pipeline
//!
//! ```text
//! visibility ──▶ rules ──▶ validator ──▶ payload
//!    │             │           │
//!  prune      per-field    error map /
//!  hidden      checks      normalized commit
//! ```
//!
//! - [`visibility`]: which fields are relevant now; pruning of stale values.
//! - [`rules`]: one ordered rule per field type, first failure wins.
//! - [`messages`]: default messages per error kind, English and Hebrew.
//! - [`validator`]: validates a stage or the whole form and commits
//!   normalized values on success.
//! - [`payload`]: the submission body, visible fields only.
//!
//! ## Crate Policy
//!
//! - Depends only on `formstage-core` internally.
//! - Validation failures are values ([`ErrorMap`]), never `Err`.
//! - Hidden fields are never validated and never submitted.

pub mod lint;
pub mod loader;
pub mod messages;
pub mod payload;
pub mod rules;
pub mod validator;
pub mod visibility;

pub use lint::{has_errors, lint_schema, LintFinding, LintSeverity};
pub use loader::{
    parse_document, read_document, DocumentFormat, SchemaLoadError, SchemaLoader, ValidationViolations,
    Violation,
};
pub use messages::{Locale, MessageCatalog};
pub use payload::{build_submission_payload, Payload};
pub use rules::{build_rule, FieldRule, Normalized, RuleFailure};
pub use validator::{
    apply_commits, validate_stage, Commit, ErrorMap, FieldError, StageValidator, StageVerdict,
};
pub use visibility::{evaluate_condition, prune_hidden, should_display, visible_fields};
