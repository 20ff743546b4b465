//! # formstage-cli — Form Schema Command-Line Interface
//!
//! Exercises the validation engine from the shell: author-time schema
//! checks, one-shot evaluation of a state file, and scripted replays of a
//! full multi-stage session.
//!
//! ## Subcommands
//!
//! - `lint` — Schema authoring findings
//! - `visible` — Visible fields of a stage or the whole form
//! - `validate` — Stage or whole-form validation
//! - `payload` — Submission payload preview
//! - `replay` — Drive a form session from a JSON-lines event script
//!
//! ## Crate Policy
//!
//! - Argument parsing is separated from behaviour; every handler is a
//!   `run_*` function returning an exit code.
//! - Handlers write to a caller-supplied writer so they can be tested
//!   without capturing stdout.
//! - No validation logic lives here.

pub mod input;
pub mod inspect;
pub mod lint;
pub mod replay;
