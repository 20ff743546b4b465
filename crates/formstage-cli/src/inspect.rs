//! # Inspection Subcommands
//!
//! One-shot evaluation of a state file against a schema:
//!
//! ```bash
//! formstage visible  form.yaml --state state.json --stage 1
//! formstage validate form.yaml --state state.json --stage 0 --locale he
//! formstage payload  form.yaml --state state.json
//! ```
//!
//! `validate` and `payload` print the error map and exit with code 1 when
//! the scope is invalid.

use std::io::Write;

use anyhow::Result;
use clap::Args;
use formstage_core::StageScope;
use formstage_schema::{build_submission_payload, visible_fields, Locale, MessageCatalog, StageValidator};

use crate::input::{load_schema, load_state, scope, write_json, StateInput};

/// Arguments for the visible subcommand.
#[derive(Args, Debug)]
pub struct VisibleArgs {
    #[command(flatten)]
    pub input: StateInput,

    /// Stage index; omit for the whole form.
    #[arg(long)]
    pub stage: Option<usize>,
}

/// Arguments for the validate subcommand.
#[derive(Args, Debug)]
pub struct ValidateArgs {
    #[command(flatten)]
    pub input: StateInput,

    /// Stage index; omit for the whole form.
    #[arg(long)]
    pub stage: Option<usize>,

    /// Message language (en or he). Defaults to FORMSTAGE_LOCALE, then en.
    #[arg(long)]
    pub locale: Option<Locale>,
}

/// Arguments for the payload subcommand.
#[derive(Args, Debug)]
pub struct PayloadArgs {
    #[command(flatten)]
    pub input: StateInput,

    /// Message language for validation failures.
    #[arg(long)]
    pub locale: Option<Locale>,
}

/// Print the names of the visible fields in scope.
pub fn run_visible(args: &VisibleArgs, out: &mut dyn Write) -> Result<u8> {
    let schema = load_schema(&args.input.schema)?;
    let state = load_state(args.input.state.as_deref())?;
    let names: Vec<&str> = visible_fields(&schema, &state, scope(args.stage))
        .into_iter()
        .map(|f| f.name.as_str())
        .collect();
    write_json(out, &names)?;
    Ok(0)
}

/// Validate a scope; print the normalized state or the error map.
pub fn run_validate(args: &ValidateArgs, out: &mut dyn Write) -> Result<u8> {
    let schema = load_schema(&args.input.schema)?;
    let mut state = load_state(args.input.state.as_deref())?;
    let validator = StageValidator::new(catalog(args.locale)?);

    let errors = validator.validate(&schema, &mut state, scope(args.stage));
    if errors.is_empty() {
        write_json(out, &state)?;
        Ok(0)
    } else {
        write_json(out, &errors)?;
        Ok(1)
    }
}

/// Prune, validate the whole form, and print the submission payload.
pub fn run_payload(args: &PayloadArgs, out: &mut dyn Write) -> Result<u8> {
    let schema = load_schema(&args.input.schema)?;
    let mut state = load_state(args.input.state.as_deref())?;
    let validator = StageValidator::new(catalog(args.locale)?);

    let errors = validator.validate(&schema, &mut state, StageScope::Whole);
    if !errors.is_empty() {
        write_json(out, &errors)?;
        return Ok(1);
    }
    write_json(out, &build_submission_payload(&schema, &state))?;
    Ok(0)
}

fn catalog(locale: Option<Locale>) -> Result<MessageCatalog> {
    Ok(crate::input::session_config(locale, None)?.catalog())
}
