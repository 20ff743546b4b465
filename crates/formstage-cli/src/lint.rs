//! # Lint Subcommand
//!
//! Reports authoring findings for a schema without rejecting it, so every
//! problem is visible at once.
//!
//! ```bash
//! formstage lint forms/employment-application.yaml
//! ```

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use formstage_schema::{has_errors, lint_schema, read_document, SchemaLoader};

/// Arguments for the lint subcommand.
#[derive(Args, Debug)]
pub struct LintArgs {
    /// Path to the form schema.
    pub schema: PathBuf,
}

/// Execute the lint subcommand. Exit code 1 when any finding is an error.
pub fn run_lint(args: &LintArgs, out: &mut dyn Write) -> Result<u8> {
    let loader = SchemaLoader::new().context("failed to compile the form structure schema")?;
    let document = read_document(&args.schema)?;
    let schema = loader
        .build(&document)
        .with_context(|| format!("schema is malformed: {}", args.schema.display()))?;

    let findings = lint_schema(&schema);
    if findings.is_empty() {
        writeln!(out, "{}: OK", args.schema.display())?;
        return Ok(0);
    }
    for finding in &findings {
        writeln!(out, "{}: {finding}", args.schema.display())?;
    }
    Ok(u8::from(has_errors(&findings)))
}
