//! Shared input handling for subcommands: schema and state files, and the
//! locale/draft-directory overrides layered over [`SessionConfig`].

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use formstage_core::{FormState, Schema, StageScope};
use formstage_schema::{Locale, SchemaLoader};
use formstage_state::SessionConfig;
use serde::Serialize;

/// Arguments shared by subcommands that evaluate a state file.
#[derive(Args, Debug, Clone)]
pub struct StateInput {
    /// Path to the form schema (.json, .yaml, or .yml).
    pub schema: PathBuf,

    /// Path to a JSON object of field values. Omit for empty state.
    #[arg(long)]
    pub state: Option<PathBuf>,
}

/// Load and fully check a schema file.
pub fn load_schema(path: &Path) -> Result<Schema> {
    let loader = SchemaLoader::new().context("failed to compile the form structure schema")?;
    loader
        .load_path(path)
        .with_context(|| format!("failed to load schema: {}", path.display()))
}

/// Read a state file. `None` is the empty state; a file holding `null` is
/// the empty state too.
pub fn load_state(path: Option<&Path>) -> Result<FormState> {
    let Some(path) = path else {
        return Ok(FormState::new());
    };
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read state file: {}", path.display()))?;
    FormState::from_json(&content)
        .with_context(|| format!("state file is not a JSON object of field values: {}", path.display()))
}

/// Validation scope from an optional `--stage` argument.
pub fn scope(stage: Option<usize>) -> StageScope {
    StageScope::from(stage)
}

/// Session configuration from the environment with CLI overrides applied.
pub fn session_config(locale: Option<Locale>, draft_dir: Option<&Path>) -> Result<SessionConfig> {
    let mut config = SessionConfig::from_env().context("invalid formstage environment configuration")?;
    if let Some(locale) = locale {
        config.locale = locale;
    }
    if let Some(dir) = draft_dir {
        config.draft_dir = dir.to_path_buf();
    }
    Ok(config)
}

/// Write a value as pretty JSON followed by a newline.
pub fn write_json<T: Serialize + ?Sized>(out: &mut dyn Write, value: &T) -> Result<()> {
    serde_json::to_writer_pretty(&mut *out, value).context("failed to encode output")?;
    writeln!(out).context("failed to write output")?;
    Ok(())
}
