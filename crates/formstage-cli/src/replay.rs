//! # Replay Subcommand
//!
//! Drives a [`FormSession`] from a JSON-lines event script, one event per
//! line:
//!
//! ```text
//! {"action": "set", "field": "employmentType", "value": "employee"}
//! {"action": "clear", "field": "employmentNotes"}
//! {"action": "next"}
//! {"action": "prev"}
//! {"action": "goto", "stage": 0}
//! {"action": "submit"}
//! {"action": "reset"}
//! ```
//!
//! Each event produces one compact JSON report line. An accepted submit
//! first writes the payload line through the writer transport. Blank lines
//! and lines starting with `#` are skipped.

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use formstage_core::FieldValue;
use formstage_schema::{ErrorMap, Locale};
use formstage_state::{
    DraftStore, FileDraftStore, FormSession, JsonWriterTransport, MemoryDraftStore, NavigationError,
    SessionError,
};
use serde::{Deserialize, Serialize};

use crate::input::{load_schema, session_config};

/// Arguments for the replay subcommand.
#[derive(Args, Debug)]
pub struct ReplayArgs {
    /// Path to the form schema.
    pub schema: PathBuf,

    /// JSON-lines event script.
    #[arg(long)]
    pub events: PathBuf,

    /// Draft directory. Defaults to FORMSTAGE_DRAFT_DIR, then .formstage/drafts.
    #[arg(long, conflicts_with = "no_draft")]
    pub draft_dir: Option<PathBuf>,

    /// Keep drafts in memory only.
    #[arg(long)]
    pub no_draft: bool,

    /// Message language (en or he).
    #[arg(long)]
    pub locale: Option<Locale>,
}

/// One scripted user action.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum Event {
    Set { field: String, value: FieldValue },
    Clear { field: String },
    Next,
    Prev,
    Goto { stage: usize },
    Submit,
    Reset,
}

impl Event {
    fn name(&self) -> &'static str {
        match self {
            Self::Set { .. } => "set",
            Self::Clear { .. } => "clear",
            Self::Next => "next",
            Self::Prev => "prev",
            Self::Goto { .. } => "goto",
            Self::Submit => "submit",
            Self::Reset => "reset",
        }
    }
}

/// Outcome of one event.
#[derive(Debug, Serialize)]
pub struct StepReport {
    pub line: usize,
    pub action: &'static str,
    pub ok: bool,
    /// Stage after the event.
    pub stage: usize,
    pub furthest: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "ErrorMap::is_empty")]
    pub errors: ErrorMap,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub pruned: Vec<String>,
}

/// Execute the replay subcommand.
pub fn run_replay(args: &ReplayArgs, out: &mut dyn Write) -> Result<u8> {
    let schema = Arc::new(load_schema(&args.schema)?);
    let script = std::fs::read_to_string(&args.events)
        .with_context(|| format!("failed to read event script: {}", args.events.display()))?;
    let events = parse_events(&script)?;
    let config = session_config(args.locale, args.draft_dir.as_deref())?;

    if args.no_draft {
        let session = FormSession::open(schema, MemoryDraftStore::new(), &config);
        replay(session, &events, out)
    } else {
        let store = FileDraftStore::new(config.draft_dir.clone());
        let session = FormSession::open(schema, store, &config);
        replay(session, &events, out)
    }
}

/// Parse an event script into `(line number, event)` pairs.
pub fn parse_events(script: &str) -> Result<Vec<(usize, Event)>> {
    script
        .lines()
        .enumerate()
        .map(|(i, line)| (i + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty() && !line.starts_with('#'))
        .map(|(n, line)| {
            serde_json::from_str::<Event>(line)
                .map(|event| (n, event))
                .with_context(|| format!("invalid event on line {n}: {line}"))
        })
        .collect()
}

/// Apply events in order. Exit code 1 when the final event failed.
pub fn replay<S: DraftStore>(
    mut session: FormSession<S>,
    events: &[(usize, Event)],
    out: &mut dyn Write,
) -> Result<u8> {
    let mut last_ok = true;
    for (line, event) in events {
        let outcome = apply(&mut session, event, out);
        let (ok, error, errors, pruned) = match outcome {
            Ok(pruned) => (true, None, ErrorMap::new(), pruned),
            Err(SessionError::Navigation(NavigationError::Blocked { errors, .. })) => {
                (false, Some("validation failed".to_string()), errors, Vec::new())
            }
            Err(e) => (false, Some(e.to_string()), ErrorMap::new(), Vec::new()),
        };
        tracing::debug!(line, action = event.name(), ok, "replayed event");
        let report = StepReport {
            line: *line,
            action: event.name(),
            ok,
            stage: session.current_stage(),
            furthest: session.furthest_stage(),
            error,
            errors,
            pruned,
        };
        serde_json::to_writer(&mut *out, &report).context("failed to encode report")?;
        writeln!(out)?;
        last_ok = ok;
    }
    Ok(u8::from(!last_ok))
}

fn apply<S: DraftStore>(
    session: &mut FormSession<S>,
    event: &Event,
    out: &mut dyn Write,
) -> Result<Vec<String>, SessionError> {
    match event {
        Event::Set { field, value } => session.set_value(field, value.clone()),
        Event::Clear { field } => session.clear_value(field),
        Event::Next => session.next().map(|_| Vec::new()).map_err(Into::into),
        Event::Prev => {
            session.prev();
            Ok(Vec::new())
        }
        Event::Goto { stage } => session.go_to(*stage).map(|()| Vec::new()).map_err(Into::into),
        Event::Submit => {
            let mut transport = JsonWriterTransport::new(&mut *out);
            session.submit(&mut transport).map(|_| Vec::new())
        }
        Event::Reset => {
            session.reset();
            Ok(Vec::new())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_events_skips_comments_and_blanks() {
        let script = "# fill\n{\"action\":\"set\",\"field\":\"a\",\"value\":true}\n\n{\"action\":\"goto\",\"stage\":2}\n";
        let events = parse_events(script).unwrap();
        assert_eq!(
            events,
            vec![
                (
                    2,
                    Event::Set {
                        field: "a".into(),
                        value: FieldValue::Bool(true)
                    }
                ),
                (4, Event::Goto { stage: 2 }),
            ]
        );
    }

    #[test]
    fn test_parse_events_reports_line() {
        let err = parse_events("{\"action\":\"next\"}\n{\"action\":\"fly\"}").unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }
}
