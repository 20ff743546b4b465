//! # formstage CLI entry point
//!
//! Parses command-line arguments and dispatches to subcommand handlers.

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use formstage_cli::inspect::{run_payload, run_validate, run_visible, PayloadArgs, ValidateArgs, VisibleArgs};
use formstage_cli::lint::{run_lint, LintArgs};
use formstage_cli::replay::{run_replay, ReplayArgs};

/// Schema-driven multi-stage form validation.
///
/// Lints form schemas, evaluates field visibility and validation for a
/// stored state, previews submission payloads, and replays scripted
/// sessions.
#[derive(Parser, Debug)]
#[command(name = "formstage", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Emit log lines as JSON on stderr.
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Report schema authoring problems.
    Lint(LintArgs),

    /// List the visible fields for a state.
    Visible(VisibleArgs),

    /// Validate a stage (or the whole form) for a state.
    Validate(ValidateArgs),

    /// Print the submission payload for a state.
    Payload(PayloadArgs),

    /// Replay a JSON-lines event script through a form session.
    Replay(ReplayArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // RUST_LOG wins over -v when set.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    });

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    if cli.log_json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    let result = match &cli.command {
        Commands::Lint(args) => run_lint(args, &mut out),
        Commands::Visible(args) => run_visible(args, &mut out),
        Commands::Validate(args) => run_validate(args, &mut out),
        Commands::Payload(args) => run_payload(args, &mut out),
        Commands::Replay(args) => run_replay(args, &mut out),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(2)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parse_validate_with_stage_and_locale() {
        let cli = Cli::try_parse_from([
            "formstage", "validate", "form.yaml", "--state", "s.json", "--stage", "2", "--locale", "he",
        ])
        .unwrap();
        match cli.command {
            Commands::Validate(args) => {
                assert_eq!(args.stage, Some(2));
                assert_eq!(args.locale, Some(formstage_schema::Locale::He));
                assert_eq!(args.input.state.as_deref(), Some(std::path::Path::new("s.json")));
            }
            other => panic!("expected Validate, got {other:?}"),
        }
    }

    #[test]
    fn cli_parse_rejects_unknown_locale() {
        assert!(Cli::try_parse_from(["formstage", "validate", "f.yaml", "--locale", "fr"]).is_err());
    }

    #[test]
    fn cli_parse_replay_flags_conflict() {
        assert!(Cli::try_parse_from([
            "formstage", "replay", "f.yaml", "--events", "e.jsonl", "--draft-dir", "d", "--no-draft",
        ])
        .is_err());
    }

    #[test]
    fn cli_parse_verbosity_is_global() {
        let cli = Cli::try_parse_from(["formstage", "lint", "f.yaml", "-vv"]).unwrap();
        assert_eq!(cli.verbose, 2);
        assert!(!cli.log_json);
    }

    #[test]
    fn cli_parse_log_json_after_subcommand() {
        let cli = Cli::try_parse_from(["formstage", "payload", "f.yaml", "--log-json"]).unwrap();
        assert!(cli.log_json);
    }
}
