//! CLI entry point: argument parsing, reporting, and exit-code mapping.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use deps_lint::check::{CheckOutcome, run_check};
use deps_lint::config::{
    AUTOFIX_ENV, DEFAULT_SCANNER_BIN, LintConfig, ProjectPaths, resolve_excluded_managers,
};
use deps_lint::core::extract::extract_deps;
use deps_lint::core::snapshot::canonical_json;
use deps_lint::exit_codes;
use deps_lint::io::scanner::{RenovateScanner, ScannerFailed};
use deps_lint::logging;

#[derive(Parser)]
#[command(
    name = "deps-lint",
    version,
    about = "Verify the committed Renovate dependency snapshot is up to date"
)]
struct Cli {
    /// Project root (falls back to DEPS_LINT_ROOT).
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    /// Manager to exclude from tracking (repeatable, comma-separated;
    /// merged with DEPS_LINT_EXCLUDE_MANAGERS).
    #[arg(long = "exclude", global = true)]
    exclude: Vec<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the scanner and compare its inventory with the committed snapshot.
    Check {
        /// Rewrite the snapshot instead of failing on mismatch
        /// (also enabled by AUTOFIX=true).
        #[arg(long)]
        fix: bool,

        /// Scanner executable to invoke.
        #[arg(long, default_value = DEFAULT_SCANNER_BIN)]
        scanner_bin: String,
    },
    /// Extract the tracked-deps document from an existing scanner log.
    Extract {
        /// Path to a Renovate debug log (LOG_FORMAT=json).
        #[arg(long)]
        log: PathBuf,
    },
}

fn main() {
    logging::init();
    let code = match run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("ERROR: {err:#}");
            match err.downcast_ref::<ScannerFailed>() {
                Some(failed) => failed.code.unwrap_or(exit_codes::INVALID),
                None => exit_codes::INVALID,
            }
        }
    };
    std::process::exit(code);
}

fn run() -> Result<i32> {
    let cli = Cli::parse();
    match cli.command {
        Command::Check { fix, scanner_bin } => {
            let config = LintConfig::resolve(cli.root, &cli.exclude, fix, Some(scanner_bin))?;
            let scanner = RenovateScanner::new(config.scanner_bin.clone());
            let paths = ProjectPaths::new(&config.root);
            let outcome = run_check(&config, &scanner)?;
            Ok(report_check(&paths, &outcome))
        }
        Command::Extract { log } => {
            let excluded = resolve_excluded_managers(&cli.exclude);
            let log_text =
                fs::read_to_string(&log).with_context(|| format!("read {}", log.display()))?;
            let generated = extract_deps(&log_text, &excluded)?;
            let value = serde_json::to_value(&generated).context("serialize document")?;
            print!("{}", canonical_json(&value)?);
            Ok(exit_codes::OK)
        }
    }
}

/// Print the outcome (status to stdout, errors to stderr) and map it to an
/// exit code.
fn report_check(paths: &ProjectPaths, outcome: &CheckOutcome) -> i32 {
    let snapshot = paths.snapshot_path.display();
    match outcome {
        CheckOutcome::UpToDate => {
            println!("{snapshot} is up to date.");
            exit_codes::OK
        }
        CheckOutcome::Created => {
            println!("{snapshot} has been created.");
            exit_codes::OK
        }
        CheckOutcome::Updated { diff } => {
            print!("{diff}");
            println!("{snapshot} has been updated.");
            exit_codes::OK
        }
        CheckOutcome::MissingBaseline => {
            eprintln!("ERROR: {snapshot} does not exist.");
            eprintln!("Rerun `deps-lint check --fix` (or set {AUTOFIX_ENV}=true) to create it.");
            exit_codes::STALE
        }
        CheckOutcome::Stale { diff } => {
            print!("{diff}");
            eprintln!("ERROR: {snapshot} is out of date.");
            eprintln!("Rerun `deps-lint check --fix` (or set {AUTOFIX_ENV}=true) to update it.");
            exit_codes::STALE
        }
    }
}
