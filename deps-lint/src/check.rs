//! Orchestration for the `check` command: scan, extract, compare, write.

use std::fs;

use anyhow::{Context, Result};
use tempfile::TempDir;
use tracing::{debug, info};

use crate::config::{LintConfig, ProjectPaths};
use crate::core::diff::unified_diff;
use crate::core::extract::extract_deps;
use crate::core::snapshot::{TrackedDeps, canonical_json};
use crate::io::scanner::{ScanRequest, Scanner};
use crate::io::snapshot_store::{load_snapshot, write_snapshot};

/// Terminal result of a check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckOutcome {
    /// Committed snapshot matches the generated document.
    UpToDate,
    /// Snapshot was missing and has been created (fix mode).
    Created,
    /// Snapshot was stale and has been rewritten (fix mode).
    Updated { diff: String },
    /// Snapshot is missing and fix mode is off. Nothing was written.
    MissingBaseline,
    /// Snapshot is stale and fix mode is off. Nothing was written.
    Stale { diff: String },
}

/// Run the scanner and compare the extracted inventory with the snapshot.
///
/// The scan log lives in a temporary directory that is removed on every exit
/// path, including scanner failure.
pub fn run_check<S: Scanner>(config: &LintConfig, scanner: &S) -> Result<CheckOutcome> {
    let paths = ProjectPaths::new(&config.root);
    let scan_dir = TempDir::new().context("create scan temp dir")?;
    let log_path = scan_dir.path().join("renovate.log");

    let request = ScanRequest {
        workdir: paths.root.clone(),
        config_path: paths.scanner_config_path.clone(),
        log_path: log_path.clone(),
    };
    scanner.scan(&request)?;

    let log_text = fs::read_to_string(&log_path)
        .with_context(|| format!("read scan log {}", log_path.display()))?;
    let generated = extract_deps(&log_text, &config.excluded_managers)?;
    compare_snapshot(&paths, config.fix, &generated)
}

/// Compare `generated` against the committed snapshot, rewriting it in fix
/// mode. Equality is structural: key order and whitespace do not matter.
pub fn compare_snapshot(
    paths: &ProjectPaths,
    fix: bool,
    generated: &TrackedDeps,
) -> Result<CheckOutcome> {
    let generated_value =
        serde_json::to_value(generated).context("serialize generated document")?;

    if !paths.snapshot_path.exists() {
        if fix {
            write_snapshot(&paths.snapshot_path, generated)?;
            info!(path = %paths.snapshot_path.display(), "snapshot created");
            return Ok(CheckOutcome::Created);
        }
        return Ok(CheckOutcome::MissingBaseline);
    }

    let committed = load_snapshot(&paths.snapshot_path)?;
    if committed == generated_value {
        debug!("snapshot matches generated document");
        return Ok(CheckOutcome::UpToDate);
    }

    let diff = unified_diff(
        &canonical_json(&committed)?,
        &canonical_json(&generated_value)?,
        &paths.snapshot_path.display().to_string(),
        "generated",
    );

    if fix {
        write_snapshot(&paths.snapshot_path, generated)?;
        info!(path = %paths.snapshot_path.display(), "snapshot updated");
        return Ok(CheckOutcome::Updated { diff });
    }
    Ok(CheckOutcome::Stale { diff })
}
