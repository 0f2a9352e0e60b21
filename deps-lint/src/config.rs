//! Lint configuration resolved from CLI flags and environment variables.
//!
//! Every process-wide knob is validated here once and passed down as explicit
//! struct fields; nothing below this boundary reads the environment.

use std::collections::BTreeSet;
use std::env;
use std::path::PathBuf;

use anyhow::{Result, anyhow};

/// Required env var naming the project root when `--root` is not given.
pub const ROOT_ENV: &str = "DEPS_LINT_ROOT";
/// Optional comma-separated list of managers to exclude from tracking.
pub const EXCLUDE_ENV: &str = "DEPS_LINT_EXCLUDE_MANAGERS";
/// Optional fix-mode toggle; `"true"` (case-insensitive) enables it.
pub const AUTOFIX_ENV: &str = "AUTOFIX";

/// Default scanner executable.
pub const DEFAULT_SCANNER_BIN: &str = "renovate";

/// Validated lint configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LintConfig {
    /// Project root the scanner runs in.
    pub root: PathBuf,
    /// Managers dropped wholesale from the generated document.
    pub excluded_managers: BTreeSet<String>,
    /// Rewrite the snapshot instead of failing on mismatch.
    pub fix: bool,
    /// Scanner executable to invoke.
    pub scanner_bin: String,
}

impl LintConfig {
    /// Resolve configuration from CLI flags, falling back to the environment.
    ///
    /// The `--root` flag beats `DEPS_LINT_ROOT`; missing both is a
    /// configuration error. Exclusions from `--exclude` flags and
    /// `DEPS_LINT_EXCLUDE_MANAGERS` are merged. Fix mode is on when the flag
    /// is set or `AUTOFIX=true`.
    pub fn resolve(
        root_flag: Option<PathBuf>,
        exclude_flags: &[String],
        fix_flag: bool,
        scanner_bin: Option<String>,
    ) -> Result<Self> {
        let root = match root_flag {
            Some(root) => root,
            None => env::var(ROOT_ENV)
                .map(PathBuf::from)
                .map_err(|_| anyhow!("project root not set: pass --root or set {ROOT_ENV}"))?,
        };

        Ok(Self {
            root,
            excluded_managers: resolve_excluded_managers(exclude_flags),
            fix: fix_flag || autofix_enabled(env::var(AUTOFIX_ENV).ok().as_deref()),
            scanner_bin: scanner_bin.unwrap_or_else(|| DEFAULT_SCANNER_BIN.to_string()),
        })
    }
}

/// Merge `--exclude` flags with the `DEPS_LINT_EXCLUDE_MANAGERS` env list.
pub fn resolve_excluded_managers(exclude_flags: &[String]) -> BTreeSet<String> {
    let mut excluded: BTreeSet<String> = exclude_flags
        .iter()
        .flat_map(|raw| split_exclude_list(raw))
        .collect();
    if let Ok(raw) = env::var(EXCLUDE_ENV) {
        excluded.extend(split_exclude_list(&raw));
    }
    excluded
}

/// Split a comma-separated manager list, trimming entries and dropping empties.
fn split_exclude_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(str::to_string)
        .collect()
}

fn autofix_enabled(value: Option<&str>) -> bool {
    value.is_some_and(|v| v.eq_ignore_ascii_case("true"))
}

/// Canonical lint-owned paths under a project root.
#[derive(Debug, Clone)]
pub struct ProjectPaths {
    pub root: PathBuf,
    /// Committed snapshot the lint verifies.
    pub snapshot_path: PathBuf,
    /// Renovate config passed verbatim to the scanner.
    pub scanner_config_path: PathBuf,
}

impl ProjectPaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let github_dir = root.join(".github");
        Self {
            snapshot_path: github_dir.join("renovate-tracked-deps.json"),
            scanner_config_path: github_dir.join("renovate.json5"),
            root,
        }
    }
}
