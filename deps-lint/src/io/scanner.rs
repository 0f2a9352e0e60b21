//! Scanner abstraction for Renovate invocation.
//!
//! The [`Scanner`] trait decouples the check flow from the actual scanner
//! binary. Tests use scripted scanners that write prepared logs without
//! spawning processes.

use std::fmt;
use std::fs::File;
use std::path::PathBuf;
use std::process::{Command, Stdio};

use anyhow::{Context, Result};
use tracing::{debug, info, instrument, warn};

/// Parameters for a scanner invocation.
#[derive(Debug, Clone)]
pub struct ScanRequest {
    /// Working directory for the scanner process (the project root).
    pub workdir: PathBuf,
    /// Renovate config file passed verbatim via `RENOVATE_CONFIG_FILE`.
    pub config_path: PathBuf,
    /// Path the merged stdout/stderr debug log is written to.
    pub log_path: PathBuf,
}

/// Abstraction over scanner backends.
pub trait Scanner {
    /// Run the scanner. Must write its debug log to `request.log_path`.
    fn scan(&self, request: &ScanRequest) -> Result<()>;
}

/// Scanner exit failure, carrying the child's exit code for propagation.
#[derive(Debug)]
pub struct ScannerFailed {
    /// Exit code of the scanner, if it exited normally.
    pub code: Option<i32>,
    /// Log location reported in diagnostics.
    pub log_path: PathBuf,
}

impl fmt::Display for ScannerFailed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.code {
            Some(code) => write!(
                f,
                "scanner failed (exit {code}). See log: {}",
                self.log_path.display()
            ),
            None => write!(
                f,
                "scanner was killed by a signal. See log: {}",
                self.log_path.display()
            ),
        }
    }
}

impl std::error::Error for ScannerFailed {}

/// Scanner that spawns the Renovate CLI in local mode.
pub struct RenovateScanner {
    bin: String,
}

impl RenovateScanner {
    pub fn new(bin: impl Into<String>) -> Self {
        Self { bin: bin.into() }
    }
}

impl Scanner for RenovateScanner {
    #[instrument(skip_all, fields(workdir = %request.workdir.display()))]
    fn scan(&self, request: &ScanRequest) -> Result<()> {
        info!(bin = %self.bin, "starting scanner");

        let log_file = File::create(&request.log_path)
            .with_context(|| format!("create scan log {}", request.log_path.display()))?;
        let log_for_stderr = log_file
            .try_clone()
            .with_context(|| format!("clone scan log handle {}", request.log_path.display()))?;

        let status = Command::new(&self.bin)
            .arg("--platform=local")
            .arg("--require-config=ignored")
            .env("LOG_LEVEL", "debug")
            .env("LOG_FORMAT", "json")
            .env("RENOVATE_CONFIG_FILE", &request.config_path)
            .current_dir(&request.workdir)
            .stdin(Stdio::null())
            .stdout(Stdio::from(log_file))
            .stderr(Stdio::from(log_for_stderr))
            .status()
            .with_context(|| format!("spawn scanner `{}`", self.bin))?;

        if !status.success() {
            warn!(exit_code = ?status.code(), "scanner failed");
            return Err(ScannerFailed {
                code: status.code(),
                log_path: request.log_path.clone(),
            }
            .into());
        }

        debug!("scanner completed");
        Ok(())
    }
}
