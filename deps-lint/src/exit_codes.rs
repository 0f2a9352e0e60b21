//! Stable exit codes for deps-lint commands.

/// Snapshot is up to date, or was created/updated under fix mode.
pub const OK: i32 = 0;
/// Configuration, scanner-invocation, log-format, or snapshot-format errors.
pub const INVALID: i32 = 1;
/// Snapshot is missing or out of date and fix mode is off.
pub const STALE: i32 = 2;
