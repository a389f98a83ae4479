//! Stable exit codes for qmims CLI commands.

/// Command succeeded (including "no instructions found", which only warns).
pub const OK: i32 = 0;
/// Command failed: bad input, I/O error, or the worker exited unsuccessfully.
pub const FAILED: i32 = 1;
/// The user interrupted a running worker (128 + SIGINT).
pub const INTERRUPTED: i32 = 130;
