//! README authoring driven by an external AI worker.
//!
//! Authors embed directives in markdown (`<!-- qmims: ... -->`); qmims finds
//! them, resolves the text each one governs, and hands a prompt to a worker
//! process that rewrites the file itself. The crate keeps a strict split:
//!
//! - **[`core`]**: Pure, deterministic logic (directive scanning, target
//!   extraction, mode parsing). No I/O, fully testable in isolation.
//! - **[`io`]**: Side-effecting operations (files, config, templates, prompts,
//!   the worker process lifecycle).
//!
//! Command modules ([`generate`]) coordinate core logic with I/O.

pub mod core;
pub mod exit_codes;
pub mod generate;
pub mod interrupt;
pub mod io;
pub mod logging;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
pub mod ui;
