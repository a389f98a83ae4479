//! Side-effecting helpers: files, config, templates, prompts, the worker process.

pub mod config;
pub mod markdown;
pub mod process;
pub mod prompt;
pub mod session;
pub mod templates;
