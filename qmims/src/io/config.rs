//! User configuration stored at `<config_dir>/qmims/config.toml`.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow, bail};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::mode::Mode;

/// Overrides the config file location (tests, CI, per-project setups).
pub const CONFIG_ENV: &str = "QMIMS_CONFIG";

/// Keys accepted by `qmims config get/set`.
pub const CONFIG_KEYS: &[&str] = &[
    "default_mode",
    "default_template",
    "auto_approve",
    "worker.program",
    "worker.args",
];

/// qmims configuration (TOML).
///
/// Missing fields default to sensible values so a hand-edited file only needs
/// the keys it changes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct QmimsConfig {
    /// Mode used by `generate` when `--mode` is not given.
    pub default_mode: Mode,

    /// Template used by `template` mode when no name is given.
    pub default_template: String,

    /// Replace existing READMEs without asking for `--force`.
    pub auto_approve: bool,

    pub worker: WorkerConfig,
}

/// External worker invocation: `program args... <prompt>`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct WorkerConfig {
    /// Executable to spawn (looked up on `PATH`).
    pub program: String,
    /// Fixed arguments placed before the prompt: a non-interactive flag and a
    /// flag granting unattended trust for tool actions.
    pub args: Vec<String>,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            program: "q".to_string(),
            args: vec![
                "chat".to_string(),
                "--no-interactive".to_string(),
                "--trust-all-tools".to_string(),
            ],
        }
    }
}

impl Default for QmimsConfig {
    fn default() -> Self {
        Self {
            default_mode: Mode::Auto,
            default_template: "basic".to_string(),
            auto_approve: false,
            worker: WorkerConfig::default(),
        }
    }
}

impl QmimsConfig {
    pub fn validate(&self) -> Result<()> {
        if self.default_template.trim().is_empty() {
            return Err(anyhow!("default_template must not be empty"));
        }
        if self.worker.program.trim().is_empty() {
            return Err(anyhow!("worker.program must not be empty"));
        }
        Ok(())
    }

    /// Read one key as display text.
    pub fn get(&self, key: &str) -> Result<String> {
        let value = match key {
            "default_mode" => self.default_mode.to_string(),
            "default_template" => self.default_template.clone(),
            "auto_approve" => self.auto_approve.to_string(),
            "worker.program" => self.worker.program.clone(),
            "worker.args" => self.worker.args.join(" "),
            _ => bail!(unknown_key(key)),
        };
        Ok(value)
    }

    /// Set one key from display text. The result is validated before it is kept.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let mut next = self.clone();
        match key {
            "default_mode" => {
                next.default_mode = value.parse().context("parse default_mode")?;
            }
            "default_template" => next.default_template = value.trim().to_string(),
            "auto_approve" => next.auto_approve = parse_bool(value)?,
            "worker.program" => next.worker.program = value.trim().to_string(),
            "worker.args" => {
                next.worker.args = value.split_whitespace().map(str::to_string).collect();
            }
            _ => bail!(unknown_key(key)),
        }
        next.validate()?;
        *self = next;
        Ok(())
    }
}

fn unknown_key(key: &str) -> String {
    format!(
        "unknown config key `{key}` (expected one of: {})",
        CONFIG_KEYS.join(", ")
    )
}

fn parse_bool(value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Ok(true),
        "false" | "no" | "off" | "0" => Ok(false),
        other => Err(anyhow!("expected a boolean, got `{other}`")),
    }
}

/// Location of the config file: `$QMIMS_CONFIG`, else the platform config dir.
pub fn config_path() -> Result<PathBuf> {
    if let Some(path) = env::var_os(CONFIG_ENV).filter(|p| !p.is_empty()) {
        return Ok(PathBuf::from(path));
    }
    let base = dirs::config_dir().context("no config directory for this platform")?;
    Ok(base.join("qmims").join("config.toml"))
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `QmimsConfig::default()`.
pub fn load_config(path: &Path) -> Result<QmimsConfig> {
    if !path.exists() {
        debug!(path = %path.display(), "config missing, using defaults");
        let cfg = QmimsConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: QmimsConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()?;
    Ok(cfg)
}

/// Atomically write config to disk (temp file + rename).
pub fn write_config(path: &Path, cfg: &QmimsConfig) -> Result<()> {
    cfg.validate()?;
    let mut buf = toml::to_string_pretty(cfg).context("serialize config toml")?;
    buf.push('\n');
    write_atomic(path, &buf)
}

fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let parent = path
        .parent()
        .with_context(|| format!("config path missing parent {}", path.display()))?;
    fs::create_dir_all(parent).with_context(|| format!("create directory {}", parent.display()))?;
    let tmp_path = path.with_extension("toml.tmp");
    fs::write(&tmp_path, contents)
        .with_context(|| format!("write temp config {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path).with_context(|| format!("replace config {}", path.display()))?;
    Ok(())
}
