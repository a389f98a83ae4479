//! Test-only helpers: temporary projects and scripted workers.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tempfile::TempDir;

use crate::core::mode::Mode;
use crate::generate::GenerateRequest;
use crate::io::config::WorkerConfig;
use crate::io::templates::TemplateStore;

/// A throwaway project directory with its own template store.
pub struct TestProject {
    dir: TempDir,
}

impl TestProject {
    pub fn new() -> Result<Self> {
        let dir = tempfile::tempdir().context("create temp project")?;
        fs::create_dir_all(dir.path().join("project")).context("create project dir")?;
        Ok(Self { dir })
    }

    /// Project root handed to the worker.
    pub fn path(&self) -> PathBuf {
        self.dir.path().join("project")
    }

    pub fn templates(&self) -> TemplateStore {
        TemplateStore::new(self.dir.path().join("templates"))
    }

    pub fn write(&self, relative: &str, contents: &str) -> Result<PathBuf> {
        let path = self.path().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, contents).with_context(|| format!("write {}", path.display()))?;
        Ok(path)
    }

    pub fn read(&self, relative: &str) -> Result<String> {
        let path = self.path().join(relative);
        fs::read_to_string(&path).with_context(|| format!("read {}", path.display()))
    }

    /// A `generate` request for this project with interrupts left alone.
    pub fn request(&self, mode: Mode) -> GenerateRequest {
        GenerateRequest {
            project_dir: self.path(),
            mode: Some(mode),
            output: None,
            force: false,
            yes: false,
            verbose: false,
            handle_interrupts: false,
        }
    }
}

/// Worker that runs `script` with `sh -c`; the prompt is available as `$1`.
pub fn script_worker(script: &str) -> WorkerConfig {
    WorkerConfig {
        program: "sh".to_string(),
        args: vec![
            "-c".to_string(),
            script.to_string(),
            "qmims-worker".to_string(),
        ],
    }
}

/// Worker that records its prompt to `prompt_file` and writes `readme` to `target`.
pub fn recording_worker(prompt_file: &Path, target: &str, readme: &str) -> WorkerConfig {
    let script = format!(
        "printf '%s' \"$1\" > '{}' && printf '%s' '{}' > '{}'",
        prompt_file.display(),
        readme.replace('\'', ""),
        target
    );
    script_worker(&script)
}
