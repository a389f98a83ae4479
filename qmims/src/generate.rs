//! Orchestration for `qmims generate`.
//!
//! Resolves the target README, builds the worker prompt for the selected
//! [`Mode`], then hands it to a [`ProcessSession`] and blocks until the worker
//! has rewritten the file itself.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use tracing::{debug, info, instrument};

use crate::core::instructions::parse_instructions;
use crate::core::mode::Mode;
use crate::interrupt;
use crate::io::config::QmimsConfig;
use crate::io::markdown::{find_readme, read_markdown};
use crate::io::prompt::{InstructionContext, PromptEngine};
use crate::io::session::{ProcessSession, SessionOptions};
use crate::io::templates::TemplateStore;

/// Inputs for one `generate` invocation, resolved at the command boundary.
#[derive(Debug, Clone)]
pub struct GenerateRequest {
    /// Project directory; the worker runs here.
    pub project_dir: PathBuf,
    /// Explicit mode, or `None` for the configured default.
    pub mode: Option<Mode>,
    /// README path relative to `project_dir` (or absolute).
    pub output: Option<PathBuf>,
    /// Replace an existing README in `auto`/`template` mode.
    pub force: bool,
    /// Approve overwrites for this run regardless of config.
    pub yes: bool,
    pub verbose: bool,
    /// Kill the worker and exit on Ctrl-C. Off in tests.
    pub handle_interrupts: bool,
}

/// Result of a `generate` invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerateOutcome {
    /// The worker ran and exited successfully.
    Completed { readme: PathBuf, mode: Mode },
    /// Instruct mode found no embedded instructions; the worker was not run.
    NoInstructions { source: PathBuf },
}

/// Run `generate` end to end.
#[instrument(skip_all, fields(project_dir = %request.project_dir.display()))]
pub fn run_generate(
    request: &GenerateRequest,
    config: &QmimsConfig,
    templates: &TemplateStore,
) -> Result<GenerateOutcome> {
    if !request.project_dir.is_dir() {
        bail!("project directory {} does not exist", request.project_dir.display());
    }
    let mode = request
        .mode
        .clone()
        .unwrap_or_else(|| config.default_mode.clone());
    let readme = resolve_readme(&request.project_dir, request.output.as_deref())?;
    let existing = readme.exists();
    let approve = request.yes || config.auto_approve;
    debug!(mode = %mode, readme = %readme.display(), existing, approve, "generate resolved");

    let engine = PromptEngine::new()?;
    let (prompt, mode) = match mode {
        Mode::Auto => {
            guard_overwrite(&readme, existing, request.force || approve)?;
            (engine.render_auto(&readme, existing)?, Mode::Auto)
        }
        Mode::Template(name) => {
            guard_overwrite(&readme, existing, request.force || approve)?;
            let name = name.unwrap_or_else(|| config.default_template.clone());
            let template = templates.get(&name)?;
            let prompt = engine.render_template(&readme, &template.name, &template.body, existing)?;
            (prompt, Mode::Template(Some(name)))
        }
        Mode::Instruct(file) => {
            let source = match &file {
                Some(path) => request.project_dir.join(path),
                None => readme.clone(),
            };
            let content = read_markdown(&source)?;
            let instructions = parse_instructions(Some(&content));
            if instructions.is_empty() {
                info!(source = %source.display(), "no embedded instructions");
                return Ok(GenerateOutcome::NoInstructions { source });
            }
            let contexts = InstructionContext::resolve_all(&content, &instructions);
            let prompt = engine.render_instruct(&readme, &source, &contexts)?;
            (prompt, Mode::Instruct(file))
        }
    };

    let mut session = ProcessSession::new(
        SessionOptions {
            cwd: request.project_dir.clone(),
            verbose: request.verbose,
            auto_approve: approve,
        },
        config.worker.clone(),
    );
    session.start(&format!("Generating {} ({mode} mode)", display_name(&readme)));
    session.send_message(prompt);
    if request.handle_interrupts {
        interrupt::install(session.terminate_handle())?;
    }
    session.stop().context("README generation failed")?;

    Ok(GenerateOutcome::Completed { readme, mode })
}

/// Pick the README to write: explicit output, an existing README, or `README.md`.
pub fn resolve_readme(project_dir: &Path, output: Option<&Path>) -> Result<PathBuf> {
    if let Some(output) = output {
        return Ok(project_dir.join(output));
    }
    Ok(find_readme(project_dir)?.unwrap_or_else(|| project_dir.join("README.md")))
}

fn guard_overwrite(readme: &Path, existing: bool, allowed: bool) -> Result<()> {
    if existing && !allowed {
        bail!(
            "{} already exists (pass --force or --yes to replace it, or use --mode instruct to edit it)",
            readme.display()
        );
    }
    Ok(())
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
