//! qmims: README authoring driven by an external AI worker.
//!
//! `generate` builds a prompt (from scratch, from a template, or from
//! `<!-- qmims: ... -->` directives embedded in markdown) and runs the worker
//! with the terminal attached. `scan`, `config` and `templates` are helpers.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use qmims::core::instructions::parse_instructions;
use qmims::core::mode::Mode;
use qmims::exit_codes;
use qmims::generate::{GenerateOutcome, GenerateRequest, resolve_readme, run_generate};
use qmims::io::config::{CONFIG_KEYS, config_path, load_config, write_config};
use qmims::io::markdown::read_markdown;
use qmims::io::session::SessionError;
use qmims::io::templates::{TemplateSource, TemplateStore};
use qmims::{logging, ui};

#[derive(Parser)]
#[command(
    name = "qmims",
    version,
    about = "Generate and edit READMEs with an AI worker"
)]
struct Cli {
    /// Show the worker command line and debug diagnostics.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate or update a README with the worker.
    Generate {
        /// Project directory (defaults to the current directory).
        dir: Option<PathBuf>,
        /// auto, template[:NAME] or instruct[:FILE] (defaults to config).
        #[arg(short, long)]
        mode: Option<Mode>,
        /// README file to write, relative to DIR.
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Replace an existing README in auto/template mode.
        #[arg(short, long)]
        force: bool,
        /// Approve overwrites for this run.
        #[arg(short, long)]
        yes: bool,
    },
    /// List the embedded instructions in a markdown file.
    Scan {
        /// Markdown file (defaults to the README in the current directory).
        file: Option<PathBuf>,
        /// Print JSON instead of text.
        #[arg(long)]
        json: bool,
    },
    /// Read or change settings.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Manage README templates.
    Templates {
        #[command(subcommand)]
        action: TemplateAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print every setting.
    List,
    /// Print one setting.
    Get { key: String },
    /// Change one setting.
    Set { key: String, value: String },
    /// Print the config file location.
    Path,
}

#[derive(Subcommand)]
enum TemplateAction {
    /// List built-in and user templates.
    List,
    /// Print a template.
    Show { name: String },
    /// Add a user template from a markdown file.
    Add {
        name: String,
        file: PathBuf,
        /// Replace an existing user template.
        #[arg(short, long)]
        force: bool,
    },
    /// Remove a user template.
    Remove { name: String },
}

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);
    let code = match run(cli) {
        Ok(code) => code,
        Err(err) => failure_code(&err),
    };
    std::process::exit(code);
}

/// Report `err` and pick the exit code. An interrupted worker exits with
/// [`exit_codes::INTERRUPTED`] even when `stop` returns before the interrupt
/// thread gets to exit the process itself.
fn failure_code(err: &anyhow::Error) -> i32 {
    if let Some(SessionError::Terminated) = err.downcast_ref::<SessionError>() {
        return exit_codes::INTERRUPTED;
    }
    ui::error(&format!("{err:#}"));
    exit_codes::FAILED
}

fn run(cli: Cli) -> Result<i32> {
    match cli.command {
        Command::Generate {
            dir,
            mode,
            output,
            force,
            yes,
        } => cmd_generate(dir, mode, output, force, yes, cli.verbose),
        Command::Scan { file, json } => cmd_scan(file, json),
        Command::Config { action } => cmd_config(action),
        Command::Templates { action } => cmd_templates(action),
    }
}

fn cmd_generate(
    dir: Option<PathBuf>,
    mode: Option<Mode>,
    output: Option<PathBuf>,
    force: bool,
    yes: bool,
    verbose: bool,
) -> Result<i32> {
    let config = load_config(&config_path()?)?;
    let templates = TemplateStore::from_config_location()?;
    let project_dir = match dir {
        Some(dir) => dir,
        None => std::env::current_dir().context("read current directory")?,
    };
    let request = GenerateRequest {
        project_dir,
        mode,
        output,
        force,
        yes,
        verbose,
        handle_interrupts: true,
    };

    match run_generate(&request, &config, &templates)? {
        GenerateOutcome::Completed { readme, mode } => {
            ui::success(&format!("{} updated ({mode} mode)", readme.display()));
        }
        GenerateOutcome::NoInstructions { source } => {
            ui::warn(&format!(
                "no <!-- qmims: ... --> instructions found in {}; nothing to do",
                source.display()
            ));
        }
    }
    Ok(exit_codes::OK)
}

fn cmd_scan(file: Option<PathBuf>, json: bool) -> Result<i32> {
    let path = match file {
        Some(file) => file,
        None => {
            let cwd = std::env::current_dir().context("read current directory")?;
            resolve_readme(&cwd, None)?
        }
    };
    let content = read_markdown(&path)?;
    let instructions = parse_instructions(Some(&content));

    if json {
        let payload =
            serde_json::to_string_pretty(&instructions).context("serialize instructions")?;
        ui::print(&payload);
        return Ok(exit_codes::OK);
    }
    if instructions.is_empty() {
        ui::warn(&format!("no instructions found in {}", path.display()));
        return Ok(exit_codes::OK);
    }
    for instr in &instructions {
        let target = match instr.target {
            Some(span) => format!(" [target lines {}-{}]", span.start + 1, span.end),
            None => String::new(),
        };
        ui::print(&format!(
            "{}:{}: {}{}",
            path.display(),
            instr.line_number,
            instr.instruction,
            target
        ));
    }
    Ok(exit_codes::OK)
}

fn cmd_config(action: ConfigAction) -> Result<i32> {
    let path = config_path()?;
    match action {
        ConfigAction::List => {
            let config = load_config(&path)?;
            for key in CONFIG_KEYS {
                ui::print(&format!("{key} = {}", config.get(key)?));
            }
        }
        ConfigAction::Get { key } => {
            let config = load_config(&path)?;
            ui::print(&config.get(&key)?);
        }
        ConfigAction::Set { key, value } => {
            let mut config = load_config(&path)?;
            config.set(&key, &value)?;
            write_config(&path, &config)?;
            ui::success(&format!("{key} = {}", config.get(&key)?));
        }
        ConfigAction::Path => ui::print(&path.display().to_string()),
    }
    Ok(exit_codes::OK)
}

fn cmd_templates(action: TemplateAction) -> Result<i32> {
    let store = TemplateStore::from_config_location()?;
    match action {
        TemplateAction::List => {
            for template in store.list()? {
                let origin = match template.source {
                    TemplateSource::Builtin => "built-in".to_string(),
                    TemplateSource::User(path) => path.display().to_string(),
                };
                ui::print(&format!("{:<12} {origin}", template.name));
            }
        }
        TemplateAction::Show { name } => {
            let template = store.get(&name)?;
            ui::print(template.body.trim_end());
        }
        TemplateAction::Add { name, file, force } => {
            let path = store.add(&name, &file, force)?;
            ui::success(&format!("template `{name}` saved to {}", path.display()));
        }
        TemplateAction::Remove { name } => {
            let path = store.remove(&name)?;
            ui::success(&format!("removed {}", path.display()));
        }
    }
    Ok(exit_codes::OK)
}
