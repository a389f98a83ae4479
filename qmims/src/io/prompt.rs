//! Worker prompts rendered from compiled-in minijinja templates.

use std::path::Path;

use anyhow::{Context, Result};
use minijinja::{Environment, context};
use serde::Serialize;
use tracing::debug;

use crate::core::extract::extract_target_content;
use crate::core::instructions::Instruction;

const AUTO_TEMPLATE: &str = include_str!("prompts/auto.md");
const TEMPLATE_TEMPLATE: &str = include_str!("prompts/template.md");
const INSTRUCT_TEMPLATE: &str = include_str!("prompts/instruct.md");

/// One embedded instruction with the text it governs, ready for rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstructionContext {
    pub line_number: usize,
    pub instruction: String,
    pub target: Option<String>,
}

impl InstructionContext {
    /// Resolve each instruction's target text against `content`.
    pub fn resolve_all(content: &str, instructions: &[Instruction]) -> Vec<Self> {
        instructions
            .iter()
            .map(|instr| Self {
                line_number: instr.line_number,
                instruction: instr.instruction.clone(),
                target: extract_target_content(Some(content), Some(instr)),
            })
            .collect()
    }
}

/// Template engine wrapper around minijinja.
pub struct PromptEngine {
    env: Environment<'static>,
}

impl PromptEngine {
    pub fn new() -> Result<Self> {
        let mut env = Environment::new();
        env.add_template("auto", AUTO_TEMPLATE)
            .context("load auto prompt")?;
        env.add_template("template", TEMPLATE_TEMPLATE)
            .context("load template prompt")?;
        env.add_template("instruct", INSTRUCT_TEMPLATE)
            .context("load instruct prompt")?;
        Ok(Self { env })
    }

    /// Prompt for writing a README from scratch.
    pub fn render_auto(&self, readme_path: &Path, existing: bool) -> Result<String> {
        let template = self.env.get_template("auto")?;
        let rendered = template
            .render(context! {
                readme_path => readme_path.display().to_string(),
                existing => existing,
            })
            .context("render auto prompt")?;
        Ok(finish(rendered))
    }

    /// Prompt for writing a README that follows a template's structure.
    pub fn render_template(
        &self,
        readme_path: &Path,
        template_name: &str,
        template_body: &str,
        existing: bool,
    ) -> Result<String> {
        let template = self.env.get_template("template")?;
        let rendered = template
            .render(context! {
                readme_path => readme_path.display().to_string(),
                template_name => template_name,
                template_body => template_body.trim_end(),
                existing => existing,
            })
            .context("render template prompt")?;
        Ok(finish(rendered))
    }

    /// Prompt for applying embedded instructions to a README.
    pub fn render_instruct(
        &self,
        readme_path: &Path,
        source_path: &Path,
        instructions: &[InstructionContext],
    ) -> Result<String> {
        let template = self.env.get_template("instruct")?;
        let rendered = template
            .render(context! {
                readme_path => readme_path.display().to_string(),
                source_path => source_path.display().to_string(),
                instructions => instructions,
            })
            .context("render instruct prompt")?;
        debug!(count = instructions.len(), bytes = rendered.len(), "instruct prompt rendered");
        Ok(finish(rendered))
    }
}

fn finish(rendered: String) -> String {
    let mut out = rendered.trim().to_string();
    out.push('\n');
    out
}
