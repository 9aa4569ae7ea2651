//! Prompt Loader
//!
//! Loads prompt templates from files or falls back to embedded defaults.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use eyre::{Result, eyre};
use handlebars::Handlebars;
use serde::Serialize;
use tracing::debug;

use super::embedded;

/// Date format used in the system instruction
pub const TODAY_FORMAT: &str = "%d-%m-%Y";

/// Context for the `system` template
#[derive(Debug, Clone, Serialize)]
pub struct SystemContext {
    /// Today's date as dd-mm-yyyy
    pub today: String,
}

impl SystemContext {
    pub fn new(today: NaiveDate) -> Self {
        Self {
            today: today.format(TODAY_FORMAT).to_string(),
        }
    }
}

/// Context for the `turn` template
#[derive(Debug, Clone, Serialize)]
pub struct TurnContext<'a> {
    /// Name the parent is addressed by
    pub sender: &'a str,
    /// What the parent typed
    pub input: &'a str,
    /// Pretty-printed question list
    pub questions: &'a str,
}

/// Loads and renders prompt templates
pub struct PromptLoader {
    /// Handlebars template engine
    hbs: Handlebars<'static>,
    /// Directories searched in order before the embedded fallback
    dirs: Vec<PathBuf>,
}

impl PromptLoader {
    /// Create a new prompt loader
    ///
    /// # Arguments
    /// * `prompts_dir` - Configured override directory, searched first
    /// * `workdir` - Directory used to find `.ouderschapsplan/prompts/`
    pub fn new(prompts_dir: Option<PathBuf>, workdir: impl AsRef<Path>) -> Self {
        let user_dir = workdir.as_ref().join(".ouderschapsplan/prompts");
        debug!(?prompts_dir, ?user_dir, "PromptLoader::new: called");

        let dirs = prompts_dir
            .into_iter()
            .chain(std::iter::once(user_dir))
            .filter(|dir| {
                let exists = dir.is_dir();
                debug!(?dir, %exists, "PromptLoader::new: checking directory");
                exists
            })
            .collect();

        Self {
            hbs: Handlebars::new(),
            dirs,
        }
    }

    /// Create a loader that only uses embedded prompts (for testing)
    pub fn embedded_only() -> Self {
        debug!("PromptLoader::embedded_only: called");
        Self {
            hbs: Handlebars::new(),
            dirs: Vec::new(),
        }
    }

    /// Load a template by name
    fn load_template(&self, name: &str) -> Result<String> {
        debug!(%name, "PromptLoader::load_template: called");
        for dir in &self.dirs {
            let path = dir.join(format!("{}.pmt", name));
            if path.exists() {
                debug!(?path, "PromptLoader::load_template: found override");
                return std::fs::read_to_string(&path)
                    .map_err(|e| eyre!("Failed to read prompt {}: {}", path.display(), e));
            }
        }

        if let Some(content) = embedded::get_embedded(name) {
            debug!(%name, "PromptLoader::load_template: found in embedded");
            return Ok(content.to_string());
        }

        debug!(%name, "PromptLoader::load_template: not found anywhere");
        Err(eyre!("Prompt template not found: {}", name))
    }

    /// Render a template with the given context
    pub fn render<T: Serialize>(&self, template_name: &str, context: &T) -> Result<String> {
        debug!(%template_name, "PromptLoader::render: called");
        let template = self.load_template(template_name)?;
        self.hbs
            .render_template(&template, context)
            .map_err(|e| eyre!("Failed to render template {}: {}", template_name, e))
    }

    /// The system instruction for the given date
    pub fn system_prompt(&self, today: NaiveDate) -> Result<String> {
        self.render("system", &SystemContext::new(today))
    }

    /// The user message sent for one turn
    pub fn turn_prompt(&self, sender: &str, input: &str, questions_json: &str) -> Result<String> {
        debug!(%sender, input_len = input.len(), "PromptLoader::turn_prompt: called");
        self.render(
            "turn",
            &TurnContext {
                sender,
                input,
                questions: questions_json,
            },
        )
    }
}
