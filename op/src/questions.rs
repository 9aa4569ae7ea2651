//! Question template loading

use std::path::Path;

use eyre::{Context, Result};
use planstate::{Question, parse_template};
use tracing::{debug, info};

/// Default question template compiled into the binary
pub const EMBEDDED: &str = include_str!("../questions/questions.json");

/// Load the question template from `path`, or the embedded default
pub fn load_template(path: Option<&Path>) -> Result<Vec<Question>> {
    debug!(?path, "load_template: called");
    match path {
        Some(path) => {
            let content = std::fs::read_to_string(path).context(format!("Failed to read {}", path.display()))?;
            let questions = parse_template(&content).context(format!("Invalid question template {}", path.display()))?;
            info!("Loaded {} questions from {}", questions.len(), path.display());
            Ok(questions)
        }
        None => parse_template(EMBEDDED).context("Embedded question template is invalid"),
    }
}
