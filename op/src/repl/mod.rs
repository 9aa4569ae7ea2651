//! Interactive intake REPL
//!
//! Line editing, slash commands and colored output around a [`ChatSession`].

mod session;

pub use session::ReplSession;

use std::path::Path;

use eyre::{Context, Result};
use planstate::Export;
use tracing::info;

use crate::config::Config;
use crate::llm::create_client;
use crate::prompts::PromptLoader;
use crate::questions::load_template;
use crate::session::{ChatSession, SessionSettings};

/// Run the interactive REPL
///
/// This is the main entry point for `op chat`.
pub async fn run_interactive(config: &Config, resume: Option<&Path>) -> Result<()> {
    // Validate API key early
    config.validate()?;

    let llm = create_client(&config.llm).map_err(|e| eyre::eyre!("Failed to create LLM client: {}", e))?;
    let template = load_template(config.session.questions_path.as_deref())?;
    let workdir = std::env::current_dir()?;
    let prompts = PromptLoader::new(config.session.prompts_dir.clone(), workdir);

    let mut chat = ChatSession::new(llm, prompts, SessionSettings::from_config(config), template);
    if let Some(path) = resume {
        let export = Export::load(path).context("Failed to load conversation to resume")?;
        info!("Resuming conversation from {}", path.display());
        chat.restore(export);
    }

    let mut repl = ReplSession::new(
        chat,
        config.session.conversations_dir.clone(),
        config.session.output_dir.clone(),
    );
    repl.run().await
}
