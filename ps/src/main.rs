use clap::Parser;
use colored::*;
use eyre::{Context, Result};
use tracing::info;

use planstate::cli::{Cli, Command};
use planstate::{Export, QuestionList, decode};

fn setup_logging(verbose: bool) -> Result<()> {
    let level = if verbose { tracing::Level::DEBUG } else { tracing::Level::WARN };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose).context("Failed to setup logging")?;

    info!("planstate starting");

    match cli.command {
        Command::Decode { file } => {
            let raw = std::fs::read_to_string(&file).context(format!("Failed to read {}", file.display()))?;
            let reply = decode(&raw)?;
            println!("{}", serde_json::to_string_pretty(&reply)?);
        }
        Command::Progress { export } => {
            let export = Export::load(&export)?;
            let questions = QuestionList::from_questions(export.question_list);
            let progress = questions.progress();
            println!(
                "{} {}/{} completed ({} turns, exported {})",
                "✓".green(),
                progress.completed,
                progress.total,
                export.conversation_history.len(),
                export.exported_at.dimmed()
            );
            match progress.next_pending {
                Some(q) => println!("Next: {} {}", format!("[{}]", q.position).yellow(), q.question),
                None => println!("{}", "All questions answered".cyan()),
            }
        }
    }

    Ok(())
}
