//! Ouderschapsplan - CLI entry point

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Local;
use clap::Parser;
use colored::Colorize;
use eyre::{Context, Result};
use tracing::{debug, info};

use ouderschapsplan::cli::{Cli, Command};
use ouderschapsplan::config::Config;
use ouderschapsplan::document::{formal_section, write_documents};
use ouderschapsplan::questions::load_template;
use ouderschapsplan::repl::run_interactive;
use planstate::{Export, decode};

fn parse_level(s: &str) -> tracing::Level {
    match s.to_uppercase().as_str() {
        "TRACE" => tracing::Level::TRACE,
        "DEBUG" => tracing::Level::DEBUG,
        "INFO" => tracing::Level::INFO,
        "WARN" | "WARNING" => tracing::Level::WARN,
        "ERROR" => tracing::Level::ERROR,
        _ => {
            eprintln!("Warning: Unknown log-level '{}', defaulting to INFO", s);
            tracing::Level::INFO
        }
    }
}

fn setup_logging(cli_log_level: Option<&str>, config_log_level: Option<&str>) -> Result<()> {
    // Note: Can't log params here since logging isn't initialized yet
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("ouderschapsplan")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    // Priority: CLI --log-level > config file > default (INFO)
    let level = cli_log_level
        .or(config_log_level)
        .map(parse_level)
        .unwrap_or(tracing::Level::INFO);

    let log_file = fs::File::create(log_dir.join("op.log")).context("Failed to create log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (level: {:?})", level);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load log level from config file early (before full config load)
    let config_log_level = Config::load_log_level(cli.config.as_ref());
    setup_logging(cli.log_level.as_deref(), config_log_level.as_deref()).context("Failed to setup logging")?;

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    info!(provider = %config.llm.provider, model = %config.llm.model, "Loaded config");

    debug!(command = ?cli.command, "main: dispatching command");
    match cli.command {
        None => run_interactive(&config, None).await,
        Some(Command::Chat { resume }) => run_interactive(&config, resume.as_deref()).await,
        Some(Command::Render { export, output }) => cmd_render(&config, &export, output.as_deref()),
        Some(Command::Questions) => cmd_questions(&config),
        Some(Command::Decode { file }) => cmd_decode(&file),
    }
}

fn cmd_render(config: &Config, export: &Path, output: Option<&Path>) -> Result<()> {
    debug!(?export, ?output, "cmd_render: called");
    let export = Export::load(export)?;
    let dir = output.unwrap_or(config.session.output_dir.as_path());

    let paths = write_documents(&export.question_list, &config.session.parent_name, dir, Local::now())?;
    println!("{} {}", "✓".green(), paths.formal.display());
    println!("{} {}", "✓".green(), paths.discussion.display());
    Ok(())
}

fn cmd_questions(config: &Config) -> Result<()> {
    debug!("cmd_questions: called");
    let template = load_template(config.session.questions_path.as_deref())?;

    let mut current_section = None;
    for q in &template {
        let section = formal_section(q.position);
        if let Some(name) = section.filter(|s| Some(*s) != current_section) {
            println!("{}", name.bright_cyan());
            current_section = Some(name);
        }
        println!("  {:>3} {:28} {}", q.position, q.id.dimmed(), q.question);
    }
    Ok(())
}

fn cmd_decode(file: &Path) -> Result<()> {
    debug!(?file, "cmd_decode: called");
    let raw = fs::read_to_string(file).context(format!("Failed to read {}", file.display()))?;
    let reply = decode(&raw)?;
    println!("{}", serde_json::to_string_pretty(&reply)?);
    Ok(())
}
