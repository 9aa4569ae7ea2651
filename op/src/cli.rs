//! CLI command definitions

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Ouderschapsplan - guided intake for a parenting plan
#[derive(Parser)]
#[command(
    name = "op",
    about = "Guided intake assistant for drafting a parenting plan (ouderschapsplan)",
    version
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(
        short = 'l',
        long = "log-level",
        global = true,
        help = "Log level (TRACE, DEBUG, INFO, WARN, ERROR)"
    )]
    pub log_level: Option<String>,

    /// Subcommand to execute (defaults to chat)
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// CLI subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Start an interactive intake conversation
    Chat {
        /// Continue a saved conversation (conversation_*.json)
        #[arg(short, long, value_name = "EXPORT")]
        resume: Option<PathBuf>,
    },

    /// Render the formal plan and the discussion document from a saved conversation
    Render {
        /// Saved conversation (conversation_*.json)
        export: PathBuf,

        /// Output directory (defaults to session.output-dir)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List the questions of the question template
    Questions,

    /// Decode a saved raw model response and print it as JSON
    Decode {
        /// File holding the raw response text
        file: PathBuf,
    },
}
