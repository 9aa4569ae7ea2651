//! CLI argument parsing for planstate

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "planstate")]
#[command(author, version, about = "Inspect ouderschapsplan model replies and saved sessions", long_about = None)]
pub struct Cli {
    /// Show debug logging on stderr
    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Decode a saved raw model response and print it as JSON
    Decode {
        /// File holding the raw response text
        #[arg(required = true)]
        file: PathBuf,
    },

    /// Show progress of a saved session
    Progress {
        /// Export file (conversation_*.json)
        #[arg(required = true)]
        export: PathBuf,
    },
}
