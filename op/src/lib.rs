//! Ouderschapsplan - guided intake assistant for drafting a parenting plan
//!
//! A parent answers a fixed questionnaire in a conversation with a hosted
//! language model. Each turn the model receives the full question list and
//! returns both a reply and updated questions; the session folds those updates
//! into its own state (see the `planstate` crate) and can render the answered
//! questions as a formal plan and as a discussion document.
//!
//! - [`session::ChatSession`] drives one conversation
//! - [`llm`] is the model transport
//! - [`prompts`] renders the system and per-turn prompts
//! - [`document`] produces the PDFs
//! - [`repl`] is the interactive terminal front end

pub mod cli;
pub mod config;
pub mod document;
pub mod llm;
pub mod prompts;
pub mod questions;
pub mod repl;
pub mod session;
pub mod summary;

pub use config::Config;
pub use session::{ChatSession, SessionSettings, TurnError, TurnOutcome};
