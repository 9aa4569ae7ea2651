//! Prompt Template System
//!
//! Loads and renders `.pmt` (prompt template) files for the intake chat.
//!
//! Template loading chain:
//! 1. configured prompts directory (`session.prompts-dir`)
//! 2. `.ouderschapsplan/prompts/{name}.pmt` (user override)
//! 3. Embedded fallback in code
//!
//! Templates use Handlebars syntax for variable substitution.

pub mod embedded;
mod loader;

pub use loader::{PromptLoader, SystemContext, TurnContext};
