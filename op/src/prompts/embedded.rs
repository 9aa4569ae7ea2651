//! Embedded prompts
//!
//! These are compiled into the binary from .pmt files at build time.

use tracing::debug;

/// System instruction for the intake assistant
pub const SYSTEM: &str = include_str!("../../prompts/system.pmt");

/// Per-turn user message wrapper
pub const TURN: &str = include_str!("../../prompts/turn.pmt");

/// Get the embedded prompt by name
pub fn get_embedded(name: &str) -> Option<&'static str> {
    debug!(%name, "get_embedded: called");
    match name {
        "system" => Some(SYSTEM),
        "turn" => Some(TURN),
        _ => {
            debug!("get_embedded: no match found");
            None
        }
    }
}
