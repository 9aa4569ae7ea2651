//! LLM request/response types
//!
//! Provider-agnostic shapes; each client maps them onto its own wire format.

use planstate::{Role, Turn};
use tracing::debug;

/// A completion request - everything needed for one model call
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    /// System instruction
    pub system_prompt: String,

    /// Conversation so far, ending with the current user message
    pub messages: Vec<Message>,

    /// Max tokens for the response
    pub max_tokens: u32,

    /// Sampling temperature
    pub temperature: f32,

    /// Ask the provider for a JSON response
    pub json_mode: bool,
}

/// A message in the conversation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    /// Create a user message
    pub fn user(text: impl Into<String>) -> Self {
        debug!("Message::user: called");
        Self {
            role: Role::User,
            content: text.into(),
        }
    }

    #[cfg(test)]
    pub fn assistant(text: impl Into<String>) -> Self {
        debug!("Message::assistant: called");
        Self {
            role: Role::Assistant,
            content: text.into(),
        }
    }
}

impl From<&Turn> for Message {
    fn from(turn: &Turn) -> Self {
        Self {
            role: turn.role,
            content: turn.content.clone(),
        }
    }
}

/// Response from a completion request
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionResponse {
    /// Text content (if any)
    pub content: Option<String>,

    /// Why the model stopped
    pub stop_reason: StopReason,

    /// Token usage
    pub usage: TokenUsage,
}

impl CompletionResponse {
    /// Plain text response that ended normally
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            stop_reason: StopReason::EndTurn,
            usage: TokenUsage::default(),
        }
    }

    /// The text to decode; an empty response counts as an empty JSON object
    pub fn text_or_empty_object(&self) -> &str {
        match self.content.as_deref() {
            Some(text) if !text.is_empty() => text,
            _ => "{}",
        }
    }
}

/// Why the model stopped generating
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    EndTurn,
    /// Output was cut off; the JSON is likely truncated
    MaxTokens,
    /// Output was blocked by the provider's safety filter
    ContentFilter,
}

impl StopReason {
    /// Parse a Gemini `finishReason`
    pub fn from_gemini(s: &str) -> Self {
        debug!(%s, "StopReason::from_gemini: called");
        match s {
            "MAX_TOKENS" => StopReason::MaxTokens,
            "SAFETY" | "RECITATION" | "BLOCKLIST" | "PROHIBITED_CONTENT" => StopReason::ContentFilter,
            _ => StopReason::EndTurn,
        }
    }

    /// Parse an OpenAI `finish_reason`
    pub fn from_openai(s: &str) -> Self {
        debug!(%s, "StopReason::from_openai: called");
        match s {
            "length" => StopReason::MaxTokens,
            "content_filter" => StopReason::ContentFilter,
            _ => StopReason::EndTurn,
        }
    }
}

/// Token usage
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenUsage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_constructors() {
        assert_eq!(Message::user("Hallo").role, Role::User);
        assert_eq!(Message::assistant("Hoi").content, "Hoi");
    }

    #[test]
    fn test_message_from_turn() {
        let turn = Turn {
            role: Role::Assistant,
            content: "Welkom".to_string(),
        };
        assert_eq!(Message::from(&turn), Message::assistant("Welkom"));
    }

    #[test]
    fn test_text_or_empty_object() {
        assert_eq!(CompletionResponse::text("{\"answer\":\"x\"}").text_or_empty_object(), "{\"answer\":\"x\"}");
        assert_eq!(CompletionResponse::text("").text_or_empty_object(), "{}");

        let none = CompletionResponse {
            content: None,
            stop_reason: StopReason::EndTurn,
            usage: TokenUsage::default(),
        };
        assert_eq!(none.text_or_empty_object(), "{}");
    }

    #[test]
    fn test_stop_reasons() {
        assert_eq!(StopReason::from_gemini("STOP"), StopReason::EndTurn);
        assert_eq!(StopReason::from_gemini("MAX_TOKENS"), StopReason::MaxTokens);
        assert_eq!(StopReason::from_gemini("SAFETY"), StopReason::ContentFilter);
        assert_eq!(StopReason::from_openai("length"), StopReason::MaxTokens);
        assert_eq!(StopReason::from_openai("stop"), StopReason::EndTurn);
    }
}
