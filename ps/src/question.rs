//! Question domain types
//!
//! A question is one item of the intake questionnaire. The set of questions is
//! closed: it comes from a static template and is never extended at runtime.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::debug;

/// Errors from loading a question template
#[derive(Debug, Error)]
pub enum QuestionError {
    #[error("Invalid question template: {0}")]
    InvalidTemplate(#[from] serde_json::Error),

    #[error("Duplicate question id: {0}")]
    DuplicateId(String),

    #[error("Duplicate question position {position} (ids {first} and {second})")]
    DuplicatePosition { position: i64, first: String, second: String },
}

/// Question status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum QuestionStatus {
    /// Not yet answered
    #[default]
    Pending,
    /// Answered and confirmed by the assistant
    Completed,
}

impl std::fmt::Display for QuestionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Completed => write!(f, "completed"),
        }
    }
}

/// One intake question
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    /// Stable identifier, unique across the collection
    pub id: String,

    /// Canonical display and document order
    pub position: i64,

    /// Prompt text shown to the parent
    pub question: String,

    #[serde(default)]
    pub status: QuestionStatus,

    /// The parent's raw answer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,

    /// Formal rendering of the answer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,

    /// Handlebars template used to derive `summary` from structured fields
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary_template: Option<String>,

    /// Template-defined fields we don't interpret (hints for the model)
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Question {
    /// Create a pending question with no answer
    pub fn new(id: impl Into<String>, position: i64, question: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            position,
            question: question.into(),
            status: QuestionStatus::Pending,
            answer: None,
            summary: None,
            summary_template: None,
            extra: Map::new(),
        }
    }

    pub fn with_summary_template(mut self, template: impl Into<String>) -> Self {
        self.summary_template = Some(template.into());
        self
    }

    pub fn is_completed(&self) -> bool {
        self.status == QuestionStatus::Completed
    }

    /// Pending and unanswered
    pub fn is_open(&self) -> bool {
        self.status == QuestionStatus::Pending && !has_text(self.answer.as_deref())
    }
}

/// True when the value is present and non-empty
pub(crate) fn has_text(value: Option<&str>) -> bool {
    value.is_some_and(|s| !s.is_empty())
}

/// Parse a question template from JSON text
///
/// The result is sorted by position. Ids and positions must be unique.
pub fn parse_template(json: &str) -> Result<Vec<Question>, QuestionError> {
    debug!(json_len = json.len(), "parse_template: called");
    let mut questions: Vec<Question> = serde_json::from_str(json)?;
    questions.sort_by_key(|q| q.position);

    for pair in questions.windows(2) {
        if pair[0].position == pair[1].position {
            return Err(QuestionError::DuplicatePosition {
                position: pair[0].position,
                first: pair[0].id.clone(),
                second: pair[1].id.clone(),
            });
        }
    }

    let mut seen = std::collections::HashSet::new();
    for q in &questions {
        if !seen.insert(q.id.as_str()) {
            debug!(id = %q.id, "parse_template: duplicate id");
            return Err(QuestionError::DuplicateId(q.id.clone()));
        }
    }

    debug!(count = questions.len(), "parse_template: parsed");
    Ok(questions)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&QuestionStatus::Completed).unwrap(), "\"completed\"");
        assert_eq!(QuestionStatus::Pending.to_string(), "pending");
    }

    #[test]
    fn test_question_keeps_unknown_fields() {
        let json = r#"{"id":"q1","position":1,"question":"Naam?","status":"pending","required_details":["naam"]}"#;
        let q: Question = serde_json::from_str(json).unwrap();
        assert_eq!(q.extra["required_details"][0], "naam");

        let back = serde_json::to_value(&q).unwrap();
        assert_eq!(back["required_details"][0], "naam");
        assert!(back.get("answer").is_none());
    }

    #[test]
    fn test_is_open() {
        let mut q = Question::new("q1", 1, "Naam?");
        assert!(q.is_open());

        q.answer = Some(String::new());
        assert!(q.is_open());

        q.answer = Some("Jan".to_string());
        assert!(!q.is_open());

        q.answer = None;
        q.status = QuestionStatus::Completed;
        assert!(!q.is_open());
    }

    #[test]
    fn test_parse_template_sorts_by_position() {
        let json = r#"[
            {"id":"b","position":2,"question":"B"},
            {"id":"a","position":1,"question":"A"}
        ]"#;
        let questions = parse_template(json).unwrap();
        assert_eq!(questions[0].id, "a");
        assert_eq!(questions[1].id, "b");
        assert_eq!(questions[0].status, QuestionStatus::Pending);
    }

    #[test]
    fn test_parse_template_rejects_duplicates() {
        let dup_id = r#"[{"id":"a","position":1,"question":"A"},{"id":"a","position":2,"question":"B"}]"#;
        assert!(matches!(parse_template(dup_id), Err(QuestionError::DuplicateId(id)) if id == "a"));

        let dup_pos = r#"[{"id":"a","position":1,"question":"A"},{"id":"b","position":1,"question":"B"}]"#;
        assert!(matches!(parse_template(dup_pos), Err(QuestionError::DuplicatePosition { position: 1, .. })));
    }

    #[test]
    fn test_parse_template_invalid_json() {
        assert!(matches!(parse_template("not json"), Err(QuestionError::InvalidTemplate(_))));
    }
}
