//! Chat session driver
//!
//! [`ChatSession`] runs one intake conversation: it sends each parent message
//! to the model together with the current question list, decodes the reply and
//! folds it into the question state.
//!
//! A turn is all or nothing. When the transport or the decoder fails, neither
//! the questions nor the transcript change and the parent can simply send the
//! same message again.

use std::sync::Arc;

use chrono::{DateTime, Local};
use planstate::{DecodeError, DecodedReply, Export, MergeReport, Question, QuestionList, Transcript};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::llm::{CompletionRequest, LlmClient, LlmError, Message, StopReason};
use crate::prompts::PromptLoader;
use crate::summary::render_summary;

/// Opening line sent on behalf of the parent to start the conversation
pub const GREETING: &str = "Hallo, ik ben klaar om te beginnen met de vragenlijst.";

/// A turn that failed without changing the session
#[derive(Debug, Error)]
pub enum TurnError {
    #[error("Model request failed: {0}")]
    Transport(#[from] LlmError),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error("Failed to build prompt: {0}")]
    Prompt(String),
}

/// Per-session model settings
#[derive(Debug, Clone)]
pub struct SessionSettings {
    /// Name the parent is addressed by in the turn prompt
    pub parent_name: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl SessionSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            parent_name: config.session.parent_name.clone(),
            max_tokens: config.llm.max_tokens,
            temperature: config.llm.temperature,
        }
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            parent_name: "Sandra".to_string(),
            max_tokens: 8192,
            temperature: 0.4,
        }
    }
}

/// Result of one successful turn
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    /// Text to show the parent
    pub answer: String,
    pub report: MergeReport,
    /// Question completed automatically because the model moved on without closing it
    pub repaired: Option<String>,
    pub completed: usize,
    pub total: usize,
}

/// One intake conversation
pub struct ChatSession {
    llm: Arc<dyn LlmClient>,
    prompts: PromptLoader,
    settings: SessionSettings,
    template: Vec<Question>,
    questions: QuestionList,
    transcript: Transcript,
    initialized: bool,
}

impl ChatSession {
    /// Create a fresh session from a question template
    pub fn new(llm: Arc<dyn LlmClient>, prompts: PromptLoader, settings: SessionSettings, template: Vec<Question>) -> Self {
        debug!(question_count = template.len(), model = %llm.model(), "ChatSession::new: called");
        let questions = QuestionList::from_template(&template);
        Self {
            llm,
            prompts,
            settings,
            template,
            questions,
            transcript: Transcript::new(),
            initialized: false,
        }
    }

    pub fn questions(&self) -> &QuestionList {
        &self.questions
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn parent_name(&self) -> &str {
        &self.settings.parent_name
    }

    /// Send the greeting turn, once
    ///
    /// Returns `None` when the session was already started.
    pub async fn start(&mut self) -> Result<Option<TurnOutcome>, TurnError> {
        debug!(initialized = %self.initialized, "ChatSession::start: called");
        if self.initialized {
            return Ok(None);
        }

        let reply = self.exchange(GREETING).await?;
        let report = self.questions.merge(reply.patches());
        self.transcript.push_user(GREETING);
        self.transcript.push_assistant(reply.answer.as_str());
        self.initialized = true;
        info!("Session started");

        Ok(Some(self.outcome(reply.answer, report, None)))
    }

    /// Run one turn for the parent's message
    pub async fn submit(&mut self, input: &str) -> Result<TurnOutcome, TurnError> {
        debug!(input_len = input.len(), "ChatSession::submit: called");
        let previous_pending = self.questions.next_pending_id();

        let reply = self.exchange(input).await?;

        let report = self.questions.merge(reply.patches());
        self.apply_summary(&reply, previous_pending.as_deref());
        let repaired = self
            .questions
            .repair_stalled(previous_pending.as_deref(), input, reply.summary.as_deref());

        self.transcript.push_user(input);
        self.transcript.push_assistant(reply.answer.as_str());
        self.initialized = true;

        Ok(self.outcome(reply.answer, report, repaired))
    }

    /// Back to the template state with an empty transcript
    pub fn reset(&mut self) {
        info!("Session reset");
        self.questions = QuestionList::from_template(&self.template);
        self.transcript.clear();
        self.initialized = false;
    }

    /// Snapshot of the session taken at `now`
    pub fn export(&self, now: DateTime<Local>) -> Export {
        Export::new(self.questions.as_slice(), &self.transcript, now)
    }

    /// Continue a saved session
    ///
    /// A restored session with history counts as started, so no second
    /// greeting is sent.
    pub fn restore(&mut self, export: Export) {
        debug!(
            questions = export.question_list.len(),
            turns = export.conversation_history.len(),
            "ChatSession::restore: called"
        );
        self.questions = QuestionList::from_questions(export.question_list);
        self.transcript = export.conversation_history;
        self.initialized = !self.transcript.is_empty();
    }

    /// Call the model and decode its reply without touching session state
    async fn exchange(&self, input: &str) -> Result<DecodedReply, TurnError> {
        let request = self.build_request(input)?;
        let response = self.llm.complete(request).await?;

        match response.stop_reason {
            StopReason::MaxTokens => warn!("Model output hit the token limit, reply may be truncated"),
            StopReason::ContentFilter => warn!("Model output was blocked by the content filter"),
            StopReason::EndTurn => {}
        }
        debug!(
            input_tokens = response.usage.input_tokens,
            output_tokens = response.usage.output_tokens,
            "exchange: response received"
        );

        Ok(planstate::decode(response.text_or_empty_object())?)
    }

    fn build_request(&self, input: &str) -> Result<CompletionRequest, TurnError> {
        let questions_json = serde_json::to_string_pretty(self.questions.as_slice())
            .map_err(|e| TurnError::Prompt(e.to_string()))?;
        let current = self
            .prompts
            .turn_prompt(&self.settings.parent_name, input, &questions_json)
            .map_err(|e| TurnError::Prompt(e.to_string()))?;
        let system_prompt = self
            .prompts
            .system_prompt(Local::now().date_naive())
            .map_err(|e| TurnError::Prompt(e.to_string()))?;

        let mut messages: Vec<Message> = self.transcript.turns().iter().map(Message::from).collect();
        messages.push(Message::user(current));

        Ok(CompletionRequest {
            system_prompt,
            messages,
            max_tokens: self.settings.max_tokens,
            temperature: self.settings.temperature,
            json_mode: true,
        })
    }

    /// Store a summary on the question this reply was about
    ///
    /// The question named by the first patch, else the one that was pending
    /// before the turn. A rendered summary template always wins. The reply's
    /// `summary` only fills a question that has none after the merge.
    fn apply_summary(&mut self, reply: &DecodedReply, previous_pending: Option<&str>) {
        let Some(target) = reply.first_patch_id().or(previous_pending).map(str::to_string) else {
            return;
        };
        let Some(question) = self.questions.get(&target) else {
            return;
        };

        let fields = reply.fields.clone().unwrap_or_default();
        let rendered = match render_summary(question, &fields) {
            Ok(rendered) => rendered,
            Err(e) => {
                warn!(error = %e, "Summary rendering failed, using reply summary");
                None
            }
        };

        let has_summary = question.summary.as_deref().is_some_and(|s| !s.trim().is_empty());
        let summary = rendered.or_else(|| {
            if has_summary {
                return None;
            }
            reply
                .summary
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        });

        if let Some(summary) = summary {
            debug!(%target, "apply_summary: storing summary");
            self.questions.set_summary(&target, summary);
        }
    }

    fn outcome(&self, answer: String, report: MergeReport, repaired: Option<String>) -> TurnOutcome {
        let progress = self.questions.progress();
        TurnOutcome {
            answer,
            report,
            repaired,
            completed: progress.completed,
            total: progress.total,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::client::mock::MockLlmClient;
    use planstate::{QuestionStatus, Role};
    use serde_json::json;

    fn template() -> Vec<Question> {
        vec![
            Question::new("q1", 1, "Wat is je naam?"),
            Question::new("q2", 2, "Waar wonen de kinderen?").with_summary_template("De kinderen wonen bij {{ouder}}."),
            Question::new("q3", 3, "Hoe verdelen jullie de vakanties?"),
        ]
    }

    fn session(texts: &[&str]) -> (ChatSession, Arc<MockLlmClient>) {
        let mock = Arc::new(MockLlmClient::with_texts(texts));
        let session = ChatSession::new(
            mock.clone(),
            PromptLoader::embedded_only(),
            SessionSettings::default(),
            template(),
        );
        (session, mock)
    }

    fn reply(value: serde_json::Value) -> String {
        value.to_string()
    }

    #[tokio::test]
    async fn test_start_is_idempotent() {
        let greeting = reply(json!({"answer": "Welkom! Wat is je naam?", "updated_questions": []}));
        let (mut session, mock) = session(&[&greeting]);

        let outcome = session.start().await.unwrap().unwrap();
        assert_eq!(outcome.answer, "Welkom! Wat is je naam?");
        assert_eq!(outcome.total, 3);
        assert!(session.is_initialized());
        assert_eq!(session.transcript().turns()[0].content, GREETING);

        assert!(session.start().await.unwrap().is_none());
        assert_eq!(mock.call_count(), 1);
    }

    #[tokio::test]
    async fn test_request_carries_history_and_turn_prompt() {
        let first = reply(json!({"answer": "Welkom"}));
        let second = reply(json!({"answer": "Dank je"}));
        let (mut session, mock) = session(&[&first, &second]);

        session.start().await.unwrap();
        session.submit("Ik heet Sam").await.unwrap();

        let requests = mock.requests();
        let last = &requests[1];
        assert!(last.json_mode);
        assert_eq!(last.messages.len(), 3);
        assert_eq!(last.messages[0].content, GREETING);
        assert_eq!(last.messages[1].role, Role::Assistant);
        assert!(last.messages[2].content.starts_with("[CURRENT MESSAGE TO ANALYZE] Sandra: Ik heet Sam"));
        assert!(last.messages[2].content.contains("\"id\": \"q1\""));
        assert!(!last.system_prompt.contains("{{today}}"));

        // the transcript keeps the raw input, not the wrapped prompt
        assert_eq!(session.transcript().turns()[2].content, "Ik heet Sam");
    }

    #[tokio::test]
    async fn test_submit_merges_patches() {
        let raw = reply(json!({
            "answer": "Dank je, Sam. Waar wonen de kinderen?",
            "updated_questions": [
                {"id": "q1", "position": 1, "question": "Wat is je naam?", "status": "completed", "answer": "Sam", "summary": "Ouder heet Sam."}
            ]
        }));
        let (mut session, _) = session(&[&raw]);

        let outcome = session.submit("Sam").await.unwrap();
        assert_eq!(outcome.report.applied, vec!["q1".to_string()]);
        assert_eq!(outcome.completed, 1);
        assert!(outcome.repaired.is_none());

        let q1 = session.questions().get("q1").unwrap();
        assert_eq!(q1.status, QuestionStatus::Completed);
        assert_eq!(q1.summary.as_deref(), Some("Ouder heet Sam."));
        assert_eq!(session.transcript().len(), 2);
    }

    #[tokio::test]
    async fn test_failed_turn_changes_nothing() {
        let (mut session, _) = session(&["Sorry, daar kan ik niet bij helpen."]);
        let before = session.questions().clone();

        let err = session.submit("Sam").await.unwrap_err();
        assert!(matches!(err, TurnError::Decode(_)));
        assert_eq!(session.questions(), &before);
        assert!(session.transcript().is_empty());

        // the mock is exhausted now: transport failure
        let err = session.submit("Sam").await.unwrap_err();
        assert!(matches!(err, TurnError::Transport(_)));
        assert!(session.transcript().is_empty());
    }

    #[tokio::test]
    async fn test_stalled_question_is_repaired() {
        // the model records the answer but leaves q1 pending and moves on
        let raw = reply(json!({
            "answer": "Waar wonen de kinderen?",
            "updated_questions": [{"id": "q1", "position": 1, "question": "Wat is je naam?", "status": "pending", "answer": "Sam"}],
            "summary": "Ouder heet Sam."
        }));
        let (mut session, _) = session(&[&raw]);

        let outcome = session.submit("Ik ben Sam").await.unwrap();
        assert_eq!(outcome.repaired.as_deref(), Some("q1"));
        assert_eq!(outcome.completed, 1);

        let q1 = session.questions().get("q1").unwrap();
        assert!(q1.is_completed());
        assert_eq!(q1.answer.as_deref(), Some("Sam"));
        assert_eq!(q1.summary.as_deref(), Some("Ouder heet Sam."));
    }

    #[tokio::test]
    async fn test_summary_template_rendered_from_fields() {
        let raw = reply(json!({
            "answer": "Genoteerd.",
            "updated_questions": [{"id": "q2", "position": 2, "question": "Waar wonen de kinderen?", "status": "completed", "answer": "Bij mij"}],
            "summary": "Hoofdverblijf bij moeder.",
            "fields": {"ouder": "Sandra"}
        }));
        let (mut session, _) = session(&[&raw]);

        session.submit("Bij mij").await.unwrap();
        let q2 = session.questions().get("q2").unwrap();
        assert_eq!(q2.summary.as_deref(), Some("De kinderen wonen bij Sandra."));
        assert_eq!(q2.summary_template.as_deref(), Some("De kinderen wonen bij {{ouder}}."));
    }

    #[tokio::test]
    async fn test_summary_falls_back_when_template_fails() {
        let raw = reply(json!({
            "answer": "Genoteerd.",
            "updated_questions": [{"id": "q2", "position": 2, "question": "Waar wonen de kinderen?", "status": "completed", "answer": "Bij mij"}],
            "summary": "  Hoofdverblijf bij moeder.  ",
            "fields": {}
        }));
        let (mut session, _) = session(&[&raw]);

        session.submit("Bij mij").await.unwrap();
        let q2 = session.questions().get("q2").unwrap();
        assert_eq!(q2.summary.as_deref(), Some("Hoofdverblijf bij moeder."));
    }

    #[tokio::test]
    async fn test_patch_summary_wins_over_reply_summary() {
        let raw = reply(json!({
            "answer": "Dank je.",
            "updated_questions": [
                {"id": "q1", "position": 1, "question": "Wat is je naam?", "status": "completed", "answer": "Sam", "summary": "Ouder 1 heet Sam."}
            ],
            "summary": "Vorige samenvatting."
        }));
        let (mut session, _) = session(&[&raw]);

        session.submit("Sam").await.unwrap();
        let q1 = session.questions().get("q1").unwrap();
        assert_eq!(q1.summary.as_deref(), Some("Ouder 1 heet Sam."));
    }

    #[tokio::test]
    async fn test_mistyped_fields_still_merge() {
        let raw = reply(json!({
            "answer": "Genoteerd.",
            "updated_questions": [{"id": "q2", "position": 2, "question": "Waar wonen de kinderen?", "status": "completed", "answer": "Bij mij"}],
            "summary": "Hoofdverblijf bij moeder.",
            "fields": "n.v.t."
        }));
        let (mut session, _) = session(&[&raw]);

        let outcome = session.submit("Bij mij").await.unwrap();
        assert_eq!(outcome.report.applied, vec!["q2".to_string()]);
        let q2 = session.questions().get("q2").unwrap();
        assert!(q2.is_completed());
        assert_eq!(q2.summary.as_deref(), Some("Hoofdverblijf bij moeder."));
    }

    #[tokio::test]
    async fn test_question_list_alias_and_unknown_ids() {
        let raw = reply(json!({
            "answer": "Ok",
            "question_list": [
                {"id": "q1", "position": 1, "question": "Wat is je naam?", "status": "completed", "answer": "Sam"},
                {"id": "q9", "position": 9, "question": "Bestaat niet", "status": "completed", "answer": "x"}
            ]
        }));
        let (mut session, _) = session(&[&raw]);

        let outcome = session.submit("Sam").await.unwrap();
        assert_eq!(outcome.report.unknown_ids, vec!["q9".to_string()]);
        assert_eq!(session.questions().len(), 3);
        assert!(session.questions().get("q1").unwrap().is_completed());
    }

    #[tokio::test]
    async fn test_empty_model_text_is_empty_reply() {
        let mock = Arc::new(MockLlmClient::new(vec![crate::llm::CompletionResponse {
            content: None,
            stop_reason: StopReason::ContentFilter,
            usage: Default::default(),
        }]));
        let mut session = ChatSession::new(mock, PromptLoader::embedded_only(), SessionSettings::default(), template());

        let outcome = session.submit("Hallo").await.unwrap();
        assert_eq!(outcome.answer, "");
        assert!(outcome.report.is_empty());
        assert_eq!(session.transcript().len(), 2);
    }

    #[tokio::test]
    async fn test_reset_and_restore() {
        let raw = reply(json!({
            "answer": "Dank je",
            "updated_questions": [{"id": "q1", "position": 1, "question": "Wat is je naam?", "status": "completed", "answer": "Sam"}]
        }));
        let (mut session, _) = session(&[&raw]);
        session.submit("Sam").await.unwrap();

        let saved = session.export(Local::now());
        assert_eq!(saved.question_list[0].status, QuestionStatus::Completed);

        session.reset();
        assert!(!session.is_initialized());
        assert!(session.transcript().is_empty());
        assert_eq!(session.questions(), &QuestionList::from_template(&template()));

        session.restore(saved);
        assert!(session.is_initialized());
        assert_eq!(session.transcript().len(), 2);
        assert!(session.questions().get("q1").unwrap().is_completed());
    }
}
