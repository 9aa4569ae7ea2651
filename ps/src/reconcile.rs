//! Question state reconciliation
//!
//! [`QuestionList`] owns the canonical, position-ordered question collection
//! of one session and applies the patches a model reply carries. The question
//! set is closed: merging replaces bodies of known questions and never adds,
//! removes or renumbers anything.

use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::question::{Question, QuestionStatus, has_text};

/// Anomaly in a patch that was still applied
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompletionWarning {
    /// Marked completed without an answer
    MissingAnswer(String),
    /// Marked completed without a summary although the question has a summary template
    MissingSummary(String),
}

/// What a merge did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeReport {
    /// Ids of questions that were replaced, in patch order
    pub applied: Vec<String>,
    /// Patch ids that matched no question
    pub unknown_ids: Vec<String>,
    /// Patches that were skipped because they could not be interpreted
    pub malformed: usize,
    pub warnings: Vec<CompletionWarning>,
}

impl MergeReport {
    pub fn is_empty(&self) -> bool {
        self.applied.is_empty() && self.unknown_ids.is_empty() && self.malformed == 0
    }
}

/// Progress through the questionnaire
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Progress<'a> {
    pub total: usize,
    pub completed: usize,
    /// First question in position order that is pending and unanswered
    pub next_pending: Option<&'a Question>,
}

impl Progress<'_> {
    /// Completed fraction in `0.0..=1.0`
    pub fn ratio(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.completed as f64 / self.total as f64
        }
    }
}

/// A model-provided replacement for one question
#[derive(Debug, Deserialize)]
struct Patch {
    id: String,
    #[serde(default)]
    question: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    answer: Option<String>,
    #[serde(default)]
    summary: Option<String>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl Patch {
    fn from_value(value: &Value) -> Option<Self> {
        match serde_json::from_value::<Patch>(value.clone()) {
            Ok(mut patch) => {
                // identity stays canonical
                patch.extra.remove("position");
                patch.extra.remove("summary_template");
                Some(patch)
            }
            Err(e) => {
                debug!(error = %e, "Patch::from_value: not a usable patch");
                None
            }
        }
    }

    fn status(&self) -> Option<QuestionStatus> {
        match self.status.as_deref() {
            Some("completed") => Some(QuestionStatus::Completed),
            Some("pending") => Some(QuestionStatus::Pending),
            Some(other) => {
                debug!(id = %self.id, status = %other, "Patch::status: unknown status, keeping current");
                None
            }
            None => None,
        }
    }

    /// Replace the body of `target` with this patch
    fn apply_to(self, target: &mut Question) {
        if let Some(status) = self.status() {
            target.status = status;
        }
        if let Some(text) = self.question {
            target.question = text;
        }
        target.answer = self.answer;
        target.summary = self.summary;
        target.extra = self.extra;
    }
}

/// The canonical question collection of one session
#[derive(Debug, Clone, PartialEq)]
pub struct QuestionList {
    questions: Vec<Question>,
}

impl QuestionList {
    /// Owned copy of a template, in position order
    pub fn from_template(template: &[Question]) -> Self {
        debug!(count = template.len(), "QuestionList::from_template: called");
        Self::from_questions(template.to_vec())
    }

    /// Take ownership of questions, e.g. from a saved export
    pub fn from_questions(mut questions: Vec<Question>) -> Self {
        questions.sort_by_key(|q| q.position);
        Self { questions }
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Question> {
        self.questions.iter()
    }

    pub fn as_slice(&self) -> &[Question] {
        &self.questions
    }

    pub fn get(&self, id: &str) -> Option<&Question> {
        self.questions.iter().find(|q| q.id == id)
    }

    /// Completed questions in position order
    pub fn completed(&self) -> Vec<&Question> {
        self.questions.iter().filter(|q| q.is_completed()).collect()
    }

    /// Set the summary of one question; false when the id is unknown
    pub fn set_summary(&mut self, id: &str, summary: impl Into<String>) -> bool {
        match self.questions.iter_mut().find(|q| q.id == id) {
            Some(q) => {
                q.summary = Some(summary.into());
                true
            }
            None => {
                debug!(%id, "QuestionList::set_summary: unknown id");
                false
            }
        }
    }

    /// Apply model patches
    ///
    /// Each patch replaces the body of the question with the same id. `id`,
    /// `position` and `summary_template` are never taken from a patch. Unknown
    /// ids and malformed patches are skipped.
    pub fn merge(&mut self, patches: Option<&[Value]>) -> MergeReport {
        let mut report = MergeReport::default();
        let patches = match patches {
            Some(p) if !p.is_empty() => p,
            _ => {
                debug!("QuestionList::merge: no patches");
                return report;
            }
        };
        debug!(count = patches.len(), "QuestionList::merge: called");

        for raw in patches {
            let Some(patch) = Patch::from_value(raw) else {
                warn!("Skipping malformed question patch: {}", raw);
                report.malformed += 1;
                continue;
            };

            let Some(target) = self.questions.iter_mut().find(|q| q.id == patch.id) else {
                warn!(id = %patch.id, "Ignoring patch for unknown question");
                report.unknown_ids.push(patch.id);
                continue;
            };

            if patch.status() == Some(QuestionStatus::Completed) {
                if !has_text(patch.answer.as_deref()) {
                    warn!(id = %patch.id, "Question marked completed but missing 'answer' field");
                    report.warnings.push(CompletionWarning::MissingAnswer(patch.id.clone()));
                }
                if target.summary_template.is_some() && !has_text(patch.summary.as_deref()) {
                    warn!(id = %patch.id, "Question marked completed but missing 'summary' field");
                    report.warnings.push(CompletionWarning::MissingSummary(patch.id.clone()));
                }
            }

            let id = patch.id.clone();
            patch.apply_to(target);
            debug!(%id, "QuestionList::merge: applied");
            report.applied.push(id);
        }

        self.questions.sort_by_key(|q| q.position);
        report
    }

    /// Total, completed count and the next open question
    pub fn progress(&self) -> Progress<'_> {
        Progress {
            total: self.questions.len(),
            completed: self.questions.iter().filter(|q| q.is_completed()).count(),
            next_pending: self.questions.iter().find(|q| q.is_open()),
        }
    }

    /// Id of the next open question
    pub fn next_pending_id(&self) -> Option<String> {
        self.progress().next_pending.map(|q| q.id.clone())
    }

    /// Complete a question the conversation moved past without closing
    ///
    /// When the open question before a turn (`previous_pending`) differs from
    /// the open question after it and was not completed, it is forced to
    /// completed. A missing answer is filled with the user's input for the
    /// turn and a missing summary with the reply summary. Returns the id of
    /// the repaired question.
    pub fn repair_stalled(
        &mut self,
        previous_pending: Option<&str>,
        user_input: &str,
        summary: Option<&str>,
    ) -> Option<String> {
        let previous = previous_pending?;
        let current = self.next_pending_id()?;
        if current == previous {
            debug!(%current, "QuestionList::repair_stalled: conversation did not advance");
            return None;
        }

        let question = self.questions.iter_mut().find(|q| q.id == previous)?;
        if question.is_completed() {
            return None;
        }

        question.status = QuestionStatus::Completed;
        if !has_text(question.answer.as_deref()) {
            question.answer = Some(user_input.to_string());
        }
        if !has_text(question.summary.as_deref()) {
            if let Some(summary) = summary.filter(|s| !s.is_empty()) {
                question.summary = Some(summary.to_string());
            }
        }

        info!(
            id = %previous,
            next = %current,
            "Question was answered but not marked completed, completed it"
        );
        Some(previous.to_string())
    }
}
