//! Session export payload
//!
//! A saved session is a formatted JSON document:
//!
//! ```text
//! {
//!   "question_list": [ ... ],
//!   "conversation_history": [ {"role": "user", "content": "..."}, ... ],
//!   "exported_at": "2025-01-31 14:02:11"
//! }
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::question::Question;
use crate::transcript::Transcript;

/// Timestamp format of `exported_at`
pub const EXPORTED_AT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Snapshot of a session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Export {
    pub question_list: Vec<Question>,
    pub conversation_history: Transcript,
    pub exported_at: String,
}

impl Export {
    /// Snapshot taken at `now`
    pub fn new(questions: &[Question], transcript: &Transcript, now: DateTime<Local>) -> Self {
        Self {
            question_list: questions.to_vec(),
            conversation_history: transcript.clone(),
            exported_at: now.format(EXPORTED_AT_FORMAT).to_string(),
        }
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize export")
    }

    /// File name used when saving at `now`
    pub fn file_name(now: DateTime<Local>) -> String {
        format!("conversation_{}.json", now.timestamp())
    }

    /// Write to `dir/conversation_{timestamp}.json`, creating `dir`
    pub fn save_to_dir(&self, dir: &Path, now: DateTime<Local>) -> Result<PathBuf> {
        debug!(?dir, "Export::save_to_dir: called");
        fs::create_dir_all(dir).context(format!("Failed to create {}", dir.display()))?;
        let path = dir.join(Self::file_name(now));
        fs::write(&path, self.to_json_pretty()?).context(format!("Failed to write {}", path.display()))?;
        info!("Saved conversation to {}", path.display());
        Ok(path)
    }

    pub fn load(path: &Path) -> Result<Self> {
        debug!(?path, "Export::load: called");
        let content = fs::read_to_string(path).context(format!("Failed to read {}", path.display()))?;
        serde_json::from_str(&content).context(format!("Failed to parse export {}", path.display()))
    }
}
