//! Document assembler
//!
//! Renders the completed questions of a session into two PDFs: a formal,
//! signable parenting plan and an informal discussion document for mediation.
//! Rendering is a pure function of the questions, the parent's name and a
//! date; only [`write_documents`] touches the filesystem.

mod discussion;
mod formal;
mod layout;
mod pdf;
mod sections;

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local, NaiveDate};
use eyre::{Context, Result};
use planstate::Question;
use thiserror::Error;
use tracing::{debug, info};

pub use sections::formal_section;

/// A document could not be produced
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("PDF error: {0}")]
    Pdf(#[from] printpdf::Error),
}

/// Completed questions in position order
pub fn completed(questions: &[Question]) -> Vec<&Question> {
    let mut completed: Vec<&Question> = questions.iter().filter(|q| q.is_completed()).collect();
    completed.sort_by_key(|q| q.position);
    completed
}

/// Formal parenting plan as PDF bytes
pub fn render_formal(questions: &[Question], date: NaiveDate) -> Result<Vec<u8>, DocumentError> {
    let completed = completed(questions);
    debug!(completed = completed.len(), "render_formal: called");
    pdf::write_pdf("Ouderschapsplan", &layout::layout(&formal::blocks(&completed, date)))
}

/// Discussion document as PDF bytes
pub fn render_discussion(questions: &[Question], parent_name: &str, date: NaiveDate) -> Result<Vec<u8>, DocumentError> {
    let completed = completed(questions);
    debug!(completed = completed.len(), %parent_name, "render_discussion: called");
    pdf::write_pdf(
        "Gespreksdocument Ouderschapsplan",
        &layout::layout(&discussion::blocks(&completed, parent_name, date)),
    )
}

/// Paths of the written documents
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentPaths {
    pub formal: PathBuf,
    pub discussion: PathBuf,
}

/// Render both documents into `dir`, named after the timestamp of `now`
pub fn write_documents(questions: &[Question], parent_name: &str, dir: &Path, now: DateTime<Local>) -> Result<DocumentPaths> {
    debug!(?dir, "write_documents: called");
    std::fs::create_dir_all(dir).context(format!("Failed to create {}", dir.display()))?;

    let ts = now.timestamp();
    let date = now.date_naive();
    let paths = DocumentPaths {
        formal: dir.join(format!("ouderschapsplan_formeel_{}.pdf", ts)),
        discussion: dir.join(format!("gespreksdocument_{}.pdf", ts)),
    };

    let formal = render_formal(questions, date).context("Failed to render formal document")?;
    std::fs::write(&paths.formal, formal).context(format!("Failed to write {}", paths.formal.display()))?;

    let discussion = render_discussion(questions, parent_name, date).context("Failed to render discussion document")?;
    std::fs::write(&paths.discussion, discussion)
        .context(format!("Failed to write {}", paths.discussion.display()))?;

    info!(
        "Wrote {} and {}",
        paths.formal.display(),
        paths.discussion.display()
    );
    Ok(paths)
}
