//! Summary templates
//!
//! Some questions carry a `summary_template`: a Handlebars template that turns
//! the structured `fields` of a reply into a formal sentence for the plan.

use handlebars::{Handlebars, no_escape};
use planstate::Question;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::debug;

/// A summary template could not be rendered
#[derive(Debug, Error)]
pub enum TemplateRenderError {
    #[error("Summary template of {id} failed to render: {message}")]
    Render { id: String, message: String },
}

/// Render the summary template of a question with the given fields
///
/// Returns `Ok(None)` when the question has no template or the result is
/// blank. Rendering is strict: a field the template names but `fields` lacks
/// is an error.
pub fn render_summary(question: &Question, fields: &Map<String, Value>) -> Result<Option<String>, TemplateRenderError> {
    debug!(id = %question.id, field_count = fields.len(), "render_summary: called");
    let Some(template) = question.summary_template.as_deref() else {
        return Ok(None);
    };

    let mut hbs = Handlebars::new();
    hbs.set_strict_mode(true);
    hbs.register_escape_fn(no_escape);

    let rendered = hbs
        .render_template(template, fields)
        .map_err(|e| TemplateRenderError::Render {
            id: question.id.clone(),
            message: e.to_string(),
        })?;

    let rendered = rendered.trim();
    if rendered.is_empty() {
        debug!("render_summary: blank result");
        return Ok(None);
    }
    Ok(Some(rendered.to_string()))
}
