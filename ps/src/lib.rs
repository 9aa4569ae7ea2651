//! PlanState - question state for the ouderschapsplan intake assistant
//!
//! Owns the pieces of a session that have rules worth testing in isolation:
//!
//! - [`decode`] turns raw model output into a [`DecodedReply`], salvaging what
//!   it can from malformed JSON
//! - [`QuestionList`] holds the canonical question collection and merges the
//!   patches a reply carries
//! - [`Transcript`] is the append-only conversation
//! - [`Export`] is the saved form of a session
//!
//! # Example
//!
//! ```ignore
//! use planstate::{QuestionList, decode, parse_template};
//!
//! let template = parse_template(&std::fs::read_to_string("questions.json")?)?;
//! let mut questions = QuestionList::from_template(&template);
//! let reply = decode(raw_model_text)?;
//! let report = questions.merge(reply.patches());
//! ```

pub mod cli;
pub mod decode;
pub mod export;
pub mod question;
pub mod reconcile;
pub mod transcript;

pub use decode::{DecodeError, DecodedReply, decode};
pub use export::Export;
pub use question::{Question, QuestionError, QuestionStatus, parse_template};
pub use reconcile::{CompletionWarning, MergeReport, Progress, QuestionList};
pub use transcript::{Role, Transcript, Turn};
