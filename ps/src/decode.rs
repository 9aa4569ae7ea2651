//! Response decoder
//!
//! Turns the raw text of one model response into a [`DecodedReply`]. Hosted
//! models don't always return valid JSON even when asked to, so decoding is a
//! ladder of attempts, tried in order until one succeeds:
//!
//! 1. direct parse of the normalized text
//! 2. the first balanced `{ ... }` block inside the text
//! 3. the same block with raw CR/LF characters escaped
//! 4. regex salvage of just the `"answer"` string
//!
//! Salvage deliberately drops everything but the answer: a partially parsed
//! patch list would be worse than none.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, warn};

/// Number of characters kept from each end of the input in a [`DecodeError`]
pub const EXCERPT_CHARS: usize = 200;

static ANSWER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)"answer"\s*:\s*"((?:[^"\\]|\\.)*)""#).expect("answer salvage regex is valid")
});

/// The model output could not be interpreted at all
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("Could not parse model response. Length: {len} chars. First 200 chars: {head}... Last 200 chars: ...{tail}")]
    Unrecoverable { len: usize, head: String, tail: String },
}

impl DecodeError {
    fn unrecoverable(raw: &str) -> Self {
        let len = raw.chars().count();
        let head: String = raw.chars().take(EXCERPT_CHARS).collect();
        let tail: String = raw.chars().skip(len.saturating_sub(EXCERPT_CHARS)).collect();
        DecodeError::Unrecoverable { len, head, tail }
    }
}

/// Structured interpretation of one model response
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DecodedReply {
    /// Text to show the parent
    pub answer: String,

    /// Replacement objects for questions, matched by id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_questions: Option<Vec<Value>>,

    /// Alternate key some responses use for the patch list
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question_list: Option<Vec<Value>>,

    /// Formal summary of the current answer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,

    /// Structured values for the current question's summary template
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fields: Option<Map<String, Value>>,
}

impl DecodedReply {
    /// Reply carrying only an answer
    pub fn answer_only(answer: impl Into<String>) -> Self {
        Self {
            answer: answer.into(),
            ..Default::default()
        }
    }

    /// The patch list, preferring `updated_questions` over `question_list`
    pub fn patches(&self) -> Option<&[Value]> {
        match self.updated_questions.as_deref() {
            Some(patches) if !patches.is_empty() => Some(patches),
            _ => self.question_list.as_deref(),
        }
    }

    /// Id of the first patch, if it has one
    pub fn first_patch_id(&self) -> Option<&str> {
        self.patches()?.first()?.get("id")?.as_str()
    }
}

type Attempt = fn(&str) -> Option<DecodedReply>;

const LADDER: [(&str, Attempt); 4] = [
    ("direct", parse_direct),
    ("balanced", parse_balanced),
    ("escaped-newlines", parse_balanced_escaped),
    ("salvage", salvage_answer),
];

/// Decode raw model output
///
/// Empty input decodes to an empty reply.
pub fn decode(raw: &str) -> Result<DecodedReply, DecodeError> {
    debug!(raw_len = raw.len(), "decode: called");
    let text = normalize(raw);
    if text.is_empty() {
        debug!("decode: empty input");
        return Ok(DecodedReply::default());
    }

    for (step, attempt) in LADDER {
        if let Some(reply) = attempt(&text) {
            debug!(%step, "decode: succeeded");
            if step == "salvage" {
                warn!(answer_len = reply.answer.len(), "decode: structured parse failed, salvaged answer only");
            }
            return Ok(reply);
        }
        debug!(%step, "decode: step failed");
    }

    warn!(raw_len = raw.len(), "decode: unrecoverable model output");
    Err(DecodeError::unrecoverable(raw))
}

/// Strip BOM, trim, and replace typographic quotes
pub fn normalize(raw: &str) -> String {
    raw.trim_start_matches('\u{feff}')
        .trim()
        .replace(['\u{201c}', '\u{201d}'], "\"")
        .replace(['\u{2018}', '\u{2019}'], "'")
}

/// The substring from the first `{` to where brace depth returns to zero
///
/// Braces inside string literals are counted too; a reply whose strings hold
/// unbalanced braces falls through to salvage.
pub fn extract_balanced(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    for (offset, ch) in text[start..].char_indices() {
        match ch {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Build a reply from any JSON object
///
/// Only the top-level text has to parse. Each field is then taken on its own;
/// a field of the wrong type is dropped and never costs the rest of the reply.
fn reply_from_json(text: &str) -> Option<DecodedReply> {
    let value: Value = serde_json::from_str(text).ok()?;
    let Value::Object(mut obj) = value else {
        debug!("reply_from_json: not an object");
        return None;
    };

    let answer = match obj.remove("answer") {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(answer)) => answer,
        Some(other) => {
            warn!(kind = kind(&other), "reply_from_json: answer is not a string, ignoring");
            String::new()
        }
    };

    Some(DecodedReply {
        answer,
        updated_questions: take_array(&mut obj, "updated_questions"),
        question_list: take_array(&mut obj, "question_list"),
        summary: match obj.remove("summary") {
            None | Some(Value::Null) => None,
            Some(Value::String(summary)) => Some(summary),
            Some(other) => {
                warn!(kind = kind(&other), "reply_from_json: summary is not a string, ignoring");
                None
            }
        },
        fields: match obj.remove("fields") {
            None | Some(Value::Null) => None,
            Some(Value::Object(fields)) => Some(fields),
            Some(other) => {
                warn!(kind = kind(&other), "reply_from_json: fields is not an object, ignoring");
                None
            }
        },
    })
}

fn take_array(obj: &mut Map<String, Value>, key: &str) -> Option<Vec<Value>> {
    match obj.remove(key)? {
        Value::Array(items) => Some(items),
        Value::Null => None,
        other => {
            warn!(%key, kind = kind(&other), "reply_from_json: patch list is not an array, ignoring");
            None
        }
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn parse_direct(text: &str) -> Option<DecodedReply> {
    reply_from_json(text)
}

fn parse_balanced(text: &str) -> Option<DecodedReply> {
    reply_from_json(extract_balanced(text)?)
}

fn parse_balanced_escaped(text: &str) -> Option<DecodedReply> {
    let core = extract_balanced(text)?;
    reply_from_json(&core.replace('\r', "\\r").replace('\n', "\\n"))
}

fn salvage_answer(text: &str) -> Option<DecodedReply> {
    let caps = ANSWER_RE.captures(text)?;
    Some(DecodedReply::answer_only(unescape(&caps[1])))
}

/// Undo JSON string escapes in one left-to-right pass
///
/// Unknown escapes are kept verbatim.
fn unescape(escaped: &str) -> String {
    let mut out = String::with_capacity(escaped.len());
    let mut chars = escaped.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some(c @ ('"' | '\\' | '/')) => out.push(c),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn test_direct_parse() {
        let raw = r#"{"answer":"Hallo","updated_questions":[{"id":"q1","status":"completed"}],"summary":"S"}"#;
        let reply = decode(raw).unwrap();
        assert_eq!(reply.answer, "Hallo");
        assert_eq!(reply.summary.as_deref(), Some("S"));
        assert_eq!(reply.patches().unwrap()[0]["id"], "q1");
    }

    #[test]
    fn test_round_trip_through_direct_parse() {
        let mut fields = Map::new();
        fields.insert("naam".to_string(), json!("Sam"));
        let reply = DecodedReply {
            answer: "Dank je.\nVolgende vraag?".to_string(),
            updated_questions: Some(vec![json!({"id": "q1", "position": 1, "status": "completed"})]),
            question_list: None,
            summary: Some(String::new()),
            fields: Some(fields),
        };
        let text = serde_json::to_string(&reply).unwrap();
        assert_eq!(decode(&text).unwrap(), reply);
    }

    #[test]
    fn test_balanced_extraction_from_prose() {
        let raw = r#"prose... {"answer":"hi"} trailing"#;
        assert_eq!(extract_balanced(raw), Some(r#"{"answer":"hi"}"#));
        assert_eq!(decode(raw).unwrap(), DecodedReply::answer_only("hi"));
    }

    #[test]
    fn test_extract_balanced_nested_and_unterminated() {
        assert_eq!(extract_balanced(r#"x {"a":{"b":1}} {"c":2}"#), Some(r#"{"a":{"b":1}}"#));
        assert_eq!(extract_balanced(r#"{"a":{"b":1}"#), None);
        assert_eq!(extract_balanced("no braces"), None);
    }

    #[test]
    fn test_raw_newline_inside_string() {
        let raw = "{\"answer\":\"line1\nline2\"}";
        assert!(serde_json::from_str::<Value>(raw).is_err());
        let reply = decode(raw).unwrap();
        assert_eq!(reply.answer, "line1\nline2");
    }

    #[test]
    fn test_raw_crlf_inside_string_with_prose() {
        let raw = "Here you go:\n{\"answer\":\"a\r\nb\",\"summary\":\"s\"}";
        let reply = decode(raw).unwrap();
        assert_eq!(reply.answer, "a\r\nb");
        assert_eq!(reply.summary.as_deref(), Some("s"));
    }

    #[test]
    fn test_plain_text_fails() {
        let err = decode("Sorry, I cannot help with that.").unwrap_err();
        let DecodeError::Unrecoverable { len, head, tail } = err;
        assert_eq!(len, 31);
        assert_eq!(head, "Sorry, I cannot help with that.");
        assert_eq!(tail, head);
    }

    #[test]
    fn test_error_excerpts_are_bounded() {
        let raw = format!("{}{}", "a".repeat(300), "b".repeat(300));
        let DecodeError::Unrecoverable { len, head, tail } = decode(&raw).unwrap_err();
        assert_eq!(len, 600);
        assert_eq!(head, "a".repeat(200));
        assert_eq!(tail, "b".repeat(200));
    }

    #[test]
    fn test_salvage_answer_from_truncated_output() {
        let raw = r#"{"answer": "ok", "updated_questions": [{"id": "q1", "status": "compl"#;
        let reply = decode(raw).unwrap();
        assert_eq!(reply, DecodedReply::answer_only("ok"));
        assert!(reply.patches().is_none());
    }

    #[test]
    fn test_salvage_in_plain_text() {
        let reply = decode(r#"the model said "answer": "ok" and stopped"#).unwrap();
        assert_eq!(reply.answer, "ok");
    }

    #[test]
    fn test_salvage_unescapes_quotes() {
        let raw = r#"{"answer": "Hij zei \"ja\" tegen mij", "updated_questions": [ {"#;
        assert_eq!(decode(raw).unwrap().answer, "Hij zei \"ja\" tegen mij");
    }

    #[test]
    fn test_typographic_quotes_and_bom() {
        let raw = "\u{feff}  {\u{201c}answer\u{201d}: \u{201c}Goed zo\u{201d}}  ";
        assert_eq!(decode(raw).unwrap().answer, "Goed zo");
    }

    #[test]
    fn test_empty_input_is_empty_reply() {
        assert_eq!(decode("").unwrap(), DecodedReply::default());
        assert_eq!(decode("\u{feff}  \n ").unwrap(), DecodedReply::default());
    }

    #[test]
    fn test_non_object_json_is_not_a_reply() {
        assert!(decode(r#"["hi"]"#).is_err());
        assert!(decode("42").is_err());
    }

    #[test]
    fn test_null_answer_and_patches() {
        let reply = decode(r#"{"answer":null,"updated_questions":null}"#).unwrap();
        assert_eq!(reply.answer, "");
        assert!(reply.patches().is_none());
    }

    #[test]
    fn test_mistyped_fields_keep_patches() {
        for fields in [r#"[]"#, r#""n.v.t.""#, "3"] {
            let raw = format!(
                r#"{{"answer":"Dank je","updated_questions":[{{"id":"q1","status":"completed","answer":"Sam"}}],"fields":{fields}}}"#
            );
            let reply = decode(&raw).unwrap();
            assert_eq!(reply.answer, "Dank je", "fields = {fields}");
            assert_eq!(reply.first_patch_id(), Some("q1"), "fields = {fields}");
            assert!(reply.fields.is_none(), "fields = {fields}");
        }
    }

    #[test]
    fn test_mistyped_summary_keeps_patches() {
        let raw = r#"{"answer":"ok","summary":3,"fields":{"naam":"Sam"},"updated_questions":[{"id":"q1"}]}"#;
        let reply = decode(raw).unwrap();
        assert!(reply.summary.is_none());
        assert_eq!(reply.fields.as_ref().unwrap()["naam"], "Sam");
        assert_eq!(reply.first_patch_id(), Some("q1"));
    }

    #[test]
    fn test_mistyped_answer_and_patch_list() {
        let reply = decode(r#"{"answer":{"text":"hi"},"updated_questions":"geen","question_list":[{"id":"q4"}]}"#).unwrap();
        assert_eq!(reply.answer, "");
        assert!(reply.updated_questions.is_none());
        assert_eq!(reply.first_patch_id(), Some("q4"));
    }

    #[test]
    fn test_null_fields_and_summary() {
        let reply = decode(r#"{"answer":"x","summary":null,"fields":null}"#).unwrap();
        assert_eq!(reply, DecodedReply::answer_only("x"));
    }

    #[test]
    fn test_unescape_single_pass() {
        assert_eq!(unescape(r#"a\\nb"#), r#"a\nb"#);
        assert_eq!(unescape(r#"a\nb\"c\"\t"#), "a\nb\"c\"\t");
        assert_eq!(unescape(r#"\q\u00e9\"#), r#"\q\u00e9\"#);
    }

    #[test]
    fn test_salvage_keeps_escaped_backslash() {
        let raw = r#"{"answer": "C:\\new map", "updated_questions": [ {"#;
        assert_eq!(decode(raw).unwrap().answer, r#"C:\new map"#);
    }

    #[test]
    fn test_question_list_alias() {
        let reply = decode(r#"{"answer":"x","updated_questions":[],"question_list":[{"id":"q2"}]}"#).unwrap();
        assert_eq!(reply.first_patch_id(), Some("q2"));
    }

    proptest! {
        #[test]
        fn prop_serialized_reply_decodes_to_itself(answer in "[a-zA-Z0-9 .,!?\u{e9}\u{eb}\"\\\\\\n{}:]{0,80}", summary in proptest::option::of("[a-zA-Z .]{0,40}")) {
            let reply = DecodedReply {
                answer,
                summary,
                ..Default::default()
            };
            let text = serde_json::to_string(&reply).unwrap();
            prop_assert_eq!(decode(&text).unwrap(), reply);
        }

        #[test]
        fn prop_decode_never_panics(raw in "\\PC{0,200}") {
            let _ = decode(&raw);
        }
    }
}
