//! Parse-and-validate for labels returned by classification calls.
//!
//! Models answer in free text. A reply is accepted only if it reduces to one
//! of the closed label sets below; anything else is an error the calling
//! stage handles with its own fallback.

use crate::state::QueryType;
use taxgpt_core::{AppError, AppResult};

/// Binary relevance verdict from the grader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relevance {
    Yes,
    No,
}

/// JSON keys a model may wrap its label in.
const LABEL_KEYS: &[&str] = &["binary_score", "label", "category", "score", "answer"];

/// Parse a classifier reply into a [`QueryType`].
pub fn parse_query_type(raw: &str) -> AppResult<QueryType> {
    let label = normalize(raw);
    match label.replace([' ', '_', '-'], "").as_str() {
        "related" => Ok(QueryType::Related),
        "illegal" => Ok(QueryType::Illegal),
        "notrelated" | "nottaxrelated" | "nontaxrelated" => Ok(QueryType::NotRelated),
        _ => Err(unrecognized("classification", raw)),
    }
}

/// Parse a grader reply into a [`Relevance`].
pub fn parse_relevance(raw: &str) -> AppResult<Relevance> {
    match normalize(raw).as_str() {
        "yes" => Ok(Relevance::Yes),
        "no" => Ok(Relevance::No),
        _ => Err(unrecognized("relevance grade", raw)),
    }
}

/// Reduce a reply to a bare lowercase label.
fn normalize(raw: &str) -> String {
    let text = extract_json_label(raw).unwrap_or_else(|| raw.to_string());
    text.trim()
        .trim_matches(|c: char| c == '"' || c == '\'' || c == '`' || c == '.' || c == '*')
        .trim()
        .to_lowercase()
}

/// Pull a label out of a JSON object reply such as `{"binary_score": "Yes"}`.
fn extract_json_label(raw: &str) -> Option<String> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    if start >= end {
        return None;
    }

    let value: serde_json::Value = serde_json::from_str(&raw[start..=end]).ok()?;
    LABEL_KEYS
        .iter()
        .find_map(|key| value.get(*key).and_then(|v| v.as_str()))
        .map(str::to_string)
}

fn unrecognized(kind: &str, raw: &str) -> AppError {
    let shown: String = raw.chars().take(80).collect();
    AppError::Llm(format!("Unrecognized {} output: {:?}", kind, shown))
}
