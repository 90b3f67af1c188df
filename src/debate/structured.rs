//! Structured output extraction from raw debater text.
//!
//! Models are asked for a JSON object of the shape
//! `{"speaker": "...", "new_perspectives": [{"id": "...", "contents": "..."}],
//! "counterpoints": [{"id": "...", "contents": "..."}]}` but routinely wrap it
//! in prose or markdown fences, drop fields, or return empty arrays. Parsing
//! never fails with an error: anything without usable content is
//! [`ParsedOutput::Unparseable`].

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuredOutput {
    pub speaker: String,
    pub new_perspectives: Vec<String>,
    pub counterpoints: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "output", rename_all = "snake_case")]
pub enum ParsedOutput {
    Structured(StructuredOutput),
    Unparseable,
}

impl ParsedOutput {
    pub fn structured(&self) -> Option<&StructuredOutput> {
        match self {
            Self::Structured(output) => Some(output),
            Self::Unparseable => None,
        }
    }

    pub fn is_structured(&self) -> bool {
        matches!(self, Self::Structured(_))
    }
}

fn parse_object(text: &str) -> Option<Map<String, Value>> {
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(map)) => Some(map),
        _ => None,
    }
}

/// Slice from the first `{` to the last `}` inclusive.
fn braced_region(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

fn collect_contents(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item.get("contents").and_then(Value::as_str))
                .map(str::trim)
                .filter(|contents| !contents.is_empty())
                .map(String::from)
                .collect()
        })
        .unwrap_or_default()
}

/// Parse raw model text into a [`ParsedOutput`].
///
/// `fallback_speaker` is used when the object has no non-empty `speaker`.
pub fn parse(raw: &str, fallback_speaker: &str) -> ParsedOutput {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return ParsedOutput::Unparseable;
    }

    let Some(object) = parse_object(trimmed).or_else(|| braced_region(trimmed).and_then(parse_object))
    else {
        return ParsedOutput::Unparseable;
    };

    let new_perspectives = collect_contents(object.get("new_perspectives"));
    let counterpoints = collect_contents(object.get("counterpoints"));
    if new_perspectives.is_empty() && counterpoints.is_empty() {
        return ParsedOutput::Unparseable;
    }

    let speaker = object
        .get("speaker")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(fallback_speaker)
        .to_string();

    ParsedOutput::Structured(StructuredOutput {
        speaker,
        new_perspectives,
        counterpoints,
    })
}
