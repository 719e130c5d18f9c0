/*!
 * Extracting the structured payload from free-form model text.
 *
 * Models asked for strict JSON still wrap it in Markdown fences or add
 * chatter around it. The fallback chain is:
 * 1. the body of a ```` ```json ```` fence,
 * 2. the body of any other ```` ``` ```` fence,
 * 3. the whole (trimmed) text.
 * The chosen candidate must parse as a JSON object; otherwise the candidate
 * text itself is returned for the raw-text fallback.
 */

use serde_json::{Map, Value};

/// Result of payload extraction
#[derive(Debug, Clone, PartialEq)]
pub enum ExtractedPayload {
    /// The candidate parsed as a JSON object
    Parsed(Map<String, Value>),
    /// The candidate text, fences stripped, that did not parse
    Raw(String),
}

impl ExtractedPayload {
    /// String field of a parsed payload
    pub fn field(&self, name: &str) -> Option<&str> {
        match self {
            Self::Parsed(map) => map.get(name).and_then(Value::as_str),
            Self::Raw(_) => None,
        }
    }
}

/// Body of the first fence opened by `opener`, up to the next closing fence
fn fenced_body<'a>(text: &'a str, opener: &str) -> Option<&'a str> {
    let start = text.find(opener)? + opener.len();
    let after = &text[start..];
    let body = match after.find("```") {
        Some(end) => &after[..end],
        None => after,
    };
    Some(body.trim())
}

/// Pick the text most likely to hold the payload
pub fn candidate_text(text: &str) -> &str {
    let text = text.trim();
    fenced_body(text, "```json")
        .or_else(|| fenced_body(text, "```"))
        .unwrap_or(text)
}

/// Run the fallback chain on a model response
pub fn extract_payload(text: &str) -> ExtractedPayload {
    let candidate = candidate_text(text);
    match serde_json::from_str::<Value>(candidate) {
        Ok(Value::Object(map)) => ExtractedPayload::Parsed(map),
        _ => ExtractedPayload::Raw(candidate.to_string()),
    }
}
