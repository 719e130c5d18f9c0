/*!
 * Tests for extracting the JSON payload from model responses
 */

use heritage_translator::translation::extract::{candidate_text, extract_payload, ExtractedPayload};

/// Test realistic chatty answer with a tagged fence
#[test]
fn test_extract_payload_withChattyFencedAnswer_shouldParseFields() {
    let text = "Here is the translation you asked for:\n\n```json\n{\n  \"name_en\": \"Sungnyemun Gate\",\n  \"content_en\": \"A Joseon-era gate in Jung-gu, Seoul.\"\n}\n```\n\nLet me know if you need anything else.";

    let payload = extract_payload(text);
    assert_eq!(payload.field("name_en"), Some("Sungnyemun Gate"));
    assert_eq!(payload.field("content_en"), Some("A Joseon-era gate in Jung-gu, Seoul."));
}

/// Test non-string fields are not accepted as text
#[test]
fn test_extract_payload_withNonStringField_shouldReturnNone() {
    let payload = extract_payload(r#"{"name_en": 12, "content_en": "ok"}"#);
    assert!(matches!(payload, ExtractedPayload::Parsed(_)));
    assert_eq!(payload.field("name_en"), None);
    assert_eq!(payload.field("content_en"), Some("ok"));
}

/// Test the tagged fence wins over an earlier untagged one
#[test]
fn test_candidate_text_withBothFenceKinds_shouldPreferJsonFence() {
    let text = "```\nnot this\n```\n```json\n{\"a\": \"b\"}\n```";
    assert_eq!(candidate_text(text), "{\"a\": \"b\"}");
}

/// Test plain prose falls through to raw text
#[test]
fn test_extract_payload_withProse_shouldReturnTrimmedRawText() {
    let payload = extract_payload("  The Great South Gate of Seoul.  \n");
    assert_eq!(payload, ExtractedPayload::Raw("The Great South Gate of Seoul.".to_string()));
    assert_eq!(payload.field("name_en"), None);
}
