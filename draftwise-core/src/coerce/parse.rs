//! Parsing and best-effort repair of raw model output.

use crate::record::StructuredRecord;

/// Parse text that should be exactly one JSON object.
pub fn parse_object(text: &str) -> Result<StructuredRecord, serde_json::Error> {
    serde_json::from_str::<StructuredRecord>(text)
}

/// Best-effort recovery of a JSON object from noisy text.
///
/// Line breaks are collapsed to spaces (models often emit raw newlines inside
/// string values), then the first complete object found at any `{` is
/// returned. Braces inside string literals are handled by the JSON tokenizer.
///
/// This can still pick the wrong object: if the outer object is truncated, the
/// first nested object that does parse is returned instead.
pub fn repair(text: &str) -> Option<StructuredRecord> {
    let collapsed: String = text
        .chars()
        .map(|c| if c == '\n' || c == '\r' { ' ' } else { c })
        .collect();
    first_object(&collapsed)
}

/// Find the first position where a complete JSON object starts.
pub fn first_object(text: &str) -> Option<StructuredRecord> {
    text.match_indices('{').find_map(|(start, _)| {
        serde_json::Deserializer::from_str(&text[start..])
            .into_iter::<StructuredRecord>()
            .next()
            .and_then(Result::ok)
    })
}

/// Shorten an error message for diagnostics.
pub(crate) fn truncate(message: &str, max_chars: usize) -> String {
    match message.char_indices().nth(max_chars) {
        Some((idx, _)) => message[..idx].to_string(),
        None => message.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_object_accepts_only_objects() {
        assert!(parse_object(r#"{"a": 1}"#).is_ok());
        assert!(parse_object("[1, 2]").is_err());
        assert!(parse_object("\"text\"").is_err());
        assert!(parse_object("42").is_err());
        assert!(parse_object("").is_err());
        assert!(parse_object(r#"{"a": 1} trailing"#).is_err());
    }

    #[test]
    fn test_repair_strips_markdown_fence() {
        let record = repair("```json{\"a\":1}```").unwrap();
        assert_eq!(serde_json::Value::Object(record), json!({"a": 1}));
    }

    #[test]
    fn test_repair_skips_leading_prose() {
        let text = "Sure! Here is the analysis:\n{\"database_type\": \"PostgreSQL\"}\nLet me know.";
        let record = repair(text).unwrap();
        assert_eq!(record["database_type"], "PostgreSQL");
    }

    #[test]
    fn test_repair_collapses_raw_newlines_inside_strings() {
        let text = "{\"executive_summary\": \"line one\nline two\"}";
        assert!(parse_object(text).is_err());

        let record = repair(text).unwrap();
        assert_eq!(record["executive_summary"], "line one line two");
    }

    #[test]
    fn test_repair_handles_braces_inside_strings() {
        let text = r#"note {"pattern": "{not a brace}", "nested": {"deep": {"deeper": [1]}}}"#;
        let record = repair(text).unwrap();
        assert_eq!(record["pattern"], "{not a brace}");
        assert_eq!(record["nested"]["deep"]["deeper"][0], 1);
    }

    #[test]
    fn test_repair_falls_back_to_nested_object_when_outer_is_truncated() {
        let text = r#"{"services": [{"name": "API"}], "deployment_model": "#;
        let record = repair(text).unwrap();
        assert_eq!(serde_json::Value::Object(record), json!({"name": "API"}));
    }

    #[test]
    fn test_repair_gives_up_on_garbage() {
        assert!(repair("").is_none());
        assert!(repair("no json here at all").is_none());
        assert!(repair("{{{{{{{{").is_none());
        assert!(repair("{\"a\": ").is_none());
        assert!(repair("[1, 2, 3]").is_none());
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        assert_eq!(truncate("héllo", 2), "hé");
        assert_eq!(truncate("short", 100), "short");
    }
}
