//! Parse model output into `{reviewId, topic}` pairs.
//!
//! Models wrap JSON in code fences or add a sentence around it often enough
//! that the raw text is cleaned before parsing.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use tracing::warn;

use trendsage_core::{Error, RawExtraction, Result};

static CODE_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)```(?:json|JSON)?\s*(.*?)```").unwrap());

/// Parse a completion into extractions.
///
/// Accepts a bare JSON list, a fenced one, a list embedded in prose, a
/// single object, or an object wrapping the list under some key. Items
/// without a `topic` keep an empty topic; non-object items are dropped.
pub fn parse_extractions(text: &str) -> Result<Vec<RawExtraction>> {
    let value = parse_json_payload(text)?;
    let items = match value {
        Value::Array(items) => items,
        Value::Object(map) if map.contains_key("topic") => vec![Value::Object(map)],
        Value::Object(map) => map
            .into_iter()
            .find_map(|(_, v)| match v {
                Value::Array(items) => Some(items),
                _ => None,
            })
            .ok_or_else(|| Error::Extraction("response object contains no list".into()))?,
        other => {
            return Err(Error::Extraction(format!(
                "expected a JSON list, got {}",
                type_name(&other)
            )))
        }
    };

    let mut extractions = Vec::with_capacity(items.len());
    for item in items {
        match item_to_extraction(&item) {
            Some(extraction) => extractions.push(extraction),
            None => warn!("Skipping malformed extraction item: {}", item),
        }
    }
    Ok(extractions)
}

fn parse_json_payload(text: &str) -> Result<Value> {
    let cleaned = CODE_FENCE
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
        .unwrap_or(text)
        .trim();

    if let Ok(value) = serde_json::from_str(cleaned) {
        return Ok(value);
    }

    // Fall back to the outermost list inside surrounding prose.
    if let (Some(start), Some(end)) = (cleaned.find('['), cleaned.rfind(']')) {
        if start < end {
            if let Ok(value) = serde_json::from_str(&cleaned[start..=end]) {
                return Ok(value);
            }
        }
    }

    Err(Error::Extraction(format!(
        "could not parse model output as JSON: {}",
        truncate(cleaned, 200)
    )))
}

fn item_to_extraction(item: &Value) -> Option<RawExtraction> {
    let obj = item.as_object()?;
    let review_id = match obj.get("reviewId").or_else(|| obj.get("review_id")) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    };
    let topic = obj
        .get("topic")
        .and_then(Value::as_str)
        .map(|s| s.trim().to_string())
        .unwrap_or_default();
    Some(RawExtraction { review_id, topic })
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}

fn truncate(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &s[..idx]),
        None => s.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_list() {
        let out = parse_extractions(
            r#"[{"reviewId": "r1", "topic": "app crashes on login"}, {"reviewId": "r3", "topic": "great delivery speed"}]"#,
        )
        .unwrap();
        assert_eq!(
            out,
            vec![
                RawExtraction::new("r1", "app crashes on login"),
                RawExtraction::new("r3", "great delivery speed"),
            ]
        );
    }

    #[test]
    fn test_fenced_list() {
        let text = "Here you go:\n```json\n[{\"reviewId\": \"r1\", \"topic\": \"refund delay\"}]\n```";
        let out = parse_extractions(text).unwrap();
        assert_eq!(out, vec![RawExtraction::new("r1", "refund delay")]);
    }

    #[test]
    fn test_list_in_prose() {
        let text = "Sure! [{\"reviewId\": \"r2\", \"topic\": \"late order\"}] Let me know.";
        assert_eq!(parse_extractions(text).unwrap().len(), 1);
    }

    #[test]
    fn test_wrapped_object() {
        let text = r#"{"results": [{"reviewId": "r1", "topic": "coupon not applied"}]}"#;
        assert_eq!(
            parse_extractions(text).unwrap(),
            vec![RawExtraction::new("r1", "coupon not applied")]
        );
    }

    #[test]
    fn test_single_object() {
        let text = r#"{"reviewId": 42, "topic": "  app freezes  "}"#;
        assert_eq!(parse_extractions(text).unwrap(), vec![RawExtraction::new("42", "app freezes")]);
    }

    #[test]
    fn test_missing_topic_is_empty() {
        let text = r#"[{"reviewId": "r1"}, {"reviewId": "r2", "topic": null}, "junk"]"#;
        let out = parse_extractions(text).unwrap();
        assert_eq!(out.len(), 2);
        assert!(out.iter().all(|e| !e.has_topic()));
    }

    #[test]
    fn test_empty_list() {
        assert!(parse_extractions("[]").unwrap().is_empty());
    }

    #[test]
    fn test_garbage_is_error() {
        assert!(matches!(parse_extractions("no topics today"), Err(Error::Extraction(_))));
        assert!(matches!(parse_extractions("\"just a string\""), Err(Error::Extraction(_))));
    }
}
