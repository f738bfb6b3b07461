use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::error::{ExtractError, Result};
use crate::schema::Record;

static JSON_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<json>(.*?)</json>").expect("valid regex"));
static CODE_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^```[a-zA-Z]*\s*(.*?)\s*```$").expect("valid regex"));

/// Pull the JSON payload out of a model answer.
///
/// Prefers the `<json>` block the prompt asks for and falls back to a fenced
/// code block or the bare content.
pub fn extract_payload(content: &str) -> &str {
    if let Some(inner) = JSON_TAG.captures(content).and_then(|c| c.get(1)) {
        return inner.as_str().trim();
    }

    let trimmed = content.trim();
    match CODE_FENCE.captures(trimmed).and_then(|c| c.get(1)) {
        Some(inner) => inner.as_str(),
        None => trimmed,
    }
}

/// Parse every record the model returned under `schema_id`.
///
/// A missing key yields an empty list; it is up to the caller to decide
/// whether that is a failure.
pub fn parse_records(content: &str, schema_id: &str) -> Result<Vec<Record>> {
    let payload = extract_payload(content);
    let value: Value = serde_json::from_str(payload)
        .map_err(|e| ExtractError::MalformedResponse(format!("invalid JSON: {e}")))?;

    let Value::Object(mut root) = value else {
        return Err(ExtractError::MalformedResponse("expected a JSON object".to_string()));
    };

    match root.remove(schema_id) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Object(record)) => Ok(vec![record]),
        Some(Value::Array(items)) => items
            .into_iter()
            .map(|item| match item {
                Value::Object(record) => Ok(record),
                other => Err(ExtractError::MalformedResponse(format!(
                    "expected an object in `{schema_id}`, got {other}"
                ))),
            })
            .collect(),
        Some(other) => Err(ExtractError::MalformedResponse(format!(
            "expected a list under `{schema_id}`, got {other}"
        ))),
    }
}

/// Only the first record is used; an empty list is its own failure.
pub fn first_record(records: Vec<Record>) -> Result<Record> {
    records.into_iter().next().ok_or(ExtractError::NoRecordExtracted)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tagged_payload() {
        let content = "Here you go:\n<json>{\"estate_schema\": [{\"price\": \"１，６７０万円\", \"floors\": 9}]}</json>";

        let records = parse_records(content, "estate_schema").unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["price"], "１，６７０万円");
        assert_eq!(records[0]["floors"], 9);
    }

    #[test]
    fn test_fenced_and_bare_payloads() {
        let fenced = "```json\n{\"estate_schema\": [{\"area\": \"19.67㎡\"}]}\n```";
        let bare = "  {\"estate_schema\": [{\"area\": \"19.67㎡\"}]}  ";

        assert_eq!(parse_records(fenced, "estate_schema").unwrap()[0]["area"], "19.67㎡");
        assert_eq!(parse_records(bare, "estate_schema").unwrap()[0]["area"], "19.67㎡");
    }

    #[test]
    fn test_field_order_preserved() {
        let content = "<json>{\"estate_schema\": [{\"price\": \"a\", \"area\": \"b\", \"location\": \"c\"}]}</json>";

        let record = first_record(parse_records(content, "estate_schema").unwrap()).unwrap();
        let keys: Vec<&str> = record.keys().map(String::as_str).collect();

        assert_eq!(keys, ["price", "area", "location"]);
    }

    #[test]
    fn test_empty_list_is_no_record() {
        let records = parse_records("<json>{\"estate_schema\": []}</json>", "estate_schema").unwrap();
        assert!(matches!(first_record(records), Err(ExtractError::NoRecordExtracted)));

        let records = parse_records("<json>{}</json>", "estate_schema").unwrap();
        assert!(matches!(first_record(records), Err(ExtractError::NoRecordExtracted)));
    }

    #[test]
    fn test_malformed_json() {
        let err = parse_records("<json>{\"estate_schema\": [</json>", "estate_schema").unwrap_err();
        assert!(matches!(err, ExtractError::MalformedResponse(_)));

        let err = parse_records("I could not find any listing.", "estate_schema").unwrap_err();
        assert!(matches!(err, ExtractError::MalformedResponse(_)));
    }

    #[test]
    fn test_wrong_shapes() {
        let err = parse_records("[1, 2]", "estate_schema").unwrap_err();
        assert!(matches!(err, ExtractError::MalformedResponse(_)));

        let err = parse_records("{\"estate_schema\": [\"price\"]}", "estate_schema").unwrap_err();
        assert!(matches!(err, ExtractError::MalformedResponse(_)));

        let err = parse_records("{\"estate_schema\": 3}", "estate_schema").unwrap_err();
        assert!(matches!(err, ExtractError::MalformedResponse(_)));
    }

    #[test]
    fn test_single_object_is_one_record() {
        let records = parse_records("{\"estate_schema\": {\"price\": \"x\"}}", "estate_schema").unwrap();
        assert_eq!(records.len(), 1);
    }
}
