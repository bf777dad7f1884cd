//! Pull a JSON array of records out of free-form LLM output
//!
//! Models asked for "ONLY valid JSON" still wrap the array in commentary or
//! markdown fences. `extract_array` finds the array, parses it, and normalizes
//! every element through a [`FieldSchema`]. It is total: any input string
//! yields an [`ExtractionResult`], never an error or a panic.
//!
//! Locating the array is a heuristic. The whole text is tried first; failing
//! that, the slice from the first `[` to the last `]`. A `]` inside a string
//! value followed by trailing commentary that contains another `]` defeats the
//! slice; such input ends up as a parse-failure warning.

use projectbrain_domain::{ExtractedRecord, ExtractionResult, FieldSchema};
use serde_json::{Map, Value};
use tracing::{debug, warn};

/// Characters of raw text quoted in a parse-failure warning
pub const WARNING_EXCERPT_CHARS: usize = 200;

/// Extract and normalize the JSON array embedded in `text`
///
/// # Examples
///
/// ```
/// use projectbrain_domain::FieldSchema;
/// use projectbrain_extractor::extract_array;
///
/// let text = r#"Sure, here you go: [{"mark":"D1","frame_type":"Hollow Metal"}] Thanks!"#;
/// let result = extract_array(text, &FieldSchema::door_schedule());
///
/// assert!(result.is_clean());
/// assert_eq!(result.records()[0].get("mark"), Some("D1"));
/// assert_eq!(result.records()[0].get("size"), Some(""));
/// ```
pub fn extract_array(text: &str, schema: &FieldSchema) -> ExtractionResult {
    let items = match locate_array(text) {
        Some(Value::Array(items)) => items,
        Some(other) => {
            warn!(kind = json_kind(&other), "LLM output is JSON but not an array");
            return parse_failure(text);
        }
        None => {
            warn!(len = text.len(), "LLM output contains no parseable JSON");
            return parse_failure(text);
        }
    };

    let mut records = Vec::with_capacity(items.len());
    let mut warnings = Vec::new();

    for (idx, item) in items.into_iter().enumerate() {
        match item {
            Value::Object(obj) => records.push(normalize_record(obj, schema)),
            other => {
                let reason = format!(
                    "element {} dropped: expected an object, found {}",
                    idx,
                    json_kind(&other)
                );
                warn!("{}", reason);
                warnings.push(reason);
            }
        }
    }

    debug!(
        records = records.len(),
        dropped = warnings.len(),
        "Extracted records"
    );

    ExtractionResult::new(records, warnings)
}

/// Parse the most plausible JSON value out of `text`
///
/// A whole-text parse that yields an array wins outright. Otherwise the
/// bracket slice is tried, and a non-array whole-text value is the last resort
/// so callers can report it.
fn locate_array(text: &str) -> Option<Value> {
    let trimmed = text.trim();
    let whole = serde_json::from_str::<Value>(trimmed).ok();
    if let Some(Value::Array(_)) = whole {
        return whole;
    }

    bracket_slice(trimmed)
        .and_then(|slice| serde_json::from_str::<Value>(slice).ok())
        .or(whole)
}

/// Inclusive slice from the first `[` to the last `]`, if both exist in order
fn bracket_slice(text: &str) -> Option<&str> {
    let start = text.find('[')?;
    let end = text.rfind(']')?;
    if end < start {
        return None;
    }
    // Both delimiters are ASCII, so these are char boundaries
    Some(&text[start..=end])
}

/// Map one JSON object onto the schema
///
/// Declared fields are taken out of the object and stringified; whatever is
/// left over is carried along untouched.
fn normalize_record(mut obj: Map<String, Value>, schema: &FieldSchema) -> ExtractedRecord {
    let fields = schema
        .iter()
        .map(|spec| {
            let value = match obj.remove(&spec.name) {
                None | Some(Value::Null) => spec.default.clone(),
                Some(Value::String(s)) => s,
                Some(other) => other.to_string(),
            };
            (spec.name.clone(), value)
        })
        .collect();

    ExtractedRecord::from_parts(fields, obj)
}

fn parse_failure(text: &str) -> ExtractionResult {
    ExtractionResult::failed(format!("parse failure: {}", excerpt(text)))
}

/// First [`WARNING_EXCERPT_CHARS`] characters of `text`, marked when cut
fn excerpt(text: &str) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(WARNING_EXCERPT_CHARS).collect();
    if chars.next().is_some() {
        format!("{}...", head)
    } else {
        head
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn record_strategy() -> impl Strategy<Value = Vec<(String, String)>> {
        proptest::collection::vec(".{0,12}", 5).prop_map(|values| {
            FieldSchema::door_schedule()
                .names()
                .map(str::to_string)
                .zip(values)
                .collect()
        })
    }

    proptest! {
        /// Property: extraction never panics and always yields a well-formed result
        #[test]
        fn test_total_over_any_string(text in any::<String>()) {
            let result = extract_array(&text, &FieldSchema::door_schedule());
            prop_assert!(result.records().is_empty() || result.records().iter().all(|r| r.fields().len() == 5));
        }

        /// Property: bracket-heavy noise never panics
        #[test]
        fn test_total_over_bracket_noise(text in "[\\[\\]{}\",:a-z0-9 ]{0,64}") {
            let _ = extract_array(&text, &FieldSchema::door_schedule());
        }

        /// Property: text without brackets that is not JSON yields a warning and no records
        #[test]
        fn test_no_brackets_yields_warning(text in "[a-zA-Z ,.!?]{0,80}") {
            prop_assume!(serde_json::from_str::<Value>(text.trim()).is_err());
            let result = extract_array(&text, &FieldSchema::door_schedule());
            prop_assert!(result.records().is_empty());
            prop_assert!(!result.warnings().is_empty());
        }

        /// Property: serialized schema-conforming records round-trip unchanged
        #[test]
        fn test_round_trip(rows in proptest::collection::vec(record_strategy(), 0..6)) {
            let originals: Vec<ExtractedRecord> = rows
                .into_iter()
                .map(|fields| ExtractedRecord::from_parts(fields, Map::new()))
                .collect();
            let text = serde_json::to_string(&originals).unwrap();

            let result = extract_array(&format!("Here you go:\n{}\nDone.", text), &FieldSchema::door_schedule());
            prop_assert!(result.is_clean());
            prop_assert_eq!(result.records(), originals.as_slice());
        }
    }
}
