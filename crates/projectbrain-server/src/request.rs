//! Locating the user's text in a loosely-shaped request body
//!
//! `message` is the canonical key. Older clients sent the text under other
//! names; those are still accepted, in a fixed priority order, so the contract
//! stays explicit.

use serde_json::Value;
use tracing::debug;

/// Keys searched for a chat question, highest priority first
pub const CHAT_MESSAGE_KEYS: &[&str] = &["message", "Msg", "query", "question"];

/// Keys searched for an extraction instruction, highest priority first
pub const EXTRACT_MESSAGE_KEYS: &[&str] = &["message", "Cmd", "instruction", "query"];

/// Return the first non-blank string stored under one of `keys`
///
/// Non-object bodies, non-string values and whitespace-only strings are
/// skipped.
pub fn lookup_message<'a>(body: &'a Value, keys: &[&str]) -> Option<&'a str> {
    let obj = body.as_object()?;
    for key in keys {
        let Some(text) = obj.get(*key).and_then(Value::as_str) else {
            continue;
        };
        if text.trim().is_empty() {
            continue;
        }
        if keys.first() != Some(key) {
            debug!(key = *key, "Request used a legacy message key");
        }
        return Some(text);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_canonical_key() {
        let body = json!({"message": "Generate a door schedule"});
        assert_eq!(
            lookup_message(&body, EXTRACT_MESSAGE_KEYS),
            Some("Generate a door schedule")
        );
    }

    #[test]
    fn test_alias_priority() {
        let body = json!({"question": "q", "query": "second", "Msg": "first"});
        assert_eq!(lookup_message(&body, CHAT_MESSAGE_KEYS), Some("first"));
    }

    #[test]
    fn test_blank_values_are_skipped() {
        let body = json!({"message": "  ", "query": "fallback"});
        assert_eq!(lookup_message(&body, CHAT_MESSAGE_KEYS), Some("fallback"));
    }

    #[test]
    fn test_non_string_values_are_skipped() {
        let body = json!({"message": 42, "instruction": "extract"});
        assert_eq!(lookup_message(&body, EXTRACT_MESSAGE_KEYS), Some("extract"));
    }

    #[test]
    fn test_keys_are_endpoint_specific() {
        let body = json!({"Cmd": "extract doors"});
        assert_eq!(lookup_message(&body, CHAT_MESSAGE_KEYS), None);
        assert_eq!(lookup_message(&body, EXTRACT_MESSAGE_KEYS), Some("extract doors"));
    }

    #[test]
    fn test_non_object_body() {
        assert_eq!(lookup_message(&json!(["message"]), CHAT_MESSAGE_KEYS), None);
        assert_eq!(lookup_message(&json!("message"), CHAT_MESSAGE_KEYS), None);
    }
}
