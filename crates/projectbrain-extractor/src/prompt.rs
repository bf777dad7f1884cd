//! LLM prompts for the chat and extraction flows

use projectbrain_domain::{FieldSchema, RetrievedDocument};
use serde_json::Value;

/// System instruction for grounded chat answers
pub const CHAT_SYSTEM_PROMPT: &str = "Answer based ONLY on context. If unsure, say unknown.";

/// Join retrieved chunk text with blank lines
pub fn build_context(documents: &[RetrievedDocument]) -> String {
    documents
        .iter()
        .map(|d| d.content.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// User turn for a chat answer
pub fn chat_prompt(context: &str, question: &str) -> String {
    format!("Context:\n{}\n\nQuestion:\n{}", context, question)
}

/// Builds the prompt asking the LLM for a JSON array of records
pub struct ExtractionPromptBuilder<'a> {
    requirement: &'a str,
    schema: &'a FieldSchema,
    context: &'a str,
    table_hint: Option<&'a str>,
}

impl<'a> ExtractionPromptBuilder<'a> {
    /// Create a new prompt builder
    pub fn new(requirement: &'a str, schema: &'a FieldSchema, context: &'a str) -> Self {
        Self {
            requirement,
            schema,
            context,
            table_hint: None,
        }
    }

    /// Name the table columns the model should look for
    pub fn with_table_hint(mut self, hint: Option<&'a str>) -> Self {
        self.table_hint = hint;
        self
    }

    /// Build the complete extraction prompt
    pub fn build(&self) -> String {
        let mut prompt = String::new();

        prompt.push_str(&format!(
            "Extract the \"{}\" from the text.\n\n",
            self.requirement
        ));

        if let Some(hint) = self.table_hint {
            prompt.push_str(&format!("Look for a table with columns like: {}.\n\n", hint));
        }

        prompt.push_str(OUTPUT_RULES);
        prompt.push_str("\n\nUse this Schema:\n");
        prompt.push_str(&self.schema_example());
        prompt.push_str("\n\nTEXT:\n");
        prompt.push_str(self.context);
        prompt.push('\n');

        prompt
    }

    /// A one-element JSON array showing every schema field, in schema order
    fn schema_example(&self) -> String {
        let fields: Vec<String> = self
            .schema
            .iter()
            .map(|field| {
                let hint = field.description.as_deref().unwrap_or("...");
                format!(
                    "    {}: {}",
                    Value::String(field.name.clone()),
                    Value::String(hint.to_string())
                )
            })
            .collect();
        format!("[\n  {{\n{}\n  }}\n]", fields.join(",\n"))
    }
}

const OUTPUT_RULES: &str = r#"Return ONLY valid JSON.
Start the response with [ and end with ].
Do NOT write "Here is the JSON"."#;

#[cfg(test)]
mod tests {
    use super::*;
    use projectbrain_domain::FieldSpec;

    #[test]
    fn test_build_context() {
        let docs = vec![
            RetrievedDocument::new("first", "a.pdf", "1"),
            RetrievedDocument::new("second", "b.pdf", "2"),
        ];
        assert_eq!(build_context(&docs), "first\n\nsecond");
        assert_eq!(build_context(&[]), "");
    }

    #[test]
    fn test_chat_prompt_layout() {
        let prompt = chat_prompt("ctx", "Who is the architect?");
        assert_eq!(prompt, "Context:\nctx\n\nQuestion:\nWho is the architect?");
    }

    #[test]
    fn test_extraction_prompt_includes_requirement_and_text() {
        let schema = FieldSchema::door_schedule();
        let prompt = ExtractionPromptBuilder::new("door schedule", &schema, "D1 hollow metal").build();
        assert!(prompt.contains("Extract the \"door schedule\""));
        assert!(prompt.contains("TEXT:\nD1 hollow metal"));
        assert!(prompt.contains("Start the response with ["));
    }

    fn example_block(prompt: &str) -> &str {
        let start = prompt.find("Use this Schema:\n").unwrap() + "Use this Schema:\n".len();
        let end = prompt.find("\n\nTEXT:").unwrap();
        &prompt[start..end]
    }

    #[test]
    fn test_extraction_prompt_lists_schema_fields() {
        let schema = FieldSchema::door_schedule();
        let prompt = ExtractionPromptBuilder::new("doors", &schema, "").build();
        assert!(prompt.contains("\"mark\": \"Door Number (e.g. 1, 2, D-101)\""));
        assert!(prompt.contains("\"notes\": \"Any notes (e.g. AE601 TYP)\""));

        let plain = FieldSchema::new().field("room");
        let prompt = ExtractionPromptBuilder::new("rooms", &plain, "").build();
        assert!(prompt.contains("\"room\": \"...\""));
    }

    #[test]
    fn test_schema_example_is_valid_json() {
        let schema = FieldSchema::new()
            .field("size \"nominal\"")
            .spec(FieldSpec::new("path\\note").describe("quote \" and newline\n"));
        let prompt = ExtractionPromptBuilder::new("doors", &schema, "").build();

        let example: Value = serde_json::from_str(example_block(&prompt)).unwrap();
        let row = example[0].as_object().unwrap();
        assert_eq!(row["size \"nominal\""], "...");
        assert_eq!(row["path\\note"], "quote \" and newline\n");
    }

    #[test]
    fn test_schema_example_keeps_field_order() {
        let schema = FieldSchema::new().field("zeta").field("alpha");
        let prompt = ExtractionPromptBuilder::new("rows", &schema, "").build();
        let block = example_block(&prompt);
        assert!(block.find("zeta").unwrap() < block.find("alpha").unwrap());
    }

    #[test]
    fn test_table_hint_is_optional() {
        let schema = FieldSchema::door_schedule();
        let without = ExtractionPromptBuilder::new("doors", &schema, "").build();
        assert!(!without.contains("Look for a table"));

        let with = ExtractionPromptBuilder::new("doors", &schema, "")
            .with_table_hint(Some("Door #, Notes"))
            .build();
        assert!(with.contains("Look for a table with columns like: Door #, Notes."));
    }
}
