//! Configuration for the RAG pipeline

use projectbrain_domain::FieldSchema;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Column hint for door schedules
pub const DOOR_SCHEDULE_HINT: &str =
    "Door #, Wall Type, Frame Type, Door Type, Height, Width, Notes";

/// Configuration for the RAG pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Chunks retrieved for a chat answer
    pub chat_top_k: usize,

    /// Chunks retrieved for an extraction; tables often span pages
    pub extract_top_k: usize,

    /// Maximum accepted query length (characters)
    pub max_query_length: usize,

    /// Maximum time for a single retrieval (seconds)
    pub retrieval_timeout_secs: u64,

    /// Maximum time for a single LLM call (seconds)
    pub llm_timeout_secs: u64,

    /// Column names the extraction prompt tells the model to look for
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table_hint: Option<String>,

    /// Fields every extracted record is normalized to
    pub schema: FieldSchema,
}

impl PipelineConfig {
    /// Get the retrieval timeout as a Duration
    pub fn retrieval_timeout(&self) -> Duration {
        Duration::from_secs(self.retrieval_timeout_secs)
    }

    /// Get the LLM timeout as a Duration
    pub fn llm_timeout(&self) -> Duration {
        Duration::from_secs(self.llm_timeout_secs)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.chat_top_k == 0 {
            return Err("chat_top_k must be greater than 0".to_string());
        }
        if self.extract_top_k == 0 {
            return Err("extract_top_k must be greater than 0".to_string());
        }
        if self.max_query_length == 0 {
            return Err("max_query_length must be greater than 0".to_string());
        }
        if self.retrieval_timeout_secs == 0 {
            return Err("retrieval_timeout_secs must be greater than 0".to_string());
        }
        if self.llm_timeout_secs == 0 {
            return Err("llm_timeout_secs must be greater than 0".to_string());
        }
        if self.schema.is_empty() {
            return Err("schema must declare at least one field".to_string());
        }
        if self.schema.iter().any(|f| f.name.trim().is_empty()) {
            return Err("schema field names must not be blank".to_string());
        }
        Ok(())
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, String> {
        toml::from_str(toml_str).map_err(|e| format!("Failed to parse TOML: {}", e))
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, String> {
        toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize to TOML: {}", e))
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            chat_top_k: 5,
            extract_top_k: 15,
            max_query_length: 4_000,
            retrieval_timeout_secs: 30,
            llm_timeout_secs: 120,
            table_hint: Some(DOOR_SCHEDULE_HINT.to_string()),
            schema: FieldSchema::door_schedule(),
        }
    }
}
