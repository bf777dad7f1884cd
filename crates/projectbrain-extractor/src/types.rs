//! Response types for the chat and extraction flows

use projectbrain_domain::{ExtractedRecord, ExtractionResult, SourceRef};
use serde::Serialize;

/// Answer to a free-text question
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatResponse {
    /// Model answer
    pub answer: String,

    /// Deduplicated citations, in retrieval order
    pub sources: Vec<SourceRef>,
}

/// Structured rows pulled from the documents
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtractResponse {
    /// Normalized records, in the order the model listed them
    pub data: Vec<ExtractedRecord>,

    /// Deduplicated citations, in retrieval order
    pub sources: Vec<SourceRef>,

    /// Rows dropped or output that could not be parsed
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl ExtractResponse {
    /// Combine an extraction result with its citations
    pub fn new(result: ExtractionResult, sources: Vec<SourceRef>) -> Self {
        let (data, warnings) = result.into_parts();
        Self {
            data,
            sources,
            warnings,
        }
    }

    /// An empty table with no citations
    pub fn empty() -> Self {
        Self {
            data: Vec::new(),
            sources: Vec::new(),
            warnings: Vec::new(),
        }
    }
}
