//! Trait definitions for external interactions
//!
//! These traits define the boundaries between the extraction core and the
//! services it depends on. Implementations live in other crates.

use crate::RetrievedDocument;

/// Trait for LLM provider operations
///
/// Implemented by the infrastructure layer (projectbrain-llm)
pub trait LlmProvider {
    /// Error type for LLM operations
    type Error;

    /// Generate a completion for a single user prompt
    fn generate(&self, prompt: &str) -> Result<String, Self::Error>;

    /// Generate a completion with a separate system instruction
    ///
    /// Providers without a system role fall back to prefixing the prompt.
    fn generate_with_system(&self, system: &str, prompt: &str) -> Result<String, Self::Error> {
        self.generate(&format!("{}\n\n{}", system, prompt))
    }

    /// Model identifier, for logging and response metadata
    fn model_name(&self) -> &str {
        "llm"
    }
}

/// Trait for nearest-neighbour document lookup
///
/// Implemented by the infrastructure layer (projectbrain-store)
pub trait DocumentRetriever {
    /// Error type for retrieval operations
    type Error;

    /// Return up to `k` chunks relevant to `query`, best match first
    fn retrieve(&self, query: &str, k: usize) -> Result<Vec<RetrievedDocument>, Self::Error>;
}
