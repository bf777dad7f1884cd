//! Error types for the RAG pipeline

use thiserror::Error;

/// Errors that can occur while answering or extracting
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Query was empty or whitespace
    #[error("Query is empty")]
    EmptyQuery,

    /// Query exceeds maximum length
    #[error("Query too long: {0} chars (max: {1})")]
    QueryTooLong(usize, usize),

    /// Document retrieval error
    #[error("Retrieval error: {0}")]
    Retrieval(String),

    /// LLM provider error
    #[error("LLM error: {0}")]
    Llm(String),

    /// A collaborator call exceeded its time budget
    #[error("{0} timed out")]
    Timeout(&'static str),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}
