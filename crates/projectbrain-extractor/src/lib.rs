//! Project Brain Extractor
//!
//! Turns retrieved document chunks plus an LLM into grounded answers and
//! structured tables.
//!
//! # Overview
//!
//! The interesting part is [`extract_array`]: models asked for a bare JSON
//! array routinely surround it with commentary, markdown fences, or return
//! something else entirely. `extract_array` finds the array, normalizes every
//! row against a [`FieldSchema`](projectbrain_domain::FieldSchema), and never
//! fails; bad output becomes warnings, not errors.
//!
//! # Architecture
//!
//! ```text
//! query → DocumentRetriever → prompt → LlmProvider → extract_array → ExtractResponse
//!                          └──────────── dedupe_sources ────────────┘
//! ```
//!
//! # Example Usage
//!
//! ```no_run
//! use projectbrain_extractor::{PipelineConfig, RagPipeline};
//! use projectbrain_llm::MockProvider;
//! use projectbrain_store::SqliteDocumentStore;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let llm = MockProvider::new(r#"[{"mark": "D1"}]"#);
//! let store = SqliteDocumentStore::new(":memory:")?;
//! let pipeline = RagPipeline::new(llm, store, PipelineConfig::default())?;
//!
//! let response = pipeline.extract("Generate a door schedule").await?;
//! println!("Rows: {}", response.data.len());
//! println!("Sources: {}", response.sources.len());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod config;
mod error;
mod parser;
mod pipeline;
mod prompt;
mod sources;
mod types;


pub use config::{PipelineConfig, DOOR_SCHEDULE_HINT};
pub use error::PipelineError;
pub use parser::{extract_array, WARNING_EXCERPT_CHARS};
pub use pipeline::RagPipeline;
pub use prompt::{build_context, chat_prompt, ExtractionPromptBuilder, CHAT_SYSTEM_PROMPT};
pub use sources::{dedupe_sources, sources_for};
pub use types::{ChatResponse, ExtractResponse};
