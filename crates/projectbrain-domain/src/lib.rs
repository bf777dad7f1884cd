//! Project Brain Domain Layer
//!
//! Value types and collaborator traits shared by every other crate in the
//! workspace. Nothing in here performs I/O.
//!
//! ## Key Concepts
//!
//! - **FieldSchema**: ordered `(name, default)` pairs that normalize loosely-typed rows
//! - **ExtractedRecord**: one normalized row pulled out of model output
//! - **ExtractionResult**: records plus the warnings collected while producing them
//! - **SourceRef**: a `(source, page)` citation for a retrieved chunk
//!
//! ## Architecture
//!
//! - Pure data and trait definitions only
//! - LLM and document-store implementations live in other crates
//! - `traits` defines the boundary to every external collaborator

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod record;
pub mod schema;
pub mod source;
pub mod traits;

// Re-exports for convenience
pub use record::{ExtractedRecord, ExtractionResult};
pub use schema::{FieldSchema, FieldSpec};
pub use source::{DocumentMetadata, RetrievedDocument, SourceRef};
