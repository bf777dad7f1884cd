//! Project Brain Server
//!
//! HTTP front end for the construction document assistant: free-text chat
//! over the indexed drawings and specifications, and table extraction
//! (door schedules by default) into JSON rows with citations.

#![warn(missing_docs)]

pub mod config;
pub mod handlers;
pub mod request;

use config::ServerConfig;
use handlers::{create_router, AppState};
use projectbrain_extractor::{PipelineError, RagPipeline};
use projectbrain_llm::{GroqProvider, LlmError};
use projectbrain_store::{IngestReport, SqliteDocumentStore, StoreError};
use std::path::Path;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::info;

/// Server error
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// Document store error
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// LLM provider setup error
    #[error("LLM provider error: {0}")]
    Llm(#[from] LlmError),

    /// Pipeline setup error
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// Socket bind or serve failure
    #[error("Server I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Build the production pipeline: Groq for generation, SQLite FTS for retrieval
pub fn build_pipeline(
    config: &ServerConfig,
) -> Result<RagPipeline<GroqProvider, SqliteDocumentStore>, ServerError> {
    let api_key = config.llm.api_key()?;
    let llm = GroqProvider::new(&config.llm.endpoint, &config.llm.model, api_key)?
        .with_temperature(config.llm.temperature)
        .with_timeout(Duration::from_secs(config.llm.timeout_secs))
        .with_max_retries(config.llm.max_retries);

    let store = SqliteDocumentStore::new(&config.store.database_path)?;
    let chunks = store.count()?;
    if chunks == 0 {
        tracing::warn!(
            path = %config.store.database_path.display(),
            "Document store is empty; run `projectbrain ingest` first"
        );
    }

    Ok(RagPipeline::new(llm, store, config.pipeline.clone())?)
}

/// Load pre-chunked documents into the configured store
///
/// Returns the number of chunks written. With `replace`, existing chunks are
/// removed first.
pub fn import_chunks(
    config: &ServerConfig,
    file: &Path,
    replace: bool,
) -> Result<usize, ServerError> {
    let store = SqliteDocumentStore::new(&config.store.database_path)?;
    if replace {
        store.clear()?;
    }
    let added = store.import_json(file)?;
    info!(
        added,
        total = store.count()?,
        file = %file.display(),
        "Imported chunks"
    );
    Ok(added)
}

/// Load every PDF in `dir` into the configured store, one chunk per page
///
/// With `replace`, existing chunks are removed first.
pub fn ingest_documents(
    config: &ServerConfig,
    dir: &Path,
    replace: bool,
) -> Result<IngestReport, ServerError> {
    let store = SqliteDocumentStore::new(&config.store.database_path)?;
    if replace {
        store.clear()?;
        info!("Cleared existing chunks");
    }
    Ok(store.ingest_directory(dir)?)
}

/// Start the HTTP server
///
/// Builds the pipeline from the configuration and serves until Ctrl-C.
pub async fn start_server(config: ServerConfig) -> Result<(), ServerError> {
    info!("Starting Project Brain server");
    info!("Bind address: {}", config.bind_addr());
    info!("Model: {}", config.llm.model);
    info!("Database: {}", config.store.database_path.display());

    let pipeline = build_pipeline(&config)?;
    let app = create_router(AppState::new(pipeline));

    let listener = TcpListener::bind(&config.bind_addr()).await?;
    info!("Server listening on {}", config.bind_addr());

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use projectbrain_domain::RetrievedDocument;
    use std::io::Write;

    #[test]
    fn test_build_pipeline_requires_api_key() {
        let mut config = ServerConfig::default_test_config();
        config.llm.api_key_env = "PROJECTBRAIN_TEST_MISSING_KEY".to_string();

        let result = build_pipeline(&config);
        assert!(matches!(
            result,
            Err(ServerError::Config(config::ConfigError::MissingApiKey(_)))
        ));
    }

    #[test]
    fn test_import_chunks_replace() {
        let dir = tempfile::TempDir::new().unwrap();
        let mut config = ServerConfig::default_test_config();
        config.store.database_path = dir.path().join("chunks.db");

        let chunks = vec![
            RetrievedDocument::new("DOOR SCHEDULE D1", "A601.pdf", "7"),
            RetrievedDocument::new("Finish schedule", "A602.pdf", "3"),
        ];
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{}", serde_json::to_string(&chunks).unwrap()).unwrap();

        assert_eq!(import_chunks(&config, file.path(), false).unwrap(), 2);
        assert_eq!(import_chunks(&config, file.path(), false).unwrap(), 2);
        assert_eq!(import_chunks(&config, file.path(), true).unwrap(), 2);

        let store = SqliteDocumentStore::new(&config.store.database_path).unwrap();
        assert_eq!(store.count().unwrap(), 2);
    }

    #[test]
    fn test_ingest_documents_replace_clears_store() {
        let dir = tempfile::TempDir::new().unwrap();
        let docs = tempfile::TempDir::new().unwrap();
        let mut config = ServerConfig::default_test_config();
        config.store.database_path = dir.path().join("chunks.db");

        let store = SqliteDocumentStore::new(&config.store.database_path).unwrap();
        store
            .add_chunks(&[RetrievedDocument::new("stale", "old.pdf", "1")])
            .unwrap();

        let report = ingest_documents(&config, docs.path(), false).unwrap();
        assert_eq!(report.files, 0);
        assert_eq!(store.count().unwrap(), 1);

        ingest_documents(&config, docs.path(), true).unwrap();
        assert_eq!(store.count().unwrap(), 0);
    }

    #[test]
    fn test_ingest_documents_missing_dir() {
        let dir = tempfile::TempDir::new().unwrap();
        let mut config = ServerConfig::default_test_config();
        config.store.database_path = dir.path().join("chunks.db");

        let result = ingest_documents(&config, &dir.path().join("Docs"), false);
        assert!(matches!(result, Err(ServerError::Store(StoreError::Io(_)))));
    }
}
