//! Project Brain Storage Layer
//!
//! Implements the `DocumentRetriever` trait on top of SQLite's FTS5 module.
//!
//! # Architecture
//!
//! - One FTS5 virtual table holds chunk text plus `filename`/`page` metadata
//! - Ranking is delegated to SQLite's built-in `bm25`
//! - Chunks come from a JSON import or from PDF ingestion (one chunk per page)
//!
//! # Examples
//!
//! ```
//! use projectbrain_domain::RetrievedDocument;
//! use projectbrain_domain::traits::DocumentRetriever;
//! use projectbrain_store::SqliteDocumentStore;
//!
//! let store = SqliteDocumentStore::new(":memory:").unwrap();
//! store.add_chunks(&[RetrievedDocument::new("Door 101 is hollow metal.", "A601.pdf", "3")]).unwrap();
//!
//! let hits = store.retrieve("hollow metal doors", 5).unwrap();
//! assert_eq!(hits.len(), 1);
//! ```

#![warn(missing_docs)]

pub mod ingest;

pub use ingest::IngestReport;

use projectbrain_domain::traits::DocumentRetriever;
use projectbrain_domain::{DocumentMetadata, RetrievedDocument};
use rusqlite::{params, Connection, Row};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use thiserror::Error;
use tracing::{debug, info};

/// Errors that can occur during storage operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Failed to read an import file
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid data format
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Text extraction from a PDF failed
    #[error("PDF error: {0}")]
    Pdf(String),

    /// Connection mutex was poisoned by a panicking thread
    #[error("Store lock poisoned")]
    LockPoisoned,
}

/// SQLite-backed chunk store
///
/// The connection sits behind a mutex so the store can be shared across
/// threads and queried from the blocking pool.
pub struct SqliteDocumentStore {
    conn: Mutex<Connection>,
}

impl SqliteDocumentStore {
    /// Open (or create) a store at `path`
    ///
    /// Use `:memory:` for an in-memory database (useful for testing).
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        conn.execute_batch(include_str!("schema.sql"))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn.lock().map_err(|_| StoreError::LockPoisoned)
    }

    /// Insert chunks in a single transaction
    pub fn add_chunks(&self, chunks: &[RetrievedDocument]) -> Result<usize, StoreError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        {
            let mut stmt =
                tx.prepare("INSERT INTO chunks (content, filename, page) VALUES (?1, ?2, ?3)")?;
            for chunk in chunks {
                stmt.execute(params![
                    &chunk.content,
                    &chunk.metadata.filename,
                    &chunk.metadata.page,
                ])?;
            }
        }
        tx.commit()?;
        debug!(count = chunks.len(), "Added chunks");
        Ok(chunks.len())
    }

    /// Load a JSON array of `{content, metadata: {filename, page}}` objects
    pub fn import_json<P: AsRef<Path>>(&self, path: P) -> Result<usize, StoreError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)?;
        let chunks: Vec<RetrievedDocument> = serde_json::from_str(&raw)
            .map_err(|e| StoreError::InvalidData(format!("{}: {}", path.display(), e)))?;
        let added = self.add_chunks(&chunks)?;
        info!(path = %path.display(), added, "Imported chunks");
        Ok(added)
    }

    /// Remove every chunk
    pub fn clear(&self) -> Result<(), StoreError> {
        self.conn()?.execute("DELETE FROM chunks", [])?;
        Ok(())
    }

    /// Number of stored chunks
    pub fn count(&self) -> Result<usize, StoreError> {
        let n: i64 = self
            .conn()?
            .query_row("SELECT COUNT(*) FROM chunks", [], |row| row.get(0))?;
        Ok(n as usize)
    }

    fn row_to_document(row: &Row<'_>) -> rusqlite::Result<RetrievedDocument> {
        Ok(RetrievedDocument {
            content: row.get(0)?,
            metadata: DocumentMetadata {
                filename: row.get(1)?,
                page: row.get(2)?,
            },
        })
    }
}

/// Turn free text into an FTS5 query that cannot contain syntax errors
///
/// Every alphanumeric run becomes a quoted term; terms are OR-ed together.
/// Returns `None` when the text has no terms at all.
fn match_expression(query: &str) -> Option<String> {
    let terms: Vec<String> = query
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| format!("\"{}\"", t))
        .collect();

    if terms.is_empty() {
        None
    } else {
        Some(terms.join(" OR "))
    }
}

impl DocumentRetriever for SqliteDocumentStore {
    type Error = StoreError;

    fn retrieve(&self, query: &str, k: usize) -> Result<Vec<RetrievedDocument>, Self::Error> {
        if k == 0 {
            return Ok(Vec::new());
        }
        let limit = i64::try_from(k).unwrap_or(i64::MAX);
        let conn = self.conn()?;

        let documents = match match_expression(query) {
            Some(expr) => {
                let mut stmt = conn.prepare(
                    "SELECT content, filename, page FROM chunks
                     WHERE chunks MATCH ?1
                     ORDER BY bm25(chunks)
                     LIMIT ?2",
                )?;
                let rows = stmt.query_map(params![expr, limit], Self::row_to_document)?;
                rows.collect::<Result<Vec<_>, _>>()?
            }
            None => {
                let mut stmt = conn.prepare(
                    "SELECT content, filename, page FROM chunks ORDER BY rowid LIMIT ?1",
                )?;
                let rows = stmt.query_map(params![limit], Self::row_to_document)?;
                rows.collect::<Result<Vec<_>, _>>()?
            }
        };

        debug!(k, hits = documents.len(), "Retrieved chunks");
        Ok(documents)
    }
}
