//! PDF ingestion
//!
//! Every `*.pdf` directly inside a directory is read page by page. Each
//! non-blank page becomes one chunk tagged with the file name and its 1-based
//! page number.

use crate::{SqliteDocumentStore, StoreError};
use projectbrain_domain::RetrievedDocument;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Outcome of ingesting a directory
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestReport {
    /// PDFs that were read successfully
    pub files: usize,

    /// Chunks written to the store
    pub chunks: usize,

    /// PDFs that could not be read, with the reason
    pub failed: Vec<(PathBuf, String)>,
}

/// Turn extracted page texts into chunks
///
/// Page numbers are 1-based and count blank pages, so citations match the
/// page numbers printed in a viewer.
pub fn page_chunks(filename: &str, pages: Vec<String>) -> Vec<RetrievedDocument> {
    pages
        .into_iter()
        .enumerate()
        .filter(|(_, text)| !text.trim().is_empty())
        .map(|(i, text)| RetrievedDocument::new(text.trim(), filename, (i + 1).to_string()))
        .collect()
}

/// PDF files directly inside `dir`, sorted by path
///
/// The extension match ignores case. Subdirectories are not searched.
pub fn find_pdfs(dir: &Path) -> Result<Vec<PathBuf>, StoreError> {
    let mut pdfs = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        let is_pdf = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));
        if is_pdf && path.is_file() {
            pdfs.push(path);
        }
    }
    pdfs.sort();
    Ok(pdfs)
}

/// Extract one chunk per page from a PDF
pub fn load_pdf(path: &Path) -> Result<Vec<RetrievedDocument>, StoreError> {
    let filename = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| StoreError::InvalidData(format!("{}: no file name", path.display())))?;

    let pages = pdf_extract::extract_text_by_pages(path)
        .map_err(|e| StoreError::Pdf(format!("{}: {}", path.display(), e)))?;

    Ok(page_chunks(&filename, pages))
}

impl SqliteDocumentStore {
    /// Load every PDF in `dir` into the store
    ///
    /// A PDF that cannot be read is logged and listed in the report; the
    /// remaining files are still ingested.
    pub fn ingest_directory<P: AsRef<Path>>(&self, dir: P) -> Result<IngestReport, StoreError> {
        let dir = dir.as_ref();
        let pdfs = find_pdfs(dir)?;
        if pdfs.is_empty() {
            warn!(dir = %dir.display(), "No PDFs found");
        }

        let mut report = IngestReport::default();
        for path in pdfs {
            match load_pdf(&path) {
                Ok(chunks) => {
                    let added = self.add_chunks(&chunks)?;
                    info!(file = %path.display(), pages = added, "Ingested PDF");
                    report.files += 1;
                    report.chunks += added;
                }
                Err(e) => {
                    warn!(file = %path.display(), error = %e, "Skipping unreadable PDF");
                    report.failed.push((path, e.to_string()));
                }
            }
        }

        info!(
            dir = %dir.display(),
            files = report.files,
            chunks = report.chunks,
            failed = report.failed.len(),
            "Ingestion complete"
        );
        Ok(report)
    }
}
