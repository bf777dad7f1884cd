//! Retrieved documents and the citations derived from them

use serde::{Deserialize, Serialize};

/// Filename reported when a chunk carries no filename metadata
pub const UNKNOWN_SOURCE: &str = "Unknown";

/// Page reported when a chunk carries no page metadata
pub const UNKNOWN_PAGE: &str = "?";

/// Metadata attached to a stored chunk
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    /// Originating file name
    #[serde(default)]
    pub filename: Option<String>,

    /// 1-based page number, kept as text
    #[serde(default)]
    pub page: Option<String>,
}

/// A chunk returned by the document store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetrievedDocument {
    /// Chunk text
    pub content: String,

    /// Where the chunk came from
    #[serde(default)]
    pub metadata: DocumentMetadata,
}

impl RetrievedDocument {
    /// Create a document with filename and page metadata
    pub fn new(
        content: impl Into<String>,
        filename: impl Into<String>,
        page: impl Into<String>,
    ) -> Self {
        Self {
            content: content.into(),
            metadata: DocumentMetadata {
                filename: Some(filename.into()),
                page: Some(page.into()),
            },
        }
    }

    /// Citation for this chunk
    pub fn source_ref(&self) -> SourceRef {
        SourceRef::from(&self.metadata)
    }
}

/// A `(source, page)` citation
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceRef {
    /// File name
    pub source: String,
    /// Page number as text
    pub page: String,
}

impl SourceRef {
    /// Create a citation
    pub fn new(source: impl Into<String>, page: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            page: page.into(),
        }
    }
}

impl From<&DocumentMetadata> for SourceRef {
    fn from(meta: &DocumentMetadata) -> Self {
        Self {
            source: meta
                .filename
                .clone()
                .unwrap_or_else(|| UNKNOWN_SOURCE.to_string()),
            page: meta.page.clone().unwrap_or_else(|| UNKNOWN_PAGE.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_ref_from_metadata() {
        let doc = RetrievedDocument::new("text", "A101.pdf", "4");
        assert_eq!(doc.source_ref(), SourceRef::new("A101.pdf", "4"));
    }

    #[test]
    fn test_missing_metadata_uses_placeholders() {
        let doc: RetrievedDocument = serde_json::from_str(r#"{"content": "x"}"#).unwrap();
        assert_eq!(doc.source_ref(), SourceRef::new(UNKNOWN_SOURCE, UNKNOWN_PAGE));
    }
}
