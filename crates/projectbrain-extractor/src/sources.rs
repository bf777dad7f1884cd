//! Citation list construction

use projectbrain_domain::{RetrievedDocument, SourceRef};
use std::collections::HashSet;

/// Drop repeated `(source, page)` pairs, keeping first-seen order
///
/// Idempotent: feeding the output back in returns it unchanged.
///
/// # Examples
///
/// ```
/// use projectbrain_domain::SourceRef;
/// use projectbrain_extractor::dedupe_sources;
///
/// let deduped = dedupe_sources(vec![
///     SourceRef::new("A", "1"),
///     SourceRef::new("B", "2"),
///     SourceRef::new("A", "1"),
/// ]);
/// assert_eq!(deduped, vec![SourceRef::new("A", "1"), SourceRef::new("B", "2")]);
/// ```
pub fn dedupe_sources<I>(entries: I) -> Vec<SourceRef>
where
    I: IntoIterator<Item = SourceRef>,
{
    let mut seen = HashSet::new();
    entries
        .into_iter()
        .filter(|entry| seen.insert(entry.clone()))
        .collect()
}

/// Deduplicated citations for a set of retrieved chunks, in retrieval order
pub fn sources_for(documents: &[RetrievedDocument]) -> Vec<SourceRef> {
    dedupe_sources(documents.iter().map(RetrievedDocument::source_ref))
}
