//! Search command handler

use anyhow::{Context, Result};

use quire_core::Store;

use crate::output::Output;

/// Search one document, optionally limited to a chapter
pub fn search(
    store: &Store,
    doc_id: &str,
    query: &str,
    chapter: Option<&str>,
    output: &Output,
) -> Result<()> {
    let results = store
        .search(doc_id, query, chapter)
        .with_context(|| format!("Search in '{}' failed", doc_id))?;

    output.print_search_results(query, &results)
}
