//! Full-text search within one document
//!
//! Case-insensitive substring search over each block's searchable text.
//! Results come back in reading order with a snippet of context around the
//! first match in each block.

use serde::Serialize;
use tracing::{debug, warn};

use crate::block::BlockKind;
use crate::models::BlockReference;
use crate::repository::{BlockRepository, ChapterRepository, DocumentRepository};
use crate::storage::{StoreError, StoreResult};

/// Characters of context kept on each side of a match
const SNIPPET_CONTEXT: usize = 50;

const ELLIPSIS: &str = "...";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResult {
    pub block_id: String,
    #[serde(rename = "type")]
    pub block_type: BlockKind,
    /// Empty for top-level blocks
    pub chapter_id: String,
    pub snippet: String,
    /// Index within the owning block list
    pub position: usize,
}

#[derive(Debug, Clone)]
pub struct Searcher {
    documents: DocumentRepository,
    chapters: ChapterRepository,
    blocks: BlockRepository,
}

impl Searcher {
    pub fn new(
        documents: DocumentRepository,
        chapters: ChapterRepository,
        blocks: BlockRepository,
    ) -> Self {
        Self {
            documents,
            chapters,
            blocks,
        }
    }

    /// Search a document, or only one of its chapters
    ///
    /// With `chapter_id`, top-level blocks are not searched.
    pub fn search(
        &self,
        doc_id: &str,
        query: &str,
        chapter_id: Option<&str>,
    ) -> StoreResult<Vec<SearchResult>> {
        if query.trim().is_empty() {
            return Err(StoreError::InvalidArgument(
                "search query must not be empty".to_string(),
            ));
        }

        let doc = self.documents.get(doc_id)?;
        let needle = fold(query);
        let mut results = Vec::new();

        match chapter_id.filter(|id| !id.is_empty()) {
            Some(chapter_id) => {
                let chapter = self.chapters.load(&doc, chapter_id)?;
                self.search_list(doc_id, &chapter.blocks, &needle, chapter_id, &mut results);
            }
            None => {
                self.search_list(doc_id, &doc.blocks, &needle, "", &mut results);
                for reference in &doc.chapters {
                    match self.chapters.read(doc_id, reference) {
                        Ok(chapter) => self.search_list(
                            doc_id,
                            &chapter.blocks,
                            &needle,
                            &reference.id,
                            &mut results,
                        ),
                        Err(e) => warn!("Skipping chapter '{}' in search: {}", reference.id, e),
                    }
                }
            }
        }

        debug!(
            "Search for '{}' in '{}' found {} blocks",
            query,
            doc_id,
            results.len()
        );
        Ok(results)
    }

    fn search_list(
        &self,
        doc_id: &str,
        refs: &[BlockReference],
        needle: &[char],
        chapter_id: &str,
        results: &mut Vec<SearchResult>,
    ) {
        for (position, reference) in refs.iter().enumerate() {
            let block = match self.blocks.load(doc_id, reference) {
                Ok(block) => block,
                Err(e) => {
                    warn!("Skipping block '{}' in search: {}", reference.id, e);
                    continue;
                }
            };

            let text = block.searchable_text();
            if let Some(snippet) = snippet(&text, needle) {
                results.push(SearchResult {
                    block_id: reference.id.clone(),
                    block_type: reference.kind,
                    chapter_id: chapter_id.to_string(),
                    snippet,
                    position,
                });
            }
        }
    }
}

/// Lowercase one character at a time so indices stay aligned with the input
fn fold(text: &str) -> Vec<char> {
    text.chars()
        .map(|c| c.to_lowercase().next().unwrap_or(c))
        .collect()
}

/// Character index of the first case-insensitive match
fn find(haystack: &[char], needle: &[char]) -> Option<usize> {
    if needle.is_empty() || needle.len() > haystack.len() {
        return None;
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}

/// Context around the first match, or `None` when there is no match
pub fn snippet(text: &str, needle: &[char]) -> Option<String> {
    let chars: Vec<char> = text.chars().collect();
    let start_of_match = find(&fold(text), needle)?;

    let start = start_of_match.saturating_sub(SNIPPET_CONTEXT);
    let end = (start_of_match + needle.len() + SNIPPET_CONTEXT).min(chars.len());

    let mut out = String::new();
    if start > 0 {
        out.push_str(ELLIPSIS);
    }
    out.extend(&chars[start..end]);
    if end < chars.len() {
        out.push_str(ELLIPSIS);
    }
    Some(out)
}
