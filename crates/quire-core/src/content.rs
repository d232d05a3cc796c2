//! Fully loaded document content in render order
//!
//! Renderers and exporters consume this: top-level blocks first, then each
//! chapter's blocks. Unlike the overview, nothing is skipped; a block that
//! cannot be loaded fails the whole call.

use serde::Serialize;

use crate::block::Block;
use crate::models::{ChapterReference, Document};
use crate::repository::{BlockRepository, ChapterRepository, DocumentRepository};
use crate::storage::StoreResult;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChapterContent {
    pub chapter: ChapterReference,
    pub blocks: Vec<Block>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentContent {
    pub document: Document,
    pub blocks: Vec<Block>,
    pub chapters: Vec<ChapterContent>,
}

impl DocumentContent {
    /// Every block in render order
    pub fn iter_blocks(&self) -> impl Iterator<Item = &Block> {
        self.blocks
            .iter()
            .chain(self.chapters.iter().flat_map(|c| c.blocks.iter()))
    }

    /// Concatenate the blocks' Markdown, separated by blank lines
    pub fn to_markdown(&self) -> String {
        self.iter_blocks()
            .map(Block::to_markdown)
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

#[derive(Debug, Clone)]
pub struct ContentLoader {
    documents: DocumentRepository,
    chapters: ChapterRepository,
    blocks: BlockRepository,
}

impl ContentLoader {
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

    pub fn load(&self, doc_id: &str) -> StoreResult<DocumentContent> {
        let document = self.documents.get(doc_id)?;

        let blocks = document
            .blocks
            .iter()
            .map(|reference| self.blocks.load(doc_id, reference))
            .collect::<StoreResult<Vec<_>>>()?;

        let mut chapters = Vec::with_capacity(document.chapters.len());
        for reference in &document.chapters {
            let chapter = self.chapters.read(doc_id, reference)?;
            let blocks = chapter
                .blocks
                .iter()
                .map(|block| self.blocks.load(doc_id, block))
                .collect::<StoreResult<Vec<_>>>()?;
            chapters.push(ChapterContent {
                chapter: reference.clone(),
                blocks,
            });
        }

        Ok(DocumentContent {
            document,
            blocks,
            chapters,
        })
    }
}
