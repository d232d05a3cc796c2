//! Data models for Quire
//!
//! Defines the persisted structures: the document manifest, chapter files
//! and the block references that tie them to content files.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::block::BlockKind;
use crate::position::Identified;

/// A document manifest (`manifest.json`)
///
/// The manifest is the only record of block and chapter order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Document {
    /// Folder name; derived from the path, never written to the manifest
    #[serde(skip)]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub author: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub has_chapters: bool,
    /// Top-level blocks (the normal home for blocks of a flat document)
    #[serde(default)]
    pub blocks: Vec<BlockReference>,
    #[serde(default)]
    pub chapters: Vec<ChapterReference>,
}

impl Document {
    /// Create an empty document manifest
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        author: impl Into<String>,
        has_chapters: bool,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            title: title.into(),
            author: author.into(),
            created_at: now,
            updated_at: now,
            has_chapters,
            blocks: Vec::new(),
            chapters: Vec::new(),
        }
    }

    pub fn chapter(&self, chapter_id: &str) -> Option<&ChapterReference> {
        self.chapters.iter().find(|c| c.id == chapter_id)
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// Entry in the document's chapter list
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChapterReference {
    pub id: String,
    pub title: String,
    /// Relative to the document folder, `/`-separated
    pub folder: String,
}

impl Identified for ChapterReference {
    fn ident(&self) -> &str {
        &self.id
    }
}

/// A chapter file (`chapter.json`)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Chapter {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub blocks: Vec<BlockReference>,
}

impl Chapter {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            blocks: Vec::new(),
        }
    }
}

/// Entry in an ordered block list
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BlockReference {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: BlockKind,
    /// Content file, relative to the document folder, `/`-separated
    pub file: String,
}

impl Identified for BlockReference {
    fn ident(&self) -> &str {
        &self.id
    }
}

/// Listing entry for one document
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DocumentSummary {
    pub id: String,
    pub title: String,
    pub author: String,
    pub has_chapters: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub block_count: usize,
    pub chapter_count: usize,
}

impl From<&Document> for DocumentSummary {
    fn from(doc: &Document) -> Self {
        Self {
            id: doc.id.clone(),
            title: doc.title.clone(),
            author: doc.author.clone(),
            has_chapters: doc.has_chapters,
            created_at: doc.created_at,
            updated_at: doc.updated_at,
            block_count: doc.blocks.len(),
            chapter_count: doc.chapters.len(),
        }
    }
}
