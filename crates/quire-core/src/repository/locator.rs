//! Finding a block by ID
//!
//! Block IDs are only unique within one list, so `md-001` can exist both at
//! the top level and in every chapter. A plain key resolves to the first
//! match: in a chaptered document the chapters are searched in manifest
//! order before the top-level list; in a flat document the top-level list
//! comes first. A compound key `ch-002/md-001` names the chapter explicitly.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use tracing::warn;

use super::chapters::ChapterRepository;
use super::documents::DocumentRepository;
use crate::models::Document;
use crate::storage::{StoreError, StoreResult};

/// The list a block lives in
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Scope {
    /// The document's top-level block list
    Document,
    Chapter(String),
}

impl Scope {
    /// Empty string means the top-level list
    pub fn from_chapter_id(chapter_id: &str) -> Self {
        if chapter_id.is_empty() {
            Scope::Document
        } else {
            Scope::Chapter(chapter_id.to_string())
        }
    }

    pub fn chapter_id(&self) -> Option<&str> {
        match self {
            Scope::Document => None,
            Scope::Chapter(id) => Some(id),
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Document => f.write_str("document"),
            Scope::Chapter(id) => f.write_str(id),
        }
    }
}

/// A block address: `hd-001` or `ch-002/hd-001`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockKey {
    pub chapter: Option<String>,
    pub block: String,
}

impl BlockKey {
    pub fn parse(key: &str) -> Self {
        match key.split_once('/') {
            Some((chapter, block)) if !chapter.is_empty() => Self {
                chapter: Some(chapter.to_string()),
                block: block.to_string(),
            },
            Some((_, block)) => Self {
                chapter: None,
                block: block.to_string(),
            },
            None => Self {
                chapter: None,
                block: key.to_string(),
            },
        }
    }

    pub fn in_scope(scope: &Scope, block: impl Into<String>) -> Self {
        Self {
            chapter: scope.chapter_id().map(str::to_string),
            block: block.into(),
        }
    }
}

impl From<&str> for BlockKey {
    fn from(key: &str) -> Self {
        BlockKey::parse(key)
    }
}

impl FromStr for BlockKey {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(BlockKey::parse(s))
    }
}

impl fmt::Display for BlockKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.chapter {
            Some(chapter) => write!(f, "{}/{}", chapter, self.block),
            None => f.write_str(&self.block),
        }
    }
}

/// Where a block was found
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Location {
    pub scope: Scope,
    /// Index within the owning list
    pub index: usize,
}

#[derive(Debug, Clone)]
pub struct Locator {
    documents: DocumentRepository,
    chapters: ChapterRepository,
}

impl Locator {
    pub fn new(documents: DocumentRepository, chapters: ChapterRepository) -> Self {
        Self {
            documents,
            chapters,
        }
    }

    /// Locate a block by key
    pub fn find(&self, doc_id: &str, key: &BlockKey) -> StoreResult<Location> {
        let doc = self.documents.get(doc_id)?;
        self.find_in(&doc, key)
    }

    /// Locate a block in an already loaded document
    pub fn find_in(&self, doc: &Document, key: &BlockKey) -> StoreResult<Location> {
        if let Some(chapter_id) = &key.chapter {
            let chapter = self.chapters.load(doc, chapter_id)?;
            return chapter
                .blocks
                .iter()
                .position(|b| b.id == key.block)
                .map(|index| Location {
                    scope: Scope::Chapter(chapter_id.clone()),
                    index,
                })
                .ok_or_else(|| block_not_found(doc, key));
        }

        self.scan(doc, &key.block)
            .next()
            .ok_or_else(|| block_not_found(doc, key))
    }

    /// Every list in the document holding a block with this ID
    pub fn find_all(&self, doc_id: &str, block_id: &str) -> StoreResult<Vec<Location>> {
        let doc = self.documents.get(doc_id)?;
        Ok(self.find_all_in(&doc, block_id))
    }

    pub fn find_all_in(&self, doc: &Document, block_id: &str) -> Vec<Location> {
        self.scan(doc, block_id).collect()
    }

    /// Matches in lookup order; chapters are loaded lazily
    fn scan<'a>(
        &'a self,
        doc: &'a Document,
        block_id: &'a str,
    ) -> impl Iterator<Item = Location> + 'a {
        let top_level = doc
            .blocks
            .iter()
            .position(|b| b.id == block_id)
            .map(|index| Location {
                scope: Scope::Document,
                index,
            });

        let in_chapters = doc.chapters.iter().filter_map(move |reference| {
            let chapter = match self.chapters.read(&doc.id, reference) {
                Ok(chapter) => chapter,
                Err(e) => {
                    warn!("Skipping chapter '{}' while locating: {}", reference.id, e);
                    return None;
                }
            };
            chapter
                .blocks
                .iter()
                .position(|b| b.id == block_id)
                .map(|index| Location {
                    scope: Scope::Chapter(reference.id.clone()),
                    index,
                })
        });

        // Chaptered documents look in their chapters first; the top-level
        // list is only a fallback for the mixed state
        let (before, after) = if doc.has_chapters {
            (None, top_level)
        } else {
            (top_level, None)
        };
        before.into_iter().chain(in_chapters).chain(after)
    }
}

fn block_not_found(doc: &Document, key: &BlockKey) -> StoreError {
    StoreError::BlockNotFound {
        document: doc.id.clone(),
        block: key.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BlockReference, Chapter};
    use crate::position::Position;
    use crate::storage::layout::Layout;
    use crate::block::BlockKind;
    use tempfile::TempDir;

    struct Fixture {
        _temp_dir: TempDir,
        documents: DocumentRepository,
        chapters: ChapterRepository,
        locator: Locator,
    }

    fn fixture() -> Fixture {
        let temp_dir = TempDir::new().unwrap();
        let layout = Layout::new(temp_dir.path().join("documents"));
        let documents = DocumentRepository::new(layout.clone());
        let chapters = ChapterRepository::new(layout, documents.clone());
        let locator = Locator::new(documents.clone(), chapters.clone());
        Fixture {
            _temp_dir: temp_dir,
            documents,
            chapters,
            locator,
        }
    }

    fn reference(id: &str) -> BlockReference {
        BlockReference {
            id: id.to_string(),
            kind: BlockKind::Markdown,
            file: format!("blocks/{}.md", id),
        }
    }

    fn set_chapter_blocks(f: &Fixture, doc_id: &str, chapter_id: &str, ids: &[&str]) {
        let mut chapter: Chapter = f.chapters.get(doc_id, chapter_id).unwrap();
        chapter.blocks = ids.iter().map(|id| reference(id)).collect();
        f.chapters.save(doc_id, chapter_id, &chapter).unwrap();
    }

    #[test]
    fn test_parse_keys() {
        assert_eq!(
            BlockKey::parse("md-001"),
            BlockKey {
                chapter: None,
                block: "md-001".to_string()
            }
        );
        let key = BlockKey::parse("ch-002/hd-001");
        assert_eq!(key.chapter.as_deref(), Some("ch-002"));
        assert_eq!(key.block, "hd-001");
        assert_eq!(key.to_string(), "ch-002/hd-001");
        assert_eq!(BlockKey::parse("/md-001").chapter, None);
    }

    #[test]
    fn test_scope_from_chapter_id() {
        assert_eq!(Scope::from_chapter_id(""), Scope::Document);
        assert_eq!(
            Scope::from_chapter_id("ch-001"),
            Scope::Chapter("ch-001".to_string())
        );
    }

    #[test]
    fn test_first_match_in_reading_order() {
        let f = fixture();
        let doc_id = f.documents.create("Book", true, "").unwrap();
        f.chapters.add(&doc_id, "One", &Position::End).unwrap();
        f.chapters.add(&doc_id, "Two", &Position::End).unwrap();
        set_chapter_blocks(&f, &doc_id, "ch-001", &["md-001"]);
        set_chapter_blocks(&f, &doc_id, "ch-002", &["hd-001", "md-001"]);

        let location = f.locator.find(&doc_id, &"md-001".into()).unwrap();
        assert_eq!(location.scope, Scope::Chapter("ch-001".to_string()));
        assert_eq!(location.index, 0);

        let location = f.locator.find(&doc_id, &"ch-002/md-001".into()).unwrap();
        assert_eq!(location.scope, Scope::Chapter("ch-002".to_string()));
        assert_eq!(location.index, 1);

        let all = f.locator.find_all(&doc_id, "md-001").unwrap();
        assert_eq!(all.len(), 2);
    }

    #[test]
    fn test_chapters_win_in_chaptered_documents() {
        let f = fixture();
        let doc_id = f.documents.create("Mixed", true, "").unwrap();
        f.chapters.add(&doc_id, "One", &Position::End).unwrap();
        set_chapter_blocks(&f, &doc_id, "ch-001", &["md-001"]);

        let mut doc = f.documents.get(&doc_id).unwrap();
        doc.blocks.push(reference("md-001"));
        doc.blocks.push(reference("hd-001"));
        f.documents.save(&mut doc).unwrap();

        let location = f.locator.find(&doc_id, &"md-001".into()).unwrap();
        assert_eq!(location.scope, Scope::Chapter("ch-001".to_string()));

        // Top-level blocks stay reachable when no chapter claims the ID
        let location = f.locator.find(&doc_id, &"hd-001".into()).unwrap();
        assert_eq!(location.scope, Scope::Document);
        assert_eq!(location.index, 1);

        let scopes: Vec<_> = f
            .locator
            .find_all(&doc_id, "md-001")
            .unwrap()
            .into_iter()
            .map(|l| l.scope)
            .collect();
        assert_eq!(
            scopes,
            vec![Scope::Chapter("ch-001".to_string()), Scope::Document]
        );
    }

    #[test]
    fn test_top_level_first_in_flat_documents() {
        let f = fixture();
        let doc_id = f.documents.create("Flat", false, "").unwrap();

        let mut doc = f.documents.get(&doc_id).unwrap();
        doc.blocks.push(reference("md-001"));
        f.documents.save(&mut doc).unwrap();

        let location = f.locator.find(&doc_id, &"md-001".into()).unwrap();
        assert_eq!(location.scope, Scope::Document);
        assert_eq!(location.index, 0);
    }

    #[test]
    fn test_not_found() {
        let f = fixture();
        let doc_id = f.documents.create("Flat", false, "").unwrap();

        let err = f.locator.find(&doc_id, &"md-404".into()).unwrap_err();
        assert!(matches!(err, StoreError::BlockNotFound { .. }));

        let err = f.locator.find(&doc_id, &"ch-001/md-001".into()).unwrap_err();
        assert!(matches!(err, StoreError::ChapterNotFound { .. }));

        assert!(f.locator.find_all(&doc_id, "md-404").unwrap().is_empty());
    }
}
