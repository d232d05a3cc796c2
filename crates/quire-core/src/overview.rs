//! Document overviews
//!
//! A compact outline of a document: every block's ID, type and a short
//! preview, grouped by chapter. Meant for skimming a document without
//! pulling every block body into one response.

use serde::Serialize;
use tracing::warn;

use crate::block::BlockKind;
use crate::models::BlockReference;
use crate::repository::{BlockRepository, ChapterRepository, DocumentRepository};
use crate::storage::StoreResult;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BlockOverview {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: BlockKind,
    pub preview: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChapterOverview {
    pub id: String,
    pub title: String,
    pub blocks: Vec<BlockOverview>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentOverview {
    pub id: String,
    pub title: String,
    pub author: String,
    pub has_chapters: bool,
    /// Top-level blocks; present in chaptered documents too when any exist
    pub blocks: Vec<BlockOverview>,
    pub chapters: Vec<ChapterOverview>,
}

#[derive(Debug, Clone)]
pub struct OverviewBuilder {
    documents: DocumentRepository,
    chapters: ChapterRepository,
    blocks: BlockRepository,
}

impl OverviewBuilder {
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

    /// Build the overview; unreadable chapters and blocks are left out
    pub fn build(&self, doc_id: &str) -> StoreResult<DocumentOverview> {
        let doc = self.documents.get(doc_id)?;

        let blocks = self.previews(doc_id, &doc.blocks);

        let mut chapters = Vec::with_capacity(doc.chapters.len());
        for reference in &doc.chapters {
            match self.chapters.read(doc_id, reference) {
                Ok(chapter) => chapters.push(ChapterOverview {
                    id: reference.id.clone(),
                    title: reference.title.clone(),
                    blocks: self.previews(doc_id, &chapter.blocks),
                }),
                Err(e) => warn!("Skipping chapter '{}' in overview: {}", reference.id, e),
            }
        }

        Ok(DocumentOverview {
            id: doc.id,
            title: doc.title,
            author: doc.author,
            has_chapters: doc.has_chapters,
            blocks,
            chapters,
        })
    }

    fn previews(&self, doc_id: &str, refs: &[BlockReference]) -> Vec<BlockOverview> {
        refs.iter()
            .filter_map(|reference| match self.blocks.load(doc_id, reference) {
                Ok(block) => Some(BlockOverview {
                    id: reference.id.clone(),
                    kind: reference.kind,
                    preview: block.preview(),
                }),
                Err(e) => {
                    warn!("Skipping block '{}' in overview: {}", reference.id, e);
                    None
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::Block;
    use crate::position::Position;
    use crate::repository::{Locator, Scope};
    use crate::storage::layout::Layout;
    use std::fs;
    use tempfile::TempDir;

    struct Fixture {
        temp_dir: TempDir,
        documents: DocumentRepository,
        chapters: ChapterRepository,
        blocks: BlockRepository,
        overview: OverviewBuilder,
    }

    fn fixture() -> Fixture {
        let temp_dir = TempDir::new().unwrap();
        let layout = Layout::new(temp_dir.path().join("documents"));
        let documents = DocumentRepository::new(layout.clone());
        let chapters = ChapterRepository::new(layout.clone(), documents.clone());
        let locator = Locator::new(documents.clone(), chapters.clone());
        let blocks = BlockRepository::new(layout, documents.clone(), chapters.clone(), locator);
        let overview = OverviewBuilder::new(documents.clone(), chapters.clone(), blocks.clone());
        Fixture {
            temp_dir,
            documents,
            chapters,
            blocks,
            overview,
        }
    }

    #[test]
    fn test_flat_overview() {
        let f = fixture();
        let doc_id = f.documents.create("Report", false, "Ann").unwrap();
        let scope = Scope::Document;
        f.blocks.add(&doc_id, &scope, Block::heading(1, "Intro"), &Position::End).unwrap();
        f.blocks
            .add(&doc_id, &scope, Block::markdown("x".repeat(150)), &Position::End)
            .unwrap();
        f.blocks
            .add(&doc_id, &scope, Block::image("assets/a.png", "", ""), &Position::End)
            .unwrap();

        let overview = f.overview.build(&doc_id).unwrap();
        assert_eq!(overview.title, "Report");
        assert_eq!(overview.author, "Ann");
        assert!(overview.chapters.is_empty());

        let previews: Vec<_> = overview.blocks.iter().map(|b| b.preview.as_str()).collect();
        assert_eq!(previews[0], "H1: Intro");
        assert_eq!(previews[1], format!("{}...", "x".repeat(97)));
        assert_eq!(previews[2], "Image");
    }

    #[test]
    fn test_chaptered_and_mixed_overview() {
        let f = fixture();
        let doc_id = f.documents.create("Book", true, "").unwrap();
        let ch1 = f.chapters.add(&doc_id, "One", &Position::End).unwrap();
        f.chapters.add(&doc_id, "Two", &Position::End).unwrap();
        f.blocks
            .add(
                &doc_id,
                &Scope::Chapter(ch1.clone()),
                Block::table(vec!["a".into(), "b".into()], vec![vec![]]),
                &Position::End,
            )
            .unwrap();
        f.blocks
            .add(&doc_id, &Scope::Document, Block::page_break(), &Position::End)
            .unwrap();

        let overview = f.overview.build(&doc_id).unwrap();
        assert!(overview.has_chapters);
        assert_eq!(overview.blocks.len(), 1);
        assert_eq!(overview.blocks[0].preview, "Page Break");
        assert_eq!(overview.chapters.len(), 2);
        assert_eq!(overview.chapters[0].title, "One");
        assert_eq!(
            overview.chapters[0].blocks[0].preview,
            "Table: 2 columns, 1 rows"
        );
        assert!(overview.chapters[1].blocks.is_empty());
    }

    #[test]
    fn test_unreadable_block_skipped() {
        let f = fixture();
        let doc_id = f.documents.create("Report", false, "").unwrap();
        let scope = Scope::Document;
        f.blocks.add(&doc_id, &scope, Block::markdown("kept"), &Position::End).unwrap();
        f.blocks.add(&doc_id, &scope, Block::heading(2, "lost"), &Position::End).unwrap();
        fs::remove_file(
            f.temp_dir
                .path()
                .join("documents")
                .join(&doc_id)
                .join("blocks")
                .join("hd-001-heading.json"),
        )
        .unwrap();

        let overview = f.overview.build(&doc_id).unwrap();
        assert_eq!(overview.blocks.len(), 1);
        assert_eq!(overview.blocks[0].id, "md-001");
    }

    #[test]
    fn test_overview_serializes_type_field() {
        let f = fixture();
        let doc_id = f.documents.create("Report", false, "").unwrap();
        f.blocks
            .add(&doc_id, &Scope::Document, Block::page_break(), &Position::End)
            .unwrap();

        let json = serde_json::to_value(f.overview.build(&doc_id).unwrap()).unwrap();
        assert_eq!(json["blocks"][0]["type"], "page_break");
    }
}
