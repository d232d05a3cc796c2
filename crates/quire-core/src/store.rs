//! Unified storage interface
//!
//! The `Store` owns the configuration, the on-disk layout and the
//! per-document write guard, and coordinates between:
//! - the repositories (documents, chapters, blocks)
//! - the read-side views (overview, search, full content)
//!
//! ## Concurrency
//!
//! Every mutating call takes the document's lease first (see
//! [`LockStrategy`](crate::storage::LockStrategy)); reads never lock.
//! Creating a document is not guarded since no other writer can know its ID
//! yet.
//!
//! ## Usage
//!
//! ```ignore
//! let store = Store::open()?;
//!
//! let doc = store.create_document("Field Notes", false, "Ann")?;
//! store.add_block(&doc, &Scope::Document, Block::heading(1, "Day one"), &Position::End)?;
//!
//! let overview = store.overview(&doc)?;
//! ```

use std::path::Path;

use anyhow::{Context, Result};

use crate::assets::AssetStore;
use crate::block::{Block, BlockKind};
use crate::config::Config;
use crate::content::{ContentLoader, DocumentContent};
use crate::models::{BlockReference, Chapter, Document, DocumentSummary};
use crate::overview::{DocumentOverview, OverviewBuilder};
use crate::position::Position;
use crate::repository::{
    BlockKey, BlockRepository, ChapterRepository, DocumentRepository, LocatedBlock, Location,
    Locator, Scope,
};
use crate::search::{SearchResult, Searcher};
use crate::storage::{DocumentLease, DocumentLocks, Layout, StoreResult};

/// Unified storage interface for Quire
pub struct Store {
    config: Config,
    layout: Layout,
    locks: DocumentLocks,
    documents: DocumentRepository,
    chapters: ChapterRepository,
    blocks: BlockRepository,
    locator: Locator,
    assets: AssetStore,
    overview: OverviewBuilder,
    searcher: Searcher,
    content: ContentLoader,
}

impl Store {
    /// Open the store using the default configuration sources
    pub fn open() -> Result<Self> {
        let config = Config::load().context("Failed to load configuration")?;
        Self::open_with_config(config)
    }

    /// Open the store with a specific configuration
    ///
    /// Creates the documents folder if it does not exist.
    pub fn open_with_config(config: Config) -> Result<Self> {
        config
            .ensure_data_dir()
            .context("Failed to prepare data directory")?;

        let layout = config.layout();
        let documents = DocumentRepository::new(layout.clone());
        let chapters = ChapterRepository::new(layout.clone(), documents.clone());
        let locator = Locator::new(documents.clone(), chapters.clone());
        let blocks = BlockRepository::new(
            layout.clone(),
            documents.clone(),
            chapters.clone(),
            locator.clone(),
        );

        Ok(Self {
            locks: DocumentLocks::new(config.locking),
            assets: AssetStore::new(layout.clone()),
            overview: OverviewBuilder::new(documents.clone(), chapters.clone(), blocks.clone()),
            searcher: Searcher::new(documents.clone(), chapters.clone(), blocks.clone()),
            content: ContentLoader::new(documents.clone(), chapters.clone(), blocks.clone()),
            config,
            layout,
            documents,
            chapters,
            blocks,
            locator,
        })
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    fn lease(&self, doc_id: &str) -> StoreResult<DocumentLease<'_>> {
        crate::repository::documents::check_id(doc_id)?;
        self.locks
            .acquire(&self.layout.document_dir(doc_id), doc_id)
    }

    // ==================== Document Operations ====================

    /// Create a document and return its ID
    pub fn create_document(&self, title: &str, has_chapters: bool, author: &str) -> StoreResult<String> {
        self.documents.create(title, has_chapters, author)
    }

    /// Load a document manifest
    pub fn get_document(&self, doc_id: &str) -> StoreResult<Document> {
        self.documents.get(doc_id)
    }

    /// All document IDs, sorted
    pub fn list_documents(&self) -> StoreResult<Vec<String>> {
        self.documents.list()
    }

    /// Summaries of all readable documents
    pub fn document_summaries(&self) -> StoreResult<Vec<DocumentSummary>> {
        self.documents.summaries()
    }

    /// Delete a document and everything in it
    pub fn delete_document(&self, doc_id: &str) -> StoreResult<()> {
        let _lease = self.lease(doc_id)?;
        self.documents.delete(doc_id)
    }

    pub fn document_exists(&self, doc_id: &str) -> bool {
        self.documents.exists(doc_id)
    }

    // ==================== Chapter Operations ====================

    /// Add a chapter and return its ID
    pub fn add_chapter(&self, doc_id: &str, title: &str, position: &Position) -> StoreResult<String> {
        let _lease = self.lease(doc_id)?;
        self.chapters.add(doc_id, title, position)
    }

    pub fn get_chapter(&self, doc_id: &str, chapter_id: &str) -> StoreResult<Chapter> {
        self.chapters.get(doc_id, chapter_id)
    }

    /// All chapters in manifest order
    pub fn list_chapters(&self, doc_id: &str) -> StoreResult<Vec<Chapter>> {
        self.chapters.list(doc_id)
    }

    pub fn rename_chapter(&self, doc_id: &str, chapter_id: &str, title: &str) -> StoreResult<()> {
        let _lease = self.lease(doc_id)?;
        self.chapters.update_title(doc_id, chapter_id, title)
    }

    /// Delete a chapter together with its blocks
    pub fn delete_chapter(&self, doc_id: &str, chapter_id: &str) -> StoreResult<()> {
        let _lease = self.lease(doc_id)?;
        self.chapters.delete(doc_id, chapter_id)
    }

    pub fn move_chapter(&self, doc_id: &str, chapter_id: &str, position: &Position) -> StoreResult<()> {
        let _lease = self.lease(doc_id)?;
        self.chapters.move_to(doc_id, chapter_id, position)
    }

    // ==================== Block Operations ====================

    /// Add a block and return its ID
    pub fn add_block(
        &self,
        doc_id: &str,
        scope: &Scope,
        block: Block,
        position: &Position,
    ) -> StoreResult<String> {
        let _lease = self.lease(doc_id)?;
        self.blocks.add(doc_id, scope, block, position)
    }

    /// Add several blocks as one contiguous run, returning their IDs
    pub fn add_blocks(
        &self,
        doc_id: &str,
        scope: &Scope,
        blocks: Vec<Block>,
        position: &Position,
    ) -> StoreResult<Vec<String>> {
        let _lease = self.lease(doc_id)?;
        self.blocks.add_many(doc_id, scope, blocks, position)
    }

    /// The ID the next block of `kind` in `scope` would get
    pub fn generate_block_id(&self, doc_id: &str, scope: &Scope, kind: BlockKind) -> StoreResult<String> {
        self.blocks.generate_id(doc_id, scope, kind)
    }

    pub fn get_block(&self, doc_id: &str, key: &BlockKey) -> StoreResult<LocatedBlock> {
        self.blocks.get(doc_id, key)
    }

    pub fn get_blocks(&self, doc_id: &str, keys: &[BlockKey]) -> StoreResult<Vec<LocatedBlock>> {
        self.blocks.get_many(doc_id, keys)
    }

    /// Load the block a reference points at
    pub fn load_block(&self, doc_id: &str, reference: &BlockReference) -> StoreResult<Block> {
        self.blocks.load(doc_id, reference)
    }

    /// Where a block lives; the first match for a plain key
    pub fn find_block(&self, doc_id: &str, key: &BlockKey) -> StoreResult<Location> {
        self.locator.find(doc_id, key)
    }

    /// Every list holding a block with this ID
    pub fn find_block_everywhere(&self, doc_id: &str, block_id: &str) -> StoreResult<Vec<Location>> {
        self.locator.find_all(doc_id, block_id)
    }

    pub fn update_block(&self, doc_id: &str, key: &BlockKey, block: Block) -> StoreResult<()> {
        let _lease = self.lease(doc_id)?;
        self.blocks.update(doc_id, key, block)
    }

    pub fn delete_block(&self, doc_id: &str, key: &BlockKey) -> StoreResult<()> {
        let _lease = self.lease(doc_id)?;
        self.blocks.delete(doc_id, key)
    }

    pub fn move_block(&self, doc_id: &str, key: &BlockKey, position: &Position) -> StoreResult<()> {
        let _lease = self.lease(doc_id)?;
        self.blocks.move_to(doc_id, key, position)
    }

    // ==================== Views ====================

    /// Outline of the document with short previews
    pub fn overview(&self, doc_id: &str) -> StoreResult<DocumentOverview> {
        self.overview.build(doc_id)
    }

    /// Case-insensitive search, optionally limited to one chapter
    pub fn search(
        &self,
        doc_id: &str,
        query: &str,
        chapter_id: Option<&str>,
    ) -> StoreResult<Vec<SearchResult>> {
        self.searcher.search(doc_id, query, chapter_id)
    }

    /// Every block, loaded, in render order
    pub fn content(&self, doc_id: &str) -> StoreResult<DocumentContent> {
        self.content.load(doc_id)
    }

    // ==================== Assets ====================

    /// Copy an image into the document's assets and return its relative path
    pub fn import_image(&self, doc_id: &str, source: &Path) -> StoreResult<String> {
        let _lease = self.lease(doc_id)?;
        self.assets.import_image(doc_id, source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::BlockKind;
    use crate::storage::{ErrorKind, LockStrategy, StoreError};
    use std::collections::HashSet;
    use std::thread;
    use tempfile::TempDir;

    fn test_config(temp_dir: &TempDir) -> Config {
        Config {
            data_dir: temp_dir.path().to_path_buf(),
            locking: LockStrategy::None,
            log_file: None,
        }
    }

    fn open(temp_dir: &TempDir) -> Store {
        Store::open_with_config(test_config(temp_dir)).unwrap()
    }

    fn top_level_ids(store: &Store, doc_id: &str) -> Vec<String> {
        store
            .get_document(doc_id)
            .unwrap()
            .blocks
            .into_iter()
            .map(|r| r.id)
            .collect()
    }

    fn heading_text(store: &Store, doc_id: &str, id: &str) -> String {
        store
            .get_block(doc_id, &BlockKey::parse(id))
            .unwrap()
            .block
            .searchable_text()
    }

    #[test]
    fn test_open_creates_documents_dir() {
        let temp_dir = TempDir::new().unwrap();
        let store = open(&temp_dir);

        assert!(temp_dir.path().join("documents").is_dir());
        assert!(store.list_documents().unwrap().is_empty());
    }

    #[test]
    fn test_create_overview_scenario() {
        let temp_dir = TempDir::new().unwrap();
        let store = open(&temp_dir);

        let doc_id = store
            .create_document("Test Document", false, "A. Author")
            .unwrap();
        assert_eq!(doc_id, "test-document");

        let hd = store
            .add_block(&doc_id, &Scope::Document, Block::heading(1, "Intro"), &Position::End)
            .unwrap();
        let md = store
            .add_block(&doc_id, &Scope::Document, Block::markdown("Body text."), &Position::End)
            .unwrap();
        assert_eq!((hd.as_str(), md.as_str()), ("hd-001", "md-001"));

        let overview = store.overview(&doc_id).unwrap();
        assert_eq!(overview.author, "A. Author");
        let entries: Vec<_> = overview
            .blocks
            .iter()
            .map(|b| (b.id.as_str(), b.kind, b.preview.as_str()))
            .collect();
        assert_eq!(
            entries,
            vec![
                ("hd-001", BlockKind::Heading, "H1: Intro"),
                ("md-001", BlockKind::Markdown, "Body text."),
            ]
        );
    }

    #[test]
    fn test_colliding_titles() {
        let temp_dir = TempDir::new().unwrap();
        let store = open(&temp_dir);

        assert_eq!(store.create_document("Test Doc", false, "").unwrap(), "test-doc");
        assert_eq!(store.create_document("Test Doc", false, "").unwrap(), "test-doc-1");
    }

    #[test]
    fn test_chapter_numbering_independent() {
        let temp_dir = TempDir::new().unwrap();
        let store = open(&temp_dir);

        let doc_id = store.create_document("Book", true, "").unwrap();
        store
            .add_block(&doc_id, &Scope::Document, Block::heading(1, "Preface"), &Position::End)
            .unwrap();
        let ch = store.add_chapter(&doc_id, "Ch One", &Position::End).unwrap();
        assert_eq!(ch, "ch-001");

        let id = store
            .add_block(
                &doc_id,
                &Scope::Chapter(ch.clone()),
                Block::heading(1, "Start"),
                &Position::End,
            )
            .unwrap();
        assert_eq!(id, "hd-001");

        let located = store
            .get_block(&doc_id, &BlockKey::parse("ch-001/hd-001"))
            .unwrap();
        assert_eq!(located.block.searchable_text(), "Start");
    }

    #[test]
    fn test_move_then_delete_scenario() {
        let temp_dir = TempDir::new().unwrap();
        let store = open(&temp_dir);
        let doc_id = store.create_document("Moves", false, "").unwrap();

        for text in ["A", "B", "C"] {
            store
                .add_block(&doc_id, &Scope::Document, Block::heading(1, text), &Position::End)
                .unwrap();
        }
        assert_eq!(top_level_ids(&store, &doc_id), vec!["hd-001", "hd-002", "hd-003"]);

        store
            .move_block(&doc_id, &BlockKey::parse("hd-002"), &Position::Start)
            .unwrap();
        assert_eq!(top_level_ids(&store, &doc_id), vec!["hd-002", "hd-001", "hd-003"]);
        assert_eq!(heading_text(&store, &doc_id, "hd-002"), "B");

        store
            .delete_block(&doc_id, &BlockKey::parse("hd-002"))
            .unwrap();
        assert_eq!(top_level_ids(&store, &doc_id), vec!["hd-001", "hd-003"]);
        assert_eq!(heading_text(&store, &doc_id, "hd-001"), "A");
        assert_eq!(heading_text(&store, &doc_id, "hd-003"), "C");

        let err = store
            .get_block(&doc_id, &BlockKey::parse("hd-002"))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);

        let next = store
            .add_block(&doc_id, &Scope::Document, Block::heading(1, "D"), &Position::End)
            .unwrap();
        assert_eq!(next, "hd-004");
    }

    #[test]
    fn test_move_keeps_set_of_blocks() {
        let temp_dir = TempDir::new().unwrap();
        let store = open(&temp_dir);
        let doc_id = store.create_document("Set", false, "").unwrap();
        for text in ["a", "b", "c", "d"] {
            store
                .add_block(&doc_id, &Scope::Document, Block::markdown(text), &Position::End)
                .unwrap();
        }
        let before: HashSet<_> = top_level_ids(&store, &doc_id).into_iter().collect();

        for (id, position) in [
            ("md-004", Position::Start),
            ("md-001", Position::End),
            ("md-002", Position::after("md-004")),
            ("md-003", Position::after("nowhere")),
        ] {
            store
                .move_block(&doc_id, &BlockKey::parse(id), &position)
                .unwrap();
            let after: HashSet<_> = top_level_ids(&store, &doc_id).into_iter().collect();
            assert_eq!(after, before);
        }
    }

    #[test]
    fn test_search_scenario() {
        let temp_dir = TempDir::new().unwrap();
        let store = open(&temp_dir);
        let doc_id = store.create_document("Insects", false, "").unwrap();

        store
            .add_block(
                &doc_id,
                &Scope::Document,
                Block::markdown("...butterflies and their lifecycle..."),
                &Position::End,
            )
            .unwrap();
        store
            .add_block(
                &doc_id,
                &Scope::Document,
                Block::markdown("Butterflies are beautiful..."),
                &Position::End,
            )
            .unwrap();

        let results = store.search(&doc_id, "butterflies", None).unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].position, 0);
        assert_eq!(results[1].position, 1);
        for result in &results {
            assert!(result.snippet.to_lowercase().contains("butterflies"));
        }
    }

    #[test]
    fn test_update_through_store() {
        let temp_dir = TempDir::new().unwrap();
        let store = open(&temp_dir);
        let doc_id = store.create_document("Edits", false, "").unwrap();
        store
            .add_block(
                &doc_id,
                &Scope::Document,
                Block::table(vec!["a".into()], vec![]),
                &Position::End,
            )
            .unwrap();

        let err = store
            .update_block(&doc_id, &BlockKey::parse("tbl-001"), Block::page_break())
            .unwrap_err();
        assert!(matches!(err, StoreError::TypeMismatch { .. }));

        store
            .update_block(
                &doc_id,
                &BlockKey::parse("tbl-001"),
                Block::table(vec!["a".into(), "b".into()], vec![vec!["1".into()]]),
            )
            .unwrap();
        let located = store
            .get_block(&doc_id, &BlockKey::parse("tbl-001"))
            .unwrap();
        assert_eq!(located.block.id(), "tbl-001");
        assert_eq!(located.block.preview(), "Table: 2 columns, 1 rows");
    }

    #[test]
    fn test_import_image_then_add_block() {
        let temp_dir = TempDir::new().unwrap();
        let store = open(&temp_dir);
        let doc_id = store.create_document("Gallery", false, "").unwrap();
        let source = temp_dir.path().join("photo.jpg");
        std::fs::write(&source, b"jpeg").unwrap();

        let path = store.import_image(&doc_id, &source).unwrap();
        assert_eq!(path, "assets/photo-001.jpg");

        store
            .add_block(
                &doc_id,
                &Scope::Document,
                Block::image(path, "A photo", "photo"),
                &Position::End,
            )
            .unwrap();
        let content = store.content(&doc_id).unwrap();
        assert_eq!(
            content.to_markdown(),
            "![photo](assets/photo-001.jpg)\n\n*A photo*"
        );
    }

    #[test]
    fn test_delete_document_and_chapter() {
        let temp_dir = TempDir::new().unwrap();
        let store = open(&temp_dir);
        let doc_id = store.create_document("Book", true, "").unwrap();
        let ch = store.add_chapter(&doc_id, "One", &Position::End).unwrap();
        store.rename_chapter(&doc_id, &ch, "Uno").unwrap();
        assert_eq!(store.get_chapter(&doc_id, &ch).unwrap().title, "Uno");

        store.delete_chapter(&doc_id, &ch).unwrap();
        assert!(store.list_chapters(&doc_id).unwrap().is_empty());

        store.delete_document(&doc_id).unwrap();
        assert!(!store.document_exists(&doc_id));
        assert!(store.delete_document(&doc_id).unwrap_err().is_not_found());
    }

    #[test]
    fn test_delete_document_needs_a_real_id() {
        let temp_dir = TempDir::new().unwrap();
        let mut config = test_config(&temp_dir);
        config.locking = LockStrategy::LockFile;
        let store = Store::open_with_config(config).unwrap();
        store.create_document("Keep Me", false, "").unwrap();
        store.create_document("Keep Me Too", false, "").unwrap();

        for id in ["", "..", "."] {
            let err = store.delete_document(id).unwrap_err();
            assert!(err.is_not_found(), "{:?} -> {:?}", id, err);
        }

        assert_eq!(store.list_documents().unwrap(), vec!["keep-me", "keep-me-too"]);
        assert!(!temp_dir.path().join("documents").join(".lock").exists());
        assert!(!temp_dir.path().join(".lock").exists());
    }

    #[test]
    fn test_lock_file_strategy() {
        let temp_dir = TempDir::new().unwrap();
        let mut config = test_config(&temp_dir);
        config.locking = LockStrategy::LockFile;
        let store = Store::open_with_config(config).unwrap();
        let doc_id = store.create_document("Locked", false, "").unwrap();

        let lock_path = temp_dir
            .path()
            .join("documents")
            .join(&doc_id)
            .join(".lock");
        std::fs::write(&lock_path, "").unwrap();

        let err = store
            .add_block(&doc_id, &Scope::Document, Block::page_break(), &Position::End)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Locked);

        std::fs::remove_file(&lock_path).unwrap();
        store
            .add_block(&doc_id, &Scope::Document, Block::page_break(), &Position::End)
            .unwrap();
        assert!(!lock_path.exists());

        store.delete_document(&doc_id).unwrap();
        assert!(!store.document_exists(&doc_id));
    }

    #[test]
    fn test_process_lock_concurrent_adds() {
        let temp_dir = TempDir::new().unwrap();
        let mut config = test_config(&temp_dir);
        config.locking = LockStrategy::Process;
        let store = Store::open_with_config(config).unwrap();
        let doc_id = store.create_document("Busy", false, "").unwrap();

        thread::scope(|s| {
            for worker in 0..4 {
                let store = &store;
                let doc_id = &doc_id;
                s.spawn(move || {
                    for n in 0..5 {
                        store
                            .add_block(
                                doc_id,
                                &Scope::Document,
                                Block::markdown(format!("worker {} note {}", worker, n)),
                                &Position::End,
                            )
                            .unwrap();
                    }
                });
            }
        });

        let ids = top_level_ids(&store, &doc_id);
        assert_eq!(ids.len(), 20);
        let unique: HashSet<_> = ids.iter().collect();
        assert_eq!(unique.len(), 20);
        assert!(ids.contains(&"md-020".to_string()));
    }

    #[test]
    fn test_store_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Store>();
    }
}
