//! Block content files and their references
//!
//! Every mutation follows the same order: write the content file, then the
//! chapter file (if the block lives in a chapter), then the manifest. A
//! crash part-way leaves an unreferenced content file, never a reference to
//! a file that was not written.

use serde::Serialize;
use tracing::{debug, info};

use super::chapters::ChapterRepository;
use super::documents::DocumentRepository;
use super::locator::{BlockKey, Location, Locator, Scope};
use super::next_sequential_id;
use crate::block::{Block, BlockKind, MarkdownBlock};
use crate::models::{BlockReference, Chapter, ChapterReference, Document};
use crate::position::{insert_at_position, Position};
use crate::storage::layout::{self, Layout};
use crate::storage::persistence;
use crate::storage::{StoreError, StoreResult};

/// Next ID for `kind` in one block list
pub fn next_block_id(refs: &[BlockReference], kind: BlockKind) -> String {
    next_sequential_id(kind.prefix(), refs.iter().map(|r| r.id.as_str()))
}

/// A loaded block together with where it lives
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocatedBlock {
    pub location: Location,
    pub block: Block,
}

/// The block list an operation works on, loaded once
enum ScopeList {
    Document,
    Chapter {
        reference: ChapterReference,
        chapter: Chapter,
    },
}

impl ScopeList {
    fn refs<'a>(&'a self, doc: &'a Document) -> &'a [BlockReference] {
        match self {
            ScopeList::Document => &doc.blocks,
            ScopeList::Chapter { chapter, .. } => &chapter.blocks,
        }
    }

    fn refs_mut<'a>(&'a mut self, doc: &'a mut Document) -> &'a mut Vec<BlockReference> {
        match self {
            ScopeList::Document => &mut doc.blocks,
            ScopeList::Chapter { chapter, .. } => &mut chapter.blocks,
        }
    }

    /// Folder block files go in, relative to the document
    fn folder(&self) -> Option<&str> {
        match self {
            ScopeList::Document => None,
            ScopeList::Chapter { reference, .. } => Some(&reference.folder),
        }
    }
}

#[derive(Debug, Clone)]
pub struct BlockRepository {
    layout: Layout,
    documents: DocumentRepository,
    chapters: ChapterRepository,
    locator: Locator,
}

impl BlockRepository {
    pub fn new(
        layout: Layout,
        documents: DocumentRepository,
        chapters: ChapterRepository,
        locator: Locator,
    ) -> Self {
        Self {
            layout,
            documents,
            chapters,
            locator,
        }
    }

    /// The ID the next block of `kind` in `scope` would get
    pub fn generate_id(&self, doc_id: &str, scope: &Scope, kind: BlockKind) -> StoreResult<String> {
        let doc = self.documents.get(doc_id)?;
        let list = self.open_scope(&doc, scope)?;
        Ok(next_block_id(list.refs(&doc), kind))
    }

    /// Store a new block and return its ID
    ///
    /// Any ID already on `block` is replaced. `Scope::Document` is accepted
    /// for chaptered documents too; such blocks sit before all chapters.
    pub fn add(
        &self,
        doc_id: &str,
        scope: &Scope,
        mut block: Block,
        position: &Position,
    ) -> StoreResult<String> {
        block.validate()?;

        let mut doc = self.documents.get(doc_id)?;
        let mut list = self.open_scope(&doc, scope)?;

        let kind = block.kind();
        let id = next_block_id(list.refs(&doc), kind);
        block.set_id(&id);

        let file = layout::block_file(list.folder(), &id, kind);
        self.write_content(doc_id, &file, &block)?;

        let reference = BlockReference {
            id: id.clone(),
            kind,
            file,
        };
        insert_at_position(list.refs_mut(&mut doc), reference, position);
        self.commit(&mut doc, &list)?;

        debug!("Added {} block '{}' to '{}' ({})", kind, id, doc_id, scope);
        Ok(id)
    }

    /// Store several blocks as one contiguous run
    ///
    /// The first block goes to `position`, each following block directly
    /// after its predecessor. Stops at the first failure; blocks already
    /// added stay.
    pub fn add_many(
        &self,
        doc_id: &str,
        scope: &Scope,
        blocks: Vec<Block>,
        position: &Position,
    ) -> StoreResult<Vec<String>> {
        let mut ids = Vec::with_capacity(blocks.len());
        let mut next = position.clone();
        for block in blocks {
            let id = self.add(doc_id, scope, block, &next)?;
            next = Position::After(id.clone());
            ids.push(id);
        }
        info!("Added {} blocks to '{}'", ids.len(), doc_id);
        Ok(ids)
    }

    /// Load the block a reference points at
    pub fn load(&self, doc_id: &str, reference: &BlockReference) -> StoreResult<Block> {
        let path = self.layout.resolve(doc_id, &reference.file);

        if reference.kind == BlockKind::Markdown {
            let content = persistence::read_text(&path)?;
            return Ok(Block::Markdown(MarkdownBlock {
                id: reference.id.clone(),
                content,
            }));
        }

        let mut block: Block = persistence::read_json(&path)?;
        if block.kind() != reference.kind {
            return Err(StoreError::InvalidFormat {
                path,
                details: format!(
                    "expected a {} block, file holds a {} block",
                    reference.kind,
                    block.kind()
                ),
            });
        }
        block.set_id(&reference.id);
        Ok(block)
    }

    /// Load one block by key
    pub fn get(&self, doc_id: &str, key: &BlockKey) -> StoreResult<LocatedBlock> {
        let doc = self.documents.get(doc_id)?;
        let location = self.locator.find_in(&doc, key)?;
        self.load_at(&doc, location)
    }

    /// Load several blocks
    ///
    /// A plain key yields every block with that ID, in lookup order; a
    /// compound key yields exactly one. A key that
    /// matches nothing is an error.
    pub fn get_many(&self, doc_id: &str, keys: &[BlockKey]) -> StoreResult<Vec<LocatedBlock>> {
        let doc = self.documents.get(doc_id)?;
        let mut found = Vec::new();

        for key in keys {
            let locations = match key.chapter {
                Some(_) => vec![self.locator.find_in(&doc, key)?],
                None => self.locator.find_all_in(&doc, &key.block),
            };
            if locations.is_empty() {
                return Err(StoreError::BlockNotFound {
                    document: doc_id.to_string(),
                    block: key.to_string(),
                });
            }
            for location in locations {
                found.push(self.load_at(&doc, location)?);
            }
        }
        Ok(found)
    }

    fn load_at(&self, doc: &Document, location: Location) -> StoreResult<LocatedBlock> {
        let list = self.open_scope(doc, &location.scope)?;
        let reference = reference_at(doc, &list, &location)?;
        let block = self.load(&doc.id, reference)?;
        Ok(LocatedBlock { location, block })
    }

    /// Replace a block's content, keeping its ID, type and position
    pub fn update(&self, doc_id: &str, key: &BlockKey, mut block: Block) -> StoreResult<()> {
        let mut doc = self.documents.get(doc_id)?;
        let location = self.locator.find_in(&doc, key)?;
        let list = self.open_scope(&doc, &location.scope)?;
        let reference = reference_at(&doc, &list, &location)?.clone();

        if reference.kind != block.kind() {
            return Err(StoreError::TypeMismatch {
                block: reference.id,
                expected: reference.kind,
                actual: block.kind(),
            });
        }
        block.validate()?;
        block.set_id(&reference.id);

        self.write_content(doc_id, &reference.file, &block)?;
        self.documents.save(&mut doc)?;
        debug!("Updated block '{}' in '{}'", reference.id, doc_id);
        Ok(())
    }

    /// Remove a block's reference and its content file
    pub fn delete(&self, doc_id: &str, key: &BlockKey) -> StoreResult<()> {
        let mut doc = self.documents.get(doc_id)?;
        let location = self.locator.find_in(&doc, key)?;
        let mut list = self.open_scope(&doc, &location.scope)?;
        reference_at(&doc, &list, &location)?;

        let reference = list.refs_mut(&mut doc).remove(location.index);
        self.commit(&mut doc, &list)?;

        let path = self.layout.resolve(doc_id, &reference.file);
        persistence::remove_file_if_exists(&path)?;
        debug!("Deleted block '{}' from '{}'", reference.id, doc_id);
        Ok(())
    }

    /// Move a block within its own list
    ///
    /// The reference is taken out and reinserted, so `After` its own ID
    /// finds no anchor and appends. An `After` anchor that exists only in
    /// another list is rejected; an anchor that exists nowhere appends.
    pub fn move_to(&self, doc_id: &str, key: &BlockKey, position: &Position) -> StoreResult<()> {
        let mut doc = self.documents.get(doc_id)?;
        let location = self.locator.find_in(&doc, key)?;
        let mut list = self.open_scope(&doc, &location.scope)?;
        reference_at(&doc, &list, &location)?;

        if let Position::After(anchor) = position {
            let in_scope = list.refs(&doc).iter().any(|r| r.id == *anchor);
            if !in_scope && !self.locator.find_all_in(&doc, anchor).is_empty() {
                return Err(StoreError::Unsupported(format!(
                    "cannot move '{}' after '{}': blocks only move within their own {}",
                    key,
                    anchor,
                    match location.scope {
                        Scope::Document => "document list".to_string(),
                        Scope::Chapter(ref id) => format!("chapter '{}'", id),
                    }
                )));
            }
        }

        let refs = list.refs_mut(&mut doc);
        let reference = refs.remove(location.index);
        insert_at_position(refs, reference, position);
        self.commit(&mut doc, &list)
    }

    fn open_scope(&self, doc: &Document, scope: &Scope) -> StoreResult<ScopeList> {
        match scope {
            Scope::Document => Ok(ScopeList::Document),
            Scope::Chapter(chapter_id) => {
                let chapter = self.chapters.load(doc, chapter_id)?;
                let reference = doc
                    .chapter(chapter_id)
                    .cloned()
                    .ok_or_else(|| StoreError::ChapterNotFound {
                        document: doc.id.clone(),
                        chapter: chapter_id.clone(),
                    })?;
                Ok(ScopeList::Chapter { reference, chapter })
            }
        }
    }

    /// Persist the owning chapter (if any), then the manifest
    fn commit(&self, doc: &mut Document, list: &ScopeList) -> StoreResult<()> {
        if let ScopeList::Chapter { reference, chapter } = list {
            self.chapters.write(&doc.id, reference, chapter)?;
        }
        self.documents.save(doc)
    }

    fn write_content(&self, doc_id: &str, file: &str, block: &Block) -> StoreResult<()> {
        let path = self.layout.resolve(doc_id, file);
        match block {
            Block::Markdown(markdown) => persistence::write_text(&path, &markdown.content),
            other => persistence::write_json(&path, other),
        }
    }
}

fn reference_at<'a>(
    doc: &'a Document,
    list: &'a ScopeList,
    location: &Location,
) -> StoreResult<&'a BlockReference> {
    list.refs(doc)
        .get(location.index)
        .ok_or_else(|| StoreError::BlockNotFound {
            document: doc.id.clone(),
            block: format!("#{} in {}", location.index, location.scope),
        })
}
