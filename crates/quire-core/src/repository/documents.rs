//! Document manifests
//!
//! A document is a folder under the documents root named by its ID, with a
//! `manifest.json` inside. The ID is the folder name and is never stored in
//! the manifest itself.

use std::fs;
use std::io;

use tracing::{debug, info, warn};

use super::slugify;
use crate::models::{Document, DocumentSummary};
use crate::storage::layout::{self, Layout};
use crate::storage::persistence;
use crate::storage::{StoreError, StoreResult};

/// Longest slug taken from a title
const MAX_SLUG_LEN: usize = 50;

/// Slug used when the title has no usable characters
const FALLBACK_SLUG: &str = "document";

/// Reads and writes document manifests
#[derive(Debug, Clone)]
pub struct DocumentRepository {
    layout: Layout,
}

impl DocumentRepository {
    pub fn new(layout: Layout) -> Self {
        Self { layout }
    }

    /// Create a new, empty document and return its ID
    ///
    /// The ID is a slug of the title, suffixed `-1`, `-2`, ... when a
    /// folder of that name already exists. If anything fails after the
    /// folder is created, the folder is removed again.
    pub fn create(&self, title: &str, has_chapters: bool, author: &str) -> StoreResult<String> {
        persistence::create_dir_all(self.layout.root())?;
        let id = self.unique_id(title);
        let doc_dir = self.layout.document_dir(&id);

        let result = self.init_folder(&id, title, has_chapters, author);
        if let Err(e) = result {
            if let Err(cleanup) = fs::remove_dir_all(&doc_dir) {
                warn!(
                    "Failed to clean up {:?} after failed create: {}",
                    doc_dir, cleanup
                );
            }
            return Err(e);
        }

        info!("Created document '{}' ({:?})", id, doc_dir);
        Ok(id)
    }

    fn init_folder(
        &self,
        id: &str,
        title: &str,
        has_chapters: bool,
        author: &str,
    ) -> StoreResult<()> {
        persistence::create_dir_all(&self.layout.assets_dir(id))?;
        if has_chapters {
            persistence::create_dir_all(&self.layout.chapters_dir(id))?;
        } else {
            persistence::create_dir_all(&self.layout.blocks_dir(id))?;
        }

        let mut doc = Document::new(id, title, author, has_chapters);
        self.save(&mut doc)
    }

    fn unique_id(&self, title: &str) -> String {
        let mut base = slugify(title, MAX_SLUG_LEN);
        if base.is_empty() {
            base = FALLBACK_SLUG.to_string();
        }

        let mut candidate = base.clone();
        let mut counter = 1;
        while self.layout.document_dir(&candidate).exists() {
            candidate = format!("{}-{}", base, counter);
            counter += 1;
        }
        candidate
    }

    /// Load a manifest
    pub fn get(&self, id: &str) -> StoreResult<Document> {
        check_id(id)?;
        let path = self.layout.manifest_path(id);
        let mut doc: Document = persistence::read_json(&path).map_err(|e| match e {
            StoreError::FileNotFound { .. } => StoreError::DocumentNotFound { id: id.to_string() },
            other => other,
        })?;
        doc.id = id.to_string();
        Ok(doc)
    }

    /// Write a manifest, stamping `updated_at`
    pub fn save(&self, doc: &mut Document) -> StoreResult<()> {
        doc.touch();
        let path = self.layout.manifest_path(&doc.id);
        debug!("Saving manifest {:?}", path);
        persistence::write_json(&path, doc)
    }

    /// IDs of all documents, sorted
    ///
    /// Folders without a manifest are ignored. A missing documents root is
    /// an empty store, not an error.
    pub fn list(&self) -> StoreResult<Vec<String>> {
        let root = self.layout.root();
        let entries = match fs::read_dir(root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StoreError::from_read(e, root.to_path_buf())),
        };

        let mut ids = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| StoreError::from_read(e, root.to_path_buf()))?;
            if !entry.path().is_dir() {
                continue;
            }
            let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                debug!("Skipping non UTF-8 folder {:?}", entry.path());
                continue;
            };
            if self.layout.manifest_path(&name).is_file() {
                ids.push(name);
            }
        }
        ids.sort();
        Ok(ids)
    }

    /// Summaries for every readable document, in ID order
    pub fn summaries(&self) -> StoreResult<Vec<DocumentSummary>> {
        let mut summaries = Vec::new();
        for id in self.list()? {
            match self.get(&id) {
                Ok(doc) => summaries.push(DocumentSummary::from(&doc)),
                Err(e) => warn!("Skipping document '{}': {}", id, e),
            }
        }
        Ok(summaries)
    }

    /// Remove a document folder and everything in it
    ///
    /// Only folders that `list` would report are removed: the ID must name
    /// a single folder holding a manifest.
    pub fn delete(&self, id: &str) -> StoreResult<()> {
        if !self.exists(id) {
            return Err(StoreError::DocumentNotFound { id: id.to_string() });
        }
        let doc_dir = self.layout.document_dir(id);
        persistence::remove_dir_all(&doc_dir)?;
        info!("Deleted document '{}'", id);
        Ok(())
    }

    pub fn exists(&self, id: &str) -> bool {
        layout::is_document_id(id) && self.layout.manifest_path(id).is_file()
    }
}

/// Reject IDs that do not name a folder directly under the root
pub(crate) fn check_id(id: &str) -> StoreResult<()> {
    if layout::is_document_id(id) {
        Ok(())
    } else {
        Err(StoreError::DocumentNotFound { id: id.to_string() })
    }
}
