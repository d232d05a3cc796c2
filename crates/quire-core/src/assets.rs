//! Document assets
//!
//! Images are copied into the document's `assets/` folder so the document
//! folder is self-contained. Each import gets a fresh numbered name; an
//! existing asset is never overwritten.

use std::fs;
use std::path::Path;

use tracing::info;

use crate::storage::layout::{self, Layout, ASSETS_DIR};
use crate::storage::persistence;
use crate::storage::{StoreError, StoreResult};

#[derive(Debug, Clone)]
pub struct AssetStore {
    layout: Layout,
}

impl AssetStore {
    pub fn new(layout: Layout) -> Self {
        Self { layout }
    }

    /// Copy an image into `assets/<stem>-NNN.<ext>`
    ///
    /// Returns the path relative to the document folder, ready to use as an
    /// image block's `path`.
    pub fn import_image(&self, doc_id: &str, source: &Path) -> StoreResult<String> {
        if !layout::is_document_id(doc_id) || !self.layout.manifest_path(doc_id).is_file() {
            return Err(StoreError::DocumentNotFound {
                id: doc_id.to_string(),
            });
        }

        let data = fs::read(source).map_err(|e| StoreError::from_read(e, source.to_path_buf()))?;

        let stem = source
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "image".to_string());
        let extension = source
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy()))
            .unwrap_or_default();

        let assets_dir = self.layout.assets_dir(doc_id);
        let name = (1..)
            .map(|n| format!("{}-{:03}{}", stem, n, extension))
            .find(|name| !assets_dir.join(name).exists())
            .unwrap_or_else(|| format!("{}{}", stem, extension));

        persistence::atomic_write(&assets_dir.join(&name), &data)?;
        info!("Imported {:?} into '{}' as {}", source, doc_id, name);
        Ok(format!("{}/{}", ASSETS_DIR, name))
    }
}
