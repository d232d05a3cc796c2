//! On-disk layout
//!
//! ```text
//! <documents>/<doc-id>/
//!     manifest.json
//!     assets/
//!     blocks/<block files>
//!     chapters/<ch-id>-<slug>/
//!         chapter.json
//!         blocks/<block files>
//! ```
//!
//! Paths stored in manifests and chapter files are relative to the document
//! folder and always use `/`; [`Layout::resolve`] maps them back onto the
//! host filesystem.

use std::path::{Path, PathBuf};

use crate::block::BlockKind;

pub const MANIFEST_FILE: &str = "manifest.json";
pub const CHAPTER_FILE: &str = "chapter.json";
pub const ASSETS_DIR: &str = "assets";
pub const BLOCKS_DIR: &str = "blocks";
pub const CHAPTERS_DIR: &str = "chapters";
pub const LOCK_FILE: &str = ".lock";

/// Path derivation for one documents root
#[derive(Debug, Clone)]
pub struct Layout {
    root: PathBuf,
}

impl Layout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The folder holding one subfolder per document
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn document_dir(&self, doc_id: &str) -> PathBuf {
        self.root.join(doc_id)
    }

    pub fn manifest_path(&self, doc_id: &str) -> PathBuf {
        self.document_dir(doc_id).join(MANIFEST_FILE)
    }

    pub fn assets_dir(&self, doc_id: &str) -> PathBuf {
        self.document_dir(doc_id).join(ASSETS_DIR)
    }

    /// Folder for top-level blocks
    pub fn blocks_dir(&self, doc_id: &str) -> PathBuf {
        self.document_dir(doc_id).join(BLOCKS_DIR)
    }

    pub fn chapters_dir(&self, doc_id: &str) -> PathBuf {
        self.document_dir(doc_id).join(CHAPTERS_DIR)
    }

    pub fn lock_path(&self, doc_id: &str) -> PathBuf {
        self.document_dir(doc_id).join(LOCK_FILE)
    }

    /// `chapter.json` inside a chapter folder (given relative to the document)
    pub fn chapter_file(&self, doc_id: &str, folder: &str) -> PathBuf {
        self.resolve(doc_id, folder).join(CHAPTER_FILE)
    }

    /// Turn a stored `/`-separated relative path into a filesystem path
    pub fn resolve(&self, doc_id: &str, relative: &str) -> PathBuf {
        relative
            .split('/')
            .filter(|part| !part.is_empty())
            .fold(self.document_dir(doc_id), |path, part| path.join(part))
    }
}

/// Whether `doc_id` names exactly one folder directly under the root
///
/// Empty IDs, `.`, `..` and anything with a path separator would resolve to
/// the root itself or escape it.
pub fn is_document_id(doc_id: &str) -> bool {
    !doc_id.is_empty()
        && doc_id != "."
        && doc_id != ".."
        && !doc_id.contains(|c: char| c == '/' || c == '\\')
}

/// Relative folder of a chapter: `chapters/<id>-<slug>`, or `chapters/<id>`
pub fn chapter_folder(chapter_id: &str, slug: &str) -> String {
    if slug.is_empty() {
        format!("{}/{}", CHAPTERS_DIR, chapter_id)
    } else {
        format!("{}/{}-{}", CHAPTERS_DIR, chapter_id, slug)
    }
}

/// File name of a block's content file
pub fn block_file_name(block_id: &str, kind: BlockKind) -> String {
    match kind.file_suffix() {
        Some(suffix) => format!("{}-{}.json", block_id, suffix),
        None => format!("{}.md", block_id),
    }
}

/// Relative path of a block's content file
///
/// `chapter_folder` is the owning chapter's folder, or `None` for top-level
/// blocks.
pub fn block_file(chapter_folder: Option<&str>, block_id: &str, kind: BlockKind) -> String {
    let name = block_file_name(block_id, kind);
    match chapter_folder {
        Some(folder) => format!("{}/{}/{}", folder, BLOCKS_DIR, name),
        None => format!("{}/{}", BLOCKS_DIR, name),
    }
}
