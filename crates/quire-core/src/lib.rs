//! Quire Core Library
//!
//! This crate provides the core functionality for Quire, a file-backed store
//! of documents assembled from typed content blocks (headings, Markdown,
//! images, tables and page breaks), optionally grouped into chapters.
//!
//! # Architecture
//!
//! - **Folders on disk**: each document is a folder with a JSON manifest,
//!   one file per block and one subfolder per chapter
//! - **Manifests own the order**: block and chapter order live only in the
//!   manifest lists, never in file names
//!
//! # Quick Start
//!
//! ```text
//! let store = Store::open()?;
//!
//! let doc = store.create_document("Field Notes", false, "Ann")?;
//! store.add_block(&doc, &Scope::Document, Block::heading(1, "Intro"), &Position::End)?;
//! store.add_block(&doc, &Scope::Document, Block::markdown("Body text."), &Position::End)?;
//!
//! let hits = store.search(&doc, "body", None)?;
//! ```
//!
//! # Modules
//!
//! - `store`: Unified storage interface (main entry point)
//! - `block`: Block kinds, payloads, previews and Markdown rendering
//! - `models`: Manifest records for documents and chapters
//! - `position`: Insertion positions within ordered lists
//! - `repository`: Document, chapter and block repositories
//! - `overview`, `search`, `content`: Read-side views of a document
//! - `assets`: Importing images into a document
//! - `storage`: Errors, on-disk layout, file I/O and write guards
//! - `config`: Application configuration

pub mod assets;
pub mod block;
pub mod config;
pub mod content;
pub mod models;
pub mod overview;
pub mod position;
pub mod repository;
pub mod search;
pub mod storage;
pub mod store;

pub use block::{Block, BlockKind};
pub use config::Config;
pub use content::DocumentContent;
pub use models::{BlockReference, Chapter, ChapterReference, Document, DocumentSummary};
pub use overview::DocumentOverview;
pub use position::Position;
pub use repository::{BlockKey, LocatedBlock, Location, Scope};
pub use search::SearchResult;
pub use storage::{ErrorKind, LockStrategy, StoreError, StoreResult};
pub use store::Store;
