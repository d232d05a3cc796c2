//! Storage layer
//!
//! Handles file layout, atomic persistence and the per-document write guard.
//!
//! ## Architecture
//!
//! - **Layout**: every path is derived from the documents root
//! - **Persistence**: JSON and text files, written atomically
//! - **Guard**: optional per-document lock around mutations
//!
//! Each document, chapter and block is its own file. There is no
//! transaction across files; the manifest is written last so a crash leaves
//! at worst an orphaned content file.

pub mod error;
pub mod guard;
pub mod layout;
pub mod persistence;

pub use error::{ErrorKind, StoreError, StoreResult};
pub use guard::{DocumentLease, DocumentLocks, LockStrategy};
pub use layout::Layout;
