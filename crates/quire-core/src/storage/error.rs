//! Storage error handling
//!
//! Provides typed errors for store operations with descriptive messages
//! and recovery suggestions.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

use crate::block::BlockKind;

/// Coarse classification of a [`StoreError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A document, chapter, block or file is absent
    NotFound,
    /// An update tried to change a block's type
    TypeMismatch,
    /// The caller passed something the store cannot accept
    InvalidArgument,
    /// The operation exists but is deliberately not supported
    Unsupported,
    /// Another writer holds the document's lock
    Locked,
    /// Underlying read/write/serialize failure
    Io,
}

/// Errors that can occur during store operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// No document folder or manifest for this ID
    #[error("Document not found: '{id}'")]
    DocumentNotFound { id: String },

    /// The document has no chapter with this ID (or no chapters at all)
    #[error("Chapter '{chapter}' not found in document '{document}'")]
    ChapterNotFound { document: String, chapter: String },

    /// No scope of the document holds this block
    #[error("Block '{block}' not found in document '{document}'")]
    BlockNotFound { document: String, block: String },

    /// An update supplied a block of a different type than the stored one
    #[error("Cannot change block '{block}' from {expected} to {actual}")]
    TypeMismatch {
        block: String,
        expected: BlockKind,
        actual: BlockKind,
    },

    /// Chapter operations on a document created without chapters
    #[error("Document '{document}' does not support chapters")]
    ChaptersNotSupported { document: String },

    /// Invalid input (bad heading level, empty query, ...)
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Operation outside what the store supports
    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    /// A lock file for the document already exists
    #[error("Document '{document}' is locked by another writer ('{path}')")]
    Locked { document: String, path: PathBuf },

    /// Failed to create a directory
    #[error("Failed to create directory '{path}': {source}")]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Permission denied accessing path
    #[error("Permission denied: cannot access '{path}'. Check file permissions.")]
    PermissionDenied {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Disk is full or quota exceeded
    #[error(
        "Disk full or quota exceeded while writing to '{path}'. Free up disk space and try again."
    )]
    DiskFull {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Failed to read file
    #[error("Failed to read '{path}': {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Failed to write file
    #[error("Failed to write '{path}': {source}")]
    WriteError {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Failed to remove a file or folder
    #[error("Failed to remove '{path}': {source}")]
    RemoveError {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// File contents could not be parsed
    #[error("Invalid format in '{path}': {details}")]
    InvalidFormat { path: PathBuf, details: String },

    /// File not found (when expected to exist)
    #[error("File not found: '{path}'")]
    FileNotFound { path: PathBuf },

    /// Atomic write failed during rename
    #[error("Atomic write failed: could not rename '{from}' to '{to}': {source}")]
    AtomicWriteFailed {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Generic I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl StoreError {
    /// Create an error from a failed read with path context
    pub fn from_read(error: io::Error, path: PathBuf) -> Self {
        match error.kind() {
            io::ErrorKind::NotFound => StoreError::FileNotFound { path },
            io::ErrorKind::PermissionDenied => StoreError::PermissionDenied {
                path,
                source: error,
            },
            _ => StoreError::ReadError {
                path,
                source: error,
            },
        }
    }

    /// Create an error from an I/O error with path context
    ///
    /// Classifies the error based on its kind (permission, disk full, etc.)
    pub fn from_io(error: io::Error, path: PathBuf) -> Self {
        match error.kind() {
            io::ErrorKind::PermissionDenied => StoreError::PermissionDenied {
                path,
                source: error,
            },
            io::ErrorKind::NotFound => StoreError::FileNotFound { path },
            _ if is_disk_full_error(&error) => StoreError::DiskFull {
                path,
                source: error,
            },
            _ => StoreError::WriteError {
                path,
                source: error,
            },
        }
    }

    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            StoreError::DocumentNotFound { .. }
            | StoreError::ChapterNotFound { .. }
            | StoreError::BlockNotFound { .. }
            | StoreError::FileNotFound { .. } => ErrorKind::NotFound,
            StoreError::TypeMismatch { .. } => ErrorKind::TypeMismatch,
            StoreError::ChaptersNotSupported { .. } | StoreError::InvalidArgument(_) => {
                ErrorKind::InvalidArgument
            }
            StoreError::Unsupported(_) => ErrorKind::Unsupported,
            StoreError::Locked { .. } => ErrorKind::Locked,
            StoreError::CreateDirectory { .. }
            | StoreError::PermissionDenied { .. }
            | StoreError::DiskFull { .. }
            | StoreError::ReadError { .. }
            | StoreError::WriteError { .. }
            | StoreError::RemoveError { .. }
            | StoreError::InvalidFormat { .. }
            | StoreError::AtomicWriteFailed { .. }
            | StoreError::Io(_) => ErrorKind::Io,
        }
    }

    /// Shorthand for `kind() == ErrorKind::NotFound`
    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }

    /// Get a recovery suggestion for this error
    pub fn recovery_suggestion(&self) -> Option<&'static str> {
        match self {
            StoreError::DiskFull { .. } => Some("Free up disk space and try again."),
            StoreError::PermissionDenied { .. } => {
                Some("Check file and directory permissions. You may need to run with different permissions or change ownership.")
            }
            StoreError::CreateDirectory { .. } => {
                Some("Check that the parent directory exists and you have write permissions.")
            }
            StoreError::Locked { .. } => {
                Some("Wait for the other writer to finish. If no other writer is running, remove the stale .lock file.")
            }
            StoreError::InvalidFormat { .. } => {
                Some("The file was edited by hand or partially written. Fix or remove it and retry.")
            }
            _ => None,
        }
    }
}

/// Check if an I/O error indicates disk full condition
fn is_disk_full_error(error: &io::Error) -> bool {
    let msg = error.to_string().to_lowercase();
    msg.contains("no space left")
        || msg.contains("disk full")
        || msg.contains("quota exceeded")
        || msg.contains("not enough space")
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;
