//! Per-document write guard
//!
//! A mutation reads the manifest, changes it and writes it back; two
//! unguarded writers on the same document lose one of the updates. The
//! guard is opt-in via [`LockStrategy`]:
//!
//! - `none`: no locking, last writer wins
//! - `process`: writers sharing one `Store` take turns per document
//! - `lock_file`: a `.lock` file in the document folder; a second writer
//!   (any process) fails fast with [`StoreError::Locked`]

use std::collections::HashSet;
use std::fmt;
use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::{Condvar, Mutex};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::error::{StoreError, StoreResult};

/// How mutating operations are serialized per document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LockStrategy {
    #[default]
    None,
    Process,
    LockFile,
}

impl fmt::Display for LockStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LockStrategy::None => "none",
            LockStrategy::Process => "process",
            LockStrategy::LockFile => "lock_file",
        })
    }
}

impl FromStr for LockStrategy {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "none" | "off" => Ok(LockStrategy::None),
            "process" => Ok(LockStrategy::Process),
            "lock_file" | "lock-file" | "lockfile" | "file" => Ok(LockStrategy::LockFile),
            other => Err(StoreError::InvalidArgument(format!(
                "unknown locking strategy '{}' (expected none, process or lock_file)",
                other
            ))),
        }
    }
}

/// Hands out one lease per document at a time
#[derive(Debug)]
pub struct DocumentLocks {
    strategy: LockStrategy,
    held: Mutex<HashSet<String>>,
    released: Condvar,
}

impl DocumentLocks {
    pub fn new(strategy: LockStrategy) -> Self {
        Self {
            strategy,
            held: Mutex::new(HashSet::new()),
            released: Condvar::new(),
        }
    }

    pub fn strategy(&self) -> LockStrategy {
        self.strategy
    }

    /// Take the lease for `doc_id`, whose folder is `doc_dir`
    ///
    /// Blocks under `process`; fails with `Locked` under `lock_file` when
    /// the lock file already exists.
    pub fn acquire(&self, doc_dir: &Path, doc_id: &str) -> StoreResult<DocumentLease<'_>> {
        let hold = match self.strategy {
            LockStrategy::None => Hold::Nothing,
            LockStrategy::Process => {
                let mut held = self.held.lock().unwrap_or_else(|e| e.into_inner());
                while held.contains(doc_id) {
                    held = self
                        .released
                        .wait(held)
                        .unwrap_or_else(|e| e.into_inner());
                }
                held.insert(doc_id.to_string());
                debug!("Acquired process lock for '{}'", doc_id);
                Hold::Process {
                    locks: self,
                    doc_id: doc_id.to_string(),
                }
            }
            LockStrategy::LockFile => {
                let path = doc_dir.join(super::layout::LOCK_FILE);
                create_lock_file(&path, doc_id)?;
                debug!("Acquired lock file {:?}", path);
                Hold::File { path }
            }
        };
        Ok(DocumentLease { hold })
    }

    fn release(&self, doc_id: &str) {
        let mut held = self.held.lock().unwrap_or_else(|e| e.into_inner());
        held.remove(doc_id);
        self.released.notify_all();
    }
}

fn create_lock_file(path: &Path, doc_id: &str) -> StoreResult<()> {
    match OpenOptions::new().write(true).create_new(true).open(path) {
        Ok(_) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => Err(StoreError::Locked {
            document: doc_id.to_string(),
            path: path.to_path_buf(),
        }),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Err(StoreError::DocumentNotFound {
            id: doc_id.to_string(),
        }),
        Err(e) => Err(StoreError::from_io(e, path.to_path_buf())),
    }
}

#[derive(Debug)]
enum Hold<'a> {
    Nothing,
    Process {
        locks: &'a DocumentLocks,
        doc_id: String,
    },
    File {
        path: PathBuf,
    },
}

/// A held guard; released on drop
#[derive(Debug)]
#[must_use = "the document is unlocked as soon as the lease is dropped"]
pub struct DocumentLease<'a> {
    hold: Hold<'a>,
}

impl Drop for DocumentLease<'_> {
    fn drop(&mut self) {
        match &self.hold {
            Hold::Nothing => {}
            Hold::Process { locks, doc_id } => locks.release(doc_id),
            Hold::File { path } => {
                if let Err(e) = fs::remove_file(path) {
                    if e.kind() != io::ErrorKind::NotFound {
                        warn!("Failed to remove lock file {:?}: {}", path, e);
                    }
                }
            }
        }
    }
}
