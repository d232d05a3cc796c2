//! File persistence primitives
//!
//! Every manifest, chapter file and block file goes through these helpers.
//! Writes are atomic (write to temp file, sync, then rename) so a file is
//! never left in a partially-written state; a crash between two writes can
//! still leave the *set* of files inconsistent.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;
use uuid::Uuid;

use super::error::{StoreError, StoreResult};

/// Read and deserialize a JSON file
pub fn read_json<T: DeserializeOwned>(path: &Path) -> StoreResult<T> {
    let content = read_text(path)?;
    serde_json::from_str(&content).map_err(|e| StoreError::InvalidFormat {
        path: path.to_path_buf(),
        details: e.to_string(),
    })
}

/// Serialize a value as pretty JSON and write it atomically
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> StoreResult<()> {
    let mut content = serde_json::to_string_pretty(value).map_err(|e| {
        StoreError::InvalidFormat {
            path: path.to_path_buf(),
            details: e.to_string(),
        }
    })?;
    content.push('\n');
    atomic_write(path, content.as_bytes())
}

/// Read a UTF-8 text file
pub fn read_text(path: &Path) -> StoreResult<String> {
    fs::read_to_string(path).map_err(|e| StoreError::from_read(e, path.to_path_buf()))
}

/// Write a UTF-8 text file atomically
pub fn write_text(path: &Path, content: &str) -> StoreResult<()> {
    atomic_write(path, content.as_bytes())
}

/// Create a directory and all missing parents
pub fn create_dir_all(path: &Path) -> StoreResult<()> {
    fs::create_dir_all(path).map_err(|source| StoreError::CreateDirectory {
        path: path.to_path_buf(),
        source,
    })
}

/// Remove a file, treating an already-missing file as success
///
/// Returns whether a file was actually removed.
pub fn remove_file_if_exists(path: &Path) -> StoreResult<bool> {
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            debug!("Nothing to remove at {:?}", path);
            Ok(false)
        }
        Err(source) => Err(StoreError::RemoveError {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Recursively remove a directory
pub fn remove_dir_all(path: &Path) -> StoreResult<()> {
    fs::remove_dir_all(path).map_err(|source| StoreError::RemoveError {
        path: path.to_path_buf(),
        source,
    })
}

/// Write data to a file atomically
///
/// 1. Write to a uniquely named temporary file in the same directory
/// 2. Sync the file to disk
/// 3. Rename the temp file to the target path
///
/// The temp name is unique per call, so unguarded concurrent writers of the
/// same file never interleave bytes; the last rename wins.
pub fn atomic_write(path: &Path, data: &[u8]) -> StoreResult<()> {
    if let Some(parent) = path.parent() {
        create_dir_all(parent)?;
    }

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let temp_path = path.with_file_name(format!(
        ".{}.{}.tmp",
        file_name,
        Uuid::new_v4().simple()
    ));

    let mut file =
        File::create(&temp_path).map_err(|e| StoreError::from_io(e, temp_path.clone()))?;

    let written = file.write_all(data).and_then(|_| file.sync_all());
    if let Err(e) = written {
        let _ = fs::remove_file(&temp_path);
        return Err(StoreError::from_io(e, temp_path));
    }

    fs::rename(&temp_path, path).map_err(|source| {
        let _ = fs::remove_file(&temp_path);
        StoreError::AtomicWriteFailed {
            from: temp_path.clone(),
            to: path.to_path_buf(),
            source,
        }
    })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use tempfile::TempDir;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Sample {
        name: String,
        items: Vec<u32>,
    }

    #[test]
    fn test_atomic_write_creates_parent_dirs() {
        let temp_dir = TempDir::new().unwrap();
        let nested_path = temp_dir
            .path()
            .join("a")
            .join("b")
            .join("c")
            .join("file.txt");

        atomic_write(&nested_path, b"test data").unwrap();

        assert!(nested_path.exists());
        let content = fs::read_to_string(&nested_path).unwrap();
        assert_eq!(content, "test data");
    }

    #[test]
    fn test_atomic_write_leaves_no_temp_files() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("manifest.json");

        atomic_write(&path, b"one").unwrap();
        atomic_write(&path, b"two").unwrap();

        let names: Vec<_> = fs::read_dir(temp_dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["manifest.json".to_string()]);
        assert_eq!(fs::read_to_string(&path).unwrap(), "two");
    }

    #[test]
    fn test_json_round_trip_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("sample.json");
        let sample = Sample {
            name: "x".to_string(),
            items: vec![1, 2, 3],
        };

        write_json(&path, &sample).unwrap();
        let loaded: Sample = read_json(&path).unwrap();
        assert_eq!(loaded, sample);
        assert!(fs::read_to_string(&path).unwrap().ends_with('\n'));
    }

    #[test]
    fn test_read_json_malformed() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("broken.json");
        fs::write(&path, "{ not json").unwrap();

        let err = read_json::<Sample>(&path).unwrap_err();
        assert!(matches!(err, StoreError::InvalidFormat { .. }));
    }

    #[test]
    fn test_read_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let err = read_text(&temp_dir.path().join("nope.md")).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_remove_file_if_exists() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("gone.md");
        fs::write(&path, "bye").unwrap();

        assert!(remove_file_if_exists(&path).unwrap());
        assert!(!remove_file_if_exists(&path).unwrap());
    }
}
