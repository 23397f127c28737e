//! Directory-backed storage medium.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::SessionStorage;
use crate::error::StorageError;

const EXTENSION: &str = "snap";

/// Stores one file per key under a directory.
///
/// Survives a process restart, which makes it the "reload-durable" medium
/// for native hosts. File names are the url-encoded key, so any key maps
/// to a single flat file and decodes back losslessly.
#[derive(Debug, Clone)]
pub struct FileStorage {
    root: PathBuf,
}

impl FileStorage {
    /// Opens (and creates if needed) a storage directory.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        debug!(root = %root.display(), "File storage opened");
        Ok(Self { root })
    }

    /// Returns the storage directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn key_path(&self, key: &str) -> PathBuf {
        self.root
            .join(format!("{}.{EXTENSION}", urlencoding::encode(key)))
    }
}

impl SessionStorage for FileStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        match fs::read_to_string(self.key_path(key)) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.key_path(key);
        let tmp = path.with_extension("tmp");

        // Write-then-rename so readers never observe half a record
        fs::write(&tmp, value)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        match fs::remove_file(self.key_path(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn keys(&self) -> Result<Vec<String>, StorageError> {
        let mut keys = Vec::new();

        for dir_entry in fs::read_dir(&self.root)? {
            let path = dir_entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(EXTENSION) {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            match urlencoding::decode(stem) {
                Ok(key) => keys.push(key.into_owned()),
                Err(e) => debug!(file = %path.display(), error = %e, "Skipping undecodable file"),
            }
        }

        Ok(keys)
    }

    fn name(&self) -> &str {
        "file"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_roundtrip_and_keys() {
        let dir = TempDir::new().unwrap();
        let storage = FileStorage::open(dir.path()).unwrap();

        storage.set_item("pagecache:acme:%2Fcustomers", "{}").unwrap();
        storage.set_item("other", "1").unwrap();

        assert_eq!(
            storage
                .get_item("pagecache:acme:%2Fcustomers")
                .unwrap()
                .as_deref(),
            Some("{}")
        );

        let mut keys = storage.keys().unwrap();
        keys.sort();
        assert_eq!(keys, vec!["other", "pagecache:acme:%2Fcustomers"]);
    }

    #[test]
    fn test_missing_key_and_double_remove() {
        let dir = TempDir::new().unwrap();
        let storage = FileStorage::open(dir.path().join("nested")).unwrap();

        assert!(storage.get_item("nope").unwrap().is_none());
        storage.remove_item("nope").unwrap();
    }

    #[test]
    fn test_survives_reopen() {
        let dir = TempDir::new().unwrap();

        FileStorage::open(dir.path())
            .unwrap()
            .set_item("k", "persisted")
            .unwrap();

        let reopened = FileStorage::open(dir.path()).unwrap();
        assert_eq!(reopened.get_item("k").unwrap().as_deref(), Some("persisted"));
    }

    #[test]
    fn test_ignores_foreign_files() {
        let dir = TempDir::new().unwrap();
        let storage = FileStorage::open(dir.path()).unwrap();
        fs::write(dir.path().join("README.txt"), "hi").unwrap();

        assert!(storage.keys().unwrap().is_empty());
    }
}
