//! Session-scoped key/value storage media.

mod file;
mod memory;

pub use file::FileStorage;
pub use memory::MemoryStorage;

use crate::error::StorageError;

/// A durable, synchronous key/value medium scoped to the browsing session.
///
/// This trait abstracts over where snapshots physically live so the
/// snapshot adapter can be exercised against an in-process map, a
/// directory on disk, or a medium that always fails.
///
/// # Implementors
///
/// - `MemoryStorage` - process-local map with an optional byte quota
/// - `FileStorage` - one file per key under a directory
///
/// # Example
///
/// ```
/// use pagecache_store::{MemoryStorage, SessionStorage};
///
/// let storage = MemoryStorage::new();
/// storage.set_item("a", "1").unwrap();
/// assert_eq!(storage.get_item("a").unwrap().as_deref(), Some("1"));
/// ```
pub trait SessionStorage: Send + Sync {
    /// Reads the value stored under `key`.
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Stores `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// - `StorageError::QuotaExceeded` if the medium is full
    /// - `StorageError::Unavailable` if the medium is disabled
    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Removes `key`. Removing a missing key is not an error.
    fn remove_item(&self, key: &str) -> Result<(), StorageError>;

    /// Enumerates every stored key.
    fn keys(&self) -> Result<Vec<String>, StorageError>;

    /// Returns the name of this medium, for logging.
    fn name(&self) -> &str;

    /// Removes every key starting with `prefix`, returning how many went.
    ///
    /// The default implementation is a key scan followed by removals; no
    /// value is read or decoded.
    fn remove_prefixed(&self, prefix: &str) -> Result<usize, StorageError> {
        let doomed: Vec<String> = self
            .keys()?
            .into_iter()
            .filter(|k| k.starts_with(prefix))
            .collect();

        for key in &doomed {
            self.remove_item(key)?;
        }

        Ok(doomed.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_remove_prefixed() {
        let storage = MemoryStorage::new();
        storage.set_item("ns:a:1", "x").unwrap();
        storage.set_item("ns:a:2", "x").unwrap();
        storage.set_item("ns:b:1", "x").unwrap();

        assert_eq!(storage.remove_prefixed("ns:a:").unwrap(), 2);

        let mut keys = storage.keys().unwrap();
        keys.sort();
        assert_eq!(keys, vec!["ns:b:1".to_string()]);
    }
}
