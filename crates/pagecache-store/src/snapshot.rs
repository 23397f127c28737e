//! Snapshot store adapter.
//!
//! Storage keys have the form `<namespace>:<scope>:<identifier>`, with
//! scope and identifier url-encoded. Encoding turns any `:` inside them
//! into `%3A`, so `<namespace>:<scope>:` is a literal prefix owned by
//! exactly one scope and scope teardown is a plain key-prefix scan.

use std::sync::Arc;

use pagecache_core::{CacheKey, Scope, SnapshotRecord};
use serde_json::Value;
use tracing::debug;

use crate::error::StorageError;
use crate::storage::SessionStorage;

/// Default namespace for storage keys.
pub const DEFAULT_NAMESPACE: &str = "pagecache";

/// Reads and writes [`SnapshotRecord`]s on a [`SessionStorage`] medium.
///
/// Every operation returns the medium's error untouched; deciding that an
/// error means "no snapshot" is the caller's job.
#[derive(Clone)]
pub struct SnapshotStore {
    storage: Arc<dyn SessionStorage>,
    namespace: String,
}

impl SnapshotStore {
    /// Creates an adapter using the default namespace.
    pub fn new(storage: Arc<dyn SessionStorage>) -> Self {
        Self::with_namespace(storage, DEFAULT_NAMESPACE)
    }

    /// Creates an adapter with a custom namespace.
    pub fn with_namespace(storage: Arc<dyn SessionStorage>, namespace: impl Into<String>) -> Self {
        Self {
            storage,
            namespace: namespace.into(),
        }
    }

    /// Returns the namespace.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Returns the underlying medium's name.
    pub fn medium(&self) -> &str {
        self.storage.name()
    }

    /// Storage key of a cache key.
    ///
    /// # Example
    ///
    /// ```
    /// use std::sync::Arc;
    /// use pagecache_core::CacheKey;
    /// use pagecache_store::{MemoryStorage, SnapshotStore};
    ///
    /// let store = SnapshotStore::new(Arc::new(MemoryStorage::new()));
    /// let key = CacheKey::new("acme", "/customers");
    /// assert_eq!(store.storage_key(&key), "pagecache:acme:%2Fcustomers");
    /// ```
    pub fn storage_key(&self, key: &CacheKey) -> String {
        format!(
            "{}{}",
            self.scope_prefix(key.scope()),
            urlencoding::encode(key.identifier())
        )
    }

    /// Literal prefix shared by every storage key of `scope`.
    pub fn scope_prefix(&self, scope: &Scope) -> String {
        format!(
            "{}:{}:",
            self.namespace,
            urlencoding::encode(scope.as_str())
        )
    }

    /// Serializes and stores a record.
    pub fn write(&self, key: &CacheKey, record: &SnapshotRecord) -> Result<(), StorageError> {
        let json = serde_json::to_string(record)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        self.storage.set_item(&self.storage_key(key), &json)
    }

    /// Reads the raw, not yet validated JSON of a record.
    ///
    /// # Errors
    ///
    /// `StorageError::Corrupt` when the stored text is not JSON at all.
    pub fn read(&self, key: &CacheKey) -> Result<Option<Value>, StorageError> {
        let storage_key = self.storage_key(key);
        let Some(raw) = self.storage.get_item(&storage_key)? else {
            return Ok(None);
        };

        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|e| StorageError::corrupt(storage_key, e.to_string()))
    }

    /// Removes the record of one key.
    pub fn remove(&self, key: &CacheKey) -> Result<(), StorageError> {
        self.storage.remove_item(&self.storage_key(key))
    }

    /// Removes every record of `scope`.
    pub fn remove_by_prefix(&self, scope: &Scope) -> Result<usize, StorageError> {
        let prefix = self.scope_prefix(scope);
        let count = self.storage.remove_prefixed(&prefix)?;
        debug!(scope = %scope, count, "Snapshot records removed by prefix");
        Ok(count)
    }

    /// Removes every record in this namespace, leaving foreign keys alone.
    pub fn clear(&self) -> Result<usize, StorageError> {
        let prefix = format!("{}:", self.namespace);
        let count = self.storage.remove_prefixed(&prefix)?;
        debug!(namespace = %self.namespace, count, "Snapshot namespace cleared");
        Ok(count)
    }
}
