//! In-process storage medium.

use std::collections::HashMap;

use parking_lot::RwLock;

use super::SessionStorage;
use crate::error::StorageError;

/// Process-local storage, optionally bounded by a byte quota.
///
/// Sizes are counted as `key.len() + value.len()`, which is close enough to
/// what browsers charge against a session-storage quota.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    items: RwLock<HashMap<String, String>>,
    quota: Option<usize>,
    disabled: bool,
}

impl MemoryStorage {
    /// Creates an unbounded medium.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a medium that refuses writes past `bytes`.
    pub fn with_quota(bytes: usize) -> Self {
        Self {
            quota: Some(bytes),
            ..Self::default()
        }
    }

    /// Creates a medium on which every operation fails.
    pub fn disabled() -> Self {
        Self {
            disabled: true,
            ..Self::default()
        }
    }

    /// Number of stored items.
    pub fn len(&self) -> usize {
        self.items.read().len()
    }

    /// Returns true if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.items.read().is_empty()
    }

    /// Bytes currently charged against the quota.
    pub fn used_bytes(&self) -> usize {
        self.items
            .read()
            .iter()
            .map(|(k, v)| k.len() + v.len())
            .sum()
    }

    fn ensure_enabled(&self) -> Result<(), StorageError> {
        if self.disabled {
            return Err(StorageError::unavailable("storage disabled"));
        }
        Ok(())
    }
}

impl SessionStorage for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.ensure_enabled()?;
        Ok(self.items.read().get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.ensure_enabled()?;

        let mut items = self.items.write();

        if let Some(limit) = self.quota {
            let others: usize = items
                .iter()
                .filter(|(k, _)| k.as_str() != key)
                .map(|(k, v)| k.len() + v.len())
                .sum();
            let needed = others + key.len() + value.len();
            if needed > limit {
                return Err(StorageError::QuotaExceeded { needed, limit });
            }
        }

        items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        self.ensure_enabled()?;
        self.items.write().remove(key);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, StorageError> {
        self.ensure_enabled()?;
        Ok(self.items.read().keys().cloned().collect())
    }

    fn name(&self) -> &str {
        "memory"
    }
}
