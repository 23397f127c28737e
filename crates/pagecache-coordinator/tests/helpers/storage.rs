//! Storage media with controllable timing.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use pagecache_coordinator::pagecache_store::{MemoryStorage, SessionStorage, StorageError};

/// In-memory storage whose reads stall after fetching the value, leaving
/// a window between "snapshot read" and "snapshot used".
#[derive(Debug, Default)]
pub struct StallingStorage {
    inner: MemoryStorage,
    read_stall_ms: AtomicU64,
}

impl StallingStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every following `get_item` blocks its thread for `stall` after reading.
    pub fn stall_reads(&self, stall: Duration) {
        self.read_stall_ms
            .store(stall.as_millis() as u64, Ordering::SeqCst);
    }
}

impl SessionStorage for StallingStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        let value = self.inner.get_item(key)?;
        let stall = self.read_stall_ms.load(Ordering::SeqCst);
        if stall > 0 {
            std::thread::sleep(Duration::from_millis(stall));
        }
        Ok(value)
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.inner.set_item(key, value)
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        self.inner.remove_item(key)
    }

    fn keys(&self) -> Result<Vec<String>, StorageError> {
        self.inner.keys()
    }

    fn name(&self) -> &str {
        "stalling-memory"
    }
}
