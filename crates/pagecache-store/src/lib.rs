//! # Pagecache Store
//!
//! Durable snapshot persistence for the pagecache coordinator.
//!
//! This crate provides the storage side of the cache: session-scoped
//! key/value media, an adapter that maps cache keys onto prefix-scannable
//! storage keys, and the validator that decides whether a snapshot read
//! back from storage can be trusted.
//!
//! ## Features
//!
//! - `SessionStorage` trait with in-memory and directory-backed media
//! - Url-encoded `<namespace>:<scope>:<identifier>` storage keys
//! - Scope-wide removal by key prefix, without decoding values
//! - Structural and per-entity schema validation of snapshots
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use pagecache_core::{CacheEntry, CacheKey, SnapshotRecord};
//! use pagecache_store::{MemoryStorage, SnapshotStore, SnapshotValidator};
//!
//! let store = SnapshotStore::new(Arc::new(MemoryStorage::new()));
//! let key = CacheKey::new("acme", "/customers");
//!
//! let entry = CacheEntry::new(Default::default(), 1_000);
//! store.write(&key, &SnapshotRecord::from(&entry)).unwrap();
//!
//! let raw = store.read(&key).unwrap().unwrap();
//! let record = SnapshotValidator::new().validate(&raw).unwrap();
//! assert_eq!(record.timestamp, 1_000);
//! ```

pub mod error;
pub mod schema;
pub mod snapshot;
pub mod storage;

// Re-exports
pub use error::{StorageError, ValidationError};
pub use schema::{EntitySchema, FieldKind, SnapshotValidator};
pub use snapshot::{DEFAULT_NAMESPACE, SnapshotStore};
pub use storage::{FileStorage, MemoryStorage, SessionStorage};

// Re-export pagecache_core for consumers
pub use pagecache_core;
