//! # Pagecache Coordinator
//!
//! Page-scoped data-loading cache. Consumers ask for a key and a
//! requirement set; the coordinator answers from memory, from a validated
//! snapshot, from a load already in flight, or with one fresh batch load.
//!
//! ## Features
//!
//! - TTL freshness judged against an injectable clock
//! - In-flight coalescing: N concurrent loads of a key, one round-trip
//! - Hard tenant-scope isolation and per-scope teardown
//! - Snapshot persistence with schema validation on read-back
//! - Bounded background preload
//! - Prometheus metrics via the `metrics` crate

pub mod cache;
pub mod coordinator;
pub mod loader;
pub mod metrics;
pub mod settings;

pub use cache::{InFlightRegistry, MemoryCache};
pub use coordinator::{
    CacheCoordinator, CacheStats, CoordinatorBuilder, PreloadReport, PreloadRequest,
    TeardownReport,
};
pub use loader::{BatchLoader, DataSource, SimulatedSource};
pub use metrics::{CacheMetrics, HitTier, init_metrics};
pub use settings::{CoordinatorSettings, SettingsError, SnapshotBackend, SnapshotSettings};

// Re-export the lower crates for consumers
pub use pagecache_core;
pub use pagecache_store;

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
