//! Pagecache Core - Domain types and traits
//!
//! This crate provides the foundational types shared by the snapshot store
//! and the cache coordinator: scopes and keys, requirement sets, cache
//! entries and their durable snapshot form, dataset payloads, clocks and
//! the error taxonomy surfaced to callers.

pub mod clock;
pub mod dataset;
pub mod entry;
pub mod error;
pub mod key;
pub mod requirements;
pub mod session;

pub use clock::{Clock, ManualClock, SystemClock};
pub use dataset::{Dataset, Page, json_kind};
pub use entry::{Aggregate, CacheEntry, SNAPSHOT_SCHEMA_VERSION, SnapshotRecord};
pub use error::{CacheError, FetchError, Result};
pub use key::{CacheKey, Scope};
pub use requirements::{
    CUSTOM_GROUP, CustomLoader, Group, MODULE_GROUP, REFERENCE_GROUP, RequirementSet,
    SESSION_GROUP,
};
pub use session::{SessionAccessor, StaticSession};

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_is_defined() {
        assert!(!version().is_empty());
    }

    #[test]
    fn version_is_semver() {
        let v = version();
        assert_eq!(v.split('.').count(), 3, "Version should be semver");
    }
}
