//! Test helpers para pagecache-coordinator.

#![allow(dead_code, unused_imports)]

pub mod sources;
pub mod storage;

use std::sync::Arc;
use std::time::Duration;

use pagecache_coordinator::pagecache_core::{
    CacheKey, Clock, ManualClock, RequirementSet, SessionAccessor,
};
use pagecache_coordinator::pagecache_store::{MemoryStorage, SessionStorage};
use pagecache_coordinator::{CacheCoordinator, SimulatedSource};

pub use sources::GaugedSource;
pub use storage::StallingStorage;

/// Epoch millis the manual clock starts at.
pub const T0: u64 = 1_700_000_000_000;

/// Default TTL used by the harness (5 minutes).
pub const TTL: Duration = Duration::from_secs(300);

/// A coordinator wired to observable collaborators.
pub struct Harness {
    pub coordinator: CacheCoordinator,
    pub source: Arc<SimulatedSource>,
    pub clock: Arc<ManualClock>,
    pub storage: Arc<MemoryStorage>,
}

impl Harness {
    /// A second coordinator over the same storage and clock, as after a
    /// page reload.
    pub fn reopen(&self, source: Arc<SimulatedSource>) -> CacheCoordinator {
        CacheCoordinator::builder(source)
            .storage(self.storage.clone())
            .clock(self.clock.clone())
            .ttl(TTL)
            .build()
            .unwrap()
    }

    pub fn advance(&self, by: Duration) {
        self.clock.advance(by);
    }
}

/// Harness over the CRM fixture with the given latency.
pub fn harness(latency: Duration) -> Harness {
    harness_with(SimulatedSource::crm_fixture().with_latency(latency))
}

/// Harness over a custom simulated source.
pub fn harness_with(source: SimulatedSource) -> Harness {
    let source = Arc::new(source);
    let clock = Arc::new(ManualClock::new(T0));
    let storage = Arc::new(MemoryStorage::new());

    let coordinator = CacheCoordinator::builder(source.clone())
        .storage(storage.clone())
        .clock(clock.clone())
        .ttl(TTL)
        .build()
        .unwrap();

    Harness {
        coordinator,
        source,
        clock,
        storage,
    }
}

/// Session + countries + customers: three groups per batch load.
pub fn customers_page() -> RequirementSet {
    RequirementSet::new()
        .with_session()
        .with_reference("countries")
        .with_module("customers")
}

/// Session + users: two groups per batch load.
pub fn users_page() -> RequirementSet {
    RequirementSet::new().with_session().with_module("users")
}

pub fn key(scope: &str, identifier: &str) -> CacheKey {
    CacheKey::new(scope, identifier)
}
