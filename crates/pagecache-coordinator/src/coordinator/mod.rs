//! The cache coordinator: the single entry point consumers call.
//!
//! A `load` walks the tiers in order and stops at the first one that can
//! answer: in-memory cache, snapshot store, a load already in flight, and
//! finally a fresh batch load.

mod builder;
mod invalidation;
mod preload;

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use futures::FutureExt;
use pagecache_core::{
    CacheEntry, CacheError, CacheKey, Clock, RequirementSet, SessionAccessor, SnapshotRecord,
};
use pagecache_store::{SnapshotStore, SnapshotValidator};
use parking_lot::Mutex;
use tracing::{debug, trace, warn};

use crate::cache::{InFlightGuard, InFlightRegistry, MemoryCache, PendingLoad};
use crate::loader::BatchLoader;
use crate::metrics::{CacheMetrics, HitTier};

pub use builder::CoordinatorBuilder;
pub use invalidation::TeardownReport;
pub use preload::{PreloadReport, PreloadRequest};

/// Snapshot of the coordinator counters.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheStats {
    /// Entries currently in memory (fresh or stale).
    pub entries: u64,
    /// Loads currently in flight.
    pub in_flight: usize,
    pub memory_hits: u64,
    pub snapshot_hits: u64,
    pub misses: u64,
    /// Loads that joined one already in flight.
    pub coalesced: u64,
    /// Fresh batch loads started.
    pub fetches: u64,
    pub failures: u64,
    /// Snapshots discarded as stale, invalid or unreadable.
    pub rejections: u64,
    pub hit_rate: f64,
}

pub(crate) struct Inner {
    pub(crate) ttl: Duration,
    pub(crate) preload_concurrency: usize,
    pub(crate) memory: MemoryCache,
    pub(crate) in_flight: Arc<InFlightRegistry>,
    pub(crate) snapshots: SnapshotStore,
    pub(crate) validator: SnapshotValidator,
    pub(crate) loader: BatchLoader,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) metrics: CacheMetrics,
    pub(crate) session: Option<Arc<dyn SessionAccessor>>,
    /// Serializes "still current? then write" against invalidation.
    pub(crate) write_lock: Mutex<()>,
    /// Bumped under `write_lock` by every invalidation and teardown.
    pub(crate) epoch: AtomicU64,
}

/// Coordinador de cache por pagina.
///
/// Barato de clonar: todos los clones comparten el mismo cache en memoria,
/// registro de cargas en vuelo y snapshot store.
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
/// use pagecache_coordinator::{CacheCoordinator, SimulatedSource};
/// use pagecache_core::{CacheKey, RequirementSet};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let coordinator = CacheCoordinator::builder(Arc::new(SimulatedSource::crm_fixture())).build()?;
///
/// let key = CacheKey::new("acme", "/customers");
/// let requirements = RequirementSet::new().with_session().with_module("customers");
///
/// let entry = coordinator.load(&key, &requirements).await?;
/// println!("{} rows", entry.dataset("moduleData", "customers").map_or(0, Vec::len));
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct CacheCoordinator {
    inner: Arc<Inner>,
}

impl CacheCoordinator {
    /// Starts building a coordinator over `source`.
    pub fn builder(source: Arc<dyn crate::loader::DataSource>) -> CoordinatorBuilder {
        CoordinatorBuilder::new(source)
    }

    pub(crate) fn from_inner(inner: Inner) -> Self {
        Self {
            inner: Arc::new(inner),
        }
    }

    /// Returns the aggregate for `key`, loading it only when no tier can
    /// answer.
    ///
    /// Concurrent callers for the same key share one load. The load runs on
    /// its own task, so dropping the returned future does not cancel it for
    /// the other callers.
    ///
    /// # Errors
    ///
    /// `CacheError::Fetch` when a group of the batch load failed, or
    /// `CacheError::LoadAborted` when the load task died. Storage and
    /// validation problems are never returned; they count as misses.
    pub async fn load(
        &self,
        key: &CacheKey,
        requirements: &RequirementSet,
    ) -> Result<Arc<CacheEntry>, CacheError> {
        let start = Instant::now();
        let inner = &self.inner;
        let now = inner.clock.now_millis();

        if let Some(entry) = inner
            .memory
            .get(key)
            .filter(|entry| entry.is_fresh(now, inner.ttl))
        {
            inner.metrics.record_hit(HitTier::Memory);
            inner
                .metrics
                .record_operation_duration("load_memory_hit", start.elapsed());
            trace!(key = %key, "Memory hit");
            return Ok(entry);
        }

        let epoch = inner.epoch.load(Ordering::SeqCst);
        if let Some(entry) = self
            .read_snapshot(key, now)
            .filter(|entry| inner.promote(key, entry, epoch))
        {
            inner.metrics.record_hit(HitTier::Snapshot);
            inner
                .metrics
                .record_operation_duration("load_snapshot_hit", start.elapsed());
            debug!(key = %key, timestamp = entry.timestamp, "Snapshot promoted to memory");
            return Ok(entry);
        }

        let registration = inner.in_flight.get_or_register(key, |generation| {
            self.spawn_load(key.clone(), requirements.clone(), generation)
        });

        let operation = if registration.is_joined() {
            inner.metrics.record_coalesced();
            debug!(key = %key, "Joined load in flight");
            "load_coalesced"
        } else {
            inner.metrics.record_miss();
            debug!(key = %key, "Cache miss, load started");
            "load_fetch"
        };

        let result = registration.into_load().await;
        inner
            .metrics
            .record_operation_duration(operation, start.elapsed());
        result
    }

    /// Current in-memory entry for `key`, fresh or stale.
    ///
    /// Never loads and never touches the snapshot store.
    pub fn peek(&self, key: &CacheKey) -> Option<Arc<CacheEntry>> {
        self.inner.memory.get(key)
    }

    /// Invalidates `key` and loads it again, so the result is one fresh
    /// round-trip (or joins a load another caller started after the
    /// invalidation).
    pub async fn refresh(
        &self,
        key: &CacheKey,
        requirements: &RequirementSet,
    ) -> Result<Arc<CacheEntry>, CacheError> {
        self.invalidate(Some(key));
        self.load(key, requirements).await
    }

    /// Returns true if `key` has a load in flight.
    pub fn is_loading(&self, key: &CacheKey) -> bool {
        self.inner.in_flight.contains(key)
    }

    /// Key for `identifier` in the current session scope, when a session
    /// accessor is configured.
    pub fn current_key(&self, identifier: &str) -> Option<CacheKey> {
        self.inner
            .session
            .as_ref()
            .map(|session| session.key_for(identifier))
    }

    /// Configured TTL.
    pub fn ttl(&self) -> Duration {
        self.inner.ttl
    }

    /// Namespace of the snapshot storage keys.
    pub fn namespace(&self) -> &str {
        self.inner.snapshots.namespace()
    }

    /// Name of the data source behind the loader.
    pub fn source_name(&self) -> &str {
        self.inner.loader.source_name()
    }

    /// Metrics recorder shared by this coordinator.
    pub fn metrics(&self) -> &CacheMetrics {
        &self.inner.metrics
    }

    /// Counters since the coordinator was built.
    pub fn stats(&self) -> CacheStats {
        let inner = &self.inner;
        inner.memory.sync();
        let metrics = &inner.metrics;

        CacheStats {
            entries: inner.memory.entry_count(),
            in_flight: inner.in_flight.len(),
            memory_hits: metrics.memory_hits(),
            snapshot_hits: metrics.snapshot_hits(),
            misses: metrics.misses(),
            coalesced: metrics.coalesced(),
            fetches: metrics.fetches(),
            failures: metrics.failures(),
            rejections: metrics.rejections(),
            hit_rate: metrics.hit_rate(),
        }
    }

    /// Reads, validates and freshness-checks the snapshot of `key`.
    ///
    /// Every way a snapshot can be unusable ends up as `None`.
    fn read_snapshot(&self, key: &CacheKey, now: u64) -> Option<Arc<CacheEntry>> {
        let inner = &self.inner;

        let raw = match inner.snapshots.read(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                inner.metrics.record_rejection("unreadable");
                debug!(
                    key = %key,
                    medium = %inner.snapshots.medium(),
                    error = %e,
                    "Snapshot unreadable, treated as miss"
                );
                return None;
            },
        };

        let record = match inner.validator.validate(&raw) {
            Ok(record) => record,
            Err(e) => {
                inner.metrics.record_rejection("invalid");
                debug!(key = %key, path = ?e.path(), error = %e, "Snapshot rejected");
                return None;
            },
        };

        let entry = CacheEntry::from(record);
        if !entry.is_fresh(now, inner.ttl) {
            inner.metrics.record_rejection("stale");
            trace!(key = %key, timestamp = entry.timestamp, "Snapshot stale");
            return None;
        }

        Some(Arc::new(entry))
    }

    /// Spawns the batch load for `key` and wraps it in a shareable future.
    ///
    /// Called with the registry lock held: nothing here may touch the
    /// registry synchronously.
    fn spawn_load(
        &self,
        key: CacheKey,
        requirements: RequirementSet,
        generation: u64,
    ) -> PendingLoad {
        let inner = Arc::clone(&self.inner);
        let task_key = key.clone();

        let handle = tokio::spawn(async move {
            let guard =
                InFlightGuard::new(Arc::clone(&inner.in_flight), task_key.clone(), generation);
            inner.metrics.record_fetch();
            let start = Instant::now();

            let result = inner.loader.load(task_key.scope(), &requirements).await;
            inner
                .metrics
                .record_operation_duration("fetch", start.elapsed());

            match result {
                Ok(data) => {
                    let entry = Arc::new(CacheEntry::new(data, inner.clock.now_millis()));
                    inner.commit(&task_key, &entry, &guard);
                    Ok(entry)
                },
                Err(e) => {
                    inner.metrics.record_failure();
                    warn!(key = %task_key, error = %e, "Load failed");
                    Err(e)
                },
            }
        });

        let registry = Arc::clone(&self.inner.in_flight);
        async move {
            match handle.await {
                Ok(result) => result,
                Err(e) => {
                    // The task never ran to completion; its guard may not exist.
                    registry.clear(&key, generation);
                    warn!(key = %key, error = %e, "Load task aborted");
                    Err(CacheError::aborted(e.to_string()))
                },
            }
        }
        .boxed()
        .shared()
    }
}

impl Inner {
    /// Copies a snapshot entry into memory, unless an invalidation ran
    /// since `epoch` was read. Returns false when the snapshot was dropped.
    fn promote(&self, key: &CacheKey, entry: &Arc<CacheEntry>, epoch: u64) -> bool {
        let _write = self.write_lock.lock();

        if self.epoch.load(Ordering::SeqCst) != epoch {
            debug!(key = %key, "Snapshot superseded by invalidation, not promoted");
            return false;
        }

        self.memory.insert(key.clone(), Arc::clone(entry));
        true
    }

    /// Marks every read that started before now as superseded.
    ///
    /// Callers hold `write_lock`.
    pub(crate) fn bump_epoch(&self) {
        self.epoch.fetch_add(1, Ordering::SeqCst);
    }

    /// Writes a finished load to memory and the snapshot store, unless it
    /// was invalidated while in flight.
    fn commit(&self, key: &CacheKey, entry: &Arc<CacheEntry>, guard: &InFlightGuard) {
        let _write = self.write_lock.lock();

        if !guard.is_current() {
            debug!(key = %key, "Load superseded while in flight, result not cached");
            return;
        }

        self.memory.insert(key.clone(), Arc::clone(entry));

        if let Err(e) = self
            .snapshots
            .write(key, &SnapshotRecord::from(entry.as_ref()))
        {
            warn!(
                key = %key,
                medium = %self.snapshots.medium(),
                error = %e,
                "Snapshot write failed, continuing without persistence"
            );
        }
    }
}
