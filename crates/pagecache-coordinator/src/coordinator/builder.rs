//! Builder for [`CacheCoordinator`].

use std::sync::Arc;
use std::sync::atomic::AtomicU64;
use std::time::Duration;

use pagecache_core::{Clock, SessionAccessor, SystemClock};
use pagecache_store::{SessionStorage, SnapshotStore, SnapshotValidator};
use parking_lot::Mutex;
use tracing::info;

use super::{CacheCoordinator, Inner};
use crate::cache::{InFlightRegistry, MemoryCache};
use crate::loader::{BatchLoader, DataSource};
use crate::metrics::CacheMetrics;
use crate::settings::{CoordinatorSettings, SettingsError};

/// Builder for CacheCoordinator.
///
/// Everything except the data source has a default: settings from
/// [`CoordinatorSettings::default`], storage opened from those settings,
/// the system clock and the default entity schemas.
pub struct CoordinatorBuilder {
    source: Arc<dyn DataSource>,
    settings: CoordinatorSettings,
    ttl: Option<Duration>,
    storage: Option<Arc<dyn SessionStorage>>,
    clock: Option<Arc<dyn Clock>>,
    validator: Option<SnapshotValidator>,
    session: Option<Arc<dyn SessionAccessor>>,
    metrics: Option<CacheMetrics>,
}

impl CoordinatorBuilder {
    pub(crate) fn new(source: Arc<dyn DataSource>) -> Self {
        Self {
            source,
            settings: CoordinatorSettings::default(),
            ttl: None,
            storage: None,
            clock: None,
            validator: None,
            session: None,
            metrics: None,
        }
    }

    /// Sets the settings (TTL, capacity, namespace, storage backend).
    pub fn settings(mut self, settings: CoordinatorSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Overrides the TTL with sub-second precision.
    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    /// Sets the snapshot storage medium, ignoring `settings.snapshot`.
    pub fn storage(mut self, storage: Arc<dyn SessionStorage>) -> Self {
        self.storage = Some(storage);
        self
    }

    /// Sets the clock used for timestamps and freshness.
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Sets the snapshot validator.
    pub fn validator(mut self, validator: SnapshotValidator) -> Self {
        self.validator = Some(validator);
        self
    }

    /// Sets the accessor for the current session scope.
    pub fn session(mut self, session: Arc<dyn SessionAccessor>) -> Self {
        self.session = Some(session);
        self
    }

    /// Shares a metrics recorder with other components.
    pub fn metrics(mut self, metrics: CacheMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Builds the coordinator.
    ///
    /// # Errors
    ///
    /// `SettingsError` when the settings are out of range or the
    /// configured storage medium cannot be opened.
    pub fn build(self) -> Result<CacheCoordinator, SettingsError> {
        self.settings.validate()?;

        let ttl = self.ttl.unwrap_or_else(|| self.settings.ttl());
        if ttl.is_zero() {
            return Err(SettingsError::invalid("ttl", "must be greater than zero"));
        }

        let storage = match self.storage {
            Some(storage) => storage,
            None => self.settings.open_storage()?,
        };
        let snapshots = SnapshotStore::with_namespace(storage, self.settings.namespace.clone());
        let metrics = self.metrics.unwrap_or_default();

        info!(
            source = %self.source.name(),
            medium = %snapshots.medium(),
            namespace = %snapshots.namespace(),
            ttl_ms = ttl.as_millis() as u64,
            max_capacity = self.settings.max_capacity,
            "Cache coordinator created"
        );

        Ok(CacheCoordinator::from_inner(Inner {
            ttl,
            preload_concurrency: self.settings.preload_concurrency.max(1),
            memory: MemoryCache::new(self.settings.max_capacity, metrics.clone()),
            in_flight: Arc::new(InFlightRegistry::new()),
            snapshots,
            validator: self.validator.unwrap_or_default(),
            loader: BatchLoader::new(self.source),
            clock: self.clock.unwrap_or_else(|| Arc::new(SystemClock)),
            metrics,
            session: self.session,
            write_lock: Mutex::new(()),
            epoch: AtomicU64::new(0),
        }))
    }
}
