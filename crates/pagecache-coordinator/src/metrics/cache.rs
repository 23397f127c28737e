//! Cache metrics recording.

use metrics::{counter, gauge, histogram};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Registra las metricas de cache.
/// Llamar una vez al inicio para registrar las metricas.
pub fn register_cache_metrics() {
    metrics::describe_counter!(
        "pagecache_cache_hits_total",
        "Total number of cache hits, by tier"
    );
    metrics::describe_counter!("pagecache_cache_misses_total", "Total number of cache misses");
    metrics::describe_counter!(
        "pagecache_coalesced_total",
        "Loads that joined a request already in flight"
    );
    metrics::describe_counter!("pagecache_fetches_total", "Fresh batch loads started");
    metrics::describe_counter!(
        "pagecache_fetch_failures_total",
        "Fresh batch loads that failed"
    );
    metrics::describe_counter!(
        "pagecache_snapshot_rejections_total",
        "Snapshots discarded as stale, invalid or unreadable"
    );
    metrics::describe_counter!(
        "pagecache_cache_evictions_total",
        "Total number of cache evictions"
    );
    metrics::describe_gauge!("pagecache_cache_entries", "Current number of entries in cache");
    metrics::describe_histogram!(
        "pagecache_operation_seconds",
        "Time spent on cache operations"
    );
}

/// Tier that served a hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitTier {
    /// In-memory cache.
    Memory,
    /// Promoted from the snapshot store.
    Snapshot,
}

impl HitTier {
    fn label(self) -> &'static str {
        match self {
            Self::Memory => "memory",
            Self::Snapshot => "snapshot",
        }
    }
}

/// Recorder de metricas de cache.
/// Usa atomic counters internos para exponer `stats()` sin leer el exporter.
#[derive(Debug, Clone, Default)]
pub struct CacheMetrics {
    memory_hits: Arc<AtomicU64>,
    snapshot_hits: Arc<AtomicU64>,
    misses: Arc<AtomicU64>,
    coalesced: Arc<AtomicU64>,
    fetches: Arc<AtomicU64>,
    failures: Arc<AtomicU64>,
    rejections: Arc<AtomicU64>,
}

impl CacheMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registra un cache hit
    pub fn record_hit(&self, tier: HitTier) {
        match tier {
            HitTier::Memory => self.memory_hits.fetch_add(1, Ordering::Relaxed),
            HitTier::Snapshot => self.snapshot_hits.fetch_add(1, Ordering::Relaxed),
        };
        counter!("pagecache_cache_hits_total", "tier" => tier.label()).increment(1);
    }

    /// Registra un cache miss
    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
        counter!("pagecache_cache_misses_total").increment(1);
    }

    /// Registra una carga que se unio a otra en vuelo
    pub fn record_coalesced(&self) {
        self.coalesced.fetch_add(1, Ordering::Relaxed);
        counter!("pagecache_coalesced_total").increment(1);
    }

    /// Registra el inicio de una carga fresca
    pub fn record_fetch(&self) {
        self.fetches.fetch_add(1, Ordering::Relaxed);
        counter!("pagecache_fetches_total").increment(1);
    }

    /// Registra una carga fallida
    pub fn record_failure(&self) {
        self.failures.fetch_add(1, Ordering::Relaxed);
        counter!("pagecache_fetch_failures_total").increment(1);
    }

    /// Registra un snapshot descartado
    pub fn record_rejection(&self, reason: &'static str) {
        self.rejections.fetch_add(1, Ordering::Relaxed);
        counter!("pagecache_snapshot_rejections_total", "reason" => reason).increment(1);
    }

    /// Registra una eviction
    pub fn record_eviction(&self, reason: &'static str) {
        counter!("pagecache_cache_evictions_total", "reason" => reason).increment(1);
    }

    /// Actualiza el gauge de entries
    pub fn update_entry_count(&self, count: u64) {
        gauge!("pagecache_cache_entries").set(count as f64);
    }

    /// Registra la duracion de una operacion
    pub fn record_operation_duration(&self, operation: &'static str, duration: Duration) {
        histogram!("pagecache_operation_seconds", "operation" => operation)
            .record(duration.as_secs_f64());
    }

    /// Calcula hit rate (para logging/debugging)
    pub fn hit_rate(&self) -> f64 {
        let hits = self.hits() as f64;
        let misses = self.misses() as f64;
        let total = hits + misses;
        if total == 0.0 { 0.0 } else { hits / total }
    }

    /// Retorna el numero de hits de ambos tiers
    pub fn hits(&self) -> u64 {
        self.memory_hits() + self.snapshot_hits()
    }

    pub fn memory_hits(&self) -> u64 {
        self.memory_hits.load(Ordering::Relaxed)
    }

    pub fn snapshot_hits(&self) -> u64 {
        self.snapshot_hits.load(Ordering::Relaxed)
    }

    /// Retorna el numero de misses
    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    pub fn coalesced(&self) -> u64 {
        self.coalesced.load(Ordering::Relaxed)
    }

    pub fn fetches(&self) -> u64 {
        self.fetches.load(Ordering::Relaxed)
    }

    pub fn failures(&self) -> u64 {
        self.failures.load(Ordering::Relaxed)
    }

    pub fn rejections(&self) -> u64 {
        self.rejections.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_metrics_hit_rate() {
        let metrics = CacheMetrics::new();

        // 3 hits, 1 miss = 75% hit rate
        metrics.record_hit(HitTier::Memory);
        metrics.record_hit(HitTier::Memory);
        metrics.record_hit(HitTier::Snapshot);
        metrics.record_miss();

        let rate = metrics.hit_rate();
        assert!((rate - 0.75).abs() < 0.001);
        assert_eq!(metrics.memory_hits(), 2);
        assert_eq!(metrics.snapshot_hits(), 1);
    }

    #[test]
    fn test_load_counters() {
        let metrics = CacheMetrics::new();

        metrics.record_fetch();
        metrics.record_fetch();
        metrics.record_failure();
        metrics.record_coalesced();
        metrics.record_rejection("invalid");

        assert_eq!(metrics.fetches(), 2);
        assert_eq!(metrics.failures(), 1);
        assert_eq!(metrics.coalesced(), 1);
        assert_eq!(metrics.rejections(), 1);
        assert_eq!(metrics.hit_rate(), 0.0);
    }
}
