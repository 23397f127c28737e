//! In-memory cache tier using Moka.

use std::sync::Arc;

use moka::notification::RemovalCause;
use moka::sync::Cache;
use pagecache_core::{CacheEntry, CacheKey, Scope};

use crate::metrics::CacheMetrics;

/// Cache en memoria, autoritativo una vez poblado.
///
/// Sobrevive a que los consumidores se recreen pero no a un reinicio del
/// proceso. La frescura no la decide Moka sino el coordinador, comparando el
/// `timestamp` de cada entry con su reloj; Moka solo acota la capacidad.
#[derive(Clone)]
pub struct MemoryCache {
    inner: Cache<CacheKey, Arc<CacheEntry>>,
    metrics: CacheMetrics,
}

impl MemoryCache {
    /// Crea un cache con la capacidad maxima dada.
    pub fn new(max_capacity: u64, metrics: CacheMetrics) -> Self {
        let eviction_metrics = metrics.clone();
        let inner = Cache::builder()
            .max_capacity(max_capacity)
            .eviction_listener(move |_key, _value, cause| {
                let reason = match cause {
                    RemovalCause::Expired => "ttl",
                    RemovalCause::Size => "capacity",
                    RemovalCause::Explicit => "manual",
                    RemovalCause::Replaced => "replaced",
                };
                eviction_metrics.record_eviction(reason);
            })
            .build();

        Self { inner, metrics }
    }

    /// Obtiene la entry actual, fresca o no.
    pub fn get(&self, key: &CacheKey) -> Option<Arc<CacheEntry>> {
        self.inner.get(key)
    }

    /// Inserta o reemplaza una entry.
    pub fn insert(&self, key: CacheKey, entry: Arc<CacheEntry>) {
        self.inner.insert(key, entry);
        self.update_entry_gauge();
    }

    /// Invalida una entrada especifica.
    pub fn invalidate(&self, key: &CacheKey) {
        self.inner.invalidate(key);
        self.update_entry_gauge();
    }

    /// Invalida todas las entradas de un scope y retorna cuantas eran.
    pub fn invalidate_scope(&self, scope: &Scope) -> usize {
        let doomed: Vec<CacheKey> = self
            .inner
            .iter()
            .filter(|(key, _)| key.in_scope(scope))
            .map(|(key, _)| (*key).clone())
            .collect();

        for key in &doomed {
            self.inner.invalidate(key);
        }
        self.update_entry_gauge();

        doomed.len()
    }

    /// Invalida todas las entradas.
    pub fn invalidate_all(&self) {
        self.inner.invalidate_all();
        self.update_entry_gauge();
    }

    /// Retorna el numero aproximado de entries en cache.
    pub fn entry_count(&self) -> u64 {
        self.inner.entry_count()
    }

    /// Claves presentes en este momento (snapshot, puede cambiar).
    pub fn keys(&self) -> Vec<CacheKey> {
        self.inner.iter().map(|(key, _)| (*key).clone()).collect()
    }

    /// Fuerza las tareas pendientes de Moka (contadores, evictions).
    pub fn sync(&self) {
        self.inner.run_pending_tasks();
    }

    fn update_entry_gauge(&self) {
        self.metrics.update_entry_count(self.inner.entry_count());
    }
}
