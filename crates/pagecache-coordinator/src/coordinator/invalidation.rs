//! Invalidation and teardown.

use pagecache_core::{CacheKey, Scope};
use tracing::{info, warn};

use super::CacheCoordinator;

/// Resultado de un teardown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TeardownReport {
    /// Entries removidas de memoria.
    pub memory: usize,
    /// Cargas en vuelo olvidadas (siguen resolviendo a sus waiters).
    pub in_flight: usize,
    /// Snapshots removidos del storage.
    pub snapshots: usize,
}

impl CacheCoordinator {
    /// Invalida una key, o todo el namespace con `None`.
    ///
    /// Una key invalidada desaparece de memoria, del registro de cargas en
    /// vuelo y del snapshot store. Nunca dispara una recarga: el siguiente
    /// `load` hace un round-trip nuevo. Una carga en vuelo sigue resolviendo
    /// a quienes ya la esperaban pero su resultado no se cachea.
    pub fn invalidate(&self, key: Option<&CacheKey>) {
        match key {
            Some(key) => self.invalidate_key(key),
            None => {
                self.teardown_all();
            },
        }
    }

    fn invalidate_key(&self, key: &CacheKey) {
        let inner = &self.inner;
        let _write = inner.write_lock.lock();
        inner.bump_epoch();

        let was_loading = inner.in_flight.remove(key);
        inner.memory.invalidate(key);

        if let Err(e) = inner.snapshots.remove(key) {
            warn!(key = %key, error = %e, "Failed to remove snapshot");
        }

        info!(key = %key, was_loading, "Cache entry invalidated");
    }

    /// Removes every key of `scope` from memory, the in-flight registry and
    /// the snapshot store. Other scopes are untouched.
    pub fn teardown_scope(&self, scope: &Scope) -> TeardownReport {
        let inner = &self.inner;
        let _write = inner.write_lock.lock();
        inner.bump_epoch();

        let in_flight = inner.in_flight.remove_scope(scope);
        let memory = inner.memory.invalidate_scope(scope);
        let snapshots = inner.snapshots.remove_by_prefix(scope).unwrap_or_else(|e| {
            warn!(scope = %scope, error = %e, "Failed to remove scope snapshots");
            0
        });

        let report = TeardownReport {
            memory,
            in_flight,
            snapshots,
        };
        info!(
            scope = %scope,
            memory = report.memory,
            in_flight = report.in_flight,
            snapshots = report.snapshots,
            "Scope torn down"
        );
        report
    }

    /// Tears down the scope of the current session.
    ///
    /// Returns `None` when no session accessor is configured.
    pub fn teardown_current_scope(&self) -> Option<TeardownReport> {
        let scope = self.inner.session.as_ref()?.current_scope();
        Some(self.teardown_scope(&scope))
    }

    /// Clears every tier. Snapshot records outside this coordinator's
    /// namespace are left alone.
    pub fn teardown_all(&self) -> TeardownReport {
        let inner = &self.inner;
        let _write = inner.write_lock.lock();
        inner.bump_epoch();

        let in_flight = inner.in_flight.clear_all();
        let memory = inner.memory.keys().len();
        inner.memory.invalidate_all();
        let snapshots = inner.snapshots.clear().unwrap_or_else(|e| {
            warn!(namespace = %inner.snapshots.namespace(), error = %e, "Failed to clear snapshots");
            0
        });

        let report = TeardownReport {
            memory,
            in_flight,
            snapshots,
        };
        info!(
            memory = report.memory,
            in_flight = report.in_flight,
            snapshots = report.snapshots,
            "Cache cleared"
        );
        report
    }
}
