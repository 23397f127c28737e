//! Registry of loads currently in flight.
//!
//! At most one load exists per key. Check-and-register happens under one
//! lock with no await inside, so two near-simultaneous callers can never
//! both observe "not in flight".

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use futures::future::{BoxFuture, Shared};
use pagecache_core::{CacheEntry, CacheError, CacheKey, Scope};
use parking_lot::Mutex;
use tracing::trace;

/// Outcome shared by every caller of one load.
pub type LoadResult = Result<Arc<CacheEntry>, CacheError>;

/// A pending load that any number of callers can await.
pub type PendingLoad = Shared<BoxFuture<'static, LoadResult>>;

/// Result of [`InFlightRegistry::get_or_register`].
pub enum Registration {
    /// Another caller already started this load.
    Joined(PendingLoad),
    /// This caller started the load.
    Started(PendingLoad),
}

impl Registration {
    /// The pending load, whoever started it.
    pub fn into_load(self) -> PendingLoad {
        match self {
            Self::Joined(load) | Self::Started(load) => load,
        }
    }

    /// Returns true if an existing load was reused.
    pub fn is_joined(&self) -> bool {
        matches!(self, Self::Joined(_))
    }
}

struct Slot {
    generation: u64,
    load: PendingLoad,
}

/// Maps cache keys to their pending load.
///
/// Every registration gets a generation number. Clearing is done by
/// generation, so a load finishing late can never remove a newer load
/// registered for the same key after an invalidation.
#[derive(Default)]
pub struct InFlightRegistry {
    slots: Mutex<HashMap<CacheKey, Slot>>,
    next_generation: AtomicU64,
}

impl InFlightRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_generation(&self) -> u64 {
        self.next_generation.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Registers a load, replacing any previous one, and returns its generation.
    pub fn register(&self, key: CacheKey, load: PendingLoad) -> u64 {
        let generation = self.next_generation();
        self.slots.lock().insert(key, Slot { generation, load });
        generation
    }

    /// Returns the pending load for `key`, if any.
    pub fn get(&self, key: &CacheKey) -> Option<PendingLoad> {
        self.slots.lock().get(key).map(|slot| slot.load.clone())
    }

    /// Returns the existing load for `key` or registers the one built by
    /// `make`, atomically.
    ///
    /// `make` receives the generation the new load will be registered
    /// under. It runs while the registry lock is held and must not call
    /// back into the registry.
    pub fn get_or_register<F>(&self, key: &CacheKey, make: F) -> Registration
    where
        F: FnOnce(u64) -> PendingLoad,
    {
        let mut slots = self.slots.lock();

        if let Some(slot) = slots.get(key) {
            return Registration::Joined(slot.load.clone());
        }

        let generation = self.next_generation();
        let load = make(generation);
        slots.insert(
            key.clone(),
            Slot {
                generation,
                load: load.clone(),
            },
        );
        trace!(key = %key, generation, "Load registered");

        Registration::Started(load)
    }

    /// Returns true if `generation` is still the registered load for `key`.
    pub fn is_current(&self, key: &CacheKey, generation: u64) -> bool {
        self.slots
            .lock()
            .get(key)
            .is_some_and(|slot| slot.generation == generation)
    }

    /// Removes the registration of `key` if it still has `generation`.
    pub fn clear(&self, key: &CacheKey, generation: u64) -> bool {
        let mut slots = self.slots.lock();
        match slots.get(key) {
            Some(slot) if slot.generation == generation => {
                slots.remove(key);
                trace!(key = %key, generation, "Load cleared");
                true
            },
            _ => false,
        }
    }

    /// Removes the registration of `key`, whatever its generation.
    pub fn remove(&self, key: &CacheKey) -> bool {
        self.slots.lock().remove(key).is_some()
    }

    /// Removes every registration of `scope`.
    pub fn remove_scope(&self, scope: &Scope) -> usize {
        let mut slots = self.slots.lock();
        let before = slots.len();
        slots.retain(|key, _| !key.in_scope(scope));
        before - slots.len()
    }

    /// Removes every registration.
    pub fn clear_all(&self) -> usize {
        let mut slots = self.slots.lock();
        let count = slots.len();
        slots.clear();
        count
    }

    /// Number of loads in flight.
    pub fn len(&self) -> usize {
        self.slots.lock().len()
    }

    /// Returns true if nothing is in flight.
    pub fn is_empty(&self) -> bool {
        self.slots.lock().is_empty()
    }

    /// Returns true if `key` has a load in flight.
    pub fn contains(&self, key: &CacheKey) -> bool {
        self.slots.lock().contains_key(key)
    }
}

/// Clears one registration when dropped, whether the load finished,
/// failed, panicked or was cancelled.
pub struct InFlightGuard {
    registry: Arc<InFlightRegistry>,
    key: CacheKey,
    generation: u64,
}

impl InFlightGuard {
    pub fn new(registry: Arc<InFlightRegistry>, key: CacheKey, generation: u64) -> Self {
        Self {
            registry,
            key,
            generation,
        }
    }

    /// Returns true if this load has not been superseded or invalidated.
    pub fn is_current(&self) -> bool {
        self.registry.is_current(&self.key, self.generation)
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.registry.clear(&self.key, self.generation);
    }
}
