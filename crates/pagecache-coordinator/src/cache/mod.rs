//! Cache tiers for the coordinator.
//!
//! This module provides the process-lifetime tiers: a Moka-backed
//! in-memory cache and the registry that coalesces concurrent loads.
//! The durable tier lives in `pagecache-store`.

pub mod inflight;
pub mod memory;

// Re-exports
pub use inflight::{InFlightGuard, InFlightRegistry, LoadResult, PendingLoad, Registration};
pub use memory::MemoryCache;
