//! Metrics module for the cache coordinator.

pub mod cache;
pub mod setup;

pub use cache::{CacheMetrics, HitTier, register_cache_metrics};
pub use setup::init_metrics;
