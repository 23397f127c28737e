//! Background warm-up of keys a user is likely to need next.

use futures::StreamExt;
use futures::stream;
use pagecache_core::{CacheKey, RequirementSet};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::CacheCoordinator;

/// One key to warm up.
#[derive(Debug, Clone)]
pub struct PreloadRequest {
    pub key: CacheKey,
    pub requirements: RequirementSet,
}

impl PreloadRequest {
    pub fn new(key: CacheKey, requirements: RequirementSet) -> Self {
        Self { key, requirements }
    }
}

/// Outcome counts of a preload, for observability only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PreloadReport {
    pub loaded: usize,
    pub failed: usize,
}

impl CacheCoordinator {
    /// Loads every request, at most `preload_concurrency` at a time.
    ///
    /// Failures are logged and swallowed; the report only counts them.
    pub async fn preload(&self, requests: Vec<PreloadRequest>) -> PreloadReport {
        let total = requests.len();

        let outcomes: Vec<bool> = stream::iter(requests)
            .map(|request| {
                let coordinator = self.clone();
                async move {
                    match coordinator.load(&request.key, &request.requirements).await {
                        Ok(_) => true,
                        Err(e) => {
                            warn!(key = %request.key, error = %e, "Preload failed");
                            false
                        },
                    }
                }
            })
            .buffer_unordered(self.inner.preload_concurrency)
            .collect()
            .await;

        let loaded = outcomes.iter().filter(|ok| **ok).count();
        let report = PreloadReport {
            loaded,
            failed: total - loaded,
        };
        debug!(loaded = report.loaded, failed = report.failed, "Preload finished");
        report
    }

    /// Fire-and-forget form of [`preload`](Self::preload).
    pub fn spawn_preload(&self, requests: Vec<PreloadRequest>) -> JoinHandle<PreloadReport> {
        let coordinator = self.clone();
        tokio::spawn(async move { coordinator.preload(requests).await })
    }
}
