//! Data sources instrumented for concurrency assertions.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use pagecache_coordinator::DataSource;
use pagecache_coordinator::pagecache_core::{Dataset, FetchError, Scope};
use serde_json::{Value, json};

/// Records how many calls were running at the same time.
#[derive(Debug, Default)]
pub struct GaugedSource {
    latency: Duration,
    active: AtomicUsize,
    peak: AtomicUsize,
    calls: AtomicUsize,
}

impl GaugedSource {
    pub fn new(latency: Duration) -> Self {
        Self {
            latency,
            ..Default::default()
        }
    }

    /// Highest number of simultaneous calls observed.
    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    async fn enter(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(self.latency).await;
        self.active.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl DataSource for GaugedSource {
    async fn session(&self, scope: &Scope) -> Result<Value, FetchError> {
        self.enter().await;
        Ok(json!({"tenantId": scope.as_str()}))
    }

    async fn reference_data(&self, _scope: &Scope, category: &str) -> Result<Dataset, FetchError> {
        self.enter().await;
        Ok(Dataset::from(vec![json!(category)]))
    }

    async fn module_data(&self, _scope: &Scope, dataset: &str) -> Result<Dataset, FetchError> {
        self.enter().await;
        if dataset.starts_with("broken") {
            return Err(FetchError::remote_status(500, "backend error"));
        }
        Ok(Dataset::from(vec![]))
    }

    fn name(&self) -> &str {
        "gauged"
    }
}
