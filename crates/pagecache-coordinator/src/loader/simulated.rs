//! In-process data source with artificial network latency.
//!
//! Used by the demo binary, the benches and the tests. Not meant for
//! production paths.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use pagecache_core::{Dataset, FetchError, Group, Scope};
use parking_lot::Mutex;
use serde_json::{Value, json};

use super::DataSource;

/// Serves fixed datasets after an optional delay, counting every call.
///
/// The tenant id of a scope is echoed into the session payload
/// (`tenantId`, null for the global scope) so tests can tell which scope a
/// cached session came from.
#[derive(Debug, Default)]
pub struct SimulatedSource {
    latency: Duration,
    session: Option<Value>,
    reference: HashMap<String, Dataset>,
    module: HashMap<String, Dataset>,
    failures: Mutex<HashMap<String, FetchError>>,
    calls: AtomicUsize,
    calls_by_group: Mutex<HashMap<String, usize>>,
}

impl SimulatedSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay applied to every call.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Base session payload.
    pub fn with_session(mut self, session: Value) -> Self {
        self.session = Some(session);
        self
    }

    /// Adds a reference-data category.
    pub fn with_reference(mut self, category: impl Into<String>, dataset: Dataset) -> Self {
        self.reference.insert(category.into(), dataset);
        self
    }

    /// Adds a module dataset.
    pub fn with_module(mut self, name: impl Into<String>, dataset: Dataset) -> Self {
        self.module.insert(name.into(), dataset);
        self
    }

    /// Makes a group (`session`, `moduleData.customers`, ...) fail.
    pub fn failing(self, group: impl Into<String>, error: FetchError) -> Self {
        self.fail(group, error);
        self
    }

    /// Makes a group fail from now on.
    pub fn fail(&self, group: impl Into<String>, error: FetchError) {
        self.failures.lock().insert(group.into(), error);
    }

    /// Lets a previously failing group succeed again.
    pub fn recover(&self, group: &str) {
        self.failures.lock().remove(group);
    }

    /// Total calls across all groups.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Calls for one group.
    pub fn calls_for(&self, group: &str) -> usize {
        self.calls_by_group.lock().get(group).copied().unwrap_or(0)
    }

    /// A source preloaded with a small CRM fixture.
    pub fn crm_fixture() -> Self {
        Self::new()
            .with_session(json!({"userId": "u-1", "role": "admin"}))
            .with_reference(
                "countries",
                Dataset::from(vec![json!({"code": "PT"}), json!({"code": "ES"})]),
            )
            .with_reference(
                "industries",
                Dataset::from(vec![json!({"code": "energy"}), json!({"code": "retail"})]),
            )
            .with_module(
                "customers",
                pagecache_core::Page::new(vec![
                    json!({"id": "c-1", "name": "Acme Corp"}),
                    json!({"id": "c-2", "name": "Globex"}),
                ])
                .with_total(2)
                .into(),
            )
            .with_module(
                "users",
                Dataset::from(vec![json!({"id": 1, "email": "ops@acme.test"})]),
            )
            .with_module(
                "contracts",
                Dataset::from(vec![json!({"id": "k-1", "customerId": "c-1"})]),
            )
    }

    async fn call(&self, group: &Group) -> Result<(), FetchError> {
        let name = group.to_string();
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.calls_by_group.lock().entry(name.clone()).or_default() += 1;

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        match self.failures.lock().get(&name) {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl DataSource for SimulatedSource {
    async fn session(&self, scope: &Scope) -> Result<Value, FetchError> {
        self.call(&Group::Session).await?;

        let mut session = self.session.clone().unwrap_or_else(|| json!({}));
        if let Some(object) = session.as_object_mut() {
            object.insert("tenantId".to_string(), json!(scope.tenant()));
        }
        Ok(session)
    }

    async fn reference_data(&self, _scope: &Scope, category: &str) -> Result<Dataset, FetchError> {
        self.call(&Group::Reference(category.to_string())).await?;
        self.reference
            .get(category)
            .cloned()
            .ok_or_else(|| FetchError::remote_status(404, format!("unknown category '{category}'")))
    }

    async fn module_data(&self, _scope: &Scope, dataset: &str) -> Result<Dataset, FetchError> {
        self.call(&Group::Module(dataset.to_string())).await?;
        self.module
            .get(dataset)
            .cloned()
            .ok_or_else(|| FetchError::remote_status(404, format!("unknown dataset '{dataset}'")))
    }

    fn name(&self) -> &str {
        "simulated"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_session_echoes_scope() {
        let source = SimulatedSource::crm_fixture();
        let session = source.session(&Scope::new("acme")).await.unwrap();

        assert_eq!(session["tenantId"], "acme");
        assert_eq!(session["role"], "admin");
        assert_eq!(source.calls_for("session"), 1);
    }

    #[tokio::test]
    async fn test_unknown_dataset_is_404() {
        let source = SimulatedSource::new();
        let err = source
            .module_data(&Scope::global(), "deals")
            .await
            .unwrap_err();
        assert_eq!(err, FetchError::remote_status(404, "unknown dataset 'deals'"));
    }

    #[tokio::test]
    async fn test_fail_and_recover() {
        let source = SimulatedSource::crm_fixture();
        source.fail("moduleData.users", FetchError::timeout(1));
        assert!(source.module_data(&Scope::global(), "users").await.is_err());

        source.recover("moduleData.users");
        assert!(source.module_data(&Scope::global(), "users").await.is_ok());
        assert_eq!(source.calls_for("moduleData.users"), 2);
    }
}
