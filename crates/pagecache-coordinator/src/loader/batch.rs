//! Concurrent fan-out of one load over all requested groups.

use std::sync::Arc;
use std::time::Instant;

use futures::future::join_all;
use pagecache_core::{
    Aggregate, CUSTOM_GROUP, CacheError, FetchError, Group, MODULE_GROUP, REFERENCE_GROUP,
    RequirementSet, SESSION_GROUP, Scope,
};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use super::DataSource;

/// Runs one task per requested group and merges the results.
///
/// Tasks run concurrently, never one after another. The aggregate is built
/// only after every task settled, in declaration order, so two loads of the
/// same requirement set always produce identically ordered records.
#[derive(Clone)]
pub struct BatchLoader {
    source: Arc<dyn DataSource>,
}

impl BatchLoader {
    pub fn new(source: Arc<dyn DataSource>) -> Self {
        Self { source }
    }

    /// Name of the underlying data source.
    pub fn source_name(&self) -> &str {
        self.source.name()
    }

    /// Loads every requested group for `scope`.
    ///
    /// # Errors
    ///
    /// `CacheError::Fetch` naming the first failed group in declaration
    /// order. No partial aggregate is returned.
    pub async fn load(
        &self,
        scope: &Scope,
        requirements: &RequirementSet,
    ) -> Result<Aggregate, CacheError> {
        let start = Instant::now();
        let groups: Vec<Group> = requirements.groups().collect();

        let results = join_all(
            groups
                .iter()
                .map(|group| self.fetch_group(scope, group, requirements)),
        )
        .await;

        let mut session = None;
        let mut reference = Map::new();
        let mut module = Map::new();
        let mut custom = None;

        for (group, result) in groups.iter().zip(results) {
            let value = result.map_err(|e| {
                warn!(
                    source = %self.source.name(),
                    scope = %scope,
                    group = %group,
                    error = %e,
                    "Group fetch failed"
                );
                CacheError::fetch(group.to_string(), e)
            })?;

            match group {
                Group::Session => session = Some(value),
                Group::Reference(category) => {
                    reference.insert(category.clone(), value);
                },
                Group::Module(dataset) => {
                    module.insert(dataset.clone(), value);
                },
                Group::Custom => custom = Some(value),
            }
        }

        let mut data = Aggregate::new();
        if let Some(session) = session {
            data.insert(SESSION_GROUP.to_string(), session);
        }
        if requirements.wants_reference_data() {
            data.insert(REFERENCE_GROUP.to_string(), Value::Object(reference));
        }
        if requirements.wants_module_data() {
            data.insert(MODULE_GROUP.to_string(), Value::Object(module));
        }
        if let Some(custom) = custom {
            data.insert(CUSTOM_GROUP.to_string(), custom);
        }

        debug!(
            source = %self.source.name(),
            scope = %scope,
            groups = groups.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Batch load completed"
        );

        Ok(data)
    }

    async fn fetch_group(
        &self,
        scope: &Scope,
        group: &Group,
        requirements: &RequirementSet,
    ) -> Result<Value, FetchError> {
        match group {
            Group::Session => self.source.session(scope).await,
            Group::Reference(category) => self
                .source
                .reference_data(scope, category)
                .await
                .map(|dataset| Value::Array(dataset.into_rows())),
            Group::Module(dataset) => self
                .source
                .module_data(scope, dataset)
                .await
                .map(|dataset| Value::Array(dataset.into_rows())),
            Group::Custom => match &requirements.custom {
                Some(loader) => loader.load(scope).await,
                None => Ok(Value::Null),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::SimulatedSource;
    use async_trait::async_trait;
    use pagecache_core::{CustomLoader, Dataset, Page};
    use serde_json::json;
    use std::time::Duration;

    fn source() -> Arc<SimulatedSource> {
        Arc::new(
            SimulatedSource::new()
                .with_session(json!({"userId": "u-1"}))
                .with_reference("countries", Dataset::from(vec![json!("PT"), json!("ES")]))
                .with_module(
                    "customers",
                    Page::new(vec![json!({"id": 1, "name": "Acme"})])
                        .with_total(1)
                        .into(),
                )
                .with_module("users", Dataset::from(vec![json!({"id": 1, "email": "a@b"})])),
        )
    }

    struct Banner;

    #[async_trait]
    impl CustomLoader for Banner {
        async fn load(&self, scope: &Scope) -> Result<Value, FetchError> {
            Ok(json!({"banner": format!("hello {scope}")}))
        }
    }

    #[tokio::test]
    async fn test_merge_contains_only_requested_groups() {
        let loader = BatchLoader::new(source());
        let requirements = RequirementSet::new().with_session().with_module("customers");

        let data = loader.load(&Scope::new("acme"), &requirements).await.unwrap();

        let keys: Vec<&String> = data.keys().collect();
        assert_eq!(keys, ["session", "moduleData"]);
        assert_eq!(
            data["moduleData"],
            json!({"customers": [{"id": 1, "name": "Acme"}]})
        );
    }

    #[tokio::test]
    async fn test_all_groups_and_custom() {
        let loader = BatchLoader::new(source());
        let requirements = RequirementSet::new()
            .with_session()
            .with_reference("countries")
            .with_module("customers")
            .with_module("users")
            .with_custom(Arc::new(Banner));

        let data = loader.load(&Scope::new("acme"), &requirements).await.unwrap();

        let keys: Vec<&String> = data.keys().collect();
        assert_eq!(keys, ["session", "referenceData", "moduleData", "customData"]);
        assert_eq!(data["referenceData"]["countries"], json!(["PT", "ES"]));
        assert_eq!(data["customData"]["banner"], "hello acme");
    }

    #[tokio::test]
    async fn test_groups_run_concurrently() {
        let source = Arc::new(
            SimulatedSource::new()
                .with_latency(Duration::from_millis(50))
                .with_module("a", Dataset::from(vec![]))
                .with_module("b", Dataset::from(vec![]))
                .with_module("c", Dataset::from(vec![]))
                .with_module("d", Dataset::from(vec![])),
        );
        let loader = BatchLoader::new(source.clone());
        let requirements = RequirementSet::new()
            .with_module("a")
            .with_module("b")
            .with_module("c")
            .with_module("d");

        let start = std::time::Instant::now();
        loader.load(&Scope::global(), &requirements).await.unwrap();

        // Sequential execution would take at least 200ms
        assert!(start.elapsed() < Duration::from_millis(190));
        assert_eq!(source.calls(), 4);
    }

    #[tokio::test]
    async fn test_failure_names_group() {
        let source = Arc::new(
            SimulatedSource::new()
                .with_session(json!({}))
                .with_module("customers", Dataset::from(vec![]))
                .failing("moduleData.customers", FetchError::remote_status(500, "db down")),
        );
        let loader = BatchLoader::new(source);
        let requirements = RequirementSet::new().with_session().with_module("customers");

        let err = loader.load(&Scope::global(), &requirements).await.unwrap_err();
        assert_eq!(err.group(), Some("moduleData.customers"));
    }

    #[tokio::test]
    async fn test_first_failure_in_declaration_order_wins() {
        let source = Arc::new(
            SimulatedSource::new()
                .failing("referenceData.countries", FetchError::timeout(10))
                .failing("moduleData.users", FetchError::remote("nope")),
        );
        let loader = BatchLoader::new(source);
        let requirements = RequirementSet::new()
            .with_module("users")
            .with_reference("countries");

        let err = loader.load(&Scope::global(), &requirements).await.unwrap_err();
        assert_eq!(err.group(), Some("referenceData.countries"));
    }

    #[tokio::test]
    async fn test_empty_requirements_yield_empty_aggregate() {
        let loader = BatchLoader::new(source());
        let data = loader
            .load(&Scope::global(), &RequirementSet::new())
            .await
            .unwrap();
        assert!(data.is_empty());
    }
}
