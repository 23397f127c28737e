//! Data source trait definition.

use async_trait::async_trait;
use pagecache_core::{Dataset, FetchError, Scope};
use serde_json::Value;

/// The remote data-fetch functions behind the cache.
///
/// Each method is one named asynchronous call; the batch loader invokes one
/// per requested group and runs them concurrently. Timeouts and retries are
/// the implementor's responsibility.
///
/// # Example
///
/// ```ignore
/// use pagecache_coordinator::DataSource;
///
/// struct CrmApi { client: reqwest::Client }
///
/// #[async_trait]
/// impl DataSource for CrmApi {
///     async fn session(&self, scope: &Scope) -> Result<Value, FetchError> {
///         // GET /session
///     }
///
///     async fn reference_data(&self, scope: &Scope, category: &str) -> Result<Dataset, FetchError> {
///         // GET /reference/{category}
///     }
///
///     async fn module_data(&self, scope: &Scope, dataset: &str) -> Result<Dataset, FetchError> {
///         // GET /{dataset}?page=1
///     }
///
///     fn name(&self) -> &str {
///         "crm-api"
///     }
/// }
/// ```
#[async_trait]
pub trait DataSource: Send + Sync {
    /// Fetches the session payload for the given scope.
    async fn session(&self, scope: &Scope) -> Result<Value, FetchError>;

    /// Fetches one reference-data category.
    async fn reference_data(&self, scope: &Scope, category: &str) -> Result<Dataset, FetchError>;

    /// Fetches one module-specific dataset.
    async fn module_data(&self, scope: &Scope, dataset: &str) -> Result<Dataset, FetchError>;

    /// Returns the name of this source, for logging.
    fn name(&self) -> &str;
}
