//! Declarative description of what a page needs loaded.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::FetchError;
use crate::key::Scope;

/// Aggregate key holding the session payload.
pub const SESSION_GROUP: &str = "session";
/// Aggregate key holding reference-data categories.
pub const REFERENCE_GROUP: &str = "referenceData";
/// Aggregate key holding module datasets.
pub const MODULE_GROUP: &str = "moduleData";
/// Aggregate key holding the custom loader's result.
pub const CUSTOM_GROUP: &str = "customData";

/// Page-specific loader supplied by the caller alongside the flags.
#[async_trait]
pub trait CustomLoader: Send + Sync {
    /// Loads the custom payload for the given scope.
    async fn load(&self, scope: &Scope) -> Result<Value, FetchError>;
}

/// One unit of work the batch loader fans out.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Group {
    /// The current session.
    Session,
    /// One reference-data category.
    Reference(String),
    /// One module-specific dataset.
    Module(String),
    /// The custom loader.
    Custom,
}

impl fmt::Display for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Session => f.write_str(SESSION_GROUP),
            Self::Reference(category) => write!(f, "{REFERENCE_GROUP}.{category}"),
            Self::Module(dataset) => write!(f, "{MODULE_GROUP}.{dataset}"),
            Self::Custom => f.write_str(CUSTOM_GROUP),
        }
    }
}

/// Set of named boolean flags grouped by category.
///
/// Supplied by the caller at call time, never stored by the cache. Only
/// flags set to `true` produce work.
///
/// # Example
///
/// ```
/// use pagecache_core::{Group, RequirementSet};
///
/// let requirements = RequirementSet::new()
///     .with_session()
///     .with_reference("countries")
///     .with_module("customers");
///
/// let groups: Vec<Group> = requirements.groups().collect();
/// assert_eq!(groups.len(), 3);
/// assert_eq!(groups[1].to_string(), "referenceData.countries");
/// ```
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequirementSet {
    /// Load the current session.
    #[serde(default)]
    pub session: bool,

    /// Reference-data categories, in declaration order.
    #[serde(default)]
    pub reference_data: IndexMap<String, bool>,

    /// Module-specific datasets, in declaration order.
    #[serde(default)]
    pub module: IndexMap<String, bool>,

    /// Optional page-specific loader.
    #[serde(skip)]
    pub custom: Option<Arc<dyn CustomLoader>>,
}

impl RequirementSet {
    /// Creates an empty requirement set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests the session group.
    pub fn with_session(mut self) -> Self {
        self.session = true;
        self
    }

    /// Requests a reference-data category.
    pub fn with_reference(mut self, category: impl Into<String>) -> Self {
        self.reference_data.insert(category.into(), true);
        self
    }

    /// Requests a module dataset.
    pub fn with_module(mut self, dataset: impl Into<String>) -> Self {
        self.module.insert(dataset.into(), true);
        self
    }

    /// Attaches a custom loader.
    pub fn with_custom(mut self, loader: Arc<dyn CustomLoader>) -> Self {
        self.custom = Some(loader);
        self
    }

    /// Enumerates requested groups in declaration order.
    pub fn groups(&self) -> impl Iterator<Item = Group> + '_ {
        let session = self.session.then_some(Group::Session);
        let references = enabled(&self.reference_data).map(|c| Group::Reference(c.to_string()));
        let modules = enabled(&self.module).map(|d| Group::Module(d.to_string()));
        let custom = self.custom.as_ref().map(|_| Group::Custom);

        session
            .into_iter()
            .chain(references)
            .chain(modules)
            .chain(custom)
    }

    /// Returns true if nothing is requested.
    pub fn is_empty(&self) -> bool {
        self.groups().next().is_none()
    }

    /// Returns true if any reference category is requested.
    pub fn wants_reference_data(&self) -> bool {
        enabled(&self.reference_data).next().is_some()
    }

    /// Returns true if any module dataset is requested.
    pub fn wants_module_data(&self) -> bool {
        enabled(&self.module).next().is_some()
    }
}

fn enabled(flags: &IndexMap<String, bool>) -> impl Iterator<Item = &str> {
    flags
        .iter()
        .filter(|(_, wanted)| **wanted)
        .map(|(name, _)| name.as_str())
}

impl fmt::Debug for RequirementSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequirementSet")
            .field("session", &self.session)
            .field("reference_data", &self.reference_data)
            .field("module", &self.module)
            .field("custom", &self.custom.is_some())
            .finish()
    }
}
