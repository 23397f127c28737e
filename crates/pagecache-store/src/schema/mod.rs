//! Schema validation of untrusted snapshot records.
//!
//! Everything read back from a storage medium is untrusted: the layout may
//! predate a data-model change, or someone may have edited it. A record is
//! only turned into a [`SnapshotRecord`] once the whole document passes.
//!
//! Checked:
//! - top level: `schemaVersion` (must equal the current version),
//!   `timestamp` (non-negative integer), `data` (object)
//! - `data.session`: object
//! - `data.referenceData` / `data.moduleData`: objects of arrays
//! - every element of a dataset with a registered [`EntitySchema`]
//!
//! Other groups (for instance `customData`) are opaque and pass through.

mod entity;

pub use entity::{EntitySchema, FieldKind};

use std::collections::HashMap;

use pagecache_core::{
    Aggregate, MODULE_GROUP, REFERENCE_GROUP, SESSION_GROUP, SNAPSHOT_SCHEMA_VERSION,
    SnapshotRecord, json_kind,
};
use serde_json::{Map, Value};

use crate::error::ValidationError;

/// Validates snapshot JSON against the expected layout.
#[derive(Debug, Clone)]
pub struct SnapshotValidator {
    schemas: HashMap<String, EntitySchema>,
}

impl Default for SnapshotValidator {
    fn default() -> Self {
        Self::empty()
            .with_schema(EntitySchema::customers())
            .with_schema(EntitySchema::users())
    }
}

impl SnapshotValidator {
    /// Validator with the default entity schemas (`customers`, `users`).
    pub fn new() -> Self {
        Self::default()
    }

    /// Validator with structural checks only.
    pub fn empty() -> Self {
        Self {
            schemas: HashMap::new(),
        }
    }

    /// Registers (or replaces) an entity schema.
    pub fn with_schema(mut self, schema: EntitySchema) -> Self {
        self.schemas.insert(schema.dataset().to_string(), schema);
        self
    }

    /// Returns the schema registered for a dataset.
    pub fn schema(&self, dataset: &str) -> Option<&EntitySchema> {
        self.schemas.get(dataset)
    }

    /// Validates a raw record and converts it.
    ///
    /// # Example
    ///
    /// ```
    /// use pagecache_store::SnapshotValidator;
    /// use serde_json::json;
    ///
    /// let validator = SnapshotValidator::new();
    /// let ok = json!({
    ///     "schemaVersion": 1,
    ///     "timestamp": 1000,
    ///     "data": {"moduleData": {"customers": [{"id": 1, "name": "Acme"}]}}
    /// });
    /// assert!(validator.validate(&ok).is_ok());
    ///
    /// let bad = json!({"schemaVersion": 1, "data": {}});
    /// assert!(validator.validate(&bad).is_err());
    /// ```
    pub fn validate(&self, value: &Value) -> Result<SnapshotRecord, ValidationError> {
        let root = expect_object(value, "$")?;

        let version = required(root, "schemaVersion", "schemaVersion")?;
        let version = version.as_u64().ok_or_else(|| {
            ValidationError::wrong_type("schemaVersion", "integer", json_kind(version))
        })?;
        if version != SNAPSHOT_SCHEMA_VERSION {
            return Err(ValidationError::UnsupportedVersion(version));
        }

        let timestamp = required(root, "timestamp", "timestamp")?;
        let timestamp = timestamp.as_u64().ok_or_else(|| {
            ValidationError::wrong_type("timestamp", "non-negative integer", json_kind(timestamp))
        })?;

        let data = expect_object(required(root, "data", "data")?, "data")?;

        if let Some(session) = data.get(SESSION_GROUP) {
            expect_object(session, &format!("data.{SESSION_GROUP}"))?;
        }
        for group in [REFERENCE_GROUP, MODULE_GROUP] {
            if let Some(datasets) = data.get(group) {
                self.validate_datasets(datasets, &format!("data.{group}"))?;
            }
        }

        Ok(SnapshotRecord {
            schema_version: version,
            data: data
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect::<Aggregate>(),
            timestamp,
        })
    }

    fn validate_datasets(&self, value: &Value, path: &str) -> Result<(), ValidationError> {
        let datasets = expect_object(value, path)?;

        for (name, rows) in datasets {
            let dataset_path = format!("{path}.{name}");
            let Some(rows) = rows.as_array() else {
                return Err(ValidationError::wrong_type(
                    dataset_path,
                    "array",
                    json_kind(rows),
                ));
            };

            if let Some(schema) = self.schemas.get(name) {
                for (index, row) in rows.iter().enumerate() {
                    schema.check(row, &format!("{dataset_path}[{index}]"))?;
                }
            }
        }

        Ok(())
    }
}

fn expect_object<'a>(value: &'a Value, path: &str) -> Result<&'a Map<String, Value>, ValidationError> {
    value
        .as_object()
        .ok_or_else(|| ValidationError::wrong_type(path, "object", json_kind(value)))
}

fn required<'a>(
    object: &'a Map<String, Value>,
    field: &str,
    path: &str,
) -> Result<&'a Value, ValidationError> {
    object
        .get(field)
        .ok_or_else(|| ValidationError::missing(path))
}
