//! Minimal per-entity schemas.

use pagecache_core::json_kind;
use serde_json::Value;

use crate::error::ValidationError;

/// Expected JSON type of a required field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Any JSON string.
    String,
    /// Any JSON number.
    Number,
    /// A number without fractional part.
    Integer,
    /// `true` or `false`.
    Boolean,
    /// A string or a number, as entity ids come in both flavours.
    Id,
    /// A JSON object.
    Object,
    /// A JSON array.
    Array,
    /// Present with any value, `null` included.
    Any,
}

impl FieldKind {
    /// Human name used in error messages.
    pub fn describe(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Integer => "integer",
            Self::Boolean => "boolean",
            Self::Id => "string or number",
            Self::Object => "object",
            Self::Array => "array",
            Self::Any => "any value",
        }
    }

    /// Returns true if `value` has this kind.
    pub fn matches(self, value: &Value) -> bool {
        match self {
            Self::String => value.is_string(),
            Self::Number => value.is_number(),
            Self::Integer => value.is_i64() || value.is_u64(),
            Self::Boolean => value.is_boolean(),
            Self::Id => value.is_string() || value.is_number(),
            Self::Object => value.is_object(),
            Self::Array => value.is_array(),
            Self::Any => true,
        }
    }
}

/// Required fields of one well-known entity dataset.
///
/// # Example
///
/// ```
/// use pagecache_store::{EntitySchema, FieldKind};
/// use serde_json::json;
///
/// let schema = EntitySchema::new("contracts")
///     .require("id", FieldKind::Id)
///     .require("value", FieldKind::Number);
///
/// assert!(schema.check(&json!({"id": 1, "value": 9.5}), "row").is_ok());
/// assert!(schema.check(&json!({"id": 1}), "row").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntitySchema {
    dataset: String,
    fields: Vec<(String, FieldKind)>,
}

impl EntitySchema {
    /// Creates an empty schema for the named dataset.
    pub fn new(dataset: impl Into<String>) -> Self {
        Self {
            dataset: dataset.into(),
            fields: Vec::new(),
        }
    }

    /// Adds a required field.
    pub fn require(mut self, field: impl Into<String>, kind: FieldKind) -> Self {
        self.fields.push((field.into(), kind));
        self
    }

    /// Minimal customer shape.
    pub fn customers() -> Self {
        Self::new("customers")
            .require("id", FieldKind::Id)
            .require("name", FieldKind::String)
    }

    /// Minimal user shape.
    pub fn users() -> Self {
        Self::new("users")
            .require("id", FieldKind::Id)
            .require("email", FieldKind::String)
    }

    /// Dataset name this schema applies to.
    pub fn dataset(&self) -> &str {
        &self.dataset
    }

    /// Required fields in declaration order.
    pub fn fields(&self) -> &[(String, FieldKind)] {
        &self.fields
    }

    /// Checks one element; `path` prefixes error locations.
    pub fn check(&self, element: &Value, path: &str) -> Result<(), ValidationError> {
        let Some(object) = element.as_object() else {
            return Err(ValidationError::wrong_type(path, "object", json_kind(element)));
        };

        for (field, kind) in &self.fields {
            let field_path = format!("{path}.{field}");
            let Some(value) = object.get(field) else {
                return Err(ValidationError::missing(field_path));
            };
            if !kind.matches(value) {
                return Err(ValidationError::wrong_type(
                    field_path,
                    kind.describe(),
                    json_kind(value),
                ));
            }
        }

        Ok(())
    }
}
