//! Dataset payloads returned by data-fetch functions.
//!
//! Remote list endpoints answer either with a bare array or with a
//! paginated wrapper carrying the rows under `data`. [`Dataset`] names both
//! shapes so the loader never has to sniff them at merge time.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::FetchError;

/// One page of a paginated list response.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    /// Rows of this page.
    pub data: Vec<Value>,
    /// Total number of rows across all pages, when reported.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,
    /// Page number, when reported.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u64>,
    /// Page size, when reported.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u64>,
}

impl Page {
    /// Creates a page from its rows.
    pub fn new(data: Vec<Value>) -> Self {
        Self {
            data,
            ..Self::default()
        }
    }

    /// Sets the reported total.
    pub fn with_total(mut self, total: u64) -> Self {
        self.total = Some(total);
        self
    }
}

/// Result of a dataset fetch: a raw array or a paginated wrapper.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Dataset {
    /// Plain collection.
    Array(Vec<Value>),
    /// Paginated wrapper `{ data: [...], ... }`.
    Page(Page),
}

impl Dataset {
    /// Decodes a raw JSON payload into a dataset.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Decode`] when the payload is neither an array
    /// nor an object with a `data` array.
    ///
    /// # Example
    ///
    /// ```
    /// use pagecache_core::Dataset;
    /// use serde_json::json;
    ///
    /// let page = Dataset::from_value(json!({"data": [1, 2], "total": 10})).unwrap();
    /// assert_eq!(page.into_rows(), vec![json!(1), json!(2)]);
    /// ```
    pub fn from_value(value: Value) -> Result<Self, FetchError> {
        match value {
            Value::Array(rows) => Ok(Self::Array(rows)),
            Value::Object(_) => serde_json::from_value::<Page>(value)
                .map(Self::Page)
                .map_err(|e| FetchError::decode(format!("expected paginated wrapper: {e}"))),
            other => Err(FetchError::decode(format!(
                "expected array or paginated wrapper, got {}",
                json_kind(&other)
            ))),
        }
    }

    /// Number of rows carried by this dataset.
    pub fn len(&self) -> usize {
        self.rows().len()
    }

    /// Returns true if the dataset carries no rows.
    pub fn is_empty(&self) -> bool {
        self.rows().is_empty()
    }

    /// Borrows the rows regardless of shape.
    pub fn rows(&self) -> &[Value] {
        match self {
            Self::Array(rows) => rows,
            Self::Page(page) => &page.data,
        }
    }

    /// Normalizes to a plain array, dropping pagination metadata.
    pub fn into_rows(self) -> Vec<Value> {
        match self {
            Self::Array(rows) => rows,
            Self::Page(page) => page.data,
        }
    }
}

impl From<Vec<Value>> for Dataset {
    fn from(rows: Vec<Value>) -> Self {
        Self::Array(rows)
    }
}

impl From<Page> for Dataset {
    fn from(page: Page) -> Self {
        Self::Page(page)
    }
}

/// Short name of a JSON value's kind, for error messages.
pub fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
