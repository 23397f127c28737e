//! Error types for snapshot storage and validation.

/// Errors raised by a storage medium or the snapshot adapter.
///
/// The coordinator never surfaces these: every `Err` is handled as
/// "no snapshot".
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The medium is disabled or not reachable.
    #[error("storage unavailable: {reason}")]
    Unavailable { reason: String },

    /// Writing would exceed the medium's quota.
    #[error("storage quota exceeded: need {needed} bytes, limit is {limit}")]
    QuotaExceeded { needed: usize, limit: usize },

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A record could not be serialized.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// A stored value is not valid JSON.
    #[error("corrupt entry at '{key}': {reason}")]
    Corrupt { key: String, reason: String },
}

impl StorageError {
    /// Creates an unavailable error.
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::Unavailable {
            reason: reason.into(),
        }
    }

    /// Creates a corrupt-entry error.
    pub fn corrupt(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Corrupt {
            key: key.into(),
            reason: reason.into(),
        }
    }
}

/// Reasons an untrusted snapshot is rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// A required field is absent.
    #[error("missing field '{path}'")]
    MissingField { path: String },

    /// A field has the wrong JSON type.
    #[error("field '{path}' must be {expected}, found {found}")]
    WrongType {
        path: String,
        expected: &'static str,
        found: &'static str,
    },

    /// The record was written by another layout version.
    #[error("unsupported snapshot schema version {0}")]
    UnsupportedVersion(u64),
}

impl ValidationError {
    /// Creates a missing-field error.
    pub fn missing(path: impl Into<String>) -> Self {
        Self::MissingField { path: path.into() }
    }

    /// Creates a wrong-type error.
    pub fn wrong_type(path: impl Into<String>, expected: &'static str, found: &'static str) -> Self {
        Self::WrongType {
            path: path.into(),
            expected,
            found,
        }
    }

    /// Path of the offending field, if any.
    pub fn path(&self) -> Option<&str> {
        match self {
            Self::MissingField { path } | Self::WrongType { path, .. } => Some(path),
            Self::UnsupportedVersion(_) => None,
        }
    }
}
