//! Error types for the pagecache coordinator.
//!
//! Only two kinds of failure ever reach a caller of the coordinator:
//! a remote fetch that failed ([`FetchError`]) wrapped in a [`CacheError`]
//! naming the requirement group it belongs to, or a load task that was
//! aborted. Storage and validation failures live in `pagecache-store` and
//! are absorbed as cache misses before they get here.
//!
//! Both types are `Clone` because a single load result is handed to every
//! caller that joined the same in-flight request.
//!
//! # Example
//!
//! ```
//! use pagecache_core::{CacheError, FetchError};
//!
//! let error = CacheError::fetch("moduleData.customers", FetchError::timeout(5_000));
//! assert_eq!(error.group(), Some("moduleData.customers"));
//! assert!(error.is_transient());
//! ```

use thiserror::Error;

/// Failure reported by a remote data-fetch function.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// The remote end answered with an error.
    #[error(
        "remote error{}: {message}",
        status.map(|s| format!(" (status {s})")).unwrap_or_default()
    )]
    Remote {
        /// HTTP-like status code, if the transport has one
        status: Option<u16>,
        /// Description returned by the remote end
        message: String,
    },

    /// The fetch did not finish in time.
    #[error("fetch timed out after {millis}ms")]
    Timeout {
        /// Elapsed time before giving up
        millis: u64,
    },

    /// The payload could not be decoded into a dataset.
    #[error("failed to decode payload: {0}")]
    Decode(String),

    /// Anything else.
    #[error("{0}")]
    Other(String),
}

impl FetchError {
    /// Creates a remote error without status.
    pub fn remote(message: impl Into<String>) -> Self {
        Self::Remote {
            status: None,
            message: message.into(),
        }
    }

    /// Creates a remote error with a status code.
    pub fn remote_status(status: u16, message: impl Into<String>) -> Self {
        Self::Remote {
            status: Some(status),
            message: message.into(),
        }
    }

    /// Creates a timeout error.
    pub fn timeout(millis: u64) -> Self {
        Self::Timeout { millis }
    }

    /// Creates a decode error.
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode(message.into())
    }

    /// Returns true if retrying later may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Timeout { .. } => true,
            Self::Remote { status, .. } => matches!(status, None | Some(429) | Some(500..=599)),
            Self::Decode(_) | Self::Other(_) => false,
        }
    }
}

/// Error surfaced by `load` / `refresh`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CacheError {
    /// One requirement group failed; no partial aggregate was cached.
    #[error("failed to load group '{group}': {source}")]
    Fetch {
        /// Group that failed, e.g. `moduleData.customers`
        group: String,
        /// Underlying fetch failure
        #[source]
        source: FetchError,
    },

    /// The background load task ended without producing a result.
    #[error("load aborted: {0}")]
    LoadAborted(String),
}

impl CacheError {
    /// Creates a fetch failure for the given group.
    pub fn fetch(group: impl Into<String>, source: FetchError) -> Self {
        Self::Fetch {
            group: group.into(),
            source,
        }
    }

    /// Creates a load-aborted error.
    pub fn aborted(reason: impl Into<String>) -> Self {
        Self::LoadAborted(reason.into())
    }

    /// Returns the failing group, if this is a fetch failure.
    pub fn group(&self) -> Option<&str> {
        match self {
            Self::Fetch { group, .. } => Some(group),
            Self::LoadAborted(_) => None,
        }
    }

    /// Returns true if a retry may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Fetch { source, .. } => source.is_transient(),
            Self::LoadAborted(_) => true,
        }
    }
}

/// Result alias for coordinator operations.
pub type Result<T> = std::result::Result<T, CacheError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_error_display() {
        assert_eq!(
            FetchError::remote_status(503, "maintenance").to_string(),
            "remote error (status 503): maintenance"
        );
        assert_eq!(FetchError::remote("boom").to_string(), "remote error: boom");
        assert_eq!(
            FetchError::timeout(250).to_string(),
            "fetch timed out after 250ms"
        );
    }

    #[test]
    fn test_cache_error_display() {
        let err = CacheError::fetch("session", FetchError::decode("not json"));
        assert_eq!(
            err.to_string(),
            "failed to load group 'session': failed to decode payload: not json"
        );
        assert_eq!(err.group(), Some("session"));
        assert_eq!(CacheError::aborted("panicked").group(), None);
    }

    #[test]
    fn test_is_transient() {
        assert!(FetchError::timeout(1).is_transient());
        assert!(FetchError::remote("reset").is_transient());
        assert!(FetchError::remote_status(502, "bad gateway").is_transient());
        assert!(FetchError::remote_status(429, "slow down").is_transient());
        assert!(!FetchError::remote_status(404, "missing").is_transient());
        assert!(!FetchError::decode("x").is_transient());

        assert!(CacheError::aborted("x").is_transient());
        assert!(!CacheError::fetch("g", FetchError::Other("x".into())).is_transient());
    }
}
