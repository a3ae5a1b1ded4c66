//! Typed errors for the seeker library.
//!
//! Uses `thiserror` for library errors (not `anyhow`) so callers can match on
//! lookup misses and fetch failures instead of string-sniffing.

use thiserror::Error;

/// Errors that can occur in the search engine.
#[derive(Debug, Error)]
pub enum SeekerError {
    /// Store lookup miss. Usually a normal code path, not a failure.
    #[error("not found: {0}")]
    NotFound(String),

    /// A crawler plugin failed to fetch a node's connections
    #[error("external fetch failed: {0}")]
    ExternalFetch(#[from] FetchError),

    /// A queued task payload could not be encoded or decoded
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Storage operation failed
    #[error("storage error: {0}")]
    Storage(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// The work queue's consumer side is gone
    #[error("work queue closed")]
    QueueClosed,

    /// A work queue only supports one delivery stream
    #[error("work queue already has an active consumer")]
    AlreadyConsuming,

    /// The orchestrator was built without any crawler plugins
    #[error("at least one crawler plugin must be registered")]
    NoPlugins,
}

impl SeekerError {
    /// Build a `NotFound` for a keyed lookup.
    pub fn not_found(what: &str, key: impl std::fmt::Display) -> Self {
        SeekerError::NotFound(format!("{} {}", what, key))
    }

    /// True for lookup misses.
    pub fn is_not_found(&self) -> bool {
        matches!(self, SeekerError::NotFound(_))
    }
}

/// Errors a crawler plugin can return from `expand`.
#[derive(Debug, Error)]
pub enum FetchError {
    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// The data source answered with a non-success status
    #[error("unexpected status {status} from {source_name}")]
    Status { status: u16, source_name: String },

    /// The response body could not be decoded
    #[error("invalid response: {0}")]
    Decode(String),

    /// The data source rejected the request (e.g. rate limited)
    #[error("rejected by data source: {0}")]
    Rejected(String),
}

#[cfg(feature = "postgres")]
impl From<sqlx::Error> for SeekerError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => SeekerError::NotFound("row".to_string()),
            other => SeekerError::Storage(Box::new(other)),
        }
    }
}

/// Result type alias for seeker operations.
pub type Result<T> = std::result::Result<T, SeekerError>;

/// Result type alias for plugin fetches.
pub type FetchResult<T> = std::result::Result<T, FetchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_helpers() {
        let err = SeekerError::not_found("task", "abc");
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "not found: task abc");

        let err = SeekerError::QueueClosed;
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_fetch_error_converts() {
        let err: SeekerError = FetchError::Decode("bad json".into()).into();
        assert!(matches!(err, SeekerError::ExternalFetch(_)));
        assert_eq!(
            err.to_string(),
            "external fetch failed: invalid response: bad json"
        );
    }
}
