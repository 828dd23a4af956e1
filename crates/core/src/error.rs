//! Crate-wide error taxonomy.
//!
//! Adapter modules keep their own error enums; everything crossing a
//! component boundary is folded into [`CoreError`] via the `From` impls
//! below.

use thiserror::Error;

use crate::config::ConfigError;
use crate::jobs::JobQueueError;
use crate::library::LibraryError;
use crate::request::StoreError;
use crate::torrent_client::TorrentClientError;
use crate::usenet_client::UsenetClientError;

/// Errors surfaced by the matching and lifecycle components.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Malformed input (identifier, path, raw record).
    #[error("validation error: {0}")]
    Validation(String),

    /// A live request already exists for the identifier.
    #[error("conflict: {0}")]
    Conflict(String),

    /// A catalog, library, client, or database call failed.
    #[error("upstream error: {0}")]
    Upstream(String),

    /// Missing or invalid configuration.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Referenced entry does not exist.
    #[error("not found: {0}")]
    NotFound(String),
}

impl From<StoreError> for CoreError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(_) => CoreError::NotFound(e.to_string()),
            StoreError::Conflict(_) => CoreError::Conflict(e.to_string()),
            StoreError::InvalidTransition { .. } => CoreError::Validation(e.to_string()),
            StoreError::Database(_) => CoreError::Upstream(e.to_string()),
        }
    }
}

impl From<TorrentClientError> for CoreError {
    fn from(e: TorrentClientError) -> Self {
        match e {
            TorrentClientError::TorrentNotFound(_) => CoreError::NotFound(e.to_string()),
            _ => CoreError::Upstream(e.to_string()),
        }
    }
}

impl From<UsenetClientError> for CoreError {
    fn from(e: UsenetClientError) -> Self {
        CoreError::Upstream(e.to_string())
    }
}

impl From<LibraryError> for CoreError {
    fn from(e: LibraryError) -> Self {
        CoreError::Upstream(e.to_string())
    }
}

impl From<JobQueueError> for CoreError {
    fn from(e: JobQueueError) -> Self {
        CoreError::Upstream(e.to_string())
    }
}

impl From<ConfigError> for CoreError {
    fn from(e: ConfigError) -> Self {
        CoreError::Configuration(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_error_mapping() {
        let e: CoreError = StoreError::Conflict("B002V0QK4C".to_string()).into();
        assert!(matches!(e, CoreError::Conflict(_)));

        let e: CoreError = StoreError::NotFound("r1".to_string()).into();
        assert!(matches!(e, CoreError::NotFound(_)));

        let e: CoreError = StoreError::InvalidTransition {
            id: "r1".to_string(),
            from: "downloaded",
            to: "pending",
        }
        .into();
        assert!(matches!(e, CoreError::Validation(_)));

        let e: CoreError = StoreError::Database("locked".to_string()).into();
        assert!(matches!(e, CoreError::Upstream(_)));
    }

    #[test]
    fn test_client_error_mapping() {
        let e: CoreError = TorrentClientError::TorrentNotFound("deadbeef".to_string()).into();
        assert!(matches!(e, CoreError::NotFound(_)));

        let e: CoreError = TorrentClientError::Timeout.into();
        assert!(matches!(e, CoreError::Upstream(_)));

        let e: CoreError =
            UsenetClientError::ConnectionFailed("refused".to_string()).into();
        assert!(matches!(e, CoreError::Upstream(_)));
    }
}
