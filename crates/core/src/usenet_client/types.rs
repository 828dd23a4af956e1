//! Types for usenet client operations.

use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur during usenet client operations.
#[derive(Debug, Error)]
pub enum UsenetClientError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("API error: {0}")]
    ApiError(String),

    #[error("Request timeout")]
    Timeout,
}

/// Trait for usenet client backends.
///
/// Usenet has no seeding concept, so the surface is just submission; job
/// progress is observed by the external monitor job.
#[async_trait]
pub trait UsenetClient: Send + Sync {
    /// Backend name for logging.
    fn name(&self) -> &str;

    /// Submit an NZB by URL, returning the client's job id.
    async fn add_job(&self, url: &str) -> Result<String, UsenetClientError>;
}
