//! Types for torrent client operations.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur during torrent client operations.
#[derive(Debug, Error)]
pub enum TorrentClientError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Torrent not found: {0}")]
    TorrentNotFound(String),

    #[error("API error: {0}")]
    ApiError(String),

    #[error("Request timeout")]
    Timeout,
}

/// Result of submitting a torrent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddTorrentResult {
    /// Info hash (lowercase hex).
    pub hash: String,
    /// Name of the torrent (may be unknown initially).
    pub name: Option<String>,
}

/// Seeding snapshot for one torrent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedingInfo {
    /// Info hash (lowercase hex).
    pub hash: String,
    /// Torrent name.
    pub name: String,
    /// Elapsed seeding time since completion, in seconds.
    pub seeding_duration_secs: u64,
}

/// Trait for torrent client backends.
#[async_trait]
pub trait TorrentClient: Send + Sync {
    /// Backend name for logging.
    fn name(&self) -> &str;

    /// Submit a release by download URL (magnet or .torrent URL), returning
    /// its protocol handle.
    async fn add_torrent(&self, url: &str) -> Result<AddTorrentResult, TorrentClientError>;

    /// Get the current seeding snapshot for a torrent.
    async fn get_torrent(&self, hash: &str) -> Result<SeedingInfo, TorrentClientError>;

    /// Remove a torrent, optionally deleting downloaded files.
    ///
    /// Idempotent: removing an unknown hash succeeds. Two concurrent reclaim
    /// sweeps rely on this.
    async fn delete_torrent(&self, hash: &str, delete_files: bool)
        -> Result<(), TorrentClientError>;
}
