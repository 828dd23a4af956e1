//! Request storage trait.

use thiserror::Error;

use crate::catalog::Asin;

use super::{DownloadHandle, DownloadHistory, DownloadStatus, Request, RequestStatus};

/// Error type for request store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Referenced request or history row does not exist.
    #[error("request not found: {0}")]
    NotFound(String),

    /// A live request already exists for the identifier.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Rejected non-forward status transition.
    #[error("cannot move request {id} from {from} to {to}")]
    InvalidTransition {
        id: String,
        from: &'static str,
        to: &'static str,
    },

    /// Database error.
    #[error("database error: {0}")]
    Database(String),
}

/// Fields for creating a new request.
#[derive(Debug, Clone)]
pub struct NewRequest {
    /// External identifier being acquired.
    pub asin: Asin,
    /// Title at request time.
    pub title: String,
    /// Author at request time.
    pub author: String,
    /// Requesting user.
    pub requested_by: String,
}

/// Fields for recording a new download attempt.
#[derive(Debug, Clone)]
pub struct NewDownloadHistory {
    /// Owning request.
    pub request_id: String,
    /// Whether this attempt is the one being pursued.
    pub selected: bool,
    /// Indexer the release came from.
    pub indexer: String,
    /// Protocol handle obtained at submission.
    pub handle: DownloadHandle,
    /// Initial status.
    pub status: DownloadStatus,
    /// Human-readable release title.
    pub title: String,
}

/// Trait for request/download-history storage backends.
///
/// All coordination state between job executions lives here; the store's
/// uniqueness constraints are the sole concurrency guard (there is no shared
/// in-memory mutable state between jobs).
pub trait RequestStore: Send + Sync {
    /// Create a new request in `Pending` status.
    ///
    /// Fails with `Conflict` when a live request already exists for the
    /// same identifier.
    fn create(&self, request: NewRequest) -> Result<Request, StoreError>;

    /// Get a request by id.
    fn get(&self, id: &str) -> Result<Option<Request>, StoreError>;

    /// All live (non-soft-deleted) requests, in one query.
    fn live(&self) -> Result<Vec<Request>, StoreError>;

    /// Advance a request's status. Rejects non-forward transitions.
    fn update_status(&self, id: &str, status: RequestStatus) -> Result<Request, StoreError>;

    /// Move a request to `Failed`, recording the error message.
    fn mark_failed(&self, id: &str, error: &str) -> Result<Request, StoreError>;

    /// Soft-delete a request (sets the deletion timestamp).
    fn soft_delete(&self, id: &str) -> Result<Request, StoreError>;

    /// Permanently delete a request and its download history.
    ///
    /// Idempotent: deleting an already-purged request is a no-op.
    fn hard_delete(&self, id: &str) -> Result<(), StoreError>;

    /// Record a download attempt.
    fn add_history(&self, history: NewDownloadHistory) -> Result<DownloadHistory, StoreError>;

    /// Update a download attempt's status.
    fn update_history_status(&self, id: &str, status: DownloadStatus) -> Result<(), StoreError>;

    /// All `(request, history)` pairs where the history row is the selected
    /// attempt and its download completed, in one query. Includes
    /// soft-deleted requests; the reclaimer needs both.
    fn completed_selected(&self) -> Result<Vec<(Request, DownloadHistory)>, StoreError>;

    /// Live requests other than `exclude_request_id` whose history references
    /// the same torrent hash (shared downloads).
    fn live_sharing_torrent(
        &self,
        hash: &str,
        exclude_request_id: &str,
    ) -> Result<Vec<Request>, StoreError>;
}
