//! Core request data types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::catalog::Asin;

/// Acquisition status of a request.
///
/// State machine flow:
/// ```text
/// Pending -> Downloading -> Downloaded
///                |              |
///                v              v
///          Failed/Cancelled  Failed/Cancelled
/// ```
/// Only forward transitions are valid. Soft deletion is a separate axis
/// (`deleted_at`), not a status value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    /// Approved, not yet handed to a download client.
    Pending,
    /// A release has been submitted to a client.
    Downloading,
    /// The download completed and was processed.
    Downloaded,
    /// Acquisition failed (terminal).
    Failed,
    /// Cancelled by user/admin (terminal).
    Cancelled,
}

impl RequestStatus {
    /// Returns the string representation used in persistence and APIs.
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Downloading => "downloading",
            RequestStatus::Downloaded => "downloaded",
            RequestStatus::Failed => "failed",
            RequestStatus::Cancelled => "cancelled",
        }
    }

    /// Parse the persisted representation.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(RequestStatus::Pending),
            "downloading" => Some(RequestStatus::Downloading),
            "downloaded" => Some(RequestStatus::Downloaded),
            "failed" => Some(RequestStatus::Failed),
            "cancelled" => Some(RequestStatus::Cancelled),
            _ => None,
        }
    }

    /// Returns true if no further status transitions are possible.
    pub fn is_terminal(&self) -> bool {
        matches!(self, RequestStatus::Failed | RequestStatus::Cancelled)
    }

    /// Whether moving to `next` is a valid forward transition.
    pub fn can_transition_to(&self, next: RequestStatus) -> bool {
        if self.is_terminal() {
            return false;
        }
        match next {
            RequestStatus::Pending => false,
            RequestStatus::Downloading => *self == RequestStatus::Pending,
            RequestStatus::Downloaded => *self == RequestStatus::Downloading,
            RequestStatus::Failed | RequestStatus::Cancelled => true,
        }
    }
}

/// Deletion lifecycle of a request row.
///
/// `Purged` has no variant here: a purged request is the absence of the row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    /// The request is active and owns its download artifacts.
    Live,
    /// User removed the request; artifacts may still be seeding.
    SoftDeleted { at: DateTime<Utc> },
}

/// Download client protocol kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientKind {
    Torrent,
    Usenet,
}

impl ClientKind {
    /// Returns the string representation for payloads and logging.
    pub fn as_str(&self) -> &'static str {
        match self {
            ClientKind::Torrent => "torrent",
            ClientKind::Usenet => "usenet",
        }
    }
}

/// Protocol-specific reference to a submitted download.
///
/// Exactly one of the two forms exists by construction; the SQLite schema
/// mirrors this with a CHECK constraint over its two handle columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "protocol", content = "value", rename_all = "snake_case")]
pub enum DownloadHandle {
    /// Torrent info-hash (lowercase hex).
    Torrent(String),
    /// Usenet job id.
    Usenet(String),
}

impl DownloadHandle {
    /// The protocol this handle belongs to.
    pub fn kind(&self) -> ClientKind {
        match self {
            DownloadHandle::Torrent(_) => ClientKind::Torrent,
            DownloadHandle::Usenet(_) => ClientKind::Usenet,
        }
    }

    /// The torrent info-hash, if this is a torrent handle.
    pub fn torrent_hash(&self) -> Option<&str> {
        match self {
            DownloadHandle::Torrent(hash) => Some(hash),
            DownloadHandle::Usenet(_) => None,
        }
    }

    /// The usenet job id, if this is a usenet handle.
    pub fn usenet_job_id(&self) -> Option<&str> {
        match self {
            DownloadHandle::Torrent(_) => None,
            DownloadHandle::Usenet(id) => Some(id),
        }
    }
}

/// Status of one download attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DownloadStatus {
    Pending,
    Downloading,
    Completed,
    Failed,
}

impl DownloadStatus {
    /// Returns the string representation used in persistence and APIs.
    pub fn as_str(&self) -> &'static str {
        match self {
            DownloadStatus::Pending => "pending",
            DownloadStatus::Downloading => "downloading",
            DownloadStatus::Completed => "completed",
            DownloadStatus::Failed => "failed",
        }
    }

    /// Parse the persisted representation.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(DownloadStatus::Pending),
            "downloading" => Some(DownloadStatus::Downloading),
            "completed" => Some(DownloadStatus::Completed),
            "failed" => Some(DownloadStatus::Failed),
            _ => None,
        }
    }
}

/// A user's request for one audiobook to be acquired.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    /// Unique identifier (UUID).
    pub id: String,
    /// External catalog identifier being acquired.
    pub asin: Asin,
    /// Title at request time.
    pub title: String,
    /// Author at request time.
    pub author: String,
    /// User who created the request.
    pub requested_by: String,
    /// Current acquisition status.
    pub status: RequestStatus,
    /// Error message from the last failed attempt.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// When the request was created.
    pub created_at: DateTime<Utc>,
    /// When acquisition completed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    /// Soft-delete timestamp (None = live).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Request {
    /// The deletion lifecycle of this row.
    pub fn lifecycle(&self) -> Lifecycle {
        match self.deleted_at {
            None => Lifecycle::Live,
            Some(at) => Lifecycle::SoftDeleted { at },
        }
    }

    /// Returns true if the request has not been soft-deleted.
    pub fn is_live(&self) -> bool {
        self.deleted_at.is_none()
    }
}

/// One attempt to acquire a request's release.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DownloadHistory {
    /// Unique identifier (UUID).
    pub id: String,
    /// Owning request.
    pub request_id: String,
    /// Whether this attempt is the one being pursued.
    pub selected: bool,
    /// Indexer the release came from.
    pub indexer: String,
    /// Protocol handle obtained at submission.
    pub handle: DownloadHandle,
    /// Status of the attempt.
    pub status: DownloadStatus,
    /// Human-readable release title.
    pub title: String,
    /// When the attempt was created.
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_forward_transitions() {
        assert!(RequestStatus::Pending.can_transition_to(RequestStatus::Downloading));
        assert!(RequestStatus::Downloading.can_transition_to(RequestStatus::Downloaded));
        assert!(RequestStatus::Downloading.can_transition_to(RequestStatus::Failed));
        assert!(RequestStatus::Downloaded.can_transition_to(RequestStatus::Cancelled));
    }

    #[test]
    fn test_status_backward_transitions_rejected() {
        assert!(!RequestStatus::Downloading.can_transition_to(RequestStatus::Pending));
        assert!(!RequestStatus::Downloaded.can_transition_to(RequestStatus::Downloading));
        assert!(!RequestStatus::Pending.can_transition_to(RequestStatus::Downloaded));
        assert!(!RequestStatus::Pending.can_transition_to(RequestStatus::Pending));
    }

    #[test]
    fn test_terminal_states_frozen() {
        assert!(RequestStatus::Failed.is_terminal());
        assert!(RequestStatus::Cancelled.is_terminal());
        assert!(!RequestStatus::Failed.can_transition_to(RequestStatus::Downloading));
        assert!(!RequestStatus::Cancelled.can_transition_to(RequestStatus::Failed));
    }

    #[test]
    fn test_status_roundtrip() {
        for status in [
            RequestStatus::Pending,
            RequestStatus::Downloading,
            RequestStatus::Downloaded,
            RequestStatus::Failed,
            RequestStatus::Cancelled,
        ] {
            assert_eq!(RequestStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(RequestStatus::parse("bogus"), None);
    }

    #[test]
    fn test_handle_exactly_one_protocol() {
        let torrent = DownloadHandle::Torrent("a1b2c3".to_string());
        assert_eq!(torrent.kind(), ClientKind::Torrent);
        assert_eq!(torrent.torrent_hash(), Some("a1b2c3"));
        assert!(torrent.usenet_job_id().is_none());

        let usenet = DownloadHandle::Usenet("nzo_1234".to_string());
        assert_eq!(usenet.kind(), ClientKind::Usenet);
        assert_eq!(usenet.usenet_job_id(), Some("nzo_1234"));
        assert!(usenet.torrent_hash().is_none());
    }

    #[test]
    fn test_handle_serialization_tagged() {
        let handle = DownloadHandle::Torrent("deadbeef".to_string());
        let json = serde_json::to_string(&handle).unwrap();
        assert_eq!(json, r#"{"protocol":"torrent","value":"deadbeef"}"#);

        let back: DownloadHandle = serde_json::from_str(&json).unwrap();
        assert_eq!(back, handle);
    }

    #[test]
    fn test_lifecycle_axis_independent_of_status() {
        let now = Utc::now();
        let mut request = Request {
            id: "r1".to_string(),
            asin: Asin::new("B002V0QK4C").unwrap(),
            title: "T".to_string(),
            author: "A".to_string(),
            requested_by: "alice".to_string(),
            status: RequestStatus::Downloaded,
            error: None,
            created_at: now,
            completed_at: Some(now),
            deleted_at: None,
            updated_at: now,
        };
        assert_eq!(request.lifecycle(), Lifecycle::Live);
        assert!(request.is_live());

        request.deleted_at = Some(now);
        assert_eq!(request.lifecycle(), Lifecycle::SoftDeleted { at: now });
        assert!(!request.is_live());
        // Status is untouched by deletion.
        assert_eq!(request.status, RequestStatus::Downloaded);
    }
}
