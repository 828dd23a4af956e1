//! Job queue types.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::request::{ClientKind, DownloadHandle};

/// How many times a monitor job may be retried before the download is
/// marked failed.
pub const MONITOR_RETRIES: u32 = 3;

/// Errors that can occur when enqueueing jobs.
#[derive(Debug, Error)]
pub enum JobQueueError {
    #[error("Failed to enqueue job: {0}")]
    EnqueueFailed(String),

    #[error("Job queue unavailable: {0}")]
    Unavailable(String),
}

/// The kinds of background jobs the core schedules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobKind {
    /// Poll a submitted download until it completes or fails.
    MonitorDownload,
    /// Sweep completed torrents whose seeding obligation is met.
    ReclaimSeeded,
}

impl JobKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobKind::MonitorDownload => "monitor_download",
            JobKind::ReclaimSeeded => "reclaim_seeded",
        }
    }
}

/// Payload for a [`JobKind::MonitorDownload`] job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitorDownloadPayload {
    pub request_id: String,
    pub download_history_id: String,
    pub handle: DownloadHandle,
    pub client_kind: ClientKind,
    pub retries_left: u32,
}

/// Trait for enqueueing background jobs.
#[async_trait]
pub trait JobQueue: Send + Sync {
    /// Enqueue a job with a serialized payload.
    async fn enqueue(&self, kind: JobKind, payload: serde_json::Value)
        -> Result<(), JobQueueError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_monitor_payload_round_trip() {
        let payload = MonitorDownloadPayload {
            request_id: "r-7".to_string(),
            download_history_id: "h-12".to_string(),
            handle: DownloadHandle::Torrent("deadbeef".to_string()),
            client_kind: ClientKind::Torrent,
            retries_left: MONITOR_RETRIES,
        };

        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["request_id"], "r-7");
        assert_eq!(json["retries_left"], 3);
        assert_eq!(json["handle"]["protocol"], "torrent");

        let parsed: MonitorDownloadPayload = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, payload);
    }

    #[test]
    fn test_job_kind_names() {
        assert_eq!(JobKind::MonitorDownload.as_str(), "monitor_download");
        assert_eq!(JobKind::ReclaimSeeded.as_str(), "reclaim_seeded");
    }
}
