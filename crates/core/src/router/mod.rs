//! Download routing.
//!
//! Takes an approved request and a chosen release, submits the release to
//! the configured download client, records the attempt, and hands the rest
//! of the lifecycle to a monitor job.

use std::sync::Arc;

use tracing::{info, warn};

use crate::config::DownloadConfig;
use crate::error::CoreError;
use crate::jobs::{JobKind, JobQueue, MonitorDownloadPayload, MONITOR_RETRIES};
use crate::metrics;
use crate::request::{
    ClientKind, DownloadHandle, DownloadHistory, DownloadStatus, NewDownloadHistory, RequestStatus,
    RequestStore,
};
use crate::torrent_client::TorrentClient;
use crate::usenet_client::UsenetClient;

/// A release chosen for a request, as reported by an indexer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Release {
    /// Indexer the release came from.
    pub indexer: String,
    /// Human-readable release title.
    pub title: String,
    /// Magnet link, .torrent URL, or NZB URL.
    pub download_url: String,
}

/// Routes releases to the configured download client and records the attempt.
pub struct DownloadRouter {
    config: DownloadConfig,
    store: Arc<dyn RequestStore>,
    torrent_client: Arc<dyn TorrentClient>,
    usenet_client: Arc<dyn UsenetClient>,
    jobs: Arc<dyn JobQueue>,
}

impl DownloadRouter {
    /// Create a new download router.
    pub fn new(
        config: DownloadConfig,
        store: Arc<dyn RequestStore>,
        torrent_client: Arc<dyn TorrentClient>,
        usenet_client: Arc<dyn UsenetClient>,
        jobs: Arc<dyn JobQueue>,
    ) -> Self {
        Self {
            config,
            store,
            torrent_client,
            usenet_client,
            jobs,
        }
    }

    /// Submit a release for a request.
    ///
    /// Dispatches to the configured client, persists the download attempt,
    /// advances the request to `Downloading`, and enqueues a monitor job.
    /// A client failure aborts before any persistence; the caller decides
    /// whether to retry with another release.
    pub async fn submit(
        &self,
        request_id: &str,
        release: &Release,
    ) -> Result<DownloadHistory, CoreError> {
        let request = self
            .store
            .get(request_id)?
            .ok_or_else(|| CoreError::NotFound(format!("request {}", request_id)))?;

        let client_kind = self.config.default_client;
        let handle = match self.acquire_handle(client_kind, release).await {
            Ok(handle) => handle,
            Err(e) => {
                metrics::SUBMISSIONS
                    .with_label_values(&[client_kind.as_str(), "error"])
                    .inc();
                warn!(
                    request_id = %request.id,
                    indexer = %release.indexer,
                    "Client rejected release: {}", e
                );
                return Err(e);
            }
        };

        let history = self.store.add_history(NewDownloadHistory {
            request_id: request.id.clone(),
            selected: true,
            indexer: release.indexer.clone(),
            handle: handle.clone(),
            status: DownloadStatus::Downloading,
            title: release.title.clone(),
        })?;

        self.store
            .update_status(&request.id, RequestStatus::Downloading)?;

        let payload = MonitorDownloadPayload {
            request_id: request.id.clone(),
            download_history_id: history.id.clone(),
            handle,
            client_kind,
            retries_left: MONITOR_RETRIES,
        };
        let payload = serde_json::to_value(&payload)
            .map_err(|e| CoreError::Upstream(format!("monitor payload: {}", e)))?;
        self.jobs.enqueue(JobKind::MonitorDownload, payload).await?;

        metrics::SUBMISSIONS
            .with_label_values(&[client_kind.as_str(), "success"])
            .inc();
        info!(
            request_id = %request.id,
            history_id = %history.id,
            indexer = %release.indexer,
            client = client_kind.as_str(),
            "Release submitted"
        );

        Ok(history)
    }

    async fn acquire_handle(
        &self,
        client_kind: ClientKind,
        release: &Release,
    ) -> Result<DownloadHandle, CoreError> {
        match client_kind {
            ClientKind::Torrent => {
                let added = self.torrent_client.add_torrent(&release.download_url).await?;
                Ok(DownloadHandle::Torrent(added.hash))
            }
            ClientKind::Usenet => {
                let job_id = self.usenet_client.add_job(&release.download_url).await?;
                Ok(DownloadHandle::Usenet(job_id))
            }
        }
    }
}
