//! Seeded torrent reclamation.
//!
//! Periodic sweep that walks completed downloads and, per configured indexer
//! seeding policy, removes torrents that have seeded long enough and are not
//! needed by any other live request, purging soft-deleted request rows along
//! the way.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::config::IndexerSeedingPolicy;
use crate::error::CoreError;
use crate::metrics;
use crate::request::{DownloadHandle, DownloadHistory, Request, RequestStore};
use crate::torrent_client::TorrentClient;

/// Outcome of one reclaim sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReclaimReport {
    /// Torrents deleted and/or soft-deleted requests purged.
    pub cleaned: u32,
    /// Rows left for a later sweep (still seeding, shared, or client error).
    pub skipped: u32,
    /// True when no seeding policy is configured and the sweep did nothing.
    pub skipped_no_config: bool,
}

enum RowOutcome {
    Cleaned,
    Skipped(&'static str),
    /// Row needs no action this sweep (e.g. live usenet download).
    Ignored,
}

/// Sweeps completed torrent downloads against per-indexer seeding policy.
pub struct SeededTorrentReclaimer {
    policies: HashMap<String, IndexerSeedingPolicy>,
    store: Arc<dyn RequestStore>,
    torrent_client: Arc<dyn TorrentClient>,
}

impl SeededTorrentReclaimer {
    /// Create a new reclaimer from the configured policy list.
    pub fn new(
        policies: &[IndexerSeedingPolicy],
        store: Arc<dyn RequestStore>,
        torrent_client: Arc<dyn TorrentClient>,
    ) -> Self {
        Self {
            policies: policies
                .iter()
                .map(|p| (p.indexer().to_string(), p.clone()))
                .collect(),
            store,
            torrent_client,
        }
    }

    /// Run one sweep.
    ///
    /// Never runs against an undefined policy: with no policies configured
    /// the sweep reports `skipped_no_config` and performs zero mutations.
    /// Per-row failures count as skipped and never abort the sweep, so two
    /// concurrent sweeps are safe (deletes are idempotent, seeding time is
    /// re-read fresh each pass).
    pub async fn reclaim(&self) -> Result<ReclaimReport, CoreError> {
        metrics::RECLAIM_SWEEPS.inc();

        if self.policies.is_empty() {
            debug!("No seeding policies configured, skipping reclaim sweep");
            metrics::RECLAIM_SKIPPED.with_label_values(&["no_policy"]).inc();
            return Ok(ReclaimReport {
                skipped_no_config: true,
                ..ReclaimReport::default()
            });
        }

        let mut report = ReclaimReport::default();

        for (request, history) in self.store.completed_selected()? {
            let Some(policy) = self.policies.get(&history.indexer) else {
                continue;
            };

            match self.reclaim_row(&request, &history, policy).await {
                Ok(RowOutcome::Cleaned) => {
                    report.cleaned += 1;
                    metrics::RECLAIM_CLEANED.inc();
                }
                Ok(RowOutcome::Skipped(reason)) => {
                    report.skipped += 1;
                    metrics::RECLAIM_SKIPPED.with_label_values(&[reason]).inc();
                }
                Ok(RowOutcome::Ignored) => {}
                Err(e) => {
                    warn!(
                        request_id = %request.id,
                        indexer = %history.indexer,
                        "Reclaim row failed, continuing sweep: {}", e
                    );
                    report.skipped += 1;
                    metrics::RECLAIM_SKIPPED
                        .with_label_values(&["client_error"])
                        .inc();
                }
            }
        }

        info!(
            cleaned = report.cleaned,
            skipped = report.skipped,
            "Reclaim sweep finished"
        );
        Ok(report)
    }

    async fn reclaim_row(
        &self,
        request: &Request,
        history: &DownloadHistory,
        policy: &IndexerSeedingPolicy,
    ) -> Result<RowOutcome, CoreError> {
        let hash = match &history.handle {
            // Usenet has no seeding obligation: a soft-deleted request has
            // nothing left to protect and must not linger.
            DownloadHandle::Usenet(_) => {
                if request.is_live() {
                    return Ok(RowOutcome::Ignored);
                }
                self.store.hard_delete(&request.id)?;
                info!(request_id = %request.id, "Purged soft-deleted usenet request");
                return Ok(RowOutcome::Cleaned);
            }
            DownloadHandle::Torrent(hash) => hash,
        };

        let threshold_minutes = match policy {
            IndexerSeedingPolicy::Torrent {
                seeding_time_minutes,
                ..
            } => *seeding_time_minutes,
            // A usenet policy cannot govern a torrent handle.
            IndexerSeedingPolicy::Usenet { name, .. } => {
                warn!(
                    request_id = %request.id,
                    indexer = %name,
                    "Torrent download under a usenet policy, skipping"
                );
                return Ok(RowOutcome::Skipped("client_error"));
            }
        };

        // Seeding time is read fresh each sweep, never cached.
        let seeding = self.torrent_client.get_torrent(hash).await?;
        if seeding.seeding_duration_secs < threshold_minutes * 60 {
            debug!(
                hash = %hash,
                seeded_secs = seeding.seeding_duration_secs,
                "Seeding obligation not yet met"
            );
            return Ok(RowOutcome::Skipped("below_threshold"));
        }

        let sharers = self.store.live_sharing_torrent(hash, &request.id)?;
        if sharers.is_empty() {
            self.torrent_client.delete_torrent(hash, true).await?;
            if !request.is_live() {
                self.store.hard_delete(&request.id)?;
            }
            info!(hash = %hash, request_id = %request.id, "Reclaimed seeded torrent");
            return Ok(RowOutcome::Cleaned);
        }

        // Another live request still needs the seed; detach this request if
        // the user removed it, but leave the torrent alone.
        if !request.is_live() {
            self.store.hard_delete(&request.id)?;
            info!(
                hash = %hash,
                request_id = %request.id,
                "Purged soft-deleted request sharing a seeding torrent"
            );
        }
        Ok(RowOutcome::Skipped("shared"))
    }
}
