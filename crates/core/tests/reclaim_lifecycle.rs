//! Reclaim lifecycle integration tests.
//!
//! Drive a request through submission and completion with the router, then
//! verify the reclaim sweep honors seeding policy, shared handles, and the
//! soft-delete/purge lifecycle.

use std::sync::Arc;

use tempfile::TempDir;

use bookhound_core::{
    config::{DownloadConfig, IndexerSeedingPolicy},
    request::{NewRequest, RequestStore},
    testing::{fixtures, MockJobQueue, MockTorrentClient, MockUsenetClient},
    Asin, ClientKind, DownloadRouter, DownloadStatus, RequestStatus, SeededTorrentReclaimer,
    SqliteRequestStore,
};

struct TestHarness {
    store: Arc<SqliteRequestStore>,
    torrent_client: Arc<MockTorrentClient>,
    usenet_client: Arc<MockUsenetClient>,
    jobs: Arc<MockJobQueue>,
    _temp_dir: TempDir,
}

impl TestHarness {
    fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("test.db");
        let store =
            Arc::new(SqliteRequestStore::new(&db_path).expect("Failed to create request store"));

        Self {
            store,
            torrent_client: Arc::new(MockTorrentClient::new()),
            usenet_client: Arc::new(MockUsenetClient::new()),
            jobs: Arc::new(MockJobQueue::new()),
            _temp_dir: temp_dir,
        }
    }

    fn router(&self) -> DownloadRouter {
        DownloadRouter::new(
            DownloadConfig {
                default_client: ClientKind::Torrent,
            },
            self.store.clone(),
            self.torrent_client.clone(),
            self.usenet_client.clone(),
            self.jobs.clone(),
        )
    }

    fn reclaimer(&self, policies: &[IndexerSeedingPolicy]) -> SeededTorrentReclaimer {
        SeededTorrentReclaimer::new(policies, self.store.clone(), self.torrent_client.clone())
    }

    /// Create a request, route a release for it, and mark it downloaded.
    /// Returns `(request_id, torrent_hash)`.
    async fn downloaded_request(&self, asin: &str, indexer: &str) -> (String, String) {
        let request_id = self
            .store
            .create(NewRequest {
                asin: Asin::new(asin).unwrap(),
                title: "The Blade Itself".to_string(),
                author: "Joe Abercrombie".to_string(),
                requested_by: "alice".to_string(),
            })
            .unwrap()
            .id;

        let history = self
            .router()
            .submit(&request_id, &fixtures::release(indexer, "The Blade Itself"))
            .await
            .unwrap();
        let hash = history.handle.torrent_hash().unwrap().to_string();

        self.store
            .update_history_status(&history.id, DownloadStatus::Completed)
            .unwrap();
        self.store
            .update_status(&request_id, RequestStatus::Downloaded)
            .unwrap();

        (request_id, hash)
    }
}

fn policy(indexer: &str, minutes: u64) -> IndexerSeedingPolicy {
    IndexerSeedingPolicy::Torrent {
        name: indexer.to_string(),
        seeding_time_minutes: minutes,
    }
}

#[tokio::test]
async fn test_full_lifecycle_submit_complete_reclaim() {
    let h = TestHarness::new();
    let (request_id, hash) = h.downloaded_request("B002V0QK4C", "IndexerA").await;

    // Seeded past the 30 minute policy.
    h.torrent_client
        .set_seeding(&hash, "The Blade Itself", 40 * 60)
        .await;

    let report = h.reclaimer(&[policy("IndexerA", 30)]).reclaim().await.unwrap();

    assert_eq!(report.cleaned, 1);
    assert_eq!(report.skipped, 0);
    assert!(!h.torrent_client.has_torrent(&hash).await);
    assert_eq!(
        h.torrent_client.deleted_torrents().await,
        vec![(hash, true)]
    );
    // The request was live, so only the torrent is reclaimed.
    assert!(h.store.get(&request_id).unwrap().is_some());
}

#[tokio::test]
async fn test_soft_deleted_request_purged_with_its_torrent() {
    let h = TestHarness::new();
    let (request_id, hash) = h.downloaded_request("B002V0QK4C", "IndexerA").await;
    h.store.soft_delete(&request_id).unwrap();
    h.torrent_client
        .set_seeding(&hash, "The Blade Itself", 40 * 60)
        .await;

    let report = h.reclaimer(&[policy("IndexerA", 30)]).reclaim().await.unwrap();

    assert_eq!(report.cleaned, 1);
    assert!(!h.torrent_client.has_torrent(&hash).await);
    // Hard-deleted: the identifier is free for a fresh request.
    assert!(h.store.get(&request_id).unwrap().is_none());
    assert!(h
        .store
        .create(NewRequest {
            asin: Asin::new("B002V0QK4C").unwrap(),
            title: "The Blade Itself".to_string(),
            author: "Joe Abercrombie".to_string(),
            requested_by: "bob".to_string(),
        })
        .is_ok());
}

#[tokio::test]
async fn test_sweep_is_idempotent_across_runs() {
    let h = TestHarness::new();
    let (_, hash) = h.downloaded_request("B002V0QK4C", "IndexerA").await;
    h.torrent_client
        .set_seeding(&hash, "The Blade Itself", 40 * 60)
        .await;

    let reclaimer = h.reclaimer(&[policy("IndexerA", 30)]);
    let first = reclaimer.reclaim().await.unwrap();
    assert_eq!(first.cleaned, 1);

    // A second sweep finds the torrent gone; the row is a per-row client
    // error (not found), counted as skipped, and the sweep still succeeds.
    let second = reclaimer.reclaim().await.unwrap();
    assert_eq!(second.cleaned, 0);
    assert_eq!(second.skipped, 1);
}

#[tokio::test]
async fn test_below_threshold_waits_for_later_sweep() {
    let h = TestHarness::new();
    let (_, hash) = h.downloaded_request("B002V0QK4C", "IndexerA").await;
    h.torrent_client
        .set_seeding(&hash, "The Blade Itself", 10 * 60)
        .await;

    let reclaimer = h.reclaimer(&[policy("IndexerA", 30)]);
    let report = reclaimer.reclaim().await.unwrap();
    assert_eq!(report.cleaned, 0);
    assert_eq!(report.skipped, 1);
    assert!(h.torrent_client.has_torrent(&hash).await);
}

#[tokio::test]
async fn test_no_policy_sweep_touches_nothing() {
    let h = TestHarness::new();
    let (request_id, hash) = h.downloaded_request("B002V0QK4C", "IndexerA").await;
    h.store.soft_delete(&request_id).unwrap();
    h.torrent_client
        .set_seeding(&hash, "The Blade Itself", 400 * 60)
        .await;

    let report = h.reclaimer(&[]).reclaim().await.unwrap();

    assert!(report.skipped_no_config);
    assert_eq!(report.cleaned, 0);
    assert!(h.torrent_client.has_torrent(&hash).await);
    assert!(h.store.get(&request_id).unwrap().is_some());
}
