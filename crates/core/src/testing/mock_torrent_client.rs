//! Mock torrent client for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::torrent_client::{AddTorrentResult, SeedingInfo, TorrentClient, TorrentClientError};

/// Mock implementation of the TorrentClient trait.
///
/// Provides controllable behavior for testing:
/// - Track added and deleted torrents for assertions
/// - Control per-torrent seeding durations
/// - Simulate failures
#[derive(Debug)]
pub struct MockTorrentClient {
    /// Recorded add_torrent URLs.
    added: Arc<RwLock<Vec<String>>>,
    /// Recorded delete_torrent calls as `(hash, delete_files)`.
    deleted: Arc<RwLock<Vec<(String, bool)>>>,
    /// Known torrents by hash.
    torrents: Arc<RwLock<HashMap<String, SeedingInfo>>>,
    /// If set, the next operation will fail with this error.
    next_error: Arc<RwLock<Option<TorrentClientError>>>,
    /// Counter for generating unique hashes.
    hash_counter: Arc<RwLock<u32>>,
}

impl Default for MockTorrentClient {
    fn default() -> Self {
        Self::new()
    }
}

impl MockTorrentClient {
    /// Create a new mock torrent client.
    pub fn new() -> Self {
        Self {
            added: Arc::new(RwLock::new(Vec::new())),
            deleted: Arc::new(RwLock::new(Vec::new())),
            torrents: Arc::new(RwLock::new(HashMap::new())),
            next_error: Arc::new(RwLock::new(None)),
            hash_counter: Arc::new(RwLock::new(0)),
        }
    }

    /// Get all recorded add_torrent URLs.
    pub async fn added_torrents(&self) -> Vec<String> {
        self.added.read().await.clone()
    }

    /// Get all recorded delete_torrent calls.
    pub async fn deleted_torrents(&self) -> Vec<(String, bool)> {
        self.deleted.read().await.clone()
    }

    /// Register a torrent with a given seeding duration.
    pub async fn set_seeding(&self, hash: &str, name: &str, seeding_duration_secs: u64) {
        let mut torrents = self.torrents.write().await;
        torrents.insert(
            hash.to_string(),
            SeedingInfo {
                hash: hash.to_string(),
                name: name.to_string(),
                seeding_duration_secs,
            },
        );
    }

    /// Returns true if the torrent is still known to the client.
    pub async fn has_torrent(&self, hash: &str) -> bool {
        self.torrents.read().await.contains_key(hash)
    }

    /// Make the next operation fail with the given error.
    pub async fn set_next_error(&self, error: TorrentClientError) {
        let mut next = self.next_error.write().await;
        *next = Some(error);
    }

    async fn take_error(&self) -> Option<TorrentClientError> {
        self.next_error.write().await.take()
    }
}

#[async_trait]
impl TorrentClient for MockTorrentClient {
    fn name(&self) -> &str {
        "mock-torrent"
    }

    async fn add_torrent(&self, url: &str) -> Result<AddTorrentResult, TorrentClientError> {
        if let Some(error) = self.take_error().await {
            return Err(error);
        }

        self.added.write().await.push(url.to_string());

        let mut counter = self.hash_counter.write().await;
        *counter += 1;
        let hash = format!("{:040x}", *counter);
        let name = format!("Mock Torrent {}", *counter);
        drop(counter);

        self.torrents.write().await.insert(
            hash.clone(),
            SeedingInfo {
                hash: hash.clone(),
                name: name.clone(),
                seeding_duration_secs: 0,
            },
        );

        Ok(AddTorrentResult {
            hash,
            name: Some(name),
        })
    }

    async fn get_torrent(&self, hash: &str) -> Result<SeedingInfo, TorrentClientError> {
        if let Some(error) = self.take_error().await {
            return Err(error);
        }

        self.torrents
            .read()
            .await
            .get(hash)
            .cloned()
            .ok_or_else(|| TorrentClientError::TorrentNotFound(hash.to_string()))
    }

    async fn delete_torrent(
        &self,
        hash: &str,
        delete_files: bool,
    ) -> Result<(), TorrentClientError> {
        if let Some(error) = self.take_error().await {
            return Err(error);
        }

        self.deleted
            .write()
            .await
            .push((hash.to_string(), delete_files));

        // Idempotent: removing an unknown hash succeeds.
        self.torrents.write().await.remove(hash);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_add_records_url_and_registers_torrent() {
        let client = MockTorrentClient::new();
        let result = client.add_torrent("magnet:?xt=test").await.unwrap();

        assert_eq!(client.added_torrents().await, vec!["magnet:?xt=test"]);
        assert!(client.has_torrent(&result.hash).await);
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let client = MockTorrentClient::new();
        client.delete_torrent("unknown", true).await.unwrap();
        assert_eq!(
            client.deleted_torrents().await,
            vec![("unknown".to_string(), true)]
        );
    }

    #[tokio::test]
    async fn test_next_error_fires_once() {
        let client = MockTorrentClient::new();
        client.set_next_error(TorrentClientError::Timeout).await;

        assert!(client.add_torrent("magnet:?xt=test").await.is_err());
        assert!(client.add_torrent("magnet:?xt=test").await.is_ok());
    }
}
