//! Mock usenet client for testing.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::usenet_client::{UsenetClient, UsenetClientError};

/// Mock implementation of the UsenetClient trait.
#[derive(Debug)]
pub struct MockUsenetClient {
    /// Recorded add_job URLs.
    added: Arc<RwLock<Vec<String>>>,
    /// If set, the next operation will fail with this error.
    next_error: Arc<RwLock<Option<UsenetClientError>>>,
    /// Counter for generating unique job ids.
    job_counter: Arc<RwLock<u32>>,
}

impl Default for MockUsenetClient {
    fn default() -> Self {
        Self::new()
    }
}

impl MockUsenetClient {
    /// Create a new mock usenet client.
    pub fn new() -> Self {
        Self {
            added: Arc::new(RwLock::new(Vec::new())),
            next_error: Arc::new(RwLock::new(None)),
            job_counter: Arc::new(RwLock::new(0)),
        }
    }

    /// Get all recorded add_job URLs.
    pub async fn added_jobs(&self) -> Vec<String> {
        self.added.read().await.clone()
    }

    /// Make the next operation fail with the given error.
    pub async fn set_next_error(&self, error: UsenetClientError) {
        let mut next = self.next_error.write().await;
        *next = Some(error);
    }
}

#[async_trait]
impl UsenetClient for MockUsenetClient {
    fn name(&self) -> &str {
        "mock-usenet"
    }

    async fn add_job(&self, url: &str) -> Result<String, UsenetClientError> {
        if let Some(error) = self.next_error.write().await.take() {
            return Err(error);
        }

        self.added.write().await.push(url.to_string());

        let mut counter = self.job_counter.write().await;
        *counter += 1;
        Ok(format!("nzo_mock_{:04}", *counter))
    }
}
