//! Mock job queue for testing.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::jobs::{JobKind, JobQueue, JobQueueError};

/// A recorded enqueue for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedJob {
    pub kind: JobKind,
    pub payload: serde_json::Value,
}

/// Mock implementation of the JobQueue trait.
#[derive(Debug, Default)]
pub struct MockJobQueue {
    /// Recorded enqueue calls.
    enqueued: Arc<RwLock<Vec<RecordedJob>>>,
    /// If set, the next enqueue will fail with this error.
    next_error: Arc<RwLock<Option<JobQueueError>>>,
}

impl MockJobQueue {
    /// Create a new mock job queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get all recorded enqueue calls.
    pub async fn enqueued_jobs(&self) -> Vec<RecordedJob> {
        self.enqueued.read().await.clone()
    }

    /// Make the next enqueue fail with the given error.
    pub async fn set_next_error(&self, error: JobQueueError) {
        let mut next = self.next_error.write().await;
        *next = Some(error);
    }
}

#[async_trait]
impl JobQueue for MockJobQueue {
    async fn enqueue(
        &self,
        kind: JobKind,
        payload: serde_json::Value,
    ) -> Result<(), JobQueueError> {
        if let Some(error) = self.next_error.write().await.take() {
            return Err(error);
        }

        self.enqueued
            .write()
            .await
            .push(RecordedJob { kind, payload });
        Ok(())
    }
}
