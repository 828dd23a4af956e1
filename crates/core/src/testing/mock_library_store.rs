//! Mock library store for testing.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::library::{LibraryEntry, LibraryError, LibraryStore};

/// Mock implementation of the LibraryStore trait.
#[derive(Debug, Default)]
pub struct MockLibraryStore {
    entries: Arc<RwLock<Vec<LibraryEntry>>>,
    /// If set, the next list_entries will fail with this error.
    next_error: Arc<RwLock<Option<LibraryError>>>,
    /// Number of list_entries calls, for batching assertions.
    list_calls: Arc<RwLock<u32>>,
}

impl MockLibraryStore {
    /// Create a new mock library store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the library contents.
    pub async fn set_entries(&self, entries: Vec<LibraryEntry>) {
        let mut current = self.entries.write().await;
        *current = entries;
    }

    /// Make the next list_entries fail with the given error.
    pub async fn set_next_error(&self, error: LibraryError) {
        let mut next = self.next_error.write().await;
        *next = Some(error);
    }

    /// How many times list_entries has been called.
    pub async fn list_call_count(&self) -> u32 {
        *self.list_calls.read().await
    }
}

#[async_trait]
impl LibraryStore for MockLibraryStore {
    async fn list_entries(&self) -> Result<Vec<LibraryEntry>, LibraryError> {
        *self.list_calls.write().await += 1;

        if let Some(error) = self.next_error.write().await.take() {
            return Err(error);
        }

        Ok(self.entries.read().await.clone())
    }
}
