//! Testing utilities and mock implementations.
//!
//! Mock implementations of the external service traits, allowing the router
//! and reclaimer to be tested without real infrastructure.
//!
//! # Example
//!
//! ```rust,ignore
//! use bookhound_core::testing::{MockTorrentClient, MockJobQueue};
//!
//! let torrent_client = MockTorrentClient::new();
//! torrent_client.set_seeding("abc123", "Some Release", 40 * 60).await;
//!
//! let jobs = MockJobQueue::new();
//! // Wire into DownloadRouter / SeededTorrentReclaimer...
//! ```

mod mock_job_queue;
mod mock_library_store;
mod mock_torrent_client;
mod mock_usenet_client;

pub use mock_job_queue::{MockJobQueue, RecordedJob};
pub use mock_library_store::MockLibraryStore;
pub use mock_torrent_client::MockTorrentClient;
pub use mock_usenet_client::MockUsenetClient;

/// Test fixtures and helper functions.
pub mod fixtures {
    use crate::catalog::{Asin, CatalogItem};
    use crate::library::LibraryEntry;
    use crate::router::Release;

    /// Create a test catalog item with reasonable defaults.
    pub fn catalog_item(asin: &str, title: &str, author: &str) -> CatalogItem {
        CatalogItem {
            asin: Asin::new(asin).unwrap(),
            title: title.to_string(),
            author: author.to_string(),
            narrator: None,
            isbn: None,
        }
    }

    /// Create a test library entry with reasonable defaults.
    pub fn library_entry(key: &str, title: &str, author: &str) -> LibraryEntry {
        LibraryEntry {
            library_key: key.to_string(),
            rating_key: None,
            title: title.to_string(),
            author: author.to_string(),
            asin: None,
            embedded_guid: None,
            isbn: None,
        }
    }

    /// Create a test release pointing at a mock indexer.
    pub fn release(indexer: &str, title: &str) -> Release {
        Release {
            indexer: indexer.to_string(),
            title: title.to_string(),
            download_url: format!(
                "https://{}.example/release/{}.torrent",
                indexer,
                title.to_lowercase().replace(' ', "-")
            ),
        }
    }
}
