//! Library entry types and the batched store trait.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::catalog::Asin;

/// Errors from the library store backend.
#[derive(Debug, Error)]
pub enum LibraryError {
    #[error("library connection failed: {0}")]
    ConnectionFailed(String),

    #[error("library API error: {0}")]
    ApiError(String),
}

/// An item already cataloged in the media library.
///
/// Read-only from this crate's perspective.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LibraryEntry {
    /// External library key.
    pub library_key: String,
    /// Back-reference to a library rating identifier, when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating_key: Option<String>,
    /// Title.
    pub title: String,
    /// Author.
    pub author: String,
    /// Dedicated external identifier field, when the library stores one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asin: Option<Asin>,
    /// Opaque GUID-like field that may embed the identifier instead.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedded_guid: Option<String>,
    /// ISBN, when the library stores one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub isbn: Option<String>,
}

/// Loosely-shaped library record as received from the sync process.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawLibraryRecord {
    pub library_key: Option<String>,
    pub rating_key: Option<String>,
    pub title: Option<String>,
    pub author: Option<String>,
    pub asin: Option<String>,
    pub guid: Option<String>,
    pub isbn: Option<String>,
}

impl LibraryEntry {
    /// Validate a raw record into a library entry.
    ///
    /// A record without a library key or title is unusable and rejected. A
    /// malformed dedicated identifier is dropped (with a warning) rather
    /// than rejecting the whole entry, since the entry is still matchable
    /// by text.
    pub fn from_raw(raw: RawLibraryRecord) -> Option<Self> {
        let library_key = raw.library_key.filter(|k| !k.trim().is_empty())?;
        let title = raw
            .title
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())?;

        let asin = match raw.asin.filter(|a| !a.trim().is_empty()) {
            Some(a) => match Asin::new(a) {
                Ok(asin) => Some(asin),
                Err(e) => {
                    warn!(library_key = %library_key, "dropping malformed library identifier: {e}");
                    None
                }
            },
            None => None,
        };

        Some(Self {
            library_key,
            rating_key: raw.rating_key.filter(|k| !k.trim().is_empty()),
            title,
            author: raw.author.unwrap_or_default().trim().to_string(),
            asin,
            embedded_guid: raw.guid.filter(|g| !g.trim().is_empty()),
            isbn: raw.isbn.filter(|i| !i.trim().is_empty()),
        })
    }
}

/// Batched read access to the media library.
#[async_trait]
pub trait LibraryStore: Send + Sync {
    /// List all library entries in one call. Never per-item.
    async fn list_entries(&self) -> Result<Vec<LibraryEntry>, LibraryError>;
}
