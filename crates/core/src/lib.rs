//! Matching-and-lifecycle engine for an audiobook request system.
//!
//! Reconciles external catalog entries against a local media library and
//! in-flight requests (identity matching), and drives the download lifecycle:
//! routing a chosen release to a torrent/usenet client, recording the
//! attempt, and reclaiming seeded torrents under per-indexer policy.
//!
//! Transport (HTTP, UI) and the durable job scheduler are external
//! collaborators; this crate exposes the traits they implement or consume.

pub mod catalog;
pub mod config;
pub mod error;
pub mod jobs;
pub mod library;
pub mod matching;
pub mod metrics;
pub mod pathmap;
pub mod reclaim;
pub mod request;
pub mod router;
pub mod testing;
pub mod torrent_client;
pub mod usenet_client;

pub use catalog::{Asin, CatalogItem, EnrichedItem};
pub use config::{load_config, load_config_from_str, validate_config, Config, ConfigError};
pub use error::CoreError;
pub use matching::{MatchQuery, MatcherConfig, MatchingEngine};
pub use reclaim::{ReclaimReport, SeededTorrentReclaimer};
pub use request::{
    ClientKind, DownloadHandle, DownloadHistory, DownloadStatus, Lifecycle, Request,
    RequestStatus, RequestStore, SqliteRequestStore,
};
pub use router::{DownloadRouter, Release};
