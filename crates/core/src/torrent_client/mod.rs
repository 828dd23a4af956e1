//! Torrent download client adapters.

mod qbittorrent;
mod types;

pub use qbittorrent::QBittorrentClient;
pub use types::{AddTorrentResult, SeedingInfo, TorrentClient, TorrentClientError};
