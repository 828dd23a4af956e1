use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::matching::MatcherConfig;
use crate::request::ClientKind;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub download: DownloadConfig,
    #[serde(default)]
    pub matcher: MatcherConfig,
    #[serde(default)]
    pub remote_path: RemotePathConfig,
    #[serde(default)]
    pub qbittorrent: Option<QBittorrentConfig>,
    #[serde(default)]
    pub sabnzbd: Option<SabnzbdConfig>,
    /// Per-indexer seeding policies. Empty means reclaim never runs.
    #[serde(default)]
    pub seeding_policies: Vec<IndexerSeedingPolicy>,
}

/// Database configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("bookhound.db")
}

/// Download routing configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DownloadConfig {
    /// Which client kind new releases are routed to.
    #[serde(default = "default_client")]
    pub default_client: ClientKind,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            default_client: default_client(),
        }
    }
}

fn default_client() -> ClientKind {
    ClientKind::Torrent
}

/// qBittorrent client configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct QBittorrentConfig {
    /// qBittorrent WebUI URL (e.g., "http://localhost:8080")
    pub url: String,
    pub username: String,
    pub password: String,
    /// Request timeout in seconds (default: 30)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u32,
}

/// SABnzbd client configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SabnzbdConfig {
    /// SABnzbd URL (e.g., "http://localhost:8085")
    pub url: String,
    pub api_key: String,
    /// Queue category for submitted jobs (default: "audio")
    #[serde(default = "default_sab_category")]
    pub category: String,
    /// Request timeout in seconds (default: 30)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u32,
}

fn default_timeout() -> u32 {
    30
}

fn default_sab_category() -> String {
    "audio".to_string()
}

/// Remote path mapping between a download client's filesystem view and the
/// host's. Disabled by default; when enabled, both paths are required.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RemotePathConfig {
    #[serde(default)]
    pub enabled: bool,
    /// Path prefix as the download client reports it.
    #[serde(default)]
    pub remote_path: String,
    /// Replacement prefix as the host sees it.
    #[serde(default)]
    pub local_path: String,
}

/// Per-indexer seeding policy.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "protocol", rename_all = "snake_case")]
pub enum IndexerSeedingPolicy {
    /// Keep torrents from this indexer seeding for at least this long.
    Torrent {
        name: String,
        seeding_time_minutes: u64,
    },
    /// Usenet has no seeding obligation.
    Usenet {
        name: String,
        #[serde(default)]
        remove_after_processing: bool,
    },
}

impl IndexerSeedingPolicy {
    /// The indexer this policy applies to.
    pub fn indexer(&self) -> &str {
        match self {
            IndexerSeedingPolicy::Torrent { name, .. } => name,
            IndexerSeedingPolicy::Usenet { name, .. } => name,
        }
    }
}
