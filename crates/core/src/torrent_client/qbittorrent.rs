//! qBittorrent torrent client implementation.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::config::QBittorrentConfig;

use super::{AddTorrentResult, SeedingInfo, TorrentClient, TorrentClientError};

/// How many times to poll for a freshly added torrent before giving up.
const ADD_POLL_ATTEMPTS: u32 = 10;
const ADD_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// qBittorrent client implementation.
pub struct QBittorrentClient {
    client: Client,
    config: QBittorrentConfig,
    /// Session marker (refreshed on auth failure; the cookie jar holds the
    /// actual SID).
    session: Arc<RwLock<Option<String>>>,
}

impl QBittorrentClient {
    /// Create a new qBittorrent client.
    pub fn new(config: QBittorrentConfig) -> Result<Self, TorrentClientError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs as u64))
            .cookie_store(true)
            .build()
            .map_err(|e| TorrentClientError::ConnectionFailed(e.to_string()))?;

        Ok(Self {
            client,
            config,
            session: Arc::new(RwLock::new(None)),
        })
    }

    fn base_url(&self) -> &str {
        self.config.url.trim_end_matches('/')
    }

    fn map_send_error(e: reqwest::Error) -> TorrentClientError {
        if e.is_timeout() {
            TorrentClientError::Timeout
        } else if e.is_connect() {
            TorrentClientError::ConnectionFailed(e.to_string())
        } else {
            TorrentClientError::ApiError(e.to_string())
        }
    }

    /// Login and mark the session authenticated.
    async fn login(&self) -> Result<(), TorrentClientError> {
        let url = format!("{}/api/v2/auth/login", self.base_url());

        let params = [
            ("username", self.config.username.as_str()),
            ("password", self.config.password.as_str()),
        ];

        let response = self
            .client
            .post(&url)
            .form(&params)
            .send()
            .await
            .map_err(Self::map_send_error)?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        if body.contains("Ok.") {
            debug!("qBittorrent login successful");
            let mut session = self.session.write().await;
            *session = Some("authenticated".to_string());
            Ok(())
        } else if body.contains("Fails.") || status.as_u16() == 403 {
            Err(TorrentClientError::AuthenticationFailed(
                "Invalid credentials".to_string(),
            ))
        } else {
            Err(TorrentClientError::AuthenticationFailed(format!(
                "Unexpected response: {}",
                body.chars().take(100).collect::<String>()
            )))
        }
    }

    async fn ensure_authenticated(&self) -> Result<(), TorrentClientError> {
        let session = self.session.read().await;
        if session.is_some() {
            return Ok(());
        }
        drop(session);
        self.login().await
    }

    /// Make an authenticated GET request, re-authenticating once on 403.
    async fn get(&self, endpoint: &str) -> Result<String, TorrentClientError> {
        self.ensure_authenticated().await?;
        let url = format!("{}{}", self.base_url(), endpoint);

        for attempt in 0..2 {
            let response = self
                .client
                .get(&url)
                .send()
                .await
                .map_err(Self::map_send_error)?;

            let status = response.status();
            if status.as_u16() == 403 && attempt == 0 {
                warn!("qBittorrent session expired, re-authenticating");
                {
                    let mut session = self.session.write().await;
                    *session = None;
                }
                self.login().await?;
                continue;
            }

            if !status.is_success() {
                return Err(TorrentClientError::ApiError(format!("HTTP {}", status)));
            }

            return response
                .text()
                .await
                .map_err(|e| TorrentClientError::ApiError(e.to_string()));
        }

        Err(TorrentClientError::AuthenticationFailed(
            "Re-authentication failed".to_string(),
        ))
    }

    /// Make an authenticated POST request with form data, re-authenticating
    /// once on 403.
    async fn post_form(
        &self,
        endpoint: &str,
        params: &[(&str, &str)],
    ) -> Result<String, TorrentClientError> {
        self.ensure_authenticated().await?;
        let url = format!("{}{}", self.base_url(), endpoint);

        for attempt in 0..2 {
            let response = self
                .client
                .post(&url)
                .form(params)
                .send()
                .await
                .map_err(Self::map_send_error)?;

            let status = response.status();
            if status.as_u16() == 403 && attempt == 0 {
                warn!("qBittorrent session expired, re-authenticating");
                {
                    let mut session = self.session.write().await;
                    *session = None;
                }
                self.login().await?;
                continue;
            }

            if !status.is_success() {
                return Err(TorrentClientError::ApiError(format!("HTTP {}", status)));
            }

            return response
                .text()
                .await
                .map_err(|e| TorrentClientError::ApiError(e.to_string()));
        }

        Err(TorrentClientError::AuthenticationFailed(
            "Re-authentication failed".to_string(),
        ))
    }
}

/// Subset of the qBittorrent torrents/info response.
#[derive(Debug, Deserialize)]
struct QBTorrentInfo {
    hash: String,
    name: String,
    #[serde(default)]
    seeding_time: i64,
}

/// Extract the btih info-hash from a magnet URI, if present.
fn magnet_info_hash(url: &str) -> Option<String> {
    let query = url.strip_prefix("magnet:?")?;
    for pair in query.split('&') {
        if let Some(value) = pair.strip_prefix("xt=urn:btih:") {
            return Some(value.to_lowercase());
        }
    }
    None
}

#[async_trait]
impl TorrentClient for QBittorrentClient {
    fn name(&self) -> &str {
        "qbittorrent"
    }

    async fn add_torrent(&self, url: &str) -> Result<AddTorrentResult, TorrentClientError> {
        // Tag the add so the hash can be recovered even for .torrent URLs,
        // where the add response carries no identifier.
        let tag = format!("bookhound-{}", uuid::Uuid::new_v4());

        let body = self
            .post_form(
                "/api/v2/torrents/add",
                &[("urls", url), ("tags", tag.as_str())],
            )
            .await?;

        if body.contains("Fails.") {
            return Err(TorrentClientError::ApiError(
                "qBittorrent rejected the torrent".to_string(),
            ));
        }

        // Magnet links carry the hash; resolve it directly.
        if let Some(hash) = magnet_info_hash(url) {
            let _ = self
                .post_form(
                    "/api/v2/torrents/removeTags",
                    &[("hashes", hash.as_str()), ("tags", tag.as_str())],
                )
                .await;
            return Ok(AddTorrentResult { hash, name: None });
        }

        // Otherwise poll for the tagged torrent to appear.
        for _ in 0..ADD_POLL_ATTEMPTS {
            let body = self
                .get(&format!(
                    "/api/v2/torrents/info?tag={}",
                    urlencoding::encode(&tag)
                ))
                .await?;

            let torrents: Vec<QBTorrentInfo> = serde_json::from_str(&body)
                .map_err(|e| TorrentClientError::ApiError(e.to_string()))?;

            if let Some(torrent) = torrents.into_iter().next() {
                let _ = self
                    .post_form(
                        "/api/v2/torrents/removeTags",
                        &[("hashes", torrent.hash.as_str()), ("tags", tag.as_str())],
                    )
                    .await;
                return Ok(AddTorrentResult {
                    hash: torrent.hash,
                    name: Some(torrent.name),
                });
            }

            tokio::time::sleep(ADD_POLL_INTERVAL).await;
        }

        Err(TorrentClientError::ApiError(
            "added torrent did not appear in client".to_string(),
        ))
    }

    async fn get_torrent(&self, hash: &str) -> Result<SeedingInfo, TorrentClientError> {
        let body = self
            .get(&format!(
                "/api/v2/torrents/info?hashes={}",
                urlencoding::encode(hash)
            ))
            .await?;

        let torrents: Vec<QBTorrentInfo> =
            serde_json::from_str(&body).map_err(|e| TorrentClientError::ApiError(e.to_string()))?;

        let torrent = torrents
            .into_iter()
            .find(|t| t.hash.eq_ignore_ascii_case(hash))
            .ok_or_else(|| TorrentClientError::TorrentNotFound(hash.to_string()))?;

        Ok(SeedingInfo {
            hash: torrent.hash,
            name: torrent.name,
            seeding_duration_secs: torrent.seeding_time.max(0) as u64,
        })
    }

    async fn delete_torrent(
        &self,
        hash: &str,
        delete_files: bool,
    ) -> Result<(), TorrentClientError> {
        // qBittorrent silently ignores unknown hashes, which is exactly the
        // idempotency the reclaim sweep needs.
        self.post_form(
            "/api/v2/torrents/delete",
            &[
                ("hashes", hash),
                ("deleteFiles", if delete_files { "true" } else { "false" }),
            ],
        )
        .await?;

        Ok(())
    }
}
