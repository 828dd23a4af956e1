//! SABnzbd usenet client implementation.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::config::SabnzbdConfig;

use super::{UsenetClient, UsenetClientError};

/// SABnzbd client implementation.
pub struct SabnzbdClient {
    client: Client,
    config: SabnzbdConfig,
}

impl SabnzbdClient {
    /// Create a new SABnzbd client.
    pub fn new(config: SabnzbdConfig) -> Result<Self, UsenetClientError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs as u64))
            .build()
            .map_err(|e| UsenetClientError::ConnectionFailed(e.to_string()))?;

        Ok(Self { client, config })
    }

    fn base_url(&self) -> &str {
        self.config.url.trim_end_matches('/')
    }

    fn map_send_error(e: reqwest::Error) -> UsenetClientError {
        if e.is_timeout() {
            UsenetClientError::Timeout
        } else if e.is_connect() {
            UsenetClientError::ConnectionFailed(e.to_string())
        } else {
            UsenetClientError::ApiError(e.to_string())
        }
    }
}

/// SABnzbd addurl response.
#[derive(Debug, Deserialize)]
struct SabAddResponse {
    status: bool,
    #[serde(default)]
    nzo_ids: Vec<String>,
    #[serde(default)]
    error: Option<String>,
}

#[async_trait]
impl UsenetClient for SabnzbdClient {
    fn name(&self) -> &str {
        "sabnzbd"
    }

    async fn add_job(&self, url: &str) -> Result<String, UsenetClientError> {
        let endpoint = format!(
            "{}/api?mode=addurl&name={}&apikey={}&output=json&cat={}",
            self.base_url(),
            urlencoding::encode(url),
            urlencoding::encode(&self.config.api_key),
            urlencoding::encode(&self.config.category),
        );

        let response = self
            .client
            .get(&endpoint)
            .send()
            .await
            .map_err(Self::map_send_error)?;

        let status = response.status();
        if status.as_u16() == 403 {
            return Err(UsenetClientError::AuthenticationFailed(
                "Invalid API key".to_string(),
            ));
        }
        if !status.is_success() {
            return Err(UsenetClientError::ApiError(format!("HTTP {}", status)));
        }

        let body: SabAddResponse = response
            .json()
            .await
            .map_err(|e| UsenetClientError::ApiError(e.to_string()))?;

        if !body.status {
            return Err(UsenetClientError::ApiError(
                body.error.unwrap_or_else(|| "addurl rejected".to_string()),
            ));
        }

        let job_id = body.nzo_ids.into_iter().next().ok_or_else(|| {
            UsenetClientError::ApiError("addurl returned no job id".to_string())
        })?;

        debug!(job_id = %job_id, "SABnzbd accepted NZB");
        Ok(job_id)
    }
}
