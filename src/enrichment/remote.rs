//! HTTP client for the external song metadata service.

use super::models::{SongDetail, SongDetailPayload};
use super::{EnrichmentError, EnrichmentSource};
use anyhow::Result;
use async_trait::async_trait;
use reqwest::StatusCode;
use std::time::Duration;
use tracing::{debug, warn};

pub struct RemoteEnrichment {
    client: reqwest::Client,
    base_url: String,
}

impl RemoteEnrichment {
    /// Create a new metadata client.
    ///
    /// # Arguments
    /// * `base_url` - Base URL of the metadata service (e.g., "http://localhost:8081")
    /// * `timeout_sec` - Request timeout in seconds
    pub fn new(base_url: &str, timeout_sec: u64) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_sec))
            .build()?;

        let base_url = base_url.trim_end_matches('/').to_string();

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn info_url(&self, group: &str, title: &str) -> String {
        format!(
            "{}/info?group={}&song={}",
            self.base_url,
            urlencoding::encode(group),
            urlencoding::encode(title)
        )
    }
}

#[async_trait]
impl EnrichmentSource for RemoteEnrichment {
    fn name(&self) -> &'static str {
        "remote"
    }

    async fn fetch(&self, group: &str, title: &str) -> Result<SongDetail, EnrichmentError> {
        let url = self.info_url(group, title);
        debug!("Fetching song details from {}", url);

        let response = self.client.get(&url).send().await.map_err(|e| {
            EnrichmentError::FetchFailed(format!("request to metadata service failed: {}", e))
        })?;

        if response.status() != StatusCode::OK {
            warn!("Metadata service returned status {}", response.status());
            return Err(EnrichmentError::FetchFailed(format!(
                "metadata service returned status {}",
                response.status()
            )));
        }

        let payload: SongDetailPayload = response.json().await.map_err(|e| {
            EnrichmentError::FetchFailed(format!("failed to decode metadata response: {}", e))
        })?;

        payload.into_detail().ok_or_else(|| {
            EnrichmentError::FetchFailed("metadata service returned an empty list".to_string())
        })
    }
}
