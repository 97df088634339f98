//! Incident feed sources.

use async_trait::async_trait;
use firesmoke_common::config::IngestConfig;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info, instrument};

use crate::error::{IngestionError, Result};
use crate::normalize::xml_to_json;

/// Source of the normalised incident feed document.
#[async_trait]
pub trait FeedSource: Send + Sync {
    /// Fetch the current feed, normalised to JSON.
    async fn fetch(&self) -> Result<Value>;
}

/// RSS feed fetched over HTTP.
pub struct RssFeedSource {
    client: Client,
    url: String,
}

impl RssFeedSource {
    pub fn new(config: &IngestConfig) -> Result<Self> {
        if config.rss_url.trim().is_empty() {
            return Err(IngestionError::InvalidConfig(
                "ingest.rss_url is not set".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            url: config.rss_url.clone(),
        })
    }
}

#[async_trait]
impl FeedSource for RssFeedSource {
    #[instrument(skip(self), fields(url = %self.url))]
    async fn fetch(&self) -> Result<Value> {
        debug!("Fetching incident feed");

        let response = self.client.get(&self.url).send().await?;
        if !response.status().is_success() {
            return Err(IngestionError::UpstreamStatus {
                status: response.status().as_u16(),
                url: self.url.clone(),
            });
        }

        let body = response.text().await?;
        let document = xml_to_json(&body)?;
        info!(bytes = body.len(), "Fetched incident feed");

        Ok(document)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requires_url() {
        let config = IngestConfig::default();
        assert!(matches!(
            RssFeedSource::new(&config),
            Err(IngestionError::InvalidConfig(_))
        ));
    }
}
