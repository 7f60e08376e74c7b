use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;

use crate::config::NumbersConfig;

use super::error::NumbersError;

/// HTTP client for number facts. Cheap to clone.
#[derive(Clone)]
pub struct NumbersClient {
    client: Client,
    base_url: Arc<str>,
}

impl NumbersClient {
    pub fn new(config: &NumbersConfig) -> Result<Self, NumbersError> {
        let base_url = config.base_url.trim_end_matches('/');
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(NumbersError::InvalidUrl {
                url: config.base_url.clone(),
                reason: "expected an http:// or https:// URL".to_string(),
            });
        }

        let client = Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_seconds.into()))
            .timeout(Duration::from_secs(config.timeout_seconds.into()))
            .build()
            .map_err(NumbersError::ClientBuild)?;

        Ok(Self {
            client,
            base_url: Arc::from(base_url),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Endpoint URL for `number`.
    pub fn endpoint(&self, number: i64) -> String {
        format!("{}/{}", self.base_url, number)
    }

    /// Fetch the fact for `number` as text.
    pub async fn fetch(&self, number: i64) -> Result<String, NumbersError> {
        let url = self.endpoint(number);
        tracing::debug!(%url, "fetching number fact");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|source| NumbersError::Transport {
                url: url.clone(),
                source,
            })?;

        let body = response
            .bytes()
            .await
            .map_err(|source| NumbersError::Transport {
                url: url.clone(),
                source,
            })?;

        String::from_utf8(body.to_vec()).map_err(|source| NumbersError::Decode { url, source })
    }
}

impl std::fmt::Debug for NumbersClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NumbersClient")
            .field("base_url", &self.base_url)
            .finish()
    }
}
