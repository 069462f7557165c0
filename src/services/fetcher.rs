// src/services/fetcher.rs

//! Page retrieval with bounded retries.

use async_trait::async_trait;
use reqwest::Client;

use crate::error::{AppError, Result};
use crate::models::FetcherConfig;
use crate::utils::http::{create_client, fetch_text};

/// Source of page bodies by absolute URL.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Retrieve the body of `url`.
    async fn fetch(&self, url: &str) -> Result<String>;
}

/// HTTP fetcher that retries failed requests with exponential backoff.
pub struct HttpFetcher {
    client: Client,
    config: FetcherConfig,
}

impl HttpFetcher {
    /// Create a fetcher with its own client.
    pub fn new(config: FetcherConfig) -> Result<Self> {
        let client = create_client(&config)?;
        Ok(Self { client, config })
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String> {
        let attempts = self.config.retry_count + 1;
        let mut last_error = None;

        for attempt in 0..attempts {
            if attempt > 0 {
                let delay = self.config.retry_delay(attempt - 1);
                log::debug!(
                    "Retrying {} in {}ms (attempt {}/{})",
                    url,
                    delay.as_millis(),
                    attempt + 1,
                    attempts
                );
                tokio::time::sleep(delay).await;
            }

            match fetch_text(&self.client, url).await {
                Ok(body) => return Ok(body),
                Err(error) => {
                    log::debug!("Request to {} failed: {}", url, error);
                    last_error = Some(error);
                }
            }
        }

        let message = last_error
            .map(|error| error.to_string())
            .unwrap_or_else(|| "no attempts made".to_string());
        Err(AppError::fetch(url, attempts, message))
    }
}
