// src/utils/http.rs

//! HTTP client utilities.

use crate::error::Result;
use crate::models::FetcherConfig;

/// Create a configured asynchronous HTTP client.
pub fn create_client(config: &FetcherConfig) -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .user_agent(&config.user_agent)
        .timeout(config.timeout())
        .build()?;
    Ok(client)
}

/// Fetch a page body, treating non-success statuses as errors.
pub async fn fetch_text(client: &reqwest::Client, url: &str) -> Result<String> {
    let text = client
        .get(url)
        .send()
        .await?
        .error_for_status()?
        .text()
        .await?;
    Ok(text)
}
