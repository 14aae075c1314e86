// src/utils/http.rs

//! HTTP client utilities.

use std::time::Duration;

use crate::error::Result;
use crate::models::CrawlerConfig;

/// Create a configured asynchronous HTTP client.
pub fn create_async_client(config: &CrawlerConfig) -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .user_agent(&config.user_agent)
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()?;
    Ok(client)
}

/// Fetch a page body, treating non-2xx statuses as errors.
///
/// Returns the body together with the final URL after redirects.
pub async fn fetch_text(client: &reqwest::Client, url: &str) -> Result<(url::Url, String)> {
    let response = client.get(url).send().await?.error_for_status()?;
    let final_url = response.url().clone();
    let text = response.text().await?;
    Ok((final_url, text))
}
