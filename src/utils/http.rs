// src/utils/http.rs

//! HTTP client utilities and the page fetcher.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::{AppError, Result};
use crate::models::FetchConfig;
use crate::utils::encoding::decode_body;

/// Retrieves the raw body of the watched page.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetch `url`, making at most `max_retries` attempts of `timeout` each.
    async fn fetch(&self, url: &str, timeout: Duration, max_retries: u32) -> Result<String>;
}

/// Create a configured asynchronous HTTP client.
pub fn create_async_client(config: &FetchConfig) -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .user_agent(&config.user_agent)
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()?;
    Ok(client)
}

/// Fetcher backed by `reqwest` with a fixed delay between attempts.
#[derive(Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    retry_delay: Duration,
}

impl HttpFetcher {
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            client,
            retry_delay: Duration::ZERO,
        }
    }

    /// Build a fetcher from fetch settings.
    pub fn from_config(config: &FetchConfig) -> Result<Self> {
        Ok(Self::new(create_async_client(config)?)
            .with_retry_delay(Duration::from_millis(config.retry_delay_ms)))
    }

    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    async fn fetch_once(&self, url: &str, timeout: Duration) -> Result<String> {
        let response = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .await?
            .error_for_status()?;
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);
        let bytes = response.bytes().await?;
        Ok(decode_body(&bytes, content_type.as_deref()))
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str, timeout: Duration, max_retries: u32) -> Result<String> {
        let attempts = max_retries.max(1);
        let mut last_error = String::new();

        for attempt in 1..=attempts {
            log::info!("Fetching {} (attempt {}/{})", url, attempt, attempts);
            match self.fetch_once(url, timeout).await {
                Ok(body) => {
                    log::info!("Fetched {} characters", body.chars().count());
                    return Ok(body);
                }
                Err(AppError::Http(e)) if e.is_timeout() => {
                    log::warn!("Timed out (attempt {}/{})", attempt, attempts);
                    last_error = format!("timed out after {}s", timeout.as_secs());
                }
                Err(e) => {
                    log::warn!("Fetch error (attempt {}/{}): {}", attempt, attempts, e);
                    last_error = e.to_string();
                }
            }

            if attempt < attempts && !self.retry_delay.is_zero() {
                tokio::time::sleep(self.retry_delay).await;
            }
        }

        log::error!("Giving up on {} after {} attempt(s)", url, attempts);
        Err(AppError::fetch(url, attempts, last_error))
    }
}
