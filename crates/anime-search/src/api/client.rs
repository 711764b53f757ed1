//! Jikan API client with client-side rate limiting.

use super::rate_limiter::RateLimiter;
use super::transport::CatalogTransport;
use super::types::RequestDescriptor;
use crate::error::FetchError;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use shared::config::CatalogConfig;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Jikan API v4 client
pub struct JikanClient {
    /// HTTP client
    client: Client,
    /// Base URL for Jikan API, without trailing slash
    base_url: String,
    /// Rate limiter shared by all requests of this client
    rate_limiter: Mutex<RateLimiter>,
}

impl JikanClient {
    /// Create a new Jikan client
    pub fn new(
        base_url: impl Into<String>,
        requests_per_second: f64,
        requests_per_minute: u32,
        timeout: Duration,
        user_agent: &str,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            rate_limiter: Mutex::new(RateLimiter::new(requests_per_second, requests_per_minute)),
        })
    }

    /// Create a client from the `[catalog]` config section
    pub fn from_config(config: &CatalogConfig) -> Result<Self> {
        Self::new(
            config.base_url.clone(),
            config.rate_limit.requests_per_second,
            config.rate_limit.requests_per_minute,
            Duration::from_secs(config.timeout_seconds),
            &config.user_agent,
        )
    }

    /// Absolute URL for an endpoint, without query string
    pub fn url_for(&self, request: &RequestDescriptor) -> String {
        format!("{}/{}", self.base_url, request.endpoint.path())
    }

    /// Number of requests sent in the last minute
    pub async fn requests_last_minute(&self) -> usize {
        self.rate_limiter.lock().await.current_minute_count()
    }
}

#[async_trait]
impl CatalogTransport for JikanClient {
    async fn perform(&self, request: &RequestDescriptor) -> Result<Value, FetchError> {
        let url = self.url_for(request);

        // Held across the wait so queued requests go out in order
        self.rate_limiter.lock().await.acquire().await;

        debug!(url = %url, params = ?request.params, "Making API request");

        let response = self
            .client
            .get(&url)
            .query(&request.params)
            .send()
            .await
            .map_err(|e| {
                warn!(url = %url, error = %e, "Request error");
                FetchError::Transport(e.to_string())
            })?;

        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            warn!(url = %url, "Rate limited by server");
            return Err(FetchError::RateLimited);
        }

        if !status.is_success() {
            warn!(url = %url, status = %status, "Request failed");
            return Err(FetchError::from_status(status.as_u16()));
        }

        match response.json::<Value>().await {
            Ok(body) => {
                debug!(url = %url, "Request successful");
                Ok(body)
            }
            Err(e) => {
                warn!(url = %url, error = %e, "Failed to parse response");
                Err(FetchError::Decode(e.to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::types::Endpoint;

    #[tokio::test]
    async fn test_client_creation() {
        let client = JikanClient::new(
            "https://api.jikan.moe/v4/",
            3.0,
            60,
            Duration::from_secs(30),
            "anime-search-test",
        );
        assert!(client.is_ok());
    }

    #[tokio::test]
    async fn test_url_for_endpoints() {
        let client = JikanClient::from_config(&CatalogConfig::default()).unwrap();
        assert_eq!(
            client.url_for(&RequestDescriptor::new(Endpoint::TopList)),
            "https://api.jikan.moe/v4/top/anime"
        );
        assert_eq!(
            client.url_for(&RequestDescriptor::new(Endpoint::DetailById(5))),
            "https://api.jikan.moe/v4/anime/5/full"
        );
        assert_eq!(client.requests_last_minute().await, 0);
    }

    #[tokio::test]
    async fn test_unreachable_host_is_transport_error() {
        // Port 9 on localhost is the discard port; nothing listens there in CI
        let client = JikanClient::new(
            "http://127.0.0.1:9",
            100.0,
            100,
            Duration::from_secs(2),
            "anime-search-test",
        )
        .unwrap();

        let result = client
            .perform(&RequestDescriptor::new(Endpoint::Recommendations))
            .await;
        assert!(matches!(result, Err(FetchError::Transport(_))));
    }
}
