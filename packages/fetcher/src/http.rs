//! HTTP access to the map-data service.
//!
//! [`HttpFetcher`] is the seam between the pipeline and the network: the
//! pipeline only ever asks for the text behind a URL. [`ReqwestFetcher`] is
//! the production implementation.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use crate::config::{element_url, FetcherConfig};
use crate::error::{FetcherError, Result};
use crate::types::ElementType;

/// User agent string identifying this fetcher.
const USER_AGENT: &str = concat!("osm-fetcher/", env!("CARGO_PKG_VERSION"));

/// Base delay for exponential backoff (milliseconds).
const RETRY_BASE_DELAY_MS: u64 = 500;

/// Fetches the body of a URL as text, enabling mocking in tests.
#[async_trait]
pub trait HttpFetcher: Send + Sync {
    async fn fetch_text(&self, url: &str) -> Result<String>;
}

/// Create a configured HTTP client.
pub fn create_client(timeout: Duration) -> Result<Client> {
    let client = Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()?;
    Ok(client)
}

/// `reqwest`-backed fetcher with optional retries.
#[derive(Debug, Clone)]
pub struct ReqwestFetcher {
    client: Client,
    retries: u32,
}

impl ReqwestFetcher {
    pub fn new(config: &FetcherConfig) -> Result<Self> {
        Ok(Self {
            client: create_client(config.timeout)?,
            retries: config.retries,
        })
    }
}

#[async_trait]
impl HttpFetcher for ReqwestFetcher {
    /// Download a URL as text.
    ///
    /// With retries enabled, connection errors, timeouts and 5xx responses
    /// are retried with exponential backoff. 4xx responses never are.
    async fn fetch_text(&self, url: &str) -> Result<String> {
        let max_attempts = self.retries.saturating_add(1);
        let mut last_error: Option<String> = None;

        for attempt in 0..max_attempts {
            if attempt > 0 {
                // 500ms, 1000ms, 2000ms, ...
                let delay = RETRY_BASE_DELAY_MS * (1 << (attempt - 1).min(6));
                tracing::debug!(attempt, delay_ms = delay, url, "Retrying after delay");
                tokio::time::sleep(Duration::from_millis(delay)).await;
            }

            match self.client.get(url).send().await {
                Ok(response) => {
                    let status = response.status();

                    if status.is_server_error() && self.retries > 0 {
                        tracing::warn!(
                            status = %status,
                            attempt = attempt + 1,
                            max_attempts,
                            url,
                            "Server error, will retry"
                        );
                        last_error = Some(format!("Server error: {status}"));
                        continue;
                    }

                    if !status.is_success() {
                        return Err(FetcherError::HttpStatus {
                            status: status.as_u16(),
                            url: url.to_string(),
                        });
                    }

                    return Ok(response.text().await?);
                }
                Err(e) => {
                    if (e.is_connect() || e.is_timeout()) && self.retries > 0 {
                        tracing::warn!(
                            error = %e,
                            attempt = attempt + 1,
                            max_attempts,
                            url,
                            "Connection error, will retry"
                        );
                        last_error = Some(e.to_string());
                        continue;
                    }
                    return Err(FetcherError::Http(e));
                }
            }
        }

        Err(FetcherError::RetriesExhausted {
            attempts: max_attempts,
            message: last_error.unwrap_or_else(|| "Unknown error".to_string()),
        })
    }
}

/// The single point of contact with the map-data service.
///
/// Cheap to clone; every node fetch task gets its own copy.
#[derive(Clone)]
pub struct FetchGateway {
    fetcher: Arc<dyn HttpFetcher>,
    base_url: Arc<str>,
}

impl FetchGateway {
    pub fn new(fetcher: Arc<dyn HttpFetcher>, base_url: &str) -> Self {
        Self {
            fetcher,
            base_url: Arc::from(base_url),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetch the raw XML for one element.
    pub async fn fetch(&self, element_type: ElementType, id: i64) -> Result<String> {
        let url = element_url(&self.base_url, element_type, id);
        tracing::debug!(%element_type, id, url = %url, "Fetching element");
        self.fetcher.fetch_text(&url).await
    }
}

impl std::fmt::Debug for FetchGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FetchGateway")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}
