//! Configuration constants and settings for the fetcher.

use std::time::Duration;

use url::Url;

use crate::error::{FetcherError, Result};
use crate::types::ElementType;

/// Base URL of the OpenStreetMap API v0.6.
pub const OSM_API_BASE_URL: &str = "https://www.openstreetmap.org/api/0.6";

/// HTTP timeout in seconds for a single request.
pub const HTTP_TIMEOUT_SECS: u64 = 30;

/// Upper bound for retries after the first attempt.
pub const MAX_RETRIES: u32 = 10;

/// Way fetched by the CLI when no id is given.
pub const DEFAULT_WAY_ID: i64 = 34211254;

/// How node fetch failures affect a resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResolveMode {
    /// The first failed node fetch aborts the whole resolution.
    #[default]
    FailFast,

    /// Failed node fetches are logged and left out of the result.
    BestEffort,
}

/// Settings for node resolution.
#[derive(Debug, Clone, Default)]
pub struct ResolveOptions {
    pub mode: ResolveMode,

    /// Maximum number of node fetches in flight; `None` means unbounded.
    pub max_concurrency: Option<usize>,

    /// Deadline for the whole node fan-out.
    pub deadline: Option<Duration>,
}

/// Fetcher settings.
#[derive(Debug, Clone)]
pub struct FetcherConfig {
    pub base_url: String,
    pub timeout: Duration,

    /// Retries after the first attempt. Zero disables retrying.
    pub retries: u32,
    pub resolve: ResolveOptions,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self::new(OSM_API_BASE_URL)
    }
}

impl FetcherConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: Duration::from_secs(HTTP_TIMEOUT_SECS),
            retries: 0,
            resolve: ResolveOptions::default(),
        }
    }

    /// Load settings from the environment, falling back to defaults.
    ///
    /// Reads `OSM_API_BASE_URL`, `OSM_HTTP_TIMEOUT_SECS`, `OSM_FETCH_RETRIES`,
    /// `OSM_MAX_CONCURRENCY` and `OSM_RESOLVE_DEADLINE_SECS`. Values are only
    /// checked for being numbers; call [`Self::validate`] once any overrides
    /// have been applied.
    pub fn from_env() -> Result<Self> {
        let base_url =
            std::env::var("OSM_API_BASE_URL").unwrap_or_else(|_| OSM_API_BASE_URL.into());

        let timeout_secs: u64 =
            env_number("OSM_HTTP_TIMEOUT_SECS")?.unwrap_or(HTTP_TIMEOUT_SECS);
        let retries: u32 = env_number("OSM_FETCH_RETRIES")?.unwrap_or(0);
        let max_concurrency: Option<usize> = env_number("OSM_MAX_CONCURRENCY")?;
        let deadline_secs: Option<u64> = env_number("OSM_RESOLVE_DEADLINE_SECS")?;

        Ok(Self::new(base_url)
            .with_timeout(Duration::from_secs(timeout_secs))
            .with_retries(retries)
            .with_resolve(ResolveOptions {
                mode: ResolveMode::FailFast,
                max_concurrency,
                deadline: deadline_secs.map(Duration::from_secs),
            }))
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    pub fn with_resolve(mut self, resolve: ResolveOptions) -> Self {
        self.resolve = resolve;
        self
    }

    /// Check that the base URL is an absolute http(s) URL and that numeric
    /// limits are usable.
    pub fn validate(&self) -> Result<()> {
        let url = Url::parse(&self.base_url)?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(FetcherError::Config(format!(
                "base URL must use http or https, got '{}'",
                url.scheme()
            )));
        }
        if self.resolve.max_concurrency == Some(0) {
            return Err(FetcherError::Config("max concurrency must be at least 1".into()));
        }
        if self.retries > MAX_RETRIES {
            return Err(FetcherError::Config(format!(
                "retries must be at most {MAX_RETRIES}, got {}",
                self.retries
            )));
        }
        if self.timeout.is_zero() {
            return Err(FetcherError::Config("HTTP timeout must be positive".into()));
        }
        Ok(())
    }
}

fn env_number<T: std::str::FromStr>(name: &str) -> Result<Option<T>> {
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| FetcherError::Config(format!("{name} must be a number, got '{raw}'"))),
        Err(_) => Ok(None),
    }
}

/// Build the API URL for one element.
///
/// # Examples
/// ```
/// use osm_fetcher::config::element_url;
/// use osm_fetcher::types::ElementType;
///
/// assert_eq!(
///     element_url("https://www.openstreetmap.org/api/0.6", ElementType::Way, 34211254),
///     "https://www.openstreetmap.org/api/0.6/way/34211254"
/// );
/// ```
pub fn element_url(base_url: &str, element_type: ElementType, id: i64) -> String {
    format!("{}/{element_type}/{id}", base_url.trim_end_matches('/'))
}
