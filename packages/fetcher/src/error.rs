//! Error types for the fetcher.
//!
//! A single `FetcherError` covers every failure of the fetch, parse and
//! resolve pipeline. Attribute coercion failures are not errors; they
//! surface as `None` fields on the decoded records.

use thiserror::Error;

use crate::types::ElementType;

/// Main error type for the fetcher library.
#[derive(Debug, Error)]
pub enum FetcherError {
    /// HTTP request failed at the transport level.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The map-data service answered with a non-success status.
    #[error("HTTP {status} for {url}")]
    HttpStatus { status: u16, url: String },

    /// All retry attempts failed.
    #[error("Request failed after {attempts} attempts: {message}")]
    RetriesExhausted { attempts: u32, message: String },

    /// XML parsing failed.
    #[error("XML parsing failed: {0}")]
    XmlParse(#[from] roxmltree::Error),

    /// An element could not be decoded (e.g. its id is missing).
    #[error("Invalid <{kind}> element: {reason}")]
    InvalidElement { kind: ElementType, reason: String },

    /// The response did not contain the requested element.
    #[error("No {kind} with id {id} in response")]
    ElementNotFound { kind: ElementType, id: i64 },

    /// Node resolution did not finish before the deadline.
    #[error("Node resolution timed out after {elapsed_ms} ms")]
    Timeout { elapsed_ms: u128 },

    /// A node fetch task panicked or was cancelled.
    #[error("Fetch task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    /// Invalid configuration value.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The configured base URL is not a valid URL.
    #[error("Invalid base URL: {0}")]
    InvalidBaseUrl(#[from] url::ParseError),

    /// JSON serialization error.
    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for fetcher operations.
pub type Result<T> = std::result::Result<T, FetcherError>;
