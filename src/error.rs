//! Error types for community-leaderboard
//!
//! This module provides the error handling used throughout the library:
//! - Transport and HTTP status failures raised by the resilient fetcher
//! - The terminal "retries exhausted" error that aborts a collection run
//! - Local per-item errors (malformed post links) isolated by the link fetcher

use thiserror::Error;

/// Result type alias for community-leaderboard operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for community-leaderboard
///
/// Each variant carries enough context (URL, setting name, status code) to
/// diagnose a failed run from the log line alone.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "page_size")
        key: Option<String>,
    },

    /// Transport-level failure (timeout, refused connection, broken body)
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Upstream answered with a non-2xx status
    #[error("HTTP {status} from {url}")]
    HttpStatus {
        /// The HTTP status code returned by the upstream API
        status: u16,
        /// The URL that was requested
        url: String,
    },

    /// Every attempt of a GET failed; the run cannot be trusted as complete
    #[error("API did not respond after {attempts} attempts: {url} (last error: {last_error})")]
    RetriesExhausted {
        /// The URL that kept failing
        url: String,
        /// Number of attempts made
        attempts: u32,
        /// Display of the final attempt's error
        last_error: String,
    },

    /// Post link without a `status/<id>` path segment
    #[error("cannot extract post id from URL: {0}")]
    InvalidPostUrl(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Shorthand for a configuration error tied to a specific key
    pub fn config(key: &str, message: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
            key: Some(key.to_string()),
        }
    }
}
