//! Retry logic with backoff
//!
//! One policy type drives every wait in the crate: the exponential backoff of
//! the resilient fetcher, and the linear and fixed waits of empty-page
//! recovery in the collector.
//!
//! # Example
//!
//! ```no_run
//! use community_leaderboard::config::RetryConfig;
//! use community_leaderboard::retry::with_retry;
//!
//! # async fn example() -> community_leaderboard::Result<()> {
//! let policy = RetryConfig::default().policy();
//! let body = with_retry(&policy, "https://api.example.com/ping", || async {
//!     // Your request here
//!     Ok(serde_json::json!({ "ok": true }))
//! })
//! .await?;
//! # Ok(())
//! # }
//! ```

use crate::error::{Error, Result};
use rand::Rng;
use std::future::Future;
use std::time::Duration;

/// Trait for errors that can be classified as retryable or not
///
/// Transient failures (timeouts, refused connections, 5xx/4xx answers from a
/// flaky gateway, a body that is not JSON) should return `true`. Local
/// failures (bad config, malformed link) should return `false`.
pub trait IsRetryable {
    /// Returns true if the error is transient and the operation should be retried
    fn is_retryable(&self) -> bool;
}

impl IsRetryable for Error {
    fn is_retryable(&self) -> bool {
        match self {
            // Any failure of a GET is worth another try, garbled bodies included
            Error::Network(e) => !e.is_builder(),
            // Every non-2xx is retried, auth failures included
            Error::HttpStatus { .. } => true,
            Error::Io(e) => matches!(
                e.kind(),
                std::io::ErrorKind::TimedOut
                    | std::io::ErrorKind::ConnectionRefused
                    | std::io::ErrorKind::ConnectionReset
                    | std::io::ErrorKind::ConnectionAborted
                    | std::io::ErrorKind::Interrupted
            ),
            Error::RetriesExhausted { .. } => false,
            Error::Config { .. } => false,
            Error::InvalidPostUrl(_) => false,
            Error::Serialization(_) => false,
            Error::Other(_) => false,
        }
    }
}

/// Shape of the wait before retry attempt `n + 1`, after attempt `n` failed
#[derive(Clone, Debug, PartialEq)]
pub enum Backoff {
    /// `min(max_delay, base^n + jitter)` seconds, jitter uniform in `[0, 1)`
    Exponential {
        /// Exponential base in seconds
        base: f64,
        /// Cap applied after jitter
        max_delay: Duration,
        /// Whether to add jitter
        jitter: bool,
    },
    /// `n * step`
    Linear {
        /// Delay growth per attempt
        step: Duration,
    },
    /// Same wait every time
    Fixed(Duration),
}

/// Attempt budget plus backoff shape
#[derive(Clone, Debug, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts allowed
    pub max_attempts: u32,
    /// How long to wait around each attempt
    pub backoff: Backoff,
}

impl RetryPolicy {
    /// Wait associated with 1-based attempt number `attempt`
    pub fn delay(&self, attempt: u32) -> Duration {
        match &self.backoff {
            Backoff::Exponential {
                base,
                max_delay,
                jitter,
            } => {
                let exp = base.powi(attempt.min(i32::MAX as u32) as i32);
                let jitter = if *jitter { random_jitter() } else { 0.0 };
                let secs = (exp + jitter).min(max_delay.as_secs_f64());
                Duration::from_secs_f64(secs.max(0.0))
            }
            Backoff::Linear { step } => step.saturating_mul(attempt),
            Backoff::Fixed(delay) => *delay,
        }
    }

    /// Iterate `(attempt, delay)` pairs across the whole budget
    #[cfg(test)]
    fn schedule(&self) -> impl Iterator<Item = (u32, Duration)> + '_ {
        (1..=self.max_attempts).map(move |attempt| (attempt, self.delay(attempt)))
    }
}

/// Execute a request with retry, converting exhaustion into [`Error::RetriesExhausted`]
///
/// Retryable failures sleep for `policy.delay(attempt)` and try again; there is
/// no sleep after the final attempt. Non-retryable failures are returned
/// immediately, unchanged.
///
/// # Arguments
///
/// * `policy` - Attempt budget and backoff shape
/// * `url` - The URL being fetched, used for logging and the terminal error
/// * `operation` - Async closure performing one attempt
pub async fn with_retry<F, Fut, T>(policy: &RetryPolicy, url: &str, mut operation: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt = 0;

    loop {
        attempt += 1;

        match operation().await {
            Ok(result) => {
                if attempt > 1 {
                    tracing::info!(url, attempts = attempt, "Request succeeded after retry");
                }
                return Ok(result);
            }
            Err(e) if !e.is_retryable() => {
                tracing::error!(url, error = %e, "Request failed with non-retryable error");
                return Err(e);
            }
            Err(e) if attempt >= policy.max_attempts => {
                tracing::error!(
                    url,
                    error = %e,
                    attempts = attempt,
                    "Request failed after all retry attempts exhausted"
                );
                return Err(Error::RetriesExhausted {
                    url: url.to_string(),
                    attempts: attempt,
                    last_error: e.to_string(),
                });
            }
            Err(e) => {
                let delay = policy.delay(attempt);
                tracing::warn!(
                    url,
                    error = %e,
                    attempt,
                    max_attempts = policy.max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    "Request failed, retrying"
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
}

/// Uniform jitter in `[0, 1)` seconds
fn random_jitter() -> f64 {
    rand::thread_rng().gen_range(0.0..1.0)
}
