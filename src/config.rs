//! Configuration types for community-leaderboard

use crate::error::{Error, Result};
use crate::retry::{Backoff, RetryPolicy};
use serde::{Deserialize, Serialize};
use std::{path::Path, path::PathBuf, time::Duration};

/// Environment variable holding the upstream bearer credential
pub const API_KEY_ENV: &str = "SOCIALDATA_API_KEY";

/// Upstream API settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ApiConfig {
    /// API root, without a trailing slash (default: "https://api.socialdata.tools")
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Community whose posts are collected
    #[serde(default = "default_community_id")]
    pub community_id: String,

    /// Bearer credential. Never written back out; filled from the environment.
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,

    /// Posts requested per community page (default: 100)
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// Community feed ordering passed as the `type` query parameter (default: "Latest")
    #[serde(default = "default_feed_type")]
    pub feed_type: String,

    /// Per-request network timeout (default: 30 seconds)
    #[serde(default = "default_request_timeout", with = "duration_serde")]
    pub request_timeout: Duration,

    /// Courtesy pause between consecutive community pages (default: 600 ms)
    #[serde(default = "default_page_delay", with = "duration_millis_serde")]
    pub page_delay: Duration,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            community_id: default_community_id(),
            api_key: None,
            page_size: default_page_size(),
            feed_type: default_feed_type(),
            request_timeout: default_request_timeout(),
            page_delay: default_page_delay(),
        }
    }
}

/// Retry configuration for upstream GET requests
///
/// The delay after failed attempt `n` (1-based) is
/// `min(max_delay, base^n + jitter)` seconds, with jitter uniform in `[0, 1)`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Total attempts per request, including the first one (default: 8)
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Exponential base in seconds (default: 2.0)
    #[serde(default = "default_backoff_base")]
    pub base: f64,

    /// Upper bound for a single backoff delay (default: 12 seconds)
    #[serde(default = "default_max_delay", with = "duration_serde")]
    pub max_delay: Duration,

    /// Add up to one second of random jitter (default: true)
    #[serde(default = "default_true")]
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base: default_backoff_base(),
            max_delay: default_max_delay(),
            jitter: true,
        }
    }
}

impl RetryConfig {
    /// Retry policy used by the resilient fetcher
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            backoff: Backoff::Exponential {
                base: self.base,
                max_delay: self.max_delay,
                jitter: self.jitter,
            },
        }
    }
}

/// Empty-page recovery configuration
///
/// An empty community page is ambiguous: it may be a real end of stream or a
/// transient upstream stall. Recovery re-requests the same cursor
/// `fast_attempts` times with linearly growing delays, then once more after
/// `cooldown`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RecoveryConfig {
    /// Rapid re-requests before the cooldown (default: 12)
    #[serde(default = "default_fast_attempts")]
    pub fast_attempts: u32,

    /// Delay step for rapid re-requests; attempt `n` waits `n * fast_step` (default: 1 second)
    #[serde(default = "default_fast_step", with = "duration_serde")]
    pub fast_step: Duration,

    /// Wait before the single final re-request (default: 180 seconds)
    #[serde(default = "default_cooldown", with = "duration_serde")]
    pub cooldown: Duration,
}

impl Default for RecoveryConfig {
    fn default() -> Self {
        Self {
            fast_attempts: default_fast_attempts(),
            fast_step: default_fast_step(),
            cooldown: default_cooldown(),
        }
    }
}

impl RecoveryConfig {
    /// Policy for the rapid re-request phase
    pub fn fast_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.fast_attempts,
            backoff: Backoff::Linear {
                step: self.fast_step,
            },
        }
    }

    /// Policy for the single re-request after the cooldown
    pub fn cooldown_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: 1,
            backoff: Backoff::Fixed(self.cooldown),
        }
    }
}

/// Where the run's two JSON documents are written
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Merged, normalized posts (default: "all_tweets.json")
    #[serde(default = "default_posts_path")]
    pub posts_path: PathBuf,

    /// Leaderboard as `[handle, stats]` pairs (default: "leaderboard.json")
    #[serde(default = "default_leaderboard_path")]
    pub leaderboard_path: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            posts_path: default_posts_path(),
            leaderboard_path: default_leaderboard_path(),
        }
    }
}

/// Main configuration for a collection run
///
/// Every field has a default, so an empty JSON object is a valid config file.
/// Sub-configs:
/// - [`api`](ApiConfig) — upstream endpoint, credential, paging
/// - [`retry`](RetryConfig) — per-request backoff
/// - [`recovery`](RecoveryConfig) — empty-page recovery budget
/// - [`output`](OutputConfig) — persisted file locations
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    /// Upstream API settings
    #[serde(default)]
    pub api: ApiConfig,

    /// Per-request retry settings
    #[serde(default)]
    pub retry: RetryConfig,

    /// Empty-page recovery settings
    #[serde(default)]
    pub recovery: RecoveryConfig,

    /// Output file locations
    #[serde(default)]
    pub output: OutputConfig,

    /// Individually fetched post links, in output order
    #[serde(default = "default_link_urls")]
    pub link_urls: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            retry: RetryConfig::default(),
            recovery: RecoveryConfig::default(),
            output: OutputConfig::default(),
            link_urls: default_link_urls(),
        }
    }
}

impl Config {
    /// Load a JSON config file; missing fields take their defaults
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::Config {
            message: format!("failed to read {}: {}", path.display(), e),
            key: None,
        })?;
        let config: Config = serde_json::from_str(&content).map_err(|e| Error::Config {
            message: format!("failed to parse {}: {}", path.display(), e),
            key: None,
        })?;
        Ok(config)
    }

    /// Fill the API key from [`API_KEY_ENV`] unless one is already set
    ///
    /// A missing key is not an error here; unauthenticated requests fail upstream.
    pub fn apply_env(&mut self) {
        if self.api.api_key.is_none()
            && let Ok(key) = std::env::var(API_KEY_ENV)
            && !key.is_empty()
        {
            self.api.api_key = Some(key);
        }
    }

    /// Reject settings that would make a run meaningless
    pub fn validate(&self) -> Result<()> {
        if self.api.page_size == 0 {
            return Err(Error::config("page_size", "must be greater than zero"));
        }
        if self.retry.max_attempts == 0 {
            return Err(Error::config("max_attempts", "must be greater than zero"));
        }
        if self.api.community_id.trim().is_empty() {
            return Err(Error::config("community_id", "must not be empty"));
        }
        url::Url::parse(&self.api.base_url).map_err(|e| {
            Error::config("base_url", format!("invalid URL {}: {}", self.api.base_url, e))
        })?;
        Ok(())
    }
}

fn default_base_url() -> String {
    "https://api.socialdata.tools".to_string()
}

fn default_community_id() -> String {
    "1965795131186954572".to_string()
}

fn default_page_size() -> u32 {
    100
}

fn default_feed_type() -> String {
    "Latest".to_string()
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_page_delay() -> Duration {
    Duration::from_millis(600)
}

fn default_max_attempts() -> u32 {
    8
}

fn default_backoff_base() -> f64 {
    2.0
}

fn default_max_delay() -> Duration {
    Duration::from_secs(12)
}

fn default_true() -> bool {
    true
}

fn default_fast_attempts() -> u32 {
    12
}

fn default_fast_step() -> Duration {
    Duration::from_secs(1)
}

fn default_cooldown() -> Duration {
    Duration::from_secs(180)
}

fn default_posts_path() -> PathBuf {
    PathBuf::from("all_tweets.json")
}

fn default_leaderboard_path() -> PathBuf {
    PathBuf::from("leaderboard.json")
}

fn default_link_urls() -> Vec<String> {
    [
        "1990541572342231158",
        "1990711670499385494",
        "1991123841674846261",
        "1991600494406684714",
        "1992326454005428606",
        "1993051269750239722",
        "1993792499434037318",
        "1995083592066793944",
        "1996480946216874462",
        "1997238765493145988",
    ]
    .iter()
    .map(|id| format!("https://twitter.com/jacks12300711/status/{id}"))
    .collect()
}

mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

mod duration_millis_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn empty_object_yields_production_defaults() {
        let config: Config = serde_json::from_str("{}").expect("deserialize failed");

        assert_eq!(config.api.base_url, "https://api.socialdata.tools");
        assert_eq!(config.api.page_size, 100);
        assert_eq!(config.api.page_delay, Duration::from_millis(600));
        assert_eq!(config.retry.max_attempts, 8);
        assert_eq!(config.retry.max_delay, Duration::from_secs(12));
        assert_eq!(config.recovery.fast_attempts, 12);
        assert_eq!(config.recovery.cooldown, Duration::from_secs(180));
        assert_eq!(config.link_urls.len(), 10);
        assert_eq!(config.output.posts_path, PathBuf::from("all_tweets.json"));
    }

    #[test]
    fn api_key_is_never_serialized() {
        let mut config = Config::default();
        config.api.api_key = Some("secret-token".to_string());

        let json = serde_json::to_string(&config).expect("serialize failed");

        assert!(!json.contains("secret-token"), "credential leaked: {json}");
        assert!(!json.contains("api_key"));
    }

    #[test]
    fn durations_use_seconds_and_page_delay_uses_millis() {
        let json = r#"{
            "api": { "request_timeout": 5, "page_delay": 250 },
            "recovery": { "fast_step": 2, "cooldown": 60 }
        }"#;

        let config: Config = serde_json::from_str(json).expect("deserialize failed");

        assert_eq!(config.api.request_timeout, Duration::from_secs(5));
        assert_eq!(config.api.page_delay, Duration::from_millis(250));
        assert_eq!(config.recovery.fast_step, Duration::from_secs(2));
        assert_eq!(config.recovery.cooldown, Duration::from_secs(60));
    }

    #[test]
    fn from_file_reads_partial_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "api": { "community_id": "42" }, "link_urls": [] }"#).unwrap();

        let config = Config::from_file(&path).unwrap();

        assert_eq!(config.api.community_id, "42");
        assert!(config.link_urls.is_empty());
        assert_eq!(config.retry.max_attempts, 8);
    }

    #[test]
    fn from_file_reports_parse_errors_as_config_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{ not json").unwrap();

        let err = Config::from_file(&path).unwrap_err();

        assert!(matches!(err, Error::Config { .. }), "got {err:?}");
    }

    #[test]
    fn validate_rejects_zero_page_size() {
        let mut config = Config::default();
        config.api.page_size = 0;

        match config.validate() {
            Err(Error::Config { key, .. }) => assert_eq!(key.as_deref(), Some("page_size")),
            other => panic!("expected page_size error, got {other:?}"),
        }
    }

    #[test]
    fn validate_rejects_bad_base_url() {
        let mut config = Config::default();
        config.api.base_url = "not a url".to_string();

        match config.validate() {
            Err(Error::Config { key, .. }) => assert_eq!(key.as_deref(), Some("base_url")),
            other => panic!("expected base_url error, got {other:?}"),
        }
    }

    #[test]
    fn validate_accepts_defaults() {
        Config::default().validate().unwrap();
    }

    #[test]
    #[serial]
    fn apply_env_fills_missing_key() {
        // SAFETY: serialized with the other env-touching tests
        unsafe { std::env::set_var(API_KEY_ENV, "from-env") };
        let mut config = Config::default();

        config.apply_env();

        assert_eq!(config.api.api_key.as_deref(), Some("from-env"));
        unsafe { std::env::remove_var(API_KEY_ENV) };
    }

    #[test]
    #[serial]
    fn apply_env_keeps_explicit_key() {
        unsafe { std::env::set_var(API_KEY_ENV, "from-env") };
        let mut config = Config::default();
        config.api.api_key = Some("explicit".to_string());

        config.apply_env();

        assert_eq!(config.api.api_key.as_deref(), Some("explicit"));
        unsafe { std::env::remove_var(API_KEY_ENV) };
    }

    #[test]
    #[serial]
    fn apply_env_without_variable_leaves_key_empty() {
        unsafe { std::env::remove_var(API_KEY_ENV) };
        let mut config = Config::default();

        config.apply_env();

        assert!(config.api.api_key.is_none());
    }

    #[test]
    fn recovery_policies_match_budget() {
        let recovery = RecoveryConfig::default();

        let fast = recovery.fast_policy();
        assert_eq!(fast.max_attempts, 12);
        assert_eq!(fast.delay(3), Duration::from_secs(3));

        let slow = recovery.cooldown_policy();
        assert_eq!(slow.max_attempts, 1);
        assert_eq!(slow.delay(1), Duration::from_secs(180));
    }
}
