//! # community-leaderboard
//!
//! Collects every post of a social-media community, merges them with a fixed
//! list of individually linked posts, and folds the result into a per-author
//! leaderboard.
//!
//! ## Design Philosophy
//!
//! - **Never truncate silently** - an empty page is ambiguous, not final; it is
//!   re-requested on a fixed budget before the listing is considered complete
//! - **Fail fast on the listing** - a community page that cannot be fetched
//!   aborts the run instead of publishing a partial dataset
//! - **Tolerate the extras** - a linked post that fails is logged and skipped
//! - **Sequential** - one request in flight at a time, every wait is a plain sleep
//!
//! ## Quick Start
//!
//! ```no_run
//! use community_leaderboard::{Config, run};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut config = Config::default();
//!     config.apply_env();
//!
//!     let summary = run(&config).await?;
//!     println!("{} posts, {} authors", summary.merged_posts, summary.authors);
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Upstream API client (resilient fetcher)
pub mod client;
/// Cursor-paginated community collection
pub mod collector;
/// Configuration types
pub mod config;
/// Error types
pub mod error;
/// Per-author aggregation and ranking
pub mod leaderboard;
/// Individually linked posts
pub mod links;
/// Community and linked post union
pub mod merge;
/// Upstream post normalization
pub mod normalize;
/// End-to-end run
pub mod pipeline;
/// Retry logic with backoff
pub mod retry;
/// JSON persistence
pub mod storage;
/// Core record types
pub mod types;

// Re-export commonly used types
pub use client::ApiClient;
pub use collector::{Collection, CollectionStats, Collector, EndReason, PageSource, collect_all};
pub use config::{ApiConfig, Config, OutputConfig, RecoveryConfig, RetryConfig};
pub use error::{Error, Result};
pub use leaderboard::{SortKey, Totals, aggregate};
pub use links::{PostSource, collect_linked_posts, extract_post_id};
pub use merge::merge;
pub use normalize::normalize;
pub use pipeline::{RunSummary, run, run_with};
pub use retry::{Backoff, IsRetryable, RetryPolicy};
pub use types::{
    Author, Leaderboard, LeaderboardEntry, MediaItem, Metrics, NormalizedRecord, Page, RawRecord,
};
