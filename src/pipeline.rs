//! One complete collection run
//!
//! ```text
//! community listing ─┐
//!                    ├─▶ merge ─▶ posts file
//! linked posts ──────┘      └──▶ aggregate ─▶ leaderboard file
//! ```

use crate::client::ApiClient;
use crate::collector::{EndReason, PageSource, collect_all};
use crate::config::Config;
use crate::error::Result;
use crate::leaderboard::aggregate;
use crate::links::{PostSource, collect_linked_posts};
use crate::merge::merge;
use crate::storage::save_json;
use tracing::info;

/// What a run produced
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunSummary {
    /// Unique community posts collected
    pub community_posts: usize,
    /// Linked posts fetched successfully
    pub linked_posts: usize,
    /// Posts written after merging
    pub merged_posts: usize,
    /// Authors on the leaderboard
    pub authors: usize,
    /// How the community listing ended
    pub end: EndReason,
}

/// Run against the real API described by `config`
///
/// # Errors
/// Fails if the community listing cannot be fetched completely or an output
/// file cannot be written. Linked-post failures are logged and skipped.
pub async fn run(config: &Config) -> Result<RunSummary> {
    config.validate()?;
    if config.api.api_key.is_none() {
        tracing::warn!("No API key configured, requests will likely be rejected upstream");
    }

    let client = ApiClient::new(&config.api, &config.retry)?;
    run_with(&client, &client, config).await
}

/// Run with explicit page and post sources
pub async fn run_with<P, S>(pages: &P, posts: &S, config: &Config) -> Result<RunSummary>
where
    P: PageSource + ?Sized,
    S: PostSource + ?Sized,
{
    let community = collect_all(pages, &config.recovery, config.api.page_delay).await?;
    let linked = collect_linked_posts(posts, &config.link_urls).await;

    let merged = merge(&community.records, &linked);
    save_json(&config.output.posts_path, &merged).await?;
    info!(
        path = %config.output.posts_path.display(),
        posts = merged.len(),
        "Posts saved"
    );

    let board = aggregate(&merged);
    save_json(&config.output.leaderboard_path, &board).await?;
    info!(
        path = %config.output.leaderboard_path.display(),
        authors = board.len(),
        "Leaderboard saved"
    );

    Ok(RunSummary {
        community_posts: community.records.len(),
        linked_posts: linked.len(),
        merged_posts: merged.len(),
        authors: board.len(),
        end: community.stats.end,
    })
}
