//! Individually fetched posts
//!
//! A short, fixed list of post links is fetched one by one next to the
//! community listing. Each link is independent: a malformed link or a post
//! that cannot be fetched is logged and skipped, never fatal.

use crate::error::{Error, Result};
use crate::normalize::normalize;
use crate::types::{NormalizedRecord, RawRecord};
use async_trait::async_trait;
use tracing::{error, info};

/// Source of single posts by identifier
#[async_trait]
pub trait PostSource: Send + Sync {
    /// Fetch one post
    async fn fetch_post(&self, id: &str) -> Result<RawRecord>;
}

/// Resolves scheme-less links
const LINK_BASE: &str = "https://twitter.com/";

/// Extract the post identifier from a link such as
/// `https://twitter.com/user/status/1990541572342231158?s=20`
///
/// The identifier is the path segment right after `status`. Links without a
/// scheme (`twitter.com/user/status/123`) are read as paths.
///
/// # Errors
/// [`Error::InvalidPostUrl`] if the link does not parse or has no
/// non-empty segment after `status`.
pub fn extract_post_id(link: &str) -> Result<String> {
    let invalid = || Error::InvalidPostUrl(link.to_string());

    let base = url::Url::parse(LINK_BASE).map_err(|_| invalid())?;
    let parsed = url::Url::options()
        .base_url(Some(&base))
        .parse(link)
        .map_err(|_| invalid())?;
    let mut segments = parsed.path_segments().ok_or_else(invalid)?;

    segments
        .by_ref()
        .find(|segment| *segment == "status")
        .ok_or_else(invalid)?;

    segments
        .next()
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .ok_or_else(invalid)
}

/// Fetch and normalize every link, in order, skipping the ones that fail
pub async fn collect_linked_posts<S: PostSource + ?Sized>(
    source: &S,
    links: &[String],
) -> Vec<NormalizedRecord> {
    info!(links = links.len(), "Collecting linked posts");

    let mut results = Vec::with_capacity(links.len());
    for link in links {
        match fetch_linked_post(source, link).await {
            Ok(record) => {
                info!(url = %link, id = ?record.id, "Fetched linked post");
                results.push(record);
            }
            Err(e) => {
                error!(url = %link, error = %e, "Failed to fetch linked post, skipping");
            }
        }
    }

    info!(
        fetched = results.len(),
        skipped = links.len() - results.len(),
        "Linked posts collected"
    );
    results
}

async fn fetch_linked_post<S: PostSource + ?Sized>(
    source: &S,
    link: &str,
) -> Result<NormalizedRecord> {
    let id = extract_post_id(link)?;
    let raw = source.fetch_post(&id).await?;
    Ok(normalize(&raw))
}
