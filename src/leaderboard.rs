//! Per-author leaderboard
//!
//! [`aggregate`] folds posts into running totals per author handle, in the
//! order authors first appear. The rest of the module is the read side used by
//! the `report` command: time windows, ranking and totals.

use crate::types::{Leaderboard, LeaderboardEntry, NormalizedRecord};
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Key used for posts whose author has no handle
pub const UNKNOWN_AUTHOR: &str = "unknown";

/// Fold posts into per-author totals
///
/// The avatar is taken from an author's first post and never overwritten.
/// Entries keep first-appearance order.
pub fn aggregate<'a>(records: impl IntoIterator<Item = &'a NormalizedRecord>) -> Leaderboard {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut board: Leaderboard = Vec::new();

    for record in records {
        let handle = author_key(record);
        let slot = *index.entry(handle.to_string()).or_insert_with(|| {
            board.push((
                handle.to_string(),
                LeaderboardEntry {
                    avatar_url: record.author.avatar_url.clone(),
                    ..Default::default()
                },
            ));
            board.len() - 1
        });

        let entry = &mut board[slot].1;
        let metrics = &record.metrics;
        entry.posts += 1;
        entry.likes += metrics.likes;
        entry.reposts += metrics.reposts;
        entry.comments += metrics.replies;
        entry.quotes += metrics.quotes;
        entry.views += metrics.views;
    }

    board
}

/// Leaderboard key of a post's author
pub fn author_key(record: &NormalizedRecord) -> &str {
    record
        .author
        .handle
        .as_deref()
        .filter(|h| !h.is_empty())
        .unwrap_or(UNKNOWN_AUTHOR)
}

/// Parse an upstream timestamp
///
/// Accepts RFC 3339 (`2025-11-18T10:00:00.000000Z`) and the classic
/// `Tue Nov 18 10:00:00 +0000 2025` format.
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .or_else(|_| DateTime::parse_from_str(value, "%a %b %d %H:%M:%S %z %Y"))
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Posts created at most `days` days before `now`
///
/// Posts with a missing or unparsable timestamp are left out. A window that
/// reaches past the earliest representable date keeps every dated post.
pub fn within_days(
    records: &[NormalizedRecord],
    now: DateTime<Utc>,
    days: u32,
) -> Vec<&NormalizedRecord> {
    let cutoff = Duration::try_days(i64::from(days)).and_then(|d| now.checked_sub_signed(d));
    records
        .iter()
        .filter(|r| {
            r.timestamp
                .as_deref()
                .and_then(parse_timestamp)
                .is_some_and(|created| cutoff.is_none_or(|cutoff| created >= cutoff))
        })
        .collect()
}

/// Column a leaderboard can be ranked by
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SortKey {
    /// Number of posts
    Posts,
    /// Likes
    Likes,
    /// Reposts
    Retweets,
    /// Replies
    Comments,
    /// Quotes
    Quotes,
    /// Views
    #[default]
    Views,
}

impl SortKey {
    fn value(self, entry: &LeaderboardEntry) -> u64 {
        match self {
            SortKey::Posts => entry.posts,
            SortKey::Likes => entry.likes,
            SortKey::Retweets => entry.reposts,
            SortKey::Comments => entry.comments,
            SortKey::Quotes => entry.quotes,
            SortKey::Views => entry.views,
        }
    }
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "posts" => Ok(SortKey::Posts),
            "likes" => Ok(SortKey::Likes),
            "retweets" | "reposts" => Ok(SortKey::Retweets),
            "comments" | "replies" => Ok(SortKey::Comments),
            "quotes" => Ok(SortKey::Quotes),
            "views" => Ok(SortKey::Views),
            other => Err(format!(
                "unknown sort key '{other}' (expected posts, likes, retweets, comments, quotes or views)"
            )),
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SortKey::Posts => "posts",
            SortKey::Likes => "likes",
            SortKey::Retweets => "retweets",
            SortKey::Comments => "comments",
            SortKey::Quotes => "quotes",
            SortKey::Views => "views",
        };
        f.write_str(name)
    }
}

/// Rank in place; ties keep their current relative order
pub fn rank(board: &mut Leaderboard, key: SortKey, ascending: bool) {
    if ascending {
        board.sort_by_key(|(_, entry)| key.value(entry));
    } else {
        board.sort_by(|(_, a), (_, b)| key.value(b).cmp(&key.value(a)));
    }
}

/// Sums shown above the leaderboard
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Totals {
    /// Posts across all authors
    pub posts: u64,
    /// Number of authors
    pub users: usize,
    /// Views across all authors
    pub views: u64,
}

/// Compute [`Totals`] for a leaderboard
pub fn totals(board: &Leaderboard) -> Totals {
    Totals {
        posts: board.iter().map(|(_, e)| e.posts).sum(),
        users: board.len(),
        views: board.iter().map(|(_, e)| e.views).sum(),
    }
}

/// Full-size variant of an avatar URL (drops the `_normal` size suffix)
pub fn full_size_avatar(url: &str) -> String {
    url.replace("_normal", "")
}
