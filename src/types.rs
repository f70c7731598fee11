//! Core record types
//!
//! Upstream items stay untyped ([`RawRecord`]) until they are normalized. The
//! normalized and leaderboard shapes serialize with the field names the
//! leaderboard front end reads (`id_str`, `favorite_count`, `user.screen_name`, ...).

use serde::{Deserialize, Deserializer, Serialize};

/// Upstream-shaped post, only inspected for its identifier until normalization
pub type RawRecord = serde_json::Value;

/// Identifier of a raw upstream post (`id_str`), if it has one
pub fn raw_id(raw: &RawRecord) -> Option<&str> {
    raw.get("id_str")
        .and_then(|v| v.as_str())
        .filter(|id| !id.is_empty())
}

/// One page of a cursor-paginated listing
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Page {
    /// Items on this page, in upstream order
    pub items: Vec<RawRecord>,
    /// Continuation token; `None` means the upstream says there is nothing more
    pub next_cursor: Option<String>,
}

impl Page {
    /// Build a page from a community listing response body
    ///
    /// A missing or null `tweets` array reads as an empty page, and an empty
    /// `next_cursor` string reads as no cursor.
    pub fn from_response(body: serde_json::Value) -> Self {
        let serde_json::Value::Object(mut body) = body else {
            return Self::default();
        };

        let items = match body.remove("tweets") {
            Some(serde_json::Value::Array(items)) => items,
            _ => Vec::new(),
        };
        let next_cursor = body
            .get("next_cursor")
            .and_then(|v| v.as_str())
            .filter(|c| !c.is_empty())
            .map(str::to_string);

        Self { items, next_cursor }
    }

    /// Whether the page carried no items at all
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Engagement counters of one post; absent upstream values are 0
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metrics {
    /// Likes
    #[serde(rename = "favorite_count", default, deserialize_with = "null_as_zero")]
    pub likes: u64,
    /// Reposts
    #[serde(rename = "retweet_count", default, deserialize_with = "null_as_zero")]
    pub reposts: u64,
    /// Replies
    #[serde(rename = "reply_count", default, deserialize_with = "null_as_zero")]
    pub replies: u64,
    /// Views
    #[serde(rename = "views_count", default, deserialize_with = "null_as_zero")]
    pub views: u64,
    /// Quotes
    #[serde(rename = "quote_count", default, deserialize_with = "null_as_zero")]
    pub quotes: u64,
}

/// Photo, video or GIF attached to a post
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaItem {
    /// Upstream media type ("photo", "video", "animated_gif")
    #[serde(rename = "type")]
    pub kind: Option<String>,
    /// Media URL; unique within one post
    pub url: String,
    /// Short link shown in the post text
    #[serde(rename = "thumb")]
    pub thumbnail_url: Option<String>,
    /// Highest-bitrate video rendition, for videos and GIFs
    #[serde(rename = "video_url", default)]
    pub best_video_url: Option<String>,
}

/// Post author as shown on the leaderboard
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    /// Handle without the leading `@`
    #[serde(rename = "screen_name")]
    pub handle: Option<String>,
    /// Display name
    #[serde(rename = "name")]
    pub display_name: Option<String>,
    /// Avatar image URL
    #[serde(rename = "profile_image_url")]
    pub avatar_url: Option<String>,
}

/// A post in the stable persisted shape
///
/// Two records with the same `id` are the same post, whatever else differs.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NormalizedRecord {
    /// Creation time as sent upstream
    #[serde(rename = "created_at")]
    pub timestamp: Option<String>,
    /// Post identifier
    #[serde(rename = "id_str")]
    pub id: Option<String>,
    /// Full text
    pub text: Option<String>,
    /// Engagement counters
    #[serde(flatten)]
    pub metrics: Metrics,
    /// Attached media, unique by URL, upstream order
    #[serde(default)]
    pub media: Vec<MediaItem>,
    /// Author
    #[serde(rename = "user", default)]
    pub author: Author,
}

/// Running totals for one author
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    /// Avatar from the first post seen for this author
    #[serde(rename = "profile_image_url")]
    pub avatar_url: Option<String>,
    /// Number of posts
    pub posts: u64,
    /// Sum of likes
    pub likes: u64,
    /// Sum of reposts
    #[serde(rename = "retweets")]
    pub reposts: u64,
    /// Sum of replies
    pub comments: u64,
    /// Sum of quotes
    pub quotes: u64,
    /// Sum of views
    pub views: u64,
}

/// Leaderboard in first-appearance order; serializes as `[[handle, entry], ...]`
pub type Leaderboard = Vec<(String, LeaderboardEntry)>;

fn null_as_zero<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<u64>::deserialize(deserializer)?.unwrap_or(0))
}
