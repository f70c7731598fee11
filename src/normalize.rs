//! Mapping from upstream post JSON to [`NormalizedRecord`]

use crate::types::{Author, MediaItem, Metrics, NormalizedRecord, RawRecord};
use serde_json::Value;
use std::collections::HashSet;

/// Normalize one upstream post
///
/// Never fails: anything missing becomes `None`, an empty list, or 0.
pub fn normalize(raw: &RawRecord) -> NormalizedRecord {
    let user = raw.get("user").filter(|u| u.is_object());

    NormalizedRecord {
        timestamp: first_str(raw, &["tweet_created_at", "created_at"]),
        id: str_field(raw, "id_str"),
        text: first_str(raw, &["full_text", "text"]),
        metrics: Metrics {
            likes: count(raw, "favorite_count"),
            reposts: count(raw, "retweet_count"),
            replies: count(raw, "reply_count"),
            views: count(raw, "views_count"),
            quotes: count(raw, "quote_count"),
        },
        media: extract_media(raw),
        author: Author {
            handle: user.and_then(|u| str_field(u, "screen_name")),
            display_name: user.and_then(|u| str_field(u, "name")),
            avatar_url: user
                .and_then(|u| first_str(u, &["profile_image_url_https", "profile_image_url"])),
        },
    }
}

/// Media attached to a post, unique by URL, first occurrence kept
///
/// Looks in `extended_entities.media`, then `entities.media`, then a top-level
/// `media` array. Items without a URL are skipped.
pub fn extract_media(raw: &RawRecord) -> Vec<MediaItem> {
    let source = raw
        .pointer("/extended_entities/media")
        .or_else(|| raw.pointer("/entities/media"))
        .or_else(|| raw.get("media"))
        .and_then(Value::as_array);

    let Some(source) = source else {
        return Vec::new();
    };

    let mut seen = HashSet::new();
    let mut media = Vec::new();

    for item in source {
        let Some(url) = first_str(item, &["media_url_https", "media_url"]) else {
            continue;
        };
        if !seen.insert(url.clone()) {
            continue;
        }

        media.push(MediaItem {
            kind: str_field(item, "type"),
            url,
            thumbnail_url: str_field(item, "url"),
            best_video_url: best_video_url(item),
        });
    }

    media
}

/// Highest-bitrate `video/*` rendition of a video or GIF
pub fn best_video_url(media: &Value) -> Option<String> {
    let kind = media.get("type").and_then(Value::as_str)?;
    if kind != "video" && kind != "animated_gif" {
        return None;
    }

    media
        .pointer("/video_info/variants")
        .and_then(Value::as_array)?
        .iter()
        .filter(|v| {
            v.get("content_type")
                .and_then(Value::as_str)
                .is_some_and(|ct| ct.starts_with("video"))
        })
        // max_by_key keeps the last maximum; reverse so ties keep the first
        .rev()
        .max_by_key(|v| v.get("bitrate").and_then(Value::as_u64).unwrap_or(0))
        .and_then(|v| str_field(v, "url"))
}

fn str_field(value: &Value, key: &str) -> Option<String> {
    value.get(key).and_then(Value::as_str).map(str::to_string)
}

/// First key holding a non-empty string
fn first_str(value: &Value, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| value.get(*key).and_then(Value::as_str))
        .find(|s| !s.is_empty())
        .map(str::to_string)
}

fn count(value: &Value, key: &str) -> u64 {
    match value.get(key) {
        Some(Value::Number(n)) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f > 0.0).map(|f| f as u64))
            .unwrap_or(0),
        // Some upstream counters arrive as strings
        Some(Value::String(s)) => s.parse().unwrap_or(0),
        _ => 0,
    }
}
