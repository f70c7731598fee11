//! Common test utilities for community-leaderboard integration tests

use community_leaderboard::Config;
use serde_json::{Value, json};
use std::time::Duration;
use tempfile::TempDir;
use wiremock::MockServer;

/// Community id used by every mock
pub const COMMUNITY: &str = "555";

/// Path of the mocked community listing
pub fn community_path() -> String {
    format!("/twitter/community/{COMMUNITY}/tweets")
}

/// Upstream-shaped post
pub fn post(id: &str, handle: &str, likes: u64, views: u64) -> Value {
    json!({
        "tweet_created_at": "2025-11-18T10:00:00.000000Z",
        "id_str": id,
        "full_text": format!("post {id}"),
        "favorite_count": likes,
        "retweet_count": 0,
        "reply_count": 0,
        "views_count": views,
        "quote_count": 0,
        "user": {
            "screen_name": handle,
            "name": handle.to_uppercase(),
            "profile_image_url_https": format!("https://pbs.example/{handle}_normal.jpg")
        }
    })
}

/// Community listing response body
pub fn listing(posts: Vec<Value>, next_cursor: Option<&str>) -> Value {
    json!({ "tweets": posts, "next_cursor": next_cursor })
}

/// Config pointed at `server`, writing into `dir`, with millisecond-scale waits
pub fn fast_config(server: &MockServer, dir: &TempDir, links: &[&str]) -> Config {
    let mut config = Config::default();
    config.api.base_url = server.uri();
    config.api.community_id = COMMUNITY.to_string();
    config.api.api_key = Some("integration-key".to_string());
    config.api.page_size = 20;
    config.api.request_timeout = Duration::from_secs(5);
    config.api.page_delay = Duration::from_millis(5);
    config.retry.max_attempts = 3;
    config.retry.base = 0.01;
    config.retry.max_delay = Duration::from_millis(20);
    config.retry.jitter = false;
    config.recovery.fast_attempts = 3;
    config.recovery.fast_step = Duration::from_millis(10);
    config.recovery.cooldown = Duration::from_millis(30);
    config.output.posts_path = dir.path().join("all_tweets.json");
    config.output.leaderboard_path = dir.path().join("leaderboard.json");
    config.link_urls = links.iter().map(|s| s.to_string()).collect();
    config
}
