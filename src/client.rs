//! HTTP access to the upstream social-media API
//!
//! [`ApiClient`] is the resilient fetcher: every GET goes through
//! [`with_retry`](crate::retry::with_retry) with the configured exponential
//! backoff. On top of it sit the two endpoints the crate needs, the paginated
//! community listing and the single-post lookup.

use crate::collector::PageSource;
use crate::config::{ApiConfig, RetryConfig};
use crate::error::{Error, Result};
use crate::links::PostSource;
use crate::retry::{RetryPolicy, with_retry};
use crate::types::{Page, RawRecord};
use async_trait::async_trait;
use reqwest::header::ACCEPT;
use serde_json::Value;
use tracing::debug;

/// Client for the community and single-post endpoints
pub struct ApiClient {
    /// HTTP client with the per-request timeout applied
    http: reqwest::Client,

    /// API root without trailing slash
    base_url: String,

    /// Community whose listing is paged
    community_id: String,

    /// Bearer credential, sent when present
    api_key: Option<String>,

    /// Page size sent as `limit`
    page_size: u32,

    /// Feed ordering sent as `type`
    feed_type: String,

    /// Backoff for every request
    retry: RetryPolicy,
}

impl ApiClient {
    /// Create a client from the API and retry settings
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be created
    pub fn new(api: &ApiConfig, retry: &RetryConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(api.request_timeout)
            .user_agent(concat!("community-leaderboard/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::Other(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: api.base_url.trim_end_matches('/').to_string(),
            community_id: api.community_id.clone(),
            api_key: api.api_key.clone(),
            page_size: api.page_size,
            feed_type: api.feed_type.clone(),
            retry: retry.policy(),
        })
    }

    /// GET a JSON document, retrying transport failures and non-2xx answers
    ///
    /// # Errors
    /// - [`Error::RetriesExhausted`] naming `url` once every attempt failed
    /// - [`Error::Network`] without retry if the body is not JSON
    pub async fn get_json(&self, url: &str, query: &[(&str, String)]) -> Result<Value> {
        with_retry(&self.retry, url, || self.get_once(url, query)).await
    }

    async fn get_once(&self, url: &str, query: &[(&str, String)]) -> Result<Value> {
        debug!(url, ?query, "GET");

        let mut request = self
            .http
            .get(url)
            .query(query)
            .header(ACCEPT, "application/json");
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::HttpStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        Ok(response.json::<Value>().await?)
    }

    /// URL of the community listing
    pub fn community_url(&self) -> String {
        format!(
            "{}/twitter/community/{}/tweets",
            self.base_url, self.community_id
        )
    }

    /// URL of one post
    pub fn post_url(&self, id: &str) -> String {
        format!("{}/twitter/tweets/{}", self.base_url, id)
    }

    /// Fetch one page of the community listing
    pub async fn community_page(&self, cursor: Option<&str>) -> Result<Page> {
        let mut query = vec![
            ("type", self.feed_type.clone()),
            ("limit", self.page_size.to_string()),
        ];
        if let Some(cursor) = cursor {
            query.push(("cursor", cursor.to_string()));
        }

        let body = self.get_json(&self.community_url(), &query).await?;
        Ok(Page::from_response(body))
    }

    /// Fetch one post by identifier
    pub async fn post(&self, id: &str) -> Result<RawRecord> {
        self.get_json(&self.post_url(id), &[]).await
    }
}

#[async_trait]
impl PageSource for ApiClient {
    async fn fetch_page(&self, cursor: Option<&str>) -> Result<Page> {
        self.community_page(cursor).await
    }
}

#[async_trait]
impl PostSource for ApiClient {
    async fn fetch_post(&self, id: &str) -> Result<RawRecord> {
        self.post(id).await
    }
}
