//! Cursor-paginated collection of every post in a community
//!
//! The upstream listing occasionally answers with an empty page even though
//! more posts follow at the same cursor. An empty page is therefore treated as
//! ambiguous rather than as the end: the collector re-requests the same cursor
//! on a fixed budget before believing it. Only the continuation token is
//! trusted as an end-of-stream signal for non-empty pages.
//!
//! The loop is an explicit state machine:
//!
//! ```text
//! Paging ──non-empty, cursor──▶ Paging
//!    │  └──non-empty, no cursor──▶ Done(EndOfStream)
//!    └──empty──▶ RecoveringFast(1..=N) ──non-empty──▶ (cursor check as above)
//!                      └──still empty after N──▶ RecoveringSlow ──non-empty──▶ (cursor check)
//!                                                       └──empty──▶ Done(RecoveryExhausted)
//! ```
//!
//! Any fetch error aborts the whole collection; a partial community is never
//! returned as if it were complete.

use crate::config::RecoveryConfig;
use crate::error::Result;
use crate::retry::RetryPolicy;
use crate::types::{Page, RawRecord, raw_id};
use async_trait::async_trait;
use std::collections::HashSet;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Source of cursor-paginated pages
///
/// Implementations perform their own transport retries; an error returned
/// here is final.
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Fetch the page starting at `cursor` (`None` for the first page)
    async fn fetch_page(&self, cursor: Option<&str>) -> Result<Page>;
}

/// Why a collection stopped
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EndReason {
    /// A non-empty page carried no continuation token
    EndOfStream,
    /// An empty page stayed empty through every recovery attempt
    RecoveryExhausted,
}

/// Collector state between two fetches
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum State {
    /// Requesting the next page at the current cursor
    Paging,
    /// Re-requesting the current cursor after an empty page, attempt `n`
    RecoveringFast(u32),
    /// Single re-request after the cooldown
    RecoveringSlow,
    /// Finished
    Done(EndReason),
}

/// Counters describing one collection run
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CollectionStats {
    /// Pages requested in the normal paging state
    pub pages: u32,
    /// Total requests, recovery re-requests included
    pub requests: u32,
    /// Empty pages that entered recovery
    pub empty_pages: u32,
    /// Recoveries that found data again
    pub recovered: u32,
    /// Why the loop stopped
    pub end: EndReason,
}

/// Result of a collection: unique raw posts in first-seen order
#[derive(Clone, Debug)]
pub struct Collection {
    /// Posts, deduplicated by identifier
    pub records: Vec<RawRecord>,
    /// Run counters
    pub stats: CollectionStats,
}

/// Pages through one listing until a confirmed end
pub struct Collector<'a, S: PageSource + ?Sized> {
    source: &'a S,
    fast: RetryPolicy,
    slow: RetryPolicy,
    page_delay: Duration,

    cursor: Option<String>,
    seen: HashSet<String>,
    accumulated: Vec<RawRecord>,

    pages: u32,
    requests: u32,
    empty_pages: u32,
    recovered: u32,
}

impl<'a, S: PageSource + ?Sized> Collector<'a, S> {
    /// Create a collector over `source`
    ///
    /// # Arguments
    /// * `source` - Where pages come from
    /// * `recovery` - Empty-page recovery budget
    /// * `page_delay` - Courtesy pause before each new cursor is requested
    pub fn new(source: &'a S, recovery: &RecoveryConfig, page_delay: Duration) -> Self {
        Self {
            source,
            fast: recovery.fast_policy(),
            slow: recovery.cooldown_policy(),
            page_delay,
            cursor: None,
            seen: HashSet::new(),
            accumulated: Vec::new(),
            pages: 0,
            requests: 0,
            empty_pages: 0,
            recovered: 0,
        }
    }

    /// Run the state machine to completion
    ///
    /// # Errors
    /// Propagates the first error returned by the page source.
    pub async fn collect(mut self) -> Result<Collection> {
        info!("Collecting community posts");

        let mut state = State::Paging;
        let end = loop {
            state = match state {
                State::Paging => self.page().await?,
                State::RecoveringFast(attempt) => self.recover_fast(attempt).await?,
                State::RecoveringSlow => self.recover_slow().await?,
                State::Done(reason) => break reason,
            };
        };

        let stats = CollectionStats {
            pages: self.pages,
            requests: self.requests,
            empty_pages: self.empty_pages,
            recovered: self.recovered,
            end,
        };
        info!(
            unique = self.accumulated.len(),
            pages = stats.pages,
            requests = stats.requests,
            end = ?stats.end,
            "Community collection finished"
        );

        Ok(Collection {
            records: self.accumulated,
            stats,
        })
    }

    async fn page(&mut self) -> Result<State> {
        self.pages += 1;
        info!(page = self.pages, cursor = ?self.cursor, "Requesting page");

        let page = self.fetch().await?;
        let added = self.absorb(&page);
        info!(
            received = page.items.len(),
            added,
            total = self.accumulated.len(),
            next_cursor = ?page.next_cursor,
            "Page received"
        );

        if page.is_empty() {
            self.empty_pages += 1;
            warn!(
                cursor = ?self.cursor,
                "Empty page, checking whether this is a false end of stream"
            );
            return Ok(self.enter_recovery());
        }

        self.advance(page.next_cursor).await
    }

    async fn recover_fast(&mut self, attempt: u32) -> Result<State> {
        let delay = self.fast.delay(attempt);
        info!(
            attempt,
            max_attempts = self.fast.max_attempts,
            delay_ms = delay.as_millis() as u64,
            "Re-requesting empty page"
        );
        tokio::time::sleep(delay).await;

        let page = self.fetch().await?;
        if !page.is_empty() {
            return self.recovered_with(page, "rapid retry").await;
        }

        if attempt < self.fast.max_attempts {
            Ok(State::RecoveringFast(attempt + 1))
        } else {
            Ok(State::RecoveringSlow)
        }
    }

    async fn recover_slow(&mut self) -> Result<State> {
        let cooldown = self.slow.delay(1);
        warn!(
            cooldown_secs = cooldown.as_secs(),
            "Page still empty after rapid retries, cooling down"
        );
        tokio::time::sleep(cooldown).await;

        let page = self.fetch().await?;
        if !page.is_empty() {
            return self.recovered_with(page, "cooldown").await;
        }

        info!(
            cursor = ?self.cursor,
            "Page still empty after cooldown, treating as true end of stream"
        );
        Ok(State::Done(EndReason::RecoveryExhausted))
    }

    /// The recovered page replaces the empty one, cursor check included
    async fn recovered_with(&mut self, page: Page, phase: &str) -> Result<State> {
        self.recovered += 1;
        let added = self.absorb(&page);
        info!(
            phase,
            received = page.items.len(),
            added,
            total = self.accumulated.len(),
            "False end of stream, data reappeared"
        );
        self.advance(page.next_cursor).await
    }

    fn enter_recovery(&self) -> State {
        if self.fast.max_attempts > 0 {
            State::RecoveringFast(1)
        } else {
            State::RecoveringSlow
        }
    }

    async fn advance(&mut self, next_cursor: Option<String>) -> Result<State> {
        match next_cursor {
            None => {
                info!("No continuation cursor, end of stream");
                Ok(State::Done(EndReason::EndOfStream))
            }
            Some(cursor) => {
                self.cursor = Some(cursor);
                tokio::time::sleep(self.page_delay).await;
                Ok(State::Paging)
            }
        }
    }

    async fn fetch(&mut self) -> Result<Page> {
        self.requests += 1;
        self.source.fetch_page(self.cursor.as_deref()).await
    }

    /// Append unseen posts; returns how many were new
    fn absorb(&mut self, page: &Page) -> usize {
        let mut added = 0;
        for item in &page.items {
            let Some(id) = raw_id(item) else {
                debug!("Skipping post without id_str");
                continue;
            };
            if self.seen.insert(id.to_string()) {
                self.accumulated.push(item.clone());
                added += 1;
            }
        }
        added
    }
}

/// Collect every post reachable from the first page of `source`
pub async fn collect_all<S: PageSource + ?Sized>(
    source: &S,
    recovery: &RecoveryConfig,
    page_delay: Duration,
) -> Result<Collection> {
    Collector::new(source, recovery, page_delay).collect().await
}
