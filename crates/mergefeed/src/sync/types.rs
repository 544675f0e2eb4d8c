//! Result types and tuning constants for the sync engines.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::entity::pull_request::Model as PullRequestModel;
use crate::store::PageCursor;

/// Items per upstream search page.
pub const SEARCH_PAGE_SIZE: u32 = 100;

/// Ceiling on search pages walked by one forward sync. Bounds the candidate
/// set when the upstream result set is unexpectedly large; the next sync run
/// picks up from the advanced watermark.
pub const MAX_SEARCH_PAGES: u32 = 10;

/// Worker count for bulk detail fetches.
pub const DETAIL_FETCH_CONCURRENCY: usize = 5;

/// Worker count for child-collection fetches.
pub const CHILD_FETCH_CONCURRENCY: usize = 3;

/// Maximum commits mirrored per pull request.
pub const MAX_COMMITS_PER_PULL: usize = 50;

/// Maximum changed files mirrored per pull request.
pub const MAX_FILES_PER_PULL: usize = 100;

/// Result of a paginated read.
#[derive(Debug, Clone, Serialize)]
pub struct PageReadResult {
    /// Up to `limit` pull requests, newest merge first.
    pub items: Vec<PullRequestModel>,
    /// Cursor for the next page; absent when the page was empty.
    pub next_cursor: Option<PageCursor>,
    /// Whether more items exist past this page.
    pub has_more: bool,
}

/// Result of a forward incremental sync.
#[derive(Debug, Clone, Serialize)]
pub struct ForwardSyncReport {
    /// Deduplicated candidates discovered since the watermark.
    pub candidate_count: usize,
    /// Candidates actually persisted (merged and successfully fetched).
    pub synced_count: usize,
    /// Watermark in effect when the sync started.
    pub watermark_before: Option<DateTime<Utc>>,
    /// Watermark after the sync advanced it from store contents.
    pub watermark_after: Option<DateTime<Utc>>,
}
