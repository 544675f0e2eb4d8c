//! Record shapes crossing the upstream client boundary.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Merge-time bounds for a merged-pull search.
///
/// `merged_before` is exclusive and drives backward backfill; `merged_after`
/// is inclusive and drives forward sync from the watermark. The two engines
/// deliberately use different interval conventions - do not unify them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergedSearchFilter {
    /// Only items merged strictly before this instant.
    pub merged_before: Option<DateTime<Utc>>,
    /// Only items merged at or after this instant.
    pub merged_after: Option<DateTime<Utc>>,
}

/// One page of a merged-pull search.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchPage {
    /// Total result count reported by the upstream, across all pages.
    pub total_count: u64,
    /// Pull request numbers on this page, newest merge first. Entries that
    /// are not pull requests have already been filtered out.
    pub numbers: Vec<i32>,
}

/// Full detail record of one pull request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullDetail {
    /// Upstream numeric id.
    pub id: i64,
    /// Sequence number within the repository.
    pub number: i32,
    pub title: String,
    pub body: Option<String>,
    /// Author login.
    pub author: Option<String>,
    pub html_url: Option<String>,
    /// Lifecycle state tag (open/closed).
    pub state: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub closed_at: Option<DateTime<Utc>>,
    /// Non-null only for merged pulls; details without it are never stored.
    pub merged_at: Option<DateTime<Utc>>,
    pub changed_files: Option<i32>,
    pub additions: Option<i32>,
    pub deletions: Option<i32>,
    pub commit_count: Option<i32>,
}

impl PullDetail {
    /// Whether this detail record is eligible for persistence.
    pub fn is_merged(&self) -> bool {
        self.merged_at.is_some()
    }
}

/// One commit of a pull request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullCommit {
    pub sha: String,
    /// First line of the commit message; may be empty when the upstream
    /// message was empty, in which case the row is dropped before insertion.
    pub subject: String,
    pub author: Option<String>,
    pub committed_at: Option<DateTime<Utc>>,
}

/// One changed file of a pull request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullFile {
    pub filename: String,
    pub status: Option<String>,
    pub additions: Option<i32>,
    pub deletions: Option<i32>,
    pub changes: Option<i32>,
}
