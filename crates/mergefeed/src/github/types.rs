//! Raw GitHub API payload shapes.
//!
//! These mirror the subset of the REST responses the client consumes. They
//! stay inside the `github` module; the rest of the crate only sees the
//! converted [`crate::upstream::types`] records.

use chrono::{DateTime, Utc};
use serde::Deserialize;

/// Response of `GET /search/issues`.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchIssuesResponse {
    pub total_count: u64,
    #[serde(default)]
    pub incomplete_results: bool,
    #[serde(default)]
    pub items: Vec<SearchIssue>,
}

/// One search result. Issues and pull requests share the endpoint; only
/// entries carrying the `pull_request` marker are pull requests.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchIssue {
    pub number: i32,
    pub pull_request: Option<SearchIssuePullRequest>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchIssuePullRequest {
    pub url: Option<String>,
}

/// Response of `GET /repos/{owner}/{repo}/pulls/{number}`.
#[derive(Debug, Clone, Deserialize)]
pub struct RawPullDetail {
    pub id: i64,
    pub number: i32,
    pub title: Option<String>,
    pub body: Option<String>,
    pub user: Option<RawUser>,
    pub html_url: Option<String>,
    pub state: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub closed_at: Option<DateTime<Utc>>,
    pub merged_at: Option<DateTime<Utc>>,
    pub changed_files: Option<i32>,
    pub additions: Option<i32>,
    pub deletions: Option<i32>,
    pub commits: Option<i32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawUser {
    pub login: Option<String>,
}

/// One element of `GET /repos/{owner}/{repo}/pulls/{number}/commits`.
#[derive(Debug, Clone, Deserialize)]
pub struct RawPullCommit {
    pub sha: Option<String>,
    pub commit: Option<RawCommitInfo>,
    pub author: Option<RawUser>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawCommitInfo {
    pub message: Option<String>,
    pub author: Option<RawGitActor>,
    pub committer: Option<RawGitActor>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawGitActor {
    pub name: Option<String>,
    pub date: Option<DateTime<Utc>>,
}

/// One element of `GET /repos/{owner}/{repo}/pulls/{number}/files`.
#[derive(Debug, Clone, Deserialize)]
pub struct RawPullFile {
    pub filename: Option<String>,
    pub status: Option<String>,
    pub additions: Option<i32>,
    pub deletions: Option<i32>,
    pub changes: Option<i32>,
}
