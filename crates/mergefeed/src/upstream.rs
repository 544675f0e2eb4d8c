//! Upstream client boundary.
//!
//! Everything the sync engines know about the upstream source lives behind
//! the [`UpstreamClient`] trait: a date-scoped search for merged items, a
//! single-item detail fetch, and the two child-collection fetches. Responses
//! cross this boundary only as the explicit record shapes in [`types`] -
//! never as raw JSON maps.

mod errors;
mod types;

use async_trait::async_trait;

pub use errors::{Result, UpstreamError};
pub use types::{MergedSearchFilter, PullCommit, PullDetail, PullFile, SearchPage};

/// A client for the upstream source of merged pull requests.
///
/// Implementations are responsible for authentication and transport; retries
/// of rate-limited calls happen inside the implementation so callers see a
/// single terminal result per call.
#[async_trait]
pub trait UpstreamClient: Send + Sync {
    /// Search merged pull requests of `full_name`, scoped by the filter's
    /// merge-time bounds. `merged_before` is exclusive (`<`), `merged_after`
    /// is inclusive (`>=`); the asymmetry is part of the contract and callers
    /// rely on it.
    async fn search_merged(
        &self,
        full_name: &str,
        filter: &MergedSearchFilter,
        page: u32,
        per_page: u32,
    ) -> Result<SearchPage>;

    /// Fetch the full detail record of one pull request.
    async fn fetch_detail(&self, full_name: &str, number: i32) -> Result<PullDetail>;

    /// Fetch up to `max` commits of one pull request.
    async fn fetch_commits(&self, full_name: &str, number: i32, max: usize)
    -> Result<Vec<PullCommit>>;

    /// Fetch up to `max` changed files of one pull request.
    async fn fetch_files(&self, full_name: &str, number: i32, max: usize) -> Result<Vec<PullFile>>;
}
