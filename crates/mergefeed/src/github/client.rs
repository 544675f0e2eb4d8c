//! GitHub API client implementing the upstream boundary.

use std::sync::Arc;

use async_trait::async_trait;
use octocrab::Octocrab;
use serde::Serialize;

use crate::retry::with_retry;
use crate::upstream::{
    MergedSearchFilter, PullCommit, PullDetail, PullFile, SearchPage, UpstreamClient,
    UpstreamError,
};

use super::convert::{
    build_search_query, to_pull_commit, to_pull_detail, to_pull_file, to_search_page,
};
use super::error::{classify, is_rate_limit_error};
use super::types::{RawPullCommit, RawPullDetail, RawPullFile, SearchIssuesResponse};

#[derive(Serialize)]
struct SearchParams<'a> {
    q: &'a str,
    per_page: u32,
    page: u32,
}

#[derive(Serialize)]
struct PageParams {
    per_page: u32,
    page: u32,
}

/// GitHub API client.
///
/// Wraps an `Octocrab` instance authenticated with a member's token.
/// Rate-limited calls are retried with backoff inside each method, so the
/// sync engines only see terminal outcomes.
#[derive(Clone)]
pub struct GitHubClient {
    inner: Arc<Octocrab>,
}

impl GitHubClient {
    /// Create a client from a personal access token.
    pub fn new(token: &str) -> Result<Self, UpstreamError> {
        let client = Octocrab::builder()
            .personal_token(token.to_string())
            .build()
            .map_err(|e| classify(e, "client setup"))?;
        Ok(Self {
            inner: Arc::new(client),
        })
    }

    /// Create a client from an existing Octocrab instance.
    pub fn from_octocrab(client: Octocrab) -> Self {
        Self {
            inner: Arc::new(client),
        }
    }

    async fn get_with_retry<T, P>(
        &self,
        route: String,
        params: Option<&P>,
        resource: &str,
    ) -> Result<T, UpstreamError>
    where
        T: serde::de::DeserializeOwned,
        P: Serialize + ?Sized + Sync,
    {
        let client = Arc::clone(&self.inner);
        let route_ref = &route;
        with_retry(
            move || {
                let client = Arc::clone(&client);
                async move { client.get::<T, _, P>(route_ref, params).await }
            },
            is_rate_limit_error,
            resource,
        )
        .await
        .map_err(|e| classify(e, resource))
    }
}

#[async_trait]
impl UpstreamClient for GitHubClient {
    async fn search_merged(
        &self,
        full_name: &str,
        filter: &MergedSearchFilter,
        page: u32,
        per_page: u32,
    ) -> Result<SearchPage, UpstreamError> {
        let q = build_search_query(full_name, filter);
        let params = SearchParams {
            q: &q,
            per_page,
            page,
        };

        let response: SearchIssuesResponse = self
            .get_with_retry(
                "/search/issues".to_string(),
                Some(&params),
                "merged pull search",
            )
            .await?;

        Ok(to_search_page(response))
    }

    async fn fetch_detail(&self, full_name: &str, number: i32) -> Result<PullDetail, UpstreamError> {
        let raw: RawPullDetail = self
            .get_with_retry(
                format!("/repos/{full_name}/pulls/{number}"),
                None::<&()>,
                "pull detail",
            )
            .await?;

        Ok(to_pull_detail(raw))
    }

    async fn fetch_commits(
        &self,
        full_name: &str,
        number: i32,
        max: usize,
    ) -> Result<Vec<PullCommit>, UpstreamError> {
        let params = PageParams {
            per_page: max.clamp(1, 100) as u32,
            page: 1,
        };
        let raw: Vec<RawPullCommit> = self
            .get_with_retry(
                format!("/repos/{full_name}/pulls/{number}/commits"),
                Some(&params),
                "pull commits",
            )
            .await?;

        Ok(raw.into_iter().take(max).map(to_pull_commit).collect())
    }

    async fn fetch_files(
        &self,
        full_name: &str,
        number: i32,
        max: usize,
    ) -> Result<Vec<PullFile>, UpstreamError> {
        let params = PageParams {
            per_page: max.clamp(1, 100) as u32,
            page: 1,
        };
        let raw: Vec<RawPullFile> = self
            .get_with_retry(
                format!("/repos/{full_name}/pulls/{number}/files"),
                Some(&params),
                "pull files",
            )
            .await?;

        Ok(raw.into_iter().take(max).map(to_pull_file).collect())
    }
}
