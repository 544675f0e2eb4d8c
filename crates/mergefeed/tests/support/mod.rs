//! Shared test support: an in-memory database setup and a deterministic fake
//! upstream client.
#![allow(dead_code)]

use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use sea_orm::{DatabaseConnection, EntityTrait, Set};
use uuid::Uuid;

use mergefeed::connect_and_migrate;
use mergefeed::entity::repository::{ActiveModel as RepositoryActiveModel, Model as RepositoryModel};
use mergefeed::upstream::{
    MergedSearchFilter, PullCommit, PullDetail, PullFile, SearchPage, UpstreamClient,
    UpstreamError,
};

/// Create an in-memory SQLite database with migrations applied and one
/// repository row to sync against.
pub async fn setup_db_with_repository() -> (DatabaseConnection, RepositoryModel) {
    let db = connect_and_migrate("sqlite::memory:")
        .await
        .expect("test db should migrate");

    let id = Uuid::new_v4();
    let repository = RepositoryActiveModel {
        id: Set(id),
        github_repo_id: Set(4242),
        name: Set("hello-world".to_string()),
        full_name: Set("octocat/hello-world".to_string()),
        html_url: Set(None),
        is_private: Set(false),
        last_synced_merged_at: Set(None),
        created_at: Set(Utc::now().fixed_offset()),
    };
    mergefeed::entity::prelude::Repository::insert(repository)
        .exec(&db)
        .await
        .expect("repository should insert");

    let repository = reload_repository(&db, id).await;
    (db, repository)
}

/// Reload the repository row (e.g. to observe the watermark).
pub async fn reload_repository(db: &DatabaseConnection, id: Uuid) -> RepositoryModel {
    mergefeed::entity::prelude::Repository::find_by_id(id)
        .one(db)
        .await
        .expect("repository query should succeed")
        .expect("repository row should exist")
}

/// Timestamp helper: whole seconds since the epoch.
pub fn ts(epoch: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(epoch, 0).single().expect("valid epoch")
}

#[derive(Default)]
struct FakeUpstreamInner {
    pulls: Mutex<BTreeMap<i32, PullDetail>>,
    commits: Mutex<BTreeMap<i32, Vec<PullCommit>>>,
    files: Mutex<BTreeMap<i32, Vec<PullFile>>>,
    failing_details: Mutex<HashSet<i32>>,
    fail_search: AtomicBool,
    search_calls: AtomicUsize,
    detail_calls: AtomicUsize,
}

/// Deterministic in-memory stand-in for the upstream API.
///
/// Search results are ordered newest merge first with the number as a
/// tie-breaker, matching the upstream contract the engines rely on.
#[derive(Clone, Default)]
pub struct FakeUpstream {
    inner: Arc<FakeUpstreamInner>,
}

impl FakeUpstream {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a merged pull request with the given merge time.
    pub fn add_merged(&self, number: i32, merged_epoch: i64) {
        self.add_detail(detail(number, Some(ts(merged_epoch))));
    }

    /// Add a pull request that was never merged.
    pub fn add_unmerged(&self, number: i32) {
        self.add_detail(detail(number, None));
    }

    pub fn add_detail(&self, detail: PullDetail) {
        let mut pulls = self.inner.pulls.lock().expect("pulls lock");
        pulls.insert(detail.number, detail);
    }

    pub fn set_commits(&self, number: i32, commits: Vec<PullCommit>) {
        self.inner
            .commits
            .lock()
            .expect("commits lock")
            .insert(number, commits);
    }

    pub fn set_files(&self, number: i32, files: Vec<PullFile>) {
        self.inner
            .files
            .lock()
            .expect("files lock")
            .insert(number, files);
    }

    /// Make detail fetches for this number fail with a transport error.
    pub fn fail_detail(&self, number: i32) {
        self.inner
            .failing_details
            .lock()
            .expect("failing lock")
            .insert(number);
    }

    /// Make every search call fail with a transport error.
    pub fn fail_search(&self) {
        self.inner.fail_search.store(true, Ordering::SeqCst);
    }

    pub fn search_calls(&self) -> usize {
        self.inner.search_calls.load(Ordering::SeqCst)
    }

    pub fn detail_calls(&self) -> usize {
        self.inner.detail_calls.load(Ordering::SeqCst)
    }
}

fn detail(number: i32, merged_at: Option<DateTime<Utc>>) -> PullDetail {
    PullDetail {
        id: 100_000 + i64::from(number),
        number,
        title: format!("pull #{number}"),
        body: Some(format!("body of #{number}")),
        author: Some("octocat".to_string()),
        html_url: Some(format!("https://example.com/pulls/{number}")),
        state: Some("closed".to_string()),
        created_at: merged_at,
        updated_at: merged_at,
        closed_at: merged_at,
        merged_at,
        changed_files: Some(1),
        additions: Some(5),
        deletions: Some(2),
        commit_count: Some(1),
    }
}

#[async_trait]
impl UpstreamClient for FakeUpstream {
    async fn search_merged(
        &self,
        _full_name: &str,
        filter: &MergedSearchFilter,
        page: u32,
        per_page: u32,
    ) -> Result<SearchPage, UpstreamError> {
        self.inner.search_calls.fetch_add(1, Ordering::SeqCst);
        if self.inner.fail_search.load(Ordering::SeqCst) {
            return Err(UpstreamError::api("search unavailable"));
        }

        let pulls = self.inner.pulls.lock().expect("pulls lock");
        let mut merged: Vec<(DateTime<Utc>, i32)> = pulls
            .values()
            .filter_map(|d| d.merged_at.map(|m| (m, d.number)))
            .filter(|(m, _)| filter.merged_before.is_none_or(|before| *m < before))
            .filter(|(m, _)| filter.merged_after.is_none_or(|after| *m >= after))
            .collect();
        merged.sort_by(|a, b| b.cmp(a));

        let total_count = merged.len() as u64;
        let start = (page.saturating_sub(1) * per_page) as usize;
        let numbers = merged
            .into_iter()
            .skip(start)
            .take(per_page as usize)
            .map(|(_, number)| number)
            .collect();

        Ok(SearchPage {
            total_count,
            numbers,
        })
    }

    async fn fetch_detail(
        &self,
        _full_name: &str,
        number: i32,
    ) -> Result<PullDetail, UpstreamError> {
        self.inner.detail_calls.fetch_add(1, Ordering::SeqCst);

        if self
            .inner
            .failing_details
            .lock()
            .expect("failing lock")
            .contains(&number)
        {
            return Err(UpstreamError::api("detail unavailable"));
        }

        self.inner
            .pulls
            .lock()
            .expect("pulls lock")
            .get(&number)
            .cloned()
            .ok_or_else(|| UpstreamError::not_found(format!("pull {number}")))
    }

    async fn fetch_commits(
        &self,
        _full_name: &str,
        number: i32,
        max: usize,
    ) -> Result<Vec<PullCommit>, UpstreamError> {
        let mut commits = self
            .inner
            .commits
            .lock()
            .expect("commits lock")
            .get(&number)
            .cloned()
            .unwrap_or_default();
        commits.truncate(max);
        Ok(commits)
    }

    async fn fetch_files(
        &self,
        _full_name: &str,
        number: i32,
        max: usize,
    ) -> Result<Vec<PullFile>, UpstreamError> {
        let mut files = self
            .inner
            .files
            .lock()
            .expect("files lock")
            .get(&number)
            .cloned()
            .unwrap_or_default();
        files.truncate(max);
        Ok(files)
    }
}
