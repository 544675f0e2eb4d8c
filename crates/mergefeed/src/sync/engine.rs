//! The read-through page reader, backfill engine, and forward sync engine.

use std::collections::{BTreeSet, HashSet};

use chrono::{DateTime, Utc};
use sea_orm::DatabaseConnection;

use crate::entity::pull_request::Model as PullRequestModel;
use crate::entity::repository::Model as RepositoryModel;
use crate::store::{self, PageCursor};
use crate::upstream::{MergedSearchFilter, UpstreamClient};

use super::errors::SyncError;
use super::pipeline;
use super::types::{ForwardSyncReport, MAX_SEARCH_PAGES, PageReadResult, SEARCH_PAGE_SIZE};

/// Serve one page of merged pull requests, backfilling from upstream on a
/// cache miss.
///
/// The store is asked for `limit + 1` rows; an overflow row proves more data
/// exists without a count query. On a shortfall the backfill engine extends
/// the cache backward in time from the current frontier and the page query
/// runs again. A page that is still short after backfill means the upstream
/// genuinely has no more items - a terminal condition, not an error.
#[tracing::instrument(skip(db, client, repository), fields(repository = %repository.full_name))]
pub async fn read_page<C>(
    db: &DatabaseConnection,
    client: &C,
    repository: &RepositoryModel,
    limit: usize,
    cursor: Option<PageCursor>,
) -> Result<PageReadResult, SyncError>
where
    C: UpstreamClient + Clone + 'static,
{
    if limit == 0 {
        return Err(SyncError::invalid_input("limit must be at least 1"));
    }

    let target = limit + 1;
    let mut rows = store::fetch_page(db, repository.id, target, cursor.as_ref()).await?;

    if rows.len() < target {
        let before = older_than_boundary(&rows, cursor.as_ref());
        backfill_older(db, client, repository, before, target).await?;
        rows = store::fetch_page(db, repository.id, target, cursor.as_ref()).await?;
    }

    let has_more = rows.len() > limit;
    rows.truncate(limit);
    let next_cursor = rows.last().and_then(PageCursor::after);

    Ok(PageReadResult {
        items: rows,
        next_cursor,
        has_more,
    })
}

/// Catch newly merged pull requests since the watermark.
///
/// Walks the upstream search forward from the watermark (inclusive),
/// deduplicates candidates, persists them through the bulk pipeline, and
/// advances the watermark from store contents. This is the only path that
/// discovers items merged after the most recent cached one.
#[tracing::instrument(skip(db, client, repository), fields(repository = %repository.full_name))]
pub async fn sync_forward<C>(
    db: &DatabaseConnection,
    client: &C,
    repository: &RepositoryModel,
) -> Result<ForwardSyncReport, SyncError>
where
    C: UpstreamClient + Clone + 'static,
{
    let watermark_before = repository
        .last_synced_merged_at
        .map(|t| t.with_timezone(&Utc));

    let candidates = collect_candidates(client, &repository.full_name, watermark_before).await?;
    if candidates.is_empty() {
        return Ok(ForwardSyncReport {
            candidate_count: 0,
            synced_count: 0,
            watermark_before,
            watermark_after: watermark_before,
        });
    }

    let details =
        pipeline::fetch_details_bulk(client, &repository.full_name, &candidates).await;
    let synced_count =
        pipeline::upsert_details(db, client, repository.id, &repository.full_name, details).await?;

    let watermark_after = store::advance_watermark(db, repository.id)
        .await?
        .map(|t| t.with_timezone(&Utc));

    tracing::info!(
        candidates = candidates.len(),
        synced = synced_count,
        "forward sync complete"
    );

    Ok(ForwardSyncReport {
        candidate_count: candidates.len(),
        synced_count,
        watermark_before,
        watermark_after,
    })
}

/// Explicitly refresh one pull request from upstream.
///
/// Returns `Ok(None)` when the item is not merged - "nothing to do", the
/// store is untouched.
#[tracing::instrument(skip(db, client, repository), fields(repository = %repository.full_name))]
pub async fn refresh_one<C>(
    db: &DatabaseConnection,
    client: &C,
    repository: &RepositoryModel,
    number: i32,
) -> Result<Option<PullRequestModel>, SyncError>
where
    C: UpstreamClient,
{
    if number < 1 {
        return Err(SyncError::invalid_input("pull request number must be positive"));
    }

    pipeline::upsert_single(db, client, repository.id, &repository.full_name, number).await
}

/// The exclusive "older than" bound for a backfill, per the shortfall rule:
/// the oldest row already found for this page, else the cursor's timestamp,
/// else unbounded.
pub(crate) fn older_than_boundary(
    rows: &[PullRequestModel],
    cursor: Option<&PageCursor>,
) -> Option<DateTime<Utc>> {
    rows.last()
        .and_then(|model| model.merged_at_github)
        .map(|t| t.with_timezone(&Utc))
        .or(cursor.map(|cursor| cursor.merged_at))
}

/// Backfill the cache backward in time from the given boundary.
///
/// Search failures are fatal: swallowing them would silently serve an
/// incomplete page as if the upstream had no more data.
pub(crate) async fn backfill_older<C>(
    db: &DatabaseConnection,
    client: &C,
    repository: &RepositoryModel,
    merged_before: Option<DateTime<Utc>>,
    target: usize,
) -> Result<(), SyncError>
where
    C: UpstreamClient + Clone + 'static,
{
    let per_page = target.clamp(1, SEARCH_PAGE_SIZE as usize) as u32;
    let filter = MergedSearchFilter {
        merged_before,
        merged_after: None,
    };

    let page = client
        .search_merged(&repository.full_name, &filter, 1, per_page)
        .await?;

    let mut seen = HashSet::new();
    let numbers: Vec<i32> = page
        .numbers
        .into_iter()
        .filter(|number| seen.insert(*number))
        .collect();

    if numbers.is_empty() {
        return Ok(());
    }

    tracing::debug!(
        count = numbers.len(),
        ?merged_before,
        "backfilling older pulls"
    );

    let details = pipeline::fetch_details_bulk(client, &repository.full_name, &numbers).await;
    pipeline::upsert_details(db, client, repository.id, &repository.full_name, details).await?;
    store::advance_watermark(db, repository.id).await?;

    Ok(())
}

/// Page through the upstream search for candidates merged at or after the
/// watermark.
///
/// Stops on a short page or after [`MAX_SEARCH_PAGES`] pages. Returns the
/// deduplicated candidate numbers in ascending order.
pub(crate) async fn collect_candidates<C>(
    client: &C,
    full_name: &str,
    merged_after: Option<DateTime<Utc>>,
) -> Result<Vec<i32>, SyncError>
where
    C: UpstreamClient,
{
    let filter = MergedSearchFilter {
        merged_before: None,
        merged_after,
    };

    let mut candidates: BTreeSet<i32> = BTreeSet::new();
    for page in 1..=MAX_SEARCH_PAGES {
        let result = client
            .search_merged(full_name, &filter, page, SEARCH_PAGE_SIZE)
            .await?;
        let page_count = result.numbers.len();
        candidates.extend(result.numbers);

        if page_count < SEARCH_PAGE_SIZE as usize {
            break;
        }
    }

    Ok(candidates.into_iter().collect())
}
