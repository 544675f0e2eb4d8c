//! Streaming wrappers over the page reader and forward sync.
//!
//! Long-lived clients get incremental visibility: already-cached rows are
//! emitted before any upstream work starts, and sync progress arrives one
//! event per persisted candidate. Counts are folded in each call's local
//! state - no shared counters across concurrent stream invocations.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use sea_orm::DatabaseConnection;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::entity::repository::Model as RepositoryModel;
use crate::store::{self, PageCursor};
use crate::upstream::{MergedSearchFilter, UpstreamClient};

use super::engine::{collect_candidates, older_than_boundary};
use super::errors::SyncError;
use super::events::{ItemSource, PageEvent, SyncEvent};
use super::pipeline;
use super::types::SEARCH_PAGE_SIZE;

/// Per-stream fold state for a paged read.
struct PageStreamState {
    sent_ids: HashSet<Uuid>,
    sent: usize,
    has_more: bool,
    /// Receiver dropped; stop producing, the operation is cancelled.
    closed: bool,
}

/// Stream one page of merged pull requests.
///
/// Event order: `Start` → `Item`* → `Cursor` → `End`. Cached rows are
/// emitted first; on a shortfall each candidate from the upstream search is
/// upserted one at a time and newly-visible rows are emitted as soon as the
/// store shows them. A dropped receiver ends the stream early with `Ok(())`;
/// unrecoverable errors are returned to the caller, who surfaces them as a
/// stream-level failure.
pub async fn stream_page<C>(
    db: &DatabaseConnection,
    client: &C,
    repository: &RepositoryModel,
    limit: usize,
    cursor: Option<PageCursor>,
    tx: mpsc::Sender<PageEvent>,
) -> Result<(), SyncError>
where
    C: UpstreamClient,
{
    if limit == 0 {
        return Err(SyncError::invalid_input("limit must be at least 1"));
    }

    let target = limit + 1;
    if tx.send(PageEvent::Start).await.is_err() {
        return Ok(());
    }

    let mut state = PageStreamState {
        sent_ids: HashSet::new(),
        sent: 0,
        has_more: false,
        closed: false,
    };

    // Everything already cached goes out before any upstream call.
    let cached =
        emit_visible(db, repository.id, target, limit, cursor.as_ref(), &tx, &mut state,
            ItemSource::Store)
        .await?;

    if !state.has_more && !state.closed {
        let merged_before = older_than_boundary(&cached, cursor.as_ref());
        let filter = MergedSearchFilter {
            merged_before,
            merged_after: None,
        };
        let per_page = target.clamp(1, SEARCH_PAGE_SIZE as usize) as u32;

        // Search failures are fatal, exactly as in the non-streaming path.
        let page = client
            .search_merged(&repository.full_name, &filter, 1, per_page)
            .await?;

        let mut seen = HashSet::new();
        for number in page.numbers.into_iter().filter(|n| seen.insert(*n)) {
            if state.closed || state.has_more {
                break;
            }

            match pipeline::upsert_single(db, client, repository.id, &repository.full_name, number)
                .await
            {
                Ok(_) => {}
                Err(SyncError::Upstream(e)) => {
                    tracing::debug!(number, error = %e, "dropping pull after failed refresh");
                    continue;
                }
                Err(e) => return Err(e),
            }

            emit_visible(db, repository.id, target, limit, cursor.as_ref(), &tx, &mut state,
                ItemSource::Upstream)
            .await?;
        }

        store::advance_watermark(db, repository.id).await?;

        let refreshed = store::fetch_page(db, repository.id, target, cursor.as_ref()).await?;
        if refreshed.len() > limit {
            state.has_more = true;
        }
    }

    let mut rows = store::fetch_page(db, repository.id, target, cursor.as_ref()).await?;
    rows.truncate(limit);
    let next_cursor = rows.last().and_then(PageCursor::after);

    if tx
        .send(PageEvent::Cursor {
            next_cursor,
            has_more: state.has_more,
        })
        .await
        .is_err()
    {
        return Ok(());
    }
    let _ = tx.send(PageEvent::End { total: state.sent }).await;

    Ok(())
}

/// Re-query the page and emit rows not yet seen by this stream.
///
/// Returns the freshly-read page so the caller can derive the backfill
/// boundary from it.
#[allow(clippy::too_many_arguments)]
async fn emit_visible(
    db: &DatabaseConnection,
    repository_id: Uuid,
    target: usize,
    limit: usize,
    cursor: Option<&PageCursor>,
    tx: &mpsc::Sender<PageEvent>,
    state: &mut PageStreamState,
    source: ItemSource,
) -> Result<Vec<crate::entity::pull_request::Model>, SyncError> {
    let rows = store::fetch_page(db, repository_id, target, cursor).await?;

    if rows.len() > limit {
        state.has_more = true;
    }

    for row in &rows {
        if state.closed {
            break;
        }
        if state.sent_ids.contains(&row.id) {
            continue;
        }
        if state.sent >= limit {
            state.has_more = true;
            break;
        }

        state.sent += 1;
        state.sent_ids.insert(row.id);

        if tx
            .send(PageEvent::Item {
                item: row.clone(),
                sent: state.sent,
                source,
            })
            .await
            .is_err()
        {
            state.closed = true;
        }
    }

    Ok(rows)
}

/// Stream a forward sync.
///
/// Event order: `Start` → `Progress`* → `End`. Candidates are processed
/// sequentially in ascending number order so progress events match
/// processing order; the bounded fetch pool is deliberately not used here.
pub async fn stream_sync_forward<C>(
    db: &DatabaseConnection,
    client: &C,
    repository: &RepositoryModel,
    tx: mpsc::Sender<SyncEvent>,
) -> Result<(), SyncError>
where
    C: UpstreamClient,
{
    let watermark_before: Option<DateTime<Utc>> = repository
        .last_synced_merged_at
        .map(|t| t.with_timezone(&Utc));

    let candidates = collect_candidates(client, &repository.full_name, watermark_before).await?;
    let total = candidates.len();

    if tx
        .send(SyncEvent::Start {
            watermark: watermark_before,
            candidates: total,
        })
        .await
        .is_err()
    {
        return Ok(());
    }

    if candidates.is_empty() {
        let _ = tx
            .send(SyncEvent::End {
                synced: 0,
                total: 0,
                watermark_before,
                watermark_after: watermark_before,
            })
            .await;
        return Ok(());
    }

    let mut synced = 0usize;
    for number in candidates {
        match pipeline::upsert_single(db, client, repository.id, &repository.full_name, number)
            .await
        {
            Ok(Some(item)) => {
                synced += 1;
                if tx
                    .send(SyncEvent::Progress {
                        synced,
                        total,
                        number,
                        item,
                    })
                    .await
                    .is_err()
                {
                    return Ok(());
                }
            }
            // Not merged: silently excluded from persistence.
            Ok(None) => {}
            Err(SyncError::Upstream(e)) => {
                tracing::debug!(number, error = %e, "dropping candidate after failed fetch");
            }
            Err(e) => return Err(e),
        }
    }

    let watermark_after = store::advance_watermark(db, repository.id)
        .await?
        .map(|t| t.with_timezone(&Utc));

    let _ = tx
        .send(SyncEvent::End {
            synced,
            total,
            watermark_before,
            watermark_after,
        })
        .await;

    Ok(())
}
