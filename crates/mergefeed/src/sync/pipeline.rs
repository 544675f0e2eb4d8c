//! Shared upsert pipeline.
//!
//! Both engines persist through this module: bulk mode fetches details with a
//! bounded worker pool and writes them in one grouped upsert, single mode
//! refreshes exactly one pull request. Child rows (commits, files) are always
//! replaced wholesale per parent; between the parent upsert and its child
//! replace there is a short window where a reader can observe the new detail
//! record with the previous child set. That window is accepted - child rows
//! are not diffed.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use sea_orm::{DatabaseConnection, Set};
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::entity::pull_request::{ActiveModel, Model};
use crate::entity::pull_request_commit::ActiveModel as CommitActiveModel;
use crate::entity::pull_request_file::ActiveModel as FileActiveModel;
use crate::store;
use crate::upstream::{PullCommit, PullDetail, PullFile, UpstreamClient};

use super::errors::SyncError;
use super::types::{
    CHILD_FETCH_CONCURRENCY, DETAIL_FETCH_CONCURRENCY, MAX_COMMITS_PER_PULL, MAX_FILES_PER_PULL,
};

/// Convert a detail record into an upsertable row.
///
/// Returns None for non-merged details: they are discarded, never stored.
pub(crate) fn detail_to_active_model(
    repository_id: Uuid,
    detail: &PullDetail,
) -> Option<ActiveModel> {
    let merged_at = detail.merged_at?;

    Some(ActiveModel {
        id: Set(Uuid::new_v4()),
        repository_id: Set(repository_id),
        github_pr_id: Set(detail.id),
        number: Set(detail.number),
        title: Set(detail.title.clone()),
        body: Set(detail.body.clone()),
        author: Set(detail.author.clone()),
        html_url: Set(detail.html_url.clone()),
        state: Set(detail.state.clone()),
        created_at_github: Set(detail.created_at.map(|t| t.fixed_offset())),
        updated_at_github: Set(detail.updated_at.map(|t| t.fixed_offset())),
        closed_at_github: Set(detail.closed_at.map(|t| t.fixed_offset())),
        merged_at_github: Set(Some(merged_at.fixed_offset())),
        changed_files: Set(detail.changed_files),
        additions: Set(detail.additions),
        deletions: Set(detail.deletions),
        commit_count: Set(detail.commit_count),
    })
}

/// Build commit rows for one parent, dropping rows with an empty subject.
pub(crate) fn commit_rows(
    pull_request_id: Uuid,
    commits: Vec<PullCommit>,
) -> Vec<CommitActiveModel> {
    commits
        .into_iter()
        .filter(|commit| !commit.subject.is_empty())
        .map(|commit| CommitActiveModel {
            id: Set(Uuid::new_v4()),
            pull_request_id: Set(pull_request_id),
            sha: Set(commit.sha),
            subject: Set(commit.subject),
            author: Set(commit.author),
            committed_at_github: Set(commit.committed_at.map(|t| t.fixed_offset())),
        })
        .collect()
}

/// Build file rows for one parent, dropping rows with an empty filename.
pub(crate) fn file_rows(pull_request_id: Uuid, files: Vec<PullFile>) -> Vec<FileActiveModel> {
    files
        .into_iter()
        .filter(|file| !file.filename.is_empty())
        .map(|file| FileActiveModel {
            id: Set(Uuid::new_v4()),
            pull_request_id: Set(pull_request_id),
            filename: Set(file.filename),
            status: Set(file.status),
            additions: Set(file.additions),
            deletions: Set(file.deletions),
            changes: Set(file.changes),
        })
        .collect()
}

/// Fetch detail records for a deduplicated number list with a bounded pool.
///
/// A fixed number of workers claim distinct numbers from a shared queue and
/// push results into a channel; completion order is not guaranteed. A failed
/// fetch drops that number from the batch - best-effort semantics, one bad
/// item never aborts the batch.
pub async fn fetch_details_bulk<C>(client: &C, full_name: &str, numbers: &[i32]) -> Vec<PullDetail>
where
    C: UpstreamClient + Clone + 'static,
{
    if numbers.is_empty() {
        return Vec::new();
    }

    let queue: Arc<Mutex<VecDeque<i32>>> =
        Arc::new(Mutex::new(numbers.iter().copied().collect()));
    let (tx, mut rx) = mpsc::channel::<PullDetail>(numbers.len());

    let worker_count = DETAIL_FETCH_CONCURRENCY.min(numbers.len());
    let mut handles = Vec::with_capacity(worker_count);

    for _ in 0..worker_count {
        let client = client.clone();
        let queue = Arc::clone(&queue);
        let tx = tx.clone();
        let full_name = full_name.to_string();

        handles.push(tokio::spawn(async move {
            loop {
                let number = {
                    let mut queue = queue.lock().unwrap_or_else(|e| e.into_inner());
                    queue.pop_front()
                };
                let Some(number) = number else { break };

                match client.fetch_detail(&full_name, number).await {
                    Ok(detail) => {
                        if tx.send(detail).await.is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        tracing::debug!(number, error = %e, "dropping pull after failed detail fetch");
                    }
                }
            }
        }));
    }
    drop(tx);

    let mut details = Vec::with_capacity(numbers.len());
    while let Some(detail) = rx.recv().await {
        details.push(detail);
    }

    for handle in handles {
        if let Err(e) = handle.await {
            tracing::warn!(error = %e, "detail fetch worker panicked");
        }
    }

    details
}

/// Persist a batch of detail records and replace their child rows.
///
/// Non-merged details are filtered out, the remainder lands in one grouped
/// upsert, then a bounded pool fetches commits and files per upserted row and
/// the main task replaces each parent's children sequentially. Returns the
/// number of pull requests persisted.
pub async fn upsert_details<C>(
    db: &DatabaseConnection,
    client: &C,
    repository_id: Uuid,
    full_name: &str,
    details: Vec<PullDetail>,
) -> Result<usize, SyncError>
where
    C: UpstreamClient + Clone + 'static,
{
    let models: Vec<ActiveModel> = details
        .iter()
        .filter_map(|detail| detail_to_active_model(repository_id, detail))
        .collect();

    if models.is_empty() {
        return Ok(0);
    }

    let persisted = store::upsert_pulls_with_retry(
        db,
        models,
        store::DEFAULT_UPSERT_RETRIES,
        store::DEFAULT_UPSERT_BACKOFF_MS,
    )
    .await? as usize;

    let numbers: Vec<i32> = details
        .iter()
        .filter(|detail| detail.is_merged())
        .map(|detail| detail.number)
        .collect();
    let stored = store::find_by_numbers(db, repository_id, &numbers).await?;

    replace_children_bulk(db, client, full_name, &stored).await?;

    Ok(persisted)
}

/// Fetch and replace child rows for a set of freshly-upserted parents.
///
/// Fetch workers claim distinct parents from a shared queue and fetch commits
/// and files concurrently; the main task applies each parent's replace as
/// results arrive, so two parents' replaces never interleave.
async fn replace_children_bulk<C>(
    db: &DatabaseConnection,
    client: &C,
    full_name: &str,
    parents: &[Model],
) -> Result<(), SyncError>
where
    C: UpstreamClient + Clone + 'static,
{
    if parents.is_empty() {
        return Ok(());
    }

    let queue: Arc<Mutex<VecDeque<(Uuid, i32)>>> = Arc::new(Mutex::new(
        parents.iter().map(|model| (model.id, model.number)).collect(),
    ));
    let (tx, mut rx) = mpsc::channel::<(Uuid, Vec<PullCommit>, Vec<PullFile>)>(parents.len());

    let worker_count = CHILD_FETCH_CONCURRENCY.min(parents.len());
    let mut handles = Vec::with_capacity(worker_count);

    for _ in 0..worker_count {
        let client = client.clone();
        let queue = Arc::clone(&queue);
        let tx = tx.clone();
        let full_name = full_name.to_string();

        handles.push(tokio::spawn(async move {
            loop {
                let claim = {
                    let mut queue = queue.lock().unwrap_or_else(|e| e.into_inner());
                    queue.pop_front()
                };
                let Some((pull_request_id, number)) = claim else { break };

                let (commits, files) = tokio::join!(
                    client.fetch_commits(&full_name, number, MAX_COMMITS_PER_PULL),
                    client.fetch_files(&full_name, number, MAX_FILES_PER_PULL),
                );

                // Child fetch failures are non-fatal: the set is treated as
                // empty and the next upsert of this parent re-fetches it.
                let commits = commits.unwrap_or_else(|e| {
                    tracing::debug!(number, error = %e, "commit fetch failed, replacing with empty set");
                    Vec::new()
                });
                let files = files.unwrap_or_else(|e| {
                    tracing::debug!(number, error = %e, "file fetch failed, replacing with empty set");
                    Vec::new()
                });

                if tx.send((pull_request_id, commits, files)).await.is_err() {
                    break;
                }
            }
        }));
    }
    drop(tx);

    while let Some((pull_request_id, commits, files)) = rx.recv().await {
        store::replace_children(
            db,
            pull_request_id,
            commit_rows(pull_request_id, commits),
            file_rows(pull_request_id, files),
        )
        .await?;
    }

    for handle in handles {
        if let Err(e) = handle.await {
            tracing::warn!(error = %e, "child fetch worker panicked");
        }
    }

    Ok(())
}

/// Refresh exactly one pull request.
///
/// Returns `Ok(None)` when the upstream detail carries no merge timestamp -
/// nothing to do, the store is left untouched. Otherwise the row is upserted
/// and its children replaced, and the refreshed model is returned.
pub async fn upsert_single<C>(
    db: &DatabaseConnection,
    client: &C,
    repository_id: Uuid,
    full_name: &str,
    number: i32,
) -> Result<Option<Model>, SyncError>
where
    C: UpstreamClient,
{
    let detail = client.fetch_detail(full_name, number).await?;

    let Some(model) = detail_to_active_model(repository_id, &detail) else {
        return Ok(None);
    };

    store::upsert_pulls_with_retry(
        db,
        vec![model],
        store::DEFAULT_UPSERT_RETRIES,
        store::DEFAULT_UPSERT_BACKOFF_MS,
    )
    .await?;

    let stored = store::find_by_number(db, repository_id, number)
        .await?
        .ok_or_else(|| {
            store::StoreError::not_found(format!("pull request number={number} after upsert"))
        })?;

    let (commits, files) = tokio::join!(
        client.fetch_commits(full_name, number, MAX_COMMITS_PER_PULL),
        client.fetch_files(full_name, number, MAX_FILES_PER_PULL),
    );
    let commits = commits.unwrap_or_else(|e| {
        tracing::debug!(number, error = %e, "commit fetch failed, replacing with empty set");
        Vec::new()
    });
    let files = files.unwrap_or_else(|e| {
        tracing::debug!(number, error = %e, "file fetch failed, replacing with empty set");
        Vec::new()
    });

    store::replace_children(
        db,
        stored.id,
        commit_rows(stored.id, commits),
        file_rows(stored.id, files),
    )
    .await?;

    Ok(Some(stored))
}
