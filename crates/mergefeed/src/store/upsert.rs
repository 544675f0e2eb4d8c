use sea_orm::{
    ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, TransactionTrait,
    sea_query::OnConflict,
};
use uuid::Uuid;

use crate::entity::pull_request::{ActiveModel, Column, Entity as PullRequest, Model};
use crate::entity::pull_request_commit::{
    ActiveModel as CommitActiveModel, Column as CommitColumn, Entity as PullRequestCommit,
};
use crate::entity::pull_request_file::{
    ActiveModel as FileActiveModel, Column as FileColumn, Entity as PullRequestFile,
};

use super::errors::{Result, StoreError};

/// Default number of retry attempts for grouped upserts.
pub const DEFAULT_UPSERT_RETRIES: u32 = 3;

/// Default initial backoff delay in milliseconds for upsert retries.
pub const DEFAULT_UPSERT_BACKOFF_MS: u64 = 100;

/// Build the ON CONFLICT clause for pull request upserts.
///
/// The natural key is `(repository_id, github_pr_id)`; everything except the
/// internal id is overwritten so a re-fetch converges to upstream truth
/// (last-write-wins, the values are equivalent for equivalent fetches).
fn build_upsert_on_conflict() -> OnConflict {
    OnConflict::columns([Column::RepositoryId, Column::GithubPrId])
        .update_columns([
            Column::Number,
            Column::Title,
            Column::Body,
            Column::Author,
            Column::HtmlUrl,
            Column::State,
            Column::CreatedAtGithub,
            Column::UpdatedAtGithub,
            Column::ClosedAtGithub,
            Column::MergedAtGithub,
            Column::ChangedFiles,
            Column::Additions,
            Column::Deletions,
            Column::CommitCount,
        ])
        .to_owned()
}

/// Upsert a batch of pull requests in one grouped statement.
///
/// Existing rows (matched on the natural key) are mutated in place and keep
/// their internal id; new rows are inserted. Returns the number of rows
/// written.
pub async fn upsert_pulls(db: &DatabaseConnection, models: Vec<ActiveModel>) -> Result<u64> {
    if models.is_empty() {
        return Ok(0);
    }

    let count = models.len() as u64;
    PullRequest::insert_many(models)
        .on_conflict(build_upsert_on_conflict())
        .exec_without_returning(db)
        .await
        .map_err(StoreError::from)?;
    Ok(count)
}

/// Grouped upsert with retry on transient database errors.
///
/// Retries lock/connection failures with exponential backoff; anything else
/// fails immediately.
pub async fn upsert_pulls_with_retry(
    db: &DatabaseConnection,
    models: Vec<ActiveModel>,
    max_retries: u32,
    initial_backoff_ms: u64,
) -> Result<u64> {
    if models.is_empty() {
        return Ok(0);
    }

    tracing::debug!(count = models.len(), "upserting pull request batch");
    let mut backoff_ms = initial_backoff_ms;
    let mut attempt = 0;

    loop {
        match upsert_pulls(db, models.clone()).await {
            Ok(count) => return Ok(count),
            Err(e) if is_retryable_error(&e) && attempt < max_retries => {
                attempt += 1;
                tracing::warn!(
                    attempt,
                    max_retries,
                    backoff_ms,
                    error = %e,
                    "pull request upsert failed, retrying"
                );
                tokio::time::sleep(tokio::time::Duration::from_millis(backoff_ms)).await;
                backoff_ms *= 2;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Find stored pull requests by their human-facing numbers.
pub async fn find_by_numbers(
    db: &DatabaseConnection,
    repository_id: Uuid,
    numbers: &[i32],
) -> Result<Vec<Model>> {
    if numbers.is_empty() {
        return Ok(Vec::new());
    }

    PullRequest::find()
        .filter(Column::RepositoryId.eq(repository_id))
        .filter(Column::Number.is_in(numbers.iter().copied()))
        .all(db)
        .await
        .map_err(StoreError::from)
}

/// Find one stored pull request by its human-facing number.
pub async fn find_by_number(
    db: &DatabaseConnection,
    repository_id: Uuid,
    number: i32,
) -> Result<Option<Model>> {
    PullRequest::find()
        .filter(Column::RepositoryId.eq(repository_id))
        .filter(Column::Number.eq(number))
        .one(db)
        .await
        .map_err(StoreError::from)
}

/// Replace the full child-row set of one pull request.
///
/// Commits and files are deleted and re-inserted wholesale inside a single
/// transaction, so a cancelled caller can never leave one parent's replace
/// interleaved with another's. There is no incremental merge of child rows.
pub async fn replace_children(
    db: &DatabaseConnection,
    pull_request_id: Uuid,
    commits: Vec<CommitActiveModel>,
    files: Vec<FileActiveModel>,
) -> Result<()> {
    let txn = db.begin().await?;

    PullRequestCommit::delete_many()
        .filter(CommitColumn::PullRequestId.eq(pull_request_id))
        .exec(&txn)
        .await?;
    PullRequestFile::delete_many()
        .filter(FileColumn::PullRequestId.eq(pull_request_id))
        .exec(&txn)
        .await?;

    if !commits.is_empty() {
        PullRequestCommit::insert_many(commits).exec(&txn).await?;
    }
    if !files.is_empty() {
        PullRequestFile::insert_many(files).exec(&txn).await?;
    }

    txn.commit().await.map_err(StoreError::from)
}

fn is_retryable_error(err: &StoreError) -> bool {
    match err {
        StoreError::Database(db_err) => is_retryable_db_error(db_err),
        _ => false,
    }
}

fn is_retryable_db_error(err: &DbErr) -> bool {
    match err {
        DbErr::ConnectionAcquire(_) | DbErr::Conn(_) => true,
        DbErr::Exec(_) | DbErr::Query(_) => {
            let err_str = err.to_string().to_lowercase();
            err_str.contains("locked")
                || err_str.contains("busy")
                || err_str.contains("timeout")
                || err_str.contains("connection")
                || err_str.contains("temporarily unavailable")
        }
        _ => false,
    }
}

#[cfg(all(test, feature = "sqlite", feature = "migrate"))]
mod tests {
    use chrono::{TimeZone, Utc};
    use sea_orm::{EntityTrait, Set};

    use crate::connect_and_migrate;
    use crate::entity::repository::{ActiveModel as RepositoryActiveModel, Entity as Repository};

    use super::*;

    fn test_repository_id() -> Uuid {
        Uuid::parse_str("00000000-0000-0000-0000-0000000000b2").expect("valid uuid")
    }

    async fn setup_db() -> DatabaseConnection {
        let db = connect_and_migrate("sqlite::memory:")
            .await
            .expect("test db should migrate");

        let repository = RepositoryActiveModel {
            id: Set(test_repository_id()),
            github_repo_id: Set(9002),
            name: Set("upsert-test".to_string()),
            full_name: Set("octocat/upsert-test".to_string()),
            html_url: Set(None),
            is_private: Set(false),
            last_synced_merged_at: Set(None),
            created_at: Set(Utc::now().fixed_offset()),
        };
        Repository::insert(repository)
            .exec(&db)
            .await
            .expect("repository should insert");

        db
    }

    fn pull(number: i32, title: &str, merged_epoch: i64) -> ActiveModel {
        let merged = Utc
            .timestamp_opt(merged_epoch, 0)
            .single()
            .expect("valid epoch")
            .fixed_offset();
        ActiveModel {
            id: Set(Uuid::new_v4()),
            repository_id: Set(test_repository_id()),
            github_pr_id: Set(20_000 + i64::from(number)),
            number: Set(number),
            title: Set(title.to_string()),
            body: Set(None),
            author: Set(Some("octocat".to_string())),
            html_url: Set(None),
            state: Set(Some("closed".to_string())),
            created_at_github: Set(Some(merged)),
            updated_at_github: Set(Some(merged)),
            closed_at_github: Set(Some(merged)),
            merged_at_github: Set(Some(merged)),
            changed_files: Set(Some(1)),
            additions: Set(Some(10)),
            deletions: Set(Some(2)),
            commit_count: Set(Some(1)),
        }
    }

    fn commit(pull_request_id: Uuid, sha: &str, subject: &str) -> CommitActiveModel {
        CommitActiveModel {
            id: Set(Uuid::new_v4()),
            pull_request_id: Set(pull_request_id),
            sha: Set(sha.to_string()),
            subject: Set(subject.to_string()),
            author: Set(Some("octocat".to_string())),
            committed_at_github: Set(None),
        }
    }

    fn file(pull_request_id: Uuid, filename: &str) -> FileActiveModel {
        FileActiveModel {
            id: Set(Uuid::new_v4()),
            pull_request_id: Set(pull_request_id),
            filename: Set(filename.to_string()),
            status: Set(Some("modified".to_string())),
            additions: Set(Some(3)),
            deletions: Set(Some(1)),
            changes: Set(Some(4)),
        }
    }

    #[tokio::test]
    async fn upsert_is_idempotent_and_keeps_the_internal_id() {
        let db = setup_db().await;

        upsert_pulls(&db, vec![pull(7, "first title", 100)])
            .await
            .expect("first upsert");
        let first = find_by_number(&db, test_repository_id(), 7)
            .await
            .expect("lookup")
            .expect("row exists");

        upsert_pulls(&db, vec![pull(7, "second title", 100)])
            .await
            .expect("second upsert");
        let rows = find_by_numbers(&db, test_repository_id(), &[7])
            .await
            .expect("lookup");

        assert_eq!(rows.len(), 1, "re-upsert must not duplicate the row");
        assert_eq!(rows[0].id, first.id, "internal id is stable across upserts");
        assert_eq!(rows[0].title, "second title");
    }

    #[tokio::test]
    async fn upsert_empty_batch_is_a_no_op() {
        let db = setup_db().await;
        let count = upsert_pulls(&db, Vec::new()).await.expect("empty upsert");
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn replace_children_swaps_the_full_set() {
        let db = setup_db().await;
        upsert_pulls(&db, vec![pull(8, "with children", 100)])
            .await
            .expect("upsert");
        let parent = find_by_number(&db, test_repository_id(), 8)
            .await
            .expect("lookup")
            .expect("row exists");

        replace_children(
            &db,
            parent.id,
            vec![
                commit(parent.id, "aaa111", "add feature"),
                commit(parent.id, "bbb222", "fix test"),
            ],
            vec![file(parent.id, "src/lib.rs")],
        )
        .await
        .expect("first replace");

        replace_children(
            &db,
            parent.id,
            vec![commit(parent.id, "ccc333", "squashed")],
            vec![file(parent.id, "src/lib.rs"), file(parent.id, "README.md")],
        )
        .await
        .expect("second replace");

        let commits = PullRequestCommit::find()
            .filter(CommitColumn::PullRequestId.eq(parent.id))
            .all(&db)
            .await
            .expect("commits query");
        let files = PullRequestFile::find()
            .filter(FileColumn::PullRequestId.eq(parent.id))
            .all(&db)
            .await
            .expect("files query");

        assert_eq!(commits.len(), 1, "children are replaced, not appended");
        assert_eq!(commits[0].sha, "ccc333");
        assert_eq!(files.len(), 2);
    }

    #[tokio::test]
    async fn upsert_with_retry_passes_through_success() {
        let db = setup_db().await;
        let count = upsert_pulls_with_retry(
            &db,
            vec![pull(9, "retry path", 100)],
            DEFAULT_UPSERT_RETRIES,
            DEFAULT_UPSERT_BACKOFF_MS,
        )
        .await
        .expect("upsert with retry");
        assert_eq!(count, 1);
    }
}
