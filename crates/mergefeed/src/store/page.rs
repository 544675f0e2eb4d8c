use chrono::{DateTime, Utc};
use sea_orm::{
    ColumnTrait, Condition, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, QuerySelect,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entity::pull_request::{Column, Entity as PullRequest, Model};

use super::errors::{Result, StoreError};

/// A position in the `(merged_at DESC, number DESC)` total order.
///
/// Pages are keyed on the merge timestamp with the pull request number as a
/// tie-breaker, so pagination stays stable and gap-free even when many pull
/// requests share one merge timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageCursor {
    /// Merge timestamp of the last item on the previous page.
    pub merged_at: DateTime<Utc>,
    /// Pull request number of the last item on the previous page.
    pub number: i32,
}

impl PageCursor {
    /// Validate raw client input into an optional cursor.
    ///
    /// Both fields must be supplied together or neither. A malformed
    /// timestamp or non-positive number is a client input error, rejected
    /// before any I/O.
    pub fn from_parts(merged_at: Option<&str>, number: Option<i32>) -> Result<Option<Self>> {
        match (merged_at, number) {
            (None, None) => Ok(None),
            (Some(_), None) | (None, Some(_)) => Err(StoreError::invalid_cursor(
                "merged_at and number must be provided together",
            )),
            (Some(raw), Some(number)) => {
                let merged_at = DateTime::parse_from_rfc3339(raw)
                    .map_err(|_| {
                        StoreError::invalid_cursor("merged_at is not a valid RFC 3339 timestamp")
                    })?
                    .with_timezone(&Utc);

                if number < 1 {
                    return Err(StoreError::invalid_cursor("number must be positive"));
                }

                Ok(Some(Self { merged_at, number }))
            }
        }
    }

    /// The cursor pointing past the given row, if the row carries a merge
    /// timestamp.
    pub fn after(model: &Model) -> Option<Self> {
        model.merged_at_github.map(|merged_at| Self {
            merged_at: merged_at.with_timezone(&Utc),
            number: model.number,
        })
    }
}

/// Fetch up to `limit` pull requests strictly older than the cursor.
///
/// Only rows with a non-null merge timestamp are eligible. Callers that need
/// a "more available" flag request `limit + 1` rows and inspect the overflow
/// themselves; this function does not run a separate count query.
pub async fn fetch_page(
    db: &DatabaseConnection,
    repository_id: Uuid,
    limit: usize,
    cursor: Option<&PageCursor>,
) -> Result<Vec<Model>> {
    let mut query = PullRequest::find()
        .filter(Column::RepositoryId.eq(repository_id))
        .filter(Column::MergedAtGithub.is_not_null());

    if let Some(cursor) = cursor {
        let merged_at = cursor.merged_at.fixed_offset();
        // merged_at < c OR (merged_at = c AND number < n): strictly older
        // under the total order.
        query = query.filter(
            Condition::any().add(Column::MergedAtGithub.lt(merged_at)).add(
                Condition::all()
                    .add(Column::MergedAtGithub.eq(merged_at))
                    .add(Column::Number.lt(cursor.number)),
            ),
        );
    }

    query
        .order_by_desc(Column::MergedAtGithub)
        .order_by_desc(Column::Number)
        .limit(limit as u64)
        .all(db)
        .await
        .map_err(StoreError::from)
}
