use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QuerySelect, Set,
    prelude::DateTimeWithTimeZone,
};
use uuid::Uuid;

use crate::entity::pull_request::{Column as PullColumn, Entity as PullRequest};
use crate::entity::repository::{ActiveModel as RepositoryActiveModel, Entity as Repository};

use super::errors::{Result, StoreError};

/// The latest merge timestamp among stored pull requests of a repository.
pub async fn latest_merged_at(
    db: &DatabaseConnection,
    repository_id: Uuid,
) -> Result<Option<DateTimeWithTimeZone>> {
    let max: Option<Option<DateTimeWithTimeZone>> = PullRequest::find()
        .select_only()
        .column_as(PullColumn::MergedAtGithub.max(), "max_merged_at")
        .filter(PullColumn::RepositoryId.eq(repository_id))
        .filter(PullColumn::MergedAtGithub.is_not_null())
        .into_tuple()
        .one(db)
        .await?;

    Ok(max.flatten())
}

/// Advance the repository watermark from current store contents.
///
/// The watermark is recomputed as `MAX(merged_at_github)` over stored rows and
/// only ever moves forward; a pass that discovers nothing newer leaves it
/// untouched. Because it is derived from rows that are already durable, it
/// can never run ahead of data that was never written.
///
/// Returns the watermark in effect after the call.
pub async fn advance_watermark(
    db: &DatabaseConnection,
    repository_id: Uuid,
) -> Result<Option<DateTimeWithTimeZone>> {
    let Some(latest) = latest_merged_at(db, repository_id).await? else {
        let repository = Repository::find_by_id(repository_id)
            .one(db)
            .await?
            .ok_or_else(|| StoreError::not_found(format!("repository id={repository_id}")))?;
        return Ok(repository.last_synced_merged_at);
    };

    let repository = Repository::find_by_id(repository_id)
        .one(db)
        .await?
        .ok_or_else(|| StoreError::not_found(format!("repository id={repository_id}")))?;

    let current = repository.last_synced_merged_at;
    if current.is_some_and(|current| latest <= current) {
        return Ok(current);
    }

    let mut update: RepositoryActiveModel = repository.into();
    update.last_synced_merged_at = Set(Some(latest));
    let updated = update.update(db).await?;
    Ok(updated.last_synced_merged_at)
}
