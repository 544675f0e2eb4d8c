//! PullRequest entity - a mirrored merged pull request.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// PullRequest model.
///
/// Rows are created on first successful upsert and mutated in place on every
/// subsequent upsert keyed by `(repository_id, github_pr_id)`; this subsystem
/// never deletes them. Only details with a non-null merge timestamp are ever
/// persisted, so `merged_at_github` is nullable at the column level but
/// non-null in practice for every stored row.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "pull_requests")]
pub struct Model {
    /// Internal UUID primary key.
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    // ─── Identity ────────────────────────────────────────────────────────────
    /// Owning repository.
    pub repository_id: Uuid,
    /// Upstream numeric pull request id.
    pub github_pr_id: i64,
    /// Sequence number within the repository (stable, human-facing).
    pub number: i32,

    // ─── Content ─────────────────────────────────────────────────────────────
    /// Pull request title.
    #[sea_orm(column_type = "Text")]
    pub title: String,
    /// Pull request body text.
    #[sea_orm(column_type = "Text", nullable)]
    pub body: Option<String>,
    /// Author login.
    pub author: Option<String>,
    /// Web URL.
    #[sea_orm(column_type = "Text", nullable)]
    pub html_url: Option<String>,
    /// Lifecycle state tag as reported upstream (open/closed).
    pub state: Option<String>,

    // ─── Upstream timestamps ─────────────────────────────────────────────────
    pub created_at_github: Option<DateTimeWithTimeZone>,
    pub updated_at_github: Option<DateTimeWithTimeZone>,
    pub closed_at_github: Option<DateTimeWithTimeZone>,
    /// Merge timestamp; the primary sort key for keyset pagination.
    pub merged_at_github: Option<DateTimeWithTimeZone>,

    // ─── Statistics ──────────────────────────────────────────────────────────
    pub changed_files: Option<i32>,
    pub additions: Option<i32>,
    pub deletions: Option<i32>,
    pub commit_count: Option<i32>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::repository::Entity",
        from = "Column::RepositoryId",
        to = "super::repository::Column::Id",
        on_delete = "Cascade"
    )]
    Repository,
    #[sea_orm(has_many = "super::pull_request_commit::Entity")]
    Commit,
    #[sea_orm(has_many = "super::pull_request_file::Entity")]
    File,
}

impl Related<super::repository::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Repository.def()
    }
}

impl Related<super::pull_request_commit::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Commit.def()
    }
}

impl Related<super::pull_request_file::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::File.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
