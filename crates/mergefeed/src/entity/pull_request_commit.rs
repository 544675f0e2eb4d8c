//! PullRequestCommit entity - one commit belonging to a mirrored pull request.
//!
//! Child rows are replaced wholesale on every upsert of the parent; there is
//! no incremental merge.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "pull_request_commits")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Owning pull request.
    pub pull_request_id: Uuid,
    /// Commit hash.
    pub sha: String,
    /// First line of the commit message. Rows with an empty subject are
    /// dropped before insertion.
    #[sea_orm(column_type = "Text")]
    pub subject: String,
    /// Commit author login or name.
    pub author: Option<String>,
    /// Commit timestamp as reported upstream.
    pub committed_at_github: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::pull_request::Entity",
        from = "Column::PullRequestId",
        to = "super::pull_request::Column::Id",
        on_delete = "Cascade"
    )]
    PullRequest,
}

impl Related<super::pull_request::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PullRequest.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
