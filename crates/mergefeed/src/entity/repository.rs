//! Repository entity - a tracked upstream repository whose merged pull
//! requests are mirrored locally.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Repository model. One row per mirrored upstream repository.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "repositories")]
pub struct Model {
    /// Internal UUID primary key.
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Upstream numeric repository id.
    #[sea_orm(unique)]
    pub github_repo_id: i64,
    /// Repository name (URL-safe slug).
    pub name: String,
    /// Full name in `owner/repo` form, used to address upstream API routes.
    #[sea_orm(unique)]
    pub full_name: String,
    /// Web URL of the repository.
    #[sea_orm(column_type = "Text", nullable)]
    pub html_url: Option<String>,
    /// Whether the upstream repository is private.
    #[sea_orm(default_value = false)]
    pub is_private: bool,

    /// Sync watermark: the latest merge timestamp among locally stored pull
    /// requests. Monotonically non-decreasing; recomputed from store content
    /// after every persist, never from sync intent.
    pub last_synced_merged_at: Option<DateTimeWithTimeZone>,

    /// When this row was created.
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::pull_request::Entity")]
    PullRequest,
    #[sea_orm(has_many = "super::member_repository::Entity")]
    MemberRepository,
}

impl Related<super::pull_request::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PullRequest.def()
    }
}

impl Related<super::member_repository::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::MemberRepository.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Owner login half of the full name.
    pub fn owner(&self) -> &str {
        self.full_name
            .split_once('/')
            .map(|(owner, _)| owner)
            .unwrap_or(&self.full_name)
    }
}
