//! Member entity - a caller identity as issued by the external auth flow.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Member model. Identity issuance itself lives outside this crate; rows are
/// seeded through [`crate::access::register_member`].
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "members")]
pub struct Model {
    /// Internal UUID primary key.
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Upstream numeric user id.
    #[sea_orm(unique)]
    pub github_user_id: i64,
    /// Upstream login.
    pub github_username: String,
    /// Avatar URL.
    #[sea_orm(column_type = "Text", nullable)]
    pub github_avatar_url: Option<String>,

    /// When this row was created.
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_one = "super::access_token::Entity")]
    AccessToken,
    #[sea_orm(has_many = "super::member_repository::Entity")]
    MemberRepository,
}

impl Related<super::access_token::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AccessToken.def()
    }
}

impl Related<super::member_repository::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::MemberRepository.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
