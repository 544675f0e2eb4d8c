//! AccessToken entity - a member's stored upstream access token.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// One upstream token per member. Backs the credential-store boundary used to
/// authenticate upstream calls on a member's behalf.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "access_tokens")]
pub struct Model {
    /// Internal UUID primary key.
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Owning member.
    #[sea_orm(unique)]
    pub member_id: Uuid,
    /// The token value.
    #[sea_orm(column_type = "Text")]
    pub token: String,

    /// When this row was created or last replaced.
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::member::Entity",
        from = "Column::MemberId",
        to = "super::member::Column::Id",
        on_delete = "Cascade"
    )]
    Member,
}

impl Related<super::member::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Member.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
