//! Access gate and credential lookups.
//!
//! Every operation is scoped to a member and a repository; the gate confirms
//! a registered relationship exists before any work proceeds, and the
//! credential lookup resolves the member's upstream token. Identity issuance
//! and the upstream half of repository registration live outside this crate;
//! the seeding helpers here only upsert the local rows those flows produce.

use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, DbErr, EntityTrait, QueryFilter, Set};
use thiserror::Error;
use uuid::Uuid;

use sea_orm::DatabaseConnection;

use crate::entity::access_token::{
    ActiveModel as AccessTokenActiveModel, Column as AccessTokenColumn, Entity as AccessToken,
};
use crate::entity::member::{ActiveModel as MemberActiveModel, Column as MemberColumn, Entity as Member};
use crate::entity::member_repository::{
    ActiveModel as MemberRepositoryActiveModel, Entity as MemberRepository,
};
use crate::entity::repository::{
    ActiveModel as RepositoryActiveModel, Column as RepositoryColumn, Entity as Repository,
    Model as RepositoryModel,
};

/// Errors from the access gate and credential lookups.
#[derive(Debug, Error)]
pub enum AccessError {
    /// Database error from sea-orm.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),

    /// The member has not registered this repository.
    #[error("Repository is not registered by this member")]
    NotRegistered,

    /// The member has no stored upstream token.
    #[error("Upstream access token not found")]
    MissingToken,

    /// Row lookup came up empty.
    #[error("Not found: {context}")]
    NotFound { context: String },
}

/// Result type alias for access operations.
pub type Result<T> = std::result::Result<T, AccessError>;

/// Confirm the member has registered the repository.
///
/// Rejects the whole request before any page read, sync, or upstream call
/// when no relationship row exists.
pub async fn ensure_registered(
    db: &DatabaseConnection,
    member_id: Uuid,
    repository_id: Uuid,
) -> Result<()> {
    let link = MemberRepository::find_by_id((member_id, repository_id))
        .one(db)
        .await?;

    match link {
        Some(_) => Ok(()),
        None => Err(AccessError::NotRegistered),
    }
}

/// Look up the member's upstream token.
pub async fn github_token(db: &DatabaseConnection, member_id: Uuid) -> Result<String> {
    let row = AccessToken::find()
        .filter(AccessTokenColumn::MemberId.eq(member_id))
        .one(db)
        .await?;

    row.map(|row| row.token).ok_or(AccessError::MissingToken)
}

/// Load a registered repository for a member, running the gate first.
pub async fn load_registered(
    db: &DatabaseConnection,
    member_id: Uuid,
    repository_id: Uuid,
) -> Result<RepositoryModel> {
    ensure_registered(db, member_id, repository_id).await?;

    Repository::find_by_id(repository_id)
        .one(db)
        .await?
        .ok_or_else(|| AccessError::NotFound {
            context: format!("repository id={repository_id}"),
        })
}

/// Upsert a member row by upstream user id.
pub async fn register_member(
    db: &DatabaseConnection,
    github_user_id: i64,
    github_username: &str,
    github_avatar_url: Option<&str>,
) -> Result<crate::entity::member::Model> {
    let existing = Member::find()
        .filter(MemberColumn::GithubUserId.eq(github_user_id))
        .one(db)
        .await?;

    match existing {
        Some(existing) => {
            let mut update: MemberActiveModel = existing.into();
            update.github_username = Set(github_username.to_string());
            update.github_avatar_url = Set(github_avatar_url.map(String::from));
            Ok(update.update(db).await?)
        }
        None => {
            let model = MemberActiveModel {
                id: Set(Uuid::new_v4()),
                github_user_id: Set(github_user_id),
                github_username: Set(github_username.to_string()),
                github_avatar_url: Set(github_avatar_url.map(String::from)),
                created_at: Set(Utc::now().fixed_offset()),
            };
            Ok(model.insert(db).await?)
        }
    }
}

/// Store or replace a member's upstream token.
pub async fn store_token(db: &DatabaseConnection, member_id: Uuid, token: &str) -> Result<()> {
    let existing = AccessToken::find()
        .filter(AccessTokenColumn::MemberId.eq(member_id))
        .one(db)
        .await?;

    match existing {
        Some(existing) => {
            let mut update: AccessTokenActiveModel = existing.into();
            update.token = Set(token.to_string());
            update.created_at = Set(Utc::now().fixed_offset());
            update.update(db).await?;
        }
        None => {
            let model = AccessTokenActiveModel {
                id: Set(Uuid::new_v4()),
                member_id: Set(member_id),
                token: Set(token.to_string()),
                created_at: Set(Utc::now().fixed_offset()),
            };
            model.insert(db).await?;
        }
    }

    Ok(())
}

/// Register a repository for a member.
///
/// Upserts the repository row by upstream repo id (the watermark of an
/// existing row is left untouched) and creates the relationship row if it is
/// missing.
pub async fn register_repository(
    db: &DatabaseConnection,
    member_id: Uuid,
    github_repo_id: i64,
    full_name: &str,
    html_url: Option<&str>,
    is_private: bool,
) -> Result<RepositoryModel> {
    let name = full_name
        .split_once('/')
        .map(|(_, name)| name)
        .unwrap_or(full_name);

    let existing = Repository::find()
        .filter(RepositoryColumn::GithubRepoId.eq(github_repo_id))
        .one(db)
        .await?;

    let repository = match existing {
        Some(existing) => {
            let mut update: RepositoryActiveModel = existing.into();
            update.name = Set(name.to_string());
            update.full_name = Set(full_name.to_string());
            update.html_url = Set(html_url.map(String::from));
            update.is_private = Set(is_private);
            update.update(db).await?
        }
        None => {
            let model = RepositoryActiveModel {
                id: Set(Uuid::new_v4()),
                github_repo_id: Set(github_repo_id),
                name: Set(name.to_string()),
                full_name: Set(full_name.to_string()),
                html_url: Set(html_url.map(String::from)),
                is_private: Set(is_private),
                last_synced_merged_at: Set(None),
                created_at: Set(Utc::now().fixed_offset()),
            };
            model.insert(db).await?
        }
    };

    let link = MemberRepository::find_by_id((member_id, repository.id))
        .one(db)
        .await?;
    if link.is_none() {
        let model = MemberRepositoryActiveModel {
            member_id: Set(member_id),
            repository_id: Set(repository.id),
            created_at: Set(Utc::now().fixed_offset()),
        };
        model.insert(db).await?;
    }

    Ok(repository)
}

#[cfg(all(test, feature = "sqlite", feature = "migrate"))]
mod tests {
    use crate::connect_and_migrate;

    use super::*;

    #[tokio::test]
    async fn gate_rejects_unregistered_members() {
        let db = connect_and_migrate("sqlite::memory:")
            .await
            .expect("test db should migrate");

        let member = register_member(&db, 1, "octocat", None)
            .await
            .expect("member registers");

        let err = ensure_registered(&db, member.id, Uuid::new_v4())
            .await
            .expect_err("unregistered repository should be rejected");
        assert!(matches!(err, AccessError::NotRegistered));
    }

    #[tokio::test]
    async fn gate_admits_registered_members() {
        let db = connect_and_migrate("sqlite::memory:")
            .await
            .expect("test db should migrate");

        let member = register_member(&db, 2, "octocat", Some("https://example.com/a.png"))
            .await
            .expect("member registers");
        let repository = register_repository(
            &db,
            member.id,
            77,
            "octocat/hello-world",
            None,
            false,
        )
        .await
        .expect("repository registers");

        ensure_registered(&db, member.id, repository.id)
            .await
            .expect("registered pair should pass the gate");

        let loaded = load_registered(&db, member.id, repository.id)
            .await
            .expect("load passes the gate");
        assert_eq!(loaded.full_name, "octocat/hello-world");
        assert!(loaded.last_synced_merged_at.is_none());
    }

    #[tokio::test]
    async fn token_lookup_reports_absent_credentials() {
        let db = connect_and_migrate("sqlite::memory:")
            .await
            .expect("test db should migrate");

        let member = register_member(&db, 3, "octocat", None)
            .await
            .expect("member registers");

        let err = github_token(&db, member.id)
            .await
            .expect_err("no token stored yet");
        assert!(matches!(err, AccessError::MissingToken));

        store_token(&db, member.id, "ghp_first").await.expect("store");
        store_token(&db, member.id, "ghp_second").await.expect("replace");

        let token = github_token(&db, member.id).await.expect("token present");
        assert_eq!(token, "ghp_second");
    }

    #[tokio::test]
    async fn re_registration_keeps_the_watermark() {
        let db = connect_and_migrate("sqlite::memory:")
            .await
            .expect("test db should migrate");

        let member = register_member(&db, 4, "octocat", None)
            .await
            .expect("member registers");
        let first = register_repository(&db, member.id, 88, "octocat/renamed", None, false)
            .await
            .expect("first registration");

        let second = register_repository(
            &db,
            member.id,
            88,
            "octocat/renamed-again",
            Some("https://example.com"),
            true,
        )
        .await
        .expect("second registration");

        assert_eq!(second.id, first.id);
        assert_eq!(second.full_name, "octocat/renamed-again");
        assert!(second.is_private);
    }
}
