//! Helpers shared across commands.

use sea_orm::DatabaseConnection;
use uuid::Uuid;

use mergefeed::GitHubClient;
use mergefeed::access;
use mergefeed::entity::repository::Model as RepositoryModel;

use crate::config::Config;

pub type CommandResult = Result<(), Box<dyn std::error::Error>>;

/// Open the configured database, running pending migrations.
pub async fn open_db(config: &Config) -> Result<DatabaseConnection, Box<dyn std::error::Error>> {
    let url = config.database_url();
    tracing::debug!(url = %url, "connecting to database");
    Ok(mergefeed::connect_and_migrate(&url).await?)
}

/// Resolve the member id from the flag or the configured default.
pub fn resolve_member(flag: Option<Uuid>, config: &Config) -> Result<Uuid, Box<dyn std::error::Error>> {
    flag.or(config.member.id).ok_or_else(|| {
        "no member id: pass --member or set member.id in the config (see `mergefeed login`)".into()
    })
}

/// Run the access gate and build an authenticated client for the member.
pub async fn gated_client(
    db: &DatabaseConnection,
    member_id: Uuid,
    repository_id: Uuid,
) -> Result<(RepositoryModel, GitHubClient), Box<dyn std::error::Error>> {
    let repository = access::load_registered(db, member_id, repository_id).await?;
    let token = access::github_token(db, member_id).await?;
    let client = GitHubClient::new(&token)?;
    Ok((repository, client))
}
