//! Register a repository for a member.

use console::style;
use uuid::Uuid;

use mergefeed::access;

use crate::commands::shared::{CommandResult, open_db, resolve_member};
use crate::config::Config;

pub async fn run(
    member: Option<Uuid>,
    github_repo_id: i64,
    full_name: &str,
    html_url: Option<&str>,
    is_private: bool,
) -> CommandResult {
    let config = Config::load()?;
    let member_id = resolve_member(member, &config)?;
    let db = open_db(&config).await?;

    let repository =
        access::register_repository(&db, member_id, github_repo_id, full_name, html_url, is_private)
            .await?;

    println!(
        "registered {} ({})",
        style(&repository.full_name).green(),
        repository.id
    );

    Ok(())
}
