//! Store a member identity and upstream token.

use console::style;
use mergefeed::access;

use crate::commands::shared::{CommandResult, open_db};
use crate::config::Config;

pub async fn run(
    github_user_id: i64,
    username: &str,
    avatar_url: Option<&str>,
    token: &str,
) -> CommandResult {
    let config = Config::load()?;
    let db = open_db(&config).await?;

    let member = access::register_member(&db, github_user_id, username, avatar_url).await?;
    access::store_token(&db, member.id, token).await?;

    println!(
        "logged in as {} ({})",
        style(&member.github_username).green(),
        member.id
    );
    println!(
        "tip: set {} or member.id in the config to skip --member flags",
        style(format!("MERGEFEED_MEMBER_ID={}", member.id)).dim()
    );

    Ok(())
}
