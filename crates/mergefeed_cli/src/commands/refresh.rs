//! Refresh a single pull request from upstream.

use console::style;
use uuid::Uuid;

use mergefeed::sync;

use crate::commands::shared::{CommandResult, gated_client, open_db, resolve_member};
use crate::config::Config;
use crate::progress;

pub async fn run(member: Option<Uuid>, repository_id: Uuid, number: i32) -> CommandResult {
    let config = Config::load()?;
    let member_id = resolve_member(member, &config)?;
    let db = open_db(&config).await?;

    let (repository, client) = gated_client(&db, member_id, repository_id).await?;

    match sync::refresh_one(&db, &client, &repository, number).await? {
        Some(item) => {
            println!("refreshed:");
            progress::print_pull_line(&item);
        }
        None => {
            println!(
                "{} #{number} is not merged; nothing to do",
                style("skipped:").yellow()
            );
        }
    }

    Ok(())
}
