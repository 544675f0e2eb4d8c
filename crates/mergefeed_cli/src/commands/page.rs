//! Read one page of merged pull requests.

use tokio::sync::mpsc;
use uuid::Uuid;

use mergefeed::store::PageCursor;
use mergefeed::sync;

use crate::commands::shared::{CommandResult, gated_client, open_db, resolve_member};
use crate::config::Config;
use crate::progress;

#[allow(clippy::too_many_arguments)]
pub async fn run(
    member: Option<Uuid>,
    repository_id: Uuid,
    limit: usize,
    cursor_merged_at: Option<&str>,
    cursor_number: Option<i32>,
    stream: bool,
    json: bool,
) -> CommandResult {
    let config = Config::load()?;
    let member_id = resolve_member(member, &config)?;
    let db = open_db(&config).await?;

    let cursor = PageCursor::from_parts(cursor_merged_at, cursor_number)?;
    let (repository, client) = gated_client(&db, member_id, repository_id).await?;

    if stream {
        let (tx, rx) = mpsc::channel(64);
        let printer = tokio::spawn(progress::print_page_events(rx, json));
        let result = sync::stream_page(&db, &client, &repository, limit, cursor, tx).await;
        printer.await?;
        result?;
        return Ok(());
    }

    let page = sync::read_page(&db, &client, &repository, limit, cursor).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&page)?);
        return Ok(());
    }

    for item in &page.items {
        progress::print_pull_line(item);
    }
    progress::print_cursor_hint(page.next_cursor.as_ref(), page.has_more);

    Ok(())
}
