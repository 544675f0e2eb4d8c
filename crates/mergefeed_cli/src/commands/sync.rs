//! Sync newly merged pull requests since the watermark.

use console::style;
use tokio::sync::mpsc;
use uuid::Uuid;

use mergefeed::sync;

use crate::commands::shared::{CommandResult, gated_client, open_db, resolve_member};
use crate::config::Config;
use crate::progress;

pub async fn run(member: Option<Uuid>, repository_id: Uuid, stream: bool, json: bool) -> CommandResult {
    let config = Config::load()?;
    let member_id = resolve_member(member, &config)?;
    let db = open_db(&config).await?;

    let (repository, client) = gated_client(&db, member_id, repository_id).await?;

    if stream {
        let (tx, rx) = mpsc::channel(64);
        let printer = tokio::spawn(progress::print_sync_events(rx, json));
        let result = sync::stream_sync_forward(&db, &client, &repository, tx).await;
        printer.await?;
        result?;
        return Ok(());
    }

    let report = sync::sync_forward(&db, &client, &repository).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!(
        "synced {} of {} candidates",
        style(report.synced_count).green(),
        report.candidate_count
    );
    println!(
        "watermark: {} -> {}",
        progress::format_watermark(report.watermark_before),
        progress::format_watermark(report.watermark_after)
    );

    Ok(())
}
