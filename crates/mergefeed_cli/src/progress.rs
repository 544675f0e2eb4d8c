//! Terminal rendering of stream events and page output.

use chrono::{DateTime, Utc};
use console::style;
use tokio::sync::mpsc;

use mergefeed::entity::pull_request::Model as PullRequestModel;
use mergefeed::store::PageCursor;
use mergefeed::sync::{ItemSource, PageEvent, SyncEvent};

/// One line per pull request: number, merge date, title, author.
pub fn print_pull_line(item: &PullRequestModel) {
    let merged = item
        .merged_at_github
        .map(|t| t.with_timezone(&Utc).format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "-".to_string());
    let author = item.author.as_deref().unwrap_or("-");

    println!(
        "{:>6}  {}  {}  {}",
        style(format!("#{}", item.number)).cyan(),
        style(merged).dim(),
        item.title,
        style(format!("({author})")).dim()
    );
}

/// Show how to fetch the next page.
pub fn print_cursor_hint(cursor: Option<&PageCursor>, has_more: bool) {
    if !has_more {
        println!("{}", style("end of merged pull requests").dim());
        return;
    }
    if let Some(cursor) = cursor {
        println!(
            "{}",
            style(format!(
                "next page: --cursor-merged-at {} --cursor-number {}",
                cursor.merged_at.to_rfc3339(),
                cursor.number
            ))
            .dim()
        );
    }
}

pub fn format_watermark(watermark: Option<DateTime<Utc>>) -> String {
    watermark
        .map(|t| t.to_rfc3339())
        .unwrap_or_else(|| "(none)".to_string())
}

/// Drain and render a paged-read event stream.
pub async fn print_page_events(mut rx: mpsc::Receiver<PageEvent>, json: bool) {
    while let Some(event) = rx.recv().await {
        if json {
            println!("{}", serde_json::to_string(&event).unwrap_or_default());
            continue;
        }

        match event {
            PageEvent::Start => {}
            PageEvent::Item { item, source, .. } => {
                let tag = match source {
                    ItemSource::Store => style("cached").dim(),
                    ItemSource::Upstream => style("fetched").green(),
                };
                print!("{tag:>8} ");
                print_pull_line(&item);
            }
            PageEvent::Cursor {
                next_cursor,
                has_more,
            } => {
                print_cursor_hint(next_cursor.as_ref(), has_more);
            }
            PageEvent::End { total } => {
                println!("{}", style(format!("{total} item(s)")).dim());
            }
        }
    }
}

/// Drain and render a sync event stream.
pub async fn print_sync_events(mut rx: mpsc::Receiver<SyncEvent>, json: bool) {
    while let Some(event) = rx.recv().await {
        if json {
            println!("{}", serde_json::to_string(&event).unwrap_or_default());
            continue;
        }

        match event {
            SyncEvent::Start {
                watermark,
                candidates,
            } => {
                println!(
                    "{} candidate(s) since {}",
                    style(candidates).cyan(),
                    format_watermark(watermark)
                );
            }
            SyncEvent::Progress {
                synced,
                total,
                item,
                ..
            } => {
                print!("{:>8} ", style(format!("{synced}/{total}")).green());
                print_pull_line(&item);
            }
            SyncEvent::End {
                synced,
                total,
                watermark_before,
                watermark_after,
            } => {
                println!("synced {} of {}", style(synced).green(), total);
                println!(
                    "watermark: {} -> {}",
                    format_watermark(watermark_before),
                    format_watermark(watermark_after)
                );
            }
        }
    }
}
