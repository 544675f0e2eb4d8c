//! Event sequences emitted by the streaming adapters.
//!
//! Events are sent through a `tokio::sync::mpsc` channel in a fixed order
//! per stream; a dropped receiver cancels the producing operation
//! best-effort. Unrecoverable failures are returned from the driving future
//! rather than encoded as events.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::entity::pull_request::Model as PullRequestModel;
use crate::store::PageCursor;

/// Where a streamed page item became visible from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemSource {
    /// Already cached locally when the stream started.
    Store,
    /// Became visible through an on-demand upstream backfill.
    Upstream,
}

/// Events of a paged-read stream.
///
/// Sequence: `Start` → zero or more `Item` (deduplicated by row id within
/// the stream) → `Cursor` → `End`.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PageEvent {
    Start,
    Item {
        item: PullRequestModel,
        /// Running count of items sent, this one included.
        sent: usize,
        source: ItemSource,
    },
    Cursor {
        next_cursor: Option<PageCursor>,
        has_more: bool,
    },
    End {
        /// Total items sent.
        total: usize,
    },
}

/// Events of a forward-sync stream.
///
/// Sequence: `Start` → one `Progress` per successfully-upserted candidate,
/// in ascending number order → `End`.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SyncEvent {
    Start {
        /// Watermark the sync is scoped to; null means "sync everything".
        watermark: Option<DateTime<Utc>>,
        /// Deduplicated candidate count.
        candidates: usize,
    },
    Progress {
        /// Candidates persisted so far, this one included.
        synced: usize,
        /// Total candidates.
        total: usize,
        /// Pull request number just persisted.
        number: i32,
        item: PullRequestModel,
    },
    End {
        synced: usize,
        total: usize,
        watermark_before: Option<DateTime<Utc>>,
        watermark_after: Option<DateTime<Utc>>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_events_carry_a_type_tag() {
        let start = serde_json::to_value(PageEvent::Start).expect("serializes");
        assert_eq!(start["type"], "start");

        let end = serde_json::to_value(PageEvent::End { total: 3 }).expect("serializes");
        assert_eq!(end["type"], "end");
        assert_eq!(end["total"], 3);
    }

    #[test]
    fn sync_start_serializes_null_watermark() {
        let start = serde_json::to_value(SyncEvent::Start {
            watermark: None,
            candidates: 0,
        })
        .expect("serializes");
        assert_eq!(start["type"], "start");
        assert!(start["watermark"].is_null());
    }

    #[test]
    fn item_source_is_snake_case() {
        assert_eq!(
            serde_json::to_value(ItemSource::Store).expect("serializes"),
            serde_json::json!("store")
        );
        assert_eq!(
            serde_json::to_value(ItemSource::Upstream).expect("serializes"),
            serde_json::json!("upstream")
        );
    }
}
