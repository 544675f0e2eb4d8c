//! Integration tests for the streaming adapters: event ordering, per-stream
//! deduplication, and best-effort cancellation.

#![cfg(all(feature = "sqlite", feature = "migrate"))]

mod support;

use tokio::sync::mpsc;

use mergefeed::sync::{
    ItemSource, PageEvent, SyncEvent, refresh_one, stream_page, stream_sync_forward,
};

use support::{FakeUpstream, setup_db_with_repository, ts};

async fn drain<T>(mut rx: mpsc::Receiver<T>) -> Vec<T> {
    let mut events = Vec::new();
    while let Some(event) = rx.recv().await {
        events.push(event);
    }
    events
}

#[tokio::test]
async fn page_stream_emits_start_items_cursor_end() {
    let (db, repository) = setup_db_with_repository().await;
    let upstream = FakeUpstream::new();
    upstream.add_merged(5, 10);
    upstream.add_merged(4, 9);
    upstream.add_merged(3, 8);

    let (tx, rx) = mpsc::channel(64);
    stream_page(&db, &upstream, &repository, 2, None, tx)
        .await
        .expect("stream should succeed");
    let events = drain(rx).await;

    assert!(matches!(events.first(), Some(PageEvent::Start)));
    assert!(matches!(events.last(), Some(PageEvent::End { total: 2 })));

    let items: Vec<(i32, usize)> = events
        .iter()
        .filter_map(|event| match event {
            PageEvent::Item { item, sent, .. } => Some((item.number, *sent)),
            _ => None,
        })
        .collect();
    assert_eq!(items, vec![(5, 1), (4, 2)], "newest merge first, counted");

    let cursor_positions: Vec<usize> = events
        .iter()
        .enumerate()
        .filter_map(|(i, event)| matches!(event, PageEvent::Cursor { .. }).then_some(i))
        .collect();
    assert_eq!(cursor_positions.len(), 1);
    assert_eq!(
        cursor_positions[0],
        events.len() - 2,
        "cursor is the second-to-last event"
    );

    match &events[cursor_positions[0]] {
        PageEvent::Cursor {
            next_cursor,
            has_more,
        } => {
            let cursor = next_cursor.expect("cursor present");
            assert_eq!(cursor.number, 4);
            assert_eq!(cursor.merged_at, ts(9));
            assert!(has_more);
        }
        _ => unreachable!(),
    }
}

#[tokio::test]
async fn page_stream_shows_cached_rows_before_backfilled_ones() {
    let (db, repository) = setup_db_with_repository().await;
    let upstream = FakeUpstream::new();
    upstream.add_merged(5, 10);
    upstream.add_merged(4, 9);
    upstream.add_merged(3, 8);

    // Cache one row up front; the stream must emit it before any upstream
    // work makes the others visible.
    refresh_one(&db, &upstream, &repository, 5)
        .await
        .expect("warm one row")
        .expect("merged");

    let (tx, rx) = mpsc::channel(64);
    stream_page(&db, &upstream, &repository, 3, None, tx)
        .await
        .expect("stream should succeed");
    let events = drain(rx).await;

    let sources: Vec<(i32, ItemSource)> = events
        .iter()
        .filter_map(|event| match event {
            PageEvent::Item { item, source, .. } => Some((item.number, *source)),
            _ => None,
        })
        .collect();

    assert_eq!(sources.len(), 3);
    assert_eq!(sources[0], (5, ItemSource::Store));
    assert!(
        sources[1..]
            .iter()
            .all(|(_, source)| *source == ItemSource::Upstream)
    );
    // Deduplicated: the cached row is not re-emitted when backfill re-reads
    // the page.
    let emitted: Vec<i32> = sources.iter().map(|(number, _)| *number).collect();
    assert_eq!(emitted, vec![5, 4, 3]);
}

#[tokio::test]
async fn page_stream_survives_one_bad_candidate() {
    let (db, repository) = setup_db_with_repository().await;
    let upstream = FakeUpstream::new();
    upstream.add_merged(5, 10);
    upstream.add_merged(4, 9);
    upstream.add_merged(3, 8);
    upstream.fail_detail(4);

    let (tx, rx) = mpsc::channel(64);
    stream_page(&db, &upstream, &repository, 3, None, tx)
        .await
        .expect("stream should succeed");
    let events = drain(rx).await;

    let emitted: Vec<i32> = events
        .iter()
        .filter_map(|event| match event {
            PageEvent::Item { item, .. } => Some(item.number),
            _ => None,
        })
        .collect();
    assert_eq!(emitted, vec![5, 3], "failed candidate is simply absent");
}

#[tokio::test]
async fn page_stream_stops_early_when_the_receiver_goes_away() {
    let (db, repository) = setup_db_with_repository().await;
    let upstream = FakeUpstream::new();
    upstream.add_merged(5, 10);

    let (tx, rx) = mpsc::channel(64);
    drop(rx);

    stream_page(&db, &upstream, &repository, 2, None, tx)
        .await
        .expect("a cancelled stream is not an error");
    assert_eq!(
        upstream.search_calls(),
        0,
        "remaining work is abandoned best-effort"
    );
}

#[tokio::test]
async fn sync_stream_reports_sequential_progress() {
    let (db, repository) = setup_db_with_repository().await;
    let upstream = FakeUpstream::new();
    upstream.add_merged(11, 100);
    upstream.add_merged(12, 200);
    upstream.add_merged(13, 300);
    upstream.fail_detail(12);

    let (tx, rx) = mpsc::channel(64);
    stream_sync_forward(&db, &upstream, &repository, tx)
        .await
        .expect("stream should succeed");
    let events = drain(rx).await;

    match events.first() {
        Some(SyncEvent::Start {
            watermark,
            candidates,
        }) => {
            assert!(watermark.is_none());
            assert_eq!(*candidates, 3);
        }
        other => panic!("expected Start first, got {other:?}"),
    }

    let progress: Vec<(usize, i32)> = events
        .iter()
        .filter_map(|event| match event {
            SyncEvent::Progress { synced, number, .. } => Some((*synced, *number)),
            _ => None,
        })
        .collect();
    // Ascending candidate order, one event per persisted item, the failed
    // candidate produces none.
    assert_eq!(progress, vec![(1, 11), (2, 13)]);

    match events.last() {
        Some(SyncEvent::End {
            synced,
            total,
            watermark_before,
            watermark_after,
        }) => {
            assert_eq!(*synced, 2);
            assert_eq!(*total, 3);
            assert!(watermark_before.is_none());
            assert_eq!(*watermark_after, Some(ts(300)));
        }
        other => panic!("expected End last, got {other:?}"),
    }
}

#[tokio::test]
async fn sync_stream_with_no_candidates_closes_immediately() {
    let (db, repository) = setup_db_with_repository().await;
    let upstream = FakeUpstream::new();

    let (tx, rx) = mpsc::channel(64);
    stream_sync_forward(&db, &upstream, &repository, tx)
        .await
        .expect("stream should succeed");
    let events = drain(rx).await;

    assert_eq!(events.len(), 2);
    assert!(matches!(
        events[0],
        SyncEvent::Start {
            candidates: 0,
            ..
        }
    ));
    assert!(matches!(
        events[1],
        SyncEvent::End {
            synced: 0,
            total: 0,
            ..
        }
    ));
}

#[tokio::test]
async fn sync_stream_search_failure_is_a_stream_level_failure() {
    let (db, repository) = setup_db_with_repository().await;
    let upstream = FakeUpstream::new();
    upstream.fail_search();

    let (tx, rx) = mpsc::channel(64);
    let err = stream_sync_forward(&db, &upstream, &repository, tx)
        .await
        .expect_err("search failure terminates the stream");
    assert!(matches!(err, mergefeed::SyncError::Upstream(_)));

    let events = drain(rx).await;
    assert!(events.is_empty(), "failure surfaces out-of-band, not as an event");
}
