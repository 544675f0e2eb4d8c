//! Integration tests for the read-through page reader and backfill engine.

#![cfg(all(feature = "sqlite", feature = "migrate"))]

mod support;

use mergefeed::store::PageCursor;
use mergefeed::sync::{SyncError, read_page};

use support::{FakeUpstream, reload_repository, setup_db_with_repository, ts};

#[tokio::test]
async fn backfills_an_empty_store_and_reports_more_available() {
    let (db, repository) = setup_db_with_repository().await;
    let upstream = FakeUpstream::new();
    upstream.add_merged(5, 10);
    upstream.add_merged(4, 9);
    upstream.add_merged(3, 8);

    let page = read_page(&db, &upstream, &repository, 2, None)
        .await
        .expect("read should backfill");

    let numbers: Vec<i32> = page.items.iter().map(|m| m.number).collect();
    assert_eq!(numbers, vec![5, 4]);
    assert!(page.has_more);

    let cursor = page.next_cursor.expect("cursor present");
    assert_eq!(cursor.number, 4);
    assert_eq!(cursor.merged_at, ts(9));

    // Backfill advanced the watermark from store contents.
    let repository = reload_repository(&db, repository.id).await;
    let watermark = repository
        .last_synced_merged_at
        .expect("watermark after backfill");
    assert_eq!(watermark.with_timezone(&chrono::Utc), ts(10));
}

#[tokio::test]
async fn follows_the_cursor_to_the_last_page() {
    let (db, repository) = setup_db_with_repository().await;
    let upstream = FakeUpstream::new();
    upstream.add_merged(5, 10);
    upstream.add_merged(4, 9);
    upstream.add_merged(3, 8);

    let first = read_page(&db, &upstream, &repository, 2, None)
        .await
        .expect("first page");
    let second = read_page(&db, &upstream, &repository, 2, first.next_cursor)
        .await
        .expect("second page");

    let numbers: Vec<i32> = second.items.iter().map(|m| m.number).collect();
    assert_eq!(numbers, vec![3]);
    assert!(!second.has_more, "a genuinely short page is terminal");
}

#[tokio::test]
async fn cursor_past_all_upstream_data_terminates_without_looping() {
    let (db, repository) = setup_db_with_repository().await;
    let upstream = FakeUpstream::new();
    upstream.add_merged(5, 10);

    let cursor = PageCursor {
        merged_at: ts(1),
        number: 1,
    };
    let page = read_page(&db, &upstream, &repository, 2, Some(cursor))
        .await
        .expect("read should terminate");

    assert!(page.items.is_empty());
    assert!(!page.has_more);
    assert!(page.next_cursor.is_none());
    assert_eq!(
        upstream.search_calls(),
        1,
        "one search proves the upstream is exhausted; no retry loop"
    );
}

#[tokio::test]
async fn full_cache_serves_pages_without_touching_upstream() {
    let (db, repository) = setup_db_with_repository().await;
    let upstream = FakeUpstream::new();
    upstream.add_merged(5, 10);
    upstream.add_merged(4, 9);
    upstream.add_merged(3, 8);

    // Warm the cache, then break the upstream.
    read_page(&db, &upstream, &repository, 2, None)
        .await
        .expect("warmup read");
    upstream.fail_search();

    let page = read_page(&db, &upstream, &repository, 2, None)
        .await
        .expect("cached read must not hit upstream");

    let numbers: Vec<i32> = page.items.iter().map(|m| m.number).collect();
    assert_eq!(numbers, vec![5, 4]);
    assert!(page.has_more);
}

#[tokio::test]
async fn ties_on_merge_time_are_broken_by_number() {
    let (db, repository) = setup_db_with_repository().await;
    let upstream = FakeUpstream::new();
    upstream.add_merged(7, 10);
    upstream.add_merged(8, 10);
    upstream.add_merged(9, 10);

    let first = read_page(&db, &upstream, &repository, 2, None)
        .await
        .expect("first page");
    let numbers: Vec<i32> = first.items.iter().map(|m| m.number).collect();
    assert_eq!(numbers, vec![9, 8]);

    let second = read_page(&db, &upstream, &repository, 2, first.next_cursor)
        .await
        .expect("second page");
    let numbers: Vec<i32> = second.items.iter().map(|m| m.number).collect();
    assert_eq!(numbers, vec![7], "equal timestamps page without gaps");
}

#[tokio::test]
async fn zero_limit_is_rejected_before_any_io() {
    let (db, repository) = setup_db_with_repository().await;
    let upstream = FakeUpstream::new();

    let err = read_page(&db, &upstream, &repository, 0, None)
        .await
        .expect_err("zero limit is a client error");

    assert!(matches!(err, SyncError::InvalidInput { .. }));
    assert_eq!(upstream.search_calls(), 0);
}

#[tokio::test]
async fn search_failure_is_fatal_to_the_read() {
    let (db, repository) = setup_db_with_repository().await;
    let upstream = FakeUpstream::new();
    upstream.fail_search();

    let err = read_page(&db, &upstream, &repository, 2, None)
        .await
        .expect_err("search failure must not be swallowed");

    assert!(matches!(err, SyncError::Upstream(_)));
}

#[tokio::test]
async fn non_merged_upstream_items_are_never_stored() {
    let (db, repository) = setup_db_with_repository().await;
    let upstream = FakeUpstream::new();
    upstream.add_merged(2, 5);
    upstream.add_unmerged(3);

    let page = read_page(&db, &upstream, &repository, 5, None)
        .await
        .expect("read should succeed");

    let numbers: Vec<i32> = page.items.iter().map(|m| m.number).collect();
    assert_eq!(numbers, vec![2]);
}
