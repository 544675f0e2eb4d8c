//! Read-through pagination and incremental sync engines.
//!
//! # Module Structure
//!
//! - [`types`] - Result types and tuning constants
//! - [`events`] - Ordered event sequences for streaming clients
//! - [`pipeline`] - The shared upsert pipeline (bulk and single entry points)
//! - [`engine`] - `read_page`, `sync_forward`, `refresh_one`
//! - [`stream`] - Streaming wrappers emitting events while they work
//!
//! # Example
//!
//! ```ignore
//! use mergefeed::sync::{read_page, sync_forward};
//! use mergefeed::store::PageCursor;
//!
//! let page = read_page(&db, &client, &repo, 30, None).await?;
//! println!("{} items, more: {}", page.items.len(), page.has_more);
//!
//! let report = sync_forward(&db, &client, &repo).await?;
//! println!("synced {}/{}", report.synced_count, report.candidate_count);
//! ```

pub mod engine;
mod errors;
mod events;
pub mod pipeline;
mod stream;
mod types;

pub use engine::{read_page, refresh_one, sync_forward};
pub use errors::SyncError;
pub use events::{ItemSource, PageEvent, SyncEvent};
pub use stream::{stream_page, stream_sync_forward};
pub use types::{
    CHILD_FETCH_CONCURRENCY, DETAIL_FETCH_CONCURRENCY, ForwardSyncReport, MAX_COMMITS_PER_PULL,
    MAX_FILES_PER_PULL, MAX_SEARCH_PAGES, PageReadResult, SEARCH_PAGE_SIZE,
};
