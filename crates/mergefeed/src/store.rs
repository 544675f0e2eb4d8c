//! Store operations for mirrored pull requests.
//!
//! This module owns everything that touches the local tables: the keyset page
//! reader, idempotent upserts with wholesale child replacement, and the
//! per-repository sync watermark.

mod errors;
mod page;
mod upsert;
mod watermark;

pub use errors::{Result, StoreError};
pub use page::{PageCursor, fetch_page};
pub use upsert::{
    DEFAULT_UPSERT_BACKOFF_MS, DEFAULT_UPSERT_RETRIES, find_by_number, find_by_numbers,
    replace_children, upsert_pulls, upsert_pulls_with_retry,
};
pub use watermark::{advance_watermark, latest_merged_at};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_cursor_message_is_preserved() {
        let err = StoreError::invalid_cursor("number must be positive");
        assert!(err.to_string().contains("number must be positive"));
    }

    #[test]
    fn not_found_mentions_context() {
        let err = StoreError::not_found("pull request number=42");
        let msg = err.to_string();
        assert!(msg.contains("Not found"));
        assert!(msg.contains("number=42"));
    }
}
