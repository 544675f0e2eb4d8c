//! Mergefeed - a read-through pagination cache for merged pull requests.
//!
//! This library mirrors the merged pull requests of upstream repositories
//! into a local store and serves keyset-paginated reads over them. Pages
//! missing locally are backfilled from upstream on demand; a forward
//! incremental sync catches newly merged items from a persisted watermark;
//! both operations can also be driven as ordered event streams for live
//! progress reporting.
//!
//! # Features
//!
//! - `github` - The `octocrab`-backed upstream client.
//! - `migrate` - Database migration support via [`connect_and_migrate`].
//! - `sqlite` / `postgres` - Database backends.
//!
//! # Example
//!
//! ```ignore
//! use mergefeed::{GitHubClient, access, connect_and_migrate, sync};
//!
//! let db = connect_and_migrate("sqlite://mergefeed.db?mode=rwc").await?;
//!
//! let repo = access::load_registered(&db, member_id, repository_id).await?;
//! let token = access::github_token(&db, member_id).await?;
//! let client = GitHubClient::new(&token)?;
//!
//! let page = sync::read_page(&db, &client, &repo, 30, None).await?;
//! let report = sync::sync_forward(&db, &client, &repo).await?;
//! ```

pub mod access;
pub mod db;
pub mod entity;
pub mod store;
pub mod sync;
pub mod upstream;

#[cfg(feature = "github")]
pub mod retry;

#[cfg(feature = "github")]
pub mod github;

#[cfg(feature = "migrate")]
pub mod migration;

pub use access::AccessError;
pub use db::connect;
#[cfg(feature = "migrate")]
pub use db::connect_and_migrate;
pub use entity::prelude::*;
#[cfg(feature = "github")]
pub use github::GitHubClient;
pub use store::{PageCursor, StoreError};
pub use sync::SyncError;
pub use upstream::{UpstreamClient, UpstreamError};
