//! SeaORM entity definitions for the mergefeed database schema.

pub mod access_token;
pub mod member;
pub mod member_repository;
pub mod prelude;
pub mod pull_request;
pub mod pull_request_commit;
pub mod pull_request_file;
pub mod repository;
