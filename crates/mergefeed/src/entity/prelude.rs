//! Re-exports of all entity types for convenient glob imports.

pub use super::access_token::Entity as AccessToken;
pub use super::member::Entity as Member;
pub use super::member_repository::Entity as MemberRepository;
pub use super::pull_request::Entity as PullRequest;
pub use super::pull_request_commit::Entity as PullRequestCommit;
pub use super::pull_request_file::Entity as PullRequestFile;
pub use super::repository::Entity as Repository;
