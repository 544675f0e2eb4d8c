//! Initial migration to create the mergefeed database schema.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        self.create_members(manager).await?;
        self.create_access_tokens(manager).await?;
        self.create_repositories(manager).await?;
        self.create_member_repositories(manager).await?;
        self.create_pull_requests(manager).await?;
        self.create_pull_request_commits(manager).await?;
        self.create_pull_request_files(manager).await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(PullRequestFiles::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(PullRequestCommits::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(PullRequests::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(MemberRepositories::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Repositories::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(AccessTokens::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Members::Table).to_owned())
            .await?;
        Ok(())
    }
}

impl Migration {
    async fn create_members(&self, manager: &SchemaManager<'_>) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Members::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Members::Id).uuid().not_null().primary_key())
                    .col(
                        ColumnDef::new(Members::GithubUserId)
                            .big_integer()
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(Members::GithubUsername)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Members::GithubAvatarUrl).text().null())
                    .col(
                        ColumnDef::new(Members::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn create_access_tokens(&self, manager: &SchemaManager<'_>) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(AccessTokens::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AccessTokens::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(AccessTokens::MemberId)
                            .uuid()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(AccessTokens::Token).text().not_null())
                    .col(
                        ColumnDef::new(AccessTokens::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_access_tokens_member")
                            .from(AccessTokens::Table, AccessTokens::MemberId)
                            .to(Members::Table, Members::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn create_repositories(&self, manager: &SchemaManager<'_>) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Repositories::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Repositories::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Repositories::GithubRepoId)
                            .big_integer()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Repositories::Name).string().not_null())
                    .col(
                        ColumnDef::new(Repositories::FullName)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Repositories::HtmlUrl).text().null())
                    .col(
                        ColumnDef::new(Repositories::IsPrivate)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Repositories::LastSyncedMergedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Repositories::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn create_member_repositories(&self, manager: &SchemaManager<'_>) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(MemberRepositories::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(MemberRepositories::MemberId)
                            .uuid()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(MemberRepositories::RepositoryId)
                            .uuid()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(MemberRepositories::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .primary_key(
                        Index::create()
                            .col(MemberRepositories::MemberId)
                            .col(MemberRepositories::RepositoryId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_member_repositories_member")
                            .from(MemberRepositories::Table, MemberRepositories::MemberId)
                            .to(Members::Table, Members::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_member_repositories_repository")
                            .from(MemberRepositories::Table, MemberRepositories::RepositoryId)
                            .to(Repositories::Table, Repositories::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn create_pull_requests(&self, manager: &SchemaManager<'_>) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(PullRequests::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PullRequests::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    // Identity
                    .col(ColumnDef::new(PullRequests::RepositoryId).uuid().not_null())
                    .col(
                        ColumnDef::new(PullRequests::GithubPrId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(PullRequests::Number).integer().not_null())
                    // Content
                    .col(ColumnDef::new(PullRequests::Title).text().not_null())
                    .col(ColumnDef::new(PullRequests::Body).text().null())
                    .col(ColumnDef::new(PullRequests::Author).string().null())
                    .col(ColumnDef::new(PullRequests::HtmlUrl).text().null())
                    .col(ColumnDef::new(PullRequests::State).string().null())
                    // Upstream timestamps
                    .col(
                        ColumnDef::new(PullRequests::CreatedAtGithub)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(PullRequests::UpdatedAtGithub)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(PullRequests::ClosedAtGithub)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(PullRequests::MergedAtGithub)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    // Statistics
                    .col(ColumnDef::new(PullRequests::ChangedFiles).integer().null())
                    .col(ColumnDef::new(PullRequests::Additions).integer().null())
                    .col(ColumnDef::new(PullRequests::Deletions).integer().null())
                    .col(ColumnDef::new(PullRequests::CommitCount).integer().null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_pull_requests_repository")
                            .from(PullRequests::Table, PullRequests::RepositoryId)
                            .to(Repositories::Table, Repositories::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Natural key for idempotent upserts.
        manager
            .create_index(
                Index::create()
                    .name("uq_pull_requests_repository_github_pr_id")
                    .table(PullRequests::Table)
                    .col(PullRequests::RepositoryId)
                    .col(PullRequests::GithubPrId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Covering index for the keyset page predicate and MAX(merged_at).
        manager
            .create_index(
                Index::create()
                    .name("ix_pull_requests_keyset")
                    .table(PullRequests::Table)
                    .col(PullRequests::RepositoryId)
                    .col(PullRequests::MergedAtGithub)
                    .col(PullRequests::Number)
                    .to_owned(),
            )
            .await
    }

    async fn create_pull_request_commits(&self, manager: &SchemaManager<'_>) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(PullRequestCommits::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PullRequestCommits::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(PullRequestCommits::PullRequestId)
                            .uuid()
                            .not_null(),
                    )
                    .col(ColumnDef::new(PullRequestCommits::Sha).string().not_null())
                    .col(
                        ColumnDef::new(PullRequestCommits::Subject)
                            .text()
                            .not_null(),
                    )
                    .col(ColumnDef::new(PullRequestCommits::Author).string().null())
                    .col(
                        ColumnDef::new(PullRequestCommits::CommittedAtGithub)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_pull_request_commits_pull_request")
                            .from(PullRequestCommits::Table, PullRequestCommits::PullRequestId)
                            .to(PullRequests::Table, PullRequests::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("ix_pull_request_commits_pull_request_id")
                    .table(PullRequestCommits::Table)
                    .col(PullRequestCommits::PullRequestId)
                    .to_owned(),
            )
            .await
    }

    async fn create_pull_request_files(&self, manager: &SchemaManager<'_>) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(PullRequestFiles::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PullRequestFiles::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(PullRequestFiles::PullRequestId)
                            .uuid()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PullRequestFiles::Filename)
                            .text()
                            .not_null(),
                    )
                    .col(ColumnDef::new(PullRequestFiles::Status).string().null())
                    .col(ColumnDef::new(PullRequestFiles::Additions).integer().null())
                    .col(ColumnDef::new(PullRequestFiles::Deletions).integer().null())
                    .col(ColumnDef::new(PullRequestFiles::Changes).integer().null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_pull_request_files_pull_request")
                            .from(PullRequestFiles::Table, PullRequestFiles::PullRequestId)
                            .to(PullRequests::Table, PullRequests::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("ix_pull_request_files_pull_request_id")
                    .table(PullRequestFiles::Table)
                    .col(PullRequestFiles::PullRequestId)
                    .to_owned(),
            )
            .await
    }
}

#[derive(DeriveIden)]
enum Members {
    Table,
    Id,
    GithubUserId,
    GithubUsername,
    GithubAvatarUrl,
    CreatedAt,
}

#[derive(DeriveIden)]
enum AccessTokens {
    Table,
    Id,
    MemberId,
    Token,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Repositories {
    Table,
    Id,
    GithubRepoId,
    Name,
    FullName,
    HtmlUrl,
    IsPrivate,
    LastSyncedMergedAt,
    CreatedAt,
}

#[derive(DeriveIden)]
enum MemberRepositories {
    Table,
    MemberId,
    RepositoryId,
    CreatedAt,
}

#[derive(DeriveIden)]
enum PullRequests {
    Table,
    Id,
    RepositoryId,
    GithubPrId,
    Number,
    Title,
    Body,
    Author,
    HtmlUrl,
    State,
    CreatedAtGithub,
    UpdatedAtGithub,
    ClosedAtGithub,
    MergedAtGithub,
    ChangedFiles,
    Additions,
    Deletions,
    CommitCount,
}

#[derive(DeriveIden)]
enum PullRequestCommits {
    Table,
    Id,
    PullRequestId,
    Sha,
    Subject,
    Author,
    CommittedAtGithub,
}

#[derive(DeriveIden)]
enum PullRequestFiles {
    Table,
    Id,
    PullRequestId,
    Filename,
    Status,
    Additions,
    Deletions,
    Changes,
}
