//! Conversion from raw GitHub payloads to upstream record shapes.

use chrono::SecondsFormat;

use crate::upstream::{MergedSearchFilter, PullCommit, PullDetail, PullFile, SearchPage};

use super::types::{RawPullCommit, RawPullDetail, RawPullFile, SearchIssuesResponse};

/// Build the search qualifier string for merged pulls of a repository.
///
/// `merged_before` maps to the exclusive `merged:<` qualifier, `merged_after`
/// to the inclusive `merged:>=` qualifier.
pub fn build_search_query(full_name: &str, filter: &MergedSearchFilter) -> String {
    let mut parts = vec![
        format!("repo:{full_name}"),
        "is:pr".to_string(),
        "is:merged".to_string(),
    ];

    if let Some(after) = filter.merged_after {
        parts.push(format!(
            "merged:>={}",
            after.to_rfc3339_opts(SecondsFormat::Secs, true)
        ));
    }
    if let Some(before) = filter.merged_before {
        parts.push(format!(
            "merged:<{}",
            before.to_rfc3339_opts(SecondsFormat::Secs, true)
        ));
    }

    parts.join(" ")
}

/// Reduce a search response to the pull request numbers it contains.
pub fn to_search_page(response: SearchIssuesResponse) -> SearchPage {
    SearchPage {
        total_count: response.total_count,
        numbers: response
            .items
            .into_iter()
            .filter(|item| item.pull_request.is_some())
            .map(|item| item.number)
            .collect(),
    }
}

/// Convert a raw pull detail into the boundary record.
pub fn to_pull_detail(raw: RawPullDetail) -> PullDetail {
    PullDetail {
        id: raw.id,
        number: raw.number,
        title: raw.title.unwrap_or_default(),
        body: raw.body,
        author: raw.user.and_then(|user| user.login),
        html_url: raw.html_url,
        state: raw.state,
        created_at: raw.created_at,
        updated_at: raw.updated_at,
        closed_at: raw.closed_at,
        merged_at: raw.merged_at,
        changed_files: raw.changed_files,
        additions: raw.additions,
        deletions: raw.deletions,
        commit_count: raw.commits,
    }
}

/// Convert a raw commit into the boundary record.
///
/// The commit message is reduced to its trimmed first line; the committer
/// date wins over the author date when both are present.
pub fn to_pull_commit(raw: RawPullCommit) -> PullCommit {
    let info = raw.commit;

    let subject = info
        .as_ref()
        .and_then(|info| info.message.as_deref())
        .map(first_line)
        .unwrap_or_default();

    let committed_at = info.as_ref().and_then(|info| {
        info.committer
            .as_ref()
            .and_then(|actor| actor.date)
            .or_else(|| info.author.as_ref().and_then(|actor| actor.date))
    });

    let author = raw
        .author
        .and_then(|user| user.login)
        .or_else(|| {
            info.as_ref()
                .and_then(|info| info.author.as_ref())
                .and_then(|actor| actor.name.clone())
        });

    PullCommit {
        sha: raw.sha.unwrap_or_default(),
        subject,
        author,
        committed_at,
    }
}

/// Convert a raw changed file into the boundary record.
pub fn to_pull_file(raw: RawPullFile) -> PullFile {
    PullFile {
        filename: raw.filename.map(|name| name.trim().to_string()).unwrap_or_default(),
        status: raw.status,
        additions: raw.additions,
        deletions: raw.deletions,
        changes: raw.changes,
    }
}

fn first_line(message: &str) -> String {
    message.trim().lines().next().unwrap_or_default().trim().to_string()
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::github::types::{RawCommitInfo, RawGitActor, RawUser};

    #[test]
    fn search_query_without_bounds() {
        let q = build_search_query("octocat/hello-world", &MergedSearchFilter::default());
        assert_eq!(q, "repo:octocat/hello-world is:pr is:merged");
    }

    #[test]
    fn search_query_bounds_use_asymmetric_operators() {
        let after = Utc.timestamp_opt(0, 0).single().expect("epoch");
        let before = Utc.timestamp_opt(86_400, 0).single().expect("epoch");

        let q = build_search_query(
            "octocat/hello-world",
            &MergedSearchFilter {
                merged_before: Some(before),
                merged_after: Some(after),
            },
        );

        assert!(q.contains("merged:>=1970-01-01T00:00:00Z"), "got: {q}");
        assert!(q.contains("merged:<1970-01-02T00:00:00Z"), "got: {q}");
    }

    #[test]
    fn commit_subject_is_first_line_only() {
        let raw = RawPullCommit {
            sha: Some("abc123".to_string()),
            commit: Some(RawCommitInfo {
                message: Some("  fix flaky retry test\n\nlong explanation body\n".to_string()),
                author: Some(RawGitActor {
                    name: Some("Octo Cat".to_string()),
                    date: None,
                }),
                committer: None,
            }),
            author: None,
        };

        let commit = to_pull_commit(raw);
        assert_eq!(commit.subject, "fix flaky retry test");
        assert_eq!(commit.author.as_deref(), Some("Octo Cat"));
    }

    #[test]
    fn commit_author_login_wins_over_git_name() {
        let raw = RawPullCommit {
            sha: Some("abc123".to_string()),
            commit: Some(RawCommitInfo {
                message: Some("one".to_string()),
                author: Some(RawGitActor {
                    name: Some("Git Name".to_string()),
                    date: Some(Utc.timestamp_opt(100, 0).single().expect("epoch")),
                }),
                committer: Some(RawGitActor {
                    name: None,
                    date: Some(Utc.timestamp_opt(200, 0).single().expect("epoch")),
                }),
            }),
            author: Some(RawUser {
                login: Some("octocat".to_string()),
            }),
        };

        let commit = to_pull_commit(raw);
        assert_eq!(commit.author.as_deref(), Some("octocat"));
        // Committer date wins over author date.
        assert_eq!(
            commit.committed_at,
            Utc.timestamp_opt(200, 0).single(),
        );
    }

    #[test]
    fn empty_commit_message_yields_empty_subject() {
        let raw = RawPullCommit {
            sha: Some("abc123".to_string()),
            commit: Some(RawCommitInfo {
                message: Some("   \n\n".to_string()),
                author: None,
                committer: None,
            }),
            author: None,
        };

        assert!(to_pull_commit(raw).subject.is_empty());
    }
}
