//! GitHub API error classification.

use chrono::Utc;

use crate::upstream::UpstreamError;

/// Check if an error indicates a rate limit (403/429, or a JSON parse error
/// from the empty body GitHub returns when secondary limits trip).
pub fn is_rate_limit_error(e: &octocrab::Error) -> bool {
    match e {
        octocrab::Error::GitHub { source, .. } => {
            let status = source.status_code.as_u16();
            status == 403 || status == 429
        }
        octocrab::Error::Json { .. } => true,
        _ => false,
    }
}

/// Classify an octocrab error into the upstream error taxonomy.
///
/// `resource` labels what was being fetched for NotFound messages.
pub fn classify(e: octocrab::Error, resource: &str) -> UpstreamError {
    match &e {
        octocrab::Error::GitHub { source, .. } => match source.status_code.as_u16() {
            401 => UpstreamError::AuthRequired,
            404 => UpstreamError::not_found(resource),
            403 | 429 => UpstreamError::RateLimited {
                reset_at: Utc::now(),
            },
            _ => UpstreamError::api(format!("{resource}: {source}")),
        },
        _ => UpstreamError::network(format!("{resource}: {e}")),
    }
}
