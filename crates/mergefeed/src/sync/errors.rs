use thiserror::Error;

use crate::store::StoreError;
use crate::upstream::UpstreamError;

/// Errors surfaced by the sync engines.
///
/// Operation-level failures only: per-item fetch failures inside a bulk batch
/// are absorbed by the pipeline and reflected in reduced counts, never here.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Store operation failed (includes cursor validation).
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Upstream search or single-item refresh failed.
    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    /// Malformed client input, rejected before any I/O.
    #[error("Invalid input: {message}")]
    InvalidInput { message: String },
}

impl SyncError {
    /// Create an InvalidInput error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }
}
