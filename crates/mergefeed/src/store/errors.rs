use sea_orm::DbErr;
use thiserror::Error;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database error from sea-orm.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),

    /// Client supplied an unusable pagination cursor. No I/O is performed
    /// when this is returned.
    #[error("Invalid cursor: {message}")]
    InvalidCursor { message: String },

    /// Row lookup came up empty where one was required.
    #[error("Not found: {context}")]
    NotFound { context: String },
}

impl StoreError {
    /// Create an InvalidCursor error.
    pub fn invalid_cursor(message: impl Into<String>) -> Self {
        Self::InvalidCursor {
            message: message.into(),
        }
    }

    /// Create a NotFound error.
    pub fn not_found(context: impl Into<String>) -> Self {
        Self::NotFound {
            context: context.into(),
        }
    }
}

/// Result type alias for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
