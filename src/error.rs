//! Error types for peekly-service.

use crate::settlement::SettlementError;

/// Errors produced by the service.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A request failed validation before any side effect.
    #[error("validation failed: {0}")]
    Validation(String),

    /// A referenced account or content item does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// An entitlement record already links this account and content.
    #[error("content has already been unlocked for this account")]
    AlreadyViewed,

    /// A like record already links this account and content.
    #[error("content has already been liked by this account")]
    AlreadyLiked,

    /// No like record links this account and content.
    #[error("content has not been liked by this account")]
    NotLiked,

    /// The settlement layer reported a failure.
    #[error(transparent)]
    Settlement(#[from] SettlementError),

    /// Underlying SQLite failure. The raw error is logged at the call
    /// site; the message surfaced to callers stays generic.
    #[error("failed to record in database")]
    Sqlite(#[from] rusqlite::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// I/O error.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Result type alias for peekly-service.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Returns true for errors that reject a request without side effects.
    #[must_use]
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            Error::Validation(_)
                | Error::NotFound(_)
                | Error::AlreadyViewed
                | Error::AlreadyLiked
                | Error::NotLiked
        )
    }
}
