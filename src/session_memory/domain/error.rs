//! Error types for session memory validation.

use thiserror::Error;

/// Errors returned while constructing session domain values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SessionDomainError {
    /// The session name is empty after trimming.
    #[error("session name must not be empty")]
    EmptySessionName,

    /// The session name contains characters outside `[A-Za-z0-9_-]`.
    #[error("session name '{0}' must contain only letters, digits, '-' and '_'")]
    InvalidSessionName(String),

    /// The session name exceeds the 100-character limit.
    #[error("session name exceeds 100 character limit: {0}")]
    SessionNameTooLong(String),

    /// The file name does not denote a session archive.
    #[error("'{0}' is not a session archive file name")]
    InvalidArchiveName(String),
}
