//! Error types for server configuration and lifecycle validation.

use super::ProcessState;
use camino::Utf8PathBuf;
use std::io;
use std::sync::Arc;
use thiserror::Error;

/// Errors returned while constructing server domain values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum McpServerDomainError {
    /// The server name is empty after trimming.
    #[error("server name must not be empty")]
    EmptyServerName,

    /// The server name contains unsupported characters.
    #[error("server name '{0}' must contain only lowercase letters, digits, '-' and '_'")]
    InvalidServerName(String),

    /// The server name exceeds the 100-character limit.
    #[error("server name exceeds 100 character limit: {0}")]
    ServerNameTooLong(String),

    /// The launch command is empty after trimming.
    #[error("launch command must not be empty")]
    EmptyCommand,

    /// A process state transition is not permitted.
    #[error("invalid process state transition from {from} to {to}")]
    InvalidStateTransition {
        /// Current state.
        from: ProcessState,
        /// Requested state.
        to: ProcessState,
    },
}

/// Error returned while parsing a process state from text.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown process state: {0}")]
pub struct ParseProcessStateError(pub String);

/// Errors returned while loading a server configuration document.
#[derive(Debug, Clone, Error)]
pub enum ServerConfigError {
    /// The configuration file exists but could not be read.
    #[error("failed to read server configuration {path}: {source}")]
    Unreadable {
        /// Configuration path.
        path: Utf8PathBuf,
        /// Underlying I/O failure.
        source: Arc<io::Error>,
    },

    /// The document is not valid configuration JSON.
    #[error("malformed server configuration: {0}")]
    Malformed(String),

    /// Two entries normalise to the same server name.
    #[error("server '{0}' is declared more than once")]
    DuplicateServer(String),
}
