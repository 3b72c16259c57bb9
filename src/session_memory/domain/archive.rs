//! Live store and archive file naming.

use super::{SessionDomainError, SessionName};
use serde::Serialize;

/// File name of a session's live store.
pub const LIVE_STORE_FILE: &str = "memory.db";

/// Prefix shared by archive file names.
pub const ARCHIVE_PREFIX: &str = "memory_";

/// Suffix shared by archive file names.
pub const ARCHIVE_SUFFIX: &str = ".db.bak";

/// Returns the archive file name for `unix_seconds`, with an optional
/// collision counter.
#[must_use]
pub fn archive_file_name(unix_seconds: i64, counter: Option<u32>) -> String {
    match counter {
        None => format!("{ARCHIVE_PREFIX}{unix_seconds}{ARCHIVE_SUFFIX}"),
        Some(n) => format!("{ARCHIVE_PREFIX}{unix_seconds}_{n}{ARCHIVE_SUFFIX}"),
    }
}

/// An archived store belonging to a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArchiveFile {
    session: SessionName,
    file_name: String,
}

impl ArchiveFile {
    /// Creates an archive reference after checking the file name shape.
    ///
    /// # Errors
    ///
    /// Returns [`SessionDomainError::InvalidArchiveName`] when `file_name` is
    /// not of the form `memory_<...>.db.bak` or contains a path separator.
    pub fn new(
        session: SessionName,
        file_name: impl Into<String>,
    ) -> Result<Self, SessionDomainError> {
        let candidate = file_name.into();
        if !is_archive_name(&candidate) {
            return Err(SessionDomainError::InvalidArchiveName(candidate));
        }
        Ok(Self {
            session,
            file_name: candidate,
        })
    }

    /// Returns the owning session.
    #[must_use]
    pub const fn session(&self) -> &SessionName {
        &self.session
    }

    /// Returns the archive file name inside the session directory.
    #[must_use]
    pub fn file_name(&self) -> &str {
        &self.file_name
    }
}

/// Returns whether `file_name` has the archive shape.
pub(crate) fn is_archive_name(file_name: &str) -> bool {
    let Some(stem) = file_name
        .strip_prefix(ARCHIVE_PREFIX)
        .and_then(|rest| rest.strip_suffix(ARCHIVE_SUFFIX))
    else {
        return false;
    };
    !stem.is_empty()
        && stem
            .chars()
            .all(|character| character.is_ascii_digit() || character == '_')
}
