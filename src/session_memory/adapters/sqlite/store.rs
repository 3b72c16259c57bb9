//! Diesel-backed access to a single `memory.db` or archive file.

use super::{
    models::{NewNoteRow, NoteRow},
    schema::notes,
};
use crate::session_memory::domain::MemoryRecord;
use camino::{Utf8Path, Utf8PathBuf};
use chrono::DateTime;
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use std::fmt;
use thiserror::Error;

/// Fixed record schema; applied idempotently when a store is started.
const CREATE_NOTES_TABLE: &str = "CREATE TABLE IF NOT EXISTS notes (\
    id INTEGER PRIMARY KEY AUTOINCREMENT, \
    ts BIGINT NOT NULL, \
    role TEXT NOT NULL, \
    content TEXT NOT NULL)";

/// Result type for store file operations.
pub type SqliteStoreResult<T> = Result<T, SqliteStoreError>;

/// How a store file is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    /// Read-write, creating the file when missing.
    Create,
    /// Read-write; the file must exist.
    ReadWrite,
    /// Read-only; the file must exist and is never modified.
    ReadOnly,
}

impl OpenMode {
    const fn uri_mode(self) -> &'static str {
        match self {
            Self::Create => "rwc",
            Self::ReadWrite => "rw",
            Self::ReadOnly => "ro",
        }
    }
}

/// Errors returned by store file operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SqliteStoreError {
    /// The file could not be opened as a database.
    #[error("failed to open session store {path}: {reason}")]
    Open {
        /// Store path.
        path: Utf8PathBuf,
        /// Driver message.
        reason: String,
    },

    /// A statement failed, typically because the file is not a valid store.
    #[error("session store {path} rejected a query: {reason}")]
    Query {
        /// Store path.
        path: Utf8PathBuf,
        /// Driver message.
        reason: String,
    },

    /// A stored value cannot be represented in the domain.
    #[error("session store {path} holds an invalid value: {reason}")]
    InvalidValue {
        /// Store path.
        path: Utf8PathBuf,
        /// Description of the offending value.
        reason: String,
    },
}

/// Open connection to one store file.
///
/// Each insert runs in autocommit mode and is durable once it returns.
/// Concurrent writers to the same file are not supported.
pub struct SqliteMemoryFile {
    path: Utf8PathBuf,
    connection: SqliteConnection,
}

impl fmt::Debug for SqliteMemoryFile {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("SqliteMemoryFile")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl SqliteMemoryFile {
    /// Opens the store at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError::Open`] when the driver cannot open the
    /// file in the requested mode.
    pub fn open(path: &Utf8Path, mode: OpenMode) -> SqliteStoreResult<Self> {
        let uri = format!("file:{}?mode={}", escape_uri_path(path.as_str()), mode.uri_mode());
        let connection = SqliteConnection::establish(&uri).map_err(|err| SqliteStoreError::Open {
            path: path.to_owned(),
            reason: err.to_string(),
        })?;
        Ok(Self {
            path: path.to_owned(),
            connection,
        })
    }

    /// Returns the store path.
    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    /// Applies the record schema.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError::Query`] when the statement fails.
    pub fn initialise(&mut self) -> SqliteStoreResult<()> {
        diesel::sql_query(CREATE_NOTES_TABLE)
            .execute(&mut self.connection)
            .map_err(|err| self.query_error(&err))?;
        Ok(())
    }

    /// Appends a record.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError::Query`] when the insert fails.
    pub fn insert(&mut self, record: &MemoryRecord) -> SqliteStoreResult<()> {
        let row = NewNoteRow {
            ts: record.timestamp.timestamp_millis(),
            role: &record.role,
            content: &record.content,
        };
        diesel::insert_into(notes::table)
            .values(&row)
            .execute(&mut self.connection)
            .map_err(|err| self.query_error(&err))?;
        Ok(())
    }

    /// Counts the stored records.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError::Query`] when the file is not a valid store.
    pub fn count(&mut self) -> SqliteStoreResult<u64> {
        let total: i64 = notes::table
            .count()
            .get_result(&mut self.connection)
            .map_err(|err| self.query_error(&err))?;
        u64::try_from(total).map_err(|_| SqliteStoreError::InvalidValue {
            path: self.path.clone(),
            reason: format!("negative record count {total}"),
        })
    }

    /// Returns all records in insertion order.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the query fails or a timestamp is
    /// out of range.
    pub fn records(&mut self) -> SqliteStoreResult<Vec<MemoryRecord>> {
        let rows = notes::table
            .order(notes::id.asc())
            .select(NoteRow::as_select())
            .load::<NoteRow>(&mut self.connection)
            .map_err(|err| self.query_error(&err))?;
        rows.into_iter().map(|row| self.row_to_record(row)).collect()
    }

    fn row_to_record(&self, row: NoteRow) -> SqliteStoreResult<MemoryRecord> {
        let timestamp =
            DateTime::from_timestamp_millis(row.ts).ok_or_else(|| SqliteStoreError::InvalidValue {
                path: self.path.clone(),
                reason: format!("timestamp {} out of range in record {}", row.ts, row.id),
            })?;
        Ok(MemoryRecord {
            timestamp,
            role: row.role,
            content: row.content,
        })
    }

    fn query_error(&self, err: &diesel::result::Error) -> SqliteStoreError {
        SqliteStoreError::Query {
            path: self.path.clone(),
            reason: err.to_string(),
        }
    }
}

/// Escapes the characters that carry meaning inside an `SQLite` URI.
fn escape_uri_path(path: &str) -> String {
    let mut escaped = String::with_capacity(path.len());
    for character in path.chars() {
        match character {
            '%' => escaped.push_str("%25"),
            '?' => escaped.push_str("%3f"),
            '#' => escaped.push_str("%23"),
            other => escaped.push(other),
        }
    }
    escaped
}
