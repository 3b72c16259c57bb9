//! Diesel row models for session memory stores.

use super::schema::notes;
use diesel::prelude::*;

/// Query result row for memory records.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = notes)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct NoteRow {
    /// Insertion-ordered record identifier.
    pub id: i32,
    /// Write time as Unix milliseconds.
    pub ts: i64,
    /// Speaker or category.
    pub role: String,
    /// Record body.
    pub content: String,
}

/// Insert model for memory records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = notes)]
pub struct NewNoteRow<'a> {
    /// Write time as Unix milliseconds.
    pub ts: i64,
    /// Speaker or category.
    pub role: &'a str,
    /// Record body.
    pub content: &'a str,
}
