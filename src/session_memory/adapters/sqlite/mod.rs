//! `SQLite` store file holding one session's records.

mod models;
mod schema;
mod store;

pub use store::{OpenMode, SqliteMemoryFile, SqliteStoreError, SqliteStoreResult};
