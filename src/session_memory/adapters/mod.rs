//! Persistence adapters for session memory.

pub mod sqlite;
