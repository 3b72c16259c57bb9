//! Durable per-session interaction memory.
//!
//! Each session owns a directory under a configurable root holding a live
//! SQLite store (`memory.db`) while active. Stopping a session renames the
//! store to a timestamped archive so history is never deleted.
//!
//! - Domain types in [`domain`]
//! - `SQLite` persistence in [`adapters`]
//! - Orchestration services in [`services`]

pub mod adapters;
pub mod domain;
pub mod services;
