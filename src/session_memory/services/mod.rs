//! Application services for session memory.

mod store;

pub use store::{SessionMemoryStore, SessionStoreError, SessionStoreResult};
