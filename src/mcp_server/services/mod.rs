//! Application services for server lifecycle orchestration.

mod manager;

pub use manager::{ServerManager, ServerManagerError, ServerManagerResult, ServerStatus};
