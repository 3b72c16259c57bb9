//! Port contracts for spawning and terminating server processes.

mod host;

pub use host::{ManagedProcess, ProcessExit, ServerHostError, ServerHostResult, ServerProcessHost};
