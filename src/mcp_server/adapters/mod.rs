//! Adapter implementations of the process host port.

mod memory;
mod process;

pub use memory::InMemoryProcessHost;
pub use process::TokioProcessHost;
