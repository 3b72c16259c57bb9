//! Application services for tool discovery, cataloguing and execution.

mod catalog;
mod discovery;
mod execution;

pub use catalog::{CatalogEntry, CatalogSnapshot, DescriptorStore};
pub use discovery::{
    DiscoveryError, DiscoveryReport, ReplacedUnit, SkipReason, SkippedUnit, ToolDiscovery,
};
pub use execution::{ExecutionError, LocalExecutionEngine};
