//! Port contracts for tool instantiation and execution.

mod tool;

pub use tool::{LocalTool, ToolFactory, ToolFault, ToolResult};
