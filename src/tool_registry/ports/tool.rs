//! Capability port implemented by every executable tool.

use crate::tool_registry::domain::ToolArguments;
use async_trait::async_trait;
use serde_json::Value;
use std::fmt;
use thiserror::Error;

/// Result type returned by tool implementations.
pub type ToolResult = Result<Value, ToolFault>;

/// Execution contract for a single tool instance.
///
/// Instances are created fresh for every call by a [`ToolFactory`] and are
/// dropped once the call completes, so no mutable state survives between
/// calls.
#[async_trait]
pub trait LocalTool: Send {
    /// Runs the tool with the supplied named arguments.
    async fn execute(&mut self, arguments: ToolArguments) -> ToolResult;
}

/// Creates tool instances for the execution engine.
pub trait ToolFactory: Send + Sync + fmt::Debug {
    /// Creates a fresh tool instance.
    fn instantiate(&self) -> Box<dyn LocalTool>;
}

/// Faults a tool may report instead of a value.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ToolFault {
    /// The tool rejected the arguments it received.
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),

    /// The tool failed while running.
    #[error("tool failed: {0}")]
    Failed(String),
}

impl ToolFault {
    /// Creates an invalid-arguments fault.
    pub fn invalid_arguments(reason: impl Into<String>) -> Self {
        Self::InvalidArguments(reason.into())
    }

    /// Creates an execution failure.
    pub fn failed(reason: impl Into<String>) -> Self {
        Self::Failed(reason.into())
    }
}
