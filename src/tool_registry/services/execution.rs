//! Local execution of catalogued tools.

use super::catalog::DescriptorStore;
use crate::tool_registry::{
    domain::{InvocationId, ToolArguments, ToolOutput},
    ports::ToolFault,
};
use std::any::Any;
use std::sync::Arc;
use thiserror::Error;
use tracing::{Instrument, debug, info_span, warn};

/// Errors returned by [`LocalExecutionEngine::execute`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ExecutionError {
    /// No catalogued tool has the identifier.
    #[error("tool '{0}' not found")]
    NotFound(String),

    /// The tool rejected its arguments.
    #[error("tool '{tool}' rejected its arguments: {reason}")]
    InvalidArguments {
        /// Tool identifier.
        tool: String,
        /// Reason reported by the tool.
        reason: String,
    },

    /// The tool failed or panicked while running.
    #[error("tool '{tool}' failed: {reason}")]
    ExecutionFault {
        /// Tool identifier.
        tool: String,
        /// Failure description.
        reason: String,
    },
}

/// Runs catalogued tools in-process.
///
/// Every call instantiates a fresh tool from its factory and runs it in a
/// dedicated task, so a panicking tool surfaces as
/// [`ExecutionError::ExecutionFault`] rather than unwinding into the caller.
#[derive(Debug, Clone)]
pub struct LocalExecutionEngine {
    store: Arc<DescriptorStore>,
}

impl LocalExecutionEngine {
    /// Creates an engine reading from `store`.
    #[must_use]
    pub const fn new(store: Arc<DescriptorStore>) -> Self {
        Self { store }
    }

    /// Executes the tool identified by `id`.
    ///
    /// # Errors
    ///
    /// Returns [`ExecutionError::NotFound`] for unknown identifiers,
    /// [`ExecutionError::InvalidArguments`] when the tool rejects its input
    /// and [`ExecutionError::ExecutionFault`] when it fails or panics.
    pub async fn execute(
        &self,
        id: &str,
        arguments: ToolArguments,
    ) -> Result<ToolOutput, ExecutionError> {
        let snapshot = self.store.snapshot();
        let entry = snapshot
            .get(id)
            .ok_or_else(|| ExecutionError::NotFound(id.to_owned()))?;
        let tool_id = entry.descriptor().id().clone();
        let invocation_id = InvocationId::new();
        let span = info_span!("tool_execution", tool_id = %tool_id, invocation_id = %invocation_id);

        let mut tool = entry.factory().instantiate();
        let handle = tokio::spawn(async move { tool.execute(arguments).await }.instrument(span));

        let outcome = match handle.await {
            Ok(outcome) => outcome,
            Err(err) => {
                let reason = if err.is_panic() {
                    format!("tool panicked: {}", panic_message(err.into_panic().as_ref()))
                } else {
                    "tool task was cancelled".to_owned()
                };
                warn!(tool_id = %tool_id, %invocation_id, %reason, "tool execution aborted");
                return Err(ExecutionError::ExecutionFault {
                    tool: tool_id.to_string(),
                    reason,
                });
            }
        };

        match outcome {
            Ok(payload) => {
                debug!(tool_id = %tool_id, %invocation_id, "tool execution succeeded");
                Ok(ToolOutput {
                    tool_id,
                    invocation_id,
                    payload,
                })
            }
            Err(ToolFault::InvalidArguments(reason)) => Err(ExecutionError::InvalidArguments {
                tool: tool_id.to_string(),
                reason,
            }),
            Err(ToolFault::Failed(reason)) => {
                warn!(tool_id = %tool_id, %invocation_id, %reason, "tool execution failed");
                Err(ExecutionError::ExecutionFault {
                    tool: tool_id.to_string(),
                    reason,
                })
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}
