//! Process host port used by the server manager.

use crate::mcp_server::domain::{ServerLaunchSpec, ServerName};
use async_trait::async_trait;
use std::fmt;
use std::io;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Result type for process host operations.
pub type ServerHostResult<T> = Result<T, ServerHostError>;

/// Spawns server processes.
#[async_trait]
pub trait ServerProcessHost: Send + Sync {
    /// Spawns the process described by `spec` for server `name`.
    ///
    /// The returned handle owns the process; dropping it must not leave an
    /// orphan behind.
    async fn launch(
        &self,
        name: &ServerName,
        spec: &ServerLaunchSpec,
    ) -> ServerHostResult<Box<dyn ManagedProcess>>;
}

/// Handle to one live server process.
#[async_trait]
pub trait ManagedProcess: Send + Sync + fmt::Debug {
    /// Returns the operating-system process identifier, if still known.
    fn id(&self) -> Option<u32>;

    /// Requests termination, waits up to `grace` and escalates to a forced
    /// kill. Returns once the process has been reaped.
    async fn terminate(&mut self, grace: Duration) -> ServerHostResult<ProcessExit>;
}

/// How a managed process ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessExit {
    /// The process exited on its own or after the termination request.
    Exited {
        /// Exit code, when the process was not ended by a signal.
        code: Option<i32>,
    },
    /// The grace period elapsed and the process was killed.
    Killed,
}

/// Errors returned by process host adapters.
#[derive(Debug, Clone, Error)]
pub enum ServerHostError {
    /// The executable could not be spawned.
    #[error("failed to spawn '{command}': {source}")]
    Spawn {
        /// Executable that failed to start.
        command: String,
        /// Underlying I/O failure.
        source: Arc<io::Error>,
    },

    /// The adapter was told to fail the launch.
    #[error("launch rejected: {0}")]
    Rejected(String),

    /// Generic runtime failure.
    #[error("process host runtime error: {0}")]
    Runtime(Arc<dyn std::error::Error + Send + Sync>),
}

impl ServerHostError {
    /// Wraps a spawn failure.
    pub fn spawn(command: impl Into<String>, source: io::Error) -> Self {
        Self::Spawn {
            command: command.into(),
            source: Arc::new(source),
        }
    }

    /// Wraps a runtime error from the host adapter.
    pub fn runtime(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Runtime(Arc::new(err))
    }
}
