//! Tokio-backed process host spawning real child processes.

use crate::mcp_server::{
    domain::{ServerLaunchSpec, ServerName},
    ports::{ManagedProcess, ProcessExit, ServerHostError, ServerHostResult, ServerProcessHost},
};
use async_trait::async_trait;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::{Child, Command};
use tracing::{debug, warn};

/// Process host spawning servers with [`tokio::process::Command`].
///
/// The configured environment overlay is expanded against the inherited
/// environment and applied on top of it. Stdin stays open for the lifetime
/// of the process, stdout is discarded and stderr is inherited.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioProcessHost;

impl TokioProcessHost {
    /// Creates the host.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ServerProcessHost for TokioProcessHost {
    async fn launch(
        &self,
        name: &ServerName,
        spec: &ServerLaunchSpec,
    ) -> ServerHostResult<Box<dyn ManagedProcess>> {
        let overlay = spec.resolved_env(|key| std::env::var(key).ok());
        let child = Command::new(spec.command())
            .args(spec.args())
            .envs(&overlay)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|err| ServerHostError::spawn(spec.command(), err))?;

        debug!(server = %name, pid = ?child.id(), "spawned server process");
        Ok(Box::new(TokioManagedProcess {
            name: name.clone(),
            child,
        }))
    }
}

#[derive(Debug)]
struct TokioManagedProcess {
    name: ServerName,
    child: Child,
}

#[async_trait]
impl ManagedProcess for TokioManagedProcess {
    fn id(&self) -> Option<u32> {
        self.child.id()
    }

    async fn terminate(&mut self, grace: Duration) -> ServerHostResult<ProcessExit> {
        if let Some(status) = self.child.try_wait().map_err(ServerHostError::runtime)? {
            debug!(server = %self.name, ?status, "server process had already exited");
            return Ok(ProcessExit::Exited {
                code: status.code(),
            });
        }

        request_termination(&mut self.child)?;
        if let Ok(waited) = tokio::time::timeout(grace, self.child.wait()).await {
            let status = waited.map_err(ServerHostError::runtime)?;
            return Ok(ProcessExit::Exited {
                code: status.code(),
            });
        }

        warn!(
            server = %self.name,
            grace_ms = grace.as_millis(),
            "server ignored termination request; killing"
        );
        self.child.kill().await.map_err(ServerHostError::runtime)?;
        Ok(ProcessExit::Killed)
    }
}

#[cfg(unix)]
fn request_termination(child: &mut Child) -> ServerHostResult<()> {
    use nix::errno::Errno;
    use nix::sys::signal::{Signal, kill};
    use nix::unistd::Pid;

    let Some(pid) = child.id() else {
        return Ok(());
    };
    let raw_pid = i32::try_from(pid).map_err(ServerHostError::runtime)?;
    match kill(Pid::from_raw(raw_pid), Signal::SIGTERM) {
        Ok(()) | Err(Errno::ESRCH) => Ok(()),
        Err(err) => Err(ServerHostError::runtime(err)),
    }
}

#[cfg(not(unix))]
fn request_termination(child: &mut Child) -> ServerHostResult<()> {
    child.start_kill().map_err(ServerHostError::runtime)
}
