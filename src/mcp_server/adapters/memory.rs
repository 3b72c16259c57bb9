//! In-memory process host for lifecycle tests.

use crate::mcp_server::{
    domain::{ServerLaunchSpec, ServerName},
    ports::{ManagedProcess, ProcessExit, ServerHostError, ServerHostResult, ServerProcessHost},
};
use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

/// In-memory process host.
///
/// This adapter models process lifecycles without spawning anything. It
/// counts launches, tracks which simulated processes are alive and can be
/// told to fail launches or ignore termination requests.
#[derive(Debug, Clone, Default)]
pub struct InMemoryProcessHost {
    state: Arc<RwLock<InMemoryHostState>>,
}

#[derive(Debug, Default)]
struct InMemoryHostState {
    live: BTreeSet<ServerName>,
    launches: BTreeMap<ServerName, usize>,
    failing: BTreeSet<ServerName>,
    stubborn: BTreeSet<ServerName>,
    next_pid: u32,
}

impl InMemoryProcessHost {
    /// Creates an empty in-memory host.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every future launch of `name` fail.
    ///
    /// # Errors
    ///
    /// Returns host runtime errors when lock acquisition fails.
    pub fn fail_launches_for(&self, name: &ServerName) -> ServerHostResult<()> {
        self.write()?.failing.insert(name.clone());
        Ok(())
    }

    /// Makes processes of `name` ignore termination so they must be killed.
    ///
    /// # Errors
    ///
    /// Returns host runtime errors when lock acquisition fails.
    pub fn ignore_termination_for(&self, name: &ServerName) -> ServerHostResult<()> {
        self.write()?.stubborn.insert(name.clone());
        Ok(())
    }

    /// Returns the names with a live simulated process.
    ///
    /// # Errors
    ///
    /// Returns host runtime errors when lock acquisition fails.
    pub fn live_processes(&self) -> ServerHostResult<Vec<ServerName>> {
        Ok(self.read()?.live.iter().cloned().collect())
    }

    /// Returns how many successful launches `name` has had.
    ///
    /// # Errors
    ///
    /// Returns host runtime errors when lock acquisition fails.
    pub fn launch_count(&self, name: &ServerName) -> ServerHostResult<usize> {
        Ok(self.read()?.launches.get(name).copied().unwrap_or_default())
    }

    fn read(&self) -> ServerHostResult<RwLockReadGuard<'_, InMemoryHostState>> {
        self.state
            .read()
            .map_err(|err| ServerHostError::runtime(std::io::Error::other(err.to_string())))
    }

    fn write(&self) -> ServerHostResult<RwLockWriteGuard<'_, InMemoryHostState>> {
        self.state
            .write()
            .map_err(|err| ServerHostError::runtime(std::io::Error::other(err.to_string())))
    }
}

#[async_trait]
impl ServerProcessHost for InMemoryProcessHost {
    async fn launch(
        &self,
        name: &ServerName,
        spec: &ServerLaunchSpec,
    ) -> ServerHostResult<Box<dyn ManagedProcess>> {
        let mut state = self.write()?;
        if state.failing.contains(name) {
            return Err(ServerHostError::Rejected(format!(
                "simulated launch failure for '{}'",
                spec.command()
            )));
        }

        state.next_pid = state.next_pid.saturating_add(1);
        let pid = state.next_pid;
        state.live.insert(name.clone());
        *state.launches.entry(name.clone()).or_default() += 1;

        Ok(Box::new(InMemoryProcess {
            name: name.clone(),
            pid,
            stubborn: state.stubborn.contains(name),
            state: Arc::clone(&self.state),
        }))
    }
}

#[derive(Debug)]
struct InMemoryProcess {
    name: ServerName,
    pid: u32,
    stubborn: bool,
    state: Arc<RwLock<InMemoryHostState>>,
}

#[async_trait]
impl ManagedProcess for InMemoryProcess {
    fn id(&self) -> Option<u32> {
        Some(self.pid)
    }

    async fn terminate(&mut self, _grace: Duration) -> ServerHostResult<ProcessExit> {
        let mut state = self
            .state
            .write()
            .map_err(|err| ServerHostError::runtime(std::io::Error::other(err.to_string())))?;
        state.live.remove(&self.name);
        if self.stubborn {
            Ok(ProcessExit::Killed)
        } else {
            Ok(ProcessExit::Exited { code: Some(0) })
        }
    }
}
