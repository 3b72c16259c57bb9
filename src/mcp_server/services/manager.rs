//! Server manager orchestrating child-process lifecycles.

use crate::mcp_server::{
    domain::{
        McpServerDomainError, ProcessState, ServerConfigDocument, ServerConfigEntry, ServerName,
    },
    ports::{ManagedProcess, ProcessExit, ServerHostError, ServerProcessHost},
};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Service-level errors for server lifecycle operations.
#[derive(Debug, Clone, Error)]
pub enum ServerManagerError {
    /// Domain validation failed.
    #[error(transparent)]
    Domain(#[from] McpServerDomainError),

    /// No configured server has the name.
    #[error("server '{0}' is not configured")]
    NotFound(String),

    /// The server is configured but disabled.
    #[error("server '{0}' is disabled")]
    Disabled(ServerName),

    /// A live process already exists for the server.
    #[error("server '{0}' is already running")]
    AlreadyRunning(ServerName),

    /// No live process exists for the server.
    #[error("server '{0}' is not running")]
    NotRunning(ServerName),

    /// The process could not be spawned.
    #[error("failed to launch server '{name}': {source}")]
    LaunchFailure {
        /// Server name.
        name: ServerName,
        /// Host failure.
        source: ServerHostError,
    },

    /// Host operation failed while stopping a process.
    #[error(transparent)]
    Host(#[from] ServerHostError),
}

/// Result type for server manager operations.
pub type ServerManagerResult<T> = Result<T, ServerManagerError>;

/// Point-in-time view of one configured server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServerStatus {
    /// Server name.
    pub name: ServerName,
    /// Configured description.
    pub description: String,
    /// Whether the server may be started.
    pub enabled: bool,
    /// Current lifecycle state.
    pub state: ProcessState,
    /// Operating-system process identifier while running.
    pub pid: Option<u32>,
}

#[derive(Debug)]
struct ServerSlot {
    state: ProcessState,
    process: Option<Box<dyn ManagedProcess>>,
}

impl ServerSlot {
    const fn new() -> Self {
        Self {
            state: ProcessState::NotStarted,
            process: None,
        }
    }

    fn transition(&mut self, target: ProcessState) -> Result<(), McpServerDomainError> {
        if !self.state.can_transition_to(target) {
            return Err(McpServerDomainError::InvalidStateTransition {
                from: self.state,
                to: target,
            });
        }
        self.state = target;
        Ok(())
    }
}

type SharedSlot = Arc<tokio::sync::Mutex<ServerSlot>>;

/// Starts, tracks and stops configured server processes.
///
/// Every server name has its own async mutex, so start and stop requests for
/// one server are totally ordered while different servers proceed
/// concurrently. At most one live process exists per name.
pub struct ServerManager<H>
where
    H: ServerProcessHost,
{
    host: Arc<H>,
    config: RwLock<Arc<ServerConfigDocument>>,
    slots: Mutex<HashMap<ServerName, SharedSlot>>,
    stop_grace_period: Duration,
}

impl<H> ServerManager<H>
where
    H: ServerProcessHost,
{
    /// Creates a manager with an empty configuration.
    #[must_use]
    pub fn new(host: Arc<H>, stop_grace_period: Duration) -> Self {
        Self {
            host,
            config: RwLock::new(Arc::new(ServerConfigDocument::empty())),
            slots: Mutex::new(HashMap::new()),
            stop_grace_period,
        }
    }

    /// Replaces the configuration document.
    ///
    /// Running processes are unaffected; servers removed from the document
    /// can still be stopped.
    pub fn replace_config(&self, document: ServerConfigDocument) {
        let mut current = self.config.write().unwrap_or_else(PoisonError::into_inner);
        *current = Arc::new(document);
    }

    /// Returns the current configuration document.
    #[must_use]
    pub fn config(&self) -> Arc<ServerConfigDocument> {
        self.config
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Returns all configured servers keyed by name.
    #[must_use]
    pub fn list_configured(&self) -> BTreeMap<ServerName, ServerConfigEntry> {
        self.config().servers().clone()
    }

    /// Returns the configured stop grace period.
    #[must_use]
    pub const fn stop_grace_period(&self) -> Duration {
        self.stop_grace_period
    }

    fn slot(&self, name: &ServerName) -> SharedSlot {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(
            slots
                .entry(name.clone())
                .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(ServerSlot::new()))),
        )
    }

    fn existing_slot(&self, name: &ServerName) -> Option<SharedSlot> {
        self.slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    fn all_slots(&self) -> Vec<(ServerName, SharedSlot)> {
        let slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        let mut listed: Vec<(ServerName, SharedSlot)> = slots
            .iter()
            .map(|(name, slot)| (name.clone(), Arc::clone(slot)))
            .collect();
        listed.sort_by(|left, right| left.0.cmp(&right.0));
        listed
    }

    /// Starts the named server.
    ///
    /// # Errors
    ///
    /// Returns [`ServerManagerError::NotFound`] for unknown names,
    /// [`ServerManagerError::Disabled`] for disabled servers,
    /// [`ServerManagerError::AlreadyRunning`] when a live process exists and
    /// [`ServerManagerError::LaunchFailure`] when spawning fails.
    pub async fn try_start(&self, name: &str) -> ServerManagerResult<()> {
        let server_name = ServerName::new(name)?;
        let config = self.config();
        let entry = config
            .get(&server_name)
            .ok_or_else(|| ServerManagerError::NotFound(server_name.to_string()))?;
        if !entry.enabled() {
            return Err(ServerManagerError::Disabled(server_name));
        }

        let slot = self.slot(&server_name);
        let mut guard = slot.lock().await;
        if guard.state.is_running() {
            return Err(ServerManagerError::AlreadyRunning(server_name));
        }

        match self.host.launch(&server_name, entry.launch()).await {
            Ok(process) => {
                guard.transition(ProcessState::Running)?;
                info!(server = %server_name, pid = ?process.id(), "server started");
                guard.process = Some(process);
                Ok(())
            }
            Err(source) => {
                guard.transition(ProcessState::Failed)?;
                warn!(server = %server_name, error = %source, "server launch failed");
                Err(ServerManagerError::LaunchFailure {
                    name: server_name,
                    source,
                })
            }
        }
    }

    /// Starts the named server, reporting only whether it started.
    pub async fn start(&self, name: &str) -> bool {
        match self.try_start(name).await {
            Ok(()) => true,
            Err(err) => {
                debug!(server = name, error = %err, "start request rejected");
                false
            }
        }
    }

    /// Stops the named server.
    ///
    /// The process receives a termination request and is killed once the
    /// grace period elapses. The handle is released even when termination
    /// reports an error.
    ///
    /// # Errors
    ///
    /// Returns [`ServerManagerError::NotRunning`] when no live process exists
    /// and [`ServerManagerError::Host`] when termination fails.
    pub async fn try_stop(&self, name: &str) -> ServerManagerResult<ProcessExit> {
        let server_name = ServerName::new(name)?;
        let Some(slot) = self.existing_slot(&server_name) else {
            return Err(ServerManagerError::NotRunning(server_name));
        };

        let mut guard = slot.lock().await;
        let Some(mut process) = guard.process.take() else {
            return Err(ServerManagerError::NotRunning(server_name));
        };

        let outcome = process.terminate(self.stop_grace_period).await;
        guard.transition(ProcessState::Stopped)?;
        match outcome {
            Ok(exit) => {
                if exit == ProcessExit::Killed {
                    warn!(server = %server_name, "server was killed after the grace period");
                }
                info!(server = %server_name, ?exit, "server stopped");
                Ok(exit)
            }
            Err(err) => {
                warn!(server = %server_name, error = %err, "server termination reported an error");
                Err(err.into())
            }
        }
    }

    /// Stops the named server, reporting only whether it was stopped.
    pub async fn stop(&self, name: &str) -> bool {
        match self.try_stop(name).await {
            Ok(_) => true,
            Err(err) => {
                debug!(server = name, error = %err, "stop request rejected");
                false
            }
        }
    }

    /// Returns the lifecycle state of `name`.
    pub async fn state(&self, name: &ServerName) -> ProcessState {
        match self.existing_slot(name) {
            Some(slot) => slot.lock().await.state,
            None => ProcessState::NotStarted,
        }
    }

    /// Returns the names of servers with a live process, in name order.
    pub async fn running_servers(&self) -> Vec<ServerName> {
        let mut running = Vec::new();
        for (name, slot) in self.all_slots() {
            if slot.lock().await.state.is_running() {
                running.push(name);
            }
        }
        running
    }

    /// Returns a status line for every configured server in name order.
    pub async fn statuses(&self) -> Vec<ServerStatus> {
        let config = self.config();
        let mut statuses = Vec::with_capacity(config.len());
        for entry in config.servers().values() {
            let (state, pid) = match self.existing_slot(entry.name()) {
                Some(slot) => {
                    let guard = slot.lock().await;
                    (guard.state, guard.process.as_ref().and_then(|process| process.id()))
                }
                None => (ProcessState::NotStarted, None),
            };
            statuses.push(ServerStatus {
                name: entry.name().clone(),
                description: entry.description().to_owned(),
                enabled: entry.enabled(),
                state,
                pid,
            });
        }
        statuses
    }

    /// Starts every enabled server that is not already running.
    ///
    /// Failures are collected per server; one failure never prevents the
    /// remaining servers from starting.
    pub async fn start_enabled(&self) -> BTreeMap<ServerName, ServerManagerResult<()>> {
        let config = self.config();
        let mut outcomes = BTreeMap::new();
        for entry in config.enabled() {
            let outcome = self.try_start(entry.name().as_str()).await;
            outcomes.insert(entry.name().clone(), outcome);
        }
        outcomes
    }

    /// Stops every running server.
    pub async fn shutdown_all(&self) -> BTreeMap<ServerName, ServerManagerResult<ProcessExit>> {
        let mut outcomes = BTreeMap::new();
        for name in self.running_servers().await {
            let outcome = self.try_stop(name.as_str()).await;
            outcomes.insert(name, outcome);
        }
        outcomes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mcp_server::{
        adapters::InMemoryProcessHost,
        domain::ServerLaunchSpec,
        ports::ServerHostResult,
    };
    use async_trait::async_trait;
    use mockall::mock;
    use rstest::{fixture, rstest};

    mock! {
        Host {}

        #[async_trait]
        impl ServerProcessHost for Host {
            async fn launch(
                &self,
                name: &ServerName,
                spec: &ServerLaunchSpec,
            ) -> ServerHostResult<Box<dyn ManagedProcess>>;
        }
    }

    /// Delegates to the in-memory host after yielding, so overlapping
    /// starts interleave inside `launch`.
    struct SlowHost {
        inner: InMemoryProcessHost,
    }

    #[async_trait]
    impl ServerProcessHost for SlowHost {
        async fn launch(
            &self,
            name: &ServerName,
            spec: &ServerLaunchSpec,
        ) -> ServerHostResult<Box<dyn ManagedProcess>> {
            tokio::time::sleep(Duration::from_millis(50)).await;
            self.inner.launch(name, spec).await
        }
    }

    fn entry(name: &str, enabled: bool) -> ServerConfigEntry {
        ServerConfigEntry::new(
            ServerName::new(name).expect("valid name"),
            ServerLaunchSpec::new("server-binary").expect("valid command"),
            enabled,
            None,
        )
    }

    fn document() -> ServerConfigDocument {
        ServerConfigDocument::from_entries([entry("sqlite", true), entry("puppeteer", false)])
            .expect("unique names")
    }

    #[fixture]
    fn host() -> Arc<InMemoryProcessHost> {
        Arc::new(InMemoryProcessHost::new())
    }

    fn manager(host: &Arc<InMemoryProcessHost>) -> ServerManager<InMemoryProcessHost> {
        let manager = ServerManager::new(Arc::clone(host), Duration::from_secs(1));
        manager.replace_config(document());
        manager
    }

    #[rstest]
    #[tokio::test]
    async fn second_start_is_rejected(host: Arc<InMemoryProcessHost>) {
        let manager = manager(&host);
        let sqlite = ServerName::new("sqlite").expect("valid name");

        assert!(manager.start("sqlite").await);
        assert!(!manager.start("sqlite").await);

        assert_eq!(host.launch_count(&sqlite).expect("host state"), 1);
        assert_eq!(manager.state(&sqlite).await, ProcessState::Running);
    }

    #[rstest]
    #[tokio::test]
    async fn disabled_and_unknown_servers_are_rejected(host: Arc<InMemoryProcessHost>) {
        let manager = manager(&host);

        assert!(matches!(
            manager.try_start("puppeteer").await,
            Err(ServerManagerError::Disabled(_))
        ));
        assert!(matches!(
            manager.try_start("github").await,
            Err(ServerManagerError::NotFound(name)) if name == "github"
        ));
        assert!(host.live_processes().expect("host state").is_empty());
    }

    #[rstest]
    #[tokio::test]
    async fn stop_releases_the_handle(host: Arc<InMemoryProcessHost>) {
        let manager = manager(&host);
        let sqlite = ServerName::new("sqlite").expect("valid name");
        assert!(manager.start("sqlite").await);

        let exit = manager.try_stop("sqlite").await.expect("stop succeeds");

        assert_eq!(exit, ProcessExit::Exited { code: Some(0) });
        assert_eq!(manager.state(&sqlite).await, ProcessState::Stopped);
        assert!(!manager.stop("sqlite").await);
        assert!(manager.start("sqlite").await);
    }

    #[rstest]
    #[tokio::test]
    async fn stopping_a_server_that_never_ran_is_rejected(host: Arc<InMemoryProcessHost>) {
        let manager = manager(&host);
        assert!(matches!(
            manager.try_stop("sqlite").await,
            Err(ServerManagerError::NotRunning(_))
        ));
    }

    #[tokio::test]
    async fn launch_failure_marks_the_server_failed() {
        let mut host = MockHost::new();
        host.expect_launch().times(1).returning(|_, spec| {
            Err(ServerHostError::spawn(
                spec.command(),
                std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
            ))
        });
        let manager = ServerManager::new(Arc::new(host), Duration::from_secs(1));
        manager.replace_config(document());
        let sqlite = ServerName::new("sqlite").expect("valid name");

        let result = manager.try_start("sqlite").await;

        assert!(matches!(
            result,
            Err(ServerManagerError::LaunchFailure { ref name, .. }) if *name == sqlite
        ));
        assert_eq!(manager.state(&sqlite).await, ProcessState::Failed);
        assert!(manager.running_servers().await.is_empty());
    }

    #[rstest]
    #[tokio::test]
    async fn start_enabled_and_shutdown_all_cover_enabled_servers(
        host: Arc<InMemoryProcessHost>,
    ) {
        let manager = manager(&host);

        let started = manager.start_enabled().await;
        let names: Vec<&str> = started.keys().map(ServerName::as_str).collect();
        assert_eq!(names, vec!["sqlite"]);
        assert!(started.values().all(Result::is_ok));

        let stopped = manager.shutdown_all().await;
        assert_eq!(stopped.len(), 1);
        assert!(manager.running_servers().await.is_empty());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn concurrent_starts_launch_once() {
        let inner = InMemoryProcessHost::new();
        let manager = ServerManager::new(
            Arc::new(SlowHost {
                inner: inner.clone(),
            }),
            Duration::from_secs(1),
        );
        manager.replace_config(document());
        let sqlite = ServerName::new("sqlite").expect("valid name");

        let (first, second) =
            tokio::join!(manager.try_start("sqlite"), manager.try_start("sqlite"));

        let outcomes = [first, second];
        assert_eq!(outcomes.iter().filter(|outcome| outcome.is_ok()).count(), 1);
        assert_eq!(
            outcomes
                .iter()
                .filter(|outcome| matches!(outcome, Err(ServerManagerError::AlreadyRunning(_))))
                .count(),
            1
        );
        assert_eq!(inner.launch_count(&sqlite).expect("host state"), 1);
        assert_eq!(inner.live_processes().expect("host state"), [sqlite]);
    }
}
