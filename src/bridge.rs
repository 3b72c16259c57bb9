//! Capability bridge facade.
//!
//! The bridge composes tool discovery, local execution and the server
//! manager behind list, execute and lifecycle operations. Dashboards and
//! command-line front ends call into it rather than into the individual
//! services.

use crate::config::BridgeSettings;
use crate::mcp_server::{
    domain::{
        ServerConfigDocument, ServerConfigEntry, ServerConfigError, ServerName, SkippedServer,
    },
    ports::ServerProcessHost,
    services::{ServerManager, ServerManagerError},
};
use crate::tool_registry::{
    adapters::BuiltinToolbox,
    domain::{ToolArguments, ToolDescriptor, ToolId, ToolManifest, ToolOutput, ToolRegistryDomainError},
    services::{
        DescriptorStore, DiscoveryError, ExecutionError, LocalExecutionEngine, ReplacedUnit,
        SkippedUnit, ToolDiscovery,
    },
};
use camino::Utf8PathBuf;
use cap_std::ambient_authority;
use cap_std::fs_utf8::Dir;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;
use tracing::{info, warn};

/// Errors returned by bridge operations.
#[derive(Debug, Clone, Error)]
pub enum BridgeError {
    /// The server configuration document is invalid.
    #[error("server configuration is invalid: {0}")]
    ConfigInvalid(#[from] ServerConfigError),

    /// The tools directory could not be scanned.
    #[error(transparent)]
    Discovery(#[from] DiscoveryError),

    /// No catalogued tool or configured server has the identifier.
    #[error("tool '{0}' not found")]
    NotFound(String),

    /// The identifier names a server-backed capability.
    #[error("tool '{0}' is server-backed; use start/stop instead of execute")]
    NotDirectlyExecutable(ToolId),

    /// Local execution failed.
    #[error(transparent)]
    Execution(ExecutionError),

    /// A manifest offered for installation is invalid.
    #[error("invalid tool manifest: {0}")]
    InvalidManifest(#[from] ToolRegistryDomainError),

    /// Server lifecycle operation failed.
    #[error(transparent)]
    Server(#[from] ServerManagerError),

    /// Filesystem operation failed.
    #[error("bridge filesystem operation failed at {path}: {source}")]
    Io {
        /// Path being accessed.
        path: Utf8PathBuf,
        /// Underlying I/O failure.
        source: Arc<io::Error>,
    },

    /// A background task could not complete.
    #[error("bridge runtime error: {0}")]
    Runtime(String),
}

impl From<ExecutionError> for BridgeError {
    fn from(err: ExecutionError) -> Self {
        match err {
            ExecutionError::NotFound(id) => Self::NotFound(id),
            other => Self::Execution(other),
        }
    }
}

/// Counts reported by a successful initialisation.
#[derive(Debug, Clone, Default)]
pub struct InitializationReport {
    /// Local tools in the new catalog.
    pub local_tools: usize,
    /// Servers in the loaded configuration.
    pub configured_servers: usize,
    /// Units skipped by discovery.
    pub skipped: Vec<SkippedUnit>,
    /// Identifier collisions resolved by discovery.
    pub replaced: Vec<ReplacedUnit>,
    /// Server entries left out of the configuration.
    pub skipped_servers: Vec<SkippedServer>,
}

/// Aggregate counts for dashboards and the `info` command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BridgeSummary {
    /// Local tools in the current catalog.
    pub local_tools: usize,
    /// Configured servers.
    pub configured_servers: usize,
    /// Enabled servers.
    pub enabled_servers: usize,
    /// Servers with a live process.
    pub running_servers: usize,
}

/// Facade over discovery, execution and server lifecycle.
pub struct CapabilityBridge<H>
where
    H: ServerProcessHost,
{
    settings: BridgeSettings,
    discovery: ToolDiscovery,
    store: Arc<DescriptorStore>,
    engine: LocalExecutionEngine,
    servers: ServerManager<H>,
    initialized: AtomicBool,
    init_lock: tokio::sync::Mutex<()>,
}

impl<H> CapabilityBridge<H>
where
    H: ServerProcessHost,
{
    /// Creates a bridge. Nothing is scanned or loaded until the first
    /// initialisation.
    #[must_use]
    pub fn new(settings: BridgeSettings, toolbox: BuiltinToolbox, host: Arc<H>) -> Self {
        let store = Arc::new(DescriptorStore::new());
        Self {
            discovery: ToolDiscovery::new(toolbox, settings.command_timeout()),
            engine: LocalExecutionEngine::new(Arc::clone(&store)),
            servers: ServerManager::new(host, settings.stop_grace_period()),
            store,
            settings,
            initialized: AtomicBool::new(false),
            init_lock: tokio::sync::Mutex::new(()),
        }
    }

    /// Returns the settings the bridge was built with.
    #[must_use]
    pub const fn settings(&self) -> &BridgeSettings {
        &self.settings
    }

    /// Returns the server manager.
    #[must_use]
    pub const fn servers(&self) -> &ServerManager<H> {
        &self.servers
    }

    /// Returns whether an initialisation has succeeded.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::Acquire)
    }

    /// Loads the server configuration and rescans the tools directory.
    ///
    /// Both are prepared before anything is swapped in, so a failure leaves
    /// the previous catalog and configuration untouched. A missing
    /// configuration file counts as an empty configuration.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::ConfigInvalid`] for an unreadable or malformed
    /// configuration and [`BridgeError::Discovery`] when the tools directory
    /// cannot be scanned.
    pub async fn try_initialize(&self) -> Result<InitializationReport, BridgeError> {
        let _serialised = self.init_lock.lock().await;
        self.initialize_locked().await
    }

    async fn initialize_locked(&self) -> Result<InitializationReport, BridgeError> {
        let config_path = self.settings.server_config().to_owned();
        let tools_dir = self.settings.tools_dir().to_owned();
        let discovery = self.discovery.clone();

        let (config, report) = tokio::task::spawn_blocking(move || {
            let config = ServerConfigDocument::load(&config_path)?;
            let report = discovery.discover(&tools_dir)?;
            Ok::<_, BridgeError>((config, report))
        })
        .await
        .map_err(|err| BridgeError::Runtime(err.to_string()))??;

        let summary = InitializationReport {
            local_tools: report.snapshot.len(),
            configured_servers: config.len(),
            skipped: report.skipped,
            replaced: report.replaced,
            skipped_servers: config.skipped().to_vec(),
        };
        self.servers.replace_config(config);
        self.store.replace(report.snapshot);
        self.initialized.store(true, Ordering::Release);

        info!(
            tools = summary.local_tools,
            servers = summary.configured_servers,
            skipped = summary.skipped.len(),
            skipped_servers = summary.skipped_servers.len(),
            "bridge initialised"
        );
        Ok(summary)
    }

    /// Initialises the bridge, reporting only success.
    pub async fn initialize(&self) -> bool {
        self.try_initialize()
            .await
            .inspect_err(|err| warn!(error = %err, "bridge initialisation failed"))
            .is_ok()
    }

    async fn ensure_initialized(&self) {
        if self.is_initialized() {
            return;
        }
        let _serialised = self.init_lock.lock().await;
        if self.is_initialized() {
            return;
        }
        if let Err(err) = self.initialize_locked().await {
            warn!(error = %err, "lazy bridge initialisation failed");
        }
    }

    /// Lists every capability: local tools in identifier order, then
    /// enabled servers in name order.
    ///
    /// Initialises the bridge first when needed. A server-backed identifier
    /// that collides with a local one is omitted.
    pub async fn list_tools(&self) -> Vec<ToolDescriptor> {
        self.ensure_initialized().await;
        let snapshot = self.store.snapshot();
        let mut descriptors: Vec<ToolDescriptor> = snapshot.descriptors().cloned().collect();
        let mut seen: BTreeSet<ToolId> = descriptors
            .iter()
            .map(|descriptor| descriptor.id().clone())
            .collect();

        let config = self.servers.config();
        for entry in config.enabled() {
            let Some(descriptor) = server_descriptor(entry) else {
                continue;
            };
            if !seen.insert(descriptor.id().clone()) {
                warn!(
                    tool_id = %descriptor.id(),
                    server = %entry.name(),
                    "server-backed identifier collides with a local tool; omitting server entry"
                );
                continue;
            }
            descriptors.push(descriptor);
        }
        descriptors
    }

    /// Executes the capability identified by `id`.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::NotDirectlyExecutable`] for server-backed
    /// identifiers, [`BridgeError::NotFound`] for unknown identifiers and
    /// [`BridgeError::Execution`] when the tool fails.
    pub async fn execute(
        &self,
        id: &str,
        arguments: ToolArguments,
    ) -> Result<ToolOutput, BridgeError> {
        self.ensure_initialized().await;
        if self.store.snapshot().contains(id) {
            return Ok(self.engine.execute(id, arguments).await?);
        }

        let config = self.servers.config();
        let server_backed = config
            .servers()
            .values()
            .filter_map(server_descriptor)
            .find(|descriptor| descriptor.id().as_str() == id);
        Err(server_backed.map_or_else(
            || BridgeError::NotFound(id.to_owned()),
            |descriptor| BridgeError::NotDirectlyExecutable(descriptor.id().clone()),
        ))
    }

    /// Starts a configured server, reporting only success.
    ///
    /// Initialises the bridge first when needed.
    pub async fn start_server(&self, name: &str) -> bool {
        self.ensure_initialized().await;
        self.servers.start(name).await
    }

    /// Stops a running server, reporting only success.
    pub async fn stop_server(&self, name: &str) -> bool {
        self.ensure_initialized().await;
        self.servers.stop(name).await
    }

    /// Returns all configured servers keyed by name.
    pub async fn list_configured_servers(&self) -> BTreeMap<ServerName, ServerConfigEntry> {
        self.ensure_initialized().await;
        self.servers.list_configured()
    }

    /// Returns aggregate counts.
    pub async fn summary(&self) -> BridgeSummary {
        self.ensure_initialized().await;
        let config = self.servers.config();
        BridgeSummary {
            local_tools: self.store.snapshot().len(),
            configured_servers: config.len(),
            enabled_servers: config.enabled().count(),
            running_servers: self.servers.running_servers().await.len(),
        }
    }

    /// Validates `manifest`, writes it to `<tools dir>/<id>.json` and
    /// re-initialises so the tool is immediately available.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::InvalidManifest`] when the manifest violates
    /// the tool contract, [`BridgeError::Io`] when it cannot be written, or
    /// any error from the subsequent initialisation.
    pub async fn install_tool(&self, manifest: &ToolManifest) -> Result<ToolId, BridgeError> {
        let id = self.discovery.check(manifest)?;
        let text = manifest
            .to_json()
            .map_err(|err| BridgeError::Runtime(err.to_string()))?;
        let tools_dir = self.settings.tools_dir().to_owned();
        let file_name = format!("{id}.json");

        let written_to = tools_dir.join(&file_name);
        let io_error = |source: io::Error| BridgeError::Io {
            path: written_to.clone(),
            source: Arc::new(source),
        };
        Dir::create_ambient_dir_all(&tools_dir, ambient_authority()).map_err(io_error)?;
        Dir::open_ambient_dir(&tools_dir, ambient_authority())
            .and_then(|dir| dir.write(&file_name, text))
            .map_err(io_error)?;
        info!(tool_id = %id, path = %written_to, "tool manifest installed");

        self.try_initialize().await?;
        Ok(id)
    }
}

fn server_descriptor(entry: &ServerConfigEntry) -> Option<ToolDescriptor> {
    ToolDescriptor::server_backed(entry.name().as_str(), Some(entry.description()))
        .inspect_err(|err| {
            warn!(server = %entry.name(), error = %err, "server name cannot form a tool identifier");
        })
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mcp_server::adapters::InMemoryProcessHost;
    use crate::tool_registry::domain::{ToolEntry, ToolKind};
    use rstest::{fixture, rstest};
    use serde_json::json;
    use tempfile::TempDir;

    struct Harness {
        _root: TempDir,
        tools: Utf8PathBuf,
        config: Utf8PathBuf,
        bridge: CapabilityBridge<InMemoryProcessHost>,
    }

    #[fixture]
    fn harness() -> Harness {
        let root = tempfile::tempdir().expect("temporary directory");
        let base = Utf8PathBuf::from_path_buf(root.path().to_path_buf()).expect("utf-8 temp path");
        let tools = base.join("tools");
        let config = base.join("mcp_servers.json");
        let settings = BridgeSettings::default()
            .with_tools_dir(tools.clone())
            .with_server_config(config.clone())
            .with_session_root(base.join("sessions"));
        let bridge = CapabilityBridge::new(
            settings,
            BuiltinToolbox::with_defaults(),
            Arc::new(InMemoryProcessHost::new()),
        );
        Harness {
            _root: root,
            tools,
            config,
            bridge,
        }
    }

    fn write(path: &Utf8PathBuf, body: &serde_json::Value) {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create parent directory");
        }
        std::fs::write(path, body.to_string()).expect("write file");
    }

    fn builtin_manifest(name: &str, builtin: &str) -> ToolManifest {
        ToolManifest {
            name: name.to_owned(),
            description: None,
            input_schema: json!({"type": "object"}),
            requires_external_credential: false,
            entry: ToolEntry::Builtin {
                builtin: builtin.to_owned(),
            },
        }
    }

    #[rstest]
    #[tokio::test]
    async fn list_tools_initialises_lazily_and_appends_enabled_servers(harness: Harness) {
        write(
            &harness.tools.join("shout.json"),
            &json!({"name": "Shout", "input_schema": {}, "entry": {"kind": "builtin", "builtin": "uppercase"}}),
        );
        write(
            &harness.config,
            &json!({"mcpServers": {
                "sqlite": {"command": "uvx", "args": ["mcp-server-sqlite"], "enabled": true},
                "puppeteer": {"command": "npx", "enabled": false}
            }}),
        );

        assert!(!harness.bridge.is_initialized());
        let tools = harness.bridge.list_tools().await;

        assert!(harness.bridge.is_initialized());
        let ids: Vec<&str> = tools.iter().map(|tool| tool.id().as_str()).collect();
        assert_eq!(ids, ["shout", "mcp_sqlite"]);
        assert!(tools.iter().any(|tool| tool.kind() == ToolKind::ServerBacked));
    }

    #[rstest]
    #[tokio::test]
    async fn server_backed_ids_are_not_directly_executable(harness: Harness) {
        write(
            &harness.config,
            &json!({"mcpServers": {"puppeteer": {"command": "npx", "enabled": false}}}),
        );

        let result = harness
            .bridge
            .execute("mcp_puppeteer", ToolArguments::new())
            .await;

        assert!(matches!(result, Err(BridgeError::NotDirectlyExecutable(_))));
    }

    #[rstest]
    #[tokio::test]
    async fn unknown_ids_are_not_found(harness: Harness) {
        let result = harness.bridge.execute("nope", ToolArguments::new()).await;
        assert!(matches!(result, Err(BridgeError::NotFound(id)) if id == "nope"));
    }

    #[rstest]
    #[tokio::test]
    async fn malformed_config_keeps_previous_state(harness: Harness) {
        write(
            &harness.config,
            &json!({"mcpServers": {"sqlite": {"command": "uvx"}}}),
        );
        harness.bridge.try_initialize().await.expect("first load");

        std::fs::write(&harness.config, "{ not json").expect("corrupt config");
        let result = harness.bridge.try_initialize().await;

        assert!(matches!(result, Err(BridgeError::ConfigInvalid(_))));
        assert_eq!(harness.bridge.summary().await.configured_servers, 1);
    }

    #[rstest]
    #[tokio::test]
    async fn installed_tools_are_immediately_executable(harness: Harness) {
        let id = harness
            .bridge
            .install_tool(&builtin_manifest("Loud Words", "uppercase"))
            .await
            .expect("install succeeds");

        assert_eq!(id.as_str(), "loud_words");
        assert!(harness.tools.join("loud_words.json").is_file());
        let output = harness
            .bridge
            .execute("loud_words", ToolArguments::new().with("text", json!("hey")))
            .await
            .expect("execution succeeds");
        assert_eq!(output.payload, json!({"text": "HEY"}));
    }

    #[rstest]
    #[tokio::test]
    async fn invalid_manifests_are_not_written(harness: Harness) {
        let result = harness
            .bridge
            .install_tool(&builtin_manifest("ghost", "does_not_exist"))
            .await;

        assert!(matches!(result, Err(BridgeError::InvalidManifest(_))));
        assert!(!harness.tools.exists());
    }

    #[rstest]
    #[tokio::test]
    async fn summary_counts_running_servers(harness: Harness) {
        write(
            &harness.config,
            &json!({"mcpServers": {
                "sqlite": {"command": "uvx", "enabled": true},
                "filesystem": {"command": "npx", "enabled": true},
                "puppeteer": {"command": "npx", "enabled": false}
            }}),
        );
        harness.bridge.try_initialize().await.expect("initialise");
        assert!(harness.bridge.start_server("sqlite").await);

        let summary = harness.bridge.summary().await;

        assert_eq!(
            summary,
            BridgeSummary {
                local_tools: 0,
                configured_servers: 3,
                enabled_servers: 2,
                running_servers: 1,
            }
        );
        assert!(harness.bridge.stop_server("sqlite").await);
        assert!(!harness.bridge.stop_server("sqlite").await);
    }

    #[rstest]
    #[tokio::test]
    async fn start_server_initialises_lazily(harness: Harness) {
        write(
            &harness.config,
            &json!({"mcpServers": {"sqlite": {"command": "uvx", "enabled": true}}}),
        );

        assert!(!harness.bridge.is_initialized());
        assert!(harness.bridge.start_server("sqlite").await);

        assert!(harness.bridge.is_initialized());
        assert_eq!(harness.bridge.summary().await.running_servers, 1);
    }

    #[rstest]
    #[tokio::test]
    async fn invalid_server_entries_do_not_hide_valid_ones(harness: Harness) {
        write(
            &harness.config,
            &json!({"mcpServers": {
                "sqlite": {"command": "uvx", "enabled": true},
                "brave.search": {"command": "npx", "enabled": true}
            }}),
        );

        let report = harness.bridge.try_initialize().await.expect("initialise");

        assert_eq!(report.configured_servers, 1);
        let skipped: Vec<&str> = report
            .skipped_servers
            .iter()
            .map(|server| server.name.as_str())
            .collect();
        assert_eq!(skipped, ["brave.search"]);
        let ids: Vec<String> = harness
            .bridge
            .list_tools()
            .await
            .iter()
            .map(|tool| tool.id().to_string())
            .collect();
        assert_eq!(ids, ["mcp_sqlite"]);
        assert!(harness.bridge.start_server("sqlite").await);
    }
}
