//! Command-line front end for the capability bridge.
//!
//! Usage:
//!
//! ```text
//! toolbridge [--tools-dir <dir>] [--server-config <file>] <command>
//! ```
//!
//! Every command prints a single JSON document on stdout. Failures print
//! `{"error": "..."}` and exit with status 1. Diagnostics go to stderr under
//! the filter given by `--log-filter` or `TOOLBRIDGE_LOG`.

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::ambient_authority;
use cap_std::fs_utf8::Dir;
use clap::{Parser, Subcommand};
use mockable::DefaultClock;
use serde::Serialize;
use serde_json::{Value, json};
use std::io::{self, Write};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::runtime::Builder;
use toolbridge::bridge::{BridgeError, CapabilityBridge};
use toolbridge::config::{
    BridgeSettings, DEFAULT_COMMAND_TIMEOUT, DEFAULT_SERVER_CONFIG, DEFAULT_SESSION_ROOT,
    DEFAULT_STOP_GRACE_PERIOD, DEFAULT_TOOLS_DIR, SettingsError,
};
use toolbridge::mcp_server::adapters::TokioProcessHost;
use toolbridge::mcp_server::ports::ProcessExit;
use toolbridge::session_memory::services::{SessionMemoryStore, SessionStoreError};
use toolbridge::telemetry::{self, TelemetryError};
use toolbridge::tool_registry::adapters::BuiltinToolbox;
use toolbridge::tool_registry::domain::{
    ParseToolArgumentsError, ParseToolManifestError, ToolArguments, ToolManifest,
};
use tracing::{error, info, warn};

#[derive(Debug, Parser)]
#[command(name = "toolbridge", version, about = "Discover tools, run them and supervise servers")]
struct Cli {
    /// Directory scanned for tool manifests.
    #[arg(long, env = "TOOLBRIDGE_TOOLS_DIR", default_value = DEFAULT_TOOLS_DIR, global = true)]
    tools_dir: Utf8PathBuf,

    /// Server configuration document.
    #[arg(long, env = "TOOLBRIDGE_SERVER_CONFIG", default_value = DEFAULT_SERVER_CONFIG, global = true)]
    server_config: Utf8PathBuf,

    /// Root directory holding one subdirectory per session.
    #[arg(long, env = "TOOLBRIDGE_SESSION_ROOT", default_value = DEFAULT_SESSION_ROOT, global = true)]
    session_root: Utf8PathBuf,

    /// Seconds a stopping server may take before it is killed.
    #[arg(long, env = "TOOLBRIDGE_STOP_GRACE_SECS", default_value_t = DEFAULT_STOP_GRACE_PERIOD.as_secs(), global = true)]
    stop_grace_secs: u64,

    /// Seconds a command-backed tool may run.
    #[arg(long, env = "TOOLBRIDGE_COMMAND_TIMEOUT_SECS", default_value_t = DEFAULT_COMMAND_TIMEOUT.as_secs(), global = true)]
    command_timeout_secs: u64,

    /// Tracing filter directive, for example `toolbridge=debug`.
    #[arg(long, env = "TOOLBRIDGE_LOG", global = true)]
    log_filter: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List local tools and enabled servers.
    List,
    /// Execute a local tool.
    Execute {
        /// Tool identifier.
        #[arg(long)]
        tool: String,
        /// Arguments as a JSON object.
        #[arg(long, default_value = "{}")]
        args: String,
    },
    /// Show the lifecycle state of every configured server.
    Servers,
    /// Start enabled servers and keep them running until interrupted.
    Supervise,
    /// Print aggregate counts.
    Info,
    /// Validate a manifest and install it into the tools directory.
    Install {
        /// Path of the manifest to install.
        #[arg(long)]
        manifest: Utf8PathBuf,
    },
    /// Manage session memory.
    #[command(subcommand)]
    Session(SessionCommand),
}

#[derive(Debug, Subcommand)]
enum SessionCommand {
    /// Start a session, creating its live store.
    Start {
        /// Session name.
        name: String,
    },
    /// Report every session and its archives.
    Status,
    /// Archive the live store of a session.
    Stop {
        /// Session name.
        name: String,
    },
    /// Append a record to an active session.
    Remember {
        /// Session name.
        name: String,
        /// Speaker role, for example `user`.
        #[arg(long)]
        role: String,
        /// Record text.
        #[arg(long)]
        content: String,
    },
    /// Print the records of a session or one of its archives.
    Recall {
        /// Session name.
        name: String,
        /// Archive file name; the live store is read when omitted.
        #[arg(long)]
        archive: Option<String>,
    },
}

#[derive(Debug, Error)]
enum CliError {
    #[error("invalid settings: {0}")]
    Settings(#[from] SettingsError),
    #[error(transparent)]
    Telemetry(#[from] TelemetryError),
    #[error(transparent)]
    Bridge(#[from] BridgeError),
    #[error(transparent)]
    Session(#[from] SessionStoreError),
    #[error("invalid tool arguments: {0}")]
    Arguments(#[from] ParseToolArgumentsError),
    #[error("invalid manifest {path}: {reason}")]
    Manifest { path: Utf8PathBuf, reason: String },
    #[error("runtime init failed: {0}")]
    RuntimeInit(#[source] io::Error),
    #[error("failed to write output: {0}")]
    Output(#[source] io::Error),
    #[error("failed to encode output: {0}")]
    Encode(#[source] serde_json::Error),
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            if let Err(report_err) = emit(&json!({ "error": err.to_string() })) {
                error!(error = %err, report_error = %report_err, "failed to report error");
            }
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    telemetry::init(cli.log_filter.as_deref())?;
    let settings = settings_from(&cli)?;
    let runtime = Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(CliError::RuntimeInit)?;
    runtime.block_on(dispatch(cli.command, settings))
}

fn settings_from(cli: &Cli) -> Result<BridgeSettings, SettingsError> {
    BridgeSettings::new(
        cli.tools_dir.clone(),
        cli.server_config.clone(),
        cli.session_root.clone(),
        Duration::from_secs(cli.stop_grace_secs),
        Duration::from_secs(cli.command_timeout_secs),
    )
}

fn build_bridge(settings: BridgeSettings) -> CapabilityBridge<TokioProcessHost> {
    CapabilityBridge::new(
        settings,
        BuiltinToolbox::with_defaults(),
        Arc::new(TokioProcessHost::new()),
    )
}

async fn dispatch(command: Command, settings: BridgeSettings) -> Result<(), CliError> {
    match command {
        Command::Session(session) => {
            let store = SessionMemoryStore::new(
                settings.session_root().to_owned(),
                Arc::new(DefaultClock),
            );
            run_session(session, &store).await
        }
        Command::List => {
            let bridge = build_bridge(settings);
            emit(&bridge.list_tools().await)
        }
        Command::Execute { tool, args } => {
            let arguments = ToolArguments::from_json(&args)?;
            let bridge = build_bridge(settings);
            let output = bridge.execute(&tool, arguments).await?;
            emit(&output)
        }
        Command::Servers => {
            let bridge = build_bridge(settings);
            bridge.try_initialize().await?;
            emit(&bridge.servers().statuses().await)
        }
        Command::Supervise => supervise(build_bridge(settings)).await,
        Command::Info => {
            let store = SessionMemoryStore::new(
                settings.session_root().to_owned(),
                Arc::new(DefaultClock),
            );
            let bridge = build_bridge(settings);
            bridge.try_initialize().await?;
            let summary = bridge.summary().await;
            let sessions = store.status().await?;
            emit(&json!({
                "tools": summary,
                "active_sessions": sessions.active_count(),
                "archived_sessions": sessions.archive_count(),
            }))
        }
        Command::Install { manifest } => {
            let parsed = read_manifest(&manifest)?;
            let bridge = build_bridge(settings);
            let id = bridge.install_tool(&parsed).await?;
            emit(&json!({ "installed": id }))
        }
    }
}

async fn run_session(
    command: SessionCommand,
    store: &SessionMemoryStore<DefaultClock>,
) -> Result<(), CliError> {
    match command {
        SessionCommand::Start { name } => {
            let path = store.start(&name).await?;
            emit(&json!({ "session": name, "store": path.as_str() }))
        }
        SessionCommand::Status => emit(&store.status().await?),
        SessionCommand::Stop { name } => emit(&store.stop(&name).await?),
        SessionCommand::Remember {
            name,
            role,
            content,
        } => emit(&store.append(&name, &role, &content).await?),
        SessionCommand::Recall { name, archive } => {
            let records = match archive {
                Some(file_name) => store.archived_records(&name, &file_name).await?,
                None => store.records(&name).await?,
            };
            emit(&records)
        }
    }
}

async fn supervise(bridge: CapabilityBridge<TokioProcessHost>) -> Result<(), CliError> {
    bridge.try_initialize().await?;
    let started = bridge.servers().start_enabled().await;
    emit(&outcome_map(started.iter().map(|(name, result)| {
        (name.as_str(), result.as_ref().map(|()| json!("running")))
    })))?;

    info!("supervising servers; press Ctrl-C to stop");
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "failed to listen for Ctrl-C; shutting down");
    }

    let stopped = bridge.servers().shutdown_all().await;
    emit(&outcome_map(stopped.iter().map(|(name, result)| {
        (name.as_str(), result.as_ref().map(|exit| json!(describe_exit(*exit))))
    })))
}

fn outcome_map<'a, E>(
    outcomes: impl Iterator<Item = (&'a str, Result<Value, &'a E>)>,
) -> serde_json::Map<String, Value>
where
    E: std::fmt::Display + 'a,
{
    outcomes
        .map(|(name, result)| {
            let value = result.unwrap_or_else(|err| json!({ "error": err.to_string() }));
            (name.to_owned(), value)
        })
        .collect()
}

fn describe_exit(exit: ProcessExit) -> String {
    match exit {
        ProcessExit::Exited { code: Some(code) } => format!("exited with status {code}"),
        ProcessExit::Exited { code: None } => "exited on a signal".to_owned(),
        ProcessExit::Killed => "killed after the grace period".to_owned(),
    }
}

fn read_manifest(path: &Utf8Path) -> Result<ToolManifest, CliError> {
    let manifest_error = |reason: String| CliError::Manifest {
        path: path.to_owned(),
        reason,
    };
    let parent = path
        .parent()
        .filter(|dir| !dir.as_str().is_empty())
        .unwrap_or_else(|| Utf8Path::new("."));
    let file_name = path
        .file_name()
        .ok_or_else(|| manifest_error("path has no file name".to_owned()))?;
    let text = Dir::open_ambient_dir(parent, ambient_authority())
        .and_then(|dir| dir.read_to_string(file_name))
        .map_err(|err| manifest_error(err.to_string()))?;
    ToolManifest::from_json(&text).map_err(|ParseToolManifestError(reason)| manifest_error(reason))
}

fn emit(value: &impl Serialize) -> Result<(), CliError> {
    let mut stdout = io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, value).map_err(CliError::Encode)?;
    writeln!(stdout).map_err(CliError::Output)
}
