//! Shared fixtures for integration tests: scratch workspaces, a fixed clock
//! and scoped environment variables.

use camino::{Utf8Path, Utf8PathBuf};
use chrono::{DateTime, Local, TimeZone, Utc};
use mockable::Clock;
use serde_json::Value;
use std::env;
use std::ffi::OsString;
use std::sync::{Mutex, MutexGuard, OnceLock};
use tempfile::TempDir;
use toolbridge::config::BridgeSettings;

static ENV_MUTEX: OnceLock<Mutex<()>> = OnceLock::new();

/// Scratch directory laid out like a bridge deployment.
pub struct Workspace {
    _dir: TempDir,
    root: Utf8PathBuf,
}

impl Workspace {
    /// Creates an empty workspace.
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("temporary directory");
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf-8 temp path");
        Self { _dir: dir, root }
    }

    /// Workspace root.
    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    /// Tools directory; not created until something is written to it.
    pub fn tools_dir(&self) -> Utf8PathBuf {
        self.root.join("tools")
    }

    /// Server configuration path.
    pub fn server_config(&self) -> Utf8PathBuf {
        self.root.join("mcp_servers.json")
    }

    /// Session root directory.
    pub fn session_root(&self) -> Utf8PathBuf {
        self.root.join("sessions")
    }

    /// Settings pointing every path into the workspace.
    pub fn settings(&self) -> BridgeSettings {
        BridgeSettings::default()
            .with_tools_dir(self.tools_dir())
            .with_server_config(self.server_config())
            .with_session_root(self.session_root())
    }

    /// Writes `body` as a manifest file inside the tools directory.
    pub fn write_manifest(&self, file_name: &str, body: &Value) {
        self.write_text(&self.tools_dir().join(file_name), &body.to_string());
    }

    /// Writes raw text inside the tools directory.
    pub fn write_tool_file(&self, file_name: &str, text: &str) {
        self.write_text(&self.tools_dir().join(file_name), text);
    }

    /// Writes the server configuration document.
    pub fn write_server_config(&self, body: &Value) {
        self.write_text(&self.server_config(), &body.to_string());
    }

    fn write_text(&self, path: &Utf8Path, text: &str) {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create parent directory");
        }
        std::fs::write(path, text).expect("write workspace file");
    }
}

/// Clock frozen at a single instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    instant: DateTime<Utc>,
}

impl FixedClock {
    /// Freezes the clock at `unix_seconds`.
    pub fn at(unix_seconds: i64) -> Self {
        let instant = Utc
            .timestamp_opt(unix_seconds, 0)
            .single()
            .expect("valid timestamp");
        Self { instant }
    }
}

impl Clock for FixedClock {
    fn local(&self) -> DateTime<Local> {
        self.instant.with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        self.instant
    }
}

/// Guard that applies scoped environment variable updates.
pub struct EnvVarGuard {
    previous: Vec<(OsString, Option<OsString>)>,
    _lock: MutexGuard<'static, ()>,
}

impl EnvVarGuard {
    /// Sets `key` to `value` for the guard lifetime.
    pub fn set(key: &str, value: &str) -> Self {
        let lock = env_lock();
        let previous = vec![(OsString::from(key), env::var_os(key))];
        unsafe {
            // SAFETY: the global mutex serialises environment mutations in tests.
            env::set_var(key, value);
        }
        Self {
            previous,
            _lock: lock,
        }
    }
}

impl Drop for EnvVarGuard {
    fn drop(&mut self) {
        for (key, value) in self.previous.drain(..) {
            unsafe {
                // SAFETY: the global mutex serialises environment mutations in tests.
                match value {
                    Some(previous) => env::set_var(&key, &previous),
                    None => env::remove_var(&key),
                }
            }
        }
    }
}

fn env_lock() -> MutexGuard<'static, ()> {
    ENV_MUTEX
        .get_or_init(|| Mutex::new(()))
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner)
}
