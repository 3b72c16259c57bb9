//! Server configuration document.
//!
//! The document uses the conventional `mcpServers` layout:
//!
//! ```json
//! {"mcpServers": {"sqlite": {"command": "uvx", "args": ["mcp-server-sqlite"],
//!   "env": {}, "enabled": true, "description": "SQLite access"}}}
//! ```
//!
//! `args` and `env` default to empty, `enabled` to `false` and `description`
//! to [`DEFAULT_SERVER_DESCRIPTION`]. An entry that fails validation is
//! skipped and recorded; its siblings still load.

use super::{McpServerDomainError, ServerConfigError, ServerLaunchSpec, ServerName};
use camino::Utf8Path;
use cap_std::ambient_authority;
use cap_std::fs_utf8::Dir;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io;
use std::sync::Arc;
use tracing::warn;

/// Description used when a server entry does not declare one.
pub const DEFAULT_SERVER_DESCRIPTION: &str = "MCP server";

/// A single validated server entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServerConfigEntry {
    name: ServerName,
    launch: ServerLaunchSpec,
    enabled: bool,
    description: String,
}

impl ServerConfigEntry {
    /// Creates an entry.
    #[must_use]
    pub fn new(
        name: ServerName,
        launch: ServerLaunchSpec,
        enabled: bool,
        description: Option<&str>,
    ) -> Self {
        Self {
            name,
            launch,
            enabled,
            description: description
                .map(str::trim)
                .filter(|text| !text.is_empty())
                .unwrap_or(DEFAULT_SERVER_DESCRIPTION)
                .to_owned(),
        }
    }

    /// Returns the server name.
    #[must_use]
    pub const fn name(&self) -> &ServerName {
        &self.name
    }

    /// Returns the launch specification.
    #[must_use]
    pub const fn launch(&self) -> &ServerLaunchSpec {
        &self.launch
    }

    /// Returns whether the server may be started.
    #[must_use]
    pub const fn enabled(&self) -> bool {
        self.enabled
    }

    /// Returns the human-readable description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }
}

/// A server entry left out of the document because it failed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedServer {
    /// Server name as written in the document.
    pub name: String,
    /// Validation failure.
    pub reason: McpServerDomainError,
}

#[derive(Debug, Deserialize)]
struct RawDocument {
    #[serde(rename = "mcpServers", default)]
    servers: BTreeMap<String, RawEntry>,
}

#[derive(Debug, Deserialize)]
struct RawEntry {
    command: String,
    #[serde(default)]
    args: Vec<String>,
    #[serde(default)]
    env: BTreeMap<String, String>,
    #[serde(default)]
    enabled: bool,
    #[serde(default)]
    description: Option<String>,
}

impl RawEntry {
    fn into_entry(self, name: ServerName) -> Result<ServerConfigEntry, McpServerDomainError> {
        let launch = ServerLaunchSpec::new(self.command)?
            .with_args(self.args)
            .with_env(self.env);
        Ok(ServerConfigEntry::new(
            name,
            launch,
            self.enabled,
            self.description.as_deref(),
        ))
    }
}

/// Validated set of configured servers keyed by name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServerConfigDocument {
    servers: BTreeMap<ServerName, ServerConfigEntry>,
    skipped: Vec<SkippedServer>,
}

impl ServerConfigDocument {
    /// Creates an empty document.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Creates a document from already-validated entries.
    ///
    /// # Errors
    ///
    /// Returns [`ServerConfigError::DuplicateServer`] when two entries share
    /// a name.
    pub fn from_entries(
        entries: impl IntoIterator<Item = ServerConfigEntry>,
    ) -> Result<Self, ServerConfigError> {
        let mut servers = BTreeMap::new();
        for entry in entries {
            let name = entry.name().clone();
            if servers.insert(name.clone(), entry).is_some() {
                return Err(ServerConfigError::DuplicateServer(name.to_string()));
            }
        }
        Ok(Self {
            servers,
            skipped: Vec::new(),
        })
    }

    /// Parses and validates a document from JSON text.
    ///
    /// Entries with an invalid name or launch command are skipped and
    /// listed in [`Self::skipped`].
    ///
    /// # Errors
    ///
    /// Returns [`ServerConfigError`] when the text is malformed or two names
    /// normalise to the same server.
    pub fn from_json(text: &str) -> Result<Self, ServerConfigError> {
        let raw: RawDocument = serde_json::from_str(text)
            .map_err(|err| ServerConfigError::Malformed(err.to_string()))?;

        let mut entries = Vec::with_capacity(raw.servers.len());
        let mut skipped = Vec::new();
        for (written_name, raw_entry) in raw.servers {
            match ServerName::new(written_name.clone()).and_then(|name| raw_entry.into_entry(name))
            {
                Ok(entry) => entries.push(entry),
                Err(reason) => {
                    warn!(server = %written_name, error = %reason, "skipping invalid server entry");
                    skipped.push(SkippedServer {
                        name: written_name,
                        reason,
                    });
                }
            }
        }
        let mut document = Self::from_entries(entries)?;
        document.skipped = skipped;
        Ok(document)
    }

    /// Loads a document from `path`.
    ///
    /// A missing file yields an empty document.
    ///
    /// # Errors
    ///
    /// Returns [`ServerConfigError`] when the file cannot be read or its
    /// contents are invalid.
    pub fn load(path: &Utf8Path) -> Result<Self, ServerConfigError> {
        let unreadable = |source: io::Error| ServerConfigError::Unreadable {
            path: path.to_owned(),
            source: Arc::new(source),
        };
        let Some(file_name) = path.file_name() else {
            return Err(unreadable(io::Error::new(
                io::ErrorKind::InvalidInput,
                "configuration path has no file name",
            )));
        };
        let parent = match path.parent() {
            Some(parent) if !parent.as_str().is_empty() => parent,
            _ => Utf8Path::new("."),
        };

        let text = match Dir::open_ambient_dir(parent, ambient_authority())
            .and_then(|dir| dir.read_to_string(file_name))
        {
            Ok(text) => text,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Self::empty()),
            Err(err) => return Err(unreadable(err)),
        };
        Self::from_json(&text)
    }

    /// Returns the entry for `name`.
    #[must_use]
    pub fn get(&self, name: &ServerName) -> Option<&ServerConfigEntry> {
        self.servers.get(name)
    }

    /// Returns all entries keyed by name.
    #[must_use]
    pub const fn servers(&self) -> &BTreeMap<ServerName, ServerConfigEntry> {
        &self.servers
    }

    /// Iterates over enabled entries in name order.
    pub fn enabled(&self) -> impl Iterator<Item = &ServerConfigEntry> {
        self.servers.values().filter(|entry| entry.enabled())
    }

    /// Returns the entries skipped while parsing, in name order.
    #[must_use]
    pub fn skipped(&self) -> &[SkippedServer] {
        &self.skipped
    }

    /// Returns the number of configured servers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.servers.len()
    }

    /// Returns whether no servers are configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.servers.is_empty()
    }
}
