//! Tool descriptor value object.

use super::{ToolId, ToolRegistryDomainError};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::fmt;

/// Description used when a tool or server does not declare one.
pub const DEFAULT_TOOL_DESCRIPTION: &str = "No description";

/// Prefix applied to identifiers of server-backed capabilities.
const SERVER_BACKED_PREFIX: &str = "mcp_";

/// Where a catalogued capability is realised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolKind {
    /// Executed in-process by the local execution engine.
    Local,
    /// Realised by a long-lived child process managed by the server manager.
    ServerBacked,
}

impl ToolKind {
    /// Returns the canonical string representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::ServerBacked => "server_backed",
        }
    }
}

impl fmt::Display for ToolKind {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Catalog metadata for a single capability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    id: ToolId,
    kind: ToolKind,
    description: String,
    requires_external_credential: bool,
    input_schema: Value,
}

impl ToolDescriptor {
    /// Creates a descriptor for a locally executed tool.
    ///
    /// Blank descriptions are replaced with [`DEFAULT_TOOL_DESCRIPTION`].
    #[must_use]
    pub fn local(
        id: ToolId,
        description: Option<&str>,
        requires_external_credential: bool,
        input_schema: Value,
    ) -> Self {
        Self {
            id,
            kind: ToolKind::Local,
            description: normalize_description(description),
            requires_external_credential,
            input_schema,
        }
    }

    /// Creates the synthetic descriptor for a configured server.
    ///
    /// # Errors
    ///
    /// Returns [`ToolRegistryDomainError`] when the server name cannot form a
    /// tool identifier.
    pub fn server_backed(
        server_name: &str,
        description: Option<&str>,
    ) -> Result<Self, ToolRegistryDomainError> {
        let id = ToolId::from_declared_name(&format!("{SERVER_BACKED_PREFIX}{server_name}"))?;
        Ok(Self {
            id,
            kind: ToolKind::ServerBacked,
            description: normalize_description(description),
            requires_external_credential: false,
            input_schema: json!({"type": "object"}),
        })
    }

    /// Returns the tool identifier.
    #[must_use]
    pub const fn id(&self) -> &ToolId {
        &self.id
    }

    /// Returns where the capability is realised.
    #[must_use]
    pub const fn kind(&self) -> ToolKind {
        self.kind
    }

    /// Returns the human-readable description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns whether the tool declares a need for an external credential.
    #[must_use]
    pub const fn requires_external_credential(&self) -> bool {
        self.requires_external_credential
    }

    /// Returns the input schema.
    #[must_use]
    pub const fn input_schema(&self) -> &Value {
        &self.input_schema
    }
}

fn normalize_description(description: Option<&str>) -> String {
    description
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .unwrap_or(DEFAULT_TOOL_DESCRIPTION)
        .to_owned()
}
