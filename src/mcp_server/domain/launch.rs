//! Launch contract for a server process.

use super::McpServerDomainError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Command, arguments and environment overlay used to spawn a server.
///
/// The command is executed directly with the argument vector; no shell is
/// involved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerLaunchSpec {
    command: String,
    args: Vec<String>,
    env: BTreeMap<String, String>,
}

impl ServerLaunchSpec {
    /// Creates a launch specification.
    ///
    /// # Errors
    ///
    /// Returns [`McpServerDomainError::EmptyCommand`] when `command` is empty
    /// after trimming.
    pub fn new(command: impl Into<String>) -> Result<Self, McpServerDomainError> {
        let normalized_command = command.into().trim().to_owned();
        if normalized_command.is_empty() {
            return Err(McpServerDomainError::EmptyCommand);
        }

        Ok(Self {
            command: normalized_command,
            args: Vec::new(),
            env: BTreeMap::new(),
        })
    }

    /// Replaces command-line arguments.
    #[must_use]
    pub fn with_args(mut self, values: impl IntoIterator<Item = String>) -> Self {
        self.args = values.into_iter().collect();
        self
    }

    /// Replaces the environment overlay.
    #[must_use]
    pub fn with_env(mut self, values: impl IntoIterator<Item = (String, String)>) -> Self {
        self.env = values.into_iter().collect();
        self
    }

    /// Returns the executable command.
    #[must_use]
    pub fn command(&self) -> &str {
        &self.command
    }

    /// Returns command-line arguments.
    #[must_use]
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Returns the environment overlay as configured.
    #[must_use]
    pub const fn env(&self) -> &BTreeMap<String, String> {
        &self.env
    }

    /// Returns the environment overlay with `${VAR}` placeholders expanded.
    ///
    /// `lookup` resolves variable names, normally against the inherited
    /// process environment.
    #[must_use]
    pub fn resolved_env<F>(&self, lookup: F) -> BTreeMap<String, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        self.env
            .iter()
            .map(|(key, value)| (key.clone(), expand_placeholders(value, &lookup)))
            .collect()
    }
}

/// Expands `${VAR}` placeholders in `input`.
///
/// Placeholders that `lookup` cannot resolve, and unterminated `${`
/// sequences, are kept verbatim.
pub fn expand_placeholders<F>(input: &str, lookup: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    let mut expanded = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find("${") {
        let (before, candidate) = rest.split_at(start);
        expanded.push_str(before);

        let body = candidate.get(2..).unwrap_or_default();
        let Some(end) = body.find('}') else {
            expanded.push_str(candidate);
            return expanded;
        };
        let (name, after) = body.split_at(end);

        match lookup(name) {
            Some(value) if !name.is_empty() => expanded.push_str(&value),
            _ => {
                expanded.push_str("${");
                expanded.push_str(name);
                expanded.push('}');
            }
        }
        rest = after.get(1..).unwrap_or_default();
    }

    expanded.push_str(rest);
    expanded
}
