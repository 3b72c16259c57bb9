//! Validated server names.

use super::McpServerDomainError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum length for a server name.
const MAX_SERVER_NAME_LENGTH: usize = 100;

/// Unique name of a configured server.
///
/// Names key the manager's handle table, so two spellings that normalise to
/// the same value refer to the same server.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ServerName(String);

impl ServerName {
    /// Creates a validated server name.
    ///
    /// The input is trimmed and lowercased. Only characters in `[a-z0-9_-]`
    /// are accepted.
    ///
    /// # Errors
    ///
    /// Returns [`McpServerDomainError`] when validation fails.
    pub fn new(value: impl Into<String>) -> Result<Self, McpServerDomainError> {
        let normalized = value.into().trim().to_ascii_lowercase();

        if normalized.is_empty() {
            return Err(McpServerDomainError::EmptyServerName);
        }

        let is_valid = normalized.chars().all(|character| {
            character.is_ascii_lowercase()
                || character.is_ascii_digit()
                || character == '_'
                || character == '-'
        });
        if !is_valid {
            return Err(McpServerDomainError::InvalidServerName(normalized));
        }

        if normalized.len() > MAX_SERVER_NAME_LENGTH {
            return Err(McpServerDomainError::ServerNameTooLong(normalized));
        }

        Ok(Self(normalized))
    }

    /// Returns the server name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for ServerName {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for ServerName {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl TryFrom<String> for ServerName {
    type Error = McpServerDomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ServerName> for String {
    fn from(value: ServerName) -> Self {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("sqlite", "sqlite")]
    #[case("  Brave-Search ", "brave-search")]
    #[case("file_system2", "file_system2")]
    fn accepts_and_normalises_names(#[case] input: &str, #[case] expected: &str) {
        let name = ServerName::new(input).expect("name should be valid");
        assert_eq!(name.as_str(), expected);
    }

    #[rstest]
    #[case("", McpServerDomainError::EmptyServerName)]
    #[case("   ", McpServerDomainError::EmptyServerName)]
    #[case("web search", McpServerDomainError::InvalidServerName("web search".to_owned()))]
    #[case("../etc", McpServerDomainError::InvalidServerName("../etc".to_owned()))]
    fn rejects_invalid_names(#[case] input: &str, #[case] expected: McpServerDomainError) {
        assert_eq!(ServerName::new(input), Err(expected));
    }

    #[test]
    fn rejects_overlong_names() {
        let result = ServerName::new("s".repeat(101));
        assert!(matches!(
            result,
            Err(McpServerDomainError::ServerNameTooLong(_))
        ));
    }
}
