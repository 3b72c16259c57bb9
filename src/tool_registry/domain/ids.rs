//! Identifier types for discovered tools and tool invocations.

use super::ToolRegistryDomainError;
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;
use uuid::Uuid;

/// Maximum length for a tool identifier.
const MAX_TOOL_ID_LENGTH: usize = 100;

/// Stable identifier of a tool, derived from its declared name.
///
/// The same declared name always yields the same identifier, so identifiers
/// survive process restarts and re-scans.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ToolId(String);

impl ToolId {
    /// Derives a tool identifier from a declared name.
    ///
    /// The name is trimmed and lowercased; every run of characters outside
    /// `[a-z0-9_]` collapses to a single underscore and leading or trailing
    /// underscores are stripped.
    ///
    /// # Errors
    ///
    /// Returns [`ToolRegistryDomainError`] when the name is empty, contains no
    /// identifier characters, or is longer than 100 characters once derived.
    pub fn from_declared_name(name: &str) -> Result<Self, ToolRegistryDomainError> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(ToolRegistryDomainError::EmptyToolName);
        }

        let mut derived = String::with_capacity(trimmed.len());
        let mut pending_separator = false;
        for character in trimmed.chars().flat_map(char::to_lowercase) {
            if character.is_ascii_lowercase() || character.is_ascii_digit() || character == '_' {
                if pending_separator && !derived.is_empty() {
                    derived.push('_');
                }
                pending_separator = false;
                derived.push(character);
            } else {
                pending_separator = true;
            }
        }
        let normalized = derived.trim_matches('_').to_owned();

        if normalized.is_empty() {
            return Err(ToolRegistryDomainError::InvalidToolName(trimmed.to_owned()));
        }

        if normalized.len() > MAX_TOOL_ID_LENGTH {
            return Err(ToolRegistryDomainError::ToolIdTooLong(normalized));
        }

        Ok(Self(normalized))
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for ToolId {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl Borrow<str> for ToolId {
    fn borrow(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for ToolId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Identifier attached to a single tool execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InvocationId(Uuid);

impl InvocationId {
    /// Creates a new random invocation identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns the wrapped UUID.
    #[must_use]
    pub const fn into_inner(self) -> Uuid {
        self.0
    }
}

impl Default for InvocationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for InvocationId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("echo", "echo")]
    #[case("  Word Count ", "word_count")]
    #[case("read-file.v2", "read_file_v2")]
    #[case("__private__", "private")]
    #[case("Résumé Parser", "r_sum_parser")]
    fn derives_identifier_from_declared_name(#[case] declared: &str, #[case] expected: &str) {
        let id = ToolId::from_declared_name(declared).expect("name should be valid");
        assert_eq!(id.as_str(), expected);
    }

    #[test]
    fn derivation_is_deterministic() {
        let first = ToolId::from_declared_name("File Search").expect("valid name");
        let second = ToolId::from_declared_name("file search").expect("valid name");
        assert_eq!(first, second);
    }

    #[rstest]
    #[case("   ", ToolRegistryDomainError::EmptyToolName)]
    #[case("---", ToolRegistryDomainError::InvalidToolName("---".to_owned()))]
    fn rejects_names_without_identifier_characters(
        #[case] declared: &str,
        #[case] expected: ToolRegistryDomainError,
    ) {
        assert_eq!(ToolId::from_declared_name(declared), Err(expected));
    }

    #[test]
    fn rejects_overlong_identifiers() {
        let declared = "a".repeat(101);
        assert!(matches!(
            ToolId::from_declared_name(&declared),
            Err(ToolRegistryDomainError::ToolIdTooLong(_))
        ));
    }
}
