//! Validated session names.

use super::SessionDomainError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum length for a session name.
const MAX_SESSION_NAME_LENGTH: usize = 100;

/// Name of a session; also the name of its directory under the root.
///
/// Only `[A-Za-z0-9_-]` is accepted, so a name can never contain a path
/// separator or a parent-directory reference.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SessionName(String);

impl SessionName {
    /// Creates a validated session name. Surrounding whitespace is trimmed;
    /// case is preserved.
    ///
    /// # Errors
    ///
    /// Returns [`SessionDomainError`] when validation fails.
    pub fn new(value: impl Into<String>) -> Result<Self, SessionDomainError> {
        let trimmed = value.into().trim().to_owned();

        if trimmed.is_empty() {
            return Err(SessionDomainError::EmptySessionName);
        }

        let is_valid = trimmed.chars().all(|character| {
            character.is_ascii_alphanumeric() || character == '_' || character == '-'
        });
        if !is_valid {
            return Err(SessionDomainError::InvalidSessionName(trimmed));
        }

        if trimmed.len() > MAX_SESSION_NAME_LENGTH {
            return Err(SessionDomainError::SessionNameTooLong(trimmed));
        }

        Ok(Self(trimmed))
    }

    /// Returns the session name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for SessionName {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for SessionName {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl TryFrom<String> for SessionName {
    type Error = SessionDomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<SessionName> for String {
    fn from(value: SessionName) -> Self {
        value.0
    }
}
