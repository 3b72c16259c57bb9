//! Process lifecycle states for managed servers.

use super::ParseProcessStateError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state of a managed server process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessState {
    /// The server has never been started by this manager.
    NotStarted,
    /// A live process exists for the server.
    Running,
    /// The process was stopped on request.
    Stopped,
    /// The most recent launch attempt failed.
    Failed,
}

impl ProcessState {
    /// Returns the canonical string representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NotStarted => "not_started",
            Self::Running => "running",
            Self::Stopped => "stopped",
            Self::Failed => "failed",
        }
    }

    /// Returns whether a live process exists in this state.
    #[must_use]
    pub const fn is_running(self) -> bool {
        matches!(self, Self::Running)
    }

    /// Returns whether transition to `target` is allowed.
    ///
    /// `Running` cannot be re-entered from itself, so a running server is
    /// never started twice.
    #[must_use]
    pub const fn can_transition_to(self, target: Self) -> bool {
        matches!(
            (self, target),
            (
                Self::NotStarted | Self::Stopped | Self::Failed,
                Self::Running | Self::Failed
            ) | (Self::Running, Self::Stopped)
        )
    }
}

impl fmt::Display for ProcessState {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl TryFrom<&str> for ProcessState {
    type Error = ParseProcessStateError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "not_started" => Ok(Self::NotStarted),
            "running" => Ok(Self::Running),
            "stopped" => Ok(Self::Stopped),
            "failed" => Ok(Self::Failed),
            _ => Err(ParseProcessStateError(value.to_owned())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(ProcessState::NotStarted, ProcessState::Running, true)]
    #[case(ProcessState::NotStarted, ProcessState::Failed, true)]
    #[case(ProcessState::NotStarted, ProcessState::Stopped, false)]
    #[case(ProcessState::Running, ProcessState::Running, false)]
    #[case(ProcessState::Running, ProcessState::Stopped, true)]
    #[case(ProcessState::Running, ProcessState::Failed, false)]
    #[case(ProcessState::Stopped, ProcessState::Running, true)]
    #[case(ProcessState::Stopped, ProcessState::Stopped, false)]
    #[case(ProcessState::Failed, ProcessState::Running, true)]
    #[case(ProcessState::Failed, ProcessState::Failed, true)]
    fn transition_matrix(
        #[case] from: ProcessState,
        #[case] to: ProcessState,
        #[case] allowed: bool,
    ) {
        assert_eq!(from.can_transition_to(to), allowed);
    }

    #[rstest]
    #[case("not_started", ProcessState::NotStarted)]
    #[case(" Running ", ProcessState::Running)]
    #[case("FAILED", ProcessState::Failed)]
    fn parses_states(#[case] input: &str, #[case] expected: ProcessState) {
        assert_eq!(ProcessState::try_from(input), Ok(expected));
    }

    #[test]
    fn rejects_unknown_state() {
        assert_eq!(
            ProcessState::try_from("paused"),
            Err(ParseProcessStateError("paused".to_owned()))
        );
    }
}
