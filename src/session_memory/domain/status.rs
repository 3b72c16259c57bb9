//! Aggregate session status.

use super::SessionName;
use serde::Serialize;

/// Whether a session currently has a live store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// The session has a writable live store.
    Active,
    /// The session directory only holds archives.
    Archived,
}

/// Status of one session directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionSummary {
    /// Session name.
    pub name: SessionName,
    /// Current state.
    pub state: SessionState,
    /// Records in the live store; `None` for archived sessions.
    pub record_count: Option<u64>,
    /// Archive file names in ascending order.
    pub archives: Vec<String>,
}

/// Result of a status query over the session root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "sessions", rename_all = "snake_case")]
pub enum SessionStatusReport {
    /// No session directories exist.
    NoSessions,
    /// Summaries for every session, sorted by name.
    Sessions(Vec<SessionSummary>),
}

impl SessionStatusReport {
    /// Returns the summaries, empty when there are no sessions.
    #[must_use]
    pub fn sessions(&self) -> &[SessionSummary] {
        match self {
            Self::NoSessions => &[],
            Self::Sessions(sessions) => sessions,
        }
    }

    /// Returns the number of active sessions.
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.sessions()
            .iter()
            .filter(|summary| summary.state == SessionState::Active)
            .count()
    }

    /// Returns the total number of archive files across sessions.
    #[must_use]
    pub fn archive_count(&self) -> usize {
        self.sessions()
            .iter()
            .map(|summary| summary.archives.len())
            .sum()
    }
}
