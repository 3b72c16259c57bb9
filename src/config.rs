//! Explicit settings for the bridge and its collaborators.
//!
//! Every base path and timeout is a value passed to constructors; nothing is
//! derived from the process working directory implicitly.

use camino::{Utf8Path, Utf8PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Default directory scanned for tool manifests.
pub const DEFAULT_TOOLS_DIR: &str = "tools";

/// Default server configuration document.
pub const DEFAULT_SERVER_CONFIG: &str = "mcp_servers.json";

/// Default root directory for session stores.
pub const DEFAULT_SESSION_ROOT: &str = ".toolbridge/sessions";

/// Default wait between a termination request and a forced kill.
pub const DEFAULT_STOP_GRACE_PERIOD: Duration = Duration::from_secs(5);

/// Default upper bound on a single command-tool execution.
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors returned when settings fail validation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SettingsError {
    /// A duration setting is zero.
    #[error("{0} must be greater than zero")]
    ZeroDuration(&'static str),

    /// A path setting is empty.
    #[error("{0} must not be empty")]
    EmptyPath(&'static str),
}

/// Validated bridge settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeSettings {
    tools_dir: Utf8PathBuf,
    server_config: Utf8PathBuf,
    session_root: Utf8PathBuf,
    stop_grace_period: Duration,
    command_timeout: Duration,
}

impl Default for BridgeSettings {
    fn default() -> Self {
        Self {
            tools_dir: Utf8PathBuf::from(DEFAULT_TOOLS_DIR),
            server_config: Utf8PathBuf::from(DEFAULT_SERVER_CONFIG),
            session_root: Utf8PathBuf::from(DEFAULT_SESSION_ROOT),
            stop_grace_period: DEFAULT_STOP_GRACE_PERIOD,
            command_timeout: DEFAULT_COMMAND_TIMEOUT,
        }
    }
}

impl BridgeSettings {
    /// Creates validated settings.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError`] when a path is empty or a duration is zero.
    pub fn new(
        tools_dir: impl Into<Utf8PathBuf>,
        server_config: impl Into<Utf8PathBuf>,
        session_root: impl Into<Utf8PathBuf>,
        stop_grace_period: Duration,
        command_timeout: Duration,
    ) -> Result<Self, SettingsError> {
        let settings = Self {
            tools_dir: tools_dir.into(),
            server_config: server_config.into(),
            session_root: session_root.into(),
            stop_grace_period,
            command_timeout,
        };
        settings.validate()?;
        Ok(settings)
    }

    /// Returns a copy with a different tools directory.
    #[must_use]
    pub fn with_tools_dir(mut self, path: impl Into<Utf8PathBuf>) -> Self {
        self.tools_dir = path.into();
        self
    }

    /// Returns a copy with a different server configuration path.
    #[must_use]
    pub fn with_server_config(mut self, path: impl Into<Utf8PathBuf>) -> Self {
        self.server_config = path.into();
        self
    }

    /// Returns a copy with a different session root.
    #[must_use]
    pub fn with_session_root(mut self, path: impl Into<Utf8PathBuf>) -> Self {
        self.session_root = path.into();
        self
    }

    /// Returns a copy with a different stop grace period.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::ZeroDuration`] for a zero period.
    pub fn with_stop_grace_period(mut self, period: Duration) -> Result<Self, SettingsError> {
        self.stop_grace_period = period;
        self.validate()?;
        Ok(self)
    }

    /// Returns a copy with a different command timeout.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::ZeroDuration`] for a zero timeout.
    pub fn with_command_timeout(mut self, timeout: Duration) -> Result<Self, SettingsError> {
        self.command_timeout = timeout;
        self.validate()?;
        Ok(self)
    }

    fn validate(&self) -> Result<(), SettingsError> {
        for (setting, path) in [
            ("tools directory", &self.tools_dir),
            ("server configuration path", &self.server_config),
            ("session root", &self.session_root),
        ] {
            if path.as_str().trim().is_empty() {
                return Err(SettingsError::EmptyPath(setting));
            }
        }
        if self.stop_grace_period.is_zero() {
            return Err(SettingsError::ZeroDuration("stop grace period"));
        }
        if self.command_timeout.is_zero() {
            return Err(SettingsError::ZeroDuration("command timeout"));
        }
        Ok(())
    }

    /// Directory scanned for tool manifests.
    #[must_use]
    pub fn tools_dir(&self) -> &Utf8Path {
        &self.tools_dir
    }

    /// Server configuration document path.
    #[must_use]
    pub fn server_config(&self) -> &Utf8Path {
        &self.server_config
    }

    /// Root directory for session stores.
    #[must_use]
    pub fn session_root(&self) -> &Utf8Path {
        &self.session_root
    }

    /// Wait between a termination request and a forced kill.
    #[must_use]
    pub const fn stop_grace_period(&self) -> Duration {
        self.stop_grace_period
    }

    /// Upper bound on a single command-tool execution.
    #[must_use]
    pub const fn command_timeout(&self) -> Duration {
        self.command_timeout
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn defaults_are_valid() {
        let settings = BridgeSettings::default();
        assert_eq!(settings.stop_grace_period(), Duration::from_secs(5));
        assert_eq!(settings.command_timeout(), Duration::from_secs(30));
        assert_eq!(settings.tools_dir(), Utf8Path::new(DEFAULT_TOOLS_DIR));
    }

    #[rstest]
    #[case(Duration::ZERO, Duration::from_secs(1), "stop grace period")]
    #[case(Duration::from_secs(1), Duration::ZERO, "command timeout")]
    fn zero_durations_are_rejected(
        #[case] grace: Duration,
        #[case] timeout: Duration,
        #[case] setting: &'static str,
    ) {
        let result = BridgeSettings::new("tools", "servers.json", "sessions", grace, timeout);
        assert_eq!(result, Err(SettingsError::ZeroDuration(setting)));
    }

    #[test]
    fn empty_paths_are_rejected() {
        let result = BridgeSettings::new(
            "",
            "servers.json",
            "sessions",
            Duration::from_secs(1),
            Duration::from_secs(1),
        );
        assert_eq!(result, Err(SettingsError::EmptyPath("tools directory")));
    }
}
