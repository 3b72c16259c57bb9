//! Tracing subscriber installation for the command-line binary.
//!
//! Library code only emits `tracing` events; installing a subscriber is left
//! to the binary so embedding hosts keep control of their own output.

use thiserror::Error;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Filter applied when none is configured.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Errors returned while installing the subscriber.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// The filter directive could not be parsed.
    #[error("invalid log filter '{directive}': {reason}")]
    InvalidFilter {
        /// Directive as supplied.
        directive: String,
        /// Parser message.
        reason: String,
    },

    /// A global subscriber is already installed.
    #[error("failed to install tracing subscriber: {0}")]
    Install(String),
}

/// Builds an [`EnvFilter`] from `directive`, falling back to
/// [`DEFAULT_LOG_FILTER`] when it is absent or blank.
///
/// # Errors
///
/// Returns [`TelemetryError::InvalidFilter`] when the directive is invalid.
pub fn build_filter(directive: Option<&str>) -> Result<EnvFilter, TelemetryError> {
    let chosen = directive
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .unwrap_or(DEFAULT_LOG_FILTER);
    EnvFilter::try_new(chosen).map_err(|err| TelemetryError::InvalidFilter {
        directive: chosen.to_owned(),
        reason: err.to_string(),
    })
}

/// Installs a global subscriber writing human-readable events to stderr.
///
/// Stdout is left untouched so command output stays machine-readable.
///
/// # Errors
///
/// Returns [`TelemetryError`] when the filter is invalid or a subscriber is
/// already installed.
pub fn init(directive: Option<&str>) -> Result<(), TelemetryError> {
    let filter = build_filter(directive)?;
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .with(filter)
        .try_init()
        .map_err(|err| TelemetryError::Install(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(None)]
    #[case(Some("   "))]
    #[case(Some("toolbridge=debug,warn"))]
    fn accepts_valid_directives(#[case] directive: Option<&str>) {
        assert!(build_filter(directive).is_ok());
    }

    #[test]
    fn rejects_invalid_directives() {
        assert!(matches!(
            build_filter(Some("toolbridge=loudest")),
            Err(TelemetryError::InvalidFilter { .. })
        ));
    }
}
