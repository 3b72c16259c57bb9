//! Domain model for configured servers and their process lifecycle.

mod config;
mod error;
mod launch;
mod name;
mod state;

pub use config::{
    DEFAULT_SERVER_DESCRIPTION, ServerConfigDocument, ServerConfigEntry, SkippedServer,
};
pub use error::{McpServerDomainError, ParseProcessStateError, ServerConfigError};
pub use launch::{ServerLaunchSpec, expand_placeholders};
pub use name::ServerName;
pub use state::ProcessState;
