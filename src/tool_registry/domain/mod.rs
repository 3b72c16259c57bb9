//! Domain model for tool discovery and local execution.
//!
//! The tool registry domain models tool identity, the manifest contract a
//! discoverable unit must satisfy, catalog descriptors, and the arguments and
//! output of a single execution. Filesystem and process concerns remain
//! outside this boundary.

mod arguments;
mod descriptor;
mod error;
mod ids;
mod manifest;

pub use arguments::{ToolArguments, ToolOutput};
pub use descriptor::{DEFAULT_TOOL_DESCRIPTION, ToolDescriptor, ToolKind};
pub use error::{ParseToolArgumentsError, ParseToolManifestError, ToolRegistryDomainError};
pub use ids::{InvocationId, ToolId};
pub use manifest::{ToolEntry, ToolManifest};
