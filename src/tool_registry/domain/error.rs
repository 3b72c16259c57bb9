//! Error types for tool manifest validation and parsing.

use thiserror::Error;

/// Errors returned while constructing tool registry domain values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ToolRegistryDomainError {
    /// The declared tool name is empty after trimming.
    #[error("tool name must not be empty")]
    EmptyToolName,

    /// The declared tool name normalises to an empty identifier.
    #[error("tool name '{0}' contains no identifier characters")]
    InvalidToolName(String),

    /// The derived identifier exceeds the 100-character limit.
    #[error("tool identifier exceeds 100 character limit: {0}")]
    ToolIdTooLong(String),

    /// The input schema is not a JSON object.
    #[error("input schema for tool '{0}' must be a JSON object")]
    InvalidInputSchema(String),

    /// The input schema declares a `type` other than `object`.
    #[error("input schema for tool '{tool}' must describe an object, found type '{found}'")]
    NonObjectInputSchema {
        /// Declared tool name.
        tool: String,
        /// Schema `type` value that was found.
        found: String,
    },

    /// A command entry point has an empty command.
    #[error("command entry point for tool '{0}' must not be empty")]
    EmptyCommand(String),

    /// A built-in entry point names an implementation the toolbox lacks.
    #[error("tool '{tool}' references unknown built-in '{builtin}'")]
    UnknownBuiltin {
        /// Declared tool name.
        tool: String,
        /// Requested built-in implementation.
        builtin: String,
    },
}

/// Error returned while parsing arguments supplied as JSON text.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ParseToolArgumentsError {
    /// The text is not valid JSON.
    #[error("tool arguments are not valid JSON: {0}")]
    Malformed(String),

    /// The JSON value is not an object of named arguments.
    #[error("tool arguments must be a JSON object, found {0}")]
    NotAnObject(&'static str),
}

/// Error returned while parsing a tool manifest.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("malformed tool manifest: {0}")]
pub struct ParseToolManifestError(pub String);
