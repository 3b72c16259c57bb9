//! Named arguments passed to a tool and the output it produces.

use super::{InvocationId, ParseToolArgumentsError, ToolId};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Named arguments for a single tool execution.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ToolArguments(Map<String, Value>);

impl ToolArguments {
    /// Creates an empty argument set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses arguments from JSON text such as a command-line `--args` value.
    ///
    /// Blank text yields an empty argument set.
    ///
    /// # Errors
    ///
    /// Returns [`ParseToolArgumentsError`] when the text is not JSON or is not
    /// a JSON object.
    pub fn from_json(text: &str) -> Result<Self, ParseToolArgumentsError> {
        if text.trim().is_empty() {
            return Ok(Self::new());
        }

        let value: Value = serde_json::from_str(text)
            .map_err(|err| ParseToolArgumentsError::Malformed(err.to_string()))?;
        Self::try_from(value)
    }

    /// Adds or replaces a named argument.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: Value) -> Self {
        self.0.insert(name.into(), value);
        self
    }

    /// Returns an argument by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    /// Returns a string argument by name.
    #[must_use]
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.0.get(name).and_then(Value::as_str)
    }

    /// Returns the number of arguments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns whether no arguments were supplied.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the arguments as a JSON object value.
    #[must_use]
    pub fn to_value(&self) -> Value {
        Value::Object(self.0.clone())
    }
}

impl TryFrom<Value> for ToolArguments {
    type Error = ParseToolArgumentsError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            Value::Null => Err(ParseToolArgumentsError::NotAnObject("null")),
            Value::Bool(_) => Err(ParseToolArgumentsError::NotAnObject("a boolean")),
            Value::Number(_) => Err(ParseToolArgumentsError::NotAnObject("a number")),
            Value::String(_) => Err(ParseToolArgumentsError::NotAnObject("a string")),
            Value::Array(_) => Err(ParseToolArgumentsError::NotAnObject("an array")),
        }
    }
}

/// Successful result of a tool execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolOutput {
    /// Identifier of the tool that ran.
    pub tool_id: ToolId,
    /// Identifier of this execution.
    pub invocation_id: InvocationId,
    /// Value returned by the tool.
    pub payload: Value,
}
