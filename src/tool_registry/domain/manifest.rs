//! Tool manifest: the contract a discoverable unit must satisfy.
//!
//! Every unit in the tools directory is a JSON manifest declaring a name, a
//! description, an input schema, and the entry point that executes it. The
//! entry point either names an implementation from the built-in toolbox or an
//! external command that is spawned once per call.

use super::{ParseToolManifestError, ToolDescriptor, ToolId, ToolRegistryDomainError};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Execution entry point declared by a tool manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ToolEntry {
    /// An implementation registered in the built-in toolbox.
    Builtin {
        /// Toolbox key of the implementation.
        builtin: String,
    },
    /// An external executable receiving JSON arguments on stdin.
    Command {
        /// Executable to spawn.
        command: String,
        /// Fixed arguments passed before any input is written.
        #[serde(default)]
        args: Vec<String>,
    },
}

/// Declarative description of a discoverable tool unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolManifest {
    /// Declared tool name; the identifier is derived from it.
    pub name: String,
    /// Human-readable description.
    #[serde(default)]
    pub description: Option<String>,
    /// Structural description of accepted named arguments.
    pub input_schema: Value,
    /// Whether the tool would need an external credential to run.
    #[serde(default)]
    pub requires_external_credential: bool,
    /// Execution entry point.
    pub entry: ToolEntry,
}

impl ToolManifest {
    /// Parses a manifest from JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`ParseToolManifestError`] when the text is not valid JSON or
    /// lacks a required field.
    pub fn from_json(text: &str) -> Result<Self, ParseToolManifestError> {
        serde_json::from_str(text).map_err(|err| ParseToolManifestError(err.to_string()))
    }

    /// Serialises the manifest as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns [`ParseToolManifestError`] when serialisation fails.
    pub fn to_json(&self) -> Result<String, ParseToolManifestError> {
        serde_json::to_string_pretty(self).map_err(|err| ParseToolManifestError(err.to_string()))
    }

    /// Validates the manifest and returns the derived tool identifier.
    ///
    /// # Errors
    ///
    /// Returns [`ToolRegistryDomainError`] when the name cannot form an
    /// identifier, the input schema does not describe an object, or a
    /// command entry point is empty.
    pub fn validate(&self) -> Result<ToolId, ToolRegistryDomainError> {
        let id = ToolId::from_declared_name(&self.name)?;
        validate_input_schema(&self.name, &self.input_schema)?;

        if let ToolEntry::Command { command, .. } = &self.entry
            && command.trim().is_empty()
        {
            return Err(ToolRegistryDomainError::EmptyCommand(self.name.clone()));
        }

        Ok(id)
    }

    /// Builds the local descriptor for this manifest.
    #[must_use]
    pub fn to_descriptor(&self, id: ToolId) -> ToolDescriptor {
        ToolDescriptor::local(
            id,
            self.description.as_deref(),
            self.requires_external_credential,
            self.input_schema.clone(),
        )
    }
}

fn validate_input_schema(tool: &str, schema: &Value) -> Result<(), ToolRegistryDomainError> {
    let Some(object) = schema.as_object() else {
        return Err(ToolRegistryDomainError::InvalidInputSchema(tool.to_owned()));
    };

    match object.get("type") {
        None => Ok(()),
        Some(Value::String(kind)) if kind == "object" => Ok(()),
        Some(other) => Err(ToolRegistryDomainError::NonObjectInputSchema {
            tool: tool.to_owned(),
            found: other.as_str().map_or_else(|| other.to_string(), str::to_owned),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    fn manifest(entry: ToolEntry, input_schema: Value) -> ToolManifest {
        ToolManifest {
            name: "Word Count".to_owned(),
            description: Some("Counts words".to_owned()),
            input_schema,
            requires_external_credential: false,
            entry,
        }
    }

    #[test]
    fn parses_builtin_manifest() {
        let parsed = ToolManifest::from_json(
            r#"{
                "name": "echo",
                "description": "Echoes its arguments",
                "input_schema": {"type": "object"},
                "entry": {"kind": "builtin", "builtin": "echo"}
            }"#,
        )
        .expect("manifest should parse");

        assert_eq!(
            parsed.entry,
            ToolEntry::Builtin {
                builtin: "echo".to_owned()
            }
        );
        assert!(!parsed.requires_external_credential);
    }

    #[test]
    fn manifest_without_input_schema_is_rejected() {
        let result = ToolManifest::from_json(
            r#"{"name": "echo", "entry": {"kind": "builtin", "builtin": "echo"}}"#,
        );
        assert!(result.is_err());
    }

    #[rstest]
    #[case(json!({"type": "object", "properties": {}}), true)]
    #[case(json!({"properties": {}}), true)]
    #[case(json!({"type": "array"}), false)]
    #[case(json!("object"), false)]
    fn input_schema_must_describe_an_object(#[case] schema: Value, #[case] valid: bool) {
        let candidate = manifest(
            ToolEntry::Builtin {
                builtin: "word_count".to_owned(),
            },
            schema,
        );
        assert_eq!(candidate.validate().is_ok(), valid);
    }

    #[test]
    fn empty_command_is_rejected() {
        let candidate = manifest(
            ToolEntry::Command {
                command: "  ".to_owned(),
                args: Vec::new(),
            },
            json!({"type": "object"}),
        );
        assert_eq!(
            candidate.validate(),
            Err(ToolRegistryDomainError::EmptyCommand("Word Count".to_owned()))
        );
    }

    #[test]
    fn validation_derives_identifier() {
        let candidate = manifest(
            ToolEntry::Builtin {
                builtin: "word_count".to_owned(),
            },
            json!({"type": "object"}),
        );
        let id = candidate.validate().expect("manifest should be valid");
        assert_eq!(id.as_str(), "word_count");
        assert_eq!(candidate.to_descriptor(id).description(), "Counts words");
    }
}
