//! Built-in toolbox of in-process tool implementations.
//!
//! Manifests with a `builtin` entry point resolve against this toolbox. Hosts
//! embedding the bridge may register further implementations before
//! discovery runs.

use crate::tool_registry::{
    domain::ToolArguments,
    ports::{LocalTool, ToolFactory, ToolFault, ToolResult},
};
use async_trait::async_trait;
use serde_json::json;
use std::collections::BTreeMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// Registry of in-process tool factories keyed by built-in name.
#[derive(Debug, Clone, Default)]
pub struct BuiltinToolbox {
    factories: BTreeMap<String, Arc<dyn ToolFactory>>,
}

impl BuiltinToolbox {
    /// Creates a toolbox without any implementations.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Creates a toolbox holding the bundled implementations:
    /// `echo`, `word_count`, and `uppercase`.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::empty()
            .with_factory("echo", Arc::new(DefaultFactory::<EchoTool>::new()))
            .with_factory("word_count", Arc::new(DefaultFactory::<WordCountTool>::new()))
            .with_factory("uppercase", Arc::new(DefaultFactory::<UppercaseTool>::new()))
    }

    /// Registers a factory, replacing any previous one with the same name.
    #[must_use]
    pub fn with_factory(mut self, name: impl Into<String>, factory: Arc<dyn ToolFactory>) -> Self {
        self.factories.insert(name.into(), factory);
        self
    }

    /// Returns the factory registered under `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<dyn ToolFactory>> {
        self.factories.get(name).cloned()
    }

    /// Returns the registered built-in names in ascending order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }
}

/// Factory producing a fresh `T::default()` for every call.
pub struct DefaultFactory<T> {
    marker: PhantomData<fn() -> T>,
}

impl<T> DefaultFactory<T> {
    /// Creates the factory.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            marker: PhantomData,
        }
    }
}

impl<T> Default for DefaultFactory<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for DefaultFactory<T> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("DefaultFactory")
            .field("tool", &std::any::type_name::<T>())
            .finish()
    }
}

impl<T> ToolFactory for DefaultFactory<T>
where
    T: LocalTool + Default + 'static,
{
    fn instantiate(&self) -> Box<dyn LocalTool> {
        Box::new(T::default())
    }
}

/// Returns its arguments unchanged.
#[derive(Debug, Default)]
pub struct EchoTool;

#[async_trait]
impl LocalTool for EchoTool {
    async fn execute(&mut self, arguments: ToolArguments) -> ToolResult {
        Ok(arguments.to_value())
    }
}

/// Counts words and characters in the `text` argument.
#[derive(Debug, Default)]
pub struct WordCountTool;

#[async_trait]
impl LocalTool for WordCountTool {
    async fn execute(&mut self, arguments: ToolArguments) -> ToolResult {
        let text = required_text(&arguments)?;
        Ok(json!({
            "words": text.split_whitespace().count(),
            "characters": text.chars().count(),
        }))
    }
}

/// Uppercases the `text` argument.
#[derive(Debug, Default)]
pub struct UppercaseTool;

#[async_trait]
impl LocalTool for UppercaseTool {
    async fn execute(&mut self, arguments: ToolArguments) -> ToolResult {
        let text = required_text(&arguments)?;
        Ok(json!({ "text": text.to_uppercase() }))
    }
}

fn required_text(arguments: &ToolArguments) -> Result<&str, ToolFault> {
    arguments
        .get_str("text")
        .ok_or_else(|| ToolFault::invalid_arguments("missing string argument 'text'"))
}
