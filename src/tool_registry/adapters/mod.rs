//! Adapter implementations of the tool port.

mod builtin;
mod command;

pub use builtin::{BuiltinToolbox, DefaultFactory, EchoTool, UppercaseTool, WordCountTool};
pub use command::{CommandToolFactory, INVALID_ARGUMENTS_EXIT_CODE};
