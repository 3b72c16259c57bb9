//! External-command tool adapter.
//!
//! A command tool is spawned once per call. The named arguments are written
//! to its stdin as a JSON object; stdout carries the result. Exit code `2`
//! reports invalid arguments, any other non-zero exit code a failure.

use crate::tool_registry::{
    domain::ToolArguments,
    ports::{LocalTool, ToolFactory, ToolFault, ToolResult},
};
use async_trait::async_trait;
use serde_json::Value;
use std::io::{self, ErrorKind};
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::{ChildStdin, Command};
use tracing::debug;

/// Exit code a command tool uses to reject its arguments.
pub const INVALID_ARGUMENTS_EXIT_CODE: i32 = 2;

/// Launch specification for a command-backed tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandToolFactory {
    command: String,
    args: Vec<String>,
    timeout: Duration,
}

impl CommandToolFactory {
    /// Creates a factory for `command` with fixed `args`, bounded by `timeout`.
    #[must_use]
    pub const fn new(command: String, args: Vec<String>, timeout: Duration) -> Self {
        Self {
            command,
            args,
            timeout,
        }
    }

    /// Returns the executable.
    #[must_use]
    pub fn command(&self) -> &str {
        &self.command
    }

    /// Returns the fixed arguments.
    #[must_use]
    pub fn args(&self) -> &[String] {
        &self.args
    }
}

impl ToolFactory for CommandToolFactory {
    fn instantiate(&self) -> Box<dyn LocalTool> {
        Box::new(CommandTool {
            launch: self.clone(),
        })
    }
}

/// A single execution of a command-backed tool.
#[derive(Debug)]
struct CommandTool {
    launch: CommandToolFactory,
}

#[async_trait]
impl LocalTool for CommandTool {
    async fn execute(&mut self, arguments: ToolArguments) -> ToolResult {
        let payload = serde_json::to_vec(&arguments.to_value())
            .map_err(|err| ToolFault::failed(format!("failed to encode arguments: {err}")))?;

        let mut child = Command::new(&self.launch.command)
            .args(&self.launch.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|err| {
                ToolFault::failed(format!("failed to spawn '{}': {err}", self.launch.command))
            })?;

        let stdin = child.stdin.take();
        let run = async move {
            tokio::join!(feed_arguments(stdin, &payload), child.wait_with_output())
        };
        let (fed, collected) = tokio::time::timeout(self.launch.timeout, run)
            .await
            .map_err(|_| {
                ToolFault::failed(format!(
                    "'{}' timed out after {}s",
                    self.launch.command,
                    self.launch.timeout.as_secs_f32()
                ))
            })?;

        match fed {
            Ok(()) => {}
            Err(err) if err.kind() == ErrorKind::BrokenPipe => {
                debug!(command = %self.launch.command, "command closed stdin before reading arguments");
            }
            Err(err) => {
                return Err(ToolFault::failed(format!("failed to write arguments: {err}")));
            }
        }
        let output =
            collected.map_err(|err| ToolFault::failed(format!("failed to collect output: {err}")))?;

        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_owned();
        match output.status.code() {
            Some(0) => Ok(parse_stdout(&output.stdout)),
            Some(INVALID_ARGUMENTS_EXIT_CODE) => Err(ToolFault::invalid_arguments(
                non_empty_or(stderr, "command rejected its arguments"),
            )),
            Some(code) => Err(ToolFault::failed(non_empty_or(
                stderr,
                &format!("command exited with status {code}"),
            ))),
            None => Err(ToolFault::failed("command terminated by a signal")),
        }
    }
}

/// Writes the encoded arguments and closes stdin so the command sees EOF.
async fn feed_arguments(stdin: Option<ChildStdin>, payload: &[u8]) -> io::Result<()> {
    let Some(mut stdin) = stdin else {
        return Ok(());
    };
    stdin.write_all(payload).await?;
    stdin.shutdown().await
}

fn parse_stdout(stdout: &[u8]) -> Value {
    let text = String::from_utf8_lossy(stdout);
    let trimmed = text.trim();
    serde_json::from_str(trimmed).unwrap_or_else(|_| Value::String(trimmed.to_owned()))
}

fn non_empty_or(text: String, fallback: &str) -> String {
    if text.is_empty() {
        fallback.to_owned()
    } else {
        text
    }
}
