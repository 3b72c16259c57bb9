//! Toolbridge: a capability bridge for conversational agents.
//!
//! This crate discovers pluggable local tools, runs them in-process on
//! request, supervises auxiliary server processes declared in an
//! `mcpServers` configuration file, and keeps per-session conversational
//! memory in embedded database files.
//!
//! # Architecture
//!
//! Toolbridge follows hexagonal architecture principles:
//!
//! - **Domain**: Pure business logic with no infrastructure dependencies
//! - **Ports**: Abstract trait interfaces for external interactions
//! - **Adapters**: Concrete implementations of ports (processes, `SQLite`, etc.)
//!
//! # Modules
//!
//! - [`tool_registry`]: Tool discovery and local execution
//! - [`mcp_server`]: Server configuration and process lifecycle
//! - [`session_memory`]: Per-session memory stores and archives
//! - [`bridge`]: Facade combining tools and servers
//! - [`config`]: Runtime settings
//! - [`telemetry`]: Tracing subscriber installation

pub mod bridge;
pub mod config;
pub mod mcp_server;
pub mod session_memory;
pub mod telemetry;
pub mod tool_registry;
