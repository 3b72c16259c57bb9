//! Lifecycle management for auxiliary out-of-process servers.
//!
//! Servers are opaque child processes declared in an `mcpServers`
//! configuration document. The manager starts, tracks and stops them with at
//! most one live process per server name.
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Orchestration services in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;
