//! Tool discovery and local execution.
//!
//! Tools are described by JSON manifests in a tools directory. Discovery
//! turns each valid manifest into a catalog entry pairing a descriptor with a
//! factory; the execution engine instantiates a fresh tool per call. The
//! module follows hexagonal architecture:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Orchestration services in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;
