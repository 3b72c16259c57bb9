//! Manifest-driven discovery of local tools.
//!
//! Discovery scans one directory for `*.json` manifests, validates each one
//! and resolves its entry point to a factory. A faulty unit is skipped and
//! reported; it never prevents the remaining units from loading. The scan
//! never writes to the directory.

use super::catalog::{CatalogEntry, CatalogSnapshot};
use crate::tool_registry::{
    adapters::{BuiltinToolbox, CommandToolFactory},
    domain::{ToolEntry, ToolId, ToolManifest, ToolRegistryDomainError},
    ports::ToolFactory,
};
use camino::{Utf8Path, Utf8PathBuf};
use cap_std::ambient_authority;
use cap_std::fs_utf8::Dir;
use std::collections::BTreeMap;
use std::io;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

/// File extension identifying candidate units.
const MANIFEST_EXTENSION: &str = "json";

/// Why a candidate unit was left out of the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The file could not be read.
    Unreadable(String),
    /// The file is not a well-formed manifest.
    Malformed(String),
    /// The manifest violates the tool contract.
    Invalid(ToolRegistryDomainError),
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unreadable(reason) => write!(formatter, "unreadable: {reason}"),
            Self::Malformed(reason) => write!(formatter, "malformed manifest: {reason}"),
            Self::Invalid(err) => write!(formatter, "invalid manifest: {err}"),
        }
    }
}

/// A unit that discovery skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedUnit {
    /// File name inside the tools directory.
    pub file_name: String,
    /// Why the unit was skipped.
    pub reason: SkipReason,
}

/// A unit whose identifier was claimed again by a later file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplacedUnit {
    /// The contested identifier.
    pub id: ToolId,
    /// File that first declared the identifier.
    pub previous_file: String,
    /// File whose declaration won.
    pub replacing_file: String,
}

/// Outcome of a discovery scan.
#[derive(Debug, Clone, Default)]
pub struct DiscoveryReport {
    /// Catalog built from the valid units.
    pub snapshot: CatalogSnapshot,
    /// Units that were skipped.
    pub skipped: Vec<SkippedUnit>,
    /// Identifier collisions resolved in favour of the later file.
    pub replaced: Vec<ReplacedUnit>,
}

/// Errors that abort a discovery scan as a whole.
#[derive(Debug, Clone, Error)]
pub enum DiscoveryError {
    /// The tools directory exists but could not be listed.
    #[error("failed to scan tools directory {path}: {source}")]
    Io {
        /// Directory being scanned.
        path: Utf8PathBuf,
        /// Underlying I/O failure.
        source: Arc<io::Error>,
    },
}

impl DiscoveryError {
    fn io(path: &Utf8Path, source: io::Error) -> Self {
        Self::Io {
            path: path.to_owned(),
            source: Arc::new(source),
        }
    }
}

/// Scans a tools directory and builds catalog snapshots.
#[derive(Debug, Clone)]
pub struct ToolDiscovery {
    toolbox: BuiltinToolbox,
    command_timeout: Duration,
}

impl ToolDiscovery {
    /// Creates a discovery engine resolving built-ins against `toolbox`.
    #[must_use]
    pub const fn new(toolbox: BuiltinToolbox, command_timeout: Duration) -> Self {
        Self {
            toolbox,
            command_timeout,
        }
    }

    /// Scans `directory` and returns the resulting report.
    ///
    /// A missing directory yields an empty report.
    ///
    /// # Errors
    ///
    /// Returns [`DiscoveryError::Io`] when the directory exists but cannot be
    /// opened or listed.
    pub fn discover(&self, directory: &Utf8Path) -> Result<DiscoveryReport, DiscoveryError> {
        let dir = match Dir::open_ambient_dir(directory, ambient_authority()) {
            Ok(dir) => dir,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                warn!(path = %directory, "tools directory does not exist; catalog is empty");
                return Ok(DiscoveryReport::default());
            }
            Err(err) => return Err(DiscoveryError::io(directory, err)),
        };

        let mut report = DiscoveryReport::default();
        let mut origins: BTreeMap<ToolId, String> = BTreeMap::new();

        for file_name in candidate_units(&dir, directory)? {
            match self.load_unit(&dir, &file_name) {
                Ok(entry) => {
                    let id = entry.descriptor().id().clone();
                    report.snapshot.insert(entry);
                    if let Some(previous_file) = origins.insert(id.clone(), file_name.clone()) {
                        warn!(
                            tool_id = %id,
                            previous = %previous_file,
                            replacement = %file_name,
                            "duplicate tool identifier; later unit replaces earlier one"
                        );
                        report.replaced.push(ReplacedUnit {
                            id,
                            previous_file,
                            replacing_file: file_name,
                        });
                    }
                }
                Err(reason) => {
                    warn!(unit = %file_name, %reason, "skipping tool unit");
                    report.skipped.push(SkippedUnit { file_name, reason });
                }
            }
        }

        info!(
            path = %directory,
            tools = report.snapshot.len(),
            skipped = report.skipped.len(),
            "tool discovery finished"
        );
        Ok(report)
    }

    /// Validates `manifest` and checks that its entry point resolves,
    /// returning the identifier it would be catalogued under.
    ///
    /// # Errors
    ///
    /// Returns [`ToolRegistryDomainError`] when the manifest violates the tool
    /// contract or names an unknown built-in.
    pub fn check(&self, manifest: &ToolManifest) -> Result<ToolId, ToolRegistryDomainError> {
        let id = manifest.validate()?;
        self.resolve_factory(manifest)?;
        Ok(id)
    }

    fn load_unit(&self, dir: &Dir, file_name: &str) -> Result<CatalogEntry, SkipReason> {
        let text = dir
            .read_to_string(file_name)
            .map_err(|err| SkipReason::Unreadable(err.to_string()))?;
        let manifest =
            ToolManifest::from_json(&text).map_err(|err| SkipReason::Malformed(err.0))?;
        let id = manifest.validate().map_err(SkipReason::Invalid)?;
        let factory = self
            .resolve_factory(&manifest)
            .map_err(SkipReason::Invalid)?;
        debug!(unit = %file_name, tool_id = %id, "loaded tool unit");
        Ok(CatalogEntry::new(manifest.to_descriptor(id), factory))
    }

    fn resolve_factory(
        &self,
        manifest: &ToolManifest,
    ) -> Result<Arc<dyn ToolFactory>, ToolRegistryDomainError> {
        match &manifest.entry {
            ToolEntry::Builtin { builtin } => {
                self.toolbox
                    .get(builtin)
                    .ok_or_else(|| ToolRegistryDomainError::UnknownBuiltin {
                        tool: manifest.name.clone(),
                        builtin: builtin.clone(),
                    })
            }
            ToolEntry::Command { command, args } => Ok(Arc::new(CommandToolFactory::new(
                command.clone(),
                args.clone(),
                self.command_timeout,
            ))),
        }
    }
}

/// Lists regular `*.json` files directly inside `dir`, sorted by name.
fn candidate_units(dir: &Dir, path: &Utf8Path) -> Result<Vec<String>, DiscoveryError> {
    let mut names = Vec::new();
    for listed in dir.entries().map_err(|err| DiscoveryError::io(path, err))? {
        let entry = listed.map_err(|err| DiscoveryError::io(path, err))?;
        let Ok(file_name) = entry.file_name() else {
            continue;
        };
        let is_file = entry.file_type().is_ok_and(|kind| kind.is_file());
        let is_manifest = Utf8Path::new(&file_name).extension() == Some(MANIFEST_EXTENSION);
        if is_file && is_manifest {
            names.push(file_name);
        }
    }
    names.sort();
    Ok(names)
}
