//! In-memory descriptor store holding the current tool catalog.

use crate::tool_registry::{
    domain::{ToolDescriptor, ToolId},
    ports::ToolFactory,
};
use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock};

/// Descriptor paired with the factory that instantiates the tool.
#[derive(Debug, Clone)]
pub struct CatalogEntry {
    descriptor: ToolDescriptor,
    factory: Arc<dyn ToolFactory>,
}

impl CatalogEntry {
    /// Creates a catalog entry.
    #[must_use]
    pub fn new(descriptor: ToolDescriptor, factory: Arc<dyn ToolFactory>) -> Self {
        Self {
            descriptor,
            factory,
        }
    }

    /// Returns the descriptor.
    #[must_use]
    pub const fn descriptor(&self) -> &ToolDescriptor {
        &self.descriptor
    }

    /// Returns the tool factory.
    #[must_use]
    pub const fn factory(&self) -> &Arc<dyn ToolFactory> {
        &self.factory
    }
}

/// Immutable set of catalog entries keyed by tool identifier.
#[derive(Debug, Clone, Default)]
pub struct CatalogSnapshot {
    entries: BTreeMap<ToolId, CatalogEntry>,
}

impl CatalogSnapshot {
    /// Creates an empty snapshot.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts an entry, returning the entry it replaced, if any.
    pub fn insert(&mut self, entry: CatalogEntry) -> Option<CatalogEntry> {
        self.entries.insert(entry.descriptor().id().clone(), entry)
    }

    /// Looks up an entry by identifier.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&CatalogEntry> {
        self.entries.get(id)
    }

    /// Returns whether the snapshot holds `id`.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    /// Iterates over descriptors in identifier order.
    pub fn descriptors(&self) -> impl Iterator<Item = &ToolDescriptor> {
        self.entries.values().map(CatalogEntry::descriptor)
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns whether the snapshot is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Thread-safe holder of the current catalog snapshot.
///
/// Readers receive an `Arc` to the snapshot current at the time of the call
/// and keep it even while a re-scan swaps in a replacement.
#[derive(Debug, Default)]
pub struct DescriptorStore {
    current: RwLock<Arc<CatalogSnapshot>>,
}

impl DescriptorStore {
    /// Creates a store holding an empty snapshot.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the current snapshot.
    #[must_use]
    pub fn snapshot(&self) -> Arc<CatalogSnapshot> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Replaces the current snapshot wholesale and returns the previous one.
    pub fn replace(&self, snapshot: CatalogSnapshot) -> Arc<CatalogSnapshot> {
        let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
        std::mem::replace(&mut *current, Arc::new(snapshot))
    }
}
