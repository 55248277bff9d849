//! Versioned registries of constraints and requirements per authority layer
//!
//! A catalog is loaded once and handed explicitly to the validator and the
//! floor check, so tests can substitute fixture catalogs.

use crate::layer::LayerName;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Whether an entry restricts state action or obliges it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    /// Limits on what the state may do (e.g. Fourth Amendment seizure)
    Constraint,
    /// Duties the state must perform (e.g. CAPTA reporting)
    Requirement,
}

/// One named constraint or requirement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// Catalog id, e.g. `CONST_4A_SEIZURE`
    pub id: String,

    /// Layer that owns this entry
    pub layer: LayerName,

    /// Topic tag shared across layers, e.g. `search_and_seizure`
    pub topic: String,

    /// Protection level on an ordinal scale; higher protects more
    pub level: u8,

    /// Constraint or requirement
    pub kind: EntryKind,

    /// Optional human description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl CatalogEntry {
    /// Create a new entry
    pub fn new(id: impl Into<String>, layer: LayerName, topic: impl Into<String>, level: u8, kind: EntryKind) -> Self {
        Self {
            id: id.into(),
            layer,
            topic: topic.into(),
            level,
            kind,
            description: None,
        }
    }
}

/// Serialized shape of a catalog file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogFile {
    /// Catalog version string
    pub version: String,
    /// All entries
    #[serde(default)]
    pub entries: Vec<CatalogEntry>,
}

/// Registry of every constraint and requirement known to the engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "CatalogFile", into = "CatalogFile")]
pub struct AuthorityCatalog {
    version: String,
    entries: BTreeMap<String, CatalogEntry>,
}

impl AuthorityCatalog {
    /// Create an empty catalog
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            entries: BTreeMap::new(),
        }
    }

    /// Build a catalog from entries, rejecting duplicate ids
    pub fn from_entries(version: impl Into<String>, entries: Vec<CatalogEntry>) -> Result<Self, String> {
        let mut catalog = Self::new(version);
        for entry in entries {
            catalog.insert(entry)?;
        }
        Ok(catalog)
    }

    /// Register an entry
    pub fn insert(&mut self, entry: CatalogEntry) -> Result<(), String> {
        if self.entries.contains_key(&entry.id) {
            return Err(format!("Duplicate catalog entry: {}", entry.id));
        }
        self.entries.insert(entry.id.clone(), entry);
        Ok(())
    }

    /// Builder form of [`insert`](Self::insert) for fixtures
    pub fn with(mut self, entry: CatalogEntry) -> Result<Self, String> {
        self.insert(entry)?;
        Ok(self)
    }

    /// Catalog version
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Look up an entry by id
    pub fn get(&self, id: &str) -> Option<&CatalogEntry> {
        self.entries.get(id)
    }

    /// All entries in id order
    pub fn entries(&self) -> impl Iterator<Item = &CatalogEntry> {
        self.entries.values()
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the catalog is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl TryFrom<CatalogFile> for AuthorityCatalog {
    type Error = String;

    fn try_from(file: CatalogFile) -> Result<Self, Self::Error> {
        Self::from_entries(file.version, file.entries)
    }
}

impl From<AuthorityCatalog> for CatalogFile {
    fn from(catalog: AuthorityCatalog) -> Self {
        CatalogFile {
            version: catalog.version,
            entries: catalog.entries.into_values().collect(),
        }
    }
}
