//! JSON snapshot of the whole graph and its provenance

use crate::graph::DecisionGraph;
use crate::provenance::ProvenanceStore;
use crate::StoreError;
use carton_domain::SCHEMA_VERSION;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::info;

/// Every node version and every provenance record, as written to disk
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Node schema the snapshot was written with
    pub schema_version: String,
    /// Graph including superseded versions
    pub graph: DecisionGraph,
    /// Citation provenance
    pub provenance: ProvenanceStore,
}

impl Snapshot {
    /// Bundle a graph and provenance store at the current schema version
    pub fn new(graph: DecisionGraph, provenance: ProvenanceStore) -> Self {
        Self {
            schema_version: SCHEMA_VERSION.to_string(),
            graph,
            provenance,
        }
    }

    /// Read a snapshot, or start empty when the file does not exist
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let path = path.as_ref();
        if !path.exists() {
            info!("No snapshot at {}, starting empty", path.display());
            return Ok(Self::new(DecisionGraph::new(), ProvenanceStore::new()));
        }

        let content = fs::read_to_string(path)?;
        let snapshot: Snapshot = serde_json::from_str(&content)?;
        if major(&snapshot.schema_version) != major(SCHEMA_VERSION) {
            return Err(StoreError::UnsupportedSchema(snapshot.schema_version));
        }
        info!("Loaded {} nodes from {}", snapshot.graph.len(), path.display());
        Ok(snapshot)
    }

    /// Write the snapshot, replacing the file atomically
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), StoreError> {
        let path = path.as_ref();
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_string_pretty(self)?)?;
        fs::rename(&tmp, path)?;
        info!("Saved {} nodes to {}", self.graph.len(), path.display());
        Ok(())
    }
}

fn major(version: &str) -> &str {
    version.split('.').next().unwrap_or(version)
}
