//! Carton Storage Layer
//!
//! In-memory decision graph sharded by jurisdiction, with citation
//! provenance and JSON snapshot persistence.
//!
//! # Architecture
//!
//! - One [`Shard`] per jurisdiction holding every version of every node
//! - [`DecisionGraph`] answers cross-shard queries and consistency checks
//! - [`ProvenanceStore`] deduplicates citations and tracks source drift
//! - [`Snapshot`] is the logical on-disk record format
//!
//! # Examples
//!
//! ```
//! use carton_domain::{DecisionNode, NodeKey, Relation};
//! use carton_store::DecisionGraph;
//!
//! let mut graph = DecisionGraph::new();
//! let mut dec = DecisionNode::new(NodeKey::parse("TX_DEC-01").unwrap());
//! dec.cross_references.leads_to.insert(NodeKey::parse("TX_ACT-01").unwrap());
//! graph.add_node(dec).unwrap();
//!
//! let reached: Vec<_> = graph
//!     .traverse(&NodeKey::parse("TX_DEC-01").unwrap(), Relation::LeadsTo, 3)
//!     .collect();
//! assert_eq!(reached.len(), 1);
//! ```

#![warn(missing_docs)]

use carton_domain::{Jurisdiction, NodeKey};
use thiserror::Error;

pub mod graph;
pub mod provenance;
pub mod shard;
pub mod snapshot;

pub use graph::{DecisionGraph, InvariantViolation, Traverse};
pub use provenance::{content_hash, CitationClass, HeldConflict, ProvenanceRecord, ProvenanceStore};
pub use shard::{NodeHistory, Shard};
pub use snapshot::Snapshot;

/// Errors that can occur during storage operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// Key already exists and no supersession pointer was supplied
    #[error("Duplicate node: {0}")]
    Duplicate(NodeKey),

    /// Supersession pointer does not name the live version
    #[error("Stale supersession for {key}: live version is {live}, record supersedes {supplied}")]
    StaleSupersession {
        /// Node key
        key: NodeKey,
        /// Live version in the store
        live: u32,
        /// Version the record claimed to supersede
        supplied: u32,
    },

    /// Node not found
    #[error("Node not found: {0}")]
    NotFound(NodeKey),

    /// Node routed to another jurisdiction's shard
    #[error("Node {key} does not belong to shard {shard}")]
    WrongJurisdiction {
        /// Node key
        key: NodeKey,
        /// Shard jurisdiction
        shard: Jurisdiction,
    },

    /// Snapshot written by an incompatible schema
    #[error("Unsupported snapshot schema: {0}")]
    UnsupportedSchema(String),

    /// Filesystem error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Snapshot encoding error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
