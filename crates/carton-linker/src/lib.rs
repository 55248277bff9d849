//! Carton Leaf Linker
//!
//! Resolves each state node's cross-references against the FEDERAL baseline.
//!
//! # Overview
//!
//! Every state node sits on a `(family, sequence)` slot the baseline also
//! defines. The linker:
//! - **Inherits** the baseline slot's `leads_to`/`triggered_by` edges as defaults
//! - **Overrides** a relation wholesale when the state declares its own edges for it
//! - **Tombstones** single inherited edges the state removes explicitly
//! - **Falls back** to the baseline node when a target slot has no state node
//!
//! Inherited defaults never introduce an edge-symmetry violation: when the
//! node on the far end overrides or tombstones the mirror edge, the default is
//! discarded on both ends and recorded in the [`LinkReport`].
//!
//! # Usage
//!
//! ```
//! use carton_domain::{DecisionNode, Jurisdiction, NodeKey};
//! use carton_linker::LeafLinker;
//! use carton_store::Shard;
//!
//! let mut baseline = Shard::new(Jurisdiction::federal());
//! baseline.add_node(DecisionNode::new(NodeKey::parse("FEDERAL_DEC-01").unwrap())).unwrap();
//!
//! let mut tx = Shard::new(Jurisdiction::new("TX").unwrap());
//! tx.add_node(DecisionNode::new(NodeKey::parse("TX_DEC-01").unwrap())).unwrap();
//!
//! let outcome = LeafLinker::new().link_shard(&tx, &baseline);
//! assert_eq!(outcome.report.linked.len(), 1);
//! ```

#![warn(missing_docs)]

mod linker;
mod report;

pub use linker::{LeafLinker, LinkOutcome};
pub use report::{DiscardReason, DiscardedEdge, EdgeRef, LinkReport};
