//! Carton Domain Layer
//!
//! Core model of the legal decision graph. Everything here is pure: no I/O,
//! no global state. Infrastructure lives in the other crates.
//!
//! ## Key Concepts
//!
//! - **DecisionNode**: one `(jurisdiction, family, sequence)` point in the process matrix
//! - **Layers**: the constitutional → federal → state → administrative → case-law stack
//! - **Citation**: a verbatim legal reference with its source URL
//! - **Catalog**: versioned registry of named constraints and requirements
//! - **Floor**: lower layers may add protections but never subtract them
//!
//! ## Architecture
//!
//! - Serializable value types with stable field names
//! - Catalogs passed explicitly, never global
//! - Trait definitions for pluggable candidate producers

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod catalog;
pub mod citation;
pub mod floor;
pub mod issue;
pub mod key;
pub mod layer;
pub mod node;
pub mod traits;

/// Version of the published node schema
pub const SCHEMA_VERSION: &str = "1.0.0";

// Re-exports for convenience
pub use catalog::{AuthorityCatalog, CatalogEntry, EntryKind};
pub use citation::{AuthorityType, Citation, VerificationStatus};
pub use floor::{resolve_floor, resolve_floor_against, FloorCheckResult, FloorViolation};
pub use issue::{Issue, IssueCode, Severity};
pub use key::{Jurisdiction, NodeFamily, NodeKey, Slot};
pub use layer::{LayerContent, LayerName, NodeLayers};
pub use node::{CrossReferences, DecisionNode, EdgeTombstone, Relation};
pub use traits::CandidateSource;
