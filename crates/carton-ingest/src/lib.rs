//! Carton Ingest
//!
//! Validated, idempotent ingestion of crawled legal records into the
//! decision graph.
//!
//! # Overview
//!
//! Crawlers hand over raw candidate records. Each batch is normalized,
//! grouped by jurisdiction, and staged one jurisdiction at a time into a
//! private copy of that jurisdiction's shard. Records are validated, checked
//! against citation provenance and the FEDERAL floor, linked to the
//! baseline, and committed together by an atomic swap.
//!
//! # Architecture
//!
//! ```text
//! CandidateSource → normalize → SchemaValidator → provenance → floor
//!     → Shard (staged) → LeafLinker → commit
//! ```
//!
//! # Key Features
//!
//! - **Idempotent**: re-ingesting the same candidates changes nothing and
//!   reports the same classifications
//! - **Per-record isolation**: one bad record never aborts the batch
//! - **Jurisdiction parallelism**: FEDERAL commits first, states run
//!   concurrently behind per-shard writer locks
//! - **Crawled pages**: [`CrawledPageSource`] turns page captures into
//!   candidates carrying only verbatim citations
//! - **Leaf attribution**: [`Attributor`] ranks crawled statutes, rules and
//!   cases per node by family keywords and attaches the best of each kind
//!
//! # Example Usage
//!
//! ```no_run
//! use carton_domain::AuthorityCatalog;
//! use carton_gatekeeper::{SchemaValidator, ValidationConfig};
//! use carton_ingest::{Engine, IngestConfig};
//! use serde_json::json;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let validator = SchemaValidator::new(ValidationConfig::default())?;
//! let engine = Engine::new(validator, AuthorityCatalog::new("test"), IngestConfig::default())?;
//!
//! let report = engine
//!     .ingest(vec![json!({
//!         "jurisdiction": "FEDERAL",
//!         "family": "INP",
//!         "sequence": 1,
//!         "citations": [{
//!             "text": "42 U.S.C. § 5106a",
//!             "source_url": "https://uscode.house.gov/view.xhtml?req=5106a",
//!             "authority_type": "statute"
//!         }],
//!         "cross_references": {}
//!     })])
//!     .await?;
//!
//! println!("{}", report.summary());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod attribute;
mod config;
mod engine;
mod error;
mod extract;
mod normalize;
mod types;


pub use attribute::{Attributor, Leaf, LeafKind, Relevance, ScoredLeaf};
pub use config::{AttributionConfig, IngestConfig};
pub use engine::{CancelToken, Engine};
pub use error::IngestError;
pub use extract::{CitationExtractor, CrawledPageSource, ExtractedCitation, PageCapture};
pub use normalize::{authority_alias, layer_alias, normalize};
pub use types::{DriftNotice, IngestReport, RecordOutcome, RecordStatus};
