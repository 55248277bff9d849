//! Trait definitions for external collaborators
//!
//! Crawlers and extractors vary per source site. Each one sits behind this
//! single narrow interface so the ingestion core never depends on any site's
//! structure.

use serde_json::Value;

/// A producer of already-fetched candidate records
///
/// Implemented by crawler adapters outside the engine, and by
/// `carton-ingest` for crawled page captures.
pub trait CandidateSource {
    /// Error type for producing candidates
    type Error;

    /// Short identifier of the producer, used in logs
    fn name(&self) -> &str;

    /// Produce raw candidate records in the input record format
    fn candidates(&self) -> Result<Vec<Value>, Self::Error>;
}
