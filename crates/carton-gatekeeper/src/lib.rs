//! Carton Gatekeeper
//!
//! Validates candidate node records before they reach the graph.
//!
//! The Gatekeeper provides:
//! - Structural checks on the input record shape
//! - Non-fabrication checks on citations (provisional and untrusted sources)
//! - Referential checks against the authority catalog
//!
//! Validation is pure and never panics on malformed input. Problems are
//! returned as [`Issue`](carton_domain::Issue) lists; callers decide which
//! severity blocks a record.
//!
//! # Examples
//!
//! ```
//! use carton_domain::AuthorityCatalog;
//! use carton_gatekeeper::{SchemaValidator, ValidationConfig};
//! use serde_json::json;
//!
//! let validator = SchemaValidator::new(ValidationConfig::default()).unwrap();
//! let record = json!({
//!     "jurisdiction": "AK",
//!     "family": "INP",
//!     "sequence": 1,
//!     "citations": [{ "text": "Alaska Stat. § 47.17.020", "authority_type": "statute" }],
//!     "cross_references": {}
//! });
//!
//! let result = validator.validate(&record, &AuthorityCatalog::new("empty"));
//! assert!(result.ok);
//! assert_eq!(result.errors[0].code.as_str(), "PROVISIONAL_CITATION");
//! ```

#![warn(missing_docs)]

mod config;
mod error;
mod validator;

pub use config::ValidationConfig;
pub use error::GatekeeperError;
pub use validator::{url_host, Checked, SchemaValidator, ValidationResult};
