//! Stable issue codes shared by every report

use serde::{Deserialize, Serialize};
use std::fmt;

/// How serious an issue is
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Record may proceed but needs follow-up
    Warning,
    /// Record must not be committed
    Error,
}

/// Machine-readable issue taxonomy used in all reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IssueCode {
    /// Structurally invalid input
    MalformedInput,
    /// Citation source outside the authoritative domain set
    UntrustedSource,
    /// Citation without a source URL
    ProvisionalCitation,
    /// Node key already present without a supersession pointer
    DuplicateNode,
    /// No FEDERAL node for the state node's slot
    MissingBaseline,
    /// Edge target exists nowhere
    DanglingReference,
    /// State layer weakens or omits a floor protection
    FloorViolation,
    /// Same citation text seen with a different source URL
    CitationConflict,
    /// Catalog id not present in the catalog
    UnknownCatalogEntry,
    /// Catalog id declared under a layer other than its own
    LayerMismatch,
    /// Source content changed since it was last captured
    SourceDrift,
}

impl IssueCode {
    /// Get the code as it appears in reports
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueCode::MalformedInput => "MALFORMED_INPUT",
            IssueCode::UntrustedSource => "UNTRUSTED_SOURCE",
            IssueCode::ProvisionalCitation => "PROVISIONAL_CITATION",
            IssueCode::DuplicateNode => "DUPLICATE_NODE",
            IssueCode::MissingBaseline => "MISSING_BASELINE",
            IssueCode::DanglingReference => "DANGLING_REFERENCE",
            IssueCode::FloorViolation => "FLOOR_VIOLATION",
            IssueCode::CitationConflict => "CITATION_CONFLICT",
            IssueCode::UnknownCatalogEntry => "UNKNOWN_CATALOG_ENTRY",
            IssueCode::LayerMismatch => "LAYER_MISMATCH",
            IssueCode::SourceDrift => "SOURCE_DRIFT",
        }
    }

    /// Codes that block merging even though they never abort a batch
    pub fn blocks_merge(&self) -> bool {
        matches!(self, IssueCode::CitationConflict | IssueCode::FloorViolation)
    }
}

impl fmt::Display for IssueCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single reported problem with a record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    /// Issue code
    pub code: IssueCode,
    /// Severity
    pub severity: Severity,
    /// JSON path of the offending field (`$` for the whole record)
    pub path: String,
    /// Human-readable description
    pub message: String,
}

impl Issue {
    /// Create an error-severity issue
    pub fn error(code: IssueCode, path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code,
            severity: Severity::Error,
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a warning-severity issue
    pub fn warning(code: IssueCode, path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code,
            severity: Severity::Warning,
            path: path.into(),
            message: message.into(),
        }
    }
}
