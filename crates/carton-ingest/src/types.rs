//! Report types for an ingestion batch

use carton_domain::{Issue, IssueCode, Jurisdiction, NodeKey, Severity};
use carton_linker::LinkReport;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// What happened to one candidate record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordStatus {
    /// A new node or node version was committed
    Committed,

    /// Content identical to the live version; nothing written
    Unchanged,

    /// Kept out of the graph
    Rejected,

    /// Kept out of the graph pending review of a citation conflict
    Held,
}

impl RecordStatus {
    /// Status name as serialized
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordStatus::Committed => "committed",
            RecordStatus::Unchanged => "unchanged",
            RecordStatus::Rejected => "rejected",
            RecordStatus::Held => "held",
        }
    }
}

/// Outcome of one candidate record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordOutcome {
    /// Position of the record in the batch
    pub index: usize,

    /// Node key, when the record named one
    pub key: Option<NodeKey>,

    /// Disposition
    pub status: RecordStatus,

    /// Live version after the batch, for committed and unchanged records
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<u32>,

    /// Issues raised for the record
    pub issues: Vec<Issue>,
}

impl RecordOutcome {
    /// Create a rejection
    pub fn rejected(index: usize, key: Option<NodeKey>, issues: Vec<Issue>) -> Self {
        Self {
            index,
            key,
            status: RecordStatus::Rejected,
            version: None,
            issues,
        }
    }

    /// Whether any issue is a warning
    pub fn has_warnings(&self) -> bool {
        self.issues.iter().any(|i| i.severity == Severity::Warning)
    }

    /// Whether an issue with this code was raised
    pub fn has(&self, code: IssueCode) -> bool {
        self.issues.iter().any(|i| i.code == code)
    }
}

/// A source page whose content changed since it was last ingested
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriftNotice {
    /// Page URL
    pub url: String,

    /// Hash recorded by an earlier batch
    pub previous_hash: String,

    /// Hash seen in this batch
    pub current_hash: String,

    /// Node whose record carried the capture
    pub node: NodeKey,
}

/// Result of an ingestion batch
///
/// Every record lands in exactly one of `accepted`, `provisional`,
/// `unchanged`, `rejected` or `conflicts`, except records of a jurisdiction
/// listed in `cancelled`, which appear nowhere.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestReport {
    /// Batch identifier
    pub batch_id: Uuid,

    /// When the batch started
    pub started_at: DateTime<Utc>,

    /// Wall-clock processing time in milliseconds
    pub processing_time_ms: u64,

    /// Committed records with no issues
    pub accepted: Vec<RecordOutcome>,

    /// Records kept out of the graph
    pub rejected: Vec<RecordOutcome>,

    /// Records committed or unchanged with warnings attached
    pub provisional: Vec<RecordOutcome>,

    /// Records held on a citation conflict
    pub conflicts: Vec<RecordOutcome>,

    /// Clean records identical to what the graph already holds
    pub unchanged: Vec<RecordOutcome>,

    /// What linking did across all committed jurisdictions
    pub links: LinkReport,

    /// Source pages whose content changed
    pub drift: Vec<DriftNotice>,

    /// Jurisdictions whose staged changes were dropped by cancellation
    pub cancelled: Vec<Jurisdiction>,
}

impl IngestReport {
    /// Create an empty report for a new batch
    pub fn new() -> Self {
        Self {
            batch_id: Uuid::now_v7(),
            started_at: Utc::now(),
            processing_time_ms: 0,
            accepted: Vec::new(),
            rejected: Vec::new(),
            provisional: Vec::new(),
            conflicts: Vec::new(),
            unchanged: Vec::new(),
            links: LinkReport::new(),
            drift: Vec::new(),
            cancelled: Vec::new(),
        }
    }

    /// File an outcome under its list
    pub fn record(&mut self, outcome: RecordOutcome) {
        match outcome.status {
            RecordStatus::Rejected => self.rejected.push(outcome),
            RecordStatus::Held => self.conflicts.push(outcome),
            _ if outcome.has_warnings() => self.provisional.push(outcome),
            RecordStatus::Committed => self.accepted.push(outcome),
            RecordStatus::Unchanged => self.unchanged.push(outcome),
        }
    }

    /// Fold a per-jurisdiction report into this one
    pub(crate) fn absorb(&mut self, other: IngestReport) {
        self.accepted.extend(other.accepted);
        self.rejected.extend(other.rejected);
        self.provisional.extend(other.provisional);
        self.conflicts.extend(other.conflicts);
        self.unchanged.extend(other.unchanged);
        self.links.merge(other.links);
        self.drift.extend(other.drift);
        self.cancelled.extend(other.cancelled);
    }

    /// Put every list in batch order
    pub(crate) fn sort(&mut self) {
        for list in [
            &mut self.accepted,
            &mut self.rejected,
            &mut self.provisional,
            &mut self.conflicts,
            &mut self.unchanged,
        ] {
            list.sort_by_key(|o| o.index);
        }
        self.cancelled.sort();
    }

    /// Total records accounted for
    pub fn total(&self) -> usize {
        self.accepted.len() + self.rejected.len() + self.provisional.len() + self.conflicts.len() + self.unchanged.len()
    }

    /// Whether any outcome carries a merge-blocking issue
    pub fn blocks_merge(&self) -> bool {
        self.rejected
            .iter()
            .chain(&self.conflicts)
            .flat_map(|o| &o.issues)
            .any(|i| i.code.blocks_merge())
    }

    /// Every outcome, in batch order
    pub fn outcomes(&self) -> Vec<&RecordOutcome> {
        let mut all: Vec<&RecordOutcome> = self
            .accepted
            .iter()
            .chain(&self.rejected)
            .chain(&self.provisional)
            .chain(&self.conflicts)
            .chain(&self.unchanged)
            .collect();
        all.sort_by_key(|o| o.index);
        all
    }

    /// Generate a one-line summary
    pub fn summary(&self) -> String {
        let mut line = format!(
            "{} records: {} accepted, {} provisional, {} unchanged, {} rejected, {} held",
            self.total(),
            self.accepted.len(),
            self.provisional.len(),
            self.unchanged.len(),
            self.rejected.len(),
            self.conflicts.len(),
        );
        if !self.drift.is_empty() {
            line.push_str(&format!("; {} drifted sources", self.drift.len()));
        }
        if !self.cancelled.is_empty() {
            line.push_str(&format!("; cancelled: {}", join(&self.cancelled)));
        }
        line
    }
}

impl Default for IngestReport {
    fn default() -> Self {
        Self::new()
    }
}

fn join(jurisdictions: &[Jurisdiction]) -> String {
    jurisdictions.iter().map(|j| j.as_str()).collect::<Vec<_>>().join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(index: usize, status: RecordStatus, issues: Vec<Issue>) -> RecordOutcome {
        RecordOutcome {
            index,
            key: None,
            status,
            version: None,
            issues,
        }
    }

    #[test]
    fn test_record_partitions() {
        let warning = Issue::warning(IssueCode::ProvisionalCitation, "$.citations[0].source_url", "no url");
        let mut report = IngestReport::new();
        report.record(outcome(0, RecordStatus::Committed, vec![]));
        report.record(outcome(1, RecordStatus::Committed, vec![warning.clone()]));
        report.record(outcome(2, RecordStatus::Unchanged, vec![warning]));
        report.record(outcome(3, RecordStatus::Unchanged, vec![]));
        report.record(outcome(4, RecordStatus::Rejected, vec![]));

        assert_eq!(report.accepted.len(), 1);
        assert_eq!(report.provisional.len(), 2);
        assert_eq!(report.unchanged.len(), 1);
        assert_eq!(report.rejected.len(), 1);
        assert_eq!(report.total(), 5);
        assert!(report.summary().starts_with("5 records: 1 accepted, 2 provisional"));
    }

    #[test]
    fn test_blocks_merge() {
        let mut report = IngestReport::new();
        report.record(outcome(
            0,
            RecordStatus::Rejected,
            vec![Issue::error(IssueCode::UntrustedSource, "$", "blog")],
        ));
        assert!(!report.blocks_merge());

        report.record(outcome(
            1,
            RecordStatus::Held,
            vec![Issue::error(IssueCode::CitationConflict, "$.citations[0]", "url differs")],
        ));
        assert!(report.blocks_merge());
    }

    #[test]
    fn test_outcomes_in_batch_order() {
        let mut report = IngestReport::new();
        report.record(outcome(2, RecordStatus::Rejected, vec![]));
        report.record(outcome(0, RecordStatus::Committed, vec![]));
        report.record(outcome(1, RecordStatus::Unchanged, vec![]));
        let order: Vec<usize> = report.outcomes().iter().map(|o| o.index).collect();
        assert_eq!(order, vec![0, 1, 2]);
    }

    #[test]
    fn test_report_serializes_snake_case() {
        let mut report = IngestReport::new();
        report.record(outcome(0, RecordStatus::Held, vec![]));
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["conflicts"][0]["status"], "held");
        assert!(json["batch_id"].is_string());
    }
}
