//! Link report

use carton_domain::{Issue, IssueCode, NodeKey, Relation};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One directed edge, named by the node that carries it
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EdgeRef {
    /// Node carrying the edge
    pub node: NodeKey,
    /// Relation on that node
    pub relation: Relation,
    /// Edge target
    pub target: NodeKey,
}

impl fmt::Display for EdgeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.node, self.relation, self.target)
    }
}

/// Why an inherited baseline edge was not installed
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscardReason {
    /// The node declares its own edges for this relation
    OverriddenByExplicit,
    /// The node on the other end declares its own inverse edges without this one
    CounterpartOverridden,
}

/// An inherited edge the linker dropped
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DiscardedEdge {
    /// The baseline edge as it would have applied to the node
    #[serde(flatten)]
    pub edge: EdgeRef,
    /// Baseline key the edge came from
    pub baseline_target: NodeKey,
    /// Why it was dropped
    pub reason: DiscardReason,
}

/// What one linking pass did
///
/// Collected per jurisdiction, merged across a batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkReport {
    /// Nodes whose edges were resolved
    pub linked: Vec<NodeKey>,

    /// Nodes with no baseline slot; left unlinked
    pub missing_baseline: Vec<NodeKey>,

    /// Edges whose target exists nowhere; not installed
    pub dangling: Vec<EdgeRef>,

    /// Inherited edges replaced by explicit declarations
    pub discarded_inherited: Vec<DiscardedEdge>,

    /// Inherited edges removed by a tombstone
    pub tombstoned: Vec<EdgeRef>,
}

impl LinkReport {
    /// Create an empty report
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a linked node
    pub fn record_linked(&mut self, key: NodeKey) {
        self.linked.push(key);
    }

    /// Record a node without a baseline slot
    pub fn record_missing_baseline(&mut self, key: NodeKey) {
        self.missing_baseline.push(key);
    }

    /// Record an edge that points nowhere
    pub fn record_dangling(&mut self, edge: EdgeRef) {
        self.dangling.push(edge);
    }

    /// Record a dropped inherited edge
    pub fn record_discarded(&mut self, edge: EdgeRef, baseline_target: NodeKey, reason: DiscardReason) {
        self.discarded_inherited.push(DiscardedEdge {
            edge,
            baseline_target,
            reason,
        });
    }

    /// Record a tombstoned inherited edge
    pub fn record_tombstoned(&mut self, edge: EdgeRef) {
        self.tombstoned.push(edge);
    }

    /// Fold another report into this one
    pub fn merge(&mut self, other: LinkReport) {
        self.linked.extend(other.linked);
        self.missing_baseline.extend(other.missing_baseline);
        self.dangling.extend(other.dangling);
        self.discarded_inherited.extend(other.discarded_inherited);
        self.tombstoned.extend(other.tombstoned);
    }

    /// Whether the pass found nothing worth reporting
    pub fn is_clean(&self) -> bool {
        self.missing_baseline.is_empty() && self.dangling.is_empty()
    }

    /// Issues for every missing baseline and dangling target
    pub fn issues(&self) -> Vec<Issue> {
        let missing = self.missing_baseline.iter().map(|key| {
            Issue::error(
                IssueCode::MissingBaseline,
                "$",
                format!("No FEDERAL node at slot {} for {}", key.slot(), key),
            )
        });
        let dangling = self.dangling.iter().map(|edge| {
            Issue::warning(
                IssueCode::DanglingReference,
                format!("$.cross_references.{}", edge.relation),
                format!("{}: target does not exist, edge not installed", edge),
            )
        });
        missing.chain(dangling).collect()
    }

    /// Generate a one-paragraph summary
    pub fn summary(&self) -> String {
        format!(
            "linked {} nodes; {} missing baseline; {} dangling; {} inherited edges overridden; {} tombstoned",
            self.linked.len(),
            self.missing_baseline.len(),
            self.dangling.len(),
            self.discarded_inherited.len(),
            self.tombstoned.len(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(s: &str) -> NodeKey {
        NodeKey::parse(s).unwrap()
    }

    #[test]
    fn test_issues() {
        let mut report = LinkReport::new();
        report.record_missing_baseline(key("TX_DEC-09"));
        report.record_dangling(EdgeRef {
            node: key("TX_DEC-01"),
            relation: Relation::LeadsTo,
            target: key("TX_ACT-77"),
        });
        let issues = report.issues();
        assert_eq!(issues.len(), 2);
        assert_eq!(issues[0].code, IssueCode::MissingBaseline);
        assert_eq!(issues[1].code, IssueCode::DanglingReference);
        assert_eq!(issues[1].path, "$.cross_references.leads_to");
        assert!(!report.is_clean());
    }

    #[test]
    fn test_merge_and_summary() {
        let mut a = LinkReport::new();
        a.record_linked(key("TX_DEC-01"));
        let mut b = LinkReport::new();
        b.record_linked(key("AK_DEC-01"));
        b.record_tombstoned(EdgeRef {
            node: key("AK_DEC-01"),
            relation: Relation::LeadsTo,
            target: key("AK_ACT-01"),
        });
        a.merge(b);
        assert_eq!(a.linked.len(), 2);
        assert!(a.summary().starts_with("linked 2 nodes"));
        assert!(a.is_clean());
    }

    #[test]
    fn test_discarded_edge_serializes_flat() {
        let mut report = LinkReport::new();
        report.record_discarded(
            EdgeRef {
                node: key("TX_DEC-01"),
                relation: Relation::LeadsTo,
                target: key("TX_ACT-01"),
            },
            key("FEDERAL_ACT-01"),
            DiscardReason::OverriddenByExplicit,
        );
        let json = serde_json::to_value(&report).unwrap();
        let discarded = &json["discarded_inherited"][0];
        assert_eq!(discarded["node"], "TX_DEC-01");
        assert_eq!(discarded["baseline_target"], "FEDERAL_ACT-01");
        assert_eq!(discarded["reason"], "overridden_by_explicit");
    }
}
