//! Decision nodes and their typed cross-references

use crate::citation::Citation;
use crate::key::{Jurisdiction, NodeFamily, NodeKey, Slot};
use crate::layer::NodeLayers;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Kind of cross-reference edge between nodes
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Relation {
    /// Nodes that lead into this one
    TriggeredBy,
    /// Nodes this one leads to
    LeadsTo,
    /// FAIL nodes describing how this node goes wrong
    FailureModes,
    /// Nodes this (PMC) node oversees
    Oversees,
}

impl Relation {
    /// All relations
    pub const ALL: [Relation; 4] = [
        Relation::TriggeredBy,
        Relation::LeadsTo,
        Relation::FailureModes,
        Relation::Oversees,
    ];

    /// Relations whose baseline edges are inherited by state nodes
    pub const INHERITED: [Relation; 2] = [Relation::LeadsTo, Relation::TriggeredBy];

    /// Get the relation name as used in records
    pub fn as_str(&self) -> &'static str {
        match self {
            Relation::TriggeredBy => "triggered_by",
            Relation::LeadsTo => "leads_to",
            Relation::FailureModes => "failure_modes",
            Relation::Oversees => "oversees",
        }
    }

    /// Parse a relation name
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "triggered_by" => Some(Relation::TriggeredBy),
            "leads_to" => Some(Relation::LeadsTo),
            "failure_modes" => Some(Relation::FailureModes),
            "oversees" => Some(Relation::Oversees),
            _ => None,
        }
    }

    /// The relation that must mirror this one on the target, if any
    pub fn inverse(&self) -> Option<Relation> {
        match self {
            Relation::LeadsTo => Some(Relation::TriggeredBy),
            Relation::TriggeredBy => Some(Relation::LeadsTo),
            _ => None,
        }
    }
}

impl std::str::FromStr for Relation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("Invalid relation: {}", s))
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Explicit removal of an edge a state would otherwise inherit from the baseline
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EdgeTombstone {
    /// Relation the edge belongs to
    pub relation: Relation,
    /// Target slot of the removed edge
    pub target: NodeKey,
}

/// Cross-reference sets of one node
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrossReferences {
    /// Nodes that lead into this one
    #[serde(default)]
    pub triggered_by: BTreeSet<NodeKey>,

    /// Nodes this one leads to
    #[serde(default)]
    pub leads_to: BTreeSet<NodeKey>,

    /// Failure modes of this node
    #[serde(default)]
    pub failure_modes: BTreeSet<NodeKey>,

    /// Nodes under this node's oversight
    #[serde(default)]
    pub oversees: BTreeSet<NodeKey>,

    /// Inherited edges this node removes on purpose
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub tombstones: BTreeSet<EdgeTombstone>,
}

impl CrossReferences {
    /// Targets under one relation
    pub fn get(&self, relation: Relation) -> &BTreeSet<NodeKey> {
        match relation {
            Relation::TriggeredBy => &self.triggered_by,
            Relation::LeadsTo => &self.leads_to,
            Relation::FailureModes => &self.failure_modes,
            Relation::Oversees => &self.oversees,
        }
    }

    /// Mutable targets under one relation
    pub fn get_mut(&mut self, relation: Relation) -> &mut BTreeSet<NodeKey> {
        match relation {
            Relation::TriggeredBy => &mut self.triggered_by,
            Relation::LeadsTo => &mut self.leads_to,
            Relation::FailureModes => &mut self.failure_modes,
            Relation::Oversees => &mut self.oversees,
        }
    }

    /// Whether an inherited edge to the target's slot has been tombstoned
    pub fn is_tombstoned(&self, relation: Relation, target: Slot) -> bool {
        self.tombstones
            .iter()
            .any(|t| t.relation == relation && t.target.slot() == target)
    }

    /// Every `(relation, target)` edge
    pub fn edges(&self) -> impl Iterator<Item = (Relation, &NodeKey)> {
        Relation::ALL
            .into_iter()
            .flat_map(move |relation| self.get(relation).iter().map(move |target| (relation, target)))
    }
}

/// One point in the process/authority matrix
///
/// Nodes are never deleted. A content change appends a new version that
/// points back at the one it supersedes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionNode {
    /// Owning jurisdiction
    pub jurisdiction: Jurisdiction,

    /// Stage family
    pub family: NodeFamily,

    /// Sequence within the family
    pub sequence: u32,

    /// Short human-readable name of the trigger or step
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Per-layer constraint and requirement declarations
    #[serde(default)]
    pub layers: NodeLayers,

    /// Ordered citations backing this node
    #[serde(default)]
    pub citations: Vec<Citation>,

    /// Typed edges to other nodes, as declared by the producer
    #[serde(default)]
    pub cross_references: CrossReferences,

    /// Edges resolved by the linker against the baseline
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linked: Option<CrossReferences>,

    /// Version number assigned by the graph, starting at 1
    #[serde(default)]
    pub version: u32,

    /// Version of the same key this node replaces
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supersedes: Option<u32>,

    /// Version that replaced this one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub superseded_by: Option<u32>,
}

impl DecisionNode {
    /// Create an empty node
    pub fn new(key: NodeKey) -> Self {
        Self {
            jurisdiction: key.jurisdiction,
            family: key.family,
            sequence: key.sequence,
            title: None,
            layers: NodeLayers::new(),
            citations: Vec::new(),
            cross_references: CrossReferences::default(),
            linked: None,
            version: 0,
            supersedes: None,
            superseded_by: None,
        }
    }

    /// Identity of this node
    pub fn key(&self) -> NodeKey {
        NodeKey::new(self.jurisdiction.clone(), self.family, self.sequence)
    }

    /// `(family, sequence)` slot of this node
    pub fn slot(&self) -> Slot {
        Slot::new(self.family, self.sequence)
    }

    /// Edges the graph serves: linker-resolved when available, else declared
    pub fn edges(&self) -> &CrossReferences {
        self.linked.as_ref().unwrap_or(&self.cross_references)
    }

    /// Compare declared content, ignoring version bookkeeping and linker output
    pub fn same_content(&self, other: &DecisionNode) -> bool {
        self.jurisdiction == other.jurisdiction
            && self.family == other.family
            && self.sequence == other.sequence
            && self.title == other.title
            && self.layers == other.layers
            && self.citations == other.citations
            && self.cross_references == other.cross_references
    }

    /// Citations with no source URL
    pub fn provisional_citations(&self) -> impl Iterator<Item = &Citation> {
        self.citations.iter().filter(|c| c.is_provisional())
    }
}
