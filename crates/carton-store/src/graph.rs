//! Cross-shard graph queries and invariant checks

use crate::shard::Shard;
use crate::StoreError;
use carton_domain::{
    resolve_floor_against, AuthorityCatalog, DecisionNode, FloorViolation, Jurisdiction, NodeFamily, NodeKey,
    NodeLayers, Relation,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet, VecDeque};
use std::fmt;

/// A structural invariant the graph does not currently hold
///
/// Violations are reported, never repaired.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InvariantViolation {
    /// `from` has an edge to `to` that `to` does not mirror
    AsymmetricEdge {
        /// Node declaring the edge
        from: NodeKey,
        /// Relation on `from`
        relation: Relation,
        /// Node missing the inverse edge
        to: NodeKey,
    },
    /// A FAIL node no DEC, ACT or OUT node lists as a failure mode
    OrphanFailure {
        /// The FAIL node
        key: NodeKey,
    },
    /// An edge names a node that does not exist
    DanglingTarget {
        /// Node declaring the edge
        from: NodeKey,
        /// Relation on `from`
        relation: Relation,
        /// Missing target
        to: NodeKey,
    },
}

impl fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvariantViolation::AsymmetricEdge { from, relation, to } => {
                let inverse = relation.inverse().map(|r| r.as_str()).unwrap_or("?");
                write!(f, "{} {} {} but {} lacks {} {}", from, relation, to, to, inverse, from)
            }
            InvariantViolation::OrphanFailure { key } => {
                write!(f, "{} is not a failure mode of any DEC, ACT or OUT node", key)
            }
            InvariantViolation::DanglingTarget { from, relation, to } => {
                write!(f, "{} {} {} which does not exist", from, relation, to)
            }
        }
    }
}

/// The cross-reference graph over all jurisdictions
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DecisionGraph {
    shards: BTreeMap<Jurisdiction, Shard>,
}

impl DecisionGraph {
    /// Create an empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node to its jurisdiction's shard, creating the shard if needed
    pub fn add_node(&mut self, node: DecisionNode) -> Result<u32, StoreError> {
        self.shards
            .entry(node.jurisdiction.clone())
            .or_insert_with(|| Shard::new(node.jurisdiction.clone()))
            .add_node(node)
    }

    /// Live version of a node
    pub fn get_node(&self, key: &NodeKey) -> Option<&DecisionNode> {
        self.shards.get(&key.jurisdiction)?.get(key)
    }

    /// Live version of the node at `(jurisdiction, family, sequence)`
    pub fn get(&self, jurisdiction: &Jurisdiction, family: NodeFamily, sequence: u32) -> Option<&DecisionNode> {
        self.get_node(&NodeKey::new(jurisdiction.clone(), family, sequence))
    }

    /// Shard of one jurisdiction
    pub fn shard(&self, jurisdiction: &Jurisdiction) -> Option<&Shard> {
        self.shards.get(jurisdiction)
    }

    /// Replace a jurisdiction's shard wholesale
    pub fn put_shard(&mut self, shard: Shard) {
        self.shards.insert(shard.jurisdiction().clone(), shard);
    }

    /// Every shard, in jurisdiction order
    pub fn shards(&self) -> impl Iterator<Item = &Shard> {
        self.shards.values()
    }

    /// Jurisdictions present in the graph
    pub fn jurisdictions(&self) -> impl Iterator<Item = &Jurisdiction> {
        self.shards.keys()
    }

    /// Live versions of every node
    pub fn nodes(&self) -> impl Iterator<Item = &DecisionNode> {
        self.shards.values().flat_map(Shard::nodes)
    }

    /// Number of distinct node keys
    pub fn len(&self) -> usize {
        self.shards.values().map(Shard::len).sum()
    }

    /// Whether the graph holds no nodes
    pub fn is_empty(&self) -> bool {
        self.shards.values().all(Shard::is_empty)
    }

    /// Direct targets of one relation, empty when the node does not exist
    pub fn neighbors(&self, key: &NodeKey, relation: Relation) -> Vec<NodeKey> {
        self.get_node(key)
            .map(|node| node.edges().get(relation).iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Breadth-first walk over one relation, at most `max_depth` hops from `start`
    ///
    /// Yields `(key, depth)` pairs lazily. The start node is not yielded and
    /// each key is yielded once, so cycles terminate. Targets that do not
    /// exist are yielded but not expanded.
    pub fn traverse(&self, start: &NodeKey, relation: Relation, max_depth: usize) -> Traverse<'_> {
        let mut visited = HashSet::new();
        visited.insert(start.clone());
        let mut frontier = VecDeque::new();
        frontier.push_back((start.clone(), 0));
        Traverse {
            graph: self,
            relation,
            max_depth,
            visited,
            frontier,
            pending: VecDeque::new(),
        }
    }

    /// Check every jurisdiction's invariants
    pub fn check_consistency(&self) -> Vec<InvariantViolation> {
        let mut out: Vec<_> = self
            .shards
            .keys()
            .flat_map(|j| self.check_jurisdiction(j))
            .collect();
        out.sort();
        out
    }

    /// Check the invariants of one jurisdiction's nodes
    ///
    /// Edge symmetry is only required between nodes of the same
    /// jurisdiction; a state node may lean on a baseline node that knows
    /// nothing about it.
    pub fn check_jurisdiction(&self, jurisdiction: &Jurisdiction) -> Vec<InvariantViolation> {
        let Some(shard) = self.shards.get(jurisdiction) else {
            return Vec::new();
        };

        let mut out = Vec::new();
        let mut failure_targets: BTreeSet<&NodeKey> = BTreeSet::new();

        for node in shard.nodes() {
            let from = node.key();
            if node.family.can_fail() {
                failure_targets.extend(node.edges().failure_modes.iter());
            }

            for (relation, to) in node.edges().edges() {
                let Some(target) = self.get_node(to) else {
                    out.push(InvariantViolation::DanglingTarget {
                        from: from.clone(),
                        relation,
                        to: to.clone(),
                    });
                    continue;
                };
                let Some(inverse) = relation.inverse() else {
                    continue;
                };
                if to.jurisdiction == from.jurisdiction && !target.edges().get(inverse).contains(&from) {
                    out.push(InvariantViolation::AsymmetricEdge {
                        from: from.clone(),
                        relation,
                        to: to.clone(),
                    });
                }
            }
        }

        // Failure modes may be declared by nodes of any jurisdiction
        let foreign: BTreeSet<&NodeKey> = self
            .shards
            .iter()
            .filter(|(j, _)| *j != jurisdiction)
            .flat_map(|(_, s)| s.nodes())
            .filter(|n| n.family.can_fail())
            .flat_map(|n| n.edges().failure_modes.iter())
            .filter(|k| &k.jurisdiction == jurisdiction)
            .collect();

        for node in shard.nodes().filter(|n| n.family == NodeFamily::Fail) {
            let key = node.key();
            if !failure_targets.contains(&key) && !foreign.contains(&key) {
                out.push(InvariantViolation::OrphanFailure { key });
            }
        }

        out
    }

    /// Floor violations of each node in a jurisdiction against its baseline slot
    ///
    /// Nodes without violations are omitted.
    pub fn diff_against_federal(
        &self,
        jurisdiction: &Jurisdiction,
        catalog: &AuthorityCatalog,
    ) -> BTreeMap<NodeKey, Vec<FloorViolation>> {
        let empty = NodeLayers::new();
        let baseline = self.shards.get(&Jurisdiction::federal());
        let Some(shard) = self.shards.get(jurisdiction) else {
            return BTreeMap::new();
        };

        shard
            .nodes()
            .filter_map(|node| {
                let floor = baseline
                    .and_then(|b| b.get_slot(node.slot()))
                    .map(|b| &b.layers)
                    .unwrap_or(&empty);
                let result = resolve_floor_against(&node.layers, floor, catalog);
                (!result.ok).then(|| (node.key(), result.violations))
            })
            .collect()
    }
}

/// Lazy breadth-first iterator returned by [`DecisionGraph::traverse`]
pub struct Traverse<'a> {
    graph: &'a DecisionGraph,
    relation: Relation,
    max_depth: usize,
    visited: HashSet<NodeKey>,
    frontier: VecDeque<(NodeKey, usize)>,
    pending: VecDeque<(NodeKey, usize)>,
}

impl Iterator for Traverse<'_> {
    type Item = (NodeKey, usize);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(item) = self.pending.pop_front() {
                self.frontier.push_back(item.clone());
                return Some(item);
            }

            let (key, depth) = self.frontier.pop_front()?;
            if depth >= self.max_depth {
                continue;
            }
            let Some(node) = self.graph.get_node(&key) else {
                continue;
            };
            for next in node.edges().get(self.relation) {
                if self.visited.insert(next.clone()) {
                    self.pending.push_back((next.clone(), depth + 1));
                }
            }
        }
    }
}
