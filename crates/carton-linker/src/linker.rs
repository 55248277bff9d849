//! Baseline-to-state edge resolution

use crate::report::{DiscardReason, EdgeRef, LinkReport};
use carton_domain::{CrossReferences, DecisionNode, Jurisdiction, NodeKey, Relation};
use carton_store::Shard;
use std::collections::BTreeMap;

/// Resolved edges of every linked node, plus what the pass did
#[derive(Debug, Clone, Default)]
pub struct LinkOutcome {
    /// What happened
    pub report: LinkReport,
    /// Edges to install, keyed by node
    pub resolved: BTreeMap<NodeKey, CrossReferences>,
}

/// An edge before target resolution
struct Proposed {
    relation: Relation,
    target: NodeKey,
    /// Baseline key the edge was inherited from; `None` when explicit
    inherited_from: Option<NodeKey>,
}

/// Links one jurisdiction's nodes to the FEDERAL baseline
///
/// For `leads_to` and `triggered_by`, a state node inherits the edges of its
/// baseline slot unless it declares edges of that relation itself, in which
/// case the declared set wins outright. Tombstones remove single inherited
/// edges. `failure_modes` and `oversees` are never inherited.
#[derive(Debug, Clone, Copy, Default)]
pub struct LeafLinker;

impl LeafLinker {
    /// Create a linker
    pub fn new() -> Self {
        Self
    }

    /// Link every node of a shard
    pub fn link_shard(&self, shard: &Shard, baseline: &Shard) -> LinkOutcome {
        self.link(shard.nodes(), baseline)
    }

    /// Link a jurisdiction's node set against the baseline
    ///
    /// `nodes` must be the complete node set of one jurisdiction, since an
    /// edge's counterpart decides whether an inherited default survives.
    /// Linking FEDERAL nodes against their own shard only drops dangling
    /// edges.
    pub fn link<'a, I>(&self, nodes: I, baseline: &Shard) -> LinkOutcome
    where
        I: IntoIterator<Item = &'a DecisionNode>,
    {
        let nodes: BTreeMap<NodeKey, &DecisionNode> = nodes.into_iter().map(|n| (n.key(), n)).collect();
        let mut outcome = LinkOutcome::default();

        for (key, node) in &nodes {
            let Some(proposed) = propose(key, node, baseline, &mut outcome.report) else {
                continue;
            };

            let mut refs = CrossReferences::default();
            for edge in proposed {
                let Some(target) = resolve_target(key, &edge.target, &nodes, baseline) else {
                    outcome.report.record_dangling(EdgeRef {
                        node: key.clone(),
                        relation: edge.relation,
                        target: edge.target,
                    });
                    continue;
                };

                if let Some(origin) = edge.inherited_from {
                    if counterpart_refuses(key, edge.relation, &target, &nodes) {
                        outcome.report.record_discarded(
                            EdgeRef {
                                node: key.clone(),
                                relation: edge.relation,
                                target,
                            },
                            origin,
                            DiscardReason::CounterpartOverridden,
                        );
                        continue;
                    }
                }
                refs.get_mut(edge.relation).insert(target);
            }

            tracing::debug!("Linked {} with {} edges", key, refs.edges().count());
            outcome.report.record_linked(key.clone());
            outcome.resolved.insert(key.clone(), refs);
        }

        tracing::info!("Link pass: {}", outcome.report.summary());
        outcome
    }
}

/// Candidate edges of one node, or `None` when it has no baseline slot
fn propose(key: &NodeKey, node: &DecisionNode, baseline: &Shard, report: &mut LinkReport) -> Option<Vec<Proposed>> {
    let declared = &node.cross_references;
    let explicit = |relation: Relation| {
        declared.get(relation).iter().map(move |target| Proposed {
            relation,
            target: target.clone(),
            inherited_from: None,
        })
    };

    if key.jurisdiction.is_federal() {
        return Some(Relation::ALL.into_iter().flat_map(explicit).collect());
    }

    let Some(base) = baseline.get_slot(node.slot()) else {
        tracing::warn!("{} has no baseline at {}", key, node.slot());
        report.record_missing_baseline(key.clone());
        return None;
    };

    let mut out = Vec::new();
    for relation in Relation::ALL {
        out.extend(explicit(relation));
        if !Relation::INHERITED.contains(&relation) {
            continue;
        }

        let own = declared.get(relation);
        for origin in base.edges().get(relation) {
            let applied = origin.with_jurisdiction(&key.jurisdiction);
            let edge = EdgeRef {
                node: key.clone(),
                relation,
                target: applied.clone(),
            };
            if !own.is_empty() {
                if !own.contains(&applied) && !own.contains(origin) {
                    report.record_discarded(edge, origin.clone(), DiscardReason::OverriddenByExplicit);
                }
            } else if declared.is_tombstoned(relation, origin.slot()) {
                report.record_tombstoned(edge);
            } else {
                out.push(Proposed {
                    relation,
                    target: applied,
                    inherited_from: Some(origin.clone()),
                });
            }
        }
    }
    Some(out)
}

/// Where an edge actually lands
///
/// A target in the node's own jurisdiction that the jurisdiction does not
/// define falls through to the baseline node of the same slot.
fn resolve_target(
    from: &NodeKey,
    target: &NodeKey,
    nodes: &BTreeMap<NodeKey, &DecisionNode>,
    baseline: &Shard,
) -> Option<NodeKey> {
    if target.jurisdiction == from.jurisdiction {
        if nodes.contains_key(target) {
            return Some(target.clone());
        }
        let fallback = target.with_jurisdiction(&Jurisdiction::federal());
        return baseline.contains(&fallback).then_some(fallback);
    }
    if target.jurisdiction.is_federal() && baseline.contains(target) {
        return Some(target.clone());
    }
    None
}

/// Whether the node at the far end of an inherited edge rejects the mirror edge
fn counterpart_refuses(
    from: &NodeKey,
    relation: Relation,
    target: &NodeKey,
    nodes: &BTreeMap<NodeKey, &DecisionNode>,
) -> bool {
    if target.jurisdiction != from.jurisdiction || from.jurisdiction.is_federal() {
        return false;
    }
    let (Some(inverse), Some(counterpart)) = (relation.inverse(), nodes.get(target)) else {
        return false;
    };
    let declared = &counterpart.cross_references;
    let own = declared.get(inverse);
    let overridden = !own.is_empty() && !own.iter().any(|k| k.slot() == from.slot());
    overridden || declared.is_tombstoned(inverse, from.slot())
}

#[cfg(test)]
mod tests {
    use super::*;
    use carton_domain::EdgeTombstone;

    fn key(s: &str) -> NodeKey {
        NodeKey::parse(s).unwrap()
    }

    fn node(k: &str, leads_to: &[&str], triggered_by: &[&str]) -> DecisionNode {
        let mut n = DecisionNode::new(key(k));
        n.cross_references.leads_to = leads_to.iter().map(|s| key(s)).collect();
        n.cross_references.triggered_by = triggered_by.iter().map(|s| key(s)).collect();
        n
    }

    fn shard(j: &str, nodes: Vec<DecisionNode>) -> Shard {
        let mut s = Shard::new(Jurisdiction::new(j).unwrap());
        for n in nodes {
            s.add_node(n).unwrap();
        }
        s
    }

    /// FEDERAL: INP-01 -> DEC-01 -> ACT-01, plus ACT-02 after DEC-02
    fn baseline() -> Shard {
        shard(
            "FEDERAL",
            vec![
                node("FEDERAL_INP-01", &["FEDERAL_DEC-01"], &[]),
                node("FEDERAL_DEC-01", &["FEDERAL_ACT-01"], &["FEDERAL_INP-01"]),
                node("FEDERAL_ACT-01", &[], &["FEDERAL_DEC-01"]),
                node("FEDERAL_DEC-02", &["FEDERAL_ACT-02"], &[]),
                node("FEDERAL_ACT-02", &[], &["FEDERAL_DEC-02"]),
            ],
        )
    }

    #[test]
    fn test_inherits_and_maps_into_state() {
        let tx = shard(
            "TX",
            vec![node("TX_DEC-01", &[], &[]), node("TX_ACT-01", &[], &[])],
        );
        let outcome = LeafLinker::new().link_shard(&tx, &baseline());

        let dec = &outcome.resolved[&key("TX_DEC-01")];
        assert_eq!(dec.leads_to.iter().collect::<Vec<_>>(), vec![&key("TX_ACT-01")]);
        // TX has no INP-01, so the edge lands on the baseline node
        assert_eq!(dec.triggered_by.iter().collect::<Vec<_>>(), vec![&key("FEDERAL_INP-01")]);
        assert_eq!(
            outcome.resolved[&key("TX_ACT-01")].triggered_by.iter().collect::<Vec<_>>(),
            vec![&key("TX_DEC-01")]
        );
        assert!(outcome.report.is_clean());
    }

    #[test]
    fn test_explicit_overrides_inherited() {
        let tx = shard(
            "TX",
            vec![
                node("TX_DEC-01", &["TX_ACT-02"], &[]),
                node("TX_ACT-01", &[], &[]),
                node("TX_ACT-02", &[], &["TX_DEC-01"]),
            ],
        );
        let outcome = LeafLinker::new().link_shard(&tx, &baseline());

        let dec = &outcome.resolved[&key("TX_DEC-01")];
        assert_eq!(dec.leads_to.iter().collect::<Vec<_>>(), vec![&key("TX_ACT-02")]);

        let discarded = &outcome.report.discarded_inherited;
        assert!(discarded.iter().any(|d| d.edge.node == key("TX_DEC-01")
            && d.baseline_target == key("FEDERAL_ACT-01")
            && d.reason == DiscardReason::OverriddenByExplicit));
        // The mirror default on ACT-01 goes too
        assert!(outcome.resolved[&key("TX_ACT-01")].triggered_by.is_empty());
        assert!(discarded.iter().any(|d| d.edge.node == key("TX_ACT-01")
            && d.reason == DiscardReason::CounterpartOverridden));
    }

    #[test]
    fn test_tombstone_removes_inherited_edge() {
        let mut dec = node("TX_DEC-01", &[], &[]);
        dec.cross_references.tombstones.insert(EdgeTombstone {
            relation: Relation::LeadsTo,
            target: key("FEDERAL_ACT-01"),
        });
        let tx = shard("TX", vec![dec, node("TX_ACT-01", &[], &[])]);
        let outcome = LeafLinker::new().link_shard(&tx, &baseline());

        assert!(outcome.resolved[&key("TX_DEC-01")].leads_to.is_empty());
        assert!(outcome.resolved[&key("TX_ACT-01")].triggered_by.is_empty());
        assert_eq!(outcome.report.tombstoned.len(), 1);
    }

    #[test]
    fn test_missing_baseline_not_linked() {
        let tx = shard("TX", vec![node("TX_DEC-09", &[], &[])]);
        let outcome = LeafLinker::new().link_shard(&tx, &baseline());
        assert!(outcome.resolved.is_empty());
        assert_eq!(outcome.report.missing_baseline, vec![key("TX_DEC-09")]);
    }

    #[test]
    fn test_dangling_edge_not_installed() {
        let tx = shard("TX", vec![node("TX_DEC-01", &["TX_ACT-07", "AK_ACT-01"], &[])]);
        let outcome = LeafLinker::new().link_shard(&tx, &baseline());
        assert!(outcome.resolved[&key("TX_DEC-01")].leads_to.is_empty());
        assert_eq!(outcome.report.dangling.len(), 2);
    }

    #[test]
    fn test_federal_pass_keeps_declared_edges() {
        let base = baseline();
        let outcome = LeafLinker::new().link_shard(&base, &base);
        assert_eq!(outcome.resolved.len(), 5);
        assert_eq!(
            outcome.resolved[&key("FEDERAL_DEC-01")].leads_to.iter().collect::<Vec<_>>(),
            vec![&key("FEDERAL_ACT-01")]
        );
        assert!(outcome.report.discarded_inherited.is_empty());
    }

    #[test]
    fn test_failure_modes_are_not_inherited() {
        let mut fed_dec = node("FEDERAL_DEC-01", &[], &[]);
        fed_dec.cross_references.failure_modes.insert(key("FEDERAL_FAIL-01"));
        let base = shard("FEDERAL", vec![fed_dec, node("FEDERAL_FAIL-01", &[], &[])]);

        let tx = shard("TX", vec![node("TX_DEC-01", &[], &[])]);
        let outcome = LeafLinker::new().link_shard(&tx, &base);
        assert!(outcome.resolved[&key("TX_DEC-01")].failure_modes.is_empty());
    }
}
