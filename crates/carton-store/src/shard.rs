//! One jurisdiction's node set, with full version history

use crate::StoreError;
use carton_domain::{CrossReferences, DecisionNode, Jurisdiction, NodeKey, Slot};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// All versions of one node key, oldest first
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeHistory {
    versions: Vec<DecisionNode>,
}

impl NodeHistory {
    /// The live version
    pub fn current(&self) -> &DecisionNode {
        // A history is only ever created with one version and only grows
        &self.versions[self.versions.len() - 1]
    }

    fn current_mut(&mut self) -> &mut DecisionNode {
        let last = self.versions.len() - 1;
        &mut self.versions[last]
    }

    /// Every version, oldest first
    pub fn versions(&self) -> &[DecisionNode] {
        &self.versions
    }

    fn append(&mut self, mut node: DecisionNode) -> u32 {
        let prior = self.versions.len() - 1;
        let prior_version = self.versions[prior].version;
        node.version = prior_version + 1;
        node.supersedes = Some(prior_version);
        node.superseded_by = None;
        self.versions[prior].superseded_by = Some(node.version);
        self.versions.push(node);
        prior_version + 1
    }
}

/// The node set of a single jurisdiction
///
/// A shard is the unit of mutation: the pipeline clones it, stages a whole
/// batch into the clone, and swaps it in only when the batch is complete.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shard {
    jurisdiction: Jurisdiction,
    nodes: BTreeMap<NodeKey, NodeHistory>,
}

impl Shard {
    /// Create an empty shard
    pub fn new(jurisdiction: Jurisdiction) -> Self {
        Self {
            jurisdiction,
            nodes: BTreeMap::new(),
        }
    }

    /// Jurisdiction this shard holds
    pub fn jurisdiction(&self) -> &Jurisdiction {
        &self.jurisdiction
    }

    /// Add a node, or supersede the existing version of its key
    ///
    /// A node whose key already exists must carry `supersedes` equal to the
    /// live version, otherwise it is rejected as a duplicate.
    pub fn add_node(&mut self, mut node: DecisionNode) -> Result<u32, StoreError> {
        let key = node.key();
        if key.jurisdiction != self.jurisdiction {
            return Err(StoreError::WrongJurisdiction {
                key,
                shard: self.jurisdiction.clone(),
            });
        }

        match self.nodes.get_mut(&key) {
            Some(history) => {
                let live = history.current().version;
                match node.supersedes {
                    None => Err(StoreError::Duplicate(key)),
                    Some(pointer) if pointer != live => Err(StoreError::StaleSupersession {
                        key,
                        live,
                        supplied: pointer,
                    }),
                    Some(_) => {
                        let version = history.append(node);
                        debug!("Superseded {} with version {}", key, version);
                        Ok(version)
                    }
                }
            }
            None => {
                if node.supersedes.is_some() {
                    return Err(StoreError::NotFound(key));
                }
                node.version = 1;
                node.superseded_by = None;
                self.nodes.insert(key.clone(), NodeHistory { versions: vec![node] });
                debug!("Added {}", key);
                Ok(1)
            }
        }
    }

    /// Install linker-resolved edges on the live version
    ///
    /// Resolved edges are derived data, so they do not start a new version.
    /// Returns whether they changed.
    pub fn relink(&mut self, key: &NodeKey, linked: CrossReferences) -> Result<bool, StoreError> {
        let history = self
            .nodes
            .get_mut(key)
            .ok_or_else(|| StoreError::NotFound(key.clone()))?;
        let live = history.current_mut();

        if live.linked.as_ref() == Some(&linked) {
            return Ok(false);
        }
        live.linked = Some(linked);
        debug!("Relinked {} at version {}", key, live.version);
        Ok(true)
    }

    /// Live version of a node
    pub fn get(&self, key: &NodeKey) -> Option<&DecisionNode> {
        self.nodes.get(key).map(NodeHistory::current)
    }

    /// Live version of the node at a slot
    pub fn get_slot(&self, slot: Slot) -> Option<&DecisionNode> {
        self.get(&slot.in_jurisdiction(self.jurisdiction.clone()))
    }

    /// Full version history of a node
    pub fn history(&self, key: &NodeKey) -> Option<&NodeHistory> {
        self.nodes.get(key)
    }

    /// Whether the key exists
    pub fn contains(&self, key: &NodeKey) -> bool {
        self.nodes.contains_key(key)
    }

    /// Live versions of every node, in key order
    pub fn nodes(&self) -> impl Iterator<Item = &DecisionNode> {
        self.nodes.values().map(NodeHistory::current)
    }

    /// Every key, in order
    pub fn keys(&self) -> impl Iterator<Item = &NodeKey> {
        self.nodes.keys()
    }

    /// Number of distinct node keys
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the shard holds no nodes
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Total stored versions across all keys
    pub fn version_count(&self) -> usize {
        self.nodes.values().map(|h| h.versions.len()).sum()
    }
}
