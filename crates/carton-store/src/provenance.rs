//! Citation provenance: deduplication, conflicts and source drift
//!
//! Every citation text the graph has accepted is recorded with the URL it
//! came from. A later citation with the same text is either a harmless
//! repeat (same URL) or a conflict (different URL) that must be held for
//! review rather than merged.

use carton_domain::{Citation, NodeKey};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use tracing::warn;

/// First accepted sighting of a citation text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvenanceRecord {
    /// Citation text, verbatim
    pub text: String,
    /// Source URL it was accepted with
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
    /// Node that first cited it
    pub first_cited_by: NodeKey,
}

/// A citation held back because its text is already known under another URL
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct HeldConflict {
    /// Citation text
    pub text: String,
    /// URL already on record
    pub existing_url: Option<String>,
    /// URL the new record carried
    pub incoming_url: Option<String>,
    /// Node the held record belongs to
    pub node: NodeKey,
}

/// How an incoming citation relates to what is on record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CitationClass {
    /// Text never seen
    New,
    /// Same text, same URL
    Known,
    /// Same text, different URL
    Conflict {
        /// URL already on record
        existing_url: Option<String>,
    },
}

/// Provenance of every accepted citation plus per-URL content hashes
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProvenanceStore {
    #[serde(default)]
    records: BTreeMap<String, ProvenanceRecord>,
    #[serde(default)]
    conflicts: Vec<HeldConflict>,
    #[serde(default)]
    content_hashes: BTreeMap<String, String>,
}

impl ProvenanceStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Classify a citation against the records
    pub fn classify(&self, citation: &Citation) -> CitationClass {
        match self.records.get(&citation.text) {
            None => CitationClass::New,
            Some(record) if record.source_url == citation.source_url => CitationClass::Known,
            Some(record) => CitationClass::Conflict {
                existing_url: record.source_url.clone(),
            },
        }
    }

    /// Record a citation; an existing record for the same text is kept
    pub fn record(&mut self, citation: &Citation, node: &NodeKey) {
        self.records
            .entry(citation.text.clone())
            .or_insert_with(|| ProvenanceRecord {
                text: citation.text.clone(),
                source_url: citation.source_url.clone(),
                first_cited_by: node.clone(),
            });
    }

    /// Hold a conflict for review; holding the same conflict twice is a no-op
    pub fn hold_conflict(&mut self, conflict: HeldConflict) {
        if !self.conflicts.contains(&conflict) {
            self.conflicts.push(conflict);
        }
    }

    /// Record the content hash of a source URL
    ///
    /// Returns the previous hash when it differs from the new one.
    pub fn check_drift(&mut self, url: &str, hash: &str) -> Option<String> {
        match self.content_hashes.insert(url.to_string(), hash.to_string()) {
            Some(previous) if previous != hash => Some(previous),
            _ => None,
        }
    }

    /// Last recorded content hash of a URL
    pub fn content_hash_of(&self, url: &str) -> Option<&str> {
        self.content_hashes.get(url).map(String::as_str)
    }

    /// Record for a citation text
    pub fn get(&self, text: &str) -> Option<&ProvenanceRecord> {
        self.records.get(text)
    }

    /// Every record, ordered by text
    pub fn records(&self) -> impl Iterator<Item = &ProvenanceRecord> {
        self.records.values()
    }

    /// Conflicts awaiting review
    pub fn conflicts(&self) -> &[HeldConflict] {
        &self.conflicts
    }

    /// Number of recorded citation texts
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether nothing has been recorded
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Fold a staged store into this one
    ///
    /// Staged records that now clash with a record committed concurrently by
    /// another jurisdiction are turned into held conflicts.
    pub fn merge(&mut self, staged: ProvenanceStore) {
        for record in staged.records.into_values() {
            match self.records.get(&record.text) {
                None => {
                    self.records.insert(record.text.clone(), record);
                }
                Some(existing) if existing.source_url == record.source_url => {}
                Some(existing) => {
                    warn!("Citation {:?} committed concurrently under two URLs", record.text);
                    let conflict = HeldConflict {
                        text: record.text.clone(),
                        existing_url: existing.source_url.clone(),
                        incoming_url: record.source_url,
                        node: record.first_cited_by,
                    };
                    self.hold_conflict(conflict);
                }
            }
        }
        for conflict in staged.conflicts {
            self.hold_conflict(conflict);
        }
        self.content_hashes.extend(staged.content_hashes);
    }
}

/// SHA-256 digest of page content, as `sha256:<hex>`
pub fn content_hash(content: &str) -> String {
    format!("sha256:{:x}", Sha256::digest(content.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use carton_domain::AuthorityType;

    const STAT: &str = "Tex. Fam. Code § 261.101";

    fn key(s: &str) -> NodeKey {
        NodeKey::parse(s).unwrap()
    }

    #[test]
    fn test_classify() {
        let mut store = ProvenanceStore::new();
        let cite = Citation::new(STAT, "https://statutes.capitol.texas.gov/FA/261", AuthorityType::Statute);
        assert_eq!(store.classify(&cite), CitationClass::New);

        store.record(&cite, &key("TX_INP-01"));
        assert_eq!(store.classify(&cite), CitationClass::Known);

        let moved = Citation::new(STAT, "https://law.justia.com/tx/261", AuthorityType::Statute);
        assert_eq!(
            store.classify(&moved),
            CitationClass::Conflict {
                existing_url: Some("https://statutes.capitol.texas.gov/FA/261".to_string())
            }
        );
    }

    #[test]
    fn test_missing_url_against_known_url_conflicts() {
        let mut store = ProvenanceStore::new();
        store.record(
            &Citation::new(STAT, "https://statutes.capitol.texas.gov/FA/261", AuthorityType::Statute),
            &key("TX_INP-01"),
        );
        assert!(matches!(
            store.classify(&Citation::provisional(STAT, AuthorityType::Statute)),
            CitationClass::Conflict { .. }
        ));
    }

    #[test]
    fn test_hold_conflict_is_idempotent() {
        let mut store = ProvenanceStore::new();
        let conflict = HeldConflict {
            text: STAT.to_string(),
            existing_url: Some("https://a.gov".to_string()),
            incoming_url: Some("https://b.gov".to_string()),
            node: key("TX_INP-01"),
        };
        store.hold_conflict(conflict.clone());
        store.hold_conflict(conflict);
        assert_eq!(store.conflicts().len(), 1);
    }

    #[test]
    fn test_drift() {
        let mut store = ProvenanceStore::new();
        let url = "https://statutes.capitol.texas.gov/FA/261";
        assert_eq!(store.check_drift(url, &content_hash("v1")), None);
        assert_eq!(store.check_drift(url, &content_hash("v1")), None);
        assert_eq!(store.check_drift(url, &content_hash("v2")), Some(content_hash("v1")));
        assert_eq!(store.content_hash_of(url), Some(content_hash("v2").as_str()));
    }

    #[test]
    fn test_content_hash_format() {
        let hash = content_hash("");
        assert_eq!(
            hash,
            "sha256:e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_merge_turns_concurrent_clash_into_conflict() {
        let mut committed = ProvenanceStore::new();
        committed.record(&Citation::new(STAT, "https://a.gov", AuthorityType::Statute), &key("TX_INP-01"));

        let mut staged = ProvenanceStore::new();
        staged.record(&Citation::new(STAT, "https://b.gov", AuthorityType::Statute), &key("AK_INP-01"));
        staged.record(
            &Citation::new("42 U.S.C. § 5106a", "https://uscode.house.gov", AuthorityType::Statute),
            &key("AK_INP-01"),
        );

        committed.merge(staged);
        assert_eq!(committed.len(), 2);
        assert_eq!(committed.get(STAT).unwrap().source_url.as_deref(), Some("https://a.gov"));
        assert_eq!(committed.conflicts().len(), 1);
        assert_eq!(committed.conflicts()[0].node, key("AK_INP-01"));
    }
}
