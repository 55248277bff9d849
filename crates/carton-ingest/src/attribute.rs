//! Attribution of crawled leaf documents to decision nodes
//!
//! Case law, statute and rule listings are crawled per jurisdiction, not
//! per node. Each leaf is screened for child-welfare relevance, scored
//! against the node's family keywords and title, and the best few of each
//! kind are appended to the node's candidate record as citations. The
//! citation text is the leaf's own verbatim citation and the source is the
//! leaf URL, so attribution never invents an authority.

use crate::config::AttributionConfig;
use crate::error::IngestError;
use crate::normalize::normalize;
use carton_domain::{AuthorityType, Jurisdiction, NodeFamily, NodeKey};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeSet;
use tracing::debug;

/// Kind of leaf document
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeafKind {
    /// Statute or code section
    Statute,
    /// Administrative rule
    Rule,
    /// Court decision
    Case,
}

impl LeafKind {
    /// Kinds in the order their citations are attached
    pub const ALL: [LeafKind; 3] = [LeafKind::Statute, LeafKind::Rule, LeafKind::Case];

    fn authority_type(&self) -> AuthorityType {
        match self {
            LeafKind::Statute => AuthorityType::Statute,
            LeafKind::Rule => AuthorityType::Regulation,
            LeafKind::Case => AuthorityType::Case,
        }
    }
}

/// A crawled document not yet tied to any node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Leaf {
    /// Jurisdiction the document belongs to
    pub jurisdiction: Jurisdiction,
    /// Document kind
    pub kind: LeafKind,
    /// Verbatim citation, e.g. a code section or case caption
    pub citation: String,
    /// Where the document was fetched from
    pub url: String,
    /// Listing title
    #[serde(default)]
    pub title: String,
    /// Short description from the listing
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    /// Decision year, for cases
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    /// Day the document was fetched
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retrieved_on: Option<NaiveDate>,
}

/// Outcome of the child-welfare screen
#[derive(Debug, Clone, PartialEq)]
pub struct Relevance {
    /// Whether the leaf is child-welfare material
    pub relevant: bool,
    /// Strength of the strongest signal, 0.0 to 1.0
    pub confidence: f64,
    /// What matched
    pub reason: Option<String>,
}

impl Relevance {
    fn none() -> Self {
        Self {
            relevant: false,
            confidence: 0.0,
            reason: None,
        }
    }

    fn raise(&mut self, confidence: f64, reason: String) {
        if confidence > self.confidence {
            self.relevant = true;
            self.confidence = confidence;
            self.reason = Some(reason);
        }
    }
}

/// A leaf with its score against one node
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredLeaf<'a> {
    /// The scored leaf
    pub leaf: &'a Leaf,
    /// Relevance confidence plus keyword and title boosts
    pub score: f64,
    /// Family keywords found in the leaf
    pub matched: Vec<String>,
}

/// Scores leaves against nodes and attaches the best of them
#[derive(Debug, Clone)]
pub struct Attributor {
    config: AttributionConfig,
}

impl Attributor {
    /// Create an attributor, validating the configuration
    pub fn new(config: AttributionConfig) -> Result<Self, IngestError> {
        config.validate().map_err(IngestError::Config)?;
        Ok(Self { config })
    }

    /// Active configuration
    pub fn config(&self) -> &AttributionConfig {
        &self.config
    }

    /// Screen a leaf for child-welfare relevance
    ///
    /// Court keywords in a case URL count most, then relevance keywords in
    /// the URL, then relevance keywords in the title.
    pub fn relevance(&self, leaf: &Leaf) -> Relevance {
        let url = leaf.url.to_lowercase();
        let title = leaf.title.to_lowercase();
        let mut relevance = Relevance::none();

        if leaf.kind == LeafKind::Case {
            if let Some(word) = first_match(&self.config.court_keywords, &url) {
                relevance.raise(0.8, format!("juvenile or family court: {}", word));
            }
        }
        if let Some(word) = first_match(&self.config.relevance_keywords, &url) {
            relevance.raise(0.7, format!("keyword in URL: {}", word));
        }
        if let Some(word) = first_match(&self.config.relevance_keywords, &title) {
            relevance.raise(0.5, format!("keyword in title: {}", word));
        }
        relevance
    }

    /// Score one leaf against a node of `family` titled `title`
    ///
    /// Each family keyword found in the leaf title or summary adds 1.0; each
    /// node title word longer than three letters found in the leaf title
    /// adds 0.5. Returns `None` for leaves that fail the relevance screen.
    pub fn score<'a>(&self, leaf: &'a Leaf, family: NodeFamily, title: Option<&str>) -> Option<ScoredLeaf<'a>> {
        let relevance = self.relevance(leaf);
        if !relevance.relevant {
            return None;
        }

        let haystack = format!(
            "{} {}",
            leaf.title.to_lowercase(),
            leaf.summary.as_deref().unwrap_or("").to_lowercase()
        );
        let matched: Vec<String> = self
            .config
            .keywords_for(family)
            .iter()
            .map(|k| k.to_lowercase())
            .filter(|k| haystack.contains(k.as_str()))
            .collect();

        let leaf_title = leaf.title.to_lowercase();
        let title_hits = title
            .unwrap_or("")
            .to_lowercase()
            .split_whitespace()
            .filter(|w| w.len() > 3 && leaf_title.contains(*w))
            .count();

        Some(ScoredLeaf {
            leaf,
            score: relevance.confidence + matched.len() as f64 + 0.5 * title_hits as f64,
            matched,
        })
    }

    /// Leaves attributed to a node, best first within each kind
    ///
    /// Only leaves of the node's jurisdiction are considered. Ties on score
    /// go to the more recent year, then to listing order. Each kind is cut
    /// to its configured cap.
    pub fn attribute<'a>(&self, key: &NodeKey, title: Option<&str>, leaves: &'a [Leaf]) -> Vec<ScoredLeaf<'a>> {
        let mut out = Vec::new();
        for kind in LeafKind::ALL {
            let mut scored: Vec<ScoredLeaf<'a>> = leaves
                .iter()
                .filter(|l| l.kind == kind && l.jurisdiction == key.jurisdiction)
                .filter_map(|l| self.score(l, key.family, title))
                .collect();
            scored.sort_by(|a, b| b.score.total_cmp(&a.score).then(b.leaf.year.cmp(&a.leaf.year)));
            scored.truncate(self.cap(kind));
            out.extend(scored);
        }
        out
    }

    /// Append attributed citations to a candidate record
    ///
    /// The record is replaced by its normalized form. Records that do not
    /// name a node or carry no citation list are left as they are, for the
    /// validator to report. Returns the number of citations added.
    pub fn enrich(&self, record: &mut Value, leaves: &[Leaf]) -> usize {
        let Ok(mut normalized) = normalize(record) else {
            return 0;
        };
        let Some(key) = record_key(&normalized) else {
            return 0;
        };
        let title = normalized.get("title").and_then(Value::as_str).map(str::to_string);
        let attributed = self.attribute(&key, title.as_deref(), leaves);

        let Some(citations) = normalized.get_mut("citations").and_then(Value::as_array_mut) else {
            return 0;
        };
        let mut present: BTreeSet<String> = citations
            .iter()
            .filter_map(|c| c.get("text").and_then(Value::as_str))
            .map(str::to_string)
            .collect();

        let mut added = 0;
        for scored in attributed {
            let leaf = scored.leaf;
            if !present.insert(leaf.citation.clone()) {
                continue;
            }
            let mut citation = json!({
                "text": leaf.citation,
                "source_url": leaf.url,
                "authority_type": leaf.kind.authority_type().as_str(),
            });
            if let Some(day) = leaf.retrieved_on {
                citation["verified_on"] = Value::String(day.to_string());
            }
            citations.push(citation);
            added += 1;
        }

        debug!("Attributed {} leaves to {}", added, key);
        *record = normalized;
        added
    }

    fn cap(&self, kind: LeafKind) -> usize {
        match kind {
            LeafKind::Statute => self.config.max_statutes,
            LeafKind::Rule => self.config.max_rules,
            LeafKind::Case => self.config.max_cases,
        }
    }
}

fn first_match<'a>(keywords: &'a [String], text: &str) -> Option<&'a str> {
    keywords
        .iter()
        .map(String::as_str)
        .find(|k| text.contains(k.to_lowercase().as_str()))
}

fn record_key(record: &Value) -> Option<NodeKey> {
    let jurisdiction = Jurisdiction::new(record.get("jurisdiction")?.as_str()?).ok()?;
    let family = NodeFamily::parse(record.get("family")?.as_str()?)?;
    let sequence = u32::try_from(record.get("sequence")?.as_u64()?).ok()?;
    Some(NodeKey::new(jurisdiction, family, sequence))
}
