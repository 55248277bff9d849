//! Configuration for the ingestion pipeline

use carton_domain::NodeFamily;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// Configuration for the ingestion pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    /// Maximum records accepted in one batch
    pub max_batch_size: usize,

    /// Jurisdictions staged concurrently after the baseline
    pub max_concurrent_jurisdictions: usize,

    /// Maximum time one jurisdiction may take to stage and commit (seconds)
    pub jurisdiction_timeout_secs: u64,

    /// Compare page content hashes against the last capture of each URL
    pub detect_source_drift: bool,

    /// Re-resolve every state's edges after the baseline changes
    pub relink_on_baseline_change: bool,
}

impl IngestConfig {
    /// Get the per-jurisdiction timeout as a Duration
    pub fn jurisdiction_timeout(&self) -> Duration {
        Duration::from_secs(self.jurisdiction_timeout_secs)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.max_batch_size == 0 {
            return Err("max_batch_size must be greater than 0".to_string());
        }
        if self.max_concurrent_jurisdictions == 0 {
            return Err("max_concurrent_jurisdictions must be greater than 0".to_string());
        }
        if self.jurisdiction_timeout_secs == 0 {
            return Err("jurisdiction_timeout_secs must be greater than 0".to_string());
        }
        Ok(())
    }
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            max_batch_size: 10_000,
            max_concurrent_jurisdictions: 8,
            jurisdiction_timeout_secs: 300,
            detect_source_drift: true,
            relink_on_baseline_change: true,
        }
    }
}

impl IngestConfig {
    /// Permissive preset: large batches, no drift tracking
    pub fn permissive() -> Self {
        Self {
            max_batch_size: 100_000,
            max_concurrent_jurisdictions: 16,
            jurisdiction_timeout_secs: 900,
            detect_source_drift: false,
            relink_on_baseline_change: true,
        }
    }

    /// Strict preset: small batches, short timeouts
    pub fn strict() -> Self {
        Self {
            max_batch_size: 1_000,
            max_concurrent_jurisdictions: 4,
            jurisdiction_timeout_secs: 120,
            detect_source_drift: true,
            relink_on_baseline_change: true,
        }
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, String> {
        toml::from_str(toml_str).map_err(|e| format!("Failed to parse TOML: {}", e))
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, String> {
        toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize to TOML: {}", e))
    }
}

/// Keyword tables and caps for attributing leaf documents to nodes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AttributionConfig {
    /// Keywords per family code, matched case-insensitively against leaf
    /// titles and summaries
    pub family_keywords: BTreeMap<String, Vec<String>>,

    /// Terms that mark a URL or title as child-welfare material
    pub relevance_keywords: Vec<String>,

    /// URL terms that mark a case as coming from a juvenile or family court
    pub court_keywords: Vec<String>,

    /// Most statutes attached to one node
    pub max_statutes: usize,

    /// Most administrative rules attached to one node
    pub max_rules: usize,

    /// Most cases attached to one node
    pub max_cases: usize,
}

impl Default for AttributionConfig {
    fn default() -> Self {
        let table: [(NodeFamily, &[&str]); 6] = [
            (
                NodeFamily::Inp,
                &["mandatory reporter", "hotline", "intake", "report", "referral", "disclosure"],
            ),
            (
                NodeFamily::Dec,
                &[
                    "screen",
                    "investigation",
                    "substantiated",
                    "founded",
                    "unfounded",
                    "emergency removal",
                    "removal",
                    "court petition",
                    "differential response",
                ],
            ),
            (
                NodeFamily::Act,
                &[
                    "removal",
                    "protective custody",
                    "foster care",
                    "kinship",
                    "placement",
                    "in-home services",
                    "case plan",
                    "criminal referral",
                    "closure",
                ],
            ),
            (
                NodeFamily::Out,
                &[
                    "reunification",
                    "termination of parental rights",
                    "tpr",
                    "adoption",
                    "guardianship",
                    "emancipation",
                    "permanency",
                ],
            ),
            (
                NodeFamily::Fail,
                &[
                    "failure to investigate",
                    "wrongful removal",
                    "due process",
                    "abuse in care",
                    "fatality",
                    "wrongful tpr",
                    "non-compliance",
                    "1983",
                    "civil rights",
                ],
            ),
            (
                NodeFamily::Pmc,
                &["oversight", "cfsr", "audit", "citizen review", "transparency", "foia"],
            ),
        ];
        Self {
            family_keywords: table
                .iter()
                .map(|(family, words)| {
                    (
                        family.as_str().to_string(),
                        words.iter().map(|w| w.to_string()).collect(),
                    )
                })
                .collect(),
            relevance_keywords: [
                "child", "juvenile", "minor", "family", "welfare", "abuse", "neglect", "custody", "foster",
                "adoption", "dcf", "dcs", "cps", "dfps", "dcyf", "dhs", "protective",
            ]
            .iter()
            .map(|w| w.to_string())
            .collect(),
            court_keywords: vec!["juvenile".to_string(), "family".to_string()],
            max_statutes: 20,
            max_rules: 10,
            max_cases: 10,
        }
    }
}

impl AttributionConfig {
    /// Keywords configured for one family
    pub fn keywords_for(&self, family: NodeFamily) -> &[String] {
        self.family_keywords
            .iter()
            .find(|(code, _)| NodeFamily::parse(code) == Some(family))
            .map(|(_, words)| words.as_slice())
            .unwrap_or(&[])
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if let Some(code) = self.family_keywords.keys().find(|k| NodeFamily::parse(k).is_none()) {
            return Err(format!("family_keywords names unknown family {:?}", code));
        }
        if self.relevance_keywords.is_empty() {
            return Err("relevance_keywords must list at least one term".to_string());
        }
        let blank = self
            .family_keywords
            .values()
            .flatten()
            .chain(&self.relevance_keywords)
            .chain(&self.court_keywords)
            .any(|w| w.trim().is_empty());
        if blank {
            return Err("keyword lists contain a blank entry".to_string());
        }
        Ok(())
    }
}
