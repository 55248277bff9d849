//! Gatekeeper configuration

use carton_domain::Severity;
use serde::{Deserialize, Serialize};

/// Configuration for validation rules
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Regex patterns a citation URL host must match to count as authoritative
    pub trusted_domains: Vec<String>,

    /// Check layer declarations against the authority catalog
    pub validate_catalog_references: bool,

    /// Check that failure modes and oversight edges target the right families
    pub validate_edge_families: bool,

    /// Treat warnings (such as provisional citations) as blocking
    pub block_on_warnings: bool,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            trusted_domains: vec![
                r"(^|\.)gov$".to_string(),
                // The locality namespace of .us, e.g. legis.state.tx.us
                r"(^|\.)(state|courts)\.[a-z]{2}\.us$".to_string(),
                r"(^|\.)(ci|co)\.[a-z\-]+\.[a-z]{2}\.us$".to_string(),
                r"^(law|regulations|cases)\.justia\.com$".to_string(),
                r"^(www\.)?law\.cornell\.edu$".to_string(),
                r"^(www\.)?courtlistener\.com$".to_string(),
            ],
            validate_catalog_references: true,
            validate_edge_families: true,
            block_on_warnings: false,
        }
    }
}

impl ValidationConfig {
    /// Create a permissive configuration: any host, no catalog checks
    pub fn permissive() -> Self {
        Self {
            trusted_domains: vec![".*".to_string()],
            validate_catalog_references: false,
            validate_edge_families: false,
            block_on_warnings: false,
        }
    }

    /// Create a strict configuration: provisional citations block the record
    pub fn strict() -> Self {
        Self {
            block_on_warnings: true,
            ..Self::default()
        }
    }

    /// Lowest severity that keeps a record out of the graph
    pub fn threshold(&self) -> Severity {
        if self.block_on_warnings {
            Severity::Warning
        } else {
            Severity::Error
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.trusted_domains.is_empty() {
            return Err("trusted_domains must list at least one pattern".to_string());
        }
        if let Some(blank) = self.trusted_domains.iter().find(|p| p.trim().is_empty()) {
            return Err(format!("trusted_domains contains a blank pattern: {:?}", blank));
        }
        Ok(())
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
