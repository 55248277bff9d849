//! Sourced legal references

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Kind of authority a citation points at
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthorityType {
    /// Constitutional provision
    Constitution,
    /// Statute
    Statute,
    /// Regulation or administrative rule
    Regulation,
    /// Court decision
    Case,
    /// Agency policy or manual
    Policy,
}

impl AuthorityType {
    /// Get the authority type as used in records
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthorityType::Constitution => "constitution",
            AuthorityType::Statute => "statute",
            AuthorityType::Regulation => "regulation",
            AuthorityType::Case => "case",
            AuthorityType::Policy => "policy",
        }
    }

    /// Parse a canonical authority type
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "constitution" => Some(AuthorityType::Constitution),
            "statute" => Some(AuthorityType::Statute),
            "regulation" => Some(AuthorityType::Regulation),
            "case" => Some(AuthorityType::Case),
            "policy" => Some(AuthorityType::Policy),
            _ => None,
        }
    }
}

/// Verification state of a citation's provenance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationStatus {
    /// Source URL checked on a known date
    Verified,
    /// Source URL present but never checked
    Unverified,
    /// No source URL at all
    Provisional,
}

/// A single sourced legal reference
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Citation {
    /// Human-readable citation string, verbatim from the source
    pub text: String,

    /// Where the citation text was retrieved from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,

    /// Kind of authority
    pub authority_type: AuthorityType,

    /// Date the source was last verified (absent = unverified)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verified_on: Option<NaiveDate>,
}

impl Citation {
    /// Create an unverified citation with a source URL
    pub fn new(text: impl Into<String>, source_url: impl Into<String>, authority_type: AuthorityType) -> Self {
        Self {
            text: text.into(),
            source_url: Some(source_url.into()),
            authority_type,
            verified_on: None,
        }
    }

    /// Create a provisional citation with no source
    pub fn provisional(text: impl Into<String>, authority_type: AuthorityType) -> Self {
        Self {
            text: text.into(),
            source_url: None,
            authority_type,
            verified_on: None,
        }
    }

    /// Mark the citation verified on a date
    pub fn verified(mut self, on: NaiveDate) -> Self {
        self.verified_on = Some(on);
        self
    }

    /// A citation with no source URL is provisional
    pub fn is_provisional(&self) -> bool {
        self.source_url.as_deref().map_or(true, |url| url.trim().is_empty())
    }

    /// Current verification state
    pub fn status(&self) -> VerificationStatus {
        if self.is_provisional() {
            VerificationStatus::Provisional
        } else if self.verified_on.is_some() {
            VerificationStatus::Verified
        } else {
            VerificationStatus::Unverified
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provisional_citation() {
        let c = Citation::provisional("Alaska Stat. § 47.17.020", AuthorityType::Statute);
        assert!(c.is_provisional());
        assert_eq!(c.status(), VerificationStatus::Provisional);
    }

    #[test]
    fn test_blank_url_is_provisional() {
        let mut c = Citation::new("42 U.S.C. § 5106a", "https://www.law.cornell.edu/uscode/text/42/5106a", AuthorityType::Statute);
        assert_eq!(c.status(), VerificationStatus::Unverified);
        c.source_url = Some("  ".to_string());
        assert!(c.is_provisional());
    }

    #[test]
    fn test_verified_status() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
        let c = Citation::new("Tex. Fam. Code § 261.101", "https://statutes.capitol.texas.gov/Docs/FA/htm/FA.261.htm", AuthorityType::Statute)
            .verified(date);
        assert_eq!(c.status(), VerificationStatus::Verified);
    }

    #[test]
    fn test_citation_serde_omits_absent_fields() {
        let c = Citation::provisional("Alaska Stat. § 47.17.020", AuthorityType::Statute);
        let json = serde_json::to_value(&c).unwrap();
        assert!(json.get("source_url").is_none());
        assert_eq!(json["authority_type"], "statute");
    }
}
