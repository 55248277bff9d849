//! Citation extraction from crawled page captures
//!
//! Pages are fetched elsewhere; this module only sees their text. Every
//! emitted citation is a verbatim substring of the page and carries the
//! page URL as its source, so nothing here can invent an authority.

use carton_domain::{AuthorityType, CandidateSource, NodeKey};
use carton_store::content_hash;
use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::convert::Infallible;
use std::sync::LazyLock;
use tracing::debug;

/// Citation shapes recognized in page text, in priority order
static CITATION_PATTERNS: LazyLock<Vec<(Regex, AuthorityType)>> = LazyLock::new(|| {
    vec![
        // 42 U.S.C. § 5106a(b)(2)
        (
            Regex::new(r"\b\d+\s+U\.S\.C\.(?:A\.)?\s*§{1,2}\s*\d+[\w\-]*(?:\(\w+\))*").unwrap(),
            AuthorityType::Statute,
        ),
        // 45 C.F.R. § 1356.21(b)
        (
            Regex::new(r"\b\d+\s+C\.F\.R\.\s*(?:§{1,2}\s*|[Pp]arts?\s+)\d+(?:\.\d+)*[a-z]?(?:\(\w+\))*").unwrap(),
            AuthorityType::Regulation,
        ),
        // U.S. Const. amend. XIV, § 1
        (
            Regex::new(r"U\.S\.\s+Const\.\s+(?:amend\.|art\.)\s+[IVXLC]+(?:,\s*§\s*\d+)?").unwrap(),
            AuthorityType::Constitution,
        ),
        // Alaska Stat. § 47.17.020, Tex. Fam. Code § 261.301, Cal. Welf. & Inst. Code § 300
        (
            Regex::new(
                r"\b(?:Ala\.|Alaska|Ariz\.|Ark\.|Cal\.|Colo\.|Conn\.|Del\.|D\.C\.|Fla\.|Ga\.|Haw\.|Idaho|Ill\.|Ind\.|Iowa|Kan\.|Ky\.|La\.|Me\.|Md\.|Mass\.|Mich\.|Minn\.|Miss\.|Mo\.|Mont\.|Neb\.|Nev\.|N\.H\.|N\.J\.|N\.M\.|N\.Y\.|N\.C\.|N\.D\.|Ohio|Okla\.|Or\.|Pa\.|R\.I\.|S\.C\.|S\.D\.|Tenn\.|Tex\.|Utah|Vt\.|W\.\s+Va\.|Va\.|Wash\.|Wis\.|Wyo\.)\s+(?:[A-Z&][A-Za-z]*\.?\s+){0,4}(?:Stat\.|Code|Gen\.\s+Laws)(?:\s+Ann\.)?\s*§{1,2}\s*\d+[\w.\-:]*(?:\(\w+\))*",
            )
            .unwrap(),
            AuthorityType::Statute,
        ),
        // Santosky v. Kramer, 455 U.S. 745 (1982)
        (
            Regex::new(
                r"\b[A-Z][A-Za-z.'&\-]*(?:\s+(?:of\s+)?[A-Z][A-Za-z.'&\-]*)*\s+v\.\s+[A-Z][A-Za-z.'&\-]*(?:\s+(?:of\s+)?[A-Z][A-Za-z.'&\-]*)*,\s+\d+\s+[A-Z][A-Za-z0-9.\s]{0,20}?\s\d+(?:\s+\([^)]{0,40}\d{4}\))?",
            )
            .unwrap(),
            AuthorityType::Case,
        ),
    ]
});

/// A citation string found on a page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedCitation {
    /// Verbatim citation text
    pub text: String,
    /// Authority type implied by the citation shape
    pub authority_type: AuthorityType,
}

/// Finds citation strings in plain page text
#[derive(Debug, Clone, Copy, Default)]
pub struct CitationExtractor;

impl CitationExtractor {
    /// Create a new extractor
    pub fn new() -> Self {
        Self
    }

    /// Extract citations in page order, without duplicates
    ///
    /// When two shapes match overlapping text the earlier, longer match wins.
    pub fn extract(&self, text: &str) -> Vec<ExtractedCitation> {
        let mut matches: Vec<(usize, usize, AuthorityType)> = CITATION_PATTERNS
            .iter()
            .flat_map(|(pattern, authority_type)| {
                pattern.find_iter(text).map(move |m| (m.start(), m.end(), *authority_type))
            })
            .collect();
        matches.sort_by(|a, b| a.0.cmp(&b.0).then(b.1.cmp(&a.1)));

        let mut found: Vec<ExtractedCitation> = Vec::new();
        let mut last_end = 0;
        for (start, end, authority_type) in matches {
            if start < last_end {
                continue;
            }
            last_end = end;

            let citation = text[start..end].trim_end_matches(['.', ',', ';', ':']).trim();
            if citation.is_empty() || found.iter().any(|c| c.text == citation) {
                continue;
            }
            found.push(ExtractedCitation {
                text: citation.to_string(),
                authority_type,
            });
        }
        found
    }
}

/// One fetched page, already attributed to a decision node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageCapture {
    /// Page URL
    pub url: String,
    /// Day the page was fetched
    pub retrieved_on: NaiveDate,
    /// Plain page text
    pub text: String,
    /// Node the page documents
    pub node: NodeKey,
    /// Node title, when the crawler knows it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl PageCapture {
    /// Hash of the page text, for drift detection
    pub fn content_hash(&self) -> String {
        content_hash(&self.text)
    }
}

/// Candidate producer over a set of page captures
///
/// All captures of one node are folded into a single record. When two
/// pages cite the same text, the first page keeps it.
#[derive(Debug, Clone, Default)]
pub struct CrawledPageSource {
    extractor: CitationExtractor,
    captures: Vec<PageCapture>,
}

impl CrawledPageSource {
    /// Create a source over the given captures
    pub fn new(captures: Vec<PageCapture>) -> Self {
        Self {
            extractor: CitationExtractor::new(),
            captures,
        }
    }

    /// Add a capture
    pub fn push(&mut self, capture: PageCapture) {
        self.captures.push(capture);
    }

    /// Number of captures held
    pub fn len(&self) -> usize {
        self.captures.len()
    }

    /// Check if no captures are held
    pub fn is_empty(&self) -> bool {
        self.captures.is_empty()
    }

    fn record(&self, key: &NodeKey, pages: &[&PageCapture]) -> Option<Value> {
        let mut citations: Vec<Value> = Vec::new();
        let mut seen: Vec<String> = Vec::new();
        let mut captures: Vec<Value> = Vec::new();

        for page in pages {
            let extracted = self.extractor.extract(&page.text);
            if extracted.is_empty() {
                debug!("No citations on {} for {}", page.url, key);
                continue;
            }
            captures.push(json!({ "url": page.url, "content_hash": page.content_hash() }));
            for citation in extracted {
                if seen.contains(&citation.text) {
                    continue;
                }
                citations.push(json!({
                    "text": citation.text,
                    "source_url": page.url,
                    "authority_type": citation.authority_type.as_str(),
                    "verified_on": page.retrieved_on.to_string(),
                }));
                seen.push(citation.text);
            }
        }

        if citations.is_empty() {
            return None;
        }

        let mut record = json!({
            "jurisdiction": key.jurisdiction.as_str(),
            "family": key.family.as_str(),
            "sequence": key.sequence,
            "citations": citations,
            "cross_references": {},
            "captures": captures,
        });
        if let Some(title) = pages.iter().find_map(|p| p.title.as_ref()) {
            record["title"] = Value::String(title.clone());
        }
        Some(record)
    }
}

impl CandidateSource for CrawledPageSource {
    type Error = Infallible;

    fn name(&self) -> &str {
        "crawled-pages"
    }

    fn candidates(&self) -> Result<Vec<Value>, Self::Error> {
        let mut by_node: BTreeMap<&NodeKey, Vec<&PageCapture>> = BTreeMap::new();
        for capture in &self.captures {
            by_node.entry(&capture.node).or_default().push(capture);
        }

        Ok(by_node
            .into_iter()
            .filter_map(|(key, pages)| self.record(key, &pages))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STATUTE_PAGE: &str = "Under Alaska Stat. § 47.17.020, practitioners must report. \
        See also 42 U.S.C. § 5106a(b)(2)(B)(i) and 45 C.F.R. § 1340.14. \
        The court in Doe v. State, 123 P.3d 456 (Alaska 2005) read the duty broadly. \
        Alaska Stat. § 47.17.020 applies to teachers.";

    fn capture(url: &str, text: &str, node: &str) -> PageCapture {
        PageCapture {
            url: url.to_string(),
            retrieved_on: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            text: text.to_string(),
            node: NodeKey::parse(node).unwrap(),
            title: None,
        }
    }

    #[test]
    fn test_extracts_each_shape_once() {
        let found = CitationExtractor::new().extract(STATUTE_PAGE);
        let texts: Vec<&str> = found.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(
            texts,
            vec![
                "Alaska Stat. § 47.17.020",
                "42 U.S.C. § 5106a(b)(2)(B)(i)",
                "45 C.F.R. § 1340.14",
                "Doe v. State, 123 P.3d 456 (Alaska 2005)",
            ]
        );
        assert_eq!(found[0].authority_type, AuthorityType::Statute);
        assert_eq!(found[2].authority_type, AuthorityType::Regulation);
        assert_eq!(found[3].authority_type, AuthorityType::Case);
    }

    #[test]
    fn test_extraction_is_verbatim() {
        for citation in CitationExtractor::new().extract(STATUTE_PAGE) {
            assert!(STATUTE_PAGE.contains(&citation.text));
        }
    }

    #[test]
    fn test_constitution_and_state_code() {
        let text = "Protected by U.S. Const. amend. XIV, § 1 and Tex. Fam. Code § 261.301.";
        let found = CitationExtractor::new().extract(text);
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].text, "U.S. Const. amend. XIV, § 1");
        assert_eq!(found[0].authority_type, AuthorityType::Constitution);
        assert_eq!(found[1].text, "Tex. Fam. Code § 261.301");
    }

    #[test]
    fn test_nothing_found_in_prose() {
        assert!(CitationExtractor::new().extract("Call the hotline to make a report.").is_empty());
    }

    #[test]
    fn test_source_folds_pages_per_node() {
        let source = CrawledPageSource::new(vec![
            capture("https://www.akleg.gov/basis/statutes.asp", STATUTE_PAGE, "AK_INP-01"),
            capture("https://www.akleg.gov/other", "Alaska Stat. § 47.17.020", "AK_INP-01"),
            capture("https://www.akleg.gov/empty", "No citations here.", "AK_INP-02"),
        ]);
        let records = source.candidates().unwrap();
        assert_eq!(records.len(), 1);

        let record = &records[0];
        assert_eq!(record["jurisdiction"], "AK");
        assert_eq!(record["family"], "INP");
        assert_eq!(record["sequence"], 1);
        assert_eq!(record["citations"].as_array().unwrap().len(), 4);
        assert_eq!(record["citations"][0]["source_url"], "https://www.akleg.gov/basis/statutes.asp");
        assert_eq!(record["citations"][0]["verified_on"], "2024-05-01");
        assert_eq!(record["captures"].as_array().unwrap().len(), 2);
        assert_eq!(record["captures"][1]["content_hash"], content_hash("Alaska Stat. § 47.17.020"));
    }
}
