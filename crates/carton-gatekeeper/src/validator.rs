//! Record validation logic

use crate::{GatekeeperError, ValidationConfig};
use carton_domain::{
    AuthorityCatalog, AuthorityType, Citation, CrossReferences, DecisionNode, EdgeTombstone, Issue, IssueCode,
    Jurisdiction, LayerContent, LayerName, NodeFamily, NodeKey, Relation, Severity,
};
use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use std::sync::LazyLock;

static URL_HOST: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^https?://(?:[^/@?#]*@)?([^/:?#]+)").expect("static regex"));

/// Lower-cased host of an http(s) URL
pub fn url_host(url: &str) -> Option<String> {
    URL_HOST
        .captures(url.trim())
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_ascii_lowercase())
}

/// Result of record validation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    /// True when no error-severity issue was found
    pub ok: bool,

    /// Every issue found, warnings included
    pub errors: Vec<Issue>,
}

impl ValidationResult {
    /// Build a result from collected issues
    pub fn from_issues(errors: Vec<Issue>) -> Self {
        let ok = !errors.iter().any(|i| i.severity == Severity::Error);
        Self { ok, errors }
    }

    /// Whether any issue is at or above the threshold
    pub fn blocks(&self, threshold: Severity) -> bool {
        self.errors.iter().any(|i| i.severity >= threshold)
    }

    /// Whether any issue carries the code
    pub fn has(&self, code: IssueCode) -> bool {
        self.errors.iter().any(|i| i.code == code)
    }

    /// Warning-severity issues
    pub fn warnings(&self) -> impl Iterator<Item = &Issue> {
        self.errors.iter().filter(|i| i.severity == Severity::Warning)
    }
}

/// A validation result together with the typed node, when the record parsed
#[derive(Debug, Clone)]
pub struct Checked {
    /// Issues found
    pub result: ValidationResult,
    /// Parsed node; `None` when the record is structurally malformed
    pub node: Option<DecisionNode>,
}

/// Validates candidate records against the node schema and the catalog
pub struct SchemaValidator {
    config: ValidationConfig,
    trusted: Vec<Regex>,
}

impl SchemaValidator {
    /// Create a validator, compiling the trusted-domain patterns
    pub fn new(config: ValidationConfig) -> Result<Self, GatekeeperError> {
        config.validate().map_err(GatekeeperError::Config)?;
        let trusted = config
            .trusted_domains
            .iter()
            .map(|pattern| {
                Regex::new(pattern).map_err(|source| GatekeeperError::Pattern {
                    pattern: pattern.clone(),
                    source,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { config, trusted })
    }

    /// Active configuration
    pub fn config(&self) -> &ValidationConfig {
        &self.config
    }

    /// Validate a raw record
    pub fn validate(&self, record: &Value, catalog: &AuthorityCatalog) -> ValidationResult {
        self.check(record, catalog).result
    }

    /// Validate a raw record and return the parsed node alongside the issues
    pub fn check(&self, record: &Value, catalog: &AuthorityCatalog) -> Checked {
        let mut parser = RecordParser::default();
        let node = parser.parse(record);
        let mut issues = parser.issues;
        if let Some(node) = &node {
            issues.extend(self.validate_node(node, catalog));
        }
        Checked {
            result: ValidationResult::from_issues(issues),
            node,
        }
    }

    /// Typed checks on an already-parsed node
    pub fn validate_node(&self, node: &DecisionNode, catalog: &AuthorityCatalog) -> Vec<Issue> {
        let mut issues = self.check_citations(&node.citations);
        if self.config.validate_catalog_references {
            issues.extend(check_catalog(node, catalog));
        }
        if self.config.validate_edge_families {
            issues.extend(check_edge_families(node));
        }
        issues
    }

    /// Whether a URL's host matches a trusted-domain pattern
    pub fn is_trusted(&self, url: &str) -> bool {
        url_host(url).is_some_and(|host| self.trusted.iter().any(|re| re.is_match(&host)))
    }

    fn check_citations(&self, citations: &[Citation]) -> Vec<Issue> {
        let mut issues = Vec::new();
        for (i, citation) in citations.iter().enumerate() {
            let path = format!("$.citations[{}].source_url", i);
            match citation.source_url.as_deref().map(str::trim) {
                None | Some("") => issues.push(Issue::warning(
                    IssueCode::ProvisionalCitation,
                    path,
                    format!("{:?} has no source URL and stays provisional", citation.text),
                )),
                Some(url) if !self.is_trusted(url) => issues.push(Issue::error(
                    IssueCode::UntrustedSource,
                    path,
                    format!("{} is not an authoritative source", url),
                )),
                Some(_) => {}
            }
        }
        issues
    }
}

fn check_catalog(node: &DecisionNode, catalog: &AuthorityCatalog) -> Vec<Issue> {
    let topics: BTreeSet<&str> = catalog.entries().map(|e| e.topic.as_str()).collect();
    let mut issues = Vec::new();

    for (layer, content) in &node.layers {
        let fields = [
            ("constraints_triggered", &content.constraints_triggered),
            ("requirements_applicable", &content.requirements_applicable),
        ];
        for (field, ids) in fields {
            let path = format!("$.layers.{}.{}", layer.as_str(), field);
            for id in ids {
                match catalog.get(id) {
                    None => issues.push(Issue::error(
                        IssueCode::UnknownCatalogEntry,
                        path.clone(),
                        format!("{} is not in catalog {}", id, catalog.version()),
                    )),
                    Some(entry) if entry.layer != *layer => issues.push(Issue::error(
                        IssueCode::LayerMismatch,
                        path.clone(),
                        format!("{} belongs to layer {}, declared under {}", id, entry.layer.as_str(), layer.as_str()),
                    )),
                    Some(_) => {}
                }
            }
        }

        for topic in &content.inherits {
            if !topics.contains(topic.as_str()) {
                issues.push(Issue::error(
                    IssueCode::UnknownCatalogEntry,
                    format!("$.layers.{}.inherits", layer.as_str()),
                    format!("Topic {} is not in catalog {}", topic, catalog.version()),
                ));
            }
        }
    }
    issues
}

fn check_edge_families(node: &DecisionNode) -> Vec<Issue> {
    let refs = &node.cross_references;
    let mut issues = Vec::new();

    if !refs.failure_modes.is_empty() && !node.family.can_fail() {
        issues.push(Issue::error(
            IssueCode::MalformedInput,
            "$.cross_references.failure_modes",
            format!("{} nodes cannot declare failure modes", node.family),
        ));
    }
    for target in refs.failure_modes.iter().filter(|t| t.family != NodeFamily::Fail) {
        issues.push(Issue::error(
            IssueCode::MalformedInput,
            "$.cross_references.failure_modes",
            format!("{} is not a FAIL node", target),
        ));
    }
    if !refs.oversees.is_empty() && node.family != NodeFamily::Pmc {
        issues.push(Issue::error(
            IssueCode::MalformedInput,
            "$.cross_references.oversees",
            format!("Only PMC nodes oversee other nodes, not {}", node.family),
        ));
    }
    issues
}

/// Structural pass from JSON to a typed node
#[derive(Default)]
struct RecordParser {
    issues: Vec<Issue>,
}

impl RecordParser {
    fn malformed(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.issues
            .push(Issue::error(IssueCode::MalformedInput, path, message));
    }

    fn parse(&mut self, record: &Value) -> Option<DecisionNode> {
        let Some(obj) = record.as_object() else {
            self.malformed("$", "Record must be a JSON object");
            return None;
        };

        let jurisdiction = self
            .required_str(obj, "jurisdiction")
            .and_then(|s| self.lift("$.jurisdiction", Jurisdiction::new(s)));
        let family = self
            .required_str(obj, "family")
            .and_then(|s| self.lift("$.family", s.parse::<NodeFamily>()));
        let sequence = self.sequence(obj.get("sequence"));
        let title = self.optional_str(obj, "title");
        let supersedes = match obj.get("supersedes") {
            None | Some(Value::Null) => Some(None),
            Some(v) => self.positive(v, "$.supersedes").map(Some),
        };

        let layers = self.layers(obj.get("layers"));
        let citations = match obj.get("citations") {
            Some(Value::Array(items)) => self.citations(items),
            Some(_) => {
                self.malformed("$.citations", "Expected an array");
                None
            }
            None => {
                self.malformed("$.citations", "Missing required field");
                None
            }
        };

        // Targets without a jurisdiction resolve against the record's own
        let home = jurisdiction.clone().unwrap_or_else(Jurisdiction::federal);
        let mut cross_references = match obj.get("cross_references") {
            Some(Value::Object(map)) => self.cross_references(map, &home),
            Some(_) => {
                self.malformed("$.cross_references", "Expected an object");
                None
            }
            None => {
                self.malformed("$.cross_references", "Missing required field");
                None
            }
        };
        if let Some(value) = obj.get("tombstones") {
            match self.tombstones(value, "$.tombstones", &home) {
                Some(tombstones) => {
                    if let Some(refs) = cross_references.as_mut() {
                        refs.tombstones.extend(tombstones);
                    }
                }
                None => cross_references = None,
            }
        }

        let mut node = DecisionNode::new(NodeKey::new(jurisdiction?, family?, sequence?));
        node.title = title?;
        node.layers = layers?;
        node.citations = citations?;
        node.cross_references = cross_references?;
        node.supersedes = supersedes?;
        Some(node)
    }

    fn lift<T>(&mut self, path: &str, parsed: Result<T, String>) -> Option<T> {
        parsed.map_err(|e| self.malformed(path, e)).ok()
    }

    fn required_str<'v>(&mut self, obj: &'v Map<String, Value>, field: &str) -> Option<&'v str> {
        match obj.get(field) {
            Some(Value::String(s)) if !s.trim().is_empty() => Some(s.as_str()),
            Some(Value::String(_)) => {
                self.malformed(format!("$.{}", field), "Must not be blank");
                None
            }
            Some(_) => {
                self.malformed(format!("$.{}", field), "Expected a string");
                None
            }
            None => {
                self.malformed(format!("$.{}", field), "Missing required field");
                None
            }
        }
    }

    /// `Some(None)` when absent, `None` when present with the wrong type
    fn optional_str(&mut self, obj: &Map<String, Value>, field: &str) -> Option<Option<String>> {
        match obj.get(field) {
            None | Some(Value::Null) => Some(None),
            Some(Value::String(s)) => Some(Some(s.clone())),
            Some(_) => {
                self.malformed(format!("$.{}", field), "Expected a string");
                None
            }
        }
    }

    fn positive(&mut self, value: &Value, path: &str) -> Option<u32> {
        match value.as_u64() {
            Some(n) if n >= 1 && n <= u64::from(u32::MAX) => Some(n as u32),
            _ => {
                self.malformed(path, format!("Expected a positive integer, got {}", value));
                None
            }
        }
    }

    fn sequence(&mut self, value: Option<&Value>) -> Option<u32> {
        match value {
            Some(v) => self.positive(v, "$.sequence"),
            None => {
                self.malformed("$.sequence", "Missing required field");
                None
            }
        }
    }

    fn string_set(&mut self, value: &Value, path: &str) -> Option<BTreeSet<String>> {
        let Some(items) = value.as_array() else {
            self.malformed(path, "Expected an array of strings");
            return None;
        };
        let mut out = BTreeSet::new();
        let mut ok = true;
        for (i, item) in items.iter().enumerate() {
            match item.as_str() {
                Some(s) if !s.trim().is_empty() => {
                    out.insert(s.trim().to_string());
                }
                _ => {
                    self.malformed(format!("{}[{}]", path, i), "Expected a non-blank string");
                    ok = false;
                }
            }
        }
        ok.then_some(out)
    }

    fn layers(&mut self, value: Option<&Value>) -> Option<carton_domain::NodeLayers> {
        let map = match value {
            None | Some(Value::Null) => return Some(Default::default()),
            Some(Value::Object(map)) => map,
            Some(_) => {
                self.malformed("$.layers", "Expected an object keyed by layer name");
                return None;
            }
        };

        let mut layers = carton_domain::NodeLayers::new();
        let mut ok = true;
        for (name, body) in map {
            let path = format!("$.layers.{}", name);
            let Some(layer) = LayerName::parse(name) else {
                self.malformed(path, format!("Unknown layer {:?}", name));
                ok = false;
                continue;
            };
            let Some(body) = body.as_object() else {
                self.malformed(path, "Expected an object");
                ok = false;
                continue;
            };

            let mut content = LayerContent::default();
            for (field, target) in [
                ("constraints_triggered", &mut content.constraints_triggered),
                ("requirements_applicable", &mut content.requirements_applicable),
                ("inherits", &mut content.inherits),
            ] {
                if let Some(v) = body.get(field) {
                    match self.string_set(v, &format!("{}.{}", path, field)) {
                        Some(set) => *target = set,
                        None => ok = false,
                    }
                }
            }
            layers.insert(layer, content);
        }
        ok.then_some(layers)
    }

    fn citations(&mut self, items: &[Value]) -> Option<Vec<Citation>> {
        let mut out = Vec::with_capacity(items.len());
        let mut ok = true;
        for (i, item) in items.iter().enumerate() {
            match self.citation(item, &format!("$.citations[{}]", i)) {
                Some(c) => out.push(c),
                None => ok = false,
            }
        }
        ok.then_some(out)
    }

    fn citation(&mut self, value: &Value, path: &str) -> Option<Citation> {
        let Some(obj) = value.as_object() else {
            self.malformed(path, "Expected a citation object");
            return None;
        };

        let text = match obj.get("text").and_then(Value::as_str) {
            Some(t) if !t.trim().is_empty() => Some(t.to_string()),
            _ => {
                self.malformed(format!("{}.text", path), "Citation text is required");
                None
            }
        };
        let source_url = match obj.get("source_url") {
            None | Some(Value::Null) => Some(None),
            Some(Value::String(s)) if s.trim().is_empty() => Some(None),
            Some(Value::String(s)) => Some(Some(s.trim().to_string())),
            Some(_) => {
                self.malformed(format!("{}.source_url", path), "Expected a string");
                None
            }
        };
        let authority_type = match obj.get("authority_type").and_then(Value::as_str) {
            Some(s) => {
                let parsed = AuthorityType::parse(s).ok_or_else(|| format!("Unknown authority type {:?}", s));
                self.lift(&format!("{}.authority_type", path), parsed)
            }
            None => {
                self.malformed(format!("{}.authority_type", path), "Missing required field");
                None
            }
        };
        let verified_on = match obj.get("verified_on") {
            None | Some(Value::Null) => Some(None),
            Some(Value::String(s)) => {
                let parsed = NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| format!("Invalid date {:?}: {}", s, e));
                self.lift(&format!("{}.verified_on", path), parsed).map(Some)
            }
            Some(_) => {
                self.malformed(format!("{}.verified_on", path), "Expected a YYYY-MM-DD string");
                None
            }
        };

        Some(Citation {
            text: text?,
            source_url: source_url?,
            authority_type: authority_type?,
            verified_on: verified_on?,
        })
    }

    fn cross_references(&mut self, map: &Map<String, Value>, home: &Jurisdiction) -> Option<CrossReferences> {
        let mut refs = CrossReferences::default();
        let mut ok = true;
        for (name, value) in map {
            let path = format!("$.cross_references.{}", name);
            if name == "tombstones" {
                match self.tombstones(value, &path, home) {
                    Some(t) => refs.tombstones.extend(t),
                    None => ok = false,
                }
                continue;
            }
            let Some(relation) = Relation::parse(name) else {
                self.malformed(path, format!("Unknown relation {:?}", name));
                ok = false;
                continue;
            };
            match self.keys(value, &path, home) {
                Some(keys) => *refs.get_mut(relation) = keys,
                None => ok = false,
            }
        }
        ok.then_some(refs)
    }

    fn keys(&mut self, value: &Value, path: &str, home: &Jurisdiction) -> Option<BTreeSet<NodeKey>> {
        let raw = self.string_set(value, path)?;
        let mut out = BTreeSet::new();
        let mut ok = true;
        for s in raw {
            match NodeKey::parse_in(&s, home) {
                Ok(key) => {
                    out.insert(key);
                }
                Err(e) => {
                    self.malformed(path, e);
                    ok = false;
                }
            }
        }
        ok.then_some(out)
    }

    fn tombstones(&mut self, value: &Value, path: &str, home: &Jurisdiction) -> Option<Vec<EdgeTombstone>> {
        let Some(items) = value.as_array() else {
            self.malformed(path, "Expected an array of {relation, target} objects");
            return None;
        };
        let mut out = Vec::new();
        let mut ok = true;
        for (i, item) in items.iter().enumerate() {
            let item_path = format!("{}[{}]", path, i);
            let relation = item
                .get("relation")
                .and_then(Value::as_str)
                .and_then(Relation::parse)
                .filter(|r| Relation::INHERITED.contains(r));
            let target = item.get("target").and_then(Value::as_str).map(|t| NodeKey::parse_in(t, home));
            match (relation, target) {
                (Some(relation), Some(Ok(target))) => out.push(EdgeTombstone { relation, target }),
                (None, _) => {
                    self.malformed(item_path, "Tombstone relation must be leads_to or triggered_by");
                    ok = false;
                }
                (_, Some(Err(e))) => {
                    self.malformed(item_path, e);
                    ok = false;
                }
                (_, None) => {
                    self.malformed(item_path, "Tombstone target is required");
                    ok = false;
                }
            }
        }
        ok.then_some(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use carton_domain::{CatalogEntry, EntryKind};
    use serde_json::json;

    fn validator() -> SchemaValidator {
        SchemaValidator::new(ValidationConfig::default()).unwrap()
    }

    fn catalog() -> AuthorityCatalog {
        AuthorityCatalog::new("fixture-1")
            .with(CatalogEntry::new("CONST_4A_SEIZURE", LayerName::Constitutional, "seizure", 3, EntryKind::Constraint))
            .unwrap()
            .with(CatalogEntry::new("FED_CAPTA", LayerName::Federal, "reporting", 2, EntryKind::Requirement))
            .unwrap()
    }

    fn record() -> Value {
        json!({
            "jurisdiction": "TX",
            "family": "DEC",
            "sequence": 1,
            "title": "Screen report",
            "layers": {
                "constitutional": { "constraints_triggered": ["CONST_4A_SEIZURE"] },
                "state_statutory": { "inherits": ["seizure"] }
            },
            "citations": [{
                "text": "Tex. Fam. Code § 261.301",
                "source_url": "https://statutes.capitol.texas.gov/Docs/FA/htm/FA.261.htm",
                "authority_type": "statute",
                "verified_on": "2024-03-01"
            }],
            "cross_references": {
                "leads_to": ["ACT-02"],
                "triggered_by": ["TX_INP-01"]
            }
        })
    }

    #[test]
    fn test_valid_record() {
        let checked = validator().check(&record(), &catalog());
        assert!(checked.result.ok, "{:?}", checked.result.errors);
        assert!(checked.result.errors.is_empty());

        let node = checked.node.unwrap();
        assert_eq!(node.key(), NodeKey::parse("TX_DEC-01").unwrap());
        assert!(node.cross_references.leads_to.contains(&NodeKey::parse("TX_ACT-02").unwrap()));
        assert_eq!(node.citations[0].verified_on, NaiveDate::from_ymd_opt(2024, 3, 1));
    }

    #[test]
    fn test_non_object_record() {
        let result = validator().validate(&json!([1, 2]), &catalog());
        assert!(!result.ok);
        assert_eq!(result.errors[0].path, "$");
    }

    #[test]
    fn test_missing_fields_reported_together() {
        let result = validator().validate(&json!({ "jurisdiction": "TX" }), &catalog());
        let paths: Vec<_> = result.errors.iter().map(|i| i.path.as_str()).collect();
        assert!(paths.contains(&"$.family"));
        assert!(paths.contains(&"$.sequence"));
        assert!(paths.contains(&"$.citations"));
        assert!(paths.contains(&"$.cross_references"));
        assert!(result.errors.iter().all(|i| i.code == IssueCode::MalformedInput));
    }

    #[test]
    fn test_bad_enums() {
        let mut bad = record();
        bad["family"] = json!("STEP");
        bad["citations"][0]["authority_type"] = json!("blog");
        bad["cross_references"]["follows"] = json!([]);
        bad["layers"]["municipal"] = json!({});
        let result = validator().validate(&bad, &catalog());
        assert_eq!(result.errors.len(), 4);
    }

    #[test]
    fn test_zero_sequence_rejected() {
        let mut bad = record();
        bad["sequence"] = json!(0);
        assert!(!validator().validate(&bad, &catalog()).ok);
    }

    #[test]
    fn test_provisional_citation_is_warning() {
        let mut rec = record();
        rec["citations"][0]["source_url"] = Value::Null;
        let result = validator().validate(&rec, &catalog());
        assert!(result.ok);
        assert!(result.has(IssueCode::ProvisionalCitation));
        assert!(!result.blocks(Severity::Error));
        assert!(result.blocks(Severity::Warning));
    }

    #[test]
    fn test_untrusted_source_is_error() {
        let mut rec = record();
        rec["citations"][0]["source_url"] = json!("https://some-legal-blog.com/tx-261");
        let result = validator().validate(&rec, &catalog());
        assert!(!result.ok);
        assert!(result.has(IssueCode::UntrustedSource));
    }

    #[test]
    fn test_trusted_hosts() {
        let v = validator();
        assert!(v.is_trusted("https://www.childwelfare.gov/topics/"));
        assert!(v.is_trusted("https://law.justia.com/codes/texas/family-code/"));
        assert!(v.is_trusted("http://www.legis.state.ak.us/basis/statutes.asp"));
        assert!(!v.is_trusted("https://gov.example.com/"));
        assert!(!v.is_trusted("ftp://uscode.house.gov/"));
        assert!(v.is_trusted("https://www.legis.state.tx.us/"));
        assert!(v.is_trusted("https://www.courts.state.ny.us/"));
        assert!(v.is_trusted("https://www.co.king.wa.us/"));
        assert!(!v.is_trusted("https://legal-blog.us/foster-care"));
        assert!(!v.is_trusted("https://www.anything.us/"));
        assert!(!v.is_trusted("https://state.tx.us.example.com/"));
        assert!(!v.is_trusted("not a url"));
    }

    #[test]
    fn test_url_host() {
        assert_eq!(url_host("HTTPS://Law.Cornell.EDU:443/uscode"), Some("law.cornell.edu".to_string()));
        assert_eq!(url_host("https://user@ecfr.gov/x"), Some("ecfr.gov".to_string()));
        assert_eq!(url_host("mailto:a@b.gov"), None);
    }

    #[test]
    fn test_catalog_checks() {
        let mut rec = record();
        rec["layers"]["state_statutory"] = json!({
            "constraints_triggered": ["TX_UNKNOWN"],
            "requirements_applicable": ["FED_CAPTA"],
            "inherits": ["no_such_topic"]
        });
        let result = validator().validate(&rec, &catalog());
        assert!(result.has(IssueCode::UnknownCatalogEntry));
        assert!(result.has(IssueCode::LayerMismatch));
        assert_eq!(result.errors.len(), 3);

        let permissive = SchemaValidator::new(ValidationConfig::permissive()).unwrap();
        assert!(permissive.validate(&rec, &catalog()).ok);
    }

    #[test]
    fn test_failure_mode_families() {
        let mut rec = record();
        rec["family"] = json!("INP");
        rec["cross_references"]["failure_modes"] = json!(["DEC-02"]);
        let result = validator().validate(&rec, &catalog());
        assert_eq!(result.errors.iter().filter(|i| i.code == IssueCode::MalformedInput).count(), 2);
    }

    #[test]
    fn test_tombstones_both_places() {
        let mut rec = record();
        rec["tombstones"] = json!([{ "relation": "leads_to", "target": "FEDERAL_ACT-01" }]);
        rec["cross_references"]["tombstones"] = json!([{ "relation": "triggered_by", "target": "INP-02" }]);
        let node = validator().check(&rec, &catalog()).node.unwrap();
        assert_eq!(node.cross_references.tombstones.len(), 2);

        rec["tombstones"] = json!([{ "relation": "failure_modes", "target": "FAIL-01" }]);
        assert!(!validator().validate(&rec, &catalog()).ok);
    }

    #[test]
    fn test_bad_pattern_rejected() {
        let config = ValidationConfig {
            trusted_domains: vec!["(".to_string()],
            ..ValidationConfig::default()
        };
        assert!(matches!(SchemaValidator::new(config), Err(GatekeeperError::Pattern { .. })));
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        fn arb_json() -> impl Strategy<Value = Value> {
            let leaf = prop_oneof![
                Just(Value::Null),
                any::<bool>().prop_map(Value::Bool),
                any::<i64>().prop_map(|n| json!(n)),
                "[a-zA-Z_ -]{0,12}".prop_map(Value::String),
            ];
            leaf.prop_recursive(3, 24, 6, |inner| {
                prop_oneof![
                    prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
                    prop::collection::btree_map(
                        prop_oneof![
                            Just("jurisdiction".to_string()),
                            Just("family".to_string()),
                            Just("sequence".to_string()),
                            Just("citations".to_string()),
                            Just("cross_references".to_string()),
                            Just("layers".to_string()),
                            Just("tombstones".to_string()),
                            "[a-z]{1,6}",
                        ],
                        inner,
                        0..6
                    )
                    .prop_map(|m| Value::Object(m.into_iter().collect())),
                ]
            })
        }

        proptest! {
            #[test]
            fn never_panics_and_malformed_means_no_node(value in arb_json()) {
                let checked = validator().check(&value, &catalog());
                if checked.result.has(IssueCode::MalformedInput) && checked.node.is_some() {
                    // Edge-family issues are raised on parsed nodes
                    prop_assert!(checked.result.errors.iter().any(|i| i.path.starts_with("$.cross_references")));
                }
                if checked.node.is_none() {
                    prop_assert!(!checked.result.ok);
                }
            }
        }
    }
}
