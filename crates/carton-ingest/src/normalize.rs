//! Coercion of crawler output into the input record shape
//!
//! Crawlers emit several historical field spellings (`state`, `node_family`,
//! `subnode`, `citation_text`, `url`, `last_verified`, ...) and nest
//! citations inside the layer they were found under. Normalization renames
//! and lifts those into the canonical record. It never invents values and
//! leaves anything it cannot interpret in place for the validator to report.

use carton_domain::{AuthorityType, Issue, IssueCode, Jurisdiction, LayerName, NodeKey, Slot};
use serde_json::{Map, Value};

/// Per-layer lists whose entries are citations rather than catalog ids
const NESTED_CITATION_LISTS: [&str; 4] = ["primary_citations", "citations", "regulations_applicable", "key_cases"];

/// Top-level fields carried through unchanged
const PASS_THROUGH: [&str; 3] = ["tombstones", "supersedes", "captures"];

/// Map an authority-type spelling onto the closed set
pub fn authority_alias(s: &str) -> Option<AuthorityType> {
    let key = s.trim().to_ascii_lowercase().replace(['-', ' '], "_");
    if let Some(t) = AuthorityType::parse(&key) {
        return Some(t);
    }
    match key.as_str() {
        "constitutional" | "state_constitution" | "federal_constitution" | "constitutional_provision" => {
            Some(AuthorityType::Constitution)
        }
        "state_statute" | "federal_statute" | "statutory" | "code" | "usc" => Some(AuthorityType::Statute),
        "administrative_rule" | "admin_rule" | "federal_regulation" | "state_regulation" | "cfr" | "rule" => {
            Some(AuthorityType::Regulation)
        }
        "case_law" | "caselaw" | "opinion" | "court_opinion" => Some(AuthorityType::Case),
        "guidance" | "manual" | "policy_manual" => Some(AuthorityType::Policy),
        _ => None,
    }
}

/// Map a layer spelling onto the fixed layer set
pub fn layer_alias(s: &str) -> Option<LayerName> {
    let key = s.trim().to_ascii_lowercase().replace(['-', ' '], "_");
    if let Some(layer) = LayerName::parse(&key) {
        return Some(layer);
    }
    match key.as_str() {
        "constitution" | "federal_constitutional" => Some(LayerName::Constitutional),
        "federal_statutory" | "federal_law" => Some(LayerName::Federal),
        "state_constitution" => Some(LayerName::StateConstitutional),
        "state_statute" | "statutory" => Some(LayerName::StateStatutory),
        "administrative" | "admin_rule" | "administrative_rules" | "regulations" => Some(LayerName::AdministrativeRule),
        "case" | "cases" => Some(LayerName::CaseLaw),
        _ => None,
    }
}

fn default_authority(layer: LayerName) -> AuthorityType {
    match layer {
        LayerName::Constitutional | LayerName::StateConstitutional => AuthorityType::Constitution,
        LayerName::Federal | LayerName::StateStatutory => AuthorityType::Statute,
        LayerName::AdministrativeRule => AuthorityType::Regulation,
        LayerName::CaseLaw => AuthorityType::Case,
    }
}

fn malformed(path: &str, message: impl Into<String>) -> Issue {
    Issue::error(IssueCode::MalformedInput, path, message)
}

/// First present alias; an error when two aliases disagree
fn pick<'v>(obj: &'v Map<String, Value>, names: &[&str], path: &str) -> Result<Option<&'v Value>, Issue> {
    let mut found: Option<(&str, &Value)> = None;
    for name in names {
        let Some(value) = obj.get(*name).filter(|v| !v.is_null()) else {
            continue;
        };
        match found {
            Some((first, seen)) if seen != value => {
                return Err(malformed(
                    path,
                    format!("{} = {} disagrees with {} = {}", first, seen, name, value),
                ));
            }
            Some(_) => {}
            None => found = Some((name, value)),
        }
    }
    Ok(found.map(|(_, v)| v))
}

/// Normalize one raw candidate record
///
/// Fails only when the record is not an object or its aliases contradict
/// each other; every other problem is left for validation.
pub fn normalize(raw: &Value) -> Result<Value, Issue> {
    let obj = raw
        .as_object()
        .ok_or_else(|| malformed("$", "Record must be a JSON object"))?;
    let mut out = Map::new();

    if let Some(v) = pick(obj, &["jurisdiction", "state"], "$.jurisdiction")? {
        let coerced = v
            .as_str()
            .and_then(|s| Jurisdiction::new(s).ok())
            .map(|j| Value::String(j.as_str().to_string()))
            .unwrap_or_else(|| v.clone());
        out.insert("jurisdiction".into(), coerced);
    }

    if let Some(v) = pick(obj, &["family", "node_family"], "$.family")? {
        let coerced = match v.as_str() {
            Some(s) => Value::String(s.trim().to_ascii_uppercase()),
            None => v.clone(),
        };
        out.insert("family".into(), coerced);
    }

    if let Some(v) = pick(obj, &["sequence", "subnode"], "$.sequence")? {
        normalize_sequence(v, &mut out)?;
    }

    if let Some(v) = pick(obj, &["title", "trigger_name"], "$.title")? {
        out.insert("title".into(), v.clone());
    }

    let mut citations: Vec<Value> = Vec::new();
    let mut has_citations = false;
    match obj.get("citations") {
        Some(Value::Array(items)) => {
            has_citations = true;
            citations.extend(items.iter().map(|c| normalize_citation(c, None)));
        }
        Some(other) => {
            // Wrong shape; the validator reports it
            out.insert("citations".into(), other.clone());
        }
        None => {}
    }

    match obj.get("layers") {
        Some(Value::Object(layers)) => {
            let (normalized, lifted) = normalize_layers(layers);
            has_citations |= !lifted.is_empty();
            citations.extend(lifted);
            out.insert("layers".into(), Value::Object(normalized));
        }
        Some(other) => {
            out.insert("layers".into(), other.clone());
        }
        None => {}
    }

    if has_citations {
        let mut unique: Vec<Value> = Vec::with_capacity(citations.len());
        for c in citations {
            if !unique.contains(&c) {
                unique.push(c);
            }
        }
        out.insert("citations".into(), Value::Array(unique));
    }

    // Required like `citations`; a missing map is left for the validator to report
    let refs = match obj.get("cross_references") {
        Some(Value::Object(map)) => Some(Value::Object(
            map.iter()
                .map(|(relation, targets)| {
                    let targets = match targets {
                        Value::String(_) => Value::Array(vec![targets.clone()]),
                        other => other.clone(),
                    };
                    (relation.trim().to_ascii_lowercase(), targets)
                })
                .collect(),
        )),
        other => other.cloned(),
    };
    if let Some(refs) = refs {
        out.insert("cross_references".into(), refs);
    }

    for field in PASS_THROUGH {
        if let Some(v) = obj.get(field) {
            out.insert(field.into(), v.clone());
        }
    }

    Ok(Value::Object(out))
}

/// Accept `3`, `"03"`, `"DEC-03"` and `"TX_DEC-03"`
fn normalize_sequence(value: &Value, out: &mut Map<String, Value>) -> Result<(), Issue> {
    let Some(s) = value.as_str().map(str::trim) else {
        out.insert("sequence".into(), value.clone());
        return Ok(());
    };

    if !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) {
        let n: u64 = s
            .parse()
            .map_err(|_| malformed("$.sequence", format!("Sequence {:?} is out of range", s)))?;
        out.insert("sequence".into(), Value::from(n));
        return Ok(());
    }

    let (jurisdiction, slot) = if s.contains('_') {
        let key = NodeKey::parse(s).map_err(|e| malformed("$.sequence", e))?;
        (Some(key.jurisdiction.clone()), key.slot())
    } else {
        (None, Slot::parse(s).map_err(|e| malformed("$.sequence", e))?)
    };

    if let Some(j) = jurisdiction {
        merge_field(out, "jurisdiction", Value::String(j.as_str().to_string()))?;
    }
    merge_field(out, "family", Value::String(slot.family.as_str().to_string()))?;
    out.insert("sequence".into(), Value::from(slot.sequence));
    Ok(())
}

fn merge_field(out: &mut Map<String, Value>, field: &str, value: Value) -> Result<(), Issue> {
    match out.get(field) {
        Some(existing) if *existing != value => Err(malformed(
            &format!("$.{}", field),
            format!("{} disagrees with the {} encoded in the node id ({})", existing, field, value),
        )),
        Some(_) => Ok(()),
        None => {
            out.insert(field.to_string(), value);
            Ok(())
        }
    }
}

fn first_str<'v>(obj: &'v Map<String, Value>, names: &[&str]) -> Option<&'v Value> {
    names.iter().find_map(|n| obj.get(*n).filter(|v| !v.is_null()))
}

fn normalize_citation(item: &Value, default_type: Option<AuthorityType>) -> Value {
    let Some(obj) = item.as_object() else {
        return item.clone();
    };
    let mut out = Map::new();

    if let Some(text) = first_str(obj, &["text", "citation_text", "citation_full", "citation", "title"]) {
        out.insert("text".into(), text.clone());
    }
    if let Some(url) = first_str(obj, &["source_url", "url"]) {
        out.insert("source_url".into(), url.clone());
    }

    let authority = match first_str(obj, &["authority_type", "type"]) {
        Some(Value::String(s)) => Some(
            authority_alias(s)
                .map(|t| Value::String(t.as_str().to_string()))
                .unwrap_or_else(|| Value::String(s.clone())),
        ),
        Some(other) => Some(other.clone()),
        None => default_type.map(|t| Value::String(t.as_str().to_string())),
    };
    if let Some(authority) = authority {
        out.insert("authority_type".into(), authority);
    }

    if let Some(date) = first_str(obj, &["verified_on", "last_verified"]) {
        let coerced = match date.as_str() {
            // Timestamps keep only their date part
            Some(s) if s.len() > 10 && s.is_char_boundary(10) => Value::String(s[..10].to_string()),
            _ => date.clone(),
        };
        out.insert("verified_on".into(), coerced);
    }

    Value::Object(out)
}

/// Canonical layer map plus citations lifted out of it
fn normalize_layers(layers: &Map<String, Value>) -> (Map<String, Value>, Vec<Value>) {
    let mut out = Map::new();
    let mut lifted = Vec::new();

    for (name, body) in layers {
        let layer = layer_alias(name);
        let Some(body) = body.as_object() else {
            out.insert(name.clone(), body.clone());
            continue;
        };

        for list in NESTED_CITATION_LISTS {
            if let Some(Value::Array(items)) = body.get(list) {
                let default_type = match (list, layer) {
                    ("regulations_applicable", _) => Some(AuthorityType::Regulation),
                    ("key_cases", _) => Some(AuthorityType::Case),
                    (_, Some(layer)) => Some(default_authority(layer)),
                    (_, None) => None,
                };
                lifted.extend(items.iter().map(|c| normalize_citation(c, default_type)));
            }
        }

        let mut content = Map::new();
        for field in ["constraints_triggered", "requirements_applicable", "inherits"] {
            if let Some(v) = body.get(field) {
                content.insert(field.into(), normalize_ids(v));
            }
        }

        match layer {
            Some(layer) if content.is_empty() => {
                tracing::trace!("Dropping empty layer {}", layer.as_str());
            }
            Some(layer) => {
                out.insert(layer.as_str().to_string(), Value::Object(content));
            }
            None => {
                out.insert(name.clone(), Value::Object(content));
            }
        }
    }
    (out, lifted)
}

/// Accept catalog references as bare ids or `{constraint_id: ...}` objects
fn normalize_ids(value: &Value) -> Value {
    let Value::Array(items) = value else {
        return value.clone();
    };
    Value::Array(
        items
            .iter()
            .map(|item| {
                item.as_object()
                    .and_then(|o| first_str(o, &["constraint_id", "requirement_id", "id", "topic"]))
                    .cloned()
                    .unwrap_or_else(|| item.clone())
            })
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_canonical_record_is_unchanged() {
        let record = json!({
            "jurisdiction": "TX",
            "family": "DEC",
            "sequence": 1,
            "citations": [{ "text": "Tex. Fam. Code § 261.301", "authority_type": "statute" }],
            "cross_references": { "leads_to": ["TX_ACT-01"] }
        });
        assert_eq!(normalize(&record).unwrap(), record);
    }

    #[test]
    fn test_crawler_aliases() {
        let raw = json!({
            "state": "United States",
            "node_family": "dec",
            "subnode": "03",
            "trigger_name": "Screen report",
            "citations": [{
                "citation_text": "42 U.S.C. § 5106a",
                "url": "https://uscode.house.gov/view.xhtml?req=5106a",
                "authority_type": "federal_statute",
                "last_verified": "2024-05-01T12:00:00Z"
            }],
            "_metadata": { "leaf_linker_version": "1.0.0" }
        });
        let out = normalize(&raw).unwrap();
        assert_eq!(out["jurisdiction"], "FEDERAL");
        assert_eq!(out["family"], "DEC");
        assert_eq!(out["sequence"], 3);
        assert_eq!(out["title"], "Screen report");
        assert_eq!(out["citations"][0]["text"], "42 U.S.C. § 5106a");
        assert_eq!(out["citations"][0]["authority_type"], "statute");
        assert_eq!(out["citations"][0]["verified_on"], "2024-05-01");
        assert!(out.get("cross_references").is_none());
        assert!(out.get("_metadata").is_none());
    }

    #[test]
    fn test_subnode_carries_identity() {
        let out = normalize(&json!({ "subnode": "AK_INP-01", "citations": [] })).unwrap();
        assert_eq!(out["jurisdiction"], "AK");
        assert_eq!(out["family"], "INP");
        assert_eq!(out["sequence"], 1);
    }

    #[test]
    fn test_contradicting_aliases_rejected() {
        let err = normalize(&json!({ "state": "TX", "jurisdiction": "AK" })).unwrap_err();
        assert_eq!(err.code, IssueCode::MalformedInput);
        assert_eq!(err.path, "$.jurisdiction");

        let err = normalize(&json!({ "state": "TX", "subnode": "AK_INP-01" })).unwrap_err();
        assert_eq!(err.path, "$.jurisdiction");

        assert!(normalize(&json!({ "subnode": "STEP-1" })).is_err());
        assert!(normalize(&json!("TX_DEC-01")).is_err());
    }

    #[test]
    fn test_lifts_nested_citations() {
        let raw = json!({
            "state": "AK",
            "node_family": "INP",
            "subnode": 1,
            "layers": {
                "state_statutory": {
                    "primary_citations": [{
                        "citation_text": "Alaska Stat. § 47.17.020",
                        "source_url": "https://www.akleg.gov/basis/statutes.asp#47.17.020"
                    }],
                    "inherits": ["reporting"]
                },
                "administrative_rule": {
                    "regulations_applicable": [{ "title": "7 AAC 54.010", "url": "https://www.akleg.gov/basis/aac.asp" }]
                },
                "case_law": {
                    "search_keywords": ["report"],
                    "key_cases": [{ "citation": "Doe v. State, 123 P.3d 456 (Alaska 2005)", "url": "https://law.justia.com/cases/alaska/x.html" }]
                }
            }
        });
        let out = normalize(&raw).unwrap();
        let citations = out["citations"].as_array().unwrap();
        assert_eq!(citations.len(), 3);
        assert_eq!(citations[0]["authority_type"], "statute");
        assert_eq!(citations[1]["authority_type"], "regulation");
        assert_eq!(citations[2]["authority_type"], "case");
        assert_eq!(out["layers"], json!({ "state_statutory": { "inherits": ["reporting"] } }));
    }

    #[test]
    fn test_catalog_reference_objects() {
        let raw = json!({
            "layers": { "constitution": { "constraints_triggered": [{ "constraint_id": "CONST_4A_SEIZURE", "alignment": "tension" }] } }
        });
        let out = normalize(&raw).unwrap();
        assert_eq!(out["layers"]["constitutional"]["constraints_triggered"], json!(["CONST_4A_SEIZURE"]));
    }

    #[test]
    fn test_required_maps_are_not_invented() {
        let out = normalize(&json!({ "state": "TX", "node_family": "DEC", "subnode": 1 })).unwrap();
        assert!(out.get("citations").is_none());
        assert!(out.get("cross_references").is_none());

        let out = normalize(&json!({ "cross_references": null })).unwrap();
        assert_eq!(out["cross_references"], Value::Null);
    }

    #[test]
    fn test_single_target_wrapped() {
        let out = normalize(&json!({ "cross_references": { "Leads_To": "ACT-01" } })).unwrap();
        assert_eq!(out["cross_references"]["leads_to"], json!(["ACT-01"]));
    }

    #[test]
    fn test_authority_aliases() {
        assert_eq!(authority_alias("State Statute"), Some(AuthorityType::Statute));
        assert_eq!(authority_alias("administrative_rule"), Some(AuthorityType::Regulation));
        assert_eq!(authority_alias("case-law"), Some(AuthorityType::Case));
        assert_eq!(authority_alias("blog"), None);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        fn arb_crawler_record() -> impl Strategy<Value = Value> {
            (
                prop_oneof![Just("TX"), Just("ak"), Just("United States"), Just("US-CA")],
                prop_oneof![Just("INP"), Just("dec"), Just("Act"), Just("FAIL")],
                prop_oneof![
                    (1u32..40).prop_map(|n| json!(n)),
                    (1u32..40).prop_map(|n| json!(format!("{:02}", n))),
                ],
                prop::collection::vec(("[A-Za-z0-9 .§]{1,24}", prop::option::of("https://[a-z]{1,8}\\.gov/[a-z]{0,6}")), 0..4),
            )
                .prop_map(|(state, family, subnode, citations)| {
                    let citations: Vec<Value> = citations
                        .into_iter()
                        .map(|(text, url)| json!({ "citation_text": text, "url": url, "authority_type": "state_statute" }))
                        .collect();
                    json!({
                        "state": state,
                        "node_family": family,
                        "subnode": subnode,
                        "citations": citations,
                        "cross_references": { "leads_to": "ACT-01" }
                    })
                })
        }

        proptest! {
            #[test]
            fn normalized_records_are_canonical(raw in arb_crawler_record()) {
                let out = normalize(&raw).unwrap();
                prop_assert!(out["sequence"].is_u64());
                let jurisdiction = out["jurisdiction"].as_str().unwrap();
                let parsed = Jurisdiction::new(jurisdiction).unwrap();
                prop_assert_eq!(parsed.as_str(), jurisdiction);
                prop_assert!(out["cross_references"]["leads_to"].is_array());
                prop_assert_eq!(normalize(&out).unwrap(), out);
            }

            #[test]
            fn normalize_never_panics(raw in any::<String>()) {
                let _ = normalize(&json!({ "subnode": raw.clone(), "state": raw }));
            }
        }
    }
}
