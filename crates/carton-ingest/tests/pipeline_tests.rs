//! End-to-end ingestion of crawler-shaped batches

use carton_domain::{AuthorityCatalog, IssueCode, Jurisdiction, NodeKey, Relation};
use carton_gatekeeper::{SchemaValidator, ValidationConfig};
use carton_ingest::{Engine, IngestConfig, RecordStatus};
use carton_store::Snapshot;
use serde_json::{json, Value};

fn key(s: &str) -> NodeKey {
    NodeKey::parse(s).unwrap()
}

fn engine_from(snapshot: Snapshot) -> Engine {
    Engine::from_snapshot(
        snapshot,
        SchemaValidator::new(ValidationConfig::default()).unwrap(),
        AuthorityCatalog::new("empty"),
        IngestConfig::default(),
    )
    .unwrap()
}

/// Records as the crawlers write them, including their metadata block
fn crawled(subnode: &str, leads_to: &[&str], triggered_by: &[&str], citation: Option<(&str, &str)>) -> Value {
    let citations: Vec<Value> = citation
        .map(|(text, url)| {
            json!({
                "citation_text": text,
                "url": url,
                "type": "federal_statute",
                "last_verified": "2024-05-01T00:00:00Z"
            })
        })
        .into_iter()
        .collect();
    json!({
        "subnode": subnode,
        "trigger_name": format!("Stage {}", subnode),
        "citations": citations,
        "cross_references": { "leads_to": leads_to, "triggered_by": triggered_by },
        "_metadata": { "crawler": "fixture" }
    })
}

fn federal_batch() -> Vec<Value> {
    vec![
        crawled(
            "FEDERAL_INP-01",
            &["DEC-01"],
            &[],
            Some(("42 U.S.C. § 5106a", "https://uscode.house.gov/view.xhtml?req=5106a")),
        ),
        crawled("FEDERAL_DEC-01", &["ACT-01"], &["INP-01"], None),
        crawled("FEDERAL_ACT-01", &[], &["DEC-01"], None),
        crawled("FEDERAL_ACT-02", &[], &[], None),
    ]
}

#[tokio::test]
async fn test_override_precedence_from_crawled_records() {
    let engine = engine_from(Snapshot::default());

    let mut batch = federal_batch();
    batch.extend([
        crawled("TX_INP-01", &[], &[], None),
        crawled("TX_DEC-01", &["ACT-02"], &[], None),
        crawled("TX_ACT-01", &[], &[], None),
        crawled("TX_ACT-02", &[], &["DEC-01"], None),
    ]);
    let report = engine.ingest(batch).await.unwrap();

    assert_eq!(report.accepted.len(), 8, "{}", report.summary());
    assert!(!report.blocks_merge());

    let graph = engine.graph().await.unwrap();
    assert_eq!(graph.neighbors(&key("TX_DEC-01"), Relation::LeadsTo), vec![key("TX_ACT-02")]);
    assert!(report
        .links
        .discarded_inherited
        .iter()
        .any(|d| d.edge.node == key("TX_DEC-01") && d.baseline_target == key("FEDERAL_ACT-01")));
    assert!(engine.check_consistency().await.unwrap().is_empty());

    let intake = engine.get_node(&key("FEDERAL_INP-01")).await.unwrap().unwrap();
    assert_eq!(intake.title.as_deref(), Some("Stage FEDERAL_INP-01"));
    assert_eq!(intake.citations[0].verified_on.map(|d| d.to_string()).as_deref(), Some("2024-05-01"));
}

#[tokio::test]
async fn test_untrusted_source_rejected_alongside_good_records() {
    let engine = engine_from(Snapshot::default());
    let mut batch = federal_batch();
    batch.push(crawled(
        "FEDERAL_OUT-01",
        &[],
        &[],
        Some(("42 U.S.C. § 675", "https://example-blog.com/foster-care")),
    ));

    let report = engine.ingest(batch).await.unwrap();
    assert_eq!(report.accepted.len(), 4);
    assert_eq!(report.rejected.len(), 1);
    assert_eq!(report.rejected[0].status, RecordStatus::Rejected);
    assert!(report.rejected[0].has(IssueCode::UntrustedSource));
}

#[tokio::test]
async fn test_snapshot_file_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("graph.json");

    let engine = engine_from(Snapshot::load(&path).unwrap());
    engine.ingest(federal_batch()).await.unwrap();
    engine.snapshot().await.unwrap().save(&path).unwrap();

    let restarted = engine_from(Snapshot::load(&path).unwrap());
    let report = restarted.ingest(federal_batch()).await.unwrap();
    assert_eq!(report.unchanged.len(), 4);
    assert!(report.accepted.is_empty());
    assert_eq!(
        restarted.graph().await.unwrap().shard(&Jurisdiction::federal()).unwrap().len(),
        4
    );
}
