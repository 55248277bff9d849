//! Commands run against a configuration in a scratch directory

use carton_cli::cli::{DiffArgs, IngestArgs, InitArgs, ShowArgs, ValidateArgs};
use carton_cli::commands;
use carton_cli::config::{Config, OutputFormat};
use carton_cli::{CliError, Formatter};
use carton_domain::NodeKey;
use carton_store::Snapshot;
use serde_json::json;
use std::fs;
use std::path::{Path, PathBuf};

fn formatter() -> Formatter {
    Formatter::new(OutputFormat::Json, false)
}

/// Writes an empty catalog and a default config; returns the loaded config
fn workspace(dir: &Path) -> Config {
    fs::write(dir.join("catalog.json"), r#"{"version": "test", "entries": []}"#).unwrap();
    let path = dir.join("carton.toml");
    Config::default().save(&path).unwrap();
    Config::load(&path).unwrap()
}

fn write_federal_batch(dir: &Path) -> PathBuf {
    let batch = json!([
        {
            "subnode": "FEDERAL_INP-01",
            "citations": [{
                "citation_text": "42 U.S.C. § 5106a",
                "url": "https://uscode.house.gov/view.xhtml?req=5106a",
                "type": "federal_statute"
            }],
            "cross_references": { "leads_to": ["DEC-01"] }
        },
        { "subnode": "FEDERAL_DEC-01", "citations": [], "cross_references": { "triggered_by": ["INP-01"] } }
    ]);
    let path = dir.join("federal.json");
    fs::write(&path, batch.to_string()).unwrap();
    path
}

fn ingest_args(files: Vec<PathBuf>) -> IngestArgs {
    IngestArgs {
        files,
        captures: None,
        leaves: None,
        strict: false,
        dry_run: false,
    }
}

#[test]
fn test_init_refuses_to_overwrite() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("carton.toml");

    commands::execute_init(InitArgs { force: false }, &path, &formatter()).unwrap();
    assert!(path.exists());

    let again = commands::execute_init(InitArgs { force: false }, &path, &formatter());
    assert!(matches!(again, Err(CliError::Config(_))));
    commands::execute_init(InitArgs { force: true }, &path, &formatter()).unwrap();
}

#[tokio::test]
async fn test_ingest_saves_snapshot_and_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let config = workspace(dir.path());
    let batch = write_federal_batch(dir.path());

    let report = commands::execute_ingest(ingest_args(vec![batch.clone()]), &config, &formatter())
        .await
        .unwrap();
    assert_eq!(report.accepted.len(), 2, "{}", report.summary());
    assert_eq!(Snapshot::load(&config.snapshot).unwrap().graph.len(), 2);

    let again = commands::execute_ingest(ingest_args(vec![batch]), &config, &formatter())
        .await
        .unwrap();
    assert_eq!(again.unchanged.len(), 2);
    assert!(again.accepted.is_empty());
}

#[tokio::test]
async fn test_ingest_attributes_leaves() {
    let dir = tempfile::tempdir().unwrap();
    let config = workspace(dir.path());
    let leaves = dir.path().join("leaves.json");
    let listing = json!([
        {
            "jurisdiction": "FEDERAL",
            "kind": "statute",
            "citation": "42 U.S.C. § 5101",
            "url": "https://uscode.house.gov/child-abuse/5101",
            "title": "Office on Child Abuse and Neglect"
        },
        {
            "jurisdiction": "FEDERAL",
            "kind": "statute",
            "citation": "26 U.S.C. § 61",
            "url": "https://uscode.house.gov/tax/61",
            "title": "Gross income defined"
        }
    ]);
    fs::write(&leaves, listing.to_string()).unwrap();

    let mut args = ingest_args(vec![write_federal_batch(dir.path())]);
    args.leaves = Some(leaves);
    let report = commands::execute_ingest(args, &config, &formatter()).await.unwrap();
    assert_eq!(report.accepted.len(), 2, "{}", report.summary());

    let graph = Snapshot::load(&config.snapshot).unwrap().graph;
    for k in ["FEDERAL_INP-01", "FEDERAL_DEC-01"] {
        let node = graph.get_node(&NodeKey::parse(k).unwrap()).unwrap();
        assert!(node.citations.iter().any(|c| c.text == "42 U.S.C. § 5101"), "{}", k);
        assert!(node.citations.iter().all(|c| c.text != "26 U.S.C. § 61"));
    }
}

#[tokio::test]
async fn test_dry_run_leaves_no_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    let config = workspace(dir.path());
    let mut args = ingest_args(vec![write_federal_batch(dir.path())]);
    args.dry_run = true;

    let report = commands::execute_ingest(args, &config, &formatter()).await.unwrap();
    assert_eq!(report.accepted.len(), 2);
    assert!(!config.snapshot.exists());
}

#[tokio::test]
async fn test_ingest_needs_input() {
    let dir = tempfile::tempdir().unwrap();
    let config = workspace(dir.path());
    let result = commands::execute_ingest(ingest_args(vec![]), &config, &formatter()).await;
    assert!(matches!(result, Err(CliError::InvalidInput(_))));
}

#[tokio::test]
async fn test_queries_after_ingest() {
    let dir = tempfile::tempdir().unwrap();
    let config = workspace(dir.path());
    commands::execute_ingest(ingest_args(vec![write_federal_batch(dir.path())]), &config, &formatter())
        .await
        .unwrap();

    commands::execute_check(&config, &formatter()).await.unwrap();
    commands::execute_show(
        ShowArgs {
            key: "FEDERAL_INP-01".to_string(),
            history: true,
        },
        &config,
        &formatter(),
    )
    .await
    .unwrap();

    let missing = commands::execute_show(
        ShowArgs {
            key: "TX_INP-01".to_string(),
            history: false,
        },
        &config,
        &formatter(),
    )
    .await;
    assert!(matches!(missing, Err(CliError::InvalidInput(_))));

    let baseline = commands::execute_diff(
        DiffArgs {
            jurisdiction: "United States".to_string(),
        },
        &config,
        &formatter(),
    )
    .await;
    assert!(matches!(baseline, Err(CliError::InvalidInput(_))));
}

#[test]
fn test_validate_flags_untrusted_source() {
    let dir = tempfile::tempdir().unwrap();
    let config = workspace(dir.path());
    let path = dir.path().join("blog.json");
    let record = json!({
        "subnode": "FEDERAL_OUT-01",
        "citations": [{
            "citation_text": "42 U.S.C. § 675",
            "url": "https://example-blog.com/foster-care",
            "type": "federal_statute"
        }]
    });
    fs::write(&path, record.to_string()).unwrap();

    let result = commands::execute_validate(ValidateArgs { file: path }, &config, &formatter());
    assert!(matches!(result, Err(CliError::Failed(_))));
}
