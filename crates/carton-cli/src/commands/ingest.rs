//! Ingest command implementation.

use crate::cli::IngestArgs;
use crate::commands::{open_engine, read_records};
use crate::config::Config;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use carton_domain::CandidateSource;
use carton_ingest::{Attributor, CrawledPageSource, IngestReport, Leaf, PageCapture};
use serde::de::DeserializeOwned;
use std::fs;
use std::path::Path;
use tracing::info;

/// Execute the ingest command.
///
/// Record files and page captures go through one batch; `--leaves` first
/// attaches attributed statutes, rules and cases to the record files'
/// candidates. The snapshot is
/// saved afterwards unless `--dry-run` was given, even when some records
/// were rejected: accepted records are committed regardless.
pub async fn execute_ingest(args: IngestArgs, config: &Config, formatter: &Formatter) -> Result<IngestReport> {
    if args.files.is_empty() && args.captures.is_none() {
        return Err(CliError::InvalidInput(
            "Give at least one record file or --captures".to_string(),
        ));
    }

    let mut config = config.clone();
    if args.strict {
        config.gatekeeper.block_on_warnings = true;
    }

    let mut candidates = Vec::new();
    for file in &args.files {
        let records = read_records(file)?;
        info!("Read {} records from {}", records.len(), file.display());
        candidates.extend(records);
    }
    if let Some(path) = &args.leaves {
        let leaves: Vec<Leaf> = read_json(path)?;
        let attributor = Attributor::new(config.attribution.clone())?;
        let added: usize = candidates.iter_mut().map(|r| attributor.enrich(r, &leaves)).sum();
        info!("Attributed {} citations from {} leaves", added, leaves.len());
    }
    if let Some(path) = &args.captures {
        let captures: Vec<PageCapture> = read_json(path)?;
        let source = CrawledPageSource::new(captures);
        let records = match source.candidates() {
            Ok(records) => records,
            Err(never) => match never {},
        };
        info!("Extracted {} records from {} page captures", records.len(), source.len());
        candidates.extend(records);
    }

    let engine = open_engine(&config)?;
    let report = engine.ingest(candidates).await?;

    println!("{}", formatter.report(&report)?);

    if args.dry_run {
        info!("Dry run, snapshot left untouched");
    } else {
        engine.snapshot().await?.save(&config.snapshot)?;
    }

    if report.blocks_merge() {
        return Err(CliError::Failed(
            "Batch raised citation conflicts or floor violations".to_string(),
        ));
    }
    Ok(report)
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let contents = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&contents)?)
}
