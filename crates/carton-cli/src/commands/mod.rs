//! Command implementations.

pub mod check;
pub mod diff;
pub mod ingest;
pub mod init;
pub mod show;
pub mod traverse;
pub mod validate;

pub use self::check::execute_check;
pub use self::diff::execute_diff;
pub use self::ingest::execute_ingest;
pub use self::init::execute_init;
pub use self::show::execute_show;
pub use self::traverse::execute_traverse;
pub use self::validate::execute_validate;

use crate::config::Config;
use crate::error::{CliError, Result};
use carton_domain::NodeKey;
use carton_gatekeeper::SchemaValidator;
use carton_ingest::Engine;
use carton_store::Snapshot;
use serde_json::Value;
use std::fs;
use std::path::Path;

/// Build an engine over the configured snapshot.
pub fn open_engine(config: &Config) -> Result<Engine> {
    let catalog = config.load_catalog()?;
    let validator = SchemaValidator::new(config.gatekeeper.clone())?;
    let snapshot = Snapshot::load(&config.snapshot)?;
    Ok(Engine::from_snapshot(snapshot, validator, catalog, config.ingest.clone())?)
}

/// Read a JSON file holding one record or an array of records.
pub fn read_records(path: &Path) -> Result<Vec<Value>> {
    let contents = fs::read_to_string(path)?;
    match serde_json::from_str(&contents)? {
        Value::Array(records) => Ok(records),
        record @ Value::Object(_) => Ok(vec![record]),
        _ => Err(CliError::InvalidInput(format!(
            "{} must hold a record or an array of records",
            path.display()
        ))),
    }
}

/// Parse a node key argument.
pub fn parse_key(input: &str) -> Result<NodeKey> {
    NodeKey::parse(input).map_err(CliError::InvalidInput)
}
