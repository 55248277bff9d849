//! Diff command implementation.

use crate::cli::DiffArgs;
use crate::commands::open_engine;
use crate::config::Config;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use carton_domain::Jurisdiction;

/// Execute the diff command.
pub async fn execute_diff(args: DiffArgs, config: &Config, formatter: &Formatter) -> Result<()> {
    let jurisdiction = Jurisdiction::new(&args.jurisdiction).map_err(CliError::InvalidInput)?;
    if jurisdiction.is_federal() {
        return Err(CliError::InvalidInput("FEDERAL is the baseline; name a state".to_string()));
    }

    let engine = open_engine(config)?;
    let diff = engine.diff_against_federal(&jurisdiction).await?;

    println!("{}", formatter.floor_diff(&jurisdiction, &diff)?);

    if !diff.is_empty() {
        return Err(CliError::Failed(format!(
            "{} node(s) in {} fall below the federal floor",
            diff.len(),
            jurisdiction
        )));
    }
    Ok(())
}
