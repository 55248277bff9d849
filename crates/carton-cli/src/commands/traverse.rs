//! Traverse command implementation.

use crate::cli::TraverseArgs;
use crate::commands::{open_engine, parse_key};
use crate::config::Config;
use crate::error::{CliError, Result};
use crate::output::Formatter;

/// Execute the traverse command.
pub async fn execute_traverse(args: TraverseArgs, config: &Config, formatter: &Formatter) -> Result<()> {
    let start = parse_key(&args.key)?;
    let engine = open_engine(config)?;
    if engine.get_node(&start).await?.is_none() {
        return Err(CliError::InvalidInput(format!("No node {}", start)));
    }

    let reached = engine.traverse(&start, args.relation.into(), args.depth).await?;
    println!("{}", formatter.reached(&reached)?);
    Ok(())
}
