//! Show command implementation.

use crate::cli::ShowArgs;
use crate::commands::{open_engine, parse_key};
use crate::config::Config;
use crate::error::{CliError, Result};
use crate::output::Formatter;

/// Execute the show command.
pub async fn execute_show(args: ShowArgs, config: &Config, formatter: &Formatter) -> Result<()> {
    let key = parse_key(&args.key)?;
    let engine = open_engine(config)?;

    let nodes = if args.history {
        let graph = engine.graph().await?;
        graph
            .shard(&key.jurisdiction)
            .and_then(|shard| shard.history(&key))
            .map(|history| history.versions().to_vec())
    } else {
        engine.get_node(&key).await?.map(|node| vec![node])
    };

    match nodes {
        Some(nodes) => {
            println!("{}", formatter.nodes(&nodes)?);
            Ok(())
        }
        None => Err(CliError::InvalidInput(format!("No node {}", key))),
    }
}
