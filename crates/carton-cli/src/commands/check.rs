//! Check command implementation.

use crate::commands::open_engine;
use crate::config::Config;
use crate::error::{CliError, Result};
use crate::output::Formatter;

/// Execute the check command.
pub async fn execute_check(config: &Config, formatter: &Formatter) -> Result<()> {
    let engine = open_engine(config)?;
    let violations = engine.check_consistency().await?;

    println!("{}", formatter.violations(&violations)?);

    if !violations.is_empty() {
        return Err(CliError::Failed(format!("{} consistency violation(s)", violations.len())));
    }
    Ok(())
}
