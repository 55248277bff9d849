//! Init command implementation.

use crate::cli::InitArgs;
use crate::config::Config;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use std::path::Path;

/// Execute the init command.
pub fn execute_init(args: InitArgs, path: &Path, formatter: &Formatter) -> Result<()> {
    if path.exists() && !args.force {
        return Err(CliError::Config(format!(
            "{} already exists (use --force to overwrite)",
            path.display()
        )));
    }

    Config::default().save(path)?;
    println!("{}", formatter.success(&format!("Wrote {}", path.display())));
    Ok(())
}
