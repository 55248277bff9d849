//! Validate command implementation.

use crate::cli::ValidateArgs;
use crate::commands::read_records;
use crate::config::Config;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use carton_gatekeeper::{SchemaValidator, ValidationResult};
use carton_ingest::normalize;

/// Execute the validate command.
///
/// Records are normalized first, so crawler-shaped input is judged the
/// same way ingestion would judge it. Nothing is written.
pub fn execute_validate(args: ValidateArgs, config: &Config, formatter: &Formatter) -> Result<()> {
    let catalog = config.load_catalog()?;
    let validator = SchemaValidator::new(config.gatekeeper.clone())?;

    let results: Vec<(usize, ValidationResult)> = read_records(&args.file)?
        .iter()
        .enumerate()
        .map(|(index, raw)| {
            let result = match normalize(raw) {
                Ok(record) => validator.validate(&record, &catalog),
                Err(issue) => ValidationResult::from_issues(vec![issue]),
            };
            (index, result)
        })
        .collect();

    println!("{}", formatter.validation(&results)?);

    let failed = results.iter().filter(|(_, r)| !r.ok).count();
    if failed > 0 {
        return Err(CliError::Failed(format!("{} of {} record(s) invalid", failed, results.len())));
    }
    Ok(())
}
