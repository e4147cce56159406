//! Result command implementation.

use super::open_results;
use crate::cli::ResultArgs;
use crate::config::Config;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use intake_domain::traits::ResultStore;
use intake_domain::ArtifactKey;

/// Execute the result command.
pub async fn execute_result(args: ResultArgs, config: &Config, formatter: &Formatter) -> Result<()> {
    let key = ArtifactKey::parse(args.key).map_err(|e| CliError::InvalidInput(e.to_string()))?;
    let table = config.result_table()?;
    let results = open_results(config)?;

    if args.all {
        let records = results.query(&table, &key)?;
        println!("{}", formatter.format_records(&records)?);
        return Ok(());
    }

    match results.latest(&table, &key)? {
        Some(record) => println!("{}", formatter.format_record(&record, None)?),
        None => println!("{}", formatter.format_missing(&key)?),
    }

    Ok(())
}
