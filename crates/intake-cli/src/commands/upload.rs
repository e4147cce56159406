//! Upload command implementation.

use super::{open_bucket, open_results};
use crate::cli::UploadArgs;
use crate::config::{Config, OutputFormat};
use crate::error::{CliError, Result};
use crate::output::Formatter;
use intake_sdk::PollingClient;
use std::io::Write;

/// Execute the upload command.
///
/// Polling ends either with the result or with a timeout notice; only upload
/// and query failures are errors.
pub async fn execute_upload(args: UploadArgs, config: &Config, formatter: &Formatter) -> Result<()> {
    let filename = args
        .file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| CliError::InvalidInput(format!("Not a file: {}", args.file.display())))?;

    let client = PollingClient::new(
        open_bucket(config)?,
        open_results(config)?,
        config.result_table()?,
        config.client.clone(),
    )?;

    // Reject the type before touching the file
    let mut session = client.start(&filename)?;
    let bytes = tokio::fs::read(&args.file).await?;
    client.upload(&mut session, &bytes)?;

    if args.no_wait {
        println!("{}", formatter.format_session(&session, &config.client)?);
        return Ok(());
    }

    let show_progress = formatter.format() == OutputFormat::Table;
    client
        .poll(&mut session, |progress| {
            if show_progress {
                eprint!("\r{}", formatter.progress(&progress));
                let _ = std::io::stderr().flush();
            }
        })
        .await?;
    if show_progress {
        eprintln!();
    }

    println!("{}", formatter.format_session(&session, &config.client)?);
    Ok(())
}
