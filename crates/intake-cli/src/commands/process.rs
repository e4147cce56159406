//! Process command implementation.

use super::build_worker;
use crate::cli::ProcessArgs;
use crate::config::Config;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use intake_domain::{ArtifactKey, TriggerEvent};
use intake_extractor::InvocationOutcome;

/// Execute the process command.
///
/// Exits with an error only when fetch, extraction or generation failed; a
/// stored, skipped or ignored event is a normal outcome.
pub async fn execute_process(args: ProcessArgs, config: &Config, formatter: &Formatter) -> Result<()> {
    let worker = build_worker(config)?;
    let event = trigger_event(&args, worker.bucket())?;

    let outcome = worker.handle(&event).await;
    println!("{}", formatter.format_outcome(&outcome)?);

    match outcome {
        InvocationOutcome::Failed(e) => Err(e.into()),
        _ => Ok(()),
    }
}

/// Event from `--event`, or one for `key` in the worker's own bucket.
fn trigger_event(args: &ProcessArgs, bucket: &str) -> Result<TriggerEvent> {
    match (&args.event, &args.key) {
        (Some(payload), _) => Ok(serde_json::from_str(payload)?),
        (None, Some(key)) => {
            let key = ArtifactKey::parse(key.as_str()).map_err(|e| CliError::InvalidInput(e.to_string()))?;
            Ok(TriggerEvent::new(bucket, key))
        }
        (None, None) => Err(CliError::InvalidInput("Either a key or --event is required".to_string())),
    }
}
