//! Worker command implementation.

use super::build_worker;
use crate::cli::WorkerArgs;
use crate::config::Config;
use crate::error::Result;
use crate::output::Formatter;
use intake_worker::TriggerWatcher;

/// Execute the worker command.
pub async fn execute_worker(args: WorkerArgs, config: &Config, formatter: &Formatter) -> Result<()> {
    let worker = build_worker(config)?;
    if worker.table().is_none() {
        eprintln!(
            "{}",
            formatter.warning("No result table configured; results will be logged but not stored")
        );
    }

    let mut watcher = TriggerWatcher::new(config.watcher.clone())?;
    match args.cycles {
        Some(cycles) => watcher.run_cycles(&worker, cycles).await?,
        None => watcher.run(&worker).await?,
    }

    println!("{}", formatter.format_metrics(watcher.metrics())?);
    Ok(())
}
