//! Intake CLI - upload documents and run the extraction worker.

use clap::Parser;
use intake_cli::commands;
use intake_cli::{Cli, Command, Config, Formatter};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Logs go to stderr; stdout carries command output
fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> intake_cli::Result<()> {
    let config = Config::load(cli.config.as_deref())?;

    let format = cli.format.map(Into::into).unwrap_or(config.settings.format);
    let color_enabled = !cli.no_color && config.settings.color;
    let formatter = Formatter::new(format, color_enabled);

    match cli.command {
        Command::Upload(args) => commands::execute_upload(args, &config, &formatter).await,
        Command::Result(args) => commands::execute_result(args, &config, &formatter).await,
        Command::Process(args) => commands::execute_process(args, &config, &formatter).await,
        Command::Worker(args) => commands::execute_worker(args, &config, &formatter).await,
        Command::Config(args) => {
            commands::execute_config(args, &config, cli.config.as_deref(), &formatter).await
        }
    }
}
