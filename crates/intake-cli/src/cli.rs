//! CLI command definitions and argument parsing.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Intake CLI - upload documents for compliance review and run the extraction worker.
#[derive(Debug, Parser)]
#[command(name = "intake")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output format
    #[arg(short, long, value_enum, global = true)]
    pub format: Option<CliFormat>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Configuration file path
    #[arg(short, long, global = true, env = "INTAKE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log at debug level (overrides RUST_LOG)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Output format options.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum CliFormat {
    /// Table format (default)
    Table,
    /// JSON format
    Json,
}

/// CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Upload a PDF, PNG or JPG and wait for its review result
    Upload(UploadArgs),

    /// Show the latest result recorded for an artifact key
    Result(ResultArgs),

    /// Run the extraction worker once for a single artifact
    Process(ProcessArgs),

    /// Watch the bucket and process new artifacts
    Worker(WorkerArgs),

    /// Inspect or create the configuration file
    Config(ConfigArgs),
}

/// Arguments for the upload command.
#[derive(Debug, Args)]
pub struct UploadArgs {
    /// Document to upload
    pub file: PathBuf,

    /// Return after the upload without polling for a result
    #[arg(long)]
    pub no_wait: bool,
}

/// Arguments for the result command.
#[derive(Debug, Args)]
pub struct ResultArgs {
    /// Artifact key as printed by `upload`
    pub key: String,

    /// List every record for the key, newest first
    #[arg(short, long)]
    pub all: bool,
}

/// Arguments for the process command.
#[derive(Debug, Args)]
#[command(group(clap::ArgGroup::new("target").required(true).args(["key", "event"])))]
pub struct ProcessArgs {
    /// Artifact key in the configured bucket
    pub key: Option<String>,

    /// Trigger event payload, e.g. '{"bucket":"document-input","name":"a.pdf"}'
    #[arg(long)]
    pub event: Option<String>,
}

/// Arguments for the worker command.
#[derive(Debug, Args)]
pub struct WorkerArgs {
    /// Stop after this many scans (default: run until Ctrl+C)
    #[arg(long)]
    pub cycles: Option<usize>,
}

/// Arguments for configuration management.
#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

/// Configuration actions.
#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Print the effective configuration (file plus environment)
    Show,

    /// Write a default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

impl From<CliFormat> for crate::config::OutputFormat {
    fn from(format: CliFormat) -> Self {
        match format {
            CliFormat::Table => crate::config::OutputFormat::Table,
            CliFormat::Json => crate::config::OutputFormat::Json,
        }
    }
}
