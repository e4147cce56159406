//! Error types for the CLI application.

use thiserror::Error;

/// Result type alias for CLI operations.
pub type Result<T> = std::result::Result<T, CliError>;

/// CLI-specific errors.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Upload session error
    #[error(transparent)]
    Session(#[from] intake_sdk::SessionError),

    /// Extraction worker error
    #[error("Worker error: {0}")]
    Worker(#[from] intake_extractor::WorkerError),

    /// Bucket watcher error
    #[error("Watcher error: {0}")]
    Watcher(#[from] intake_worker::WatcherError),

    /// Result store error
    #[error("Result store error: {0}")]
    Store(#[from] intake_store::StoreError),

    /// Artifact bucket error
    #[error("Bucket error: {0}")]
    Artifact(#[from] intake_store::ArtifactError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}
