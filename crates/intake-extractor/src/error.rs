//! Error types for the extraction worker

use thiserror::Error;

/// Errors that end an invocation before a record can be written
#[derive(Error, Debug)]
pub enum WorkerError {
    /// The artifact could not be read from the bucket
    #[error("Artifact not found: {0}")]
    NotFound(String),

    /// The document-understanding service failed or rejected the input
    #[error("Extraction failed: {0}")]
    Extraction(String),

    /// The generative-text service failed, hit its quota, or timed out
    #[error("Generation failed: {0}")]
    Generation(String),

    /// The result table could not be written
    #[error("Persistence failed: {0}")]
    Persistence(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}
