//! Error types for the trigger watcher

use thiserror::Error;

/// Errors that can occur while watching a bucket
#[derive(Error, Debug)]
pub enum WatcherError {
    /// Listing the bucket failed
    #[error("Storage error: {0}")]
    Store(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}
