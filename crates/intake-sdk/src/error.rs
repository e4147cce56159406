//! Error types for the intake SDK.

use intake_domain::KeyError;
use thiserror::Error;

/// Upload session errors
///
/// Timing out while polling is not an error; see
/// [`SessionState::TimedOut`](crate::SessionState::TimedOut).
#[derive(Debug, Error)]
pub enum SessionError {
    /// File type is not accepted by the upload surface
    #[error("Unsupported file type: {0} (accepted: PDF, PNG, JPG)")]
    UnsupportedType(String),

    /// The artifact could not be written
    #[error("Upload failed: {0}")]
    Upload(String),

    /// The result table could not be queried
    #[error("Query failed: {0}")]
    Query(String),

    /// Client configuration was rejected
    #[error("Configuration error: {0}")]
    Config(String),

    /// Operation not allowed in the session's current state
    #[error("Invalid session state: {0}")]
    InvalidState(String),
}

impl From<KeyError> for SessionError {
    fn from(e: KeyError) -> Self {
        SessionError::Upload(format!("Invalid file name: {}", e))
    }
}
