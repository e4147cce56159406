//! Trigger events delivered on artifact creation

use crate::ArtifactKey;
use serde::{Deserialize, Serialize};

/// Object-creation notification for a bucket
///
/// Delivery is at-least-once: the same event may reach the worker more than
/// once. The wire field for the key is `name`, matching storage notification
/// payloads.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TriggerEvent {
    /// Bucket the object was written to
    pub bucket: String,

    /// Key of the new object
    #[serde(rename = "name")]
    pub key: ArtifactKey,
}

impl TriggerEvent {
    /// Create a new event
    pub fn new(bucket: impl Into<String>, key: ArtifactKey) -> Self {
        Self {
            bucket: bucket.into(),
            key,
        }
    }
}
