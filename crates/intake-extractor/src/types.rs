//! Types for extraction results

use crate::error::WorkerError;
use intake_domain::{ArtifactKey, ResultRecord};

/// What happened during one worker invocation
///
/// Returned by [`crate::ExtractionWorker::handle`]. Failures are reported here
/// and in the logs; they are never raised to the trigger.
#[derive(Debug)]
pub enum InvocationOutcome {
    /// A record was appended to the result table
    Recorded(ResultRecord),

    /// Processing succeeded but the append failed; nothing was written
    Unpersisted {
        /// The record that could not be stored
        record: ResultRecord,
        /// Store error message
        reason: String,
    },

    /// No result table is configured; processing ran without persistence
    PersistenceSkipped(ResultRecord),

    /// Fetch, extraction or generation failed; nothing was written
    Failed(WorkerError),

    /// A record already exists for the key and duplicate suppression is on
    AlreadyProcessed(ArtifactKey),

    /// The event came from a bucket this worker is not bound to
    Ignored {
        /// Bucket named in the event
        bucket: String,
    },
}

impl InvocationOutcome {
    /// The record produced by this invocation, whether or not it was stored
    pub fn record(&self) -> Option<&ResultRecord> {
        match self {
            InvocationOutcome::Recorded(record)
            | InvocationOutcome::PersistenceSkipped(record)
            | InvocationOutcome::Unpersisted { record, .. } => Some(record),
            _ => None,
        }
    }

    /// True when a record reached the result table
    pub fn is_recorded(&self) -> bool {
        matches!(self, InvocationOutcome::Recorded(_))
    }

    /// Short label for logs and metrics
    pub fn label(&self) -> &'static str {
        match self {
            InvocationOutcome::Recorded(_) => "recorded",
            InvocationOutcome::Unpersisted { .. } => "unpersisted",
            InvocationOutcome::PersistenceSkipped(_) => "persistence_skipped",
            InvocationOutcome::Failed(_) => "failed",
            InvocationOutcome::AlreadyProcessed(_) => "already_processed",
            InvocationOutcome::Ignored { .. } => "ignored",
        }
    }
}
