//! Metrics collection for watcher runs

use intake_extractor::InvocationOutcome;

/// Counters for events delivered by the watcher
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkerMetrics {
    /// Bucket scans completed
    pub scan_count: usize,

    /// Events handed to the worker
    pub events: usize,

    /// Records appended to the result table
    pub recorded: usize,

    /// Processed but the append failed (nothing written)
    pub unpersisted: usize,

    /// Processed without a configured result table
    pub persistence_skipped: usize,

    /// Fetch, extraction or generation failures
    pub failed: usize,

    /// Skipped because a record already existed
    pub already_processed: usize,

    /// Events for a foreign bucket
    pub ignored: usize,

    /// Total runtime in seconds
    pub total_runtime_secs: u64,
}

impl WorkerMetrics {
    /// Create new empty metrics
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a scan cycle completion
    pub fn record_scan(&mut self) {
        self.scan_count += 1;
    }

    /// Count one invocation by its outcome
    pub fn record(&mut self, outcome: &InvocationOutcome) {
        self.events += 1;
        let counter = match outcome {
            InvocationOutcome::Recorded(_) => &mut self.recorded,
            InvocationOutcome::Unpersisted { .. } => &mut self.unpersisted,
            InvocationOutcome::PersistenceSkipped(_) => &mut self.persistence_skipped,
            InvocationOutcome::Failed(_) => &mut self.failed,
            InvocationOutcome::AlreadyProcessed(_) => &mut self.already_processed,
            InvocationOutcome::Ignored { .. } => &mut self.ignored,
        };
        *counter += 1;
    }

    /// Events that ended without a stored record
    pub fn total_lost(&self) -> usize {
        self.unpersisted + self.failed
    }

    /// Reset all metrics
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Generate a summary report of metrics
    pub fn summary(&self) -> String {
        let lines = [
            "Worker Metrics Summary".to_string(),
            "======================".to_string(),
            format!("Scan cycles: {}", self.scan_count),
            format!("Total runtime: {}s", self.total_runtime_secs),
            format!("Events: {}", self.events),
            String::new(),
            format!("  Recorded: {}", self.recorded),
            format!("  Unpersisted: {}", self.unpersisted),
            format!("  Persistence skipped: {}", self.persistence_skipped),
            format!("  Failed: {}", self.failed),
            format!("  Already processed: {}", self.already_processed),
            format!("  Ignored: {}", self.ignored),
        ];

        lines.join("\n")
    }
}
