//! Background watcher that turns new artifacts into trigger events

use crate::{WatcherConfig, WatcherError, WorkerMetrics};
use intake_domain::traits::{ArtifactStore, DocumentProcessor, LlmProvider, ResultStore};
use intake_domain::{ArtifactKey, Clock, TriggerEvent};
use intake_extractor::ExtractionWorker;
use std::collections::HashSet;
use std::fmt::Display;
use std::time::Instant;
use tokio::time::{interval, Duration};

/// Polls an artifact bucket and hands each new key to an [`ExtractionWorker`]
///
/// Seen keys are remembered in memory only, so every artifact is delivered
/// once per watcher instance and again after a restart. Downstream handling
/// tolerates the duplicates.
///
/// # Examples
///
/// ```no_run
/// use intake_extractor::{ExtractionWorker, WorkerConfig};
/// use intake_llm::{HttpDocumentProcessor, OllamaProvider};
/// use intake_store::{FsArtifactStore, SqliteResultStore};
/// use intake_worker::{TriggerWatcher, WatcherConfig};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = WorkerConfig::from_env();
///     let worker = ExtractionWorker::new(
///         FsArtifactStore::new("/var/lib/intake/document-input")?,
///         HttpDocumentProcessor::new(&config.document_endpoint, &config.project_id, &config.location, &config.processor_id),
///         OllamaProvider::new(&config.ollama_endpoint, &config.model),
///         SqliteResultStore::new("results.db")?,
///         config,
///     )?;
///
///     let mut watcher = TriggerWatcher::new(WatcherConfig::default())?;
///
///     // Run indefinitely (until Ctrl+C)
///     watcher.run(&worker).await?;
///     Ok(())
/// }
/// ```
pub struct TriggerWatcher {
    interval: Duration,
    deliver_existing: bool,
    seen: HashSet<ArtifactKey>,
    primed: bool,
    metrics: WorkerMetrics,
}

impl TriggerWatcher {
    /// Create a watcher with the given configuration
    pub fn new(config: WatcherConfig) -> Result<Self, WatcherError> {
        config.validate().map_err(WatcherError::Config)?;
        Ok(Self {
            interval: config.poll_interval(),
            deliver_existing: config.deliver_existing,
            seen: HashSet::new(),
            primed: false,
            metrics: WorkerMetrics::new(),
        })
    }

    /// Create a watcher with default configuration
    pub fn default_config() -> Self {
        Self {
            interval: WatcherConfig::default().poll_interval(),
            deliver_existing: true,
            seen: HashSet::new(),
            primed: false,
            metrics: WorkerMetrics::new(),
        }
    }

    /// List the bucket and return events for keys not delivered yet
    pub fn scan<A>(&mut self, store: &A) -> Result<Vec<TriggerEvent>, WatcherError>
    where
        A: ArtifactStore,
        A::Error: Display,
    {
        let keys = store
            .list()
            .map_err(|e| WatcherError::Store(e.to_string()))?;

        let suppress = !self.primed && !self.deliver_existing;
        self.primed = true;

        let mut events = Vec::new();
        for key in keys {
            if self.seen.insert(key.clone()) && !suppress {
                events.push(TriggerEvent::new(store.bucket(), key));
            }
        }

        self.metrics.record_scan();
        Ok(events)
    }

    /// One scan followed by sequential delivery of its events
    async fn cycle<A, P, L, R, C>(
        &mut self,
        worker: &ExtractionWorker<A, P, L, R, C>,
    ) -> Result<usize, WatcherError>
    where
        A: ArtifactStore + Send + Sync + 'static,
        A::Error: Display,
        P: DocumentProcessor + Send + Sync + 'static,
        P::Error: Display,
        L: LlmProvider + Send + Sync + 'static,
        L::Error: Display,
        R: ResultStore,
        R::Error: Display,
        C: Clock,
    {
        let events = self.scan(worker.artifacts())?;
        if !events.is_empty() {
            tracing::debug!("Delivering {} new artifact(s)", events.len());
        }

        for event in &events {
            let outcome = worker.handle(event).await;
            tracing::debug!("{} -> {}", event.key, outcome.label());
            self.metrics.record(&outcome);
        }

        Ok(events.len())
    }

    /// Run the watcher indefinitely
    ///
    /// Scans at the configured interval until a shutdown signal (Ctrl+C) is
    /// received. Scan failures are logged and the next tick tries again.
    pub async fn run<A, P, L, R, C>(
        &mut self,
        worker: &ExtractionWorker<A, P, L, R, C>,
    ) -> Result<(), WatcherError>
    where
        A: ArtifactStore + Send + Sync + 'static,
        A::Error: Display,
        P: DocumentProcessor + Send + Sync + 'static,
        P::Error: Display,
        L: LlmProvider + Send + Sync + 'static,
        L::Error: Display,
        R: ResultStore,
        R::Error: Display,
        C: Clock,
    {
        let mut ticker = interval(self.interval);
        let started = Instant::now();

        tracing::info!(
            "Watching bucket '{}' (interval: {:?})",
            worker.bucket(),
            self.interval
        );

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Err(e) = self.cycle(worker).await {
                        tracing::error!("Scan failed: {}", e);
                    }
                }
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("Shutdown signal received, stopping watcher");
                    break;
                }
            }
        }

        self.metrics.total_runtime_secs += started.elapsed().as_secs();
        tracing::info!("Watcher stopped. Final metrics:\n{}", self.metrics.summary());

        Ok(())
    }

    /// Run for a specific number of scan cycles
    pub async fn run_cycles<A, P, L, R, C>(
        &mut self,
        worker: &ExtractionWorker<A, P, L, R, C>,
        cycles: usize,
    ) -> Result<(), WatcherError>
    where
        A: ArtifactStore + Send + Sync + 'static,
        A::Error: Display,
        P: DocumentProcessor + Send + Sync + 'static,
        P::Error: Display,
        L: LlmProvider + Send + Sync + 'static,
        L::Error: Display,
        R: ResultStore,
        R::Error: Display,
        C: Clock,
    {
        let mut ticker = interval(self.interval);
        let started = Instant::now();

        tracing::info!(
            "Watching bucket '{}' for {} cycles (interval: {:?})",
            worker.bucket(),
            cycles,
            self.interval
        );

        for cycle in 0..cycles {
            ticker.tick().await;

            match self.cycle(worker).await {
                Ok(delivered) => {
                    tracing::debug!("Scan {}/{} delivered {} event(s)", cycle + 1, cycles, delivered);
                }
                Err(e) => {
                    tracing::error!("Scan {}/{} failed: {}", cycle + 1, cycles, e);
                    self.metrics.total_runtime_secs += started.elapsed().as_secs();
                    return Err(e);
                }
            }
        }

        self.metrics.total_runtime_secs += started.elapsed().as_secs();
        tracing::info!("Watcher finished {} cycles. Final metrics:\n{}", cycles, self.metrics.summary());

        Ok(())
    }

    /// Get a reference to the current metrics
    pub fn metrics(&self) -> &WorkerMetrics {
        &self.metrics
    }

    /// Reset the metrics counters
    pub fn reset_metrics(&mut self) {
        self.metrics.reset();
    }
}
