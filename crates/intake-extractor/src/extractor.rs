//! Core ExtractionWorker implementation

use crate::config::WorkerConfig;
use crate::error::WorkerError;
use crate::parser::parse_decision;
use crate::prompt::{build_prompt, truncate_chars};
use crate::types::InvocationOutcome;
use intake_domain::traits::{ArtifactStore, DocumentProcessor, LlmProvider, ResultStore};
use intake_domain::{Clock, Decision, DocumentKind, ResultRecord, SystemClock, TableRef, TriggerEvent};
use std::fmt::Display;
use std::sync::{Arc, Mutex};
use tokio::time::timeout;
use tracing::{debug, error, info, info_span, warn, Instrument};
use uuid::Uuid;

/// MIME type sent when the key's extension is not a known document kind
pub const FALLBACK_MIME_TYPE: &str = "application/pdf";

/// Characters of summary included in the completion log line
const SUMMARY_LOG_CHARS: usize = 100;

/// Turns an uploaded artifact into a result record
///
/// One call to [`handle`](Self::handle) per trigger event: fetch the bytes,
/// extract text, ask the model for a summary and decision, then append a
/// record. Duplicate events are tolerated; each produces its own record and
/// readers pick the newest.
pub struct ExtractionWorker<A, P, L, R, C = SystemClock> {
    artifacts: Arc<A>,
    processor: Arc<P>,
    llm: Arc<L>,
    results: Arc<Mutex<R>>,
    clock: C,
    table: Option<TableRef>,
    config: WorkerConfig,
}

impl<A, P, L, R> ExtractionWorker<A, P, L, R, SystemClock>
where
    R: ResultStore,
{
    /// Create a worker using the system clock
    ///
    /// # Errors
    /// Returns [`WorkerError::Config`] if the configuration is invalid.
    pub fn new(
        artifacts: A,
        processor: P,
        llm: L,
        results: R,
        config: WorkerConfig,
    ) -> Result<Self, WorkerError> {
        config.validate().map_err(WorkerError::Config)?;
        let table = config.table_ref().map_err(WorkerError::Config)?;

        Ok(Self {
            artifacts: Arc::new(artifacts),
            processor: Arc::new(processor),
            llm: Arc::new(llm),
            results: Arc::new(Mutex::new(results)),
            clock: SystemClock,
            table,
            config,
        })
    }
}

impl<A, P, L, R, C> ExtractionWorker<A, P, L, R, C>
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
    /// Replace the clock used for record timestamps
    pub fn with_clock<C2: Clock>(self, clock: C2) -> ExtractionWorker<A, P, L, R, C2> {
        ExtractionWorker {
            artifacts: self.artifacts,
            processor: self.processor,
            llm: self.llm,
            results: self.results,
            clock,
            table: self.table,
            config: self.config,
        }
    }

    /// Worker configuration
    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    /// Result table records are appended to, if configured
    pub fn table(&self) -> Option<&TableRef> {
        self.table.as_ref()
    }

    /// Bucket the worker reads artifacts from
    pub fn bucket(&self) -> &str {
        self.artifacts.bucket()
    }

    /// Artifact store the worker reads from
    pub fn artifacts(&self) -> &A {
        &self.artifacts
    }

    /// Shared handle to the result store
    pub fn results(&self) -> Arc<Mutex<R>> {
        Arc::clone(&self.results)
    }

    /// Handle one trigger event
    ///
    /// Never fails: every branch is logged and reported through the
    /// returned [`InvocationOutcome`].
    pub async fn handle(&self, event: &TriggerEvent) -> InvocationOutcome {
        let execution_id = Uuid::now_v7();
        let span = info_span!(
            "invocation",
            %execution_id,
            bucket = %event.bucket,
            key = %event.key
        );

        self.handle_inner(event).instrument(span).await
    }

    async fn handle_inner(&self, event: &TriggerEvent) -> InvocationOutcome {
        info!("Triggered by file: {} in bucket: {}", event.key, event.bucket);

        let expected = self
            .config
            .artifact_bucket
            .as_deref()
            .unwrap_or_else(|| self.artifacts.bucket());
        if event.bucket != expected {
            warn!("Ignoring event for bucket '{}' (bound to '{}')", event.bucket, expected);
            return InvocationOutcome::Ignored {
                bucket: event.bucket.clone(),
            };
        }

        if self.config.skip_processed {
            if let Some(table) = &self.table {
                match self.lock_results().and_then(|store| {
                    store
                        .latest(table, &event.key)
                        .map_err(|e| WorkerError::Persistence(e.to_string()))
                }) {
                    Ok(Some(_)) => {
                        info!("Result already recorded for '{}', skipping", event.key);
                        return InvocationOutcome::AlreadyProcessed(event.key.clone());
                    }
                    Ok(None) => {}
                    Err(e) => warn!("Could not check for an existing result: {}", e),
                }
            }
        }

        let record = match self.process(event).await {
            Ok(record) => record,
            Err(e) => {
                error!("Failed to process document: {}", e);
                return InvocationOutcome::Failed(e);
            }
        };

        let Some(table) = &self.table else {
            info!("Result dataset or table not configured. Skipping result logging.");
            return InvocationOutcome::PersistenceSkipped(record);
        };

        match self.persist(table, &record) {
            Ok(()) => {
                info!("Result recorded in table: {}", table);
                InvocationOutcome::Recorded(record)
            }
            Err(e) => {
                error!("Failed to record result for '{}': {}", record.key, e);
                InvocationOutcome::Unpersisted {
                    record,
                    reason: e.to_string(),
                }
            }
        }
    }

    /// Fetch, extract, generate and parse; everything short of persistence
    pub async fn process(&self, event: &TriggerEvent) -> Result<ResultRecord, WorkerError> {
        let bytes = self.fetch(event).await?;

        let mime_type = event
            .key
            .kind()
            .map(|kind: DocumentKind| kind.mime_type())
            .unwrap_or(FALLBACK_MIME_TYPE);
        debug!("Processing {} bytes as {}", bytes.len(), mime_type);

        let text = self.extract_text(bytes, mime_type).await?;
        let text_length = text.chars().count();
        info!("Document processed successfully ({} characters)", text_length);

        if text_length > self.config.max_text_length {
            warn!(
                "Extracted text truncated from {} to {} characters for generation",
                text_length, self.config.max_text_length
            );
        }
        let prompt = build_prompt(truncate_chars(&text, self.config.max_text_length));
        debug!("Prompt length: {} chars", prompt.len());

        let response = self.generate(prompt).await?;
        debug!("Model response length: {} chars", response.len());

        let parsed = parse_decision(&response);
        if parsed.decision == Decision::Unknown {
            warn!("No decision clause found in model response");
        }

        let record = ResultRecord {
            key: event.key.clone(),
            source_bucket: event.bucket.clone(),
            extracted_text_length: text_length as u64,
            summary: parsed.summary,
            decision: parsed.decision,
            invocation_id: self.config.invocation_id.clone(),
            created_at: self.clock.now_millis(),
        };

        info!(
            "Extracted decision: {}, summary (first {} chars): {}",
            record.decision,
            SUMMARY_LOG_CHARS,
            record.summary_preview(SUMMARY_LOG_CHARS)
        );

        Ok(record)
    }

    async fn fetch(&self, event: &TriggerEvent) -> Result<Vec<u8>, WorkerError> {
        let artifacts = Arc::clone(&self.artifacts);
        let key = event.key.clone();

        tokio::task::spawn_blocking(move || artifacts.get(&key).map_err(|e| e.to_string()))
            .await
            .map_err(|e| WorkerError::NotFound(format!("Task join error: {}", e)))?
            .map_err(|e| WorkerError::NotFound(format!("{}: {}", event.key, e)))
    }

    async fn extract_text(&self, bytes: Vec<u8>, mime_type: &'static str) -> Result<String, WorkerError> {
        let processor = Arc::clone(&self.processor);

        tokio::task::spawn_blocking(move || processor.process(&bytes, mime_type).map_err(|e| e.to_string()))
            .await
            .map_err(|e| WorkerError::Extraction(format!("Task join error: {}", e)))?
            .map_err(WorkerError::Extraction)
    }

    async fn generate(&self, prompt: String) -> Result<String, WorkerError> {
        let llm = Arc::clone(&self.llm);

        // Call in a blocking context since LlmProvider is not async
        let call = tokio::task::spawn_blocking(move || llm.generate(&prompt).map_err(|e| e.to_string()));

        timeout(self.config.generation_timeout(), call)
            .await
            .map_err(|_| {
                WorkerError::Generation(format!(
                    "timed out after {}s",
                    self.config.generation_timeout_secs
                ))
            })?
            .map_err(|e| WorkerError::Generation(format!("Task join error: {}", e)))?
            .map_err(WorkerError::Generation)
    }

    fn persist(&self, table: &TableRef, record: &ResultRecord) -> Result<(), WorkerError> {
        let mut store = self.lock_results()?;
        store
            .append(table, record)
            .map_err(|e| WorkerError::Persistence(e.to_string()))
    }

    fn lock_results(&self) -> Result<std::sync::MutexGuard<'_, R>, WorkerError> {
        self.results
            .lock()
            .map_err(|e| WorkerError::Persistence(format!("Store lock error: {}", e)))
    }
}
