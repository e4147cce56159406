//! Integration tests for the ExtractionWorker

#[cfg(test)]
mod tests {
    use crate::{ExtractionWorker, InvocationOutcome, WorkerConfig, WorkerError};
    use chrono::{Duration, TimeZone, Utc};
    use intake_domain::traits::{ArtifactStore, LlmProvider, ResultStore};
    use intake_domain::{ArtifactKey, Decision, FixedClock, ResultRecord, TableRef, TriggerEvent};
    use intake_llm::{MockProcessor, MockProvider};
    use intake_store::{FsArtifactStore, SqliteResultStore};
    use tempfile::TempDir;

    const BUCKET: &str = "document-input";
    const KEY: &str = "report_20250301093000123456.pdf";

    type TestWorker<R = SqliteResultStore, L = MockProvider> =
        ExtractionWorker<FsArtifactStore, MockProcessor, L, R, FixedClock>;

    fn t0() -> chrono::DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 9, 30, 5).unwrap()
    }

    fn config() -> WorkerConfig {
        WorkerConfig::new("docai-final", "abc123")
            .with_table("document_processing_logs", "summary_results")
    }

    fn bucket_with_report(dir: &TempDir) -> FsArtifactStore {
        let artifacts = FsArtifactStore::new(dir.path().join(BUCKET)).unwrap();
        artifacts.put(&key(), b"%PDF-1.7 fake").unwrap();
        artifacts
    }

    fn key() -> ArtifactKey {
        ArtifactKey::parse(KEY).unwrap()
    }

    fn event() -> TriggerEvent {
        TriggerEvent::new(BUCKET, key())
    }

    fn build<R, L>(
        dir: &TempDir,
        processor: MockProcessor,
        llm: L,
        results: R,
        config: WorkerConfig,
        clock: FixedClock,
    ) -> TestWorker<R, L>
    where
        R: ResultStore,
        R::Error: std::fmt::Display,
        L: LlmProvider + Send + Sync + 'static,
        L::Error: std::fmt::Display,
    {
        ExtractionWorker::new(bucket_with_report(dir), processor, llm, results, config)
            .unwrap()
            .with_clock(clock)
    }

    fn latest(worker: &TestWorker) -> Option<ResultRecord> {
        let table = worker.table().unwrap().clone();
        let results = worker.results();
        let store = results.lock().unwrap();
        store.latest(&table, &key()).unwrap()
    }

    fn count(worker: &TestWorker) -> usize {
        let table = worker.table().unwrap().clone();
        let results = worker.results();
        let store = results.lock().unwrap();
        store.count(&table, &key()).unwrap()
    }

    /// Result store whose appends always fail
    struct FailingStore;

    impl ResultStore for FailingStore {
        type Error = String;

        fn append(&mut self, _table: &TableRef, _record: &ResultRecord) -> Result<(), Self::Error> {
            Err("table unavailable".to_string())
        }

        fn query(&self, _table: &TableRef, _key: &ArtifactKey) -> Result<Vec<ResultRecord>, Self::Error> {
            Ok(Vec::new())
        }
    }

    /// Provider that takes longer than any sensible test timeout
    struct SlowProvider;

    impl LlmProvider for SlowProvider {
        type Error = String;

        fn generate(&self, _prompt: &str) -> Result<String, Self::Error> {
            std::thread::sleep(std::time::Duration::from_secs(2));
            Ok("Late. Decision: APPROVE".to_string())
        }

        fn model_name(&self) -> &str {
            "slow"
        }
    }

    #[tokio::test]
    async fn test_full_flow_records_result() {
        let dir = TempDir::new().unwrap();
        let worker = build(
            &dir,
            MockProcessor::new("Extracted contract text"),
            MockProvider::new("**Summary**: Clause 9 missing.\n\nDecision: escalate"),
            SqliteResultStore::new(":memory:").unwrap(),
            config(),
            FixedClock::new(t0()),
        );

        let outcome = worker.handle(&event()).await;
        assert!(outcome.is_recorded(), "unexpected outcome: {:?}", outcome);

        let record = latest(&worker).unwrap();
        assert_eq!(record.key, key());
        assert_eq!(record.source_bucket, BUCKET);
        assert_eq!(record.extracted_text_length, "Extracted contract text".chars().count() as u64);
        assert_eq!(record.summary, "Summary: Clause 9 missing.");
        assert_eq!(record.decision, Decision::Escalate);
        assert_eq!(record.invocation_id, "unknown");
        assert_eq!(record.created_at, t0().timestamp_millis() as u64);
    }

    #[tokio::test]
    async fn test_prompt_carries_document_text() {
        let dir = TempDir::new().unwrap();
        let llm = MockProvider::new("ok Decision: APPROVE");
        let worker = build(
            &dir,
            MockProcessor::new("Clause 1. Payment within 30 days."),
            llm.clone(),
            SqliteResultStore::new(":memory:").unwrap(),
            config(),
            FixedClock::new(t0()),
        );

        worker.handle(&event()).await;

        let prompt = llm.last_prompt().unwrap();
        assert!(prompt.starts_with("Summarize this document"));
        assert!(prompt.ends_with("Document Text:\nClause 1. Payment within 30 days."));
    }

    #[tokio::test]
    async fn test_missing_decision_is_recorded_as_unknown() {
        let dir = TempDir::new().unwrap();
        let worker = build(
            &dir,
            MockProcessor::new("text"),
            MockProvider::new("A summary that forgot the *verdict*."),
            SqliteResultStore::new(":memory:").unwrap(),
            config(),
            FixedClock::new(t0()),
        );

        assert!(worker.handle(&event()).await.is_recorded());

        let record = latest(&worker).unwrap();
        assert_eq!(record.decision, Decision::Unknown);
        assert_eq!(record.summary, "A summary that forgot the verdict.");
    }

    #[tokio::test]
    async fn test_duplicate_delivery_newest_wins() {
        let dir = TempDir::new().unwrap();
        let clock = FixedClock::new(t0());
        let mut llm = MockProvider::new("First pass. Decision: FLAG");
        let worker = build(
            &dir,
            MockProcessor::new("text"),
            llm.clone(),
            SqliteResultStore::new(":memory:").unwrap(),
            config(),
            clock.clone(),
        );

        assert!(worker.handle(&event()).await.is_recorded());

        clock.advance(Duration::seconds(4));
        llm.add_response("text", "Second pass. Decision: APPROVE");
        assert!(worker.handle(&event()).await.is_recorded());

        assert_eq!(count(&worker), 2);
        let record = latest(&worker).unwrap();
        assert_eq!(record.summary, "Second pass.");
        assert_eq!(record.decision, Decision::Approve);
    }

    #[tokio::test]
    async fn test_skip_processed_suppresses_duplicates() {
        let dir = TempDir::new().unwrap();
        let llm = MockProvider::new("Done. Decision: APPROVE");
        let mut cfg = config();
        cfg.skip_processed = true;
        let worker = build(
            &dir,
            MockProcessor::new("text"),
            llm.clone(),
            SqliteResultStore::new(":memory:").unwrap(),
            cfg,
            FixedClock::new(t0()),
        );

        assert!(worker.handle(&event()).await.is_recorded());
        let second = worker.handle(&event()).await;

        assert!(matches!(second, InvocationOutcome::AlreadyProcessed(k) if k == key()));
        assert_eq!(llm.call_count(), 1);
        assert_eq!(count(&worker), 1);
    }

    #[tokio::test]
    async fn test_missing_table_skips_persistence() {
        let dir = TempDir::new().unwrap();
        let worker = build(
            &dir,
            MockProcessor::new("text"),
            MockProvider::new("Done. Decision: FLAG"),
            SqliteResultStore::new(":memory:").unwrap(),
            WorkerConfig::new("docai-final", "abc123"),
            FixedClock::new(t0()),
        );

        let outcome = worker.handle(&event()).await;
        match outcome {
            InvocationOutcome::PersistenceSkipped(record) => {
                assert_eq!(record.decision, Decision::Flag);
            }
            other => panic!("expected PersistenceSkipped, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_persistence_failure_is_swallowed() {
        let dir = TempDir::new().unwrap();
        let worker = build(
            &dir,
            MockProcessor::new("text"),
            MockProvider::new("Done. Decision: APPROVE"),
            FailingStore,
            config(),
            FixedClock::new(t0()),
        );

        let outcome = worker.handle(&event()).await;
        match &outcome {
            InvocationOutcome::Unpersisted { record, reason } => {
                assert_eq!(record.decision, Decision::Approve);
                assert!(reason.contains("table unavailable"));
            }
            other => panic!("expected Unpersisted, got {:?}", other),
        }
        assert!(!outcome.is_recorded());
    }

    #[tokio::test]
    async fn test_generation_failure_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let mut llm = MockProvider::default();
        llm.add_error("Document Text");
        let worker = build(
            &dir,
            MockProcessor::new("text"),
            llm,
            SqliteResultStore::new(":memory:").unwrap(),
            config(),
            FixedClock::new(t0()),
        );

        let outcome = worker.handle(&event()).await;
        assert!(matches!(outcome, InvocationOutcome::Failed(WorkerError::Generation(_))));
        assert_eq!(count(&worker), 0);
    }

    #[tokio::test]
    async fn test_extraction_failure_skips_generation() {
        let dir = TempDir::new().unwrap();
        let processor = MockProcessor::new("unused");
        processor.fail_with("unsupported encoding");
        let llm = MockProvider::default();
        let worker = build(
            &dir,
            processor,
            llm.clone(),
            SqliteResultStore::new(":memory:").unwrap(),
            config(),
            FixedClock::new(t0()),
        );

        let outcome = worker.handle(&event()).await;
        assert!(matches!(outcome, InvocationOutcome::Failed(WorkerError::Extraction(_))));
        assert_eq!(llm.call_count(), 0);
        assert_eq!(count(&worker), 0);
    }

    #[tokio::test]
    async fn test_generation_timeout() {
        let dir = TempDir::new().unwrap();
        let mut cfg = config();
        cfg.generation_timeout_secs = 1;
        let worker = build(
            &dir,
            MockProcessor::new("text"),
            SlowProvider,
            SqliteResultStore::new(":memory:").unwrap(),
            cfg,
            FixedClock::new(t0()),
        );

        let result = worker.process(&event()).await;
        match result {
            Err(WorkerError::Generation(msg)) => assert!(msg.contains("timed out")),
            other => panic!("expected generation timeout, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_foreign_bucket_is_ignored() {
        let dir = TempDir::new().unwrap();
        let llm = MockProvider::default();
        let worker = build(
            &dir,
            MockProcessor::new("text"),
            llm.clone(),
            SqliteResultStore::new(":memory:").unwrap(),
            config(),
            FixedClock::new(t0()),
        );

        let outcome = worker.handle(&TriggerEvent::new("other-bucket", key())).await;
        assert!(matches!(outcome, InvocationOutcome::Ignored { ref bucket } if bucket == "other-bucket"));
        assert_eq!(llm.call_count(), 0);
    }

    #[tokio::test]
    async fn test_configured_bucket_overrides_store_bucket() {
        let dir = TempDir::new().unwrap();
        let llm = MockProvider::default();
        let mut cfg = config();
        cfg.artifact_bucket = Some("archive".to_string());
        let worker = build(
            &dir,
            MockProcessor::new("text"),
            llm.clone(),
            SqliteResultStore::new(":memory:").unwrap(),
            cfg,
            FixedClock::new(t0()),
        );

        // Unset, the store's own bucket is accepted; set, only the named one
        let outcome = worker.handle(&event()).await;
        assert!(matches!(outcome, InvocationOutcome::Ignored { ref bucket } if bucket == BUCKET));
        assert_eq!(llm.call_count(), 0);
    }

    #[tokio::test]
    async fn test_long_text_is_truncated_for_generation() {
        let dir = TempDir::new().unwrap();
        let llm = MockProvider::new("ok Decision: APPROVE");
        let mut cfg = config();
        cfg.max_text_length = 5;
        let worker = build(
            &dir,
            MockProcessor::new("abcdefghij"),
            llm.clone(),
            SqliteResultStore::new(":memory:").unwrap(),
            cfg,
            FixedClock::new(t0()),
        );

        let record = worker.process(&event()).await.unwrap();
        assert_eq!(record.extracted_text_length, 10);
        assert!(llm.last_prompt().unwrap().ends_with("Document Text:\nabcde"));
    }

    #[tokio::test]
    async fn test_revision_is_written_as_invocation_id() {
        let dir = TempDir::new().unwrap();
        let mut cfg = config();
        cfg.apply_env(|name| (name == "K_REVISION").then(|| "process-document-00042".to_string()));
        let worker = build(
            &dir,
            MockProcessor::new("text"),
            MockProvider::new("ok Decision: APPROVE"),
            SqliteResultStore::new(":memory:").unwrap(),
            cfg,
            FixedClock::new(t0()),
        );

        let record = worker.process(&event()).await.unwrap();
        assert_eq!(record.invocation_id, "process-document-00042");
    }
}
