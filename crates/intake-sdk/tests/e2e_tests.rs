//! End-to-end tests: upload client and extraction worker sharing a bucket
//! directory and a result database, as two processes would.

use intake_domain::traits::ResultStore;
use intake_domain::{ArtifactKey, Decision, ResultRecord, TableRef, TriggerEvent};
use intake_extractor::{ExtractionWorker, InvocationOutcome, WorkerConfig};
use intake_llm::{MockProcessor, MockProvider};
use intake_sdk::{ClientConfig, PollingClient, SessionState};
use intake_store::{FsArtifactStore, SqliteResultStore};
use tempfile::TempDir;

const PROJECT: &str = "docai-final";
const DATASET: &str = "document_processing_logs";
const TABLE: &str = "summary_results";

fn worker_config() -> WorkerConfig {
    WorkerConfig::new(PROJECT, "abc123").with_table(DATASET, TABLE)
}

fn client(dir: &TempDir, config: ClientConfig) -> PollingClient<FsArtifactStore, SqliteResultStore> {
    PollingClient::new(
        FsArtifactStore::new(dir.path().join("document-input")).unwrap(),
        SqliteResultStore::new(dir.path().join("results.db")).unwrap(),
        TableRef::new(PROJECT, DATASET, TABLE).unwrap(),
        config,
    )
    .unwrap()
}

fn worker(
    dir: &TempDir,
    llm: MockProvider,
    config: WorkerConfig,
) -> ExtractionWorker<FsArtifactStore, MockProcessor, MockProvider, SqliteResultStore> {
    worker_with(dir, llm, SqliteResultStore::new(dir.path().join("results.db")).unwrap(), config)
}

fn worker_with<R: ResultStore>(
    dir: &TempDir,
    llm: MockProvider,
    results: R,
    config: WorkerConfig,
) -> ExtractionWorker<FsArtifactStore, MockProcessor, MockProvider, R> {
    ExtractionWorker::new(
        FsArtifactStore::new(dir.path().join("document-input")).unwrap(),
        MockProcessor::new("Master services agreement. Clause 12 omitted."),
        llm,
        results,
        config,
    )
    .unwrap()
}

/// Worker-side handle on the shared database whose appends are refused
struct ReadOnlyResults(SqliteResultStore);

impl ResultStore for ReadOnlyResults {
    type Error = String;

    fn append(&mut self, _table: &TableRef, _record: &ResultRecord) -> Result<(), Self::Error> {
        Err("attempt to write a readonly database".to_string())
    }

    fn query(&self, table: &TableRef, key: &ArtifactKey) -> Result<Vec<ResultRecord>, Self::Error> {
        self.0.query(table, key).map_err(|e| e.to_string())
    }
}

#[tokio::test]
async fn test_upload_process_and_find_result() {
    let dir = TempDir::new().unwrap();
    let client = client(&dir, ClientConfig::default());
    let worker = worker(
        &dir,
        MockProvider::new("## Summary\nThe agreement omits clause 12.\n\n**Decision: ESCALATE**"),
        worker_config(),
    );

    let mut session = client.start("msa.pdf").unwrap();
    client.upload(&mut session, b"%PDF-1.7").unwrap();
    let key = session.key().unwrap().clone();

    let outcome = worker.handle(&TriggerEvent::new("document-input", key.clone())).await;
    assert!(outcome.is_recorded(), "unexpected outcome: {:?}", outcome);

    client.poll(&mut session, |_| {}).await.unwrap();

    let record = session.record().unwrap();
    assert_eq!(record.key, key);
    assert_eq!(record.decision, Decision::Escalate);
    assert!(record.decision.requires_review());
    assert_eq!(record.summary, "Summary\nThe agreement omits clause 12.");
    assert_eq!(session.original_name(), "msa.pdf");
}

#[tokio::test]
async fn test_missing_table_leads_to_timeout() {
    let dir = TempDir::new().unwrap();
    let client = client(
        &dir,
        ClientConfig {
            max_attempts: 1,
            poll_interval_secs: 1,
        },
    );

    // No destination table, so the worker finishes without appending
    let config = WorkerConfig::new(PROJECT, "abc123");
    let worker = worker(&dir, MockProvider::new("Fine. Decision: APPROVE"), config);

    let mut session = client.start("invoice.png").unwrap();
    client.upload(&mut session, b"png").unwrap();
    let key = session.key().unwrap().clone();

    let outcome = worker.handle(&TriggerEvent::new("document-input", key)).await;
    assert!(matches!(outcome, InvocationOutcome::PersistenceSkipped(_)));

    client.poll(&mut session, |_| {}).await.unwrap();
    assert_eq!(session.state(), &SessionState::TimedOut);
}

#[tokio::test]
async fn test_refused_append_leads_to_timeout() {
    let dir = TempDir::new().unwrap();
    let client = client(&dir, ClientConfig::default());
    let shared = SqliteResultStore::new(dir.path().join("results.db")).unwrap();
    let worker = worker_with(
        &dir,
        MockProvider::new("Looks fine. Decision: APPROVE"),
        ReadOnlyResults(shared),
        worker_config(),
    );

    let mut session = client.start("permit.pdf").unwrap();
    client.upload(&mut session, b"%PDF-1.4").unwrap();
    let key = session.key().unwrap().clone();

    let outcome = worker.handle(&TriggerEvent::new("document-input", key.clone())).await;
    match outcome {
        InvocationOutcome::Unpersisted { record, reason } => {
            assert_eq!(record.key, key);
            assert_eq!(record.decision, Decision::Approve);
            assert!(reason.contains("readonly"));
        }
        other => panic!("expected Unpersisted, got {:?}", other),
    }

    // The client waits out its whole budget on the paused clock
    tokio::time::pause();
    let started = tokio::time::Instant::now();
    let mut attempts = 0;
    client.poll(&mut session, |_| attempts += 1).await.unwrap();

    assert_eq!(session.state(), &SessionState::TimedOut);
    assert_eq!(attempts, 20);
    assert_eq!(started.elapsed(), std::time::Duration::from_secs(60));

    let table = TableRef::new(PROJECT, DATASET, TABLE).unwrap();
    let rows = SqliteResultStore::new(dir.path().join("results.db")).unwrap().query(&table, &key).unwrap();
    assert!(rows.is_empty());
}

#[tokio::test]
async fn test_duplicate_delivery_client_sees_newest() {
    let dir = TempDir::new().unwrap();
    let client = client(&dir, ClientConfig::default());

    let mut session = client.start("lease.jpg").unwrap();
    client.upload(&mut session, b"jpg").unwrap();
    let event = TriggerEvent::new("document-input", session.key().unwrap().clone());

    let mut llm = MockProvider::new("Draft review. Decision: FLAG");
    let worker = worker(&dir, llm.clone(), worker_config());
    assert!(worker.handle(&event).await.is_recorded());

    // Redelivery at least a millisecond later
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    llm.add_response("Clause 12", "Final review. Decision: APPROVE");
    assert!(worker.handle(&event).await.is_recorded());

    client.poll(&mut session, |_| {}).await.unwrap();
    let record = session.record().unwrap();
    assert_eq!(record.summary, "Final review.");
    assert_eq!(record.decision, Decision::Approve);
}
