//! Command implementations.

pub mod config;
pub mod process;
pub mod result;
pub mod upload;
pub mod worker;

pub use self::config::execute_config;
pub use self::process::execute_process;
pub use self::result::execute_result;
pub use self::upload::execute_upload;
pub use self::worker::execute_worker;

use crate::config::Config;
use crate::error::Result;
use intake_extractor::ExtractionWorker;
use intake_llm::{HttpDocumentProcessor, OllamaProvider};
use intake_store::{FsArtifactStore, SqliteResultStore};

/// Extraction worker wired to the local bucket, the SQLite result store and
/// the HTTP services.
pub type LiveWorker = ExtractionWorker<FsArtifactStore, HttpDocumentProcessor, OllamaProvider, SqliteResultStore>;

/// Open the configured bucket directory.
pub fn open_bucket(config: &Config) -> Result<FsArtifactStore> {
    Ok(FsArtifactStore::new(&config.storage.bucket_dir)?)
}

/// Open the configured result database.
pub fn open_results(config: &Config) -> Result<SqliteResultStore> {
    if let Some(parent) = config.storage.results_db.parent() {
        std::fs::create_dir_all(parent)?;
    }
    Ok(SqliteResultStore::new(&config.storage.results_db)?)
}

/// Build an extraction worker from the configuration.
pub fn build_worker(config: &Config) -> Result<LiveWorker> {
    let settings = &config.worker;
    let mut processor = HttpDocumentProcessor::new(
        &settings.document_endpoint,
        &settings.project_id,
        &settings.location,
        &settings.processor_id,
    );
    match &settings.access_token {
        Some(token) => processor = processor.with_bearer_token(token),
        None => tracing::warn!(
            "DOCUMENT_ACCESS_TOKEN is not set; requests to {} are unauthenticated",
            settings.document_endpoint
        ),
    }
    let llm = OllamaProvider::new(&settings.ollama_endpoint, &settings.model)
        .with_timeout(settings.generation_timeout());
    tracing::info!(
        "Worker using processor '{}' and model '{}' at {}",
        processor.url(),
        settings.model,
        settings.ollama_endpoint
    );

    Ok(ExtractionWorker::new(
        open_bucket(config)?,
        processor,
        llm,
        open_results(config)?,
        settings.clone(),
    )?)
}
