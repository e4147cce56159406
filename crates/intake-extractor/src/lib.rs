//! Intake Extractor
//!
//! The worker stage of the intake pipeline: reacts to artifact-creation
//! events and turns each uploaded document into a result record.
//!
//! # Architecture
//!
//! ```text
//! TriggerEvent → ArtifactStore → DocumentProcessor → LlmProvider → DecisionParser → ResultStore
//! ```
//!
//! # Failure Semantics
//!
//! - Fetch, extraction and generation failures end the invocation; no record
//!   is written and the client eventually times out.
//! - A persistence failure after successful processing is logged and
//!   swallowed, reported as [`InvocationOutcome::Unpersisted`].
//! - Nothing is retried here; redelivery is the trigger's job.
//!
//! # Example Usage
//!
//! ```no_run
//! use intake_extractor::{ExtractionWorker, WorkerConfig};
//! use intake_domain::{ArtifactKey, TriggerEvent};
//! use intake_llm::{MockProcessor, MockProvider};
//! use intake_store::{FsArtifactStore, SqliteResultStore};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = WorkerConfig::new("docai-final", "abc123")
//!     .with_table("document_processing_logs", "summary_results");
//!
//! let worker = ExtractionWorker::new(
//!     FsArtifactStore::new("/var/lib/intake/document-input")?,
//!     MockProcessor::new("Extracted text"),
//!     MockProvider::new("Summary.\nDecision: APPROVE"),
//!     SqliteResultStore::new("results.db")?,
//!     config,
//! )?;
//!
//! let event = TriggerEvent::new("document-input", ArtifactKey::parse("report_20250301093000123456.pdf")?);
//! let outcome = worker.handle(&event).await;
//! println!("{}", outcome.label());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod config;
mod error;
mod extractor;
mod parser;
mod prompt;
mod types;

#[cfg(test)]
mod tests;

pub use config::{WorkerConfig, DEFAULT_INVOCATION_ID, DEFAULT_LOCATION};
pub use error::WorkerError;
pub use extractor::{ExtractionWorker, FALLBACK_MIME_TYPE};
pub use parser::{parse_decision, strip_markup, ParsedResponse};
pub use prompt::{build_prompt, REVIEW_INSTRUCTIONS};
pub use types::InvocationOutcome;
