//! Intake Worker
//!
//! Background service that stands in for an object-creation trigger: it
//! watches an artifact bucket and delivers each new artifact to the
//! extraction worker.
//!
//! # Delivery Semantics
//!
//! Delivery is at-least-once. A watcher remembers what it has delivered only
//! for its own lifetime, so a restart delivers every artifact again. The
//! extraction worker tolerates duplicates (and can suppress them with
//! `skip_processed`).
//!
//! # Usage
//!
//! ```no_run
//! use intake_extractor::{ExtractionWorker, WorkerConfig};
//! use intake_llm::{MockProcessor, MockProvider};
//! use intake_store::{FsArtifactStore, SqliteResultStore};
//! use intake_worker::{TriggerWatcher, WatcherConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let worker = ExtractionWorker::new(
//!     FsArtifactStore::new("document-input")?,
//!     MockProcessor::new("text"),
//!     MockProvider::new("Summary. Decision: APPROVE"),
//!     SqliteResultStore::new("results.db")?,
//!     WorkerConfig::new("docai-final", "abc123"),
//! )?;
//!
//! let mut watcher = TriggerWatcher::new(WatcherConfig::default())?;
//! watcher.run_cycles(&worker, 3).await?;
//! println!("{}", watcher.metrics().summary());
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration
//!
//! ```toml
//! [watcher]
//! poll_interval_secs = 2
//! deliver_existing = true
//! ```

#![warn(missing_docs)]

mod config;
mod error;
mod metrics;
mod watcher;

pub use config::WatcherConfig;
pub use error::WatcherError;
pub use metrics::WorkerMetrics;
pub use watcher::TriggerWatcher;
