//! Intake Rust SDK
//!
//! Client library for the upload side of the intake pipeline: store a
//! document under a collision-resistant key, then poll the result table
//! until the worker's record shows up.
//!
//! # Example
//!
//! ```no_run
//! use intake_domain::TableRef;
//! use intake_sdk::{ClientConfig, PollingClient, SessionState};
//! use intake_store::{FsArtifactStore, SqliteResultStore};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = PollingClient::new(
//!     FsArtifactStore::new("document-input")?,
//!     SqliteResultStore::new("results.db")?,
//!     TableRef::new("docai-final", "document_processing_logs", "summary_results")?,
//!     ClientConfig::default(),
//! )?;
//!
//! let bytes = std::fs::read("report.pdf")?;
//! let session = client
//!     .submit("report.pdf", &bytes, |p| eprintln!("{}%", p.percent))
//!     .await?;
//!
//! match session.state() {
//!     SessionState::Found(record) => println!("{}", record.decision),
//!     SessionState::TimedOut => println!("No result yet"),
//!     _ => {}
//! }
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod client;
mod config;
mod error;
mod session;

pub use client::PollingClient;
pub use config::ClientConfig;
pub use error::SessionError;
pub use session::{PollProgress, Session, SessionState};
