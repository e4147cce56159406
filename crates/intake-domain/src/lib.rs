//! Intake Domain Layer
//!
//! Core model for the document-intake pipeline. Defines the values exchanged
//! between the upload client, the extraction worker and the result table, plus
//! the trait interfaces every infrastructure adapter implements.
//!
//! ## Key Concepts
//!
//! - **Artifact**: an uploaded source document, addressed by an [`ArtifactKey`]
//! - **Disambiguation**: deriving a collision-resistant key from a user filename
//! - **ResultRecord**: one row describing the outcome of processing one artifact
//! - **Decision**: the compliance verdict parsed from model output
//! - **Most-recent-wins**: the newest record for a key is the authoritative one
//!
//! ## Architecture
//!
//! - Pure business logic only
//! - Infrastructure implementations live in other crates
//! - Trait definitions for all external interactions (see [`traits`])

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod artifact;
pub mod clock;
pub mod decision;
pub mod event;
pub mod record;
pub mod traits;

// Re-exports for convenience
pub use artifact::{ArtifactKey, DocumentKind, KeyError, NameDisambiguator};
pub use clock::{Clock, FixedClock, SystemClock};
pub use decision::Decision;
pub use event::TriggerEvent;
pub use record::{ResultRecord, TableRef};
