//! Trait definitions for external interactions
//!
//! These traits define the boundaries between the pipeline logic and the
//! managed services it talks to. Infrastructure implementations live in other
//! crates.

use crate::{ArtifactKey, ResultRecord, TableRef};

/// Write-once object storage for uploaded documents
///
/// Implemented by the infrastructure layer (intake-store)
pub trait ArtifactStore {
    /// Error type for store operations
    type Error;

    /// Name of the bucket this store writes to
    fn bucket(&self) -> &str;

    /// Store bytes under a new key; durable once this returns `Ok`
    fn put(&self, key: &ArtifactKey, bytes: &[u8]) -> Result<(), Self::Error>;

    /// Fetch the bytes stored under a key
    fn get(&self, key: &ArtifactKey) -> Result<Vec<u8>, Self::Error>;

    /// List every key currently in the bucket
    fn list(&self) -> Result<Vec<ArtifactKey>, Self::Error>;
}

/// Append-only analytic table of result records
///
/// Implemented by the infrastructure layer (intake-store)
pub trait ResultStore {
    /// Error type for store operations
    type Error;

    /// Append a record to a table
    fn append(&mut self, table: &TableRef, record: &ResultRecord) -> Result<(), Self::Error>;

    /// All records for a key, newest first
    fn query(&self, table: &TableRef, key: &ArtifactKey) -> Result<Vec<ResultRecord>, Self::Error>;

    /// The most recent record for a key, if any
    fn latest(&self, table: &TableRef, key: &ArtifactKey) -> Result<Option<ResultRecord>, Self::Error> {
        Ok(self.query(table, key)?.into_iter().next())
    }
}

/// Trait for generative-text operations
///
/// Implemented by the infrastructure layer (intake-llm)
pub trait LlmProvider {
    /// Error type for LLM operations
    type Error;

    /// Generate a free-text completion for a prompt
    fn generate(&self, prompt: &str) -> Result<String, Self::Error>;

    /// Name of the model answering requests
    fn model_name(&self) -> &str;
}

/// Trait for document-understanding (OCR / parsing) operations
///
/// Implemented by the infrastructure layer (intake-llm)
pub trait DocumentProcessor {
    /// Error type for processing operations
    type Error;

    /// Extract plain text from raw document bytes
    fn process(&self, content: &[u8], mime_type: &str) -> Result<String, Self::Error>;
}
