//! Configuration for the extraction worker

use intake_domain::TableRef;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default processing location
pub const DEFAULT_LOCATION: &str = "us-central1";

/// Invocation id recorded when no revision is configured
pub const DEFAULT_INVOCATION_ID: &str = "unknown";

/// Configuration for the ExtractionWorker
///
/// Read once at startup and handed to the worker; nothing re-reads the
/// environment per invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerConfig {
    /// Project owning the processor and the result table (`PROJECT_ID`)
    pub project_id: String,

    /// Document processor id (`PROCESSOR_ID`)
    pub processor_id: String,

    /// Processor location (`LOCATION`)
    pub location: String,

    /// Result dataset (`BIGQUERY_DATASET_ID`); persistence is skipped when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dataset_id: Option<String>,

    /// Result table (`BIGQUERY_TABLE_ID`); persistence is skipped when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table_id: Option<String>,

    /// Written to every record (`K_REVISION`)
    pub invocation_id: String,

    /// Only events from this bucket are handled; defaults to the artifact
    /// store's own bucket when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifact_bucket: Option<String>,

    /// Generative model name
    pub model: String,

    /// Ollama API endpoint
    pub ollama_endpoint: String,

    /// Document processing API endpoint
    pub document_endpoint: String,

    /// OAuth bearer token for the document endpoint (`DOCUMENT_ACCESS_TOKEN`)
    ///
    /// Never written back out when the configuration is serialized.
    #[serde(skip_serializing)]
    pub access_token: Option<String>,

    /// Maximum time for a single generation call (seconds)
    pub generation_timeout_secs: u64,

    /// Extracted text beyond this many characters is not sent to the model
    pub max_text_length: usize,

    /// Skip artifacts that already have a result record
    pub skip_processed: bool,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            project_id: String::new(),
            processor_id: String::new(),
            location: DEFAULT_LOCATION.to_string(),
            dataset_id: None,
            table_id: None,
            invocation_id: DEFAULT_INVOCATION_ID.to_string(),
            artifact_bucket: None,
            model: "llama3.1".to_string(),
            ollama_endpoint: "http://localhost:11434".to_string(),
            document_endpoint: "https://documentai.googleapis.com".to_string(),
            access_token: None,
            generation_timeout_secs: 120,
            max_text_length: 200_000,
            skip_processed: false,
        }
    }
}

impl WorkerConfig {
    /// Create a configuration for a project and processor, defaults elsewhere
    pub fn new(project_id: impl Into<String>, processor_id: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            processor_id: processor_id.into(),
            ..Self::default()
        }
    }

    /// Set the result table
    pub fn with_table(mut self, dataset_id: impl Into<String>, table_id: impl Into<String>) -> Self {
        self.dataset_id = Some(dataset_id.into());
        self.table_id = Some(table_id.into());
        self
    }

    /// Get the generation timeout as a Duration
    pub fn generation_timeout(&self) -> Duration {
        Duration::from_secs(self.generation_timeout_secs)
    }

    /// Load configuration from process environment variables
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env(|name| std::env::var(name).ok());
        config
    }

    /// Overlay environment-style variables on this configuration
    ///
    /// `lookup` returns the value of a variable, if set. Empty values leave
    /// required fields untouched and clear the optional table identifiers.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(v) = non_empty("PROJECT_ID") {
            self.project_id = v;
        }
        if let Some(v) = non_empty("PROCESSOR_ID") {
            self.processor_id = v;
        }
        if let Some(v) = non_empty("LOCATION") {
            self.location = v;
        }
        if let Some(v) = lookup("BIGQUERY_DATASET_ID") {
            self.dataset_id = Some(v).filter(|v| !v.trim().is_empty());
        }
        if let Some(v) = lookup("BIGQUERY_TABLE_ID") {
            self.table_id = Some(v).filter(|v| !v.trim().is_empty());
        }
        if let Some(v) = non_empty("K_REVISION") {
            self.invocation_id = v;
        }
        if let Some(v) = non_empty("DOCUMENT_ACCESS_TOKEN") {
            self.access_token = Some(v.trim().to_string());
        }
    }

    /// The result table, when both dataset and table are configured
    pub fn table_ref(&self) -> Result<Option<TableRef>, String> {
        match (&self.dataset_id, &self.table_id) {
            (Some(dataset), Some(table)) if !dataset.is_empty() && !table.is_empty() => {
                TableRef::new(&self.project_id, dataset, table).map(Some)
            }
            _ => Ok(None),
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.project_id.trim().is_empty() {
            return Err("project_id is required (PROJECT_ID)".to_string());
        }
        if self.processor_id.trim().is_empty() {
            return Err("processor_id is required (PROCESSOR_ID)".to_string());
        }
        if self.location.trim().is_empty() {
            return Err("location must not be empty".to_string());
        }
        if self.model.trim().is_empty() {
            return Err("model must not be empty".to_string());
        }
        if self.generation_timeout_secs == 0 {
            return Err("generation_timeout_secs must be greater than 0".to_string());
        }
        if self.max_text_length == 0 {
            return Err("max_text_length must be greater than 0".to_string());
        }
        self.table_ref()?;
        Ok(())
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, String> {
        toml::from_str(toml_str).map_err(|e| format!("Failed to parse TOML: {}", e))
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, String> {
        toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize to TOML: {}", e))
    }
}
