//! Result records - one row per extraction worker invocation

use crate::{ArtifactKey, Decision};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome of processing one artifact
///
/// Records are append-only. Several records may share a key when the trigger
/// was delivered more than once; the newest one (highest `created_at`, then
/// latest insertion) is authoritative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultRecord {
    /// Artifact key the record belongs to
    #[serde(rename = "file_name")]
    pub key: ArtifactKey,

    /// Bucket the artifact was read from
    #[serde(rename = "document_bucket")]
    pub source_bucket: String,

    /// Length of the extracted text in characters
    pub extracted_text_length: u64,

    /// Model-written summary (decision clause removed when parsed)
    pub summary: String,

    /// Parsed compliance decision
    #[serde(rename = "agent_decision")]
    pub decision: Decision,

    /// Identity of the worker deployment that produced the record
    pub invocation_id: String,

    /// Creation time, milliseconds since the Unix epoch
    pub created_at: u64,
}

impl ResultRecord {
    /// First `max_chars` characters of the summary, for log lines and previews
    pub fn summary_preview(&self, max_chars: usize) -> &str {
        match self.summary.char_indices().nth(max_chars) {
            Some((idx, _)) => &self.summary[..idx],
            None => &self.summary,
        }
    }
}

/// Fully qualified analytic table identifier (`project.dataset.table`)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableRef {
    project: String,
    dataset: String,
    table: String,
}

impl TableRef {
    /// Create a table reference
    ///
    /// # Errors
    /// Returns error if any part is empty, or if dataset/table contain
    /// characters other than ASCII alphanumerics and `_`.
    pub fn new(
        project: impl Into<String>,
        dataset: impl Into<String>,
        table: impl Into<String>,
    ) -> Result<Self, String> {
        let project = project.into();
        let dataset = dataset.into();
        let table = table.into();

        if project.trim().is_empty() {
            return Err("Project id cannot be empty".to_string());
        }
        for (label, value) in [("dataset", &dataset), ("table", &table)] {
            if value.is_empty() {
                return Err(format!("The {} id cannot be empty", label));
            }
            if !value.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
                return Err(format!("Invalid {} id: {}", label, value));
            }
        }

        Ok(Self {
            project,
            dataset,
            table,
        })
    }

    /// Project (processing-service identity)
    pub fn project(&self) -> &str {
        &self.project
    }

    /// Dataset identifier
    pub fn dataset(&self) -> &str {
        &self.dataset
    }

    /// Table identifier
    pub fn table(&self) -> &str {
        &self.table
    }
}

impl fmt::Display for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.project, self.dataset, self.table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_ref_display() {
        let table = TableRef::new("docai-final", "document_processing_logs", "summary_results").unwrap();
        assert_eq!(
            table.to_string(),
            "docai-final.document_processing_logs.summary_results"
        );
    }

    #[test]
    fn test_table_ref_validation() {
        assert!(TableRef::new("", "d", "t").is_err());
        assert!(TableRef::new("p", "", "t").is_err());
        assert!(TableRef::new("p", "d", "").is_err());
        assert!(TableRef::new("p", "d;drop", "t").is_err());
        assert!(TableRef::new("p", "d", "t.x").is_err());
    }

    #[test]
    fn test_summary_preview_respects_char_boundaries() {
        let record = ResultRecord {
            key: ArtifactKey::parse("a.pdf").unwrap(),
            source_bucket: "b".to_string(),
            extracted_text_length: 4,
            summary: "héllo wörld".to_string(),
            decision: Decision::Approve,
            invocation_id: "rev-1".to_string(),
            created_at: 0,
        };
        assert_eq!(record.summary_preview(2), "hé");
        assert_eq!(record.summary_preview(100), "héllo wörld");
    }

    #[test]
    fn test_record_json_field_names() {
        let record = ResultRecord {
            key: ArtifactKey::parse("a.pdf").unwrap(),
            source_bucket: "bucket".to_string(),
            extracted_text_length: 10,
            summary: "ok".to_string(),
            decision: Decision::Flag,
            invocation_id: "unknown".to_string(),
            created_at: 42,
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["file_name"], "a.pdf");
        assert_eq!(json["document_bucket"], "bucket");
        assert_eq!(json["agent_decision"], "FLAG");
    }
}
