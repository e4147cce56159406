//! Output formatting for the CLI.

use crate::config::OutputFormat;
use crate::error::Result;
use chrono::DateTime;
use colored::*;
use intake_domain::{ArtifactKey, Decision, ResultRecord};
use intake_extractor::InvocationOutcome;
use intake_sdk::{ClientConfig, PollProgress, Session, SessionState};
use intake_worker::WorkerMetrics;
use tabled::{
    builder::Builder,
    settings::{object::Columns, Modify, Style, Width},
};

const PROGRESS_WIDTH: usize = 20;
const SUMMARY_WIDTH: usize = 80;

/// Output formatter.
pub struct Formatter {
    format: OutputFormat,
    color_enabled: bool,
}

impl Formatter {
    /// Create a new formatter.
    pub fn new(format: OutputFormat, color_enabled: bool) -> Self {
        Self {
            format,
            color_enabled,
        }
    }

    /// Selected output format.
    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Render the outcome of an upload session.
    ///
    /// `polling` is the configuration the session was polled with; it sizes
    /// the window reported on timeout.
    pub fn format_session(&self, session: &Session, polling: &ClientConfig) -> Result<String> {
        if let SessionState::Found(record) = session.state() {
            return self.format_record(record, Some(session.original_name()));
        }

        let key = session.key().map(|k| k.to_string());
        if self.format == OutputFormat::Json {
            let mut value = serde_json::json!({
                "status": session.state().label(),
                "original_name": session.original_name(),
                "key": key,
            });
            match session.state() {
                SessionState::UploadFailed(reason) | SessionState::QueryFailed(reason) => {
                    value["error"] = serde_json::Value::String(reason.clone());
                }
                SessionState::TimedOut => {
                    value["attempts"] = polling.max_attempts.into();
                    value["poll_interval_secs"] = polling.poll_interval_secs.into();
                    value["timeout_secs"] = polling.timeout().as_secs().into();
                }
                _ => {}
            }
            return Ok(serde_json::to_string_pretty(&value)?);
        }

        let key = key.unwrap_or_else(|| "-".to_string());
        Ok(match session.state() {
            SessionState::TimedOut => self.warning(&self.timed_out(&key, polling)),
            SessionState::Polling => self.info(&format!(
                "Uploaded '{}' as '{}'. Check later with `intake result {}`.",
                session.original_name(),
                key,
                key
            )),
            SessionState::UploadFailed(reason) => self.error(&format!("Upload failed: {}", reason)),
            SessionState::QueryFailed(reason) => self.error(&format!("Result query failed: {}", reason)),
            state => self.info(&format!("Session is {}", state.label())),
        })
    }

    /// Timeout notice for a key that produced no result while polled.
    pub fn timed_out(&self, key: &str, polling: &ClientConfig) -> String {
        format!(
            "No result found for '{}' within {} x {}s ({}s). Check again with `intake result {}`.",
            key,
            polling.max_attempts,
            polling.poll_interval_secs,
            polling.timeout().as_secs(),
            key
        )
    }

    /// Render one result record.
    ///
    /// `original_name` is shown beside the stored key when known.
    pub fn format_record(&self, record: &ResultRecord, original_name: Option<&str>) -> Result<String> {
        match self.format {
            OutputFormat::Json => {
                let mut value = serde_json::to_value(record)?;
                value["status"] = serde_json::Value::String("found".to_string());
                if let Some(name) = original_name {
                    value["original_name"] = serde_json::Value::String(name.to_string());
                }
                Ok(serde_json::to_string_pretty(&value)?)
            }
            OutputFormat::Table => {
                let mut builder = Builder::default();
                builder.push_record(["Field", "Value"]);
                if let Some(name) = original_name {
                    builder.push_record(["Original file", name]);
                }
                builder.push_record(["Stored as", record.key.as_str()]);
                builder.push_record(["Bucket", &record.source_bucket]);
                builder.push_record(["Decision", record.decision.as_str()]);
                builder.push_record(["Extracted characters", &record.extracted_text_length.to_string()]);
                builder.push_record(["Invocation", &record.invocation_id]);
                builder.push_record(["Created", &format_timestamp(record.created_at)]);

                let mut table = builder.build();
                table.with(Style::rounded());

                Ok(format!(
                    "{}\n\n{}\n{}\n\n{}",
                    self.decision_badge(record.decision),
                    self.colorize("Summary", "cyan"),
                    record.summary,
                    table
                ))
            }
        }
    }

    /// Report that no record exists for a key.
    pub fn format_missing(&self, key: &ArtifactKey) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(&serde_json::json!({
                "status": "not_found",
                "key": key.as_str(),
            }))?),
            OutputFormat::Table => Ok(self.warning(&format!("No result recorded for '{}'", key))),
        }
    }

    /// One-line banner for a decision.
    ///
    /// ESCALATE and FLAG need a human; anything else counts as processed.
    pub fn decision_badge(&self, decision: Decision) -> String {
        if decision.requires_review() {
            self.warning(&format!("Document flagged for review ({})", decision))
        } else {
            self.success(&format!("Document processed successfully ({})", decision))
        }
    }

    /// Progress line for one polling attempt.
    pub fn progress(&self, progress: &PollProgress) -> String {
        let filled = usize::from(progress.percent) * PROGRESS_WIDTH / 100;
        format!(
            "[{}{}] {:>3}% attempt {}/{} ({}s)",
            "#".repeat(filled),
            " ".repeat(PROGRESS_WIDTH - filled),
            progress.percent,
            progress.attempt,
            progress.max_attempts,
            progress.elapsed.as_secs()
        )
    }

    /// Render the outcome of a single worker invocation.
    pub fn format_outcome(&self, outcome: &InvocationOutcome) -> Result<String> {
        if self.format == OutputFormat::Json {
            let mut value = serde_json::json!({ "outcome": outcome.label() });
            if let Some(record) = outcome.record() {
                value["record"] = serde_json::to_value(record)?;
            }
            match outcome {
                InvocationOutcome::Unpersisted { reason, .. } => {
                    value["error"] = serde_json::Value::String(reason.clone());
                }
                InvocationOutcome::Failed(e) => {
                    value["error"] = serde_json::Value::String(e.to_string());
                }
                InvocationOutcome::AlreadyProcessed(key) => {
                    value["key"] = serde_json::Value::String(key.to_string());
                }
                InvocationOutcome::Ignored { bucket } => {
                    value["bucket"] = serde_json::Value::String(bucket.clone());
                }
                _ => {}
            }
            return Ok(serde_json::to_string_pretty(&value)?);
        }

        Ok(match outcome {
            InvocationOutcome::Recorded(record) => format!(
                "{}\n{}",
                self.success(&format!("Recorded result for '{}'", record.key)),
                self.format_record(record, None)?
            ),
            InvocationOutcome::PersistenceSkipped(record) => format!(
                "{}\n{}",
                self.warning("No result table configured; result was not stored"),
                self.format_record(record, None)?
            ),
            InvocationOutcome::Unpersisted { record, reason } => format!(
                "{}\n{}",
                self.error(&format!("Result for '{}' could not be stored: {}", record.key, reason)),
                self.format_record(record, None)?
            ),
            InvocationOutcome::Failed(e) => self.error(&format!("Processing failed: {}", e)),
            InvocationOutcome::AlreadyProcessed(key) => {
                self.info(&format!("'{}' already has a result; skipped", key))
            }
            InvocationOutcome::Ignored { bucket } => {
                self.warning(&format!("Event for bucket '{}' ignored", bucket))
            }
        })
    }

    /// Render watcher metrics.
    pub fn format_metrics(&self, metrics: &WorkerMetrics) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(&serde_json::json!({
                "scan_count": metrics.scan_count,
                "events": metrics.events,
                "recorded": metrics.recorded,
                "unpersisted": metrics.unpersisted,
                "persistence_skipped": metrics.persistence_skipped,
                "failed": metrics.failed,
                "already_processed": metrics.already_processed,
                "ignored": metrics.ignored,
                "total_runtime_secs": metrics.total_runtime_secs,
            }))?),
            OutputFormat::Table => Ok(metrics.summary()),
        }
    }

    /// Render a list of records as a compact table.
    pub fn format_records(&self, records: &[ResultRecord]) -> Result<String> {
        if self.format == OutputFormat::Json {
            return Ok(serde_json::to_string_pretty(records)?);
        }
        if records.is_empty() {
            return Ok(self.colorize("No results found.", "yellow"));
        }

        let mut builder = Builder::default();
        builder.push_record(["Created", "Decision", "Summary"]);
        for record in records {
            builder.push_record([
                format_timestamp(record.created_at),
                record.decision.to_string(),
                record.summary_preview(SUMMARY_WIDTH).replace('\n', " "),
            ]);
        }

        let mut table = builder.build();
        table
            .with(Style::rounded())
            .with(Modify::new(Columns::last()).with(Width::wrap(SUMMARY_WIDTH)));
        Ok(table.to_string())
    }

    /// Format a success message.
    pub fn success(&self, message: &str) -> String {
        self.colorize(&format!("✓ {}", message), "green")
    }

    /// Format an error message.
    pub fn error(&self, message: &str) -> String {
        self.colorize(&format!("✗ {}", message), "red")
    }

    /// Format an info message.
    pub fn info(&self, message: &str) -> String {
        self.colorize(&format!("ℹ {}", message), "blue")
    }

    /// Format a warning message.
    pub fn warning(&self, message: &str) -> String {
        self.colorize(&format!("⚠ {}", message), "yellow")
    }

    /// Colorize text if color is enabled.
    fn colorize(&self, text: &str, color: &str) -> String {
        if !self.color_enabled {
            return text.to_string();
        }

        match color {
            "red" => text.red().to_string(),
            "green" => text.green().to_string(),
            "blue" => text.blue().to_string(),
            "yellow" => text.yellow().to_string(),
            "cyan" => text.cyan().to_string(),
            _ => text.to_string(),
        }
    }
}

/// Milliseconds since the epoch as an RFC 3339 UTC timestamp.
fn format_timestamp(millis: u64) -> String {
    i64::try_from(millis)
        .ok()
        .and_then(DateTime::from_timestamp_millis)
        .map(|t| t.to_rfc3339_opts(chrono::SecondsFormat::Millis, true))
        .unwrap_or_else(|| millis.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn record(decision: Decision) -> ResultRecord {
        ResultRecord {
            key: ArtifactKey::parse("report_20250301093000123456.pdf").unwrap(),
            source_bucket: "document-input".to_string(),
            extracted_text_length: 1234,
            summary: "Clause 9 is missing.".to_string(),
            decision,
            invocation_id: "rev-7".to_string(),
            created_at: 1_740_821_400_123,
        }
    }

    #[test]
    fn test_decision_badges() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        assert_eq!(
            formatter.decision_badge(Decision::Escalate),
            "⚠ Document flagged for review (ESCALATE)"
        );
        assert!(formatter.decision_badge(Decision::Flag).contains("flagged for review"));
        assert!(formatter.decision_badge(Decision::Approve).contains("processed successfully"));
        assert!(formatter.decision_badge(Decision::Unknown).contains("processed successfully"));
    }

    #[test]
    fn test_record_table() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        let output = formatter.format_record(&record(Decision::Flag), Some("report.pdf")).unwrap();
        assert!(output.starts_with("⚠ Document flagged for review (FLAG)"));
        assert!(output.contains("Clause 9 is missing."));
        assert!(output.contains("Original file"));
        assert!(output.contains("report.pdf"));
        assert!(output.contains("report_20250301093000123456.pdf"));
        assert!(output.contains("2025-03-01T09:30:00.123Z"));
    }

    #[test]
    fn test_record_json() {
        let formatter = Formatter::new(OutputFormat::Json, false);
        let output = formatter.format_record(&record(Decision::Approve), Some("report.pdf")).unwrap();
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["status"], "found");
        assert_eq!(value["agent_decision"], "APPROVE");
        assert_eq!(value["file_name"], "report_20250301093000123456.pdf");
        assert_eq!(value["original_name"], "report.pdf");
    }

    #[test]
    fn test_progress_line() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        let progress = PollProgress {
            attempt: 5,
            max_attempts: 20,
            elapsed: Duration::from_secs(12),
            percent: 25,
        };
        assert_eq!(formatter.progress(&progress), "[#####               ]  25% attempt 5/20 (12s)");
    }

    #[test]
    fn test_timed_out_reports_window() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        let polling = ClientConfig::default();
        let message = formatter.timed_out("report_20250301093000123456.pdf", &polling);
        assert_eq!(
            message,
            "No result found for 'report_20250301093000123456.pdf' within 20 x 3s (60s). \
             Check again with `intake result report_20250301093000123456.pdf`."
        );
        assert!(!message.contains("under way"));
    }

    #[test]
    fn test_outcome_failed() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        let outcome = InvocationOutcome::Failed(intake_extractor::WorkerError::NotFound("gone".into()));
        assert!(formatter.format_outcome(&outcome).unwrap().starts_with("✗ Processing failed"));

        let json = Formatter::new(OutputFormat::Json, false);
        let value: serde_json::Value = serde_json::from_str(&json.format_outcome(&outcome).unwrap()).unwrap();
        assert_eq!(value["outcome"], "failed");
    }

    #[test]
    fn test_empty_records() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        assert!(formatter.format_records(&[]).unwrap().contains("No results found"));
    }

    #[test]
    fn test_colorize_disabled() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        assert_eq!(formatter.success("test"), "✓ test");
    }
}
