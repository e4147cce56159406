//! Upload session state.

use intake_domain::{ArtifactKey, ResultRecord};
use std::time::Duration;

/// Where an upload session is in its lifecycle
///
/// ```text
/// Idle → Uploading → Polling → Found
///            │          ├────→ TimedOut
///            │          └────→ QueryFailed
///            └────→ UploadFailed
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// File selected, nothing written yet
    Idle,
    /// Artifact write in progress
    Uploading,
    /// Waiting for a result record
    Polling,
    /// A result record was found
    Found(ResultRecord),
    /// No record appeared within the attempt budget
    TimedOut,
    /// The artifact could not be written
    UploadFailed(String),
    /// The result table could not be queried
    QueryFailed(String),
}

impl SessionState {
    /// Short state name
    pub fn label(&self) -> &'static str {
        match self {
            SessionState::Idle => "idle",
            SessionState::Uploading => "uploading",
            SessionState::Polling => "polling",
            SessionState::Found(_) => "found",
            SessionState::TimedOut => "timed_out",
            SessionState::UploadFailed(_) => "upload_failed",
            SessionState::QueryFailed(_) => "query_failed",
        }
    }

    /// True once no further transition is possible
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SessionState::Found(_)
                | SessionState::TimedOut
                | SessionState::UploadFailed(_)
                | SessionState::QueryFailed(_)
        )
    }
}

/// Progress report emitted once per polling attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollProgress {
    /// Attempt number, starting at 1
    pub attempt: u32,
    /// Attempt budget
    pub max_attempts: u32,
    /// Time since polling started
    pub elapsed: Duration,
    /// Completion estimate, 100 once a result is found
    pub percent: u8,
}

impl PollProgress {
    pub(crate) fn waiting(attempt: u32, max_attempts: u32, elapsed: Duration) -> Self {
        let percent = (u64::from(attempt) * 100 / u64::from(max_attempts.max(1))).min(100) as u8;
        Self {
            attempt,
            max_attempts,
            elapsed,
            percent,
        }
    }

    pub(crate) fn done(attempt: u32, max_attempts: u32, elapsed: Duration) -> Self {
        Self {
            attempt,
            max_attempts,
            elapsed,
            percent: 100,
        }
    }
}

/// One user upload, from file selection to a terminal state
#[derive(Debug, Clone)]
pub struct Session {
    original_name: String,
    key: Option<ArtifactKey>,
    state: SessionState,
    history: Vec<SessionState>,
}

impl Session {
    pub(crate) fn new(original_name: impl Into<String>) -> Self {
        Self {
            original_name: original_name.into(),
            key: None,
            state: SessionState::Idle,
            history: vec![SessionState::Idle],
        }
    }

    /// File name as the user chose it
    pub fn original_name(&self) -> &str {
        &self.original_name
    }

    /// Key the artifact was stored under, once uploaded
    pub fn key(&self) -> Option<&ArtifactKey> {
        self.key.as_ref()
    }

    /// Current state
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Every state the session has been in, oldest first
    pub fn history(&self) -> &[SessionState] {
        &self.history
    }

    /// The result record, if one was found
    pub fn record(&self) -> Option<&ResultRecord> {
        match &self.state {
            SessionState::Found(record) => Some(record),
            _ => None,
        }
    }

    pub(crate) fn set_key(&mut self, key: ArtifactKey) {
        self.key = Some(key);
    }

    pub(crate) fn transition(&mut self, next: SessionState) {
        tracing::debug!("Session '{}': {} -> {}", self.original_name, self.state.label(), next.label());
        self.history.push(next.clone());
        self.state = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_session_is_idle() {
        let session = Session::new("report.pdf");
        assert_eq!(session.state(), &SessionState::Idle);
        assert_eq!(session.history(), &[SessionState::Idle]);
        assert!(session.key().is_none());
        assert!(session.record().is_none());
    }

    #[test]
    fn test_transition_records_history() {
        let mut session = Session::new("report.pdf");
        session.transition(SessionState::Uploading);
        session.transition(SessionState::UploadFailed("disk full".into()));

        let labels: Vec<_> = session.history().iter().map(SessionState::label).collect();
        assert_eq!(labels, vec!["idle", "uploading", "upload_failed"]);
        assert!(session.state().is_terminal());
    }

    #[test]
    fn test_progress_percent() {
        assert_eq!(PollProgress::waiting(1, 20, Duration::ZERO).percent, 5);
        assert_eq!(PollProgress::waiting(20, 20, Duration::ZERO).percent, 100);
        assert_eq!(PollProgress::waiting(1, 3, Duration::ZERO).percent, 33);
        assert_eq!(PollProgress::done(2, 20, Duration::ZERO).percent, 100);
    }
}
