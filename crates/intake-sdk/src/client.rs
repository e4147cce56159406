//! Polling client implementation.

use crate::config::ClientConfig;
use crate::error::SessionError;
use crate::session::{PollProgress, Session, SessionState};
use intake_domain::traits::{ArtifactStore, ResultStore};
use intake_domain::{ArtifactKey, Clock, DocumentKind, NameDisambiguator, ResultRecord, SystemClock, TableRef};
use std::fmt::Display;
use std::sync::{Arc, Mutex};
use tokio::time::{sleep, Instant};

/// Uploads documents and waits for their result records
///
/// The client and the worker share nothing but the artifact bucket and the
/// result table. After an upload the client can only poll; a missing record
/// at the end of the attempt budget is reported as
/// [`SessionState::TimedOut`], never as an error.
///
/// Result queries run on the blocking thread pool so a slow store does not
/// stall the async runtime.
pub struct PollingClient<A, R, C = SystemClock> {
    artifacts: A,
    results: Arc<Mutex<R>>,
    table: TableRef,
    namer: NameDisambiguator<C>,
    config: ClientConfig,
}

impl<A, R> PollingClient<A, R, SystemClock> {
    /// Create a client with the system clock
    pub fn new(artifacts: A, results: R, table: TableRef, config: ClientConfig) -> Result<Self, SessionError> {
        config.validate().map_err(SessionError::Config)?;
        Ok(Self {
            artifacts,
            results: Arc::new(Mutex::new(results)),
            table,
            namer: NameDisambiguator::new(SystemClock),
            config,
        })
    }
}

impl<A, R, C> PollingClient<A, R, C>
where
    A: ArtifactStore,
    A::Error: Display,
    R: ResultStore + Send + 'static,
    R::Error: Display,
    C: Clock,
{
    /// Replace the clock used for key disambiguation
    pub fn with_clock<C2: Clock>(self, clock: C2) -> PollingClient<A, R, C2> {
        PollingClient {
            artifacts: self.artifacts,
            results: self.results,
            table: self.table,
            namer: NameDisambiguator::new(clock),
            config: self.config,
        }
    }

    /// Client configuration
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Result table being polled
    pub fn table(&self) -> &TableRef {
        &self.table
    }

    /// Start a session for a file the user selected
    ///
    /// # Errors
    /// [`SessionError::UnsupportedType`] unless the name ends in `.pdf`,
    /// `.png`, `.jpg` or `.jpeg`.
    pub fn start(&self, filename: &str) -> Result<Session, SessionError> {
        if DocumentKind::from_filename(filename).is_none() {
            return Err(SessionError::UnsupportedType(filename.to_string()));
        }
        Ok(Session::new(filename))
    }

    /// Write the file under a fresh disambiguated key
    ///
    /// On failure the session ends in [`SessionState::UploadFailed`] and the
    /// error is returned; polling is not possible afterwards.
    pub fn upload(&self, session: &mut Session, bytes: &[u8]) -> Result<(), SessionError> {
        if session.state() != &SessionState::Idle {
            return Err(SessionError::InvalidState(format!(
                "cannot upload from state '{}'",
                session.state().label()
            )));
        }

        session.transition(SessionState::Uploading);

        let result = self
            .namer
            .disambiguate(session.original_name())
            .map_err(SessionError::from)
            .and_then(|key| {
                self.artifacts
                    .put(&key, bytes)
                    .map(|_| key)
                    .map_err(|e| SessionError::Upload(e.to_string()))
            });

        match result {
            Ok(key) => {
                tracing::info!(
                    "Uploaded '{}' as '{}' to bucket '{}'",
                    session.original_name(),
                    key,
                    self.artifacts.bucket()
                );
                session.set_key(key);
                session.transition(SessionState::Polling);
                Ok(())
            }
            Err(e) => {
                tracing::error!("Upload of '{}' failed: {}", session.original_name(), e);
                session.transition(SessionState::UploadFailed(e.to_string()));
                Err(e)
            }
        }
    }

    /// Poll the result table until a record appears or attempts run out
    ///
    /// `observer` receives a [`PollProgress`] after every attempt. A query
    /// error ends the session in [`SessionState::QueryFailed`] and is
    /// returned; running out of attempts is not an error.
    pub async fn poll<F>(&self, session: &mut Session, mut observer: F) -> Result<(), SessionError>
    where
        F: FnMut(PollProgress),
    {
        let key = match (session.state(), session.key()) {
            (SessionState::Polling, Some(key)) => key.clone(),
            (state, _) => {
                return Err(SessionError::InvalidState(format!(
                    "cannot poll from state '{}'",
                    state.label()
                )))
            }
        };

        let max_attempts = self.config.max_attempts;
        let started = Instant::now();

        for attempt in 1..=max_attempts {
            match self.latest(&key).await {
                Ok(Some(record)) => {
                    observer(PollProgress::done(attempt, max_attempts, started.elapsed()));
                    tracing::info!("Result for '{}' found on attempt {}", key, attempt);
                    session.transition(SessionState::Found(record));
                    return Ok(());
                }
                Ok(None) => {
                    observer(PollProgress::waiting(attempt, max_attempts, started.elapsed()));
                    tracing::debug!("No result for '{}' yet ({}/{})", key, attempt, max_attempts);
                }
                Err(reason) => {
                    tracing::error!("Polling for '{}' failed: {}", key, reason);
                    session.transition(SessionState::QueryFailed(reason.clone()));
                    return Err(SessionError::Query(reason));
                }
            }

            sleep(self.config.poll_interval()).await;
        }

        tracing::warn!(
            "No result for '{}' after {} attempts ({:?})",
            key,
            max_attempts,
            started.elapsed()
        );
        session.transition(SessionState::TimedOut);
        Ok(())
    }

    /// Newest record for `key`, queried off the async runtime
    async fn latest(&self, key: &ArtifactKey) -> Result<Option<ResultRecord>, String> {
        let results = Arc::clone(&self.results);
        let table = self.table.clone();
        let key = key.clone();

        tokio::task::spawn_blocking(move || {
            let results = results.lock().map_err(|e| format!("Store lock error: {}", e))?;
            results.latest(&table, &key).map_err(|e| e.to_string())
        })
        .await
        .map_err(|e| format!("Task join error: {}", e))?
    }

    /// Start, upload and poll in one call
    pub async fn submit<F>(&self, filename: &str, bytes: &[u8], observer: F) -> Result<Session, SessionError>
    where
        F: FnMut(PollProgress),
    {
        let mut session = self.start(filename)?;
        self.upload(&mut session, bytes)?;
        self.poll(&mut session, observer).await?;
        Ok(session)
    }
}
