//! Intake Storage Layer
//!
//! Local implementations of the two storage ports:
//!
//! - [`SqliteResultStore`]: the append-only result table (`ResultStore`)
//! - [`FsArtifactStore`]: a directory-backed write-once bucket (`ArtifactStore`)
//!
//! Both are safe to share between processes: the worker and the upload client
//! each open their own handle on the same database file and bucket directory.
//!
//! # Examples
//!
//! ```no_run
//! use intake_store::SqliteResultStore;
//!
//! let store = SqliteResultStore::new("results.db").unwrap();
//! // Store is now ready for append / query
//! ```

#![warn(missing_docs)]

mod artifact;

pub use artifact::{ArtifactError, FsArtifactStore};

use intake_domain::traits::ResultStore;
use intake_domain::{ArtifactKey, Decision, ResultRecord, TableRef};
use rusqlite::{params, Connection, Row};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// How long a writer waits on a lock held by another process
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Errors that can occur during result-store operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Invalid data format
    #[error("Invalid data: {0}")]
    InvalidData(String),
}

/// SQLite-based implementation of ResultStore
///
/// Each [`TableRef`] maps to one SQLite table named `<dataset>__<table>`,
/// created on first use. Rows are never updated or deleted. Queries order by
/// `created_at` and then insertion sequence, both descending, so the newest
/// record for a key always comes first even when timestamps tie.
///
/// # Thread Safety
///
/// SQLite connections are not thread-safe. Each thread should have its own
/// SqliteResultStore instance (or share one behind a mutex).
pub struct SqliteResultStore {
    conn: Connection,
}

impl SqliteResultStore {
    /// Open (or create) a result database at the given path
    ///
    /// Use `:memory:` for an in-memory database (useful for testing).
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        conn.busy_timeout(BUSY_TIMEOUT)?;

        // WAL lets the polling client read while the worker appends
        let mode: String = conn.query_row("PRAGMA journal_mode=WAL", [], |row| row.get(0))?;
        debug!("Opened result store (journal_mode={})", mode);

        Ok(Self { conn })
    }

    /// SQLite table name for a table reference
    fn table_name(table: &TableRef) -> String {
        format!("{}__{}", table.dataset(), table.table())
    }

    /// Create the table and its lookup index if they do not exist yet
    fn ensure_table(&self, table: &TableRef) -> Result<String, StoreError> {
        let name = Self::table_name(table);

        // Identifiers are restricted to [A-Za-z0-9_] by TableRef, so quoting is enough
        self.conn.execute_batch(&format!(
            r#"CREATE TABLE IF NOT EXISTS "{name}" (
                   seq INTEGER PRIMARY KEY AUTOINCREMENT,
                   file_name TEXT NOT NULL,
                   document_bucket TEXT NOT NULL,
                   extracted_text_length INTEGER NOT NULL,
                   summary TEXT NOT NULL,
                   agent_decision TEXT NOT NULL,
                   invocation_id TEXT NOT NULL,
                   created_at INTEGER NOT NULL
               );
               CREATE INDEX IF NOT EXISTS "{name}_file_name_idx"
                   ON "{name}" (file_name, created_at);"#
        ))?;

        Ok(name)
    }

    /// Number of records stored for a key (all duplicates included)
    pub fn count(&self, table: &TableRef, key: &ArtifactKey) -> Result<usize, StoreError> {
        let name = self.ensure_table(table)?;
        let count: i64 = self.conn.query_row(
            &format!(r#"SELECT COUNT(*) FROM "{name}" WHERE file_name = ?1"#),
            params![key.as_str()],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    fn row_to_record(row: &Row<'_>) -> rusqlite::Result<ResultRecord> {
        let key: String = row.get(0)?;
        let key = ArtifactKey::parse(key).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
        })?;

        let decision: String = row.get(4)?;
        let decision = Decision::parse(&decision).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                4,
                rusqlite::types::Type::Text,
                Box::new(StoreError::InvalidData(format!("Unknown decision: {}", decision))),
            )
        })?;

        Ok(ResultRecord {
            key,
            source_bucket: row.get(1)?,
            extracted_text_length: row.get::<_, i64>(2)? as u64,
            summary: row.get(3)?,
            decision,
            invocation_id: row.get(5)?,
            created_at: row.get::<_, i64>(6)? as u64,
        })
    }
}

impl ResultStore for SqliteResultStore {
    type Error = StoreError;

    fn append(&mut self, table: &TableRef, record: &ResultRecord) -> Result<(), Self::Error> {
        let name = self.ensure_table(table)?;

        let length = i64::try_from(record.extracted_text_length).map_err(|_| {
            StoreError::InvalidData(format!(
                "extracted_text_length out of range: {}",
                record.extracted_text_length
            ))
        })?;
        let created_at = i64::try_from(record.created_at).map_err(|_| {
            StoreError::InvalidData(format!("created_at out of range: {}", record.created_at))
        })?;

        self.conn.execute(
            &format!(
                r#"INSERT INTO "{name}" (file_name, document_bucket, extracted_text_length,
                       summary, agent_decision, invocation_id, created_at)
                   VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)"#
            ),
            params![
                record.key.as_str(),
                &record.source_bucket,
                length,
                &record.summary,
                record.decision.as_str(),
                &record.invocation_id,
                created_at,
            ],
        )?;

        debug!("Appended record for '{}' to {}", record.key, table);
        Ok(())
    }

    fn query(&self, table: &TableRef, key: &ArtifactKey) -> Result<Vec<ResultRecord>, Self::Error> {
        let name = self.ensure_table(table)?;

        let mut stmt = self.conn.prepare(&format!(
            r#"SELECT file_name, document_bucket, extracted_text_length, summary,
                      agent_decision, invocation_id, created_at
               FROM "{name}" WHERE file_name = ?1
               ORDER BY created_at DESC, seq DESC"#
        ))?;

        let records = stmt
            .query_map(params![key.as_str()], Self::row_to_record)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(records)
    }

    fn latest(&self, table: &TableRef, key: &ArtifactKey) -> Result<Option<ResultRecord>, Self::Error> {
        let name = self.ensure_table(table)?;

        let mut stmt = self.conn.prepare(&format!(
            r#"SELECT file_name, document_bucket, extracted_text_length, summary,
                      agent_decision, invocation_id, created_at
               FROM "{name}" WHERE file_name = ?1
               ORDER BY created_at DESC, seq DESC
               LIMIT 1"#
        ))?;

        let mut rows = stmt.query_map(params![key.as_str()], Self::row_to_record)?;
        let newest = rows.next().transpose()?;
        Ok(newest)
    }
}
