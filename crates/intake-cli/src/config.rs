//! Configuration management for the CLI.

use crate::error::{CliError, Result};
use intake_domain::TableRef;
use intake_extractor::WorkerConfig;
use intake_sdk::ClientConfig;
use intake_worker::WatcherConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// CLI configuration.
///
/// Stored as TOML at `~/.intake/config.toml` unless `--config` names another
/// file. Environment variables (`PROJECT_ID`, `BIGQUERY_TABLE_ID`, ...) are
/// layered over the `[worker]` section after loading.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Where artifacts and results live
    pub storage: StorageConfig,

    /// Extraction worker settings
    pub worker: WorkerConfig,

    /// Bucket watcher settings
    pub watcher: WatcherConfig,

    /// Polling client settings
    pub client: ClientConfig,

    /// Global settings
    pub settings: Settings,
}

/// Local storage locations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Bucket directory; its final component is the bucket name
    pub bucket_dir: PathBuf,

    /// SQLite database holding the result tables
    pub results_db: PathBuf,
}

/// Global CLI settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Enable colored output
    #[serde(default = "default_true")]
    pub color: bool,

    /// Default output format
    #[serde(default = "default_format")]
    pub format: OutputFormat,
}

/// Output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable text and tables
    Table,
    /// JSON format
    Json,
}

impl Config {
    /// Directory holding the default config file and data.
    pub fn home() -> Result<PathBuf> {
        let home = dirs::home_dir().ok_or_else(|| CliError::Config("Could not find home directory".into()))?;
        Ok(home.join(".intake"))
    }

    /// Get the default configuration file path.
    pub fn path() -> Result<PathBuf> {
        Ok(Self::home()?.join("config.toml"))
    }

    /// Load configuration from `path` (or the default path) and overlay the
    /// process environment.
    ///
    /// A missing file yields the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => Self::path()?,
        };
        let mut config = Self::load_file(&path)?;
        config.worker.apply_env(|name| std::env::var(name).ok());
        tracing::debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Load a configuration file without consulting the environment.
    pub fn load_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Save configuration to `path`, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(path, self.to_toml()?)?;
        Ok(())
    }

    /// Render as TOML.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| CliError::Config(format!("Failed to serialize config: {}", e)))
    }

    /// Result table shared by worker and client.
    ///
    /// # Errors
    /// [`CliError::Config`] when the project, dataset or table is unset.
    pub fn result_table(&self) -> Result<TableRef> {
        self.worker
            .table_ref()
            .map_err(CliError::Config)?
            .ok_or_else(|| {
                CliError::Config(
                    "No result table configured (set BIGQUERY_DATASET_ID and BIGQUERY_TABLE_ID, or [worker] dataset_id/table_id)"
                        .to_string(),
                )
            })
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        let base = Config::home().unwrap_or_else(|_| PathBuf::from(".intake"));
        Self {
            bucket_dir: base.join("document-input"),
            results_db: base.join("results.db"),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            color: true,
            format: OutputFormat::Table,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_format() -> OutputFormat {
    OutputFormat::Table
}
