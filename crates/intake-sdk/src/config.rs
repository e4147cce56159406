//! Polling client configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How long and how often the client waits for a result
///
/// The client gives up after `max_attempts × poll_interval_secs`; it cannot
/// tell a slow worker from one that failed or never fired.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Number of result queries before timing out
    pub max_attempts: u32,

    /// Wait between queries (in seconds)
    pub poll_interval_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            max_attempts: 20,
            poll_interval_secs: 3,
        }
    }
}

impl ClientConfig {
    /// Get the poll interval as a Duration
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    /// Longest time a session polls before timing out
    pub fn timeout(&self) -> Duration {
        self.poll_interval() * self.max_attempts
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.max_attempts == 0 {
            return Err("max_attempts must be greater than 0".to_string());
        }
        if self.poll_interval_secs == 0 {
            return Err("poll_interval_secs must be greater than 0".to_string());
        }
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
