//! Configuration for the trigger watcher

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the bucket watcher
///
/// # Examples
///
/// ```
/// use intake_worker::WatcherConfig;
///
/// let config = WatcherConfig::default();
/// assert_eq!(config.poll_interval_secs, 2);
/// assert!(config.deliver_existing);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WatcherConfig {
    /// How often the bucket is listed for new artifacts (in seconds)
    pub poll_interval_secs: u64,

    /// Deliver artifacts already present when the watcher starts
    ///
    /// With `true` (default) a restarted watcher redelivers every artifact,
    /// matching at-least-once trigger semantics.
    pub deliver_existing: bool,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: 2,
            deliver_existing: true,
        }
    }
}

impl WatcherConfig {
    /// Get the poll interval as a Duration
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(WatcherConfig::default().validate().is_ok());
    }

    #[test]
    fn test_zero_interval_is_invalid() {
        let config = WatcherConfig {
            poll_interval_secs: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_toml_round_trip() {
        let config = WatcherConfig {
            poll_interval_secs: 10,
            deliver_existing: false,
        };
        let parsed = WatcherConfig::from_toml(&config.to_toml().unwrap()).unwrap();
        assert_eq!(config, parsed);
    }

    #[test]
    fn test_partial_toml() {
        let config = WatcherConfig::from_toml("poll_interval_secs = 5").unwrap();
        assert_eq!(config.poll_interval(), Duration::from_secs(5));
        assert!(config.deliver_existing);
    }
}
