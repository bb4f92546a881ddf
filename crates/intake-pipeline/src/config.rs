//! Runtime configuration for the intake pipeline.

use crate::error::{Error, Result};
use intake_validate::{DEFAULT_VALIDATION_TIMEOUT, MAX_FILE_SIZE};
use intake_watch::WatchSettings;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Top-level configuration, one TOML section per concern.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct IntakeConfig {
    /// Folder watching
    pub watch: WatchSettings,
    /// File validation
    pub validation: ValidationConfig,
    /// Admission queue
    pub queue: QueueConfig,
    /// Quarantine results log
    pub results: ResultsConfig,
    /// Log output
    pub logging: LoggingConfig,
}

/// Validation limits.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ValidationConfig {
    /// Files strictly larger than this are rejected as too large
    pub max_file_size_bytes: u64,
    /// Per-file validation deadline
    pub timeout_ms: u64,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            max_file_size_bytes: MAX_FILE_SIZE,
            timeout_ms: DEFAULT_VALIDATION_TIMEOUT.as_millis() as u64,
        }
    }
}

impl ValidationConfig {
    /// Deadline as a duration.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Admission queue bounds.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct QueueConfig {
    /// Maximum queued paths; unbounded when absent
    pub capacity: Option<usize>,
}

/// Results log bounds.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ResultsConfig {
    /// Maximum retained records; oldest dropped first; unbounded when absent
    pub capacity: Option<usize>,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default level when neither the command line nor `RUST_LOG` sets one
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl IntakeConfig {
    /// Reject settings that would stall watching or disable admission.
    pub fn validate(&self) -> Result<()> {
        self.watch
            .validate()
            .map_err(|e| Error::Config(e.to_string()))?;

        if self.validation.max_file_size_bytes == 0 {
            return Err(Error::Config(
                "validation.max_file_size_bytes must be greater than 0".into(),
            ));
        }
        if self.validation.timeout_ms == 0 {
            return Err(Error::Config("validation.timeout_ms must be greater than 0".into()));
        }
        if self.queue.capacity == Some(0) {
            return Err(Error::Config("queue.capacity must be greater than 0".into()));
        }
        if self.results.capacity == Some(0) {
            return Err(Error::Config("results.capacity must be greater than 0".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use intake_watch::WatchMode;

    #[test]
    fn test_defaults_are_valid() {
        let config = IntakeConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.validation.max_file_size_bytes, 5 * 1024 * 1024);
        assert_eq!(config.queue.capacity, None);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: IntakeConfig = toml::from_str(
            r#"
            [watch]
            mode = "native"
            stability_threshold_ms = 500

            [queue]
            capacity = 100
            "#,
        )
        .unwrap();

        assert_eq!(config.watch.mode, WatchMode::Native);
        assert_eq!(config.watch.stability_threshold_ms, 500);
        assert_eq!(config.watch.poll_interval_ms, 100);
        assert_eq!(config.queue.capacity, Some(100));
        assert_eq!(config.results.capacity, None);
    }

    #[test]
    fn test_zero_values_are_rejected() {
        let mut config = IntakeConfig::default();
        config.queue.capacity = Some(0);
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        let mut config = IntakeConfig::default();
        config.watch.poll_interval_ms = 0;
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        let mut config = IntakeConfig::default();
        config.validation.timeout_ms = 0;
        assert!(config.validate().is_err());
    }
}
