//! Configuration schema for folder watching.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Subfolder rejected files are moved into.
pub const QUARANTINE_DIR: &str = "invalid-format";
/// Subfolder reserved for downstream duplicate detection.
pub const DUPLICATES_DIR: &str = "duplicates";
/// Subfolder reserved for downstream processing failures.
pub const FAILED_PROCESSING_DIR: &str = "failed-processing";
/// Subfolders of a watched root that never produce events.
pub const RESERVED_DIRS: [&str; 3] = [QUARANTINE_DIR, DUPLICATES_DIR, FAILED_PROCESSING_DIR];

/// How the file system is observed.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum WatchMode {
    /// OS-specific file system notifications
    Native,
    /// Periodic rescans; works on network shares and container mounts
    #[default]
    Polling,
}

impl WatchMode {
    /// Parse a mode name as used in config files and environment variables.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "native" | "notify" => Some(Self::Native),
            "polling" | "poll" => Some(Self::Polling),
            _ => None,
        }
    }
}

/// Settings for one directory watcher.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WatchSettings {
    /// Backend selection
    pub mode: WatchMode,
    /// Rescan cadence in polling mode, and size-check cadence for stabilization
    pub poll_interval_ms: u64,
    /// How long a file's size must stay unchanged before it is reported
    pub stability_threshold_ms: u64,
    /// Event coalescing window of the native backend
    pub native_debounce_ms: u64,
    /// Deepest subdirectory level below the root that is observed
    pub max_depth: usize,
    /// Lowercase extensions (without dot) that produce events
    pub allowed_extensions: Vec<String>,
    /// Relative-path prefixes that never produce events
    pub reserved_dirs: Vec<String>,
}

impl Default for WatchSettings {
    fn default() -> Self {
        Self {
            mode: WatchMode::Polling,
            poll_interval_ms: 100,
            stability_threshold_ms: 2000,
            native_debounce_ms: 100,
            max_depth: 99,
            allowed_extensions: vec!["pdf".into(), "docx".into(), "doc".into()],
            reserved_dirs: RESERVED_DIRS.iter().map(|d| d.to_string()).collect(),
        }
    }
}

impl WatchSettings {
    /// Set the backend.
    pub fn with_mode(mut self, mode: WatchMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set poll interval and stability threshold together.
    pub fn with_timing(mut self, poll_interval_ms: u64, stability_threshold_ms: u64) -> Self {
        self.poll_interval_ms = poll_interval_ms;
        self.stability_threshold_ms = stability_threshold_ms;
        self
    }

    /// Set the depth cap.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Poll interval as a duration.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Stability threshold as a duration.
    pub fn stability_threshold(&self) -> Duration {
        Duration::from_millis(self.stability_threshold_ms)
    }

    /// Native debounce window as a duration.
    pub fn native_debounce(&self) -> Duration {
        Duration::from_millis(self.native_debounce_ms)
    }

    /// Check the settings for values that would stall or disable watching.
    pub fn validate(&self) -> Result<()> {
        if self.poll_interval_ms == 0 {
            return Err(Error::Config("poll_interval_ms must be greater than 0".into()));
        }
        if self.native_debounce_ms == 0 {
            return Err(Error::Config("native_debounce_ms must be greater than 0".into()));
        }
        if self.max_depth == 0 {
            return Err(Error::Config("max_depth must be greater than 0".into()));
        }
        if self.allowed_extensions.is_empty() {
            return Err(Error::Config("allowed_extensions must not be empty".into()));
        }
        Ok(())
    }
}
