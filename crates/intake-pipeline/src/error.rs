//! Error types for sync orchestration.

use thiserror::Error;

/// Errors surfaced to the caller of a sync request.
///
/// Per-file failures never appear here; they end in quarantine or a log line.
#[derive(Error, Debug)]
pub enum Error {
    /// The request carried no folder path.
    #[error("folderPath is required")]
    MissingFolderPath,

    /// The folder path does not name a readable directory.
    #[error("Invalid folder path '{path}': {reason}")]
    InvalidPath {
        /// Path as given by the caller
        path: String,
        /// What went wrong
        reason: String,
    },

    /// IO error while inspecting the folder.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Watcher setup failed.
    #[error(transparent)]
    Watch(#[from] intake_watch::Error),

    /// The admission queue is at capacity.
    #[error("Admission queue is full (capacity {0})")]
    QueueFull(usize),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type for orchestration operations.
pub type Result<T> = std::result::Result<T, Error>;
