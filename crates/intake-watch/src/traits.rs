//! Core traits for the folder watching system.

use crate::{error::Result, events::RawSignal};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;
use uuid::Uuid;

/// Core trait for file watching backends.
///
/// A backend observes one root recursively and forwards raw change signals.
/// Filtering and write-completion detection happen downstream.
#[async_trait]
pub trait FileWatcher: Send + Sync {
    /// Get the backend type identifier.
    fn backend_type(&self) -> &'static str;

    /// Start observing `root` recursively, sending signals to `signals`.
    async fn watch(&mut self, root: &Path, signals: mpsc::UnboundedSender<RawSignal>)
        -> Result<()>;

    /// Stop observing. Safe to call more than once.
    async fn unwatch(&mut self) -> Result<()>;

    /// Whether the backend currently observes a root.
    fn is_active(&self) -> bool;
}

/// Handle to an active watcher generation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WatchHandle {
    /// Generation identifier, fresh for every started watcher.
    pub id: Uuid,

    /// Path being watched.
    pub path: PathBuf,
}

impl WatchHandle {
    /// Create a new watch handle with a fresh generation.
    pub fn new(path: PathBuf) -> Self {
        Self {
            id: Uuid::new_v4(),
            path,
        }
    }
}
