//! One live watcher per folder.

use crate::config::WatchSettings;
use crate::error::{Error, Result};
use crate::events::IngestEvent;
use crate::traits::WatchHandle;
use crate::watcher::DirectoryWatcher;
use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, info, warn};

/// Normalize a folder path so equivalent spellings share one key.
///
/// Existing paths are canonicalized. Paths that cannot be canonicalized are
/// made absolute and have `.` and `..` folded lexically.
pub fn normalize_path(path: &Path) -> Result<PathBuf> {
    if path.as_os_str().is_empty() {
        return Err(Error::InvalidPath("empty path".into()));
    }

    if let Ok(canonical) = path.canonicalize() {
        return Ok(canonical);
    }

    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()?.join(path)
    };

    let mut normalized = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other),
        }
    }
    Ok(normalized)
}

/// Registry of live watchers keyed by normalized folder path.
///
/// Registering a folder that already has a watcher closes the old watcher
/// before the new one starts, so events for that folder only ever come from
/// the newest generation.
#[derive(Default)]
pub struct WatchRegistry {
    watchers: Mutex<HashMap<PathBuf, DirectoryWatcher>>,
}

impl WatchRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Watch `folder`, replacing any existing watcher for the same folder.
    pub async fn register(
        &self,
        folder: &Path,
        settings: &WatchSettings,
        sink: mpsc::UnboundedSender<IngestEvent>,
    ) -> Result<WatchHandle> {
        let key = normalize_path(folder)?;

        // Held across close and start so concurrent registrations serialize.
        let mut watchers = self.watchers.lock().await;

        if let Some(previous) = watchers.remove(&key) {
            debug!("Replacing watcher generation {} for {}", previous.generation(), key.display());
            if let Err(e) = previous.close().await {
                warn!("Failed to close previous watcher for {}: {}", key.display(), e);
            }
        }

        let watcher = DirectoryWatcher::start(key.clone(), settings, sink).await?;
        let handle = watcher.handle().clone();
        watchers.insert(key, watcher);

        Ok(handle)
    }

    /// Stop watching `folder`. Returns whether a watcher was registered.
    pub async fn unregister(&self, folder: &Path) -> Result<bool> {
        let key = normalize_path(folder)?;
        let removed = self.watchers.lock().await.remove(&key);

        match removed {
            Some(watcher) => {
                watcher.close().await?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Whether `folder` currently has a watcher.
    pub async fn is_watching(&self, folder: &Path) -> bool {
        match normalize_path(folder) {
            Ok(key) => self.watchers.lock().await.contains_key(&key),
            Err(_) => false,
        }
    }

    /// Handles of all live watchers.
    pub async fn active(&self) -> Vec<WatchHandle> {
        self.watchers
            .lock()
            .await
            .values()
            .map(|w| w.handle().clone())
            .collect()
    }

    /// Number of live watchers.
    pub async fn len(&self) -> usize {
        self.watchers.lock().await.len()
    }

    /// Whether no watcher is live.
    pub async fn is_empty(&self) -> bool {
        self.watchers.lock().await.is_empty()
    }

    /// Close every watcher.
    pub async fn shutdown(&self) {
        let drained: Vec<_> = self.watchers.lock().await.drain().collect();
        for (path, watcher) in drained {
            if let Err(e) = watcher.close().await {
                warn!("Failed to close watcher for {}: {}", path.display(), e);
            }
        }
        info!("Watch registry shut down");
    }
}
