//! Recursive watcher for one root folder.

use crate::backends::create_backend;
use crate::config::WatchSettings;
use crate::error::{Error, Result};
use crate::events::{IngestEvent, RawSignal};
use crate::filter::IngestFilter;
use crate::stability::StabilityTracker;
use crate::traits::{FileWatcher, WatchHandle};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};
use walkdir::WalkDir;

/// A live watcher over one root.
///
/// Files already present when the watcher starts are reported like new ones.
/// After [`close`](Self::close) returns, no further events reach the sink.
pub struct DirectoryWatcher {
    handle: WatchHandle,
    backend: Box<dyn FileWatcher>,
    shutdown_tx: mpsc::Sender<()>,
    task: Option<JoinHandle<()>>,
}

impl DirectoryWatcher {
    /// Start watching `root`, delivering settled files to `sink`.
    pub async fn start(
        root: PathBuf,
        settings: &WatchSettings,
        sink: mpsc::UnboundedSender<IngestEvent>,
    ) -> Result<Self> {
        settings.validate()?;

        let metadata = tokio::fs::metadata(&root).await.map_err(|e| match e.kind() {
            std::io::ErrorKind::PermissionDenied => {
                Error::PermissionDenied(format!("{}: {}", root.display(), e))
            }
            _ => Error::InvalidPath(format!("{}: {}", root.display(), e)),
        })?;
        if !metadata.is_dir() {
            return Err(Error::InvalidPath(format!(
                "{} is not a directory",
                root.display()
            )));
        }

        let handle = WatchHandle::new(root.clone());
        let (signal_tx, signal_rx) = mpsc::unbounded_channel();

        let mut backend = create_backend(settings);
        if let Err(e) = backend.watch(&root, signal_tx).await {
            if let Err(cleanup) = backend.unwatch().await {
                warn!("Failed to clean up {} backend: {}", backend.backend_type(), cleanup);
            }
            return Err(e);
        }

        let filter = IngestFilter::new(root.clone(), settings);
        let tracker = StabilityTracker::new(filter.clone(), settings.stability_threshold(), handle.id);
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);

        let task = tokio::spawn(run(
            filter,
            tracker,
            settings.poll_interval(),
            signal_rx,
            shutdown_rx,
            sink,
        ));

        info!(
            "Watching {} ({} backend, generation {})",
            root.display(),
            backend.backend_type(),
            handle.id
        );

        Ok(Self {
            handle,
            backend,
            shutdown_tx,
            task: Some(task),
        })
    }

    /// Handle identifying this watcher generation.
    pub fn handle(&self) -> &WatchHandle {
        &self.handle
    }

    /// Root folder being watched.
    pub fn root(&self) -> &Path {
        &self.handle.path
    }

    /// Generation identifier carried by every event of this watcher.
    pub fn generation(&self) -> uuid::Uuid {
        self.handle.id
    }

    /// Whether the event task is still running.
    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Stop the backend and wait for the event task to finish.
    pub async fn close(mut self) -> Result<()> {
        debug!("Closing watcher for {}", self.handle.path.display());

        let backend_result = self.backend.unwatch().await;
        let _ = self.shutdown_tx.send(()).await;

        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                error!("Watcher task for {} failed: {}", self.handle.path.display(), e);
            }
        }

        info!("Stopped watching {}", self.handle.path.display());
        backend_result
    }
}

impl Drop for DirectoryWatcher {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

async fn run(
    filter: IngestFilter,
    mut tracker: StabilityTracker,
    poll_interval: std::time::Duration,
    mut signals: mpsc::UnboundedReceiver<RawSignal>,
    mut shutdown: mpsc::Receiver<()>,
    sink: mpsc::UnboundedSender<IngestEvent>,
) {
    let scan = tokio::task::spawn_blocking(move || initial_scan(&filter));
    let existing = tokio::select! {
        result = scan => match result {
            Ok(paths) => paths,
            Err(e) => {
                error!("Initial scan failed: {}", e);
                Vec::new()
            }
        },
        _ = shutdown.recv() => return,
    };

    let now = Instant::now();
    for path in &existing {
        tracker.observe(path, now);
    }
    debug!("Initial scan found {} candidate files", existing.len());

    let mut ticker = tokio::time::interval(poll_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = shutdown.recv() => break,
            signal = signals.recv() => match signal {
                Some(RawSignal::Touched(path)) => {
                    tracker.observe(&path, Instant::now());
                }
                Some(RawSignal::Removed(path)) => tracker.forget(&path),
                None => {
                    debug!("Backend signal channel closed");
                    break;
                }
            },
            _ = ticker.tick() => {
                for event in tracker.poll(Instant::now()).await {
                    if sink.send(event).is_err() {
                        debug!("Event sink closed, stopping watcher task");
                        return;
                    }
                }
            }
        }
    }
}

/// Candidate files already under the root, skipping excluded directories.
fn initial_scan(filter: &IngestFilter) -> Vec<PathBuf> {
    let root = filter.root();
    let mut found = Vec::new();

    let walker = WalkDir::new(root)
        .min_depth(1)
        .into_iter()
        .filter_entry(|entry| entry.depth() == 0 || !filter.is_excluded(entry.path()));

    for entry in walker {
        match entry {
            Ok(entry) if entry.file_type().is_file() => {
                if filter.admit(entry.path()).is_some() {
                    found.push(entry.into_path());
                }
            }
            Ok(_) => {}
            Err(e) => {
                let path = e.path().map(|p| p.display().to_string()).unwrap_or_default();
                warn!("Skipping {} during initial scan: {}", path, e);
            }
        }
    }

    found
}
