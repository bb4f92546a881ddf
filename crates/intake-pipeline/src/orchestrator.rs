//! Sync Orchestrator
//!
//! Request-level entry point of the intake pipeline. A sync request names a
//! folder; the orchestrator makes sure exactly one watcher observes it and
//! routes every settled file through validation into either the admission
//! queue or quarantine.
//!
//! ## Per-file flow
//!
//! 1. **Validate**: size from metadata, then the format check on the bytes
//! 2. **Admit**: append to the queue, trigger the processor, notify observers
//! 3. **Quarantine**: on rejection or internal failure, move the file aside and
//!    record the reason
//!
//! Each file runs as its own task. Files are independent, so there is no
//! ordering between them, but every file ends in exactly one outcome.

use crate::broadcast::{Broadcaster, Notification, Observer, ObserverId};
use crate::config::IntakeConfig;
use crate::error::{Error, Result};
use crate::quarantine::{QuarantineLog, QuarantineRecord, QuarantineRouter};
use crate::queue::{AdmissionQueue, LoggingProcessor, QueueProcessor};
use intake_validate::{AsyncValidator, ByteValidator, FormatValidator, ValidationOutcome};
use intake_watch::{IngestEvent, WatchRegistry};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, error, info, warn};

/// Reply to a sync request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncResponse {
    /// Same text that was broadcast to observers
    pub message: String,
}

impl From<&Notification> for SyncResponse {
    fn from(notification: &Notification) -> Self {
        Self {
            message: notification.message.clone(),
        }
    }
}

struct Inner {
    config: IntakeConfig,
    registry: WatchRegistry,
    validator: AsyncValidator,
    queue: AdmissionQueue,
    quarantine: QuarantineRouter,
    broadcaster: Broadcaster,
    processor: Arc<dyn QueueProcessor>,
    dispatchers: Mutex<Vec<JoinHandle<()>>>,
}

/// Owns the watchers, queue, results log and observers of one intake service.
///
/// Cloning yields another handle to the same service.
#[derive(Clone)]
pub struct SyncOrchestrator {
    inner: Arc<Inner>,
}

impl SyncOrchestrator {
    /// Create an orchestrator with the logging-only queue processor.
    pub fn new(config: IntakeConfig) -> Result<Self> {
        Self::with_processor(config, Arc::new(LoggingProcessor))
    }

    /// Create an orchestrator with a custom downstream trigger.
    pub fn with_processor(config: IntakeConfig, processor: Arc<dyn QueueProcessor>) -> Result<Self> {
        let formats =
            FormatValidator::new().with_max_file_size(config.validation.max_file_size_bytes);
        Self::with_validator(config, processor, Arc::new(formats))
    }

    /// Create an orchestrator with a custom byte validator.
    ///
    /// The configured timeout still applies; `validation.max_file_size_bytes`
    /// is left to `validator`.
    pub fn with_validator(
        config: IntakeConfig,
        processor: Arc<dyn QueueProcessor>,
        validator: Arc<dyn ByteValidator>,
    ) -> Result<Self> {
        config.validate()?;

        let validator =
            AsyncValidator::with_validator(validator).with_timeout(config.validation.timeout());

        let log = Arc::new(QuarantineLog::new(config.results.capacity));

        Ok(Self {
            inner: Arc::new(Inner {
                registry: WatchRegistry::new(),
                validator,
                queue: AdmissionQueue::new(config.queue.capacity),
                quarantine: QuarantineRouter::new(log),
                broadcaster: Broadcaster::new(),
                processor,
                dispatchers: Mutex::new(Vec::new()),
                config,
            }),
        })
    }

    /// Effective configuration.
    pub fn config(&self) -> &IntakeConfig {
        &self.inner.config
    }

    /// Start (or restart) watching `folder`.
    ///
    /// A folder with no entries at all is reported as empty and not watched.
    /// Otherwise any existing watcher for the same folder is replaced, and
    /// files already in the folder are processed like new arrivals.
    pub async fn sync_folder(&self, folder: &str) -> Result<SyncResponse> {
        if folder.trim().is_empty() {
            return Err(Error::MissingFolderPath);
        }
        let path = Path::new(folder);

        let metadata = tokio::fs::metadata(path).await.map_err(|e| invalid_path(folder, e))?;
        if !metadata.is_dir() {
            return Err(Error::InvalidPath {
                path: folder.to_string(),
                reason: "not a directory".into(),
            });
        }

        let mut entries = tokio::fs::read_dir(path).await.map_err(|e| invalid_path(folder, e))?;
        if entries.next_entry().await?.is_none() {
            info!("Folder {} is empty, not watching", folder);
            let notification = Notification::folder_empty();
            self.inner.broadcaster.broadcast(&notification);
            return Ok(SyncResponse::from(&notification));
        }

        let (sink, events) = mpsc::unbounded_channel();
        let handle = self
            .inner
            .registry
            .register(path, &self.inner.config.watch, sink)
            .await?;
        debug!("Registered {} as generation {}", handle.path.display(), handle.id);

        let dispatcher = tokio::spawn(dispatch(Arc::clone(&self.inner), events));
        {
            let mut dispatchers = self.inner.dispatchers.lock();
            dispatchers.retain(|d| !d.is_finished());
            dispatchers.push(dispatcher);
        }

        info!("Watching folder: {}", folder);
        let notification = Notification::started_watching(folder);
        self.inner.broadcaster.broadcast(&notification);
        Ok(SyncResponse::from(&notification))
    }

    /// Stop watching `folder`. Returns whether it was being watched.
    pub async fn unwatch(&self, folder: &str) -> Result<bool> {
        if folder.trim().is_empty() {
            return Err(Error::MissingFolderPath);
        }
        Ok(self.inner.registry.unregister(Path::new(folder)).await?)
    }

    /// Whether `folder` currently has a live watcher.
    pub async fn is_watching(&self, folder: &str) -> bool {
        self.inner.registry.is_watching(Path::new(folder)).await
    }

    /// Number of live watchers.
    pub async fn watcher_count(&self) -> usize {
        self.inner.registry.len().await
    }

    /// Queued paths in arrival order.
    pub fn queue_snapshot(&self) -> Vec<PathBuf> {
        self.inner.queue.snapshot()
    }

    /// The admission queue, for a downstream consumer.
    pub fn queue(&self) -> &AdmissionQueue {
        &self.inner.queue
    }

    /// Quarantine records, oldest first.
    pub fn results(&self) -> Vec<QuarantineRecord> {
        self.inner.quarantine.log().records()
    }

    /// Observer fan-out.
    pub fn broadcaster(&self) -> &Broadcaster {
        &self.inner.broadcaster
    }

    /// Subscribe an observer to status notifications.
    pub fn subscribe(&self, observer: Arc<dyn Observer>) -> ObserverId {
        self.inner.broadcaster.subscribe(observer)
    }

    /// Close every watcher and wait for in-flight files to finish.
    pub async fn shutdown(&self) {
        info!("Shutting down sync orchestrator");
        self.inner.registry.shutdown().await;

        let dispatchers: Vec<_> = self.inner.dispatchers.lock().drain(..).collect();
        for dispatcher in dispatchers {
            if let Err(e) = dispatcher.await {
                error!("Dispatcher task failed: {}", e);
            }
        }
        info!("Sync orchestrator shutdown complete");
    }
}

fn invalid_path(folder: &str, err: std::io::Error) -> Error {
    match err.kind() {
        ErrorKind::NotFound => Error::InvalidPath {
            path: folder.to_string(),
            reason: "no such directory".into(),
        },
        ErrorKind::PermissionDenied => Error::InvalidPath {
            path: folder.to_string(),
            reason: "permission denied".into(),
        },
        _ => Error::Io(err),
    }
}

/// Fan events of one watcher generation out to per-file tasks.
///
/// Ends when the watcher closes its sink, after in-flight files finish.
async fn dispatch(inner: Arc<Inner>, mut events: mpsc::UnboundedReceiver<IngestEvent>) {
    let mut in_flight = JoinSet::new();

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Some(event) => {
                    in_flight.spawn(handle_event(Arc::clone(&inner), event));
                }
                None => break,
            },
            Some(joined) = in_flight.join_next(), if !in_flight.is_empty() => {
                if let Err(e) = joined {
                    error!("File task failed: {}", e);
                }
            }
        }
    }

    while let Some(joined) = in_flight.join_next().await {
        if let Err(e) = joined {
            error!("File task failed: {}", e);
        }
    }
}

/// Validate one settled file and route it to the queue or quarantine.
async fn handle_event(inner: Arc<Inner>, event: IngestEvent) {
    let file_name = event.file_name();
    debug!(file = %file_name, size = event.size_bytes, "Validating");

    let outcome = inner
        .validator
        .validate_file(&event.path, &event.extension)
        .await;

    match outcome {
        ValidationOutcome::Accepted => match inner.queue.enqueue(event.path.clone()) {
            Ok(queue_length) => {
                info!(file = %file_name, queue_length, "File queued");
                inner.processor.work_available(queue_length).await;
                inner
                    .broadcaster
                    .broadcast(&Notification::file_queued(&file_name, queue_length));
            }
            Err(e) => {
                warn!(file = %file_name, "Not admitted, left in place: {}", e);
            }
        },
        rejected => {
            let reason = rejected.reason().unwrap_or_default();
            if matches!(rejected, ValidationOutcome::Internal { .. }) {
                warn!(file = %file_name, "Validation failed internally: {}", reason);
            }
            inner
                .quarantine
                .quarantine(&event.root, &event.path, &reason)
                .await;
        }
    }
}
