//! Fan-out of status notifications to connected observers.
//!
//! Observers are whatever transport the embedding application provides. A
//! notification is serialized to JSON once and handed to every observer that
//! is still open; closed observers are skipped without error.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::Write;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, trace, warn};

/// Counter for generating unique observer IDs.
static OBSERVER_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Unique identifier for a subscribed observer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

impl ObserverId {
    /// Create a new unique observer ID.
    pub fn new() -> Self {
        Self(OBSERVER_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value.
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl Default for ObserverId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ObserverId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "observer-{}", self.0)
    }
}

/// Status message sent to observers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    /// Human readable status
    pub message: String,
    /// Queue length right after an admission
    #[serde(rename = "queueLength", skip_serializing_if = "Option::is_none", default)]
    pub queue_length: Option<usize>,
}

impl Notification {
    /// Message without a queue length.
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            queue_length: None,
        }
    }

    /// The folder had no entries, so no watcher was started.
    pub fn folder_empty() -> Self {
        Self::message("Folder is empty")
    }

    /// A watcher was registered for `folder`.
    pub fn started_watching(folder: &str) -> Self {
        Self::message(format!("Started watching folder: {}", folder))
    }

    /// A file was admitted to the queue.
    pub fn file_queued(file_name: &str, queue_length: usize) -> Self {
        Self {
            message: format!("File queued: {}", file_name),
            queue_length: Some(queue_length),
        }
    }
}

/// A connected listener.
pub trait Observer: Send + Sync {
    /// Deliver one serialized notification.
    fn send(&self, payload: &str);

    /// Whether the observer can still receive.
    fn is_open(&self) -> bool;
}

/// Observer backed by an unbounded tokio channel.
#[derive(Debug, Clone)]
pub struct ChannelObserver {
    tx: mpsc::UnboundedSender<String>,
}

impl ChannelObserver {
    /// Create an observer and the receiving end of its channel.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl Observer for ChannelObserver {
    fn send(&self, payload: &str) {
        if self.tx.send(payload.to_string()).is_err() {
            trace!("Channel observer dropped a message after close");
        }
    }

    fn is_open(&self) -> bool {
        !self.tx.is_closed()
    }
}

/// Observer that prints each notification as a JSON line on stdout.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdoutObserver;

impl Observer for StdoutObserver {
    fn send(&self, payload: &str) {
        let mut stdout = std::io::stdout().lock();
        if let Err(e) = writeln!(stdout, "{}", payload) {
            warn!("Failed to write notification: {}", e);
        }
    }

    fn is_open(&self) -> bool {
        true
    }
}

/// Delivers notifications to every open observer.
#[derive(Default)]
pub struct Broadcaster {
    observers: RwLock<HashMap<ObserverId, Arc<dyn Observer>>>,
}

impl Broadcaster {
    /// Create a broadcaster with no observers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an observer.
    pub fn subscribe(&self, observer: Arc<dyn Observer>) -> ObserverId {
        let id = ObserverId::new();
        self.observers.write().insert(id, observer);
        debug!("Subscribed {}", id);
        id
    }

    /// Remove an observer. Returns whether it was subscribed.
    pub fn unsubscribe(&self, id: ObserverId) -> bool {
        self.observers.write().remove(&id).is_some()
    }

    /// Drop observers that are no longer open. Returns how many were removed.
    pub fn prune_closed(&self) -> usize {
        let mut observers = self.observers.write();
        let before = observers.len();
        observers.retain(|_, o| o.is_open());
        before - observers.len()
    }

    /// Number of subscribed observers, open or not.
    pub fn observer_count(&self) -> usize {
        self.observers.read().len()
    }

    /// Send `notification` to every open observer. Returns how many received it.
    pub fn broadcast(&self, notification: &Notification) -> usize {
        let payload = match serde_json::to_string(notification) {
            Ok(payload) => payload,
            Err(e) => {
                warn!("Failed to serialize notification: {}", e);
                return 0;
            }
        };

        let observers = self.observers.read();
        let mut delivered = 0;
        for observer in observers.values().filter(|o| o.is_open()) {
            observer.send(&payload);
            delivered += 1;
        }
        trace!(delivered, "Broadcast {}", payload);
        delivered
    }
}
