//! File watching backends.

mod notify_backend;
mod polling_backend;

pub use notify_backend::NotifyWatcher;
pub use polling_backend::PollingWatcher;

use crate::config::{WatchMode, WatchSettings};
use crate::error::is_permission_error;
use crate::events::RawSignal;
use crate::traits::FileWatcher;
use notify::event::{ModifyKind, RenameMode};
use notify::{Event, EventKind};
use tokio::sync::mpsc;
use tracing::{error, trace, warn};

/// Create the backend selected by `settings`.
pub fn create_backend(settings: &WatchSettings) -> Box<dyn FileWatcher> {
    match settings.mode {
        WatchMode::Native => Box::new(NotifyWatcher::new(settings.native_debounce())),
        WatchMode::Polling => Box::new(PollingWatcher::new(settings.poll_interval())),
    }
}

/// Translate a notify event into raw signals.
pub(crate) fn signals_from_event(event: &Event) -> Vec<RawSignal> {
    match event.kind {
        EventKind::Access(_) => Vec::new(),
        EventKind::Remove(_) => event
            .paths
            .iter()
            .cloned()
            .map(RawSignal::Removed)
            .collect(),
        EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => {
            let mut signals = Vec::with_capacity(2);
            if let Some(from) = event.paths.first() {
                signals.push(RawSignal::Removed(from.clone()));
            }
            if let Some(to) = event.paths.get(1) {
                signals.push(RawSignal::Touched(to.clone()));
            }
            signals
        }
        EventKind::Modify(ModifyKind::Name(RenameMode::From)) => event
            .paths
            .iter()
            .cloned()
            .map(RawSignal::Removed)
            .collect(),
        _ => event
            .paths
            .iter()
            .cloned()
            .map(RawSignal::Touched)
            .collect(),
    }
}

/// Forward the signals of one event, logging if the receiver is gone.
pub(crate) fn forward(event: &Event, signals: &mpsc::UnboundedSender<RawSignal>) {
    for signal in signals_from_event(event) {
        trace!("Raw signal: {:?}", signal);
        if signals.send(signal).is_err() {
            trace!("Signal receiver closed");
            return;
        }
    }
}

/// Log a backend error. Permission failures only skip the entry.
pub(crate) fn log_backend_error(backend: &str, err: &notify::Error) {
    if is_permission_error(err) {
        warn!("{} watcher skipped unreadable entry: {}", backend, err);
    } else {
        error!("{} watcher error: {}", backend, err);
    }
}
