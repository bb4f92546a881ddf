//! Notify-based file watching backend.

use super::{forward, log_backend_error};
use crate::{
    error::{Error, Result},
    events::RawSignal,
    traits::FileWatcher,
};
use async_trait::async_trait;
use notify::{RecommendedWatcher, RecursiveMode};
use notify_debouncer_full::{new_debouncer, DebounceEventResult, Debouncer, RecommendedCache};
use std::path::Path;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info};

/// Native file system notifications with debouncing.
pub struct NotifyWatcher {
    /// Debounced file system watcher
    debouncer: Option<Debouncer<RecommendedWatcher, RecommendedCache>>,
    /// Coalescing window
    debounce: Duration,
}

impl NotifyWatcher {
    /// Create a new notify-based watcher.
    pub fn new(debounce: Duration) -> Self {
        Self {
            debouncer: None,
            debounce,
        }
    }
}

#[async_trait]
impl FileWatcher for NotifyWatcher {
    fn backend_type(&self) -> &'static str {
        "notify"
    }

    async fn watch(
        &mut self,
        root: &Path,
        signals: mpsc::UnboundedSender<RawSignal>,
    ) -> Result<()> {
        if self.debouncer.is_some() {
            return Err(Error::Internal("notify watcher already active".into()));
        }
        debug!("Adding notify watch for: {}", root.display());

        let mut debouncer = new_debouncer(
            self.debounce,
            None,
            move |result: DebounceEventResult| match result {
                Ok(events) => {
                    for event in events {
                        forward(&event.event, &signals);
                    }
                }
                Err(errors) => {
                    for error in errors {
                        log_backend_error("notify", &error);
                    }
                }
            },
        )
        .map_err(|e| Error::Watch(format!("Failed to create notify watcher: {}", e)))?;

        debouncer.watch(root, RecursiveMode::Recursive)?;

        self.debouncer = Some(debouncer);
        info!("Notify watcher started for {}", root.display());
        Ok(())
    }

    async fn unwatch(&mut self) -> Result<()> {
        if let Some(debouncer) = self.debouncer.take() {
            debouncer.stop();
            debug!("Notify watcher stopped");
        }
        Ok(())
    }

    fn is_active(&self) -> bool {
        self.debouncer.is_some()
    }
}
