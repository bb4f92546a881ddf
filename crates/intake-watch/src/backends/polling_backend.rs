//! Polling backend for file systems without change notifications.

use super::{forward, log_backend_error};
use crate::{
    error::{Error, Result},
    events::RawSignal,
    traits::FileWatcher,
};
use async_trait::async_trait;
use notify::{PollWatcher, RecursiveMode, Watcher};
use std::path::Path;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info};

/// Periodic rescan of the watched tree.
pub struct PollingWatcher {
    watcher: Option<PollWatcher>,
    interval: Duration,
}

impl PollingWatcher {
    /// Create a polling watcher with the given rescan interval.
    pub fn new(interval: Duration) -> Self {
        Self {
            watcher: None,
            interval,
        }
    }
}

#[async_trait]
impl FileWatcher for PollingWatcher {
    fn backend_type(&self) -> &'static str {
        "polling"
    }

    async fn watch(
        &mut self,
        root: &Path,
        signals: mpsc::UnboundedSender<RawSignal>,
    ) -> Result<()> {
        if self.watcher.is_some() {
            return Err(Error::Internal("polling watcher already active".into()));
        }
        debug!(
            "Adding polling watch for: {} every {:?}",
            root.display(),
            self.interval
        );

        let config = notify::Config::default().with_poll_interval(self.interval);
        let mut watcher = PollWatcher::new(
            move |result: notify::Result<notify::Event>| match result {
                Ok(event) => forward(&event, &signals),
                Err(error) => log_backend_error("polling", &error),
            },
            config,
        )
        .map_err(|e| Error::Watch(format!("Failed to create polling watcher: {}", e)))?;

        watcher.watch(root, RecursiveMode::Recursive)?;

        self.watcher = Some(watcher);
        info!("Polling watcher started for {}", root.display());
        Ok(())
    }

    async fn unwatch(&mut self) -> Result<()> {
        if self.watcher.take().is_some() {
            debug!("Polling watcher stopped");
        }
        Ok(())
    }

    fn is_active(&self) -> bool {
        self.watcher.is_some()
    }
}
