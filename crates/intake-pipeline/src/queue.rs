//! Admission queue for validated files.
//!
//! An ordered sequence of accepted paths awaiting downstream processing. The
//! queue does not deduplicate; arrival order is the order of successful
//! [`AdmissionQueue::enqueue`] calls.

use crate::error::{Error, Result};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, info};

/// FIFO of accepted file paths, optionally bounded.
///
/// When a capacity is set and reached, new admissions are refused with
/// [`Error::QueueFull`] rather than displacing earlier entries.
#[derive(Debug)]
pub struct AdmissionQueue {
    entries: Mutex<VecDeque<PathBuf>>,
    capacity: Option<usize>,
    admitted: AtomicU64,
    refused: AtomicU64,
    taken: AtomicU64,
}

/// Counters for an admission queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueStats {
    /// Paths currently queued
    pub len: usize,
    /// Capacity, if bounded
    pub capacity: Option<usize>,
    /// Successful admissions
    pub admitted: u64,
    /// Admissions refused at capacity
    pub refused: u64,
    /// Paths handed to a consumer
    pub taken: u64,
}

impl AdmissionQueue {
    /// Create a queue with an optional capacity.
    pub fn new(capacity: Option<usize>) -> Self {
        Self {
            entries: Mutex::new(VecDeque::new()),
            capacity,
            admitted: AtomicU64::new(0),
            refused: AtomicU64::new(0),
            taken: AtomicU64::new(0),
        }
    }

    /// Create an unbounded queue.
    pub fn unbounded() -> Self {
        Self::new(None)
    }

    /// Append a path and return the new queue length.
    pub fn enqueue(&self, path: PathBuf) -> Result<usize> {
        let mut entries = self.entries.lock();
        if let Some(capacity) = self.capacity {
            if entries.len() >= capacity {
                self.refused.fetch_add(1, Ordering::Relaxed);
                return Err(Error::QueueFull(capacity));
            }
        }
        entries.push_back(path);
        self.admitted.fetch_add(1, Ordering::Relaxed);
        Ok(entries.len())
    }

    /// Take the oldest path.
    pub fn pop(&self) -> Option<PathBuf> {
        let path = self.entries.lock().pop_front();
        if path.is_some() {
            self.taken.fetch_add(1, Ordering::Relaxed);
        }
        path
    }

    /// Take every queued path in arrival order.
    pub fn drain(&self) -> Vec<PathBuf> {
        let drained: Vec<PathBuf> = self.entries.lock().drain(..).collect();
        self.taken
            .fetch_add(drained.len() as u64, Ordering::Relaxed);
        drained
    }

    /// Copy of the queued paths in arrival order.
    pub fn snapshot(&self) -> Vec<PathBuf> {
        self.entries.lock().iter().cloned().collect()
    }

    /// Number of queued paths.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Whether nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Capacity, if bounded.
    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    /// Current counters.
    pub fn stats(&self) -> QueueStats {
        QueueStats {
            len: self.len(),
            capacity: self.capacity,
            admitted: self.admitted.load(Ordering::Relaxed),
            refused: self.refused.load(Ordering::Relaxed),
            taken: self.taken.load(Ordering::Relaxed),
        }
    }
}

impl Default for AdmissionQueue {
    fn default() -> Self {
        Self::unbounded()
    }
}

/// Downstream trigger invoked after every successful admission.
#[async_trait]
pub trait QueueProcessor: Send + Sync {
    /// Work is available; `queue_length` is the length right after admission.
    async fn work_available(&self, queue_length: usize);
}

/// Processor that only records the trigger in the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingProcessor;

#[async_trait]
impl QueueProcessor for LoggingProcessor {
    async fn work_available(&self, queue_length: usize) {
        info!(queue_length, "Processing queue triggered");
        debug!("No downstream worker attached");
    }
}
