//! Write-completion detection.
//!
//! A candidate file is held until its size has stayed unchanged for the
//! stability threshold. Each file is reported at most once per tracker; a
//! removal forgets it so a later file at the same path is reported again.

use crate::events::IngestEvent;
use crate::filter::IngestFilter;
use std::collections::{HashMap, HashSet};
use std::fs::Metadata;
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, trace, warn};
use uuid::Uuid;

#[derive(Debug)]
struct PendingFile {
    extension: String,
    size: Option<u64>,
    changed_at: Instant,
}

/// Tracks candidate files until their writes have settled.
#[derive(Debug)]
pub struct StabilityTracker {
    filter: IngestFilter,
    threshold: Duration,
    generation: Uuid,
    pending: HashMap<PathBuf, PendingFile>,
    seen: HashSet<PathBuf>,
}

impl StabilityTracker {
    /// Create a tracker for one watcher generation.
    pub fn new(filter: IngestFilter, threshold: Duration, generation: Uuid) -> Self {
        Self {
            filter,
            threshold,
            generation,
            pending: HashMap::new(),
            seen: HashSet::new(),
        }
    }

    /// Record that `path` was created or modified.
    ///
    /// Returns `false` when the path was filtered out or already reported.
    pub fn observe(&mut self, path: &Path, now: Instant) -> bool {
        let Some(extension) = self.filter.admit(path) else {
            trace!("Ignoring {}", path.display());
            return false;
        };
        if self.seen.contains(path) {
            return false;
        }

        self.pending
            .entry(path.to_path_buf())
            .and_modify(|p| p.changed_at = now)
            .or_insert(PendingFile {
                extension,
                size: None,
                changed_at: now,
            });
        true
    }

    /// Forget `path` so it can be reported again if it reappears.
    pub fn forget(&mut self, path: &Path) {
        self.pending.remove(path);
        self.seen.remove(path);
        // A removed directory takes its contents with it.
        self.pending.retain(|p, _| !p.starts_with(path));
        self.seen.retain(|p| !p.starts_with(path));
    }

    /// Check pending files and return those whose size has settled.
    ///
    /// Metadata for the whole pending set is read in one blocking task.
    pub async fn poll(&mut self, now: Instant) -> Vec<IngestEvent> {
        if self.pending.is_empty() {
            return Vec::new();
        }

        let paths: Vec<PathBuf> = self.pending.keys().cloned().collect();
        let stats = match tokio::task::spawn_blocking(move || stat_all(paths)).await {
            Ok(stats) => stats,
            Err(e) => {
                warn!("Metadata task failed: {}", e);
                return Vec::new();
            }
        };
        self.settle(now, stats)
    }

    fn settle(&mut self, now: Instant, stats: Vec<(PathBuf, io::Result<Metadata>)>) -> Vec<IngestEvent> {
        let mut ready = Vec::new();
        let mut dropped = Vec::new();

        for (path, stat) in stats {
            // Forgotten while the batch was being read.
            let Some(pending) = self.pending.get_mut(&path) else {
                continue;
            };

            let metadata = match stat {
                Ok(metadata) => metadata,
                Err(e) => {
                    if e.kind() == ErrorKind::PermissionDenied {
                        warn!("Skipping unreadable file {}: {}", path.display(), e);
                    } else if e.kind() != ErrorKind::NotFound {
                        debug!("Cannot stat {}: {}", path.display(), e);
                    }
                    dropped.push(path);
                    continue;
                }
            };

            if !metadata.is_file() {
                dropped.push(path);
                continue;
            }

            let size = metadata.len();
            if pending.size != Some(size) {
                pending.size = Some(size);
                pending.changed_at = now;
                continue;
            }

            if now.saturating_duration_since(pending.changed_at) >= self.threshold {
                let extension = pending.extension.clone();
                ready.push((path, extension, size));
            }
        }

        for path in dropped {
            self.pending.remove(&path);
        }

        ready
            .into_iter()
            .map(|(path, extension, size)| {
                self.pending.remove(&path);
                self.seen.insert(path.clone());
                debug!("File settled: {} ({} bytes)", path.display(), size);
                IngestEvent::new(
                    path,
                    self.filter.root().to_path_buf(),
                    extension,
                    size,
                    self.generation,
                )
            })
            .collect()
    }

    /// Number of files waiting to settle.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Number of files already reported.
    pub fn seen_len(&self) -> usize {
        self.seen.len()
    }
}

fn stat_all(paths: Vec<PathBuf>) -> Vec<(PathBuf, io::Result<Metadata>)> {
    paths
        .into_iter()
        .map(|path| {
            let stat = std::fs::metadata(&path);
            (path, stat)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WatchSettings;
    use std::fs;
    use tempfile::TempDir;

    const THRESHOLD: Duration = Duration::from_millis(500);

    fn tracker(root: &Path) -> StabilityTracker {
        StabilityTracker::new(
            IngestFilter::new(root, &WatchSettings::default()),
            THRESHOLD,
            Uuid::new_v4(),
        )
    }

    #[tokio::test]
    async fn test_reports_after_size_settles() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("cv.pdf");
        fs::write(&file, b"%PDF-1.4").unwrap();

        let mut tracker = tracker(dir.path());
        let start = Instant::now();
        assert!(tracker.observe(&file, start));

        // First poll records the size.
        assert!(tracker.poll(start).await.is_empty());
        // Still inside the threshold.
        assert!(tracker.poll(start + Duration::from_millis(200)).await.is_empty());

        let events = tracker.poll(start + Duration::from_millis(600)).await;
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].path, file);
        assert_eq!(events[0].extension, "pdf");
        assert_eq!(events[0].size_bytes, 8);
        assert_eq!(tracker.pending_len(), 0);
        assert_eq!(tracker.seen_len(), 1);
    }

    #[tokio::test]
    async fn test_growth_restarts_the_clock() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("cv.docx");
        fs::write(&file, b"PK").unwrap();

        let mut tracker = tracker(dir.path());
        let start = Instant::now();
        tracker.observe(&file, start);
        assert!(tracker.poll(start).await.is_empty());

        fs::write(&file, b"PK more bytes").unwrap();
        assert!(tracker.poll(start + Duration::from_millis(400)).await.is_empty());
        // 500ms after the first sighting, but only 200ms after growth.
        assert!(tracker.poll(start + Duration::from_millis(600)).await.is_empty());

        let events = tracker.poll(start + Duration::from_millis(1000)).await;
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].size_bytes, 13);
    }

    #[tokio::test]
    async fn test_reported_once_until_forgotten() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("a.doc");
        fs::write(&file, b"x").unwrap();

        let mut tracker = tracker(dir.path());
        let start = Instant::now();
        tracker.observe(&file, start);
        tracker.poll(start).await;
        assert_eq!(tracker.poll(start + Duration::from_secs(1)).await.len(), 1);

        assert!(!tracker.observe(&file, start + Duration::from_secs(2)));
        assert!(tracker.poll(start + Duration::from_secs(5)).await.is_empty());

        tracker.forget(&file);
        assert_eq!(tracker.seen_len(), 0);
        assert!(tracker.observe(&file, start + Duration::from_secs(6)));
    }

    #[tokio::test]
    async fn test_vanished_files_are_dropped() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("gone.pdf");
        fs::write(&file, b"x").unwrap();

        let mut tracker = tracker(dir.path());
        let start = Instant::now();
        tracker.observe(&file, start);
        fs::remove_file(&file).unwrap();

        assert!(tracker.poll(start + Duration::from_secs(1)).await.is_empty());
        assert_eq!(tracker.pending_len(), 0);
    }

    #[test]
    fn test_filtered_paths_are_not_tracked() {
        let dir = TempDir::new().unwrap();
        let mut tracker = tracker(dir.path());
        let now = Instant::now();

        assert!(!tracker.observe(&dir.path().join("notes.txt"), now));
        assert!(!tracker.observe(&dir.path().join(".a.pdf"), now));
        assert!(!tracker.observe(&dir.path().join("invalid-format").join("a.pdf"), now));
        assert_eq!(tracker.pending_len(), 0);
    }

    #[test]
    fn test_forgetting_a_directory_forgets_its_files() {
        let dir = TempDir::new().unwrap();
        let sub = dir.path().join("2024");
        let mut tracker = tracker(dir.path());
        let now = Instant::now();

        tracker.observe(&sub.join("a.pdf"), now);
        tracker.observe(&sub.join("b.pdf"), now);
        tracker.observe(&dir.path().join("c.pdf"), now);
        tracker.forget(&sub);
        assert_eq!(tracker.pending_len(), 1);
    }

    #[tokio::test]
    async fn test_settles_a_batch_of_files() {
        let dir = TempDir::new().unwrap();
        let mut tracker = tracker(dir.path());
        let start = Instant::now();
        for i in 0..20 {
            let file = dir.path().join(format!("cv-{i}.pdf"));
            fs::write(&file, b"%PDF").unwrap();
            tracker.observe(&file, start);
        }

        assert!(tracker.poll(start).await.is_empty());
        let events = tracker.poll(start + Duration::from_secs(1)).await;
        assert_eq!(events.len(), 20);
        assert_eq!(tracker.pending_len(), 0);
    }

    #[test]
    fn test_forgotten_during_stat_batch_is_ignored() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("a.pdf");
        fs::write(&file, b"x").unwrap();

        let mut tracker = tracker(dir.path());
        let start = Instant::now();
        tracker.observe(&file, start);
        let stats = stat_all(vec![file.clone()]);
        tracker.forget(&file);

        assert!(tracker.settle(start + Duration::from_secs(1), stats).is_empty());
        assert_eq!(tracker.pending_len(), 0);
        assert_eq!(tracker.seen_len(), 0);
    }
}
