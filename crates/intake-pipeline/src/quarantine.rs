//! Quarantine of rejected files.
//!
//! Rejected files are moved into the `invalid-format` subfolder of the root
//! they were found under, and a record of the rejection is appended to an
//! in-memory results log. Failures here are logged and swallowed so one bad
//! file never stops its folder's watcher.

use chrono::{DateTime, Utc};
use intake_watch::QUARANTINE_DIR;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Status recorded for every quarantined file.
pub const QUARANTINE_STATUS: &str = "invalid-format";

/// Upper bound on collision suffixes tried before giving up.
const MAX_COLLISION_SUFFIX: u32 = 10_000;

/// Result entry for one quarantined file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuarantineRecord {
    /// Base name of the file as it was dropped
    pub filename: String,
    /// Always [`QUARANTINE_STATUS`]
    pub status: String,
    /// Why the file was rejected
    pub reason: String,
    /// When the file was moved
    pub timestamp: DateTime<Utc>,
}

impl QuarantineRecord {
    /// Create a record stamped now.
    pub fn new(filename: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            status: QUARANTINE_STATUS.to_string(),
            reason: reason.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Append-only log of quarantine records, optionally bounded.
///
/// When bounded and full, the oldest record is dropped.
#[derive(Debug)]
pub struct QuarantineLog {
    records: Mutex<VecDeque<QuarantineRecord>>,
    capacity: Option<usize>,
}

impl QuarantineLog {
    /// Create a log with an optional capacity.
    pub fn new(capacity: Option<usize>) -> Self {
        Self {
            records: Mutex::new(VecDeque::new()),
            capacity,
        }
    }

    /// Append a record.
    pub fn push(&self, record: QuarantineRecord) {
        let mut records = self.records.lock();
        if let Some(capacity) = self.capacity {
            while records.len() >= capacity {
                records.pop_front();
            }
        }
        records.push_back(record);
    }

    /// Copy of all retained records, oldest first.
    pub fn records(&self) -> Vec<QuarantineRecord> {
        self.records.lock().iter().cloned().collect()
    }

    /// Number of retained records.
    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    /// Whether no record is retained.
    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }
}

impl Default for QuarantineLog {
    fn default() -> Self {
        Self::new(None)
    }
}

/// Moves rejected files aside and records why.
#[derive(Debug, Clone)]
pub struct QuarantineRouter {
    log: Arc<QuarantineLog>,
}

impl QuarantineRouter {
    /// Create a router writing records to `log`.
    pub fn new(log: Arc<QuarantineLog>) -> Self {
        Self { log }
    }

    /// Results log shared with this router.
    pub fn log(&self) -> &Arc<QuarantineLog> {
        &self.log
    }

    /// Move `file` into `<root>/invalid-format/` and record `reason`.
    ///
    /// Returns the record on success. Any failure is logged and yields `None`;
    /// the file is then left where it was.
    pub async fn quarantine(&self, root: &Path, file: &Path, reason: &str) -> Option<QuarantineRecord> {
        let Some(name) = file.file_name() else {
            error!("Cannot quarantine {}: no file name", file.display());
            return None;
        };
        let filename = name.to_string_lossy().into_owned();

        let dir = root.join(QUARANTINE_DIR);
        if let Err(e) = tokio::fs::create_dir_all(&dir).await {
            error!("Failed to create {}: {}", dir.display(), e);
            return None;
        }

        let destination = match free_destination(&dir, name).await {
            Some(destination) => destination,
            None => {
                error!("No free name for {} in {}", filename, dir.display());
                return None;
            }
        };

        if let Err(e) = tokio::fs::rename(file, &destination).await {
            error!(
                "Failed to move {} to {}: {}",
                file.display(),
                destination.display(),
                e
            );
            return None;
        }

        if destination.file_name() != Some(name) {
            warn!(
                "Quarantine name collision for {}, stored as {}",
                filename,
                destination.display()
            );
        }

        let record = QuarantineRecord::new(filename, reason);
        info!(file = %record.filename, reason = %record.reason, "Quarantined invalid file");
        self.log.push(record.clone());
        Some(record)
    }
}

/// First name in `dir` not already taken: `name`, then `stem-1.ext`, `stem-2.ext`, ...
async fn free_destination(dir: &Path, name: &OsStr) -> Option<PathBuf> {
    let candidate = dir.join(name);
    if !path_exists(&candidate).await {
        return Some(candidate);
    }

    let as_path = Path::new(name);
    let stem = as_path.file_stem().unwrap_or(name);
    let extension = as_path.extension();

    for n in 1..=MAX_COLLISION_SUFFIX {
        let mut numbered = OsString::from(stem);
        numbered.push(format!("-{}", n));
        if let Some(ext) = extension {
            numbered.push(".");
            numbered.push(ext);
        }
        let candidate = dir.join(numbered);
        if !path_exists(&candidate).await {
            return Some(candidate);
        }
    }
    None
}

async fn path_exists(path: &Path) -> bool {
    tokio::fs::symlink_metadata(path).await.is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_moves_file_and_records() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("c.pdf");
        fs::write(&file, b"not a pdf").unwrap();

        let router = QuarantineRouter::new(Arc::new(QuarantineLog::default()));
        let record = router
            .quarantine(dir.path(), &file, "Invalid PDF structure")
            .await
            .unwrap();

        assert_eq!(record.filename, "c.pdf");
        assert_eq!(record.status, "invalid-format");
        assert_eq!(record.reason, "Invalid PDF structure");
        assert!(!file.exists());
        assert!(dir.path().join("invalid-format").join("c.pdf").exists());
        assert_eq!(router.log().len(), 1);
    }

    #[tokio::test]
    async fn test_collisions_get_numbered_names() {
        let dir = TempDir::new().unwrap();
        let quarantine = dir.path().join("invalid-format");
        fs::create_dir(&quarantine).unwrap();
        fs::write(quarantine.join("c.pdf"), b"first").unwrap();
        fs::write(quarantine.join("c-1.pdf"), b"second").unwrap();

        let file = dir.path().join("c.pdf");
        fs::write(&file, b"third").unwrap();

        let router = QuarantineRouter::new(Arc::new(QuarantineLog::default()));
        let record = router.quarantine(dir.path(), &file, "Too large").await.unwrap();

        assert_eq!(record.filename, "c.pdf");
        assert_eq!(fs::read(quarantine.join("c-2.pdf")).unwrap(), b"third");
        assert_eq!(fs::read(quarantine.join("c.pdf")).unwrap(), b"first");
    }

    #[tokio::test]
    async fn test_missing_file_is_swallowed() {
        let dir = TempDir::new().unwrap();
        let router = QuarantineRouter::new(Arc::new(QuarantineLog::default()));

        let record = router
            .quarantine(dir.path(), &dir.path().join("gone.docx"), "Invalid DOCX")
            .await;
        assert!(record.is_none());
        assert!(router.log().is_empty());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_non_utf8_name_is_moved_and_recorded() {
        use std::os::unix::ffi::OsStrExt;

        let dir = TempDir::new().unwrap();
        let name = OsStr::from_bytes(b"\xffcv.pdf");
        let file = dir.path().join(name);
        fs::write(&file, b"not a pdf").unwrap();

        let quarantine = dir.path().join("invalid-format");
        fs::create_dir(&quarantine).unwrap();
        fs::write(quarantine.join(name), b"earlier").unwrap();

        let router = QuarantineRouter::new(Arc::new(QuarantineLog::default()));
        let record = router
            .quarantine(dir.path(), &file, "Invalid PDF structure")
            .await
            .unwrap();

        assert_eq!(record.filename, "\u{FFFD}cv.pdf");
        assert!(!file.exists());
        let numbered = quarantine.join(OsStr::from_bytes(b"\xffcv-1.pdf"));
        assert_eq!(fs::read(numbered).unwrap(), b"not a pdf");
        assert_eq!(router.log().len(), 1);
    }

    #[test]
    fn test_bounded_log_drops_oldest() {
        let log = QuarantineLog::new(Some(2));
        log.push(QuarantineRecord::new("a.pdf", "x"));
        log.push(QuarantineRecord::new("b.pdf", "y"));
        log.push(QuarantineRecord::new("c.pdf", "z"));

        let names: Vec<_> = log.records().into_iter().map(|r| r.filename).collect();
        assert_eq!(names, vec!["b.pdf", "c.pdf"]);
    }

    #[test]
    fn test_record_serializes_rfc3339() {
        let record = QuarantineRecord::new("a.doc", "Empty DOC");
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["status"], "invalid-format");
        assert_eq!(json["reason"], "Empty DOC");
        let timestamp = json["timestamp"].as_str().unwrap();
        assert!(DateTime::parse_from_rfc3339(timestamp).is_ok());
    }
}
