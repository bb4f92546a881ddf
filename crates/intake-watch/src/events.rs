//! Watcher event types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// A file that appeared under a watched root and has stopped changing.
///
/// Produced once per file per watcher generation and consumed exactly once by
/// the validation step.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IngestEvent {
    /// Unique identifier for this event.
    pub id: Uuid,

    /// Path to the file.
    pub path: PathBuf,

    /// Watched root the file was found under.
    pub root: PathBuf,

    /// Lowercase extension without the dot.
    pub extension: String,

    /// Size once stable.
    pub size_bytes: u64,

    /// When the file was reported stable.
    pub detected_at: DateTime<Utc>,

    /// Watcher generation that produced the event.
    pub generation: Uuid,
}

impl IngestEvent {
    /// Create a new event.
    pub fn new(
        path: PathBuf,
        root: PathBuf,
        extension: impl Into<String>,
        size_bytes: u64,
        generation: Uuid,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            path,
            root,
            extension: extension.into(),
            size_bytes,
            detected_at: Utc::now(),
            generation,
        }
    }

    /// Base name for display. Invalid UTF-8 is replaced, never dropped.
    pub fn file_name(&self) -> String {
        match self.path.file_name() {
            Some(name) => name.to_string_lossy().into_owned(),
            None => self.path.to_string_lossy().into_owned(),
        }
    }

    /// Path relative to the watched root.
    pub fn relative_path(&self) -> &Path {
        self.path.strip_prefix(&self.root).unwrap_or(&self.path)
    }
}

/// Unfiltered change notification from a backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawSignal {
    /// Path was created or written to.
    Touched(PathBuf),
    /// Path no longer exists at this location.
    Removed(PathBuf),
}

impl RawSignal {
    /// Path the signal refers to.
    pub fn path(&self) -> &Path {
        match self {
            Self::Touched(path) | Self::Removed(path) => path,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_accessors() {
        let root = PathBuf::from("/drop");
        let event = IngestEvent::new(
            root.join("2024").join("cv.pdf"),
            root.clone(),
            "pdf",
            1024,
            Uuid::new_v4(),
        );
        assert_eq!(event.file_name(), "cv.pdf");
        assert_eq!(event.relative_path(), Path::new("2024/cv.pdf"));
        assert_eq!(event.extension, "pdf");
    }

    #[cfg(unix)]
    #[test]
    fn test_file_name_survives_invalid_utf8() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let root = PathBuf::from("/drop");
        let event = IngestEvent::new(
            root.join(OsStr::from_bytes(b"\xffcv.pdf")),
            root,
            "pdf",
            9,
            Uuid::new_v4(),
        );
        assert_eq!(event.file_name(), "\u{FFFD}cv.pdf");
    }

    #[test]
    fn test_signal_path() {
        let signal = RawSignal::Removed(PathBuf::from("/drop/a.doc"));
        assert_eq!(signal.path(), Path::new("/drop/a.doc"));
    }
}
