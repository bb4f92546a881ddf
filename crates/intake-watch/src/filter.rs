//! Path filtering for watched roots.
//!
//! Exclusions are applied before the extension allow-list. Everything is
//! evaluated on the path relative to the watched root, so the root itself may
//! live under a dot-directory without excluding its contents.

use crate::config::WatchSettings;
use std::collections::HashSet;
use std::ffi::OsStr;
use std::path::{Component, Path, PathBuf};

/// Decides which paths under one root may produce events.
#[derive(Debug, Clone)]
pub struct IngestFilter {
    root: PathBuf,
    allowed_extensions: HashSet<String>,
    reserved_dirs: Vec<String>,
    max_depth: usize,
}

impl IngestFilter {
    /// Create a filter for `root` from watcher settings.
    pub fn new(root: impl Into<PathBuf>, settings: &WatchSettings) -> Self {
        Self {
            root: root.into(),
            allowed_extensions: settings
                .allowed_extensions
                .iter()
                .map(|e| e.trim_start_matches('.').to_ascii_lowercase())
                .collect(),
            reserved_dirs: settings.reserved_dirs.clone(),
            max_depth: settings.max_depth,
        }
    }

    /// Root this filter is anchored at.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Whether `path` is outside the root, hidden, transient, reserved or too
    /// deep.
    pub fn is_excluded(&self, path: &Path) -> bool {
        let Ok(relative) = path.strip_prefix(&self.root) else {
            return true;
        };

        let names: Vec<&OsStr> = relative
            .components()
            .filter_map(|c| match c {
                Component::Normal(name) => Some(name),
                _ => None,
            })
            .collect();

        if names.is_empty() {
            // The root itself
            return true;
        }

        // Prefix match on the relative path, so `invalid-format-old/` counts.
        let relative_bytes = relative.as_os_str().as_encoded_bytes();
        if self
            .reserved_dirs
            .iter()
            .any(|d| relative_bytes.starts_with(d.as_bytes()))
        {
            return true;
        }

        // Depth counts directories between the root and the entry.
        if names.len() - 1 > self.max_depth {
            return true;
        }

        names.iter().any(|name| is_hidden_or_transient(name))
    }

    /// Lowercase extension of `path` if it is on the allow-list.
    pub fn allowed_extension(&self, path: &Path) -> Option<String> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        self.allowed_extensions.contains(&ext).then_some(ext)
    }

    /// Extension of `path` when the file may produce an event.
    pub fn admit(&self, path: &Path) -> Option<String> {
        if self.is_excluded(path) {
            return None;
        }
        self.allowed_extension(path)
    }
}

/// Dot-files, editor backups and Office owner files (`~$name.docx`).
fn is_hidden_or_transient(name: &OsStr) -> bool {
    let bytes = name.as_encoded_bytes();
    bytes.starts_with(b".") || bytes.starts_with(b"~") || bytes.ends_with(b"~")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter() -> IngestFilter {
        IngestFilter::new("/drop", &WatchSettings::default())
    }

    #[test]
    fn test_accepts_listed_extensions_case_insensitively() {
        let filter = filter();
        assert_eq!(filter.admit(Path::new("/drop/a.pdf")).as_deref(), Some("pdf"));
        assert_eq!(filter.admit(Path::new("/drop/B.DOCX")).as_deref(), Some("docx"));
        assert_eq!(filter.admit(Path::new("/drop/sub/c.Doc")).as_deref(), Some("doc"));
    }

    #[test]
    fn test_drops_unlisted_extensions() {
        let filter = filter();
        for name in ["notes.txt", "photo.png", "archive.zip", "README", "cv.pdf.part"] {
            assert_eq!(filter.admit(&Path::new("/drop").join(name)), None, "{name}");
        }
    }

    #[test]
    fn test_excludes_hidden_anywhere() {
        let filter = filter();
        assert!(filter.is_excluded(Path::new("/drop/.hidden.pdf")));
        assert!(filter.is_excluded(Path::new("/drop/.cache/a.pdf")));
        assert!(filter.is_excluded(Path::new("/drop/2024/.tmp/a.pdf")));
        assert!(filter.is_excluded(Path::new("/drop/~$resume.docx")));
        assert!(!filter.is_excluded(Path::new("/drop/2024/a.pdf")));
    }

    #[test]
    fn test_excludes_reserved_subfolders() {
        let filter = filter();
        assert!(filter.is_excluded(Path::new("/drop/invalid-format/a.pdf")));
        assert!(filter.is_excluded(Path::new("/drop/duplicates/a.pdf")));
        assert!(filter.is_excluded(Path::new("/drop/failed-processing/x/a.pdf")));
        // Prefix of the relative path, not of nested folders.
        assert!(filter.is_excluded(Path::new("/drop/invalid-format-old/a.pdf")));
        assert!(filter.is_excluded(Path::new("/drop/duplicates.pdf")));
        assert!(!filter.is_excluded(Path::new("/drop/team/duplicates/a.pdf")));
        assert!(!filter.is_excluded(Path::new("/drop/old-invalid-format/a.pdf")));
    }

    #[cfg(unix)]
    #[test]
    fn test_non_utf8_components_are_still_checked() {
        use std::os::unix::ffi::OsStrExt;

        let filter = filter();
        let hidden_dir = Path::new("/drop")
            .join(OsStr::from_bytes(b".\xff"))
            .join("a.pdf");
        assert!(filter.is_excluded(&hidden_dir));

        let backup = Path::new("/drop").join(OsStr::from_bytes(b"cv\xff.pdf~"));
        assert!(filter.is_excluded(&backup));

        let plain = Path::new("/drop")
            .join(OsStr::from_bytes(b"\xffdir"))
            .join("a.pdf");
        assert_eq!(filter.admit(&plain).as_deref(), Some("pdf"));
    }

    #[test]
    fn test_hidden_root_does_not_hide_contents() {
        let filter = IngestFilter::new("/home/u/.inbox", &WatchSettings::default());
        assert_eq!(
            filter.admit(Path::new("/home/u/.inbox/cv.pdf")).as_deref(),
            Some("pdf")
        );
    }

    #[test]
    fn test_depth_cap() {
        let filter = IngestFilter::new("/drop", &WatchSettings::default().with_max_depth(2));
        assert!(!filter.is_excluded(Path::new("/drop/a.pdf")));
        assert!(!filter.is_excluded(Path::new("/drop/x/y/a.pdf")));
        assert!(filter.is_excluded(Path::new("/drop/x/y/z/a.pdf")));
    }

    #[test]
    fn test_outside_root_is_excluded() {
        let filter = filter();
        assert!(filter.is_excluded(Path::new("/elsewhere/a.pdf")));
        assert!(filter.is_excluded(Path::new("/drop")));
    }
}
