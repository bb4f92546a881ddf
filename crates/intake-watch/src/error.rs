//! Error types for the folder watching system.

use thiserror::Error;

/// Errors that can occur during folder watching operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// File system watching error.
    #[error("File watching error: {0}")]
    Watch(String),

    /// IO error during file operations.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid path.
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// Permission denied.
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type for folder watching operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Convert notify errors to our error type.
impl From<notify::Error> for Error {
    fn from(err: notify::Error) -> Self {
        match &err.kind {
            notify::ErrorKind::Io(io) if io.kind() == std::io::ErrorKind::PermissionDenied => {
                Error::PermissionDenied(err.to_string())
            }
            notify::ErrorKind::PathNotFound => Error::InvalidPath(err.to_string()),
            _ => Error::Watch(err.to_string()),
        }
    }
}

/// Whether a notify error is a permission failure on some entry.
///
/// Such errors are tolerated: the entry is skipped and watching continues.
pub(crate) fn is_permission_error(err: &notify::Error) -> bool {
    matches!(
        &err.kind,
        notify::ErrorKind::Io(io) if io.kind() == std::io::ErrorKind::PermissionDenied
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permission_errors_are_classified() {
        let denied = notify::Error::io(std::io::Error::from(std::io::ErrorKind::PermissionDenied));
        assert!(is_permission_error(&denied));
        assert!(matches!(Error::from(denied), Error::PermissionDenied(_)));

        let generic = notify::Error::generic("boom");
        assert!(!is_permission_error(&generic));
        assert!(matches!(Error::from(generic), Error::Watch(_)));

        assert!(matches!(
            Error::from(notify::Error::path_not_found()),
            Error::InvalidPath(_)
        ));
    }
}
