//! Validator entry points.

use crate::{doc, docx, pdf, DocumentFormat, RejectReason, ValidationOutcome};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Largest accepted file: 5 MiB.
pub const MAX_FILE_SIZE: u64 = 5 * 1024 * 1024;

/// Default upper bound on validating a single file.
pub const DEFAULT_VALIDATION_TIMEOUT: Duration = Duration::from_secs(30);

/// Synchronous, pure validator over file bytes.
#[derive(Debug, Clone)]
pub struct FormatValidator {
    max_file_size: u64,
}

impl FormatValidator {
    /// Create a validator with the default size limit.
    pub fn new() -> Self {
        Self {
            max_file_size: MAX_FILE_SIZE,
        }
    }

    /// Override the size limit.
    pub fn with_max_file_size(mut self, max_file_size: u64) -> Self {
        self.max_file_size = max_file_size;
        self
    }

    /// Configured size limit in bytes.
    pub fn max_file_size(&self) -> u64 {
        self.max_file_size
    }

    /// Reject sizes strictly above the limit.
    pub fn check_size(&self, size: u64) -> Result<(), RejectReason> {
        if size > self.max_file_size {
            Err(RejectReason::TooLarge {
                size,
                limit: self.max_file_size,
            })
        } else {
            Ok(())
        }
    }

    /// Validate `bytes` as the format named by `extension`.
    ///
    /// The size check runs before the extension is looked at, so an oversized
    /// file is rejected without any container inspection.
    pub fn validate(&self, extension: &str, bytes: &[u8]) -> ValidationOutcome {
        if let Err(reason) = self.check_size(bytes.len() as u64) {
            return ValidationOutcome::rejected(reason);
        }

        let Some(format) = DocumentFormat::from_extension(extension) else {
            return ValidationOutcome::rejected(RejectReason::Unsupported(extension.to_string()));
        };

        let result = match format {
            DocumentFormat::Docx => docx::validate(bytes),
            DocumentFormat::Doc => doc::validate(bytes),
            DocumentFormat::Pdf => pdf::validate(bytes),
        };
        result.into()
    }
}

impl Default for FormatValidator {
    fn default() -> Self {
        Self::new()
    }
}

/// Byte-level check that [`AsyncValidator`] runs on the blocking pool.
pub trait ByteValidator: Send + Sync + std::fmt::Debug {
    /// Reject sizes above the limit before any bytes are read.
    fn check_size(&self, size: u64) -> Result<(), RejectReason>;

    /// Validate `bytes` as the format named by `extension`.
    fn validate(&self, extension: &str, bytes: &[u8]) -> ValidationOutcome;
}

impl ByteValidator for FormatValidator {
    fn check_size(&self, size: u64) -> Result<(), RejectReason> {
        FormatValidator::check_size(self, size)
    }

    fn validate(&self, extension: &str, bytes: &[u8]) -> ValidationOutcome {
        FormatValidator::validate(self, extension, bytes)
    }
}

/// Validates files on disk off the async runtime, with a per-file timeout.
#[derive(Debug, Clone)]
pub struct AsyncValidator {
    validator: Arc<dyn ByteValidator>,
    timeout: Duration,
}

impl AsyncValidator {
    /// Wrap a validator with the default timeout.
    pub fn new(validator: FormatValidator) -> Self {
        Self::with_validator(Arc::new(validator))
    }

    /// Wrap any byte validator with the default timeout.
    pub fn with_validator(validator: Arc<dyn ByteValidator>) -> Self {
        Self {
            validator,
            timeout: DEFAULT_VALIDATION_TIMEOUT,
        }
    }

    /// Set the per-file timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Configured per-file timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Validate the file at `path`.
    ///
    /// The size is checked from metadata before any bytes are read. Parsing
    /// runs on the blocking pool; a panic or an expired timeout there yields
    /// [`ValidationOutcome::Internal`].
    pub async fn validate_file(&self, path: &Path, extension: &str) -> ValidationOutcome {
        let metadata = match tokio::fs::metadata(path).await {
            Ok(metadata) => metadata,
            Err(e) => {
                return ValidationOutcome::internal(format!(
                    "Failed to stat {}: {}",
                    path.display(),
                    e
                ))
            }
        };

        if let Err(reason) = self.validator.check_size(metadata.len()) {
            debug!(
                "Rejecting {} by size ({} bytes)",
                path.display(),
                metadata.len()
            );
            return ValidationOutcome::rejected(reason);
        }

        let bytes = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) => {
                return ValidationOutcome::internal(format!(
                    "Failed to read {}: {}",
                    path.display(),
                    e
                ))
            }
        };

        let validator = Arc::clone(&self.validator);
        let extension = extension.to_string();
        let task = tokio::task::spawn_blocking(move || validator.validate(&extension, &bytes));

        match tokio::time::timeout(self.timeout, task).await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(join_error)) => {
                warn!("Validator task failed for {}: {}", path.display(), join_error);
                ValidationOutcome::internal(format!("Validator task failed: {}", join_error))
            }
            Err(_) => {
                warn!(
                    "Validation of {} timed out after {:?}",
                    path.display(),
                    self.timeout
                );
                ValidationOutcome::internal(format!(
                    "Validation timed out after {}ms",
                    self.timeout.as_millis()
                ))
            }
        }
    }
}

impl Default for AsyncValidator {
    fn default() -> Self {
        Self::new(FormatValidator::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{
        minimal_pdf, oversized_docx, valid_docx, word97_doc, PanickingValidator, StalledValidator,
    };
    use tempfile::TempDir;

    #[test]
    fn test_size_check_precedes_format_check() {
        let validator = FormatValidator::new();
        let bytes = vec![b'x'; (MAX_FILE_SIZE + 1) as usize];

        for ext in ["pdf", "docx", "doc", "txt"] {
            assert!(
                matches!(
                    validator.validate(ext, &bytes),
                    ValidationOutcome::Rejected {
                        reason: RejectReason::TooLarge { .. }
                    }
                ),
                "{ext}"
            );
        }
    }

    #[test]
    fn test_exactly_at_limit_is_not_too_large() {
        let validator = FormatValidator::new();
        assert!(validator.check_size(MAX_FILE_SIZE).is_ok());
        assert!(validator.check_size(MAX_FILE_SIZE + 1).is_err());
    }

    #[test]
    fn test_oversized_valid_docx_is_too_large() {
        let validator = FormatValidator::new();
        let bytes = oversized_docx(6 * 1024 * 1024);
        assert_eq!(
            validator.validate("docx", &bytes).reason(),
            Some("Too large".to_string())
        );
    }

    #[test]
    fn test_dispatches_by_extension() {
        let validator = FormatValidator::new();
        assert!(validator.validate("docx", &valid_docx()).is_accepted());
        assert!(validator.validate(".PDF", &minimal_pdf()).is_accepted());
        assert!(validator.validate("doc", &word97_doc("Résumé")).is_accepted());

        // Right bytes, wrong extension.
        assert!(!validator.validate("pdf", &valid_docx()).is_accepted());
    }

    #[test]
    fn test_unsupported_extension() {
        let validator = FormatValidator::new();
        assert_eq!(
            validator.validate("txt", b"hello"),
            ValidationOutcome::rejected(RejectReason::Unsupported("txt".into()))
        );
    }

    #[tokio::test]
    async fn test_validate_file_from_disk() {
        let temp_dir = TempDir::new().unwrap();
        let good = temp_dir.path().join("cv.docx");
        let bad = temp_dir.path().join("cv.pdf");
        std::fs::write(&good, valid_docx()).unwrap();
        std::fs::write(&bad, "just some text").unwrap();

        let validator = AsyncValidator::default();
        assert!(validator.validate_file(&good, "docx").await.is_accepted());
        assert!(matches!(
            validator.validate_file(&bad, "pdf").await,
            ValidationOutcome::Rejected {
                reason: RejectReason::UnparsablePdf(_)
            }
        ));
    }

    #[tokio::test]
    async fn test_validate_file_uses_metadata_size() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("big.docx");
        std::fs::write(&path, vec![0u8; 2048]).unwrap();

        let validator = AsyncValidator::new(FormatValidator::new().with_max_file_size(1024));
        assert_eq!(
            validator.validate_file(&path, "docx").await.reason(),
            Some("Too large".to_string())
        );
    }

    #[tokio::test]
    async fn test_missing_file_is_internal() {
        let temp_dir = TempDir::new().unwrap();
        let validator = AsyncValidator::default();
        let outcome = validator
            .validate_file(&temp_dir.path().join("gone.pdf"), "pdf")
            .await;
        assert!(matches!(outcome, ValidationOutcome::Internal { .. }));
    }

    #[tokio::test]
    async fn test_timeout_is_internal() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("cv.pdf");
        std::fs::write(&path, minimal_pdf()).unwrap();

        let validator = AsyncValidator::with_validator(Arc::new(StalledValidator(
            Duration::from_millis(500),
        )))
        .with_timeout(Duration::from_millis(20));

        let outcome = validator.validate_file(&path, "pdf").await;
        assert_eq!(
            outcome,
            ValidationOutcome::internal("Validation timed out after 20ms")
        );
        assert_eq!(
            outcome.reason().as_deref(),
            Some("Internal error: Validation timed out after 20ms")
        );
    }

    #[tokio::test]
    async fn test_oracle_panic_is_internal() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("cv.docx");
        std::fs::write(&path, valid_docx()).unwrap();

        let validator = AsyncValidator::with_validator(Arc::new(PanickingValidator));
        match validator.validate_file(&path, "docx").await {
            ValidationOutcome::Internal { message } => {
                assert!(message.starts_with("Validator task failed"), "{message}");
            }
            other => panic!("expected internal failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_custom_validator_still_gets_size_check() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("big.pdf");
        std::fs::write(&path, vec![0u8; (MAX_FILE_SIZE + 1) as usize]).unwrap();

        // Rejected from metadata, so the panicking check never runs.
        let validator = AsyncValidator::with_validator(Arc::new(PanickingValidator));
        assert_eq!(
            validator.validate_file(&path, "pdf").await.reason(),
            Some("Too large".to_string())
        );
    }
}
