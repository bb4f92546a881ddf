//! Validation results.

use thiserror::Error;

/// Why a file was rejected.
///
/// The `Display` form is the reason recorded when the file is quarantined.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    /// File exceeds the configured size limit.
    #[error("Too large")]
    TooLarge {
        /// Observed size in bytes.
        size: u64,
        /// Limit in bytes.
        limit: u64,
    },

    /// The docx archive lacks a required part.
    #[error("Invalid DOCX: missing {missing}")]
    MissingDocxPart {
        /// First required entry not found in the archive.
        missing: String,
    },

    /// The docx bytes are not a readable zip archive.
    #[error("Invalid DOCX: {0}")]
    UnreadableArchive(String),

    /// The doc file contains no text.
    #[error("Empty DOC")]
    EmptyDoc,

    /// The doc bytes could not be read as a Word binary document.
    #[error("{0}")]
    UnreadableDoc(String),

    /// The pdf oracle refused the stream.
    #[error("{0}")]
    UnparsablePdf(String),

    /// Extension is not one of the accepted formats.
    #[error("Unsupported extension: {0}")]
    Unsupported(String),
}

/// Outcome of validating one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationOutcome {
    /// File is structurally valid.
    Accepted,

    /// File is structurally invalid.
    Rejected {
        /// Reason for rejection.
        reason: RejectReason,
    },

    /// Validation could not be carried out (I/O failure, oracle panic,
    /// timeout). Distinct from a content rejection.
    Internal {
        /// Description of the fault.
        message: String,
    },
}

impl ValidationOutcome {
    /// Shorthand for a rejection.
    pub fn rejected(reason: RejectReason) -> Self {
        Self::Rejected { reason }
    }

    /// Shorthand for an internal fault.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Whether the file was accepted.
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted)
    }

    /// Human-readable reason for anything other than acceptance.
    pub fn reason(&self) -> Option<String> {
        match self {
            Self::Accepted => None,
            Self::Rejected { reason } => Some(reason.to_string()),
            Self::Internal { message } => Some(format!("Internal error: {}", message)),
        }
    }
}

impl From<Result<(), RejectReason>> for ValidationOutcome {
    fn from(result: Result<(), RejectReason>) -> Self {
        match result {
            Ok(()) => Self::Accepted,
            Err(reason) => Self::Rejected { reason },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reason_strings() {
        let too_large = RejectReason::TooLarge {
            size: 6 * 1024 * 1024,
            limit: 5 * 1024 * 1024,
        };
        assert_eq!(too_large.to_string(), "Too large");
        assert_eq!(RejectReason::EmptyDoc.to_string(), "Empty DOC");
        assert_eq!(
            RejectReason::MissingDocxPart {
                missing: "word/document.xml".into()
            }
            .to_string(),
            "Invalid DOCX: missing word/document.xml"
        );
    }

    #[test]
    fn test_outcome_reason() {
        assert_eq!(ValidationOutcome::Accepted.reason(), None);
        assert_eq!(
            ValidationOutcome::rejected(RejectReason::EmptyDoc).reason(),
            Some("Empty DOC".to_string())
        );
        assert_eq!(
            ValidationOutcome::internal("timed out").reason(),
            Some("Internal error: timed out".to_string())
        );
    }
}
