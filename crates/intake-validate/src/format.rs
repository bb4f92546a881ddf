//! Accepted document formats.

use std::fmt;

/// A document format the intake pipeline knows how to validate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentFormat {
    /// Portable Document Format
    Pdf,
    /// Office Open XML word processing document
    Docx,
    /// Legacy Word 97-2003 binary document
    Doc,
}

impl DocumentFormat {
    /// All accepted formats.
    pub const ALL: [DocumentFormat; 3] = [Self::Pdf, Self::Docx, Self::Doc];

    /// Resolve a format from a file extension.
    ///
    /// Matching is case-insensitive and tolerates a leading dot, so `"PDF"`,
    /// `".pdf"` and `"pdf"` all resolve to [`DocumentFormat::Pdf`].
    pub fn from_extension(extension: &str) -> Option<Self> {
        let ext = extension.trim_start_matches('.').to_ascii_lowercase();
        match ext.as_str() {
            "pdf" => Some(Self::Pdf),
            "docx" => Some(Self::Docx),
            "doc" => Some(Self::Doc),
            _ => None,
        }
    }

    /// Lowercase extension without the leading dot.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Docx => "docx",
            Self::Doc => "doc",
        }
    }

    /// Extensions of every accepted format.
    pub fn extensions() -> Vec<String> {
        Self::ALL.iter().map(|f| f.extension().to_string()).collect()
    }
}

impl fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, ".{}", self.extension())
    }
}
