//! DOCX container check.
//!
//! A docx file is a zip archive. Only the presence of the parts every Word
//! document needs is checked; the XML inside them is not parsed.

use crate::RejectReason;
use std::collections::HashSet;
use std::io::Cursor;
use zip::ZipArchive;

/// Entries a docx archive must contain, checked in this order.
pub const REQUIRED_PARTS: &[&str] = &["word/document.xml", "word/_rels/document.xml.rels"];

/// Check that `bytes` is a zip archive holding every [`REQUIRED_PARTS`] entry.
pub fn validate(bytes: &[u8]) -> Result<(), RejectReason> {
    let archive = ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| RejectReason::UnreadableArchive(e.to_string()))?;

    let names: HashSet<&str> = archive.file_names().collect();
    match REQUIRED_PARTS.iter().find(|part| !names.contains(**part)) {
        Some(missing) => Err(RejectReason::MissingDocxPart {
            missing: (*missing).to_string(),
        }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{docx_with_parts, valid_docx};

    #[test]
    fn test_complete_archive_is_valid() {
        assert_eq!(validate(&valid_docx()), Ok(()));
    }

    #[test]
    fn test_required_parts_alone_are_enough() {
        assert_eq!(validate(&docx_with_parts(REQUIRED_PARTS)), Ok(()));
    }

    #[test]
    fn test_removing_either_part_rejects() {
        for (idx, removed) in REQUIRED_PARTS.iter().enumerate() {
            let kept: Vec<&str> = REQUIRED_PARTS
                .iter()
                .enumerate()
                .filter(|(i, _)| *i != idx)
                .map(|(_, p)| *p)
                .collect();

            let result = validate(&docx_with_parts(&kept));
            assert_eq!(
                result,
                Err(RejectReason::MissingDocxPart {
                    missing: removed.to_string()
                })
            );
            assert!(result.unwrap_err().to_string().starts_with("Invalid DOCX"));
        }
    }

    #[test]
    fn test_first_missing_part_is_reported() {
        let result = validate(&docx_with_parts(&["[Content_Types].xml"]));
        assert_eq!(
            result,
            Err(RejectReason::MissingDocxPart {
                missing: "word/document.xml".to_string()
            })
        );
    }

    #[test]
    fn test_non_zip_bytes_are_invalid_docx() {
        let err = validate(b"this is not a zip archive").unwrap_err();
        assert!(matches!(err, RejectReason::UnreadableArchive(_)));
        assert!(err.to_string().starts_with("Invalid DOCX"));
    }
}
