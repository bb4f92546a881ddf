//! PDF stream check.

use crate::RejectReason;
use lopdf::Document;

/// Open `bytes` as a PDF document.
///
/// The document must load and its trailer must reference a catalog. The
/// parser's own error message becomes the rejection reason.
pub fn validate(bytes: &[u8]) -> Result<(), RejectReason> {
    let document =
        Document::load_mem(bytes).map_err(|e| RejectReason::UnparsablePdf(e.to_string()))?;

    document
        .trailer
        .get(b"Root")
        .map(|_| ())
        .map_err(|e| RejectReason::UnparsablePdf(format!("Missing document catalog: {}", e)))
}
