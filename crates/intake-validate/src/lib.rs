//! # Intake Format Validation
//!
//! Structural checks for the document formats accepted by the intake pipeline.
//! The checks are deliberately shallow: they answer "can this file be opened as
//! the format its extension claims" and nothing about its content.
//!
//! ```text
//! bytes ──▶ size check ──▶ format oracle ──▶ ValidationOutcome
//!                              │
//!                 ┌────────────┼────────────┐
//!                 ▼            ▼            ▼
//!              docx (zip)   doc (cfb)    pdf (lopdf)
//! ```
//!
//! Oracle failures never escape as errors. They are folded into
//! [`ValidationOutcome::Rejected`], while faults that have nothing to do with
//! the file's structure (I/O, panics, timeouts) become
//! [`ValidationOutcome::Internal`].

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod doc;
pub mod docx;
mod format;
mod outcome;
pub mod pdf;
mod validator;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_support;

pub use format::DocumentFormat;
pub use outcome::{RejectReason, ValidationOutcome};
pub use validator::{
    AsyncValidator, ByteValidator, FormatValidator, DEFAULT_VALIDATION_TIMEOUT, MAX_FILE_SIZE,
};
