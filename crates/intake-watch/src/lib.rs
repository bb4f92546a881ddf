//! # Intake Folder Watching
//!
//! Watches drop folders and reports each file once it has finished being
//! written. At most one watcher is live per folder; registering a folder again
//! closes the previous watcher before the new one starts.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────┐    ┌──────────────────┐    ┌─────────────────┐
//! │  WatchRegistry  │───▶│ DirectoryWatcher │───▶│   FileWatcher   │
//! │ (one per path)  │    │  (one per root)  │    │ (notify / poll) │
//! └─────────────────┘    └──────────────────┘    └─────────────────┘
//!                                 │                       │
//!                                 ▼                       ▼
//!                        ┌──────────────────┐    ┌─────────────────┐
//!                        │ StabilityTracker │◀───│   RawSignal     │
//!                        │ (filter, settle) │    │ (touched, gone) │
//!                        └──────────────────┘    └─────────────────┘
//!                                 │
//!                                 ▼
//!                           IngestEvent sink
//! ```
//!
//! Files under dot-directories, under the reserved `invalid-format`,
//! `duplicates` and `failed-processing` folders, or with an extension outside
//! the allow-list never produce an [`IngestEvent`].

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod backends;
pub mod config;
pub mod error;
mod events;
pub mod filter;
mod registry;
mod stability;
pub mod traits;
mod watcher;

pub use backends::{create_backend, NotifyWatcher, PollingWatcher};
pub use config::{
    WatchMode, WatchSettings, DUPLICATES_DIR, FAILED_PROCESSING_DIR, QUARANTINE_DIR,
    RESERVED_DIRS,
};
pub use error::{Error, Result};
pub use events::{IngestEvent, RawSignal};
pub use filter::IngestFilter;
pub use registry::{normalize_path, WatchRegistry};
pub use stability::StabilityTracker;
pub use traits::{FileWatcher, WatchHandle};
pub use watcher::DirectoryWatcher;

