//! Intake Pipeline
//!
//! Wires folder watching to validation, admission and quarantine.
//!
//! ## Architecture
//!
//! ```text
//! sync_folder(path)
//!       │
//!       ▼
//! WatchRegistry ──▶ IngestEvent ──▶ AsyncValidator
//!                                      │
//!                    ┌─────────────────┴─────────────────┐
//!                    ▼                                   ▼
//!             AdmissionQueue                     QuarantineRouter
//!        (QueueProcessor, Broadcaster)            (QuarantineLog)
//! ```
//!
//! Infrastructure crates do not orchestrate:
//! - `intake-watch` reports settled files and nothing else
//! - `intake-validate` answers accept or reject for a file
//!
//! This crate decides what happens next and tells observers about it.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use intake_pipeline::{IntakeConfig, StdoutObserver, SyncOrchestrator};
//! use std::sync::Arc;
//!
//! let orchestrator = SyncOrchestrator::new(IntakeConfig::default())?;
//! orchestrator.subscribe(Arc::new(StdoutObserver));
//!
//! let response = orchestrator.sync_folder("./resumes").await?;
//! assert_eq!(response.message, "Started watching folder: ./resumes");
//! ```

pub mod broadcast;
pub mod config;
pub mod error;
pub mod orchestrator;
pub mod quarantine;
pub mod queue;

pub use broadcast::{Broadcaster, ChannelObserver, Notification, Observer, ObserverId, StdoutObserver};
pub use config::{IntakeConfig, LoggingConfig, QueueConfig, ResultsConfig, ValidationConfig};
pub use error::{Error, Result};
pub use orchestrator::{SyncOrchestrator, SyncResponse};
pub use quarantine::{QuarantineLog, QuarantineRecord, QuarantineRouter, QUARANTINE_STATUS};
pub use queue::{AdmissionQueue, LoggingProcessor, QueueProcessor, QueueStats};
