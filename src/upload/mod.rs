//! Upload - per-file status tracking and the store/record orchestrator
//!
//! ## Architecture
//!
//! - **FileUploadTracker**: status map keyed by batch index
//! - **UploadOrchestrator**: runs each item through store-file and
//!   create-record, isolating failures per item

pub mod orchestrator;
pub mod tracker;

pub use orchestrator::{UploadOrchestrator, UploadOutcome, UploadStepError, ValidationError};
pub use tracker::{FileUploadTracker, TrackerError};
