//! Shared data structures for the upload-and-diagnose flow
//!
//! This module defines the core types passed between the orchestrators:
//! - Upload: UploadItem, UploadRequest, UploadStatus (per-file progress)
//! - Record creation: StoredFile, NewRecord, RecordId
//! - Analysis: AnalysisResult with the service's Diagnosis payload

mod analysis;
mod upload;

pub use analysis::*;
pub use upload::*;
