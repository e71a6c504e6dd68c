//! Backend collaborators - storage, record creation, analysis, machine listing
//!
//! The orchestrators only see these traits. [`HttpBackend`] implements all of
//! them against the analysis REST service; tests plug in scripted doubles.
//!
//! ## Failure signals
//!
//! Every collaborator fails with a [`BackendError`]. The variant carries the
//! signal the analysis orchestrator classifies on: transport failure, timeout,
//! HTTP status, undecodable body, or an analysis the service itself rejected.

pub mod http;

pub use http::{AnalysisReport, HttpBackend};

use async_trait::async_trait;

use crate::types::{Diagnosis, FileBlob, Machine, NewRecord, RecordId, StoredFile, UploadRequest};

/// File storage and record creation.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Store one recording, returning where it landed
    async fn store_file(
        &self,
        file: &FileBlob,
        request: &UploadRequest,
    ) -> Result<StoredFile, BackendError>;

    /// Create the backend record pointing at a stored file
    async fn create_record(&self, record: &NewRecord) -> Result<RecordId, BackendError>;
}

/// Signal analysis and fault diagnosis of one record.
#[async_trait]
pub trait AnalysisBackend: Send + Sync {
    async fn analyze_record(&self, record_id: &RecordId) -> Result<Analyzed, BackendError>;
}

/// Read-only machine directory feeding the metadata form.
#[async_trait]
pub trait MachineDirectory: Send + Sync {
    async fn list_machines(&self) -> Result<Vec<Machine>, BackendError>;
}

/// Successful analysis as returned by the service.
#[derive(Debug, Clone, PartialEq)]
pub struct Analyzed {
    /// When the service ran the analysis, if it said so
    pub analyzed_at: Option<chrono::DateTime<chrono::Utc>>,
    pub diagnosis: Diagnosis,
}

/// Collaborator errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BackendError {
    #[error("failed to fetch: {0}")]
    Network(String),
    #[error("request timeout: {0}")]
    Timeout(String),
    #[error("server returned status {status}: {detail}")]
    Status { status: u16, detail: String },
    #[error("invalid response: {0}")]
    Decode(String),
    #[error("{0}")]
    Rejected(String),
}

impl BackendError {
    /// HTTP status behind the failure, if there was one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for BackendError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout(e.to_string())
        } else if let Some(status) = e.status() {
            Self::Status {
                status: status.as_u16(),
                detail: e.to_string(),
            }
        } else if e.is_decode() {
            Self::Decode(e.to_string())
        } else {
            Self::Network(e.to_string())
        }
    }
}

impl From<serde_json::Error> for BackendError {
    fn from(e: serde_json::Error) -> Self {
        Self::Decode(e.to_string())
    }
}
