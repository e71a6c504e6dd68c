//! Vibration Diag: upload-and-diagnose orchestration for vibration recordings
//!
//! Uploads a batch of recordings to the analysis service, creates one record
//! per file, requests a diagnosis per record and turns each result into
//! chart-ready series.
//!
//! ## Architecture
//!
//! - **Upload**: per-file status tracking, store → create-record per item
//! - **Analysis**: per-record diagnosis with failure classes and retry of failures
//! - **Series**: time/frequency series and fault-frequency tags for display
//! - **Backend**: collaborator traits and the HTTP implementation
//! - **Session**: one panel tying the above to a single backend

pub mod analysis;
pub mod backend;
pub mod config;
pub mod series;
pub mod session;
pub mod types;
pub mod upload;
pub mod worker;

// Re-export configuration
pub use config::{AppConfig, ConfigError};

// Re-export commonly used types
pub use types::{
    AnalysisErrorKind, AnalysisResult, AnalysisStatus, Diagnosis, FileBlob, Machine, RecordId,
    UploadItem, UploadRequest, UploadState, UploadStatus,
};

// Re-export orchestrators
pub use analysis::{AnalysisMode, AnalysisOrchestrator, AnalysisResults, AnalysisSummary};
pub use upload::{FileUploadTracker, UploadOrchestrator, UploadOutcome, ValidationError};

// Re-export backends
pub use backend::{
    AnalysisBackend, BackendError, HttpBackend, MachineDirectory, StorageBackend,
};

// Re-export series derivation
pub use series::{derive, DerivedSeries, ResultView, SeriesSource};

pub use session::{DiagnoseSession, ItemStage, RecordStage, SessionError};
pub use worker::WorkQueue;
