//! Diagnose Session - one upload-and-diagnose panel
//!
//! Ties the upload and analysis orchestrators to a single backend and keeps the
//! selected batch, so a caller walks select → process → analyze → retry and
//! reads progress, results and per-record stages in between.

use serde::Serialize;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::analysis::{AnalysisMode, AnalysisOrchestrator, AnalysisSummary};
use crate::backend::{AnalysisBackend, BackendError, MachineDirectory, StorageBackend};
use crate::series::ResultView;
use crate::types::{
    AnalysisResult, AnalysisStatus, FileBlob, RecordId, UploadItem, UploadRequest, UploadState,
};
use crate::upload::{UploadOrchestrator, UploadOutcome, ValidationError};
use crate::worker::WorkQueue;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("failed to list machines: {0}")]
    Machines(#[source] BackendError),
    #[error("no machines registered")]
    NoMachines,
}

/// Where one record stands across upload and analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "stage", rename_all = "snake_case")]
pub enum RecordStage {
    Pending,
    Uploading { progress: u8 },
    UploadFailed { message: String },
    Uploaded { record_id: RecordId },
    Analyzing { record_id: RecordId },
    Analyzed { record_id: RecordId, status: AnalysisStatus },
}

/// Stage of one batch item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemStage {
    pub index: usize,
    pub file_name: String,
    #[serde(flatten)]
    pub stage: RecordStage,
}

pub struct DiagnoseSession<B> {
    backend: Arc<B>,
    items: RwLock<Vec<UploadItem>>,
    upload: UploadOrchestrator<B>,
    analysis: AnalysisOrchestrator<B>,
}

impl<B> DiagnoseSession<B>
where
    B: StorageBackend + AnalysisBackend + MachineDirectory,
{
    pub fn new(backend: Arc<B>) -> Self {
        Self {
            upload: UploadOrchestrator::new(backend.clone()),
            analysis: AnalysisOrchestrator::new(backend.clone()),
            items: RwLock::new(Vec::new()),
            backend,
        }
    }

    /// Per-phase queues; both default to sequential.
    pub fn with_queues(mut self, upload: WorkQueue, analysis: WorkQueue) -> Self {
        self.upload = self.upload.with_queue(upload);
        self.analysis = self.analysis.with_queue(analysis);
        self
    }

    /// Replace the selected files. Every item starts at `pending`.
    pub async fn select_batch(&self, files: Vec<FileBlob>) -> usize {
        let items = UploadItem::batch(files);
        self.upload.select_batch(&items).await;
        let count = items.len();
        *self.items.write().await = items;
        info!(files = count, "Batch selected");
        count
    }

    /// The requested machine, or the first one the backend lists.
    pub async fn resolve_machine(&self, requested: Option<&str>) -> Result<String, SessionError> {
        if let Some(id) = requested.map(str::trim).filter(|id| !id.is_empty()) {
            return Ok(id.to_string());
        }
        let machines = self
            .backend
            .list_machines()
            .await
            .map_err(SessionError::Machines)?;
        let machine = machines.into_iter().next().ok_or(SessionError::NoMachines)?;
        info!(machine_id = %machine.id, name = %machine.name, "Auto-selected machine");
        Ok(machine.id)
    }

    /// Upload the selected batch and create a record per file.
    pub async fn process(&self, request: &UploadRequest) -> Result<UploadOutcome, SessionError> {
        let items = self.items.read().await.clone();
        Ok(self.upload.process(&items, request).await?)
    }

    /// Analyze every uploaded record.
    pub async fn analyze(&self) -> Vec<AnalysisResult> {
        let record_ids = self.upload.record_ids().await;
        self.analysis.analyze(&record_ids, AnalysisMode::All).await
    }

    /// Re-analyze only the records whose last analysis failed.
    pub async fn retry_failed(&self) -> Vec<AnalysisResult> {
        self.analysis.retry_failed().await
    }

    /// Drop the batch, every upload status, every result and in-flight marker.
    pub async fn reset(&self) {
        self.items.write().await.clear();
        self.upload.reset().await;
        self.analysis.reset().await;
        warn!("Session reset");
    }

    pub async fn all_completed(&self) -> bool {
        self.upload.all_completed().await
    }

    pub async fn has_errors(&self) -> bool {
        self.upload.has_errors().await
    }

    pub async fn results(&self) -> Vec<AnalysisResult> {
        self.analysis.results().await.into()
    }

    pub async fn summary(&self) -> AnalysisSummary {
        AnalysisSummary::of(&self.analysis.results().await)
    }

    /// Render-ready view of every result, in list order.
    pub async fn views(&self) -> Vec<ResultView> {
        self.analysis
            .results()
            .await
            .iter()
            .enumerate()
            .map(|(position, result)| ResultView::of(position, result))
            .collect()
    }

    /// Stage of every item in the current batch, in index order.
    pub async fn stages(&self) -> Vec<ItemStage> {
        let items = self.items.read().await.clone();
        let statuses = self.upload.snapshot().await;
        let in_flight = self.analysis.in_flight().await;
        let results = self.analysis.results().await;

        items
            .iter()
            .filter_map(|item| {
                let status = statuses.get(&item.index)?;
                let stage = match &status.state {
                    UploadState::Pending => RecordStage::Pending,
                    UploadState::Uploading => RecordStage::Uploading {
                        progress: status.progress,
                    },
                    UploadState::Error { message } => RecordStage::UploadFailed {
                        message: message.clone(),
                    },
                    UploadState::Completed { record_id } => {
                        if in_flight.contains(record_id) {
                            RecordStage::Analyzing {
                                record_id: record_id.clone(),
                            }
                        } else if let Some(result) = results.get(record_id) {
                            RecordStage::Analyzed {
                                record_id: record_id.clone(),
                                status: result.status(),
                            }
                        } else {
                            RecordStage::Uploaded {
                                record_id: record_id.clone(),
                            }
                        }
                    }
                };
                Some(ItemStage {
                    index: item.index,
                    file_name: item.file.name().to_string(),
                    stage,
                })
            })
            .collect()
    }
}
