//! Upload Orchestrator - stores each file and creates its backend record
//!
//! Per item: `uploading` (10%) → store file (50%) → create record (80%) →
//! `completed` (100%) with the record id. A failure in either backend call
//! marks that item `error` and the batch moves on to the next item.

use chrono::Utc;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use super::tracker::{FileUploadTracker, TrackerError};
use crate::backend::{BackendError, StorageBackend};
use crate::config::defaults::{PROGRESS_FILE_STORED, PROGRESS_RECORD_CREATED};
use crate::types::{NewRecord, RecordId, UploadItem, UploadRequest, UploadStatus};
use crate::worker::WorkQueue;

/// Batch pre-flight failures. Raised before any file is touched.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("no files selected")]
    NoFiles,
    #[error("no machine selected")]
    NoMachine,
    #[error("upload item index {0} appears more than once")]
    DuplicateIndex(usize),
}

/// Failure of one item's upload step.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UploadStepError {
    #[error("{0}")]
    Storage(#[source] BackendError),
    #[error("record creation failed: {0}")]
    RecordCreation(#[source] BackendError),
}

/// Aggregate of one `process` pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadOutcome {
    /// Created records, in item order
    pub record_ids: Vec<RecordId>,
    /// Failed items with the message stored on their status
    pub failures: Vec<(usize, String)>,
}

impl UploadOutcome {
    /// Every item reached `completed`.
    pub fn all_succeeded(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Drives a batch of files through store → create record.
///
/// Owns the status map; readers get copies through [`Self::snapshot`].
pub struct UploadOrchestrator<S> {
    storage: Arc<S>,
    tracker: Arc<RwLock<FileUploadTracker>>,
    queue: WorkQueue,
}

impl<S: StorageBackend> UploadOrchestrator<S> {
    pub fn new(storage: Arc<S>) -> Self {
        Self {
            storage,
            tracker: Arc::new(RwLock::new(FileUploadTracker::new())),
            queue: WorkQueue::sequential(),
        }
    }

    /// Use a different queue (e.g. bounded parallel uploads).
    pub fn with_queue(mut self, queue: WorkQueue) -> Self {
        self.queue = queue;
        self
    }

    /// A new batch was selected: every index starts over at `pending`/0.
    pub async fn select_batch(&self, items: &[UploadItem]) {
        self.tracker
            .write()
            .await
            .select(items.iter().map(|item| item.index));
    }

    /// Discard all tracked state. In-flight uploads keep running but can no
    /// longer touch the status map.
    pub async fn reset(&self) {
        self.tracker.write().await.clear();
    }

    pub async fn snapshot(&self) -> BTreeMap<usize, UploadStatus> {
        self.tracker.read().await.snapshot()
    }

    pub async fn record_ids(&self) -> Vec<RecordId> {
        self.tracker.read().await.record_ids()
    }

    pub async fn all_completed(&self) -> bool {
        self.tracker.read().await.all_completed()
    }

    pub async fn has_errors(&self) -> bool {
        self.tracker.read().await.has_errors()
    }

    /// Upload every item and create its record.
    ///
    /// Fails fast only on pre-flight validation; per-item failures end up in
    /// the status map and in [`UploadOutcome::failures`].
    pub async fn process(
        &self,
        items: &[UploadItem],
        request: &UploadRequest,
    ) -> Result<UploadOutcome, ValidationError> {
        validate(items, request)?;

        let generation = {
            let mut tracker = self.tracker.write().await;
            tracker.select(items.iter().map(|item| item.index));
            tracker.generation()
        };

        let total = items.len();
        info!(
            files = total,
            machine_id = %request.machine_id,
            limit = self.queue.limit(),
            "Starting upload batch"
        );

        let mut ordered: Vec<&UploadItem> = items.iter().collect();
        ordered.sort_by_key(|item| item.index);

        let results = self
            .queue
            .run(ordered, |item| async move {
                let result = self.process_item(generation, item, request, total).await;
                (item.index, result)
            })
            .await;

        let mut outcome = UploadOutcome::default();
        for (index, result) in results {
            match result {
                Ok(record_id) => outcome.record_ids.push(record_id),
                Err(e) => outcome.failures.push((index, e.to_string())),
            }
        }

        if outcome.all_succeeded() {
            info!(files = total, "All files uploaded and recorded");
        } else {
            warn!(
                succeeded = outcome.record_ids.len(),
                failed = outcome.failures.len(),
                "Some files failed to upload"
            );
        }
        Ok(outcome)
    }

    async fn process_item(
        &self,
        generation: u64,
        item: &UploadItem,
        request: &UploadRequest,
        total: usize,
    ) -> Result<RecordId, UploadStepError> {
        let index = item.index;
        info!(index, file = %item.file.name(), "Processing file {}/{}", index + 1, total);

        self.update(generation, |t| t.begin(index)).await;

        match self.upload_and_record(generation, item, request).await {
            Ok(record_id) => {
                self.update(generation, |t| t.complete(index, record_id.clone()))
                    .await;
                info!(index, record_id = %record_id, "File uploaded and recorded");
                Ok(record_id)
            }
            Err(e) => {
                warn!(index, file = %item.file.name(), error = %e, "Upload failed");
                let message = e.to_string();
                self.update(generation, |t| t.fail(index, message)).await;
                Err(e)
            }
        }
    }

    async fn upload_and_record(
        &self,
        generation: u64,
        item: &UploadItem,
        request: &UploadRequest,
    ) -> Result<RecordId, UploadStepError> {
        let index = item.index;

        let stored = self
            .storage
            .store_file(&item.file, request)
            .await
            .map_err(UploadStepError::Storage)?;
        debug!(index, path = %stored.storage_path, "File stored");
        self.update(generation, |t| t.advance(index, PROGRESS_FILE_STORED))
            .await;

        let record = NewRecord::from_upload(&stored, request, Utc::now());
        let record_id = self
            .storage
            .create_record(&record)
            .await
            .map_err(UploadStepError::RecordCreation)?;
        self.update(generation, |t| t.advance(index, PROGRESS_RECORD_CREATED))
            .await;

        Ok(record_id)
    }

    /// Apply one transition atomically, unless the batch was replaced since
    /// `generation`.
    async fn update<F>(&self, generation: u64, transition: F)
    where
        F: FnOnce(&mut FileUploadTracker) -> Result<(), TrackerError>,
    {
        let mut tracker = self.tracker.write().await;
        if tracker.generation() != generation {
            debug!("Batch replaced while in flight, dropping status update");
            return;
        }
        if let Err(e) = transition(&mut *tracker) {
            warn!(error = %e, "Rejected upload status transition");
        }
    }
}

fn validate(items: &[UploadItem], request: &UploadRequest) -> Result<(), ValidationError> {
    if items.is_empty() {
        return Err(ValidationError::NoFiles);
    }
    if request.machine_id.trim().is_empty() {
        return Err(ValidationError::NoMachine);
    }
    let mut seen = HashSet::with_capacity(items.len());
    for item in items {
        if !seen.insert(item.index) {
            return Err(ValidationError::DuplicateIndex(item.index));
        }
    }
    Ok(())
}
