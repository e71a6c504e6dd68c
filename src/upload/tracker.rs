//! File Upload Tracker - per-file progress for the current batch
//!
//! One [`UploadStatus`] per batch index. Selecting a batch replaces every entry
//! with `pending`/0. Within one pass each entry only moves forward:
//!
//! ```text
//! Pending ──▶ Uploading ──▶ Completed { record_id }
//!    │            │
//!    └────────────┴──▶ Error { message }
//! ```
//!
//! Progress never decreases inside a pass; only a new batch resets it.

use std::collections::BTreeMap;

use crate::config::defaults::{PROGRESS_COMPLETE, PROGRESS_UPLOAD_STARTED};
use crate::types::{RecordId, UploadState, UploadStatus};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileUploadTracker {
    entries: BTreeMap<usize, UploadStatus>,
    /// Bumped whenever the batch is replaced or cleared
    generation: u64,
}

impl FileUploadTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace all entries with a fresh `pending` batch of `len` items.
    pub fn reset(&mut self, len: usize) {
        self.select(0..len);
    }

    /// Replace all entries with `pending` entries for exactly these indices.
    pub fn select(&mut self, indices: impl IntoIterator<Item = usize>) {
        self.entries = indices
            .into_iter()
            .map(|i| (i, UploadStatus::pending()))
            .collect();
        self.generation = self.generation.wrapping_add(1);
    }

    /// Drop every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.generation = self.generation.wrapping_add(1);
    }

    /// Identifies the current batch. Work started under an older generation
    /// must not touch the entries.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn get(&self, index: usize) -> Option<&UploadStatus> {
        self.entries.get(&index)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &UploadStatus)> {
        self.entries.iter().map(|(i, s)| (*i, s))
    }

    /// Copy of the whole status map for the presentation layer.
    pub fn snapshot(&self) -> BTreeMap<usize, UploadStatus> {
        self.entries.clone()
    }

    /// Record ids of completed items, in index order.
    pub fn record_ids(&self) -> Vec<RecordId> {
        self.entries
            .values()
            .filter_map(|s| s.record_id().cloned())
            .collect()
    }

    /// Non-empty batch with every item completed.
    pub fn all_completed(&self) -> bool {
        !self.entries.is_empty()
            && self
                .entries
                .values()
                .all(|s| matches!(s.state, UploadState::Completed { .. }))
    }

    pub fn has_errors(&self) -> bool {
        self.entries
            .values()
            .any(|s| matches!(s.state, UploadState::Error { .. }))
    }

    /// `pending → uploading`, progress at the upload-started milestone.
    pub fn begin(&mut self, index: usize) -> Result<(), TrackerError> {
        let status = self.entry(index)?;
        match status.state {
            UploadState::Pending => {
                status.state = UploadState::Uploading;
                status.progress = status.progress.max(PROGRESS_UPLOAD_STARTED);
                Ok(())
            }
            ref other => Err(TrackerError::illegal(index, other, "uploading")),
        }
    }

    /// Raise progress of an uploading item. Lower values are ignored.
    pub fn advance(&mut self, index: usize, progress: u8) -> Result<(), TrackerError> {
        let status = self.entry(index)?;
        match status.state {
            UploadState::Uploading => {
                status.progress = status.progress.max(progress.min(PROGRESS_COMPLETE));
                Ok(())
            }
            ref other => Err(TrackerError::illegal(index, other, "uploading")),
        }
    }

    /// `uploading → completed`, recording the backend record id.
    pub fn complete(&mut self, index: usize, record_id: RecordId) -> Result<(), TrackerError> {
        let status = self.entry(index)?;
        match status.state {
            UploadState::Uploading => {
                status.state = UploadState::Completed { record_id };
                status.progress = PROGRESS_COMPLETE;
                Ok(())
            }
            ref other => Err(TrackerError::illegal(index, other, "completed")),
        }
    }

    /// `pending | uploading → error`. Progress stays where it stopped.
    pub fn fail(&mut self, index: usize, message: impl Into<String>) -> Result<(), TrackerError> {
        let status = self.entry(index)?;
        match status.state {
            UploadState::Pending | UploadState::Uploading => {
                status.state = UploadState::Error {
                    message: message.into(),
                };
                Ok(())
            }
            ref other => Err(TrackerError::illegal(index, other, "error")),
        }
    }

    fn entry(&mut self, index: usize) -> Result<&mut UploadStatus, TrackerError> {
        self.entries
            .get_mut(&index)
            .ok_or(TrackerError::UnknownIndex(index))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TrackerError {
    #[error("no upload item at index {0} in the current batch")]
    UnknownIndex(usize),

    #[error("item {index}: cannot move from {from} to {to}")]
    IllegalTransition {
        index: usize,
        from: &'static str,
        to: &'static str,
    },
}

impl TrackerError {
    fn illegal(index: usize, from: &UploadState, to: &'static str) -> Self {
        Self::IllegalTransition {
            index,
            from: from.label(),
            to,
        }
    }
}
