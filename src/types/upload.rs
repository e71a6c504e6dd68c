//! Upload-side data model: selected files, per-file status, backend records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Identifier of a backend vibration record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RecordId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// An opaque recording: file name plus raw bytes. Never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileBlob {
    name: String,
    data: Vec<u8>,
}

impl FileBlob {
    pub fn new(name: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            data,
        }
    }

    /// Read a recording from disk, naming it after the file's basename.
    pub fn read(path: &Path) -> std::io::Result<Self> {
        let data = std::fs::read(path)?;
        let name = path
            .file_name()
            .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned());
        Ok(Self { name, data })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn size(&self) -> usize {
        self.data.len()
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

/// One selected file awaiting processing.
///
/// `index` is the position in the batch and the key into the status map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadItem {
    pub index: usize,
    pub file: FileBlob,
}

impl UploadItem {
    /// Number a freshly selected batch in insertion order.
    pub fn batch(files: impl IntoIterator<Item = FileBlob>) -> Vec<Self> {
        files
            .into_iter()
            .enumerate()
            .map(|(index, file)| Self { index, file })
            .collect()
    }
}

/// Operator-supplied metadata shared by every file of a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadRequest {
    pub machine_id: String,
    pub sensor_position: String,
    pub axis: String,
    pub sampling_rate_hz: u32,
}

/// Where the storage collaborator put a file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredFile {
    pub storage_path: String,
    pub public_url: String,
    pub file_name: String,
}

/// Body of the "create record" call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewRecord {
    pub machine_id: String,
    pub file_path: String,
    pub file_url: String,
    pub file_name: String,
    pub sensor_position: String,
    pub axis: String,
    pub sampling_rate: u32,
    pub measurement_date: DateTime<Utc>,
}

impl NewRecord {
    pub fn from_upload(stored: &StoredFile, request: &UploadRequest, measured_at: DateTime<Utc>) -> Self {
        Self {
            machine_id: request.machine_id.clone(),
            file_path: stored.storage_path.clone(),
            file_url: stored.public_url.clone(),
            file_name: stored.file_name.clone(),
            sensor_position: request.sensor_position.clone(),
            axis: request.axis.clone(),
            sampling_rate: request.sampling_rate_hz,
            measurement_date: measured_at,
        }
    }
}

/// Monitored machine as listed by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Machine {
    pub id: String,
    pub name: String,
    #[serde(default, rename = "type")]
    pub machine_type: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub health_score: Option<f64>,
}

// ============================================================================
// Per-file status
// ============================================================================

/// Lifecycle of one upload item.
///
/// The error message lives only on `Error` and the record id only on
/// `Completed`, so neither can outlive its state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum UploadState {
    Pending,
    Uploading,
    Completed { record_id: RecordId },
    Error { message: String },
}

impl UploadState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed { .. } | Self::Error { .. })
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Uploading => "uploading",
            Self::Completed { .. } => "completed",
            Self::Error { .. } => "error",
        }
    }
}

/// Progress record of one upload item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadStatus {
    /// 0-100, non-decreasing within one attempt
    pub progress: u8,
    #[serde(flatten)]
    pub state: UploadState,
}

impl UploadStatus {
    pub fn pending() -> Self {
        Self {
            progress: 0,
            state: UploadState::Pending,
        }
    }

    pub fn record_id(&self) -> Option<&RecordId> {
        match &self.state {
            UploadState::Completed { record_id } => Some(record_id),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match &self.state {
            UploadState::Error { message } => Some(message),
            _ => None,
        }
    }
}

impl Default for UploadStatus {
    fn default() -> Self {
        Self::pending()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batch_numbers_in_insertion_order() {
        let items = UploadItem::batch(vec![
            FileBlob::new("a.csv", vec![1]),
            FileBlob::new("b.mat", vec![2, 3]),
        ]);
        assert_eq!(items[0].index, 0);
        assert_eq!(items[1].index, 1);
        assert_eq!(items[1].file.name(), "b.mat");
        assert_eq!(items[1].file.size(), 2);
    }

    #[test]
    fn status_serializes_flat() {
        let status = UploadStatus {
            progress: 100,
            state: UploadState::Completed {
                record_id: RecordId::new("r1"),
            },
        };
        let json = serde_json::to_value(&status).unwrap();
        assert_eq!(json["state"], "completed");
        assert_eq!(json["record_id"], "r1");
        assert_eq!(json["progress"], 100);
    }

    #[test]
    fn record_id_only_when_completed() {
        let failed = UploadStatus {
            progress: 10,
            state: UploadState::Error {
                message: "disk full".to_string(),
            },
        };
        assert!(failed.record_id().is_none());
        assert_eq!(failed.error(), Some("disk full"));
        assert!(UploadStatus::pending().record_id().is_none());
    }
}
