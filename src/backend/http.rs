//! HTTP backend - reqwest client for the analysis REST service
//!
//! Handles file upload, record creation, analysis requests and machine listing.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::multipart::{Form, Part};
use reqwest::StatusCode;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

use super::{AnalysisBackend, Analyzed, BackendError, MachineDirectory, StorageBackend};
use crate::types::{Diagnosis, FileBlob, Machine, NewRecord, RecordId, StoredFile, UploadRequest};

/// HTTP client for the analysis service
#[derive(Clone)]
pub struct HttpBackend {
    http: reqwest::Client,
    base_url: String,
}

impl HttpBackend {
    /// Create a new client
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, BackendError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BackendError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Check `GET /health`
    pub async fn health_check(&self) -> Result<(), BackendError> {
        let resp = self.http.get(self.url("/health")).send().await?;
        if resp.status().is_success() {
            Ok(())
        } else {
            Err(status_error(resp.status(), ""))
        }
    }

    /// Get base URL for logging
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Turn a non-2xx response into a `Status` error carrying the body's detail.
    async fn check(resp: reqwest::Response) -> Result<reqwest::Response, BackendError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.text().await.unwrap_or_default();
        warn!(status = status.as_u16(), body = %body, "Backend request failed");
        Err(status_error(status, &body))
    }
}

#[async_trait]
impl StorageBackend for HttpBackend {
    async fn store_file(
        &self,
        file: &FileBlob,
        request: &UploadRequest,
    ) -> Result<StoredFile, BackendError> {
        let mime = mime_guess::from_path(file.name()).first_or_octet_stream();
        let part = Part::bytes(file.data().to_vec())
            .file_name(file.name().to_string())
            .mime_str(mime.essence_str())?;

        let form = Form::new()
            .part("file", part)
            .text("machine_id", request.machine_id.clone())
            .text("sensor_position", request.sensor_position.clone())
            .text("axis", request.axis.clone())
            .text("sampling_rate", request.sampling_rate_hz.to_string());

        debug!(file = %file.name(), size_bytes = file.size(), "Uploading file");

        let resp = self
            .http
            .post(self.url("/upload/file"))
            .multipart(form)
            .send()
            .await?;
        let body: UploadResponse = Self::check(resp).await?.json().await?;
        body.into_stored(file.name())
    }

    async fn create_record(&self, record: &NewRecord) -> Result<RecordId, BackendError> {
        let resp = self
            .http
            .post(self.url("/upload/vibration-record"))
            .json(record)
            .send()
            .await?;
        let body: RecordResponse = Self::check(resp).await?.json().await?;
        Ok(RecordId::new(body.record_id))
    }
}

#[async_trait]
impl AnalysisBackend for HttpBackend {
    async fn analyze_record(&self, record_id: &RecordId) -> Result<Analyzed, BackendError> {
        let resp = self
            .http
            .post(self.url(&format!("/diagnose/analyze/{record_id}")))
            .send()
            .await?;
        let bytes = Self::check(resp).await?.bytes().await?;
        let report: AnalysisReport = serde_json::from_slice(&bytes)?;
        report.into_analyzed()
    }
}

#[async_trait]
impl MachineDirectory for HttpBackend {
    async fn list_machines(&self) -> Result<Vec<Machine>, BackendError> {
        let resp = self.http.get(self.url("/records/machines")).send().await?;
        Ok(Self::check(resp).await?.json().await?)
    }
}

// ============================================================================
// Wire formats
// ============================================================================

#[derive(Debug, Deserialize)]
struct UploadResponse {
    #[serde(default)]
    storage_path: Option<String>,
    #[serde(default)]
    file_path: Option<String>,
    #[serde(default)]
    file_url: String,
    #[serde(default)]
    file_name: Option<String>,
}

impl UploadResponse {
    fn into_stored(self, uploaded_name: &str) -> Result<StoredFile, BackendError> {
        let storage_path = self
            .storage_path
            .or(self.file_path)
            .ok_or_else(|| BackendError::Decode("upload response carried no storage path".to_string()))?;
        Ok(StoredFile {
            storage_path,
            public_url: self.file_url,
            file_name: self.file_name.unwrap_or_else(|| uploaded_name.to_string()),
        })
    }
}

#[derive(Debug, Deserialize)]
struct RecordResponse {
    record_id: String,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: String,
}

/// Analysis response body as the service sends it.
///
/// The service reports its own failures in-band with `status = "error"`,
/// sometimes behind a 2xx.
#[derive(Debug, Deserialize)]
pub struct AnalysisReport {
    #[serde(default)]
    pub record_id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default)]
    pub analysis_timestamp: Option<String>,
    #[serde(flatten)]
    pub diagnosis: Diagnosis,
}

impl AnalysisReport {
    pub fn into_analyzed(self) -> Result<Analyzed, BackendError> {
        if self.status.as_deref() == Some("error") {
            return Err(BackendError::Rejected(
                self.error_message
                    .unwrap_or_else(|| "Analysis failed".to_string()),
            ));
        }
        let analyzed_at = self
            .analysis_timestamp
            .as_deref()
            .and_then(|ts| DateTime::parse_from_rfc3339(ts).ok())
            .map(|ts| ts.with_timezone(&Utc));
        Ok(Analyzed {
            analyzed_at,
            diagnosis: self.diagnosis,
        })
    }
}

/// Build a `Status` error, preferring the JSON `detail` field of the body.
fn status_error(status: StatusCode, body: &str) -> BackendError {
    let detail = serde_json::from_str::<ErrorBody>(body)
        .map(|b| b.detail)
        .unwrap_or_else(|_| body.trim().to_string());
    let detail = if detail.is_empty() {
        format!("API Error: {}", status.as_u16())
    } else {
        detail
    };
    BackendError::Status {
        status: status.as_u16(),
        detail,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_error_prefers_json_detail() {
        let err = status_error(StatusCode::BAD_REQUEST, r#"{"detail": "Unsupported file type"}"#);
        assert_eq!(
            err,
            BackendError::Status {
                status: 400,
                detail: "Unsupported file type".to_string()
            }
        );
    }

    #[test]
    fn status_error_falls_back_to_code() {
        let err = status_error(StatusCode::INTERNAL_SERVER_ERROR, "");
        assert_eq!(err.status(), Some(500));
        assert!(err.to_string().contains("API Error: 500"));
    }

    #[test]
    fn upload_response_accepts_either_path_field() {
        let body: UploadResponse =
            serde_json::from_str(r#"{"file_path": "vib/a.mat", "file_url": "http://x/a.mat"}"#).unwrap();
        let stored = body.into_stored("a.mat").unwrap();
        assert_eq!(stored.storage_path, "vib/a.mat");
        assert_eq!(stored.file_name, "a.mat");

        let empty: UploadResponse = serde_json::from_str(r#"{"file_url": ""}"#).unwrap();
        assert!(matches!(empty.into_stored("a.mat"), Err(BackendError::Decode(_))));
    }

    #[test]
    fn in_band_error_is_rejected() {
        let report: AnalysisReport = serde_json::from_str(
            r#"{"record_id": "r1", "status": "error", "error_message": "No file path found in vibration record"}"#,
        )
        .unwrap();
        assert_eq!(
            report.into_analyzed(),
            Err(BackendError::Rejected(
                "No file path found in vibration record".to_string()
            ))
        );
    }

    #[test]
    fn completed_report_keeps_diagnosis() {
        let report: AnalysisReport = serde_json::from_str(
            r#"{
                "record_id": "r1",
                "status": "completed",
                "analysis_timestamp": "2025-01-21T12:00:00Z",
                "health_score": 72,
                "signal_analysis": {"sampling_rate": 12000, "time_features": {"rms": 0.42}},
                "recommendations": [{"priority": "medium", "action": "Schedule routine maintenance", "description": ""}]
            }"#,
        )
        .unwrap();
        let analyzed = report.into_analyzed().unwrap();
        assert!(analyzed.analyzed_at.is_some());
        assert_eq!(analyzed.diagnosis.health_score, Some(72.0));
        let rms = analyzed
            .diagnosis
            .signal_analysis
            .and_then(|s| s.time_features)
            .and_then(|t| t.rms);
        assert_eq!(rms, Some(0.42));
    }
}
