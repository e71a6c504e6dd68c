//! Analysis-side data model: one result per analyzed record
//!
//! Field names follow the analysis service's JSON so a successful response
//! deserializes straight into [`Diagnosis`]. Every section the service may omit
//! is optional; consumers degrade to "N/A" rather than failing.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::upload::RecordId;

/// Outcome of analyzing one record, keyed by `record_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub record_id: RecordId,
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub outcome: AnalysisOutcome,
}

impl AnalysisResult {
    pub fn ok(record_id: RecordId, timestamp: DateTime<Utc>, diagnosis: Diagnosis) -> Self {
        Self {
            record_id,
            timestamp,
            outcome: AnalysisOutcome::Ok(Box::new(diagnosis)),
        }
    }

    pub fn error(
        record_id: RecordId,
        timestamp: DateTime<Utc>,
        kind: AnalysisErrorKind,
        message: impl Into<String>,
    ) -> Self {
        Self {
            record_id,
            timestamp,
            outcome: AnalysisOutcome::Error {
                kind,
                message: message.into(),
            },
        }
    }

    pub fn status(&self) -> AnalysisStatus {
        match self.outcome {
            AnalysisOutcome::Ok(_) => AnalysisStatus::Ok,
            AnalysisOutcome::Error { .. } => AnalysisStatus::Error,
        }
    }

    pub fn is_error(&self) -> bool {
        self.status() == AnalysisStatus::Error
    }

    pub fn diagnosis(&self) -> Option<&Diagnosis> {
        match &self.outcome {
            AnalysisOutcome::Ok(diagnosis) => Some(diagnosis),
            AnalysisOutcome::Error { .. } => None,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match &self.outcome {
            AnalysisOutcome::Error { message, .. } => Some(message),
            AnalysisOutcome::Ok(_) => None,
        }
    }

    pub fn error_kind(&self) -> Option<AnalysisErrorKind> {
        match self.outcome {
            AnalysisOutcome::Error { kind, .. } => Some(kind),
            AnalysisOutcome::Ok(_) => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisStatus {
    Ok,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AnalysisOutcome {
    Ok(Box<Diagnosis>),
    Error {
        #[serde(rename = "error_type")]
        kind: AnalysisErrorKind,
        #[serde(rename = "error_message")]
        message: String,
    },
}

/// Failure class of an analysis attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisErrorKind {
    Network,
    Timeout,
    Validation,
    Server,
    Unknown,
}

impl AnalysisErrorKind {
    /// Operator-facing explanation of the class. `None` for `Unknown`, whose
    /// message is the underlying failure itself.
    pub fn user_message(self) -> Option<&'static str> {
        match self {
            Self::Network => Some(
                "Network connection failed. Please check your internet connection and try again.",
            ),
            Self::Timeout => {
                Some("Analysis timed out. The file may be too large or the server is busy.")
            }
            Self::Validation => {
                Some("Invalid file format or corrupted data. Please check your file.")
            }
            Self::Server => Some("Server error occurred during analysis. Please try again later."),
            Self::Unknown => None,
        }
    }
}

impl fmt::Display for AnalysisErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Network => "network",
            Self::Timeout => "timeout",
            Self::Validation => "validation",
            Self::Server => "server",
            Self::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

// ============================================================================
// Successful analysis payload
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Diagnosis {
    #[serde(default)]
    pub file_info: Option<FileInfo>,
    #[serde(default)]
    pub signal_analysis: Option<SignalAnalysis>,
    #[serde(default)]
    pub fault_detection: Option<FaultDetection>,
    /// 0-100, computed by the analysis service
    #[serde(default)]
    pub health_score: Option<f64>,
    #[serde(default)]
    pub recommendations: Vec<Recommendation>,
}

impl Diagnosis {
    /// Detected faults, empty when fault detection was not reported.
    pub fn faults(&self) -> &[DetectedFault] {
        self.fault_detection
            .as_ref()
            .map_or(&[], |fd| fd.detected_faults.as_slice())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileInfo {
    pub filename: String,
    #[serde(default)]
    pub file_path: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SignalAnalysis {
    #[serde(default)]
    pub signal_length: Option<usize>,
    #[serde(default)]
    pub sampling_rate: Option<f64>,
    #[serde(default)]
    pub duration_seconds: Option<f64>,
    #[serde(default)]
    pub time_features: Option<TimeFeatures>,
    #[serde(default)]
    pub frequency_features: Option<FrequencyFeatures>,
    #[serde(default)]
    pub plots: Option<Plots>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimeFeatures {
    #[serde(default)]
    pub rms: Option<f64>,
    #[serde(default)]
    pub peak: Option<f64>,
    #[serde(default)]
    pub crest_factor: Option<f64>,
    #[serde(default)]
    pub kurtosis: Option<f64>,
    #[serde(default)]
    pub skewness: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FrequencyFeatures {
    #[serde(default)]
    pub dominant_frequency: Option<f64>,
    #[serde(default)]
    pub dominant_magnitude: Option<f64>,
    #[serde(default)]
    pub harmonics: Vec<Harmonic>,
    #[serde(default)]
    pub spectral_centroid: Option<f64>,
    #[serde(default)]
    pub spectral_rolloff: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Harmonic {
    pub frequency: f64,
    #[serde(default)]
    pub magnitude: f64,
}

/// Plot arrays precomputed by the analysis service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Plots {
    #[serde(default)]
    pub time_domain: Option<TimeTrace>,
    #[serde(default)]
    pub frequency_domain: Option<SpectrumTrace>,
}

/// Parallel arrays: `time` in seconds, `amplitude` per sample.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimeTrace {
    pub time: Vec<f64>,
    pub amplitude: Vec<f64>,
}

/// Parallel arrays: `frequency` in Hz, `magnitude` per bin.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpectrumTrace {
    pub frequency: Vec<f64>,
    pub magnitude: Vec<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FaultDetection {
    #[serde(default)]
    pub detected_faults: Vec<DetectedFault>,
    #[serde(default)]
    pub fault_count: Option<usize>,
    #[serde(default)]
    pub analysis_method: Option<String>,
}

impl FaultDetection {
    /// Reported count, or the list length when the service left it out.
    pub fn count(&self) -> usize {
        self.fault_count.unwrap_or(self.detected_faults.len())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectedFault {
    pub fault_type: String,
    /// 0-100
    #[serde(default)]
    pub severity: f64,
    /// 0-1
    #[serde(default)]
    pub confidence: f64,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recommendation {
    pub priority: Priority,
    pub action: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    Medium,
    High,
}
