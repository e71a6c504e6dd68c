//! Render-ready view of one analysis result
//!
//! Absent metrics render as "N/A" instead of failing the whole view.

use serde::Serialize;
use std::fmt;

use super::{derive, DerivedSeries};
use crate::config::defaults::{HEALTH_FAIR_MIN, HEALTH_GOOD_MIN};
use crate::types::{AnalysisErrorKind, AnalysisResult, DetectedFault, Diagnosis, Recommendation};

pub const NOT_AVAILABLE: &str = "N/A";

/// Fixed-point rendering, "N/A" when absent or not finite.
pub fn format_metric(value: Option<f64>, decimals: usize) -> String {
    match value.filter(|v| v.is_finite()) {
        Some(v) => format!("{v:.decimals$}"),
        None => NOT_AVAILABLE.to_string(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthBand {
    Good,
    Fair,
    Poor,
}

impl HealthBand {
    pub fn from_score(score: f64) -> Self {
        if score >= HEALTH_GOOD_MIN {
            Self::Good
        } else if score >= HEALTH_FAIR_MIN {
            Self::Fair
        } else {
            Self::Poor
        }
    }
}

impl fmt::Display for HealthBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Good => "good",
            Self::Fair => "fair",
            Self::Poor => "poor",
        })
    }
}

/// Time-domain metric row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetricsView {
    pub rms: String,
    pub peak: String,
    pub crest_factor: String,
    pub duration: String,
    /// "{samples} samples @ {rate} Hz" header above the charts
    pub sampling: String,
    pub dominant_frequency: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ResultBody {
    Ok {
        health_score: String,
        health_band: Option<HealthBand>,
        fault_count: usize,
        faults: Vec<DetectedFault>,
        /// Absent when the service returned no signal section
        metrics: Option<MetricsView>,
        series: Option<DerivedSeries>,
        recommendations: Vec<Recommendation>,
    },
    Error {
        kind: AnalysisErrorKind,
        message: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultView {
    pub record_id: String,
    /// Source filename, or "Analysis {n}" counting from 1
    pub title: String,
    pub analyzed_at: String,
    #[serde(flatten)]
    pub body: ResultBody,
}

impl ResultView {
    /// View of the result at `position` in the session list.
    pub fn of(position: usize, result: &AnalysisResult) -> Self {
        let title = result
            .diagnosis()
            .and_then(|d| d.file_info.as_ref())
            .map(|info| info.filename.clone())
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| format!("Analysis {}", position + 1));

        let body = match result.diagnosis() {
            Some(diagnosis) => ok_body(result, diagnosis),
            None => ResultBody::Error {
                kind: result.error_kind().unwrap_or(AnalysisErrorKind::Unknown),
                message: result.error_message().unwrap_or_default().to_string(),
            },
        };

        Self {
            record_id: result.record_id.to_string(),
            title,
            analyzed_at: result.timestamp.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
            body,
        }
    }
}

fn ok_body(result: &AnalysisResult, diagnosis: &Diagnosis) -> ResultBody {
    let health = diagnosis.health_score.filter(|s| s.is_finite());
    ResultBody::Ok {
        health_score: format_metric(health, 0),
        health_band: health.map(HealthBand::from_score),
        fault_count: diagnosis.fault_detection.as_ref().map_or(0, |fd| fd.count()),
        faults: diagnosis.faults().to_vec(),
        metrics: diagnosis.signal_analysis.as_ref().map(|signal| {
            let time = signal.time_features.clone().unwrap_or_default();
            let frequency = signal.frequency_features.clone().unwrap_or_default();
            MetricsView {
                rms: format_metric(time.rms, 3),
                peak: format_metric(time.peak, 3),
                crest_factor: format_metric(time.crest_factor, 2),
                duration: match signal.duration_seconds.filter(|d| d.is_finite()) {
                    Some(d) => format!("{d:.1}s"),
                    None => NOT_AVAILABLE.to_string(),
                },
                sampling: format!(
                    "{} samples @ {} Hz",
                    signal
                        .signal_length
                        .map_or_else(|| NOT_AVAILABLE.to_string(), |n| n.to_string()),
                    format_metric(signal.sampling_rate, 0),
                ),
                dominant_frequency: format_metric(frequency.dominant_frequency, 1),
            }
        }),
        series: derive(result),
        recommendations: diagnosis.recommendations.clone(),
    }
}
