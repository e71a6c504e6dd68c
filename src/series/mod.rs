//! Signal series derivation - chart-ready points from one analysis result
//!
//! Pure functions of a single [`AnalysisResult`]: nothing here keeps state or
//! touches the orchestrators, so results can be re-derived on every render.
//!
//! When the analysis service ships plot arrays they are used as-is and the
//! series is tagged [`SeriesSource::Measured`]. Otherwise a preview is
//! synthesized from the scalar features and tagged
//! [`SeriesSource::Synthesized`]; that preview is a placeholder shape, not
//! measured data.

mod display;
mod fault_tag;
mod frequency;
mod time;

pub use display::{format_metric, HealthBand, MetricsView, ResultBody, ResultView, NOT_AVAILABLE};
pub use fault_tag::{fault_frequency, is_fault_frequency};
pub use frequency::{display_limit_hz, frequency_series};
pub use time::time_series;

use serde::{Deserialize, Serialize};

use crate::types::{AnalysisResult, RecordId};

/// Where a series' points came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeriesSource {
    /// Plot arrays computed by the analysis service
    Measured,
    /// Preview synthesized from scalar features
    Synthesized,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimePoint {
    pub time_ms: f64,
    pub amplitude: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrequencyPoint {
    pub frequency_hz: f64,
    pub magnitude: f64,
    /// Falls in a window associated with a detected fault
    pub is_fault_frequency: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSeries {
    pub source: SeriesSource,
    pub points: Vec<TimePoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrequencySeries {
    pub source: SeriesSource,
    pub points: Vec<FrequencyPoint>,
}

impl FrequencySeries {
    pub fn fault_points(&self) -> impl Iterator<Item = &FrequencyPoint> {
        self.points.iter().filter(|p| p.is_fault_frequency)
    }
}

/// Both charts for one result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivedSeries {
    pub record_id: RecordId,
    pub time: TimeSeries,
    pub frequency: FrequencySeries,
}

/// Derive both series, or `None` when the result carries no signal analysis
/// (failed analyses included), in which case the charts are not shown.
pub fn derive(result: &AnalysisResult) -> Option<DerivedSeries> {
    Some(DerivedSeries {
        record_id: result.record_id.clone(),
        time: time_series(result)?,
        frequency: frequency_series(result)?,
    })
}

/// Stable per-record seed so a synthesized preview looks the same on every
/// render. FNV-1a over the record id, mixed with a per-series salt.
fn preview_seed(record_id: &RecordId, salt: u64) -> u64 {
    const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;
    record_id
        .as_str()
        .bytes()
        .fold(FNV_OFFSET ^ salt, |hash, b| (hash ^ u64::from(b)).wrapping_mul(FNV_PRIME))
}
