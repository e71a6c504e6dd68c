//! Time-domain series

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::f64::consts::PI;

use super::{preview_seed, SeriesSource, TimePoint, TimeSeries};
use crate::config::defaults::{
    FALLBACK_RMS, FALLBACK_SAMPLING_RATE_HZ, FALLBACK_SIGNAL_LENGTH, PREVIEW_FUNDAMENTAL_HZ,
    PREVIEW_JITTER, PREVIEW_MAX_SAMPLES, PREVIEW_SECONDARY_HZ, PREVIEW_SECONDARY_WEIGHT,
};
use crate::types::{AnalysisResult, SignalAnalysis};

const TIME_SALT: u64 = 0x7469_6d65;

/// Time-domain points in milliseconds, or `None` without signal analysis.
pub fn time_series(result: &AnalysisResult) -> Option<TimeSeries> {
    let signal = result.diagnosis()?.signal_analysis.as_ref()?;
    Some(measured(signal).unwrap_or_else(|| {
        synthesize(signal, preview_seed(&result.record_id, TIME_SALT))
    }))
}

/// Zip the service's `time`/`amplitude` arrays, seconds to milliseconds.
fn measured(signal: &SignalAnalysis) -> Option<TimeSeries> {
    let trace = signal.plots.as_ref()?.time_domain.as_ref()?;
    if trace.time.is_empty() || trace.amplitude.is_empty() {
        return None;
    }
    let points = trace
        .time
        .iter()
        .zip(&trace.amplitude)
        .map(|(&t, &amplitude)| TimePoint {
            time_ms: t * 1000.0,
            amplitude,
        })
        .collect();
    Some(TimeSeries {
        source: SeriesSource::Measured,
        points,
    })
}

/// Preview waveform: `rms · (sin 2π·30t + 0.3·sin 2π·120t) + jitter`.
fn synthesize(signal: &SignalAnalysis, seed: u64) -> TimeSeries {
    let length = signal
        .signal_length
        .filter(|&n| n > 0)
        .unwrap_or(FALLBACK_SIGNAL_LENGTH)
        .min(PREVIEW_MAX_SAMPLES);
    let sampling_rate = signal
        .sampling_rate
        .filter(|r| r.is_finite() && *r > 0.0)
        .unwrap_or(FALLBACK_SAMPLING_RATE_HZ);
    let rms = signal
        .time_features
        .as_ref()
        .and_then(|f| f.rms)
        .filter(|r| r.is_finite() && *r != 0.0)
        .unwrap_or(FALLBACK_RMS);

    let mut rng = StdRng::seed_from_u64(seed);
    let points = (0..length)
        .map(|i| {
            #[allow(clippy::cast_precision_loss)]
            let t = i as f64 / sampling_rate;
            let jitter = PREVIEW_JITTER * (rng.gen::<f64>() - 0.5);
            let wave = (2.0 * PI * PREVIEW_FUNDAMENTAL_HZ * t).sin()
                + PREVIEW_SECONDARY_WEIGHT * (2.0 * PI * PREVIEW_SECONDARY_HZ * t).sin();
            TimePoint {
                time_ms: t * 1000.0,
                amplitude: rms * (wave + jitter),
            }
        })
        .collect();

    TimeSeries {
        source: SeriesSource::Synthesized,
        points,
    }
}
