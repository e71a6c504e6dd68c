//! Frequency-domain series

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::fault_tag::fault_frequency;
use super::{preview_seed, FrequencyPoint, FrequencySeries, SeriesSource};
use crate::config::defaults::{
    DISPLAY_MAX_FREQUENCY_HZ, FALLBACK_DOMINANT_FREQUENCY_HZ, FALLBACK_DOMINANT_MAGNITUDE,
    FALLBACK_SAMPLING_RATE_HZ, FAULT_FREQUENCY_TOLERANCE_HZ, PREVIEW_HARMONIC_WEIGHT,
    PREVIEW_NOISE_FLOOR, SPECTRUM_STEPS,
};
use crate::types::{AnalysisResult, Diagnosis, SignalAnalysis};

const FREQUENCY_SALT: u64 = 0x6672_6571;

/// Highest frequency shown: `min(sampling_rate / 2, 500)`.
pub fn display_limit_hz(signal: &SignalAnalysis) -> f64 {
    let sampling_rate = signal
        .sampling_rate
        .filter(|r| r.is_finite() && *r > 0.0)
        .unwrap_or(FALLBACK_SAMPLING_RATE_HZ);
    (sampling_rate / 2.0).min(DISPLAY_MAX_FREQUENCY_HZ)
}

/// Spectrum points up to [`display_limit_hz`], each tagged with
/// [`fault_frequency`]. `None` without signal analysis.
pub fn frequency_series(result: &AnalysisResult) -> Option<FrequencySeries> {
    let diagnosis = result.diagnosis()?;
    let signal = diagnosis.signal_analysis.as_ref()?;
    let limit = display_limit_hz(signal);

    let (source, bins) = match measured(signal, limit) {
        Some(bins) => (SeriesSource::Measured, bins),
        None => (
            SeriesSource::Synthesized,
            synthesize(signal, limit, preview_seed(&result.record_id, FREQUENCY_SALT)),
        ),
    };

    Some(FrequencySeries {
        source,
        points: tag(bins, diagnosis),
    })
}

fn tag(bins: Vec<(f64, f64)>, diagnosis: &Diagnosis) -> Vec<FrequencyPoint> {
    bins.into_iter()
        .map(|(frequency_hz, magnitude)| FrequencyPoint {
            frequency_hz,
            magnitude,
            is_fault_frequency: fault_frequency(frequency_hz, diagnosis),
        })
        .collect()
}

/// Service spectrum, clipped to the display band.
fn measured(signal: &SignalAnalysis, limit: f64) -> Option<Vec<(f64, f64)>> {
    let trace = signal.plots.as_ref()?.frequency_domain.as_ref()?;
    if trace.frequency.is_empty() || trace.magnitude.is_empty() {
        return None;
    }
    Some(
        trace
            .frequency
            .iter()
            .copied()
            .zip(trace.magnitude.iter().copied())
            .filter(|(f, _)| *f <= limit)
            .collect(),
    )
}

/// Preview spectrum: a noise floor with Gaussian bumps at the dominant
/// frequency and its second harmonic.
fn synthesize(signal: &SignalAnalysis, limit: f64, seed: u64) -> Vec<(f64, f64)> {
    let features = signal.frequency_features.as_ref();
    let dominant = features
        .and_then(|f| f.dominant_frequency)
        .filter(|d| d.is_finite() && *d > 0.0)
        .unwrap_or(FALLBACK_DOMINANT_FREQUENCY_HZ);
    let dominant_magnitude = features
        .and_then(|f| f.dominant_magnitude)
        .filter(|m| m.is_finite() && *m != 0.0)
        .unwrap_or(FALLBACK_DOMINANT_MAGNITUDE);

    let bump = |f: f64, center: f64, height: f64| {
        let offset = f - center;
        if offset.abs() < FAULT_FREQUENCY_TOLERANCE_HZ {
            height * (-(offset * offset) / 2.0).exp()
        } else {
            0.0
        }
    };

    let mut rng = StdRng::seed_from_u64(seed);
    #[allow(clippy::cast_precision_loss)]
    let steps = SPECTRUM_STEPS as f64;
    (0..=SPECTRUM_STEPS)
        .map(|k| {
            #[allow(clippy::cast_precision_loss)]
            let f = limit * k as f64 / steps;
            let magnitude = PREVIEW_NOISE_FLOOR * rng.gen::<f64>()
                + bump(f, dominant, dominant_magnitude)
                + bump(f, 2.0 * dominant, PREVIEW_HARMONIC_WEIGHT * dominant_magnitude);
            (f, magnitude)
        })
        .collect()
}
