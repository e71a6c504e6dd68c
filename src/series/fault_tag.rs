//! Fault-frequency tagging for spectrum points

use crate::config::defaults::FAULT_FREQUENCY_TOLERANCE_HZ;
use crate::types::{AnalysisResult, Diagnosis};

const IMBALANCE: &str = "Imbalance";
const GEAR: &str = "Gear";

/// Whether `frequency_hz` falls in a window tied to one of the result's
/// detected faults. Always `false` for failed results.
pub fn is_fault_frequency(frequency_hz: f64, result: &AnalysisResult) -> bool {
    result
        .diagnosis()
        .is_some_and(|diagnosis| fault_frequency(frequency_hz, diagnosis))
}

/// Window rules, first match decides:
///
/// 1. within 2 Hz of a positive dominant frequency: an imbalance fault was
///    detected
/// 2. within 2 Hz of a reported harmonic: a gear fault was detected
///
/// Magnitudes play no part.
pub fn fault_frequency(frequency_hz: f64, diagnosis: &Diagnosis) -> bool {
    let near = |target: f64| (frequency_hz - target).abs() < FAULT_FREQUENCY_TOLERANCE_HZ;
    let has_fault = |needle: &str| {
        diagnosis
            .faults()
            .iter()
            .any(|f| f.fault_type.contains(needle))
    };

    let Some(features) = diagnosis
        .signal_analysis
        .as_ref()
        .and_then(|s| s.frequency_features.as_ref())
    else {
        return false;
    };

    if let Some(dominant) = features.dominant_frequency.filter(|d| *d > 0.0) {
        if near(dominant) {
            return has_fault(IMBALANCE);
        }
    }

    if features.harmonics.iter().any(|h| near(h.frequency)) {
        return has_fault(GEAR);
    }

    false
}
