//! System-wide default constants.
//!
//! Centralises magic numbers used by the orchestrators and the series deriver.
//! Grouped by subsystem for easy discovery.

// ============================================================================
// Upload Progress
// ============================================================================

/// Progress reported when an item enters the uploading state (percent).
pub const PROGRESS_UPLOAD_STARTED: u8 = 10;

/// Progress reported once the file is stored (percent).
pub const PROGRESS_FILE_STORED: u8 = 50;

/// Progress reported once the backend record exists (percent).
pub const PROGRESS_RECORD_CREATED: u8 = 80;

/// Progress of a completed item (percent).
pub const PROGRESS_COMPLETE: u8 = 100;

// ============================================================================
// Backend Client
// ============================================================================

/// Analysis service base URL when nothing is configured.
pub const BACKEND_BASE_URL: &str = "http://localhost:8000";

/// HTTP client timeout for backend requests (seconds).
pub const BACKEND_HTTP_TIMEOUT_SECS: u64 = 30;

// ============================================================================
// Upload Metadata
// ============================================================================

/// Sensor mounting position used when the operator does not pick one.
pub const DEFAULT_SENSOR_POSITION: &str = "Drive End";

/// Measurement axis used when the operator does not pick one.
pub const DEFAULT_AXIS: &str = "Horizontal";

/// Recording sampling rate used when the operator does not give one (Hz).
pub const DEFAULT_SAMPLING_RATE_HZ: u32 = 12_000;

/// Items in flight at once. 1 = strictly sequential.
pub const DEFAULT_CONCURRENCY: usize = 1;

// ============================================================================
// Series Derivation
// ============================================================================

/// Upper bound on the displayed spectrum (Hz).
pub const DISPLAY_MAX_FREQUENCY_HZ: f64 = 500.0;

/// Number of steps across the synthesized spectrum.
///
/// The preview spectrum has `SPECTRUM_STEPS + 1` points, both ends included.
pub const SPECTRUM_STEPS: usize = 200;

/// Maximum samples in a synthesized time-domain preview.
pub const PREVIEW_MAX_SAMPLES: usize = 500;

/// Signal length assumed when the backend omits it.
pub const FALLBACK_SIGNAL_LENGTH: usize = 1_000;

/// Sampling rate assumed when the backend omits it (Hz).
pub const FALLBACK_SAMPLING_RATE_HZ: f64 = 1_000.0;

/// RMS assumed when the backend omits it.
pub const FALLBACK_RMS: f64 = 0.1;

/// Dominant frequency assumed when the backend omits it (Hz).
pub const FALLBACK_DOMINANT_FREQUENCY_HZ: f64 = 30.0;

/// Dominant magnitude assumed when the backend omits it.
pub const FALLBACK_DOMINANT_MAGNITUDE: f64 = 0.5;

/// Preview waveform: fundamental component (Hz).
pub const PREVIEW_FUNDAMENTAL_HZ: f64 = 30.0;

/// Preview waveform: secondary component (Hz).
pub const PREVIEW_SECONDARY_HZ: f64 = 120.0;

/// Preview waveform: relative weight of the secondary component.
pub const PREVIEW_SECONDARY_WEIGHT: f64 = 0.3;

/// Preview waveform: peak-to-peak jitter relative to RMS.
pub const PREVIEW_JITTER: f64 = 0.1;

/// Preview spectrum: noise floor amplitude.
pub const PREVIEW_NOISE_FLOOR: f64 = 0.01;

/// Preview spectrum: weight of the 2x harmonic peak.
pub const PREVIEW_HARMONIC_WEIGHT: f64 = 0.3;

/// Half-width of a fault-frequency match and of a synthesized peak (Hz).
pub const FAULT_FREQUENCY_TOLERANCE_HZ: f64 = 2.0;

// ============================================================================
// Display
// ============================================================================

/// Health score at or above which a machine is shown as good.
pub const HEALTH_GOOD_MIN: f64 = 80.0;

/// Health score at or above which a machine is shown as fair.
pub const HEALTH_FAIR_MIN: f64 = 60.0;
