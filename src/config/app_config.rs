//! Application Configuration - backend endpoint and upload defaults as TOML values
//!
//! Each section implements `Default` with the values from [`super::defaults`],
//! so a missing file or a partial file behaves exactly like the built-in setup.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use super::defaults::{
    BACKEND_BASE_URL, BACKEND_HTTP_TIMEOUT_SECS, DEFAULT_AXIS, DEFAULT_CONCURRENCY,
    DEFAULT_SAMPLING_RATE_HZ, DEFAULT_SENSOR_POSITION,
};

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV_VAR: &str = "VIBDIAG_CONFIG";

/// Config file looked up in the current working directory.
pub const LOCAL_CONFIG_FILE: &str = "vibdiag.toml";

// ============================================================================
// Top-Level Config
// ============================================================================

/// Root configuration.
///
/// Load with `AppConfig::load()` which searches:
/// 1. `$VIBDIAG_CONFIG` env var
/// 2. `./vibdiag.toml`
/// 3. Built-in defaults
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Analysis service connection
    #[serde(default)]
    pub backend: BackendConfig,

    /// Upload metadata defaults and queue sizing
    #[serde(default)]
    pub upload: UploadConfig,

    /// Analysis queue sizing
    #[serde(default)]
    pub analysis: AnalysisConfig,
}

impl AppConfig {
    /// Load configuration using the standard search order, falling back to
    /// defaults when a candidate file is missing or broken.
    pub fn load() -> Self {
        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            let p = PathBuf::from(&path);
            if p.exists() {
                match Self::load_from_file(&p) {
                    Ok(config) => {
                        info!(path = %p.display(), "Loaded config from {}", CONFIG_ENV_VAR);
                        return config;
                    }
                    Err(e) => {
                        warn!(path = %p.display(), error = %e, "Failed to load config from {}, falling back", CONFIG_ENV_VAR);
                    }
                }
            } else {
                warn!(path = %path, "{} points to non-existent file, falling back", CONFIG_ENV_VAR);
            }
        }

        let local = PathBuf::from(LOCAL_CONFIG_FILE);
        if local.exists() {
            match Self::load_from_file(&local) {
                Ok(config) => {
                    info!("Loaded config from ./{}", LOCAL_CONFIG_FILE);
                    return config;
                }
                Err(e) => {
                    warn!(error = %e, "Failed to load ./{}, using defaults", LOCAL_CONFIG_FILE);
                }
            }
        }

        info!("No {} found, using built-in defaults", LOCAL_CONFIG_FILE);
        Self::default()
    }

    /// Load from a specific TOML file path.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        let config: Self = toml::from_str(&contents)
            .map_err(|e| ConfigError::Parse(path.to_path_buf(), e))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the current config to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::Serialize)
    }

    /// Save config to a file.
    pub fn save_to_file(&self, path: &Path) -> Result<(), ConfigError> {
        let contents = self.to_toml()?;
        std::fs::write(path, contents).map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        info!(path = %path.display(), "Config saved");
        Ok(())
    }

    /// Validate all values, reporting every problem at once.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors: Vec<String> = Vec::new();

        if self.backend.base_url.trim().is_empty() {
            errors.push("backend.base_url must not be empty".to_string());
        }
        if self.backend.timeout_secs == 0 {
            errors.push("backend.timeout_secs must be > 0".to_string());
        }
        if self.upload.sampling_rate_hz == 0 {
            errors.push("upload.sampling_rate_hz must be > 0".to_string());
        }
        if self.upload.concurrency == 0 {
            errors.push("upload.concurrency must be > 0".to_string());
        }
        if self.analysis.concurrency == 0 {
            errors.push("analysis.concurrency must be > 0".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }
}

// ============================================================================
// Sections
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Base URL of the analysis REST service
    pub base_url: String,
    /// Per-request timeout (seconds)
    pub timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: BACKEND_BASE_URL.to_string(),
            timeout_secs: BACKEND_HTTP_TIMEOUT_SECS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    pub sensor_position: String,
    pub axis: String,
    pub sampling_rate_hz: u32,
    /// Files uploaded at once (1 = sequential)
    pub concurrency: usize,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            sensor_position: DEFAULT_SENSOR_POSITION.to_string(),
            axis: DEFAULT_AXIS.to_string(),
            sampling_rate_hz: DEFAULT_SAMPLING_RATE_HZ,
            concurrency: DEFAULT_CONCURRENCY,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Records analyzed at once (1 = sequential)
    pub concurrency: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
        }
    }
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {}: {1}", .0.display())]
    Io(PathBuf, #[source] std::io::Error),

    #[error("failed to parse {}: {1}", .0.display())]
    Parse(PathBuf, #[source] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    Serialize(#[source] toml::ser::Error),

    #[error("invalid config: {}", .0.join("; "))]
    Validation(Vec<String>),
}
