//! Session configuration: flat numeric thresholds, immutable for the
//! lifetime of a session.
//!
//! Precedence when assembling a config: explicit struct > TOML file >
//! `HOLDSTILL_*` environment variables > defaults.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid config file: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("{field} must be non-zero")]
    ZeroInterval { field: &'static str },
    #[error("{field} must be within (0, 1], got {value}")]
    FractionOutOfRange { field: &'static str, value: f32 },
    #[error("min_face_size_fraction {min} must be below max_face_size_fraction {max}")]
    SizeBandInverted { min: f32, max: f32 },
    #[error("warning_threshold_fraction {warning} must not be below center_threshold_fraction {center}")]
    ThresholdOrder { warning: f32, center: f32 },
}

/// Thresholds and timings for one guided-capture session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GuidanceConfig {
    /// Minimum spacing between evaluated observation batches; frames
    /// arriving sooner are discarded, not queued.
    pub detection_interval_ms: u64,
    /// Period of the progress tick while a centered face is held.
    pub progress_tick_ms: u64,
    /// Progress added per tick, clamped at 100.
    pub progress_step_per_tick: u8,
    /// Accepted face size band, as fractions of the short frame side.
    pub min_face_size_fraction: f32,
    pub max_face_size_fraction: f32,
    /// Center offset tolerance for the Good class, as a fraction of each
    /// frame dimension.
    pub center_threshold_fraction: f32,
    /// Wider tolerance separating Warning from Error.
    pub warning_threshold_fraction: f32,
}

impl Default for GuidanceConfig {
    fn default() -> Self {
        Self {
            detection_interval_ms: 200,
            progress_tick_ms: 100,
            progress_step_per_tick: 1,
            min_face_size_fraction: 0.3,
            max_face_size_fraction: 0.6,
            center_threshold_fraction: 0.15,
            warning_threshold_fraction: 0.25,
        }
    }
}

impl GuidanceConfig {
    /// Load configuration from `HOLDSTILL_*` environment variables, falling
    /// back to defaults for anything unset or unparsable.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            detection_interval_ms: env_u64(
                "HOLDSTILL_DETECTION_INTERVAL_MS",
                defaults.detection_interval_ms,
            ),
            progress_tick_ms: env_u64("HOLDSTILL_PROGRESS_TICK_MS", defaults.progress_tick_ms),
            progress_step_per_tick: env_u8(
                "HOLDSTILL_PROGRESS_STEP_PER_TICK",
                defaults.progress_step_per_tick,
            ),
            min_face_size_fraction: env_f32(
                "HOLDSTILL_MIN_FACE_SIZE_FRACTION",
                defaults.min_face_size_fraction,
            ),
            max_face_size_fraction: env_f32(
                "HOLDSTILL_MAX_FACE_SIZE_FRACTION",
                defaults.max_face_size_fraction,
            ),
            center_threshold_fraction: env_f32(
                "HOLDSTILL_CENTER_THRESHOLD_FRACTION",
                defaults.center_threshold_fraction,
            ),
            warning_threshold_fraction: env_f32(
                "HOLDSTILL_WARNING_THRESHOLD_FRACTION",
                defaults.warning_threshold_fraction,
            ),
        }
    }

    /// Parse a TOML config document. Unknown keys are rejected.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(contents)?;
        config.validate()?;
        tracing::debug!(?config, "config loaded from TOML");
        Ok(config)
    }

    /// Check internal consistency of the thresholds.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.detection_interval_ms == 0 {
            return Err(ConfigError::ZeroInterval {
                field: "detection_interval_ms",
            });
        }
        if self.progress_tick_ms == 0 {
            return Err(ConfigError::ZeroInterval {
                field: "progress_tick_ms",
            });
        }
        if self.progress_step_per_tick == 0 {
            return Err(ConfigError::ZeroInterval {
                field: "progress_step_per_tick",
            });
        }

        for (field, value) in [
            ("min_face_size_fraction", self.min_face_size_fraction),
            ("max_face_size_fraction", self.max_face_size_fraction),
            ("center_threshold_fraction", self.center_threshold_fraction),
            (
                "warning_threshold_fraction",
                self.warning_threshold_fraction,
            ),
        ] {
            if !(value > 0.0 && value <= 1.0) {
                return Err(ConfigError::FractionOutOfRange { field, value });
            }
        }

        if self.min_face_size_fraction >= self.max_face_size_fraction {
            return Err(ConfigError::SizeBandInverted {
                min: self.min_face_size_fraction,
                max: self.max_face_size_fraction,
            });
        }
        if self.warning_threshold_fraction < self.center_threshold_fraction {
            return Err(ConfigError::ThresholdOrder {
                warning: self.warning_threshold_fraction,
                center: self.center_threshold_fraction,
            });
        }
        Ok(())
    }
}

fn env_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_u8(key: &str, default: u8) -> u8 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_f32(key: &str, default: f32) -> f32 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
