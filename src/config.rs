//! Run configuration.
//!
//! Every field has a default, so an empty JSON object is a valid config file.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::ConfigError;
use crate::fall::FallParams;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Largest encoding distance (exclusive) still counted as a match.
    pub face_distance_threshold: f64,
    /// Scale of the copy face detection runs on, in `(0, 1]`.
    pub detection_downscale: f64,
    /// Shoulder drop, as a fraction of frame height, that counts as a fall step.
    pub fall_ratio_threshold: f64,
    /// Lower bound on the drop threshold in pixels.
    pub fall_min_pixel_floor: u32,
    /// Consecutive exceeding samples needed to confirm a fall.
    pub fall_consecutive_threshold: u32,
    /// Minimum spacing between evaluated posture samples.
    pub detection_interval_secs: f64,
    pub baseline_smoothing_alpha: f64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            face_distance_threshold: 0.6,
            detection_downscale: 0.25,
            fall_ratio_threshold: 0.20,
            fall_min_pixel_floor: 60,
            fall_consecutive_threshold: 2,
            detection_interval_secs: 1.0,
            baseline_smoothing_alpha: 0.02,
        }
    }
}

impl MonitorConfig {
    /// Loads a config from a JSON file and validates it.
    pub fn from_json(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        let cfg: MonitorConfig = serde_json::from_str(&contents)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.face_distance_threshold.is_finite() || self.face_distance_threshold <= 0.0 {
            return Err(ConfigError::invalid_value(
                "face_distance_threshold",
                "must be finite and > 0",
            ));
        }
        if !(self.detection_downscale > 0.0 && self.detection_downscale <= 1.0) {
            return Err(ConfigError::invalid_value(
                "detection_downscale",
                "must be in (0, 1]",
            ));
        }
        if !self.fall_ratio_threshold.is_finite() || self.fall_ratio_threshold < 0.0 {
            return Err(ConfigError::invalid_value(
                "fall_ratio_threshold",
                "must be finite and >= 0",
            ));
        }
        if self.fall_consecutive_threshold == 0 {
            return Err(ConfigError::invalid_value(
                "fall_consecutive_threshold",
                "must be > 0",
            ));
        }
        self.detection_interval()?;
        if !(0.0..=1.0).contains(&self.baseline_smoothing_alpha) {
            return Err(ConfigError::invalid_value(
                "baseline_smoothing_alpha",
                "must be in [0, 1]",
            ));
        }
        Ok(())
    }

    /// Rejects negative, non-finite and out-of-range intervals.
    pub fn detection_interval(&self) -> Result<Duration, ConfigError> {
        Duration::try_from_secs_f64(self.detection_interval_secs)
            .map_err(|e| ConfigError::invalid_value("detection_interval_secs", e.to_string()))
    }

    pub fn fall_params(&self) -> Result<FallParams, ConfigError> {
        Ok(FallParams {
            ratio_threshold: self.fall_ratio_threshold,
            min_pixel_floor: f64::from(self.fall_min_pixel_floor),
            confirm_threshold: self.fall_consecutive_threshold,
            detection_interval: self.detection_interval()?,
            smoothing_alpha: self.baseline_smoothing_alpha,
        })
    }
}
