use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::{WResult, WalkStandError};

/// Standard gravity (m/s²) removed from the vertical accelerometer axis.
pub const STANDARD_GRAVITY: f64 = 9.80665;

// ─── Configuration ───────────────────────────────────────────────────────────

/// Sensors the platform actually has.
///
/// Magnetometer and gyroscope are mandatory for the classifier features;
/// accelerometer and pedometer may be absent and only disable the features
/// that depend on them.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SensorPresence {
    pub accelerometer: bool,
    pub step_counter: bool,
}

impl Default for SensorPresence {
    fn default() -> Self {
        Self { accelerometer: true, step_counter: true }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    // ── Calibration ──
    pub calibration_duration_secs: f64,
    pub gravity: f64,

    // ── Per-sensor filter noise (diagonal Q / R) ──
    pub accel_q: f64,
    pub accel_r: f64,
    pub gyro_q: f64,
    pub gyro_r: f64,
    pub mag_q: f64,
    pub mag_r: f64,

    // ── Adaptive noise ──
    pub adaptive_noise: bool,
    pub accel_dynamic_threshold: f64,
    pub accel_dynamic_q: f64,
    pub gyro_dynamic_threshold: f64,
    pub gyro_dynamic_r: f64,

    // ── Azimuth smoothing ──
    pub azimuth_q: f64,
    pub azimuth_r: f64,

    // ── Orientation stability ──
    pub orientation_threshold_deg: f64,
    pub orientation_stable_secs: f64,

    // ── Classification window ──
    pub window_size: usize,
    pub inference_queue_depth: usize,

    // ── Fusion overrides ──
    pub min_step_delta: f64,
    pub orientation_override_deg: f64,

    // ── Location (informational) ──
    pub location_movement_threshold_m: f64,

    pub sensors: SensorPresence,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            calibration_duration_secs: 5.0,
            gravity: STANDARD_GRAVITY,
            accel_q: 0.0005,
            accel_r: 0.05,
            gyro_q: 0.001,
            gyro_r: 0.1,
            mag_q: 0.0007,
            mag_r: 0.07,
            adaptive_noise: true,
            accel_dynamic_threshold: 15.0,
            accel_dynamic_q: 0.001,
            gyro_dynamic_threshold: 1.0,
            gyro_dynamic_r: 0.15,
            azimuth_q: 0.0005,
            azimuth_r: 0.05,
            orientation_threshold_deg: 20.0,
            orientation_stable_secs: 1.0,
            window_size: 100,
            inference_queue_depth: 4,
            min_step_delta: 1.0,
            orientation_override_deg: 20.0,
            location_movement_threshold_m: 3.0,
            sensors: SensorPresence::default(),
        }
    }
}

impl EngineConfig {
    /// Load a JSON config; missing fields fall back to defaults.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = fs::read_to_string(path)?;
        let config: EngineConfig = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> WResult<()> {
        let noises = [
            ("accel_q", self.accel_q),
            ("accel_r", self.accel_r),
            ("gyro_q", self.gyro_q),
            ("gyro_r", self.gyro_r),
            ("mag_q", self.mag_q),
            ("mag_r", self.mag_r),
            ("accel_dynamic_q", self.accel_dynamic_q),
            ("gyro_dynamic_r", self.gyro_dynamic_r),
            ("azimuth_q", self.azimuth_q),
            ("azimuth_r", self.azimuth_r),
        ];
        for (name, value) in noises {
            if !(value > 0.0) || !value.is_finite() {
                return Err(WalkStandError::InvalidParameters(format!(
                    "{} must be positive, got {}",
                    name, value
                )));
            }
        }

        if !(self.calibration_duration_secs > 0.0) {
            return Err(WalkStandError::InvalidParameters(
                "calibration_duration_secs must be positive".to_string(),
            ));
        }
        if self.window_size == 0 {
            return Err(WalkStandError::InvalidParameters(
                "window_size must be at least 1".to_string(),
            ));
        }
        if self.inference_queue_depth == 0 {
            return Err(WalkStandError::InvalidParameters(
                "inference_queue_depth must be at least 1".to_string(),
            ));
        }
        if self.orientation_threshold_deg < 0.0 || self.orientation_override_deg < 0.0 {
            return Err(WalkStandError::InvalidParameters(
                "orientation thresholds must not be negative".to_string(),
            ));
        }
        Ok(())
    }
}
