use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::engine::EngineStatus;
use crate::fusion::{DisplayColor, MotionLabel};

/// JSON snapshot of a session, written for external monitoring.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct LiveStatus {
    pub timestamp: f64,
    pub uptime_seconds: u64,
    // Sample intake
    pub accel_samples: u64,
    pub gyro_samples: u64,
    pub mag_samples: u64,
    pub step_readings: u64,
    pub location_fixes: u64,
    // Calibration
    pub calibration_complete: bool,
    pub calibrating: bool,
    pub accel_bias: [f64; 3],
    pub gyro_bias: [f64; 3],
    pub mag_bias: [f64; 3],
    // Orientation
    pub azimuth_deg: Option<f64>,
    pub orientation_stable: bool,
    pub standing_azimuth_deg: Option<f64>,
    pub steps_since_start: Option<f64>,
    pub filter_skips: u64,
    // Classification
    pub running: bool,
    pub run_id: u64,
    pub windows_dispatched: u64,
    pub windows_dropped: u64,
    pub windows_classified: u64,
    pub classification_failures: u64,
    pub stale_outputs: u64,
    pub last_label: Option<MotionLabel>,
    pub display_color: DisplayColor,
}

impl LiveStatus {
    pub fn new() -> Self {
        Self {
            timestamp: current_timestamp(),
            uptime_seconds: 0,
            accel_samples: 0,
            gyro_samples: 0,
            mag_samples: 0,
            step_readings: 0,
            location_fixes: 0,
            calibration_complete: false,
            calibrating: false,
            accel_bias: [0.0; 3],
            gyro_bias: [0.0; 3],
            mag_bias: [0.0; 3],
            azimuth_deg: None,
            orientation_stable: false,
            standing_azimuth_deg: None,
            steps_since_start: None,
            filter_skips: 0,
            running: false,
            run_id: 0,
            windows_dispatched: 0,
            windows_dropped: 0,
            windows_classified: 0,
            classification_failures: 0,
            stale_outputs: 0,
            last_label: None,
            display_color: DisplayColor::White,
        }
    }

    /// Fill the engine-side fields from a status snapshot.
    pub fn with_engine(mut self, status: &EngineStatus) -> Self {
        self.accel_samples = status.accel_samples;
        self.gyro_samples = status.gyro_samples;
        self.mag_samples = status.mag_samples;
        self.step_readings = status.step_readings;
        self.location_fixes = status.location_fixes;
        self.calibration_complete = status.calibrated;
        self.calibrating = status.calibration == crate::calibration::CalibrationState::Collecting;
        if let Some(biases) = status.biases {
            self.accel_bias = [biases.accel.x, biases.accel.y, biases.accel.z];
            self.gyro_bias = [biases.gyro.x, biases.gyro.y, biases.gyro.z];
            self.mag_bias = [biases.mag.x, biases.mag.y, biases.mag.z];
        }
        self.azimuth_deg = status.azimuth_deg;
        self.orientation_stable = status.orientation.is_stable;
        self.standing_azimuth_deg = status.orientation.standing_azimuth_deg;
        self.steps_since_start = status.steps_since_start;
        self.filter_skips = status.filter_skips;
        self.running = status.running;
        self.run_id = status.run_id;
        self.windows_dispatched = status.windows_dispatched;
        self
    }

    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}

impl Default for LiveStatus {
    fn default() -> Self {
        Self::new()
    }
}

pub fn current_timestamp() -> f64 {
    Utc::now().timestamp_millis() as f64 / 1000.0
}
