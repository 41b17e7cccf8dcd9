//! Time-boxed sensor bias estimation.
//!
//! The device is assumed to be held level and stationary while collecting.
//! That precondition is not checked: a tilted device simply yields biased
//! accelerometer x/y offsets.

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::error::{WResult, WalkStandError};
use crate::types::{SensorKind, Vec3};

/// Calibration state machine states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CalibrationState {
    Idle,
    Collecting,
}

/// Per-sensor bias vectors subtracted from every raw reading.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Biases {
    pub accel: Vec3,
    pub gyro: Vec3,
    pub mag: Vec3,
}

impl Default for Biases {
    fn default() -> Self {
        Self { accel: Vec3::zeros(), gyro: Vec3::zeros(), mag: Vec3::zeros() }
    }
}

impl Biases {
    pub fn get(&self, kind: SensorKind) -> Vec3 {
        match kind {
            SensorKind::Accelerometer => self.accel,
            SensorKind::Gyroscope => self.gyro,
            SensorKind::Magnetometer => self.mag,
        }
    }

    pub fn apply(&self, kind: SensorKind, raw: &Vec3) -> Vec3 {
        raw - self.get(kind)
    }
}

pub struct CalibrationSession {
    state: CalibrationState,
    duration_secs: f64,
    gravity: f64,
    started_at: f64,
    accel_samples: Vec<Vec3>,
    gyro_samples: Vec<Vec3>,
    mag_samples: Vec<Vec3>,
}

impl CalibrationSession {
    pub fn new(duration_secs: f64, gravity: f64) -> Self {
        Self {
            state: CalibrationState::Idle,
            duration_secs,
            gravity,
            started_at: 0.0,
            accel_samples: Vec::with_capacity(512),
            gyro_samples: Vec::with_capacity(512),
            mag_samples: Vec::with_capacity(512),
        }
    }

    /// Transition Idle → Collecting, discarding samples from any earlier run.
    pub fn start(&mut self, now: f64) -> WResult<()> {
        if self.state == CalibrationState::Collecting {
            return Err(WalkStandError::CalibrationInProgress);
        }
        self.accel_samples.clear();
        self.gyro_samples.clear();
        self.mag_samples.clear();
        self.started_at = now;
        self.state = CalibrationState::Collecting;
        info!("Calibration started ({:.1}s window)", self.duration_secs);
        Ok(())
    }

    pub fn state(&self) -> CalibrationState {
        self.state
    }

    pub fn is_collecting(&self) -> bool {
        self.state == CalibrationState::Collecting
    }

    /// Append a raw, unfiltered sample. Ignored unless collecting.
    pub fn push(&mut self, kind: SensorKind, raw: Vec3) {
        if !self.is_collecting() {
            return;
        }
        match kind {
            SensorKind::Accelerometer => self.accel_samples.push(raw),
            SensorKind::Gyroscope => self.gyro_samples.push(raw),
            SensorKind::Magnetometer => self.mag_samples.push(raw),
        }
    }

    /// True once the collection window has elapsed at time `now`.
    pub fn is_due(&self, now: f64) -> bool {
        self.is_collecting() && now - self.started_at >= self.duration_secs
    }

    pub fn sample_counts(&self) -> (usize, usize, usize) {
        (self.accel_samples.len(), self.gyro_samples.len(), self.mag_samples.len())
    }

    /// Transition Collecting → Idle and compute the biases.
    ///
    /// An empty sample set leaves that sensor's bias at zero.
    pub fn finish(&mut self) -> WResult<Biases> {
        if !self.is_collecting() {
            return Err(WalkStandError::InvalidParameters(
                "calibration is not collecting".to_string(),
            ));
        }

        let mut accel = mean(&self.accel_samples).unwrap_or_else(Vec3::zeros);
        if !self.accel_samples.is_empty() {
            accel.z -= self.gravity;
        }
        let biases = Biases {
            accel,
            gyro: mean(&self.gyro_samples).unwrap_or_else(Vec3::zeros),
            mag: mean(&self.mag_samples).unwrap_or_else(Vec3::zeros),
        };

        let (na, ng, nm) = self.sample_counts();
        debug!("Calibration samples: accel={} gyro={} mag={}", na, ng, nm);
        info!(
            "Calibration complete: accel=({:.4}, {:.4}, {:.4}) gyro=({:.4}, {:.4}, {:.4}) mag=({:.2}, {:.2}, {:.2})",
            biases.accel.x, biases.accel.y, biases.accel.z,
            biases.gyro.x, biases.gyro.y, biases.gyro.z,
            biases.mag.x, biases.mag.y, biases.mag.z,
        );

        self.state = CalibrationState::Idle;
        Ok(biases)
    }
}

fn mean(samples: &[Vec3]) -> Option<Vec3> {
    if samples.is_empty() {
        return None;
    }
    let sum = samples.iter().fold(Vec3::zeros(), |acc, s| acc + s);
    Some(sum / samples.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::STANDARD_GRAVITY;
    use approx::assert_relative_eq;

    #[test]
    fn test_stationary_level_device() {
        let mut session = CalibrationSession::new(5.0, STANDARD_GRAVITY);
        session.start(0.0).unwrap();

        for i in 0..250 {
            // Symmetric jitter around (0, 0, 9.8)
            let jitter = if i % 2 == 0 { 0.01 } else { -0.01 };
            session.push(SensorKind::Accelerometer, Vec3::new(jitter, -jitter, 9.8 + jitter));
            session.push(SensorKind::Gyroscope, Vec3::new(jitter, jitter, -jitter));
            session.push(SensorKind::Magnetometer, Vec3::new(-jitter, 0.0, jitter));
        }

        let biases = session.finish().unwrap();
        assert_relative_eq!(biases.accel.x, 0.0, epsilon = 1e-9);
        assert_relative_eq!(biases.accel.y, 0.0, epsilon = 1e-9);
        assert_relative_eq!(biases.accel.z, -0.00665, epsilon = 1e-9);
        assert_relative_eq!(biases.gyro.norm(), 0.0, epsilon = 1e-9);
        assert_relative_eq!(biases.mag.norm(), 0.0, epsilon = 1e-9);
        assert_eq!(session.state(), CalibrationState::Idle);
    }

    #[test]
    fn test_empty_sets_default_to_zero() {
        let mut session = CalibrationSession::new(5.0, STANDARD_GRAVITY);
        session.start(0.0).unwrap();
        session.push(SensorKind::Gyroscope, Vec3::new(0.02, 0.0, 0.0));

        let biases = session.finish().unwrap();
        assert_eq!(biases.accel, Vec3::zeros());
        assert_eq!(biases.mag, Vec3::zeros());
        assert_relative_eq!(biases.gyro.x, 0.02);
    }

    #[test]
    fn test_restart_clears_previous_samples() {
        let mut session = CalibrationSession::new(1.0, STANDARD_GRAVITY);
        session.start(0.0).unwrap();
        session.push(SensorKind::Magnetometer, Vec3::new(100.0, 0.0, 0.0));
        session.finish().unwrap();

        session.start(10.0).unwrap();
        assert_eq!(session.sample_counts(), (0, 0, 0));
        session.push(SensorKind::Magnetometer, Vec3::new(2.0, 0.0, 0.0));
        let biases = session.finish().unwrap();
        assert_relative_eq!(biases.mag.x, 2.0);
    }

    #[test]
    fn test_state_transitions() {
        let mut session = CalibrationSession::new(5.0, STANDARD_GRAVITY);
        assert!(session.finish().is_err());

        // Samples outside a session are dropped
        session.push(SensorKind::Accelerometer, Vec3::new(1.0, 1.0, 1.0));
        assert_eq!(session.sample_counts(), (0, 0, 0));

        session.start(100.0).unwrap();
        assert_eq!(session.start(101.0), Err(WalkStandError::CalibrationInProgress));
        assert!(!session.is_due(104.9));
        assert!(session.is_due(105.0));
    }

    #[test]
    fn test_bias_application() {
        let biases = Biases {
            accel: Vec3::new(0.1, 0.2, -0.1),
            ..Default::default()
        };
        let out = biases.apply(SensorKind::Accelerometer, &Vec3::new(0.1, 0.2, 9.7));
        assert_relative_eq!(out.z, 9.8, epsilon = 1e-12);
        assert_eq!(biases.apply(SensorKind::Gyroscope, &Vec3::new(1.0, 2.0, 3.0)), Vec3::new(1.0, 2.0, 3.0));
    }
}
