//! Compass heading and heading-stability tracking.
//!
//! Heading comes from the accelerometer (gravity) and magnetometer (field)
//! triples: the east axis is `E × A`, north is `A × east`, and the azimuth is
//! the angle of the device's y axis in that horizontal frame.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::filters::scalar_kalman::ScalarKalmanFilter;
use crate::types::{Mat3, Vec3};

/// Below this fraction of g² the device is treated as in free fall.
const FREE_FALL_FRACTION: f64 = 0.01;
/// Minimum horizontal field magnitude for a usable heading.
const MIN_HORIZONTAL_FIELD: f64 = 0.1;

/// Rotation matrix from device to world (east, north, up) coordinates.
///
/// Returns `None` in free fall or when the field is (anti)parallel to gravity.
pub fn rotation_matrix(gravity: &Vec3, geomagnetic: &Vec3, g: f64) -> Option<Mat3> {
    let norm_sq_a = gravity.norm_squared();
    if norm_sq_a < FREE_FALL_FRACTION * g * g {
        return None;
    }

    let h = geomagnetic.cross(gravity);
    let norm_h = h.norm();
    if norm_h < MIN_HORIZONTAL_FIELD {
        return None;
    }
    let h = h / norm_h;
    let a = gravity / norm_sq_a.sqrt();
    let m = a.cross(&h);

    Some(Mat3::new(
        h.x, h.y, h.z, //
        m.x, m.y, m.z, //
        a.x, a.y, a.z,
    ))
}

/// Azimuth (rotation about the up axis) in radians, range (-π, π].
pub fn azimuth_rad(rotation: &Mat3) -> f64 {
    rotation[(0, 1)].atan2(rotation[(1, 1)])
}

/// Snapshot of the stability state.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct OrientationState {
    pub last_azimuth_deg: Option<f64>,
    pub stable_since: Option<f64>,
    pub is_stable: bool,
    pub standing_azimuth_deg: Option<f64>,
}

pub struct OrientationTracker {
    smoother: ScalarKalmanFilter,
    gravity: f64,
    threshold_deg: f64,
    stable_secs: f64,
    state: OrientationState,
    current_azimuth_deg: Option<f64>,
}

impl OrientationTracker {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            smoother: ScalarKalmanFilter::new(config.azimuth_q, config.azimuth_r, 0.0, 1.0),
            gravity: config.gravity,
            threshold_deg: config.orientation_threshold_deg,
            stable_secs: config.orientation_stable_secs,
            state: OrientationState::default(),
            current_azimuth_deg: None,
        }
    }

    /// Derive the heading from accel + mag, smooth it, and update stability.
    ///
    /// Returns the smoothed azimuth, or `None` if no rotation could be formed.
    pub fn update(&mut self, accel: &Vec3, mag: &Vec3, now: f64) -> Option<f64> {
        let Some(rotation) = rotation_matrix(accel, mag, self.gravity) else {
            debug!("Rotation matrix unavailable (free fall or degenerate field)");
            return None;
        };
        let raw_deg = azimuth_rad(&rotation).to_degrees();
        Some(self.update_azimuth(raw_deg, now))
    }

    /// Smooth a raw azimuth (degrees) and run the stability state machine.
    pub fn update_azimuth(&mut self, raw_deg: f64, now: f64) -> f64 {
        let azimuth = self.smoother.update(raw_deg);
        self.current_azimuth_deg = Some(azimuth);
        self.observe(azimuth, now);
        azimuth
    }

    /// Stability state machine on an already smoothed azimuth.
    ///
    /// The reference azimuth only moves when the heading leaves the threshold
    /// band, so slow sub-threshold drift never refreshes it.
    pub fn observe(&mut self, azimuth_deg: f64, now: f64) {
        let state = &mut self.state;
        match state.last_azimuth_deg {
            None => {
                state.last_azimuth_deg = Some(azimuth_deg);
                state.stable_since = Some(now);
                state.is_stable = false;
            }
            Some(last) if (azimuth_deg - last).abs() < self.threshold_deg => {
                let since = state.stable_since.unwrap_or(now);
                if now - since > self.stable_secs {
                    if !state.is_stable {
                        debug!("Heading stable at {:.1}°", last);
                    }
                    state.is_stable = true;
                    state.standing_azimuth_deg = Some(last);
                }
            }
            Some(_) => {
                state.last_azimuth_deg = Some(azimuth_deg);
                state.stable_since = Some(now);
                state.is_stable = false;
                state.standing_azimuth_deg = None;
            }
        }
    }

    pub fn state(&self) -> OrientationState {
        self.state
    }

    pub fn is_stable(&self) -> bool {
        self.state.is_stable
    }

    pub fn standing_azimuth(&self) -> Option<f64> {
        self.state.standing_azimuth_deg
    }

    /// Latest smoothed azimuth in degrees.
    pub fn current_azimuth(&self) -> Option<f64> {
        self.current_azimuth_deg
    }
}
