//! Three-axis Kalman filter with identity transition and observation models.
//!
//! With `F = H = I` the filter reduces to:
//!
//! ```text
//! P' = P + Q
//! S  = P' + R
//! K  = P' S⁻¹
//! x  = x + K (z - x)
//! P  = (I - K) P'
//! ```
//!
//! `P` is not re-symmetrised after the update; with diagonal `Q`/`R` it stays
//! diagonal, and correlated noise slowly accumulates rounding asymmetry.

use serde::{Deserialize, Serialize};

use crate::error::{WResult, WalkStandError};
use crate::types::{diag3, KalmanGain3, Mat3, Vec3, AXIS_DIM};

pub const DEFAULT_PROCESS_NOISE: f64 = 0.0003;
pub const DEFAULT_MEASUREMENT_NOISE: f64 = 0.03;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VectorKalmanFilter {
    x: Vec3,
    p: Mat3,
    q: Mat3,
    r: Mat3,
    updates: u64,
    singular_skips: u64,
}

impl Default for VectorKalmanFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl VectorKalmanFilter {
    /// Zero state, identity covariance, diagonal default noise.
    pub fn new() -> Self {
        Self::diagonal(DEFAULT_PROCESS_NOISE, DEFAULT_MEASUREMENT_NOISE)
    }

    /// Independent axes with the same process and measurement noise on each.
    pub fn diagonal(q: f64, r: f64) -> Self {
        Self::with_noise(diag3(q), diag3(r))
    }

    /// Full noise matrices, allowing cross-axis correlation.
    pub fn with_noise(q: Mat3, r: Mat3) -> Self {
        Self {
            x: Vec3::zeros(),
            p: Mat3::identity(),
            q,
            r,
            updates: 0,
            singular_skips: 0,
        }
    }

    /// Override the initial estimate and covariance.
    pub fn with_initial_state(mut self, x: Vec3, p: Mat3) -> Self {
        self.x = x;
        self.p = p;
        self
    }

    /// Fold one observation into the estimate.
    ///
    /// When the innovation covariance cannot be inverted the update is skipped
    /// and the previous `x`/`P` are kept untouched.
    pub fn update(&mut self, z: &Vec3) -> WResult<Vec3> {
        if !z.iter().all(|v| v.is_finite()) {
            return Err(WalkStandError::InvalidParameters(
                "non-finite measurement".to_string(),
            ));
        }

        // Predict (state unchanged, F = I and no control input)
        let p_pred = self.p + self.q;

        // Innovation
        let y = z - self.x;
        let s = p_pred + self.r;
        let Some(s_inv) = adjugate_inverse(&s) else {
            self.singular_skips += 1;
            return Err(WalkStandError::SingularMatrix);
        };
        let k: KalmanGain3 = p_pred * s_inv;

        let x_new = self.x + k * y;
        if !x_new.iter().all(|v| v.is_finite()) {
            self.singular_skips += 1;
            return Err(WalkStandError::SingularMatrix);
        }

        self.x = x_new;
        self.p = (Mat3::identity() - k) * p_pred;
        self.updates += 1;
        Ok(self.x)
    }

    pub fn state(&self) -> Vec3 {
        self.x
    }

    pub fn covariance(&self) -> &Mat3 {
        &self.p
    }

    pub fn process_noise(&self) -> &Mat3 {
        &self.q
    }

    pub fn measurement_noise(&self) -> &Mat3 {
        &self.r
    }

    /// Retune the diagonal process noise of one axis.
    pub fn set_process_noise_axis(&mut self, axis: usize, q: f64) {
        if axis < AXIS_DIM {
            self.q[(axis, axis)] = q;
        }
    }

    /// Retune the diagonal measurement noise of one axis.
    pub fn set_measurement_noise_axis(&mut self, axis: usize, r: f64) {
        if axis < AXIS_DIM {
            self.r[(axis, axis)] = r;
        }
    }

    pub fn update_count(&self) -> u64 {
        self.updates
    }

    pub fn singular_skips(&self) -> u64 {
        self.singular_skips
    }
}

/// Closed-form 3×3 inverse via the adjugate; `None` when `det == 0`.
pub fn adjugate_inverse(m: &Mat3) -> Option<Mat3> {
    let (a, b, c) = (m[(0, 0)], m[(0, 1)], m[(0, 2)]);
    let (d, e, f) = (m[(1, 0)], m[(1, 1)], m[(1, 2)]);
    let (g, h, i) = (m[(2, 0)], m[(2, 1)], m[(2, 2)]);

    let det = a * (e * i - f * h) - b * (d * i - f * g) + c * (d * h - e * g);
    if det == 0.0 || !det.is_finite() {
        return None;
    }
    let inv_det = 1.0 / det;

    Some(Mat3::new(
        (e * i - f * h) * inv_det,
        (c * h - b * i) * inv_det,
        (b * f - c * e) * inv_det,
        (f * g - d * i) * inv_det,
        (a * i - c * g) * inv_det,
        (c * d - a * f) * inv_det,
        (d * h - e * g) * inv_det,
        (b * g - a * h) * inv_det,
        (a * e - b * d) * inv_det,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::scalar_kalman::ScalarKalmanFilter;
    use approx::assert_relative_eq;

    #[test]
    fn test_adjugate_inverse_matches_identity() {
        let m = Mat3::new(4.0, 1.0, 0.5, 1.0, 3.0, 0.2, 0.5, 0.2, 2.0);
        let inv = adjugate_inverse(&m).unwrap();
        let prod = m * inv;
        for r in 0..3 {
            for c in 0..3 {
                let expected = if r == c { 1.0 } else { 0.0 };
                assert_relative_eq!(prod[(r, c)], expected, epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn test_adjugate_inverse_singular() {
        let m = Mat3::new(1.0, 2.0, 3.0, 2.0, 4.0, 6.0, 0.0, 1.0, 1.0);
        assert!(adjugate_inverse(&m).is_none());
    }

    #[test]
    fn test_diagonal_matches_scalar_filters() {
        let q = [0.0005, 0.001, 0.0007];
        let r = [0.05, 0.1, 0.07];

        let mut vector = VectorKalmanFilter::with_noise(
            Mat3::from_diagonal(&Vec3::new(q[0], q[1], q[2])),
            Mat3::from_diagonal(&Vec3::new(r[0], r[1], r[2])),
        );
        let mut scalars: Vec<ScalarKalmanFilter> = (0..3)
            .map(|i| ScalarKalmanFilter::new(q[i], r[i], 0.0, 1.0))
            .collect();

        for n in 0..200 {
            let t = n as f64 * 0.01;
            let z = Vec3::new((t * 7.0).sin(), 9.8 + (t * 3.0).cos() * 0.2, t * 0.5);
            let out = vector.update(&z).unwrap();
            for axis in 0..3 {
                let expected = scalars[axis].update(z[axis]);
                assert_relative_eq!(out[axis], expected, epsilon = 1e-9);
            }
        }
    }

    #[test]
    fn test_singular_update_keeps_state() {
        let mut kf = VectorKalmanFilter::with_noise(Mat3::zeros(), Mat3::zeros())
            .with_initial_state(Vec3::new(1.0, 2.0, 3.0), Mat3::zeros());

        let err = kf.update(&Vec3::new(5.0, 5.0, 5.0)).unwrap_err();
        assert_eq!(err, WalkStandError::SingularMatrix);
        assert_eq!(kf.state(), Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(*kf.covariance(), Mat3::zeros());
        assert_eq!(kf.singular_skips(), 1);
        assert_eq!(kf.update_count(), 0);
    }

    #[test]
    fn test_non_finite_measurement_rejected() {
        let mut kf = VectorKalmanFilter::new();
        assert!(kf.update(&Vec3::new(f64::NAN, 0.0, 0.0)).is_err());
        assert_eq!(kf.state(), Vec3::zeros());
    }

    #[test]
    fn test_correlated_noise_couples_axes() {
        let mut r = diag3(0.05);
        r[(0, 1)] = 0.04;
        r[(1, 0)] = 0.04;
        let mut kf = VectorKalmanFilter::with_noise(diag3(0.0005), r);
        let mut independent = VectorKalmanFilter::diagonal(0.0005, 0.05);

        for _ in 0..3 {
            kf.update(&Vec3::new(1.0, 0.0, 0.0)).unwrap();
            independent.update(&Vec3::new(1.0, 0.0, 0.0)).unwrap();
        }
        // Independent axes leave y untouched; correlated noise bleeds into it
        assert_eq!(independent.state().y, 0.0);
        assert!(kf.state().y.abs() > 1e-6);
    }

    #[test]
    fn test_axis_retuning() {
        let mut kf = VectorKalmanFilter::diagonal(0.0005, 0.05);
        kf.set_process_noise_axis(2, 0.001);
        kf.set_measurement_noise_axis(0, 0.15);
        kf.set_measurement_noise_axis(7, 1.0);
        assert_eq!(kf.process_noise()[(2, 2)], 0.001);
        assert_eq!(kf.measurement_noise()[(0, 0)], 0.15);
        assert_eq!(kf.process_noise()[(0, 0)], 0.0005);
    }
}
