//! Linear algebra type system for the motion state engine
//!
//! Every filter in the crate works on three-axis sensor triples, so the
//! aliases below pin the dimension at compile time.

use nalgebra::{SMatrix, SVector};

// ===== Dimensions =====
pub const AXIS_DIM: usize = 3; // (x, y, z)

// ===== Sensor triple types =====
pub type Vec3 = SVector<f64, AXIS_DIM>;
pub type Mat3 = SMatrix<f64, AXIS_DIM, AXIS_DIM>;

// Kalman gain for identity observation model (3×3)
pub type KalmanGain3 = Mat3;

/// Diagonal 3×3 matrix with the same value on every axis.
pub fn diag3(value: f64) -> Mat3 {
    Mat3::from_diagonal_element(value)
}

/// Euclidean norm of a sensor triple.
pub fn magnitude(v: &Vec3) -> f64 {
    (v.x * v.x + v.y * v.y + v.z * v.z).sqrt()
}
