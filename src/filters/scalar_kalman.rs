use serde::{Deserialize, Serialize};

/// One-dimensional Kalman filter with identity dynamics.
///
/// `q` and `r` are public so callers can retune them between updates, e.g.
/// raising `q` while the raw signal is large to follow faster platform motion.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ScalarKalmanFilter {
    /// Process noise
    pub q: f64,
    /// Measurement noise
    pub r: f64,
    x: f64,
    p: f64,
    k: f64,
}

impl ScalarKalmanFilter {
    pub fn new(q: f64, r: f64, x: f64, p: f64) -> Self {
        Self { q, r, x, p, k: 0.0 }
    }

    /// Fold one measurement into the estimate and return the new estimate.
    pub fn update(&mut self, measurement: f64) -> f64 {
        self.p += self.q;
        self.k = self.p / (self.p + self.r);
        self.x += self.k * (measurement - self.x);
        self.p *= 1.0 - self.k;
        self.x
    }

    pub fn estimate(&self) -> f64 {
        self.x
    }

    pub fn covariance(&self) -> f64 {
        self.p
    }

    pub fn gain(&self) -> f64 {
        self.k
    }
}
