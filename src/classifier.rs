use crate::error::{WResult, WalkStandError};

/// Binary motion classifier.
///
/// Input is the flat window `[mag0, gyro0, mag1, gyro1, ...]`; output is
/// `[p_standing, p_walking]`. Implementations run on the inference worker
/// thread and may keep internal state.
pub trait Classifier: Send {
    fn predict(&mut self, features: &[f32]) -> WResult<Vec<f32>>;
}

/// Logistic score on the mean gyroscope magnitude of the window.
///
/// Walking swings the phone; standing keeps angular rate near zero. This is a
/// stand-in for a trained model so the binary runs end to end.
#[derive(Debug, Clone)]
pub struct GyroEnergyClassifier {
    /// Mean |gyro| (rad/s) at which both classes score 0.5.
    pub midpoint: f32,
    pub steepness: f32,
}

impl Default for GyroEnergyClassifier {
    fn default() -> Self {
        Self { midpoint: 0.35, steepness: 12.0 }
    }
}

impl GyroEnergyClassifier {
    pub fn new(midpoint: f32, steepness: f32) -> Self {
        Self { midpoint, steepness }
    }
}

impl Classifier for GyroEnergyClassifier {
    fn predict(&mut self, features: &[f32]) -> WResult<Vec<f32>> {
        if features.is_empty() || features.len() % 2 != 0 {
            return Err(WalkStandError::Classifier(format!(
                "expected interleaved (mag, gyro) pairs, got {} values",
                features.len()
            )));
        }

        let pairs = features.len() / 2;
        let mean_gyro = features.iter().skip(1).step_by(2).sum::<f32>() / pairs as f32;
        if !mean_gyro.is_finite() {
            return Err(WalkStandError::Classifier("non-finite gyro features".to_string()));
        }

        let p_walking = 1.0 / (1.0 + (-self.steepness * (mean_gyro - self.midpoint)).exp());
        Ok(vec![1.0 - p_walking, p_walking])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn window(mag: f32, gyro: f32) -> Vec<f32> {
        (0..100).flat_map(|_| [mag, gyro]).collect()
    }

    #[test]
    fn test_still_device_scores_standing() {
        let scores = GyroEnergyClassifier::default().predict(&window(45.0, 0.01)).unwrap();
        assert_eq!(scores.len(), 2);
        assert!(scores[0] > 0.95);
        assert_relative_eq!(scores[0] + scores[1], 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_swinging_device_scores_walking() {
        let scores = GyroEnergyClassifier::default().predict(&window(45.0, 1.5)).unwrap();
        assert!(scores[1] > 0.95);
    }

    #[test]
    fn test_midpoint_is_even() {
        let mut classifier = GyroEnergyClassifier::new(0.5, 10.0);
        let scores = classifier.predict(&window(30.0, 0.5)).unwrap();
        assert_relative_eq!(scores[0], 0.5, epsilon = 1e-6);
    }

    #[test]
    fn test_rejects_odd_input() {
        let mut classifier = GyroEnergyClassifier::default();
        assert!(classifier.predict(&[1.0, 2.0, 3.0]).is_err());
        assert!(classifier.predict(&[]).is_err());
    }
}
