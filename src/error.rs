use thiserror::Error;

/// Motion state engine error types
#[derive(Error, Debug, Clone, PartialEq)]
pub enum WalkStandError {
    #[error("Sensors not calibrated: run calibration before starting")]
    NotCalibrated,

    #[error("Calibration already in progress")]
    CalibrationInProgress,

    #[error("Engine already running")]
    AlreadyRunning,

    #[error("Engine not running")]
    NotRunning,

    #[error("Innovation covariance is singular")]
    SingularMatrix,

    #[error("Classifier returned {0} scores, expected 2")]
    InvalidClassifierOutput(usize),

    #[error("Classifier failed: {0}")]
    Classifier(String),

    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),

    #[error("Inference worker disconnected")]
    WorkerDisconnected,

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type for engine operations
pub type WResult<T> = Result<T, WalkStandError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_calibrated_message() {
        let msg = WalkStandError::NotCalibrated.to_string();
        assert!(msg.contains("not calibrated"));
    }

    #[test]
    fn test_classifier_output_message() {
        let msg = WalkStandError::InvalidClassifierOutput(3).to_string();
        assert_eq!(msg, "Classifier returned 3 scores, expected 2");
    }
}
