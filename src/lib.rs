//! Walking / standing detection from phone inertial and magnetic sensors.
//!
//! Raw samples are bias-corrected and Kalman-filtered, the compass heading is
//! tracked for stability, and windows of `(|mag|, |gyro|)` pairs are classified
//! on a background worker whose verdict is fused with step-counter and heading
//! evidence.

pub mod calibration;
pub mod classifier;
pub mod config;
pub mod display;
pub mod engine;
pub mod error;
pub mod filters;
pub mod fusion;
pub mod live_status;
pub mod location;
pub mod orientation;
pub mod sensors;
pub mod steps;
pub mod types;
pub mod window;
pub mod worker;

pub use classifier::{Classifier, GyroEnergyClassifier};
pub use config::EngineConfig;
pub use engine::{EngineEvent, MotionEngine};
pub use error::{WResult, WalkStandError};
pub use fusion::{DisplayColor, FusionEngine, FusionOutput, MotionLabel};
pub use worker::{InferenceOutcome, InferenceWorker, WindowJob};
