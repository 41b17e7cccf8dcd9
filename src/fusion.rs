//! Decision fusion: classifier verdict plus auxiliary evidence.
//!
//! Rules run in a fixed order and never loop:
//!
//! 1. argmax of the classifier scores (`[standing, walking]`)
//! 2. step override: more than `min_step_delta` new steps forces Walking
//! 3. orientation override: a Walking verdict while still facing the latched
//!    standing heading is turned back into Standing
//!
//! Rule 3 only ever suppresses Walking; nothing turns Standing into Walking
//! except the step counter.

use log::debug;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::EngineConfig;
use crate::error::{WResult, WalkStandError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MotionLabel {
    Standing,
    Walking,
}

impl MotionLabel {
    pub fn color(self) -> DisplayColor {
        match self {
            MotionLabel::Standing => DisplayColor::Red,
            MotionLabel::Walking => DisplayColor::Green,
        }
    }
}

impl fmt::Display for MotionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MotionLabel::Standing => write!(f, "Standing"),
            MotionLabel::Walking => write!(f, "Walking"),
        }
    }
}

/// Confidence colour shown alongside the label; White means idle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DisplayColor {
    Red,
    Green,
    White,
}

/// Which rule produced the final label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Decision {
    Classifier,
    StepOverride,
    OrientationOverride,
}

/// Auxiliary evidence captured when the window was dispatched.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FusionEvidence {
    /// Steps registered since the previous inference.
    pub step_delta: f64,
    /// Latest smoothed azimuth, degrees.
    pub current_azimuth_deg: Option<f64>,
    /// Heading latched while the device was stable, degrees.
    pub standing_azimuth_deg: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FusionOutput {
    pub label: MotionLabel,
    pub color: DisplayColor,
    pub decision: Decision,
    /// Window sequence number within the run.
    pub window_seq: u64,
    /// Run the window belongs to; outputs of an earlier run are stale.
    pub run_id: u64,
}

#[derive(Debug, Clone)]
pub struct FusionEngine {
    min_step_delta: f64,
    orientation_override_deg: f64,
}

impl FusionEngine {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            min_step_delta: config.min_step_delta,
            orientation_override_deg: config.orientation_override_deg,
        }
    }

    /// Argmax over `[standing, walking]`; a tie resolves to Walking.
    pub fn base_label(scores: &[f32]) -> WResult<MotionLabel> {
        match scores {
            [standing, walking] => Ok(if standing > walking {
                MotionLabel::Standing
            } else {
                MotionLabel::Walking
            }),
            other => Err(WalkStandError::InvalidClassifierOutput(other.len())),
        }
    }

    pub fn fuse(&self, scores: &[f32], evidence: &FusionEvidence) -> WResult<(MotionLabel, Decision)> {
        let mut label = Self::base_label(scores)?;
        let mut decision = Decision::Classifier;

        if evidence.step_delta > self.min_step_delta {
            if label != MotionLabel::Walking {
                debug!("Step override: {} new steps", evidence.step_delta);
            }
            label = MotionLabel::Walking;
            decision = Decision::StepOverride;
        }

        if label == MotionLabel::Walking {
            if let (Some(current), Some(standing)) =
                (evidence.current_azimuth_deg, evidence.standing_azimuth_deg)
            {
                let diff = (current - standing).abs();
                if diff < self.orientation_override_deg {
                    debug!("Orientation override: heading {:.1}° within {:.1}° of standing", current, diff);
                    label = MotionLabel::Standing;
                    decision = Decision::OrientationOverride;
                }
            }
        }

        Ok((label, decision))
    }

    /// Fuse and package the result for the display owner.
    pub fn decide(
        &self,
        scores: &[f32],
        evidence: &FusionEvidence,
        window_seq: u64,
        run_id: u64,
    ) -> WResult<FusionOutput> {
        let (label, decision) = self.fuse(scores, evidence)?;
        Ok(FusionOutput { label, color: label.color(), decision, window_seq, run_id })
    }
}
