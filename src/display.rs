//! Single owner of what the user sees.
//!
//! Engine events and worker outcomes both end up here, on one thread, so the
//! label, colour and telemetry lines have exactly one writer.

use log::{debug, info};
use std::collections::BTreeMap;

use crate::engine::{EngineEvent, TelemetryField};
use crate::fusion::{DisplayColor, MotionLabel};
use crate::worker::InferenceOutcome;

pub const WALKING_VIA_LOCATION: &str = "Walking (via location)";

/// Where display updates go (terminal, UI bridge, test recorder).
pub trait OutputSink {
    fn on_prediction(&mut self, text: &str, color: DisplayColor);
    fn on_telemetry(&mut self, field: TelemetryField, text: &str);
    fn on_status(&mut self, text: &str);
}

pub struct DisplayState<S: OutputSink> {
    sink: S,
    active_run: Option<u64>,
    text: String,
    color: DisplayColor,
    last_label: Option<MotionLabel>,
    telemetry: BTreeMap<TelemetryField, String>,
    predictions: u64,
    stale: u64,
    failures: u64,
}

impl<S: OutputSink> DisplayState<S> {
    pub fn new(sink: S) -> Self {
        Self {
            sink,
            active_run: None,
            text: String::new(),
            color: DisplayColor::White,
            last_label: None,
            telemetry: BTreeMap::new(),
            predictions: 0,
            stale: 0,
            failures: 0,
        }
    }

    pub fn begin_run(&mut self, run_id: u64) {
        self.active_run = Some(run_id);
        self.last_label = None;
    }

    /// Back to idle: white frame, empty prediction text.
    pub fn end_run(&mut self) {
        self.active_run = None;
        self.set_prediction(String::new(), DisplayColor::White);
    }

    pub fn handle_event(&mut self, event: &EngineEvent) {
        match event {
            EngineEvent::Telemetry { field, text } => {
                self.sink.on_telemetry(*field, text);
                self.telemetry.insert(*field, text.clone());
            }
            EngineEvent::Status(text) => {
                self.text = text.clone();
                self.sink.on_status(text);
            }
            EngineEvent::CalibrationStarted { .. } => self.sink.on_status("Calibrating..."),
            EngineEvent::CalibrationComplete(_) => self.sink.on_status("Calibration complete"),
            EngineEvent::MovingViaLocation => {
                if self.active_run.is_some() {
                    self.set_prediction(WALKING_VIA_LOCATION.to_string(), DisplayColor::Green);
                }
            }
            EngineEvent::WindowReady(_) => {}
        }
    }

    /// Apply a worker outcome. Returns false for outcomes of a run that is no
    /// longer active.
    pub fn handle_outcome(&mut self, outcome: &InferenceOutcome) -> bool {
        if self.active_run != Some(outcome.run_id()) {
            self.stale += 1;
            debug!("Ignoring outcome from run {}", outcome.run_id());
            return false;
        }

        match outcome {
            InferenceOutcome::Output(output) => {
                self.predictions += 1;
                if self.last_label != Some(output.label) {
                    info!("Motion state: {} (window {}, {:?})", output.label, output.window_seq, output.decision);
                }
                self.last_label = Some(output.label);
                self.set_prediction(output.label.to_string(), output.color);
            }
            InferenceOutcome::Failed { .. } => self.failures += 1,
        }
        true
    }

    fn set_prediction(&mut self, text: String, color: DisplayColor) {
        self.sink.on_prediction(&text, color);
        self.text = text;
        self.color = color;
    }

    pub fn color(&self) -> DisplayColor {
        self.color
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn last_label(&self) -> Option<MotionLabel> {
        self.last_label
    }

    pub fn telemetry(&self, field: TelemetryField) -> Option<&str> {
        self.telemetry.get(&field).map(String::as_str)
    }

    pub fn predictions(&self) -> u64 {
        self.predictions
    }

    pub fn stale_outputs(&self) -> u64 {
        self.stale
    }

    pub fn failures(&self) -> u64 {
        self.failures
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }
}
