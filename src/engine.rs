// engine.rs: owned motion-state engine
//
// Pure computation: no threads, no I/O, no clock. A sample pump pushes samples
// in arrival order and gets events back; full windows come out as jobs for the
// inference worker. Time is whatever the samples say it is, so recorded
// sessions replay exactly like live ones.

use log::{debug, info, warn};
use serde::Serialize;

use crate::calibration::{Biases, CalibrationSession, CalibrationState};
use crate::config::EngineConfig;
use crate::error::{WResult, WalkStandError};
use crate::filters::SensorFilterBank;
use crate::fusion::FusionEvidence;
use crate::location::LocationMonitor;
use crate::orientation::{OrientationState, OrientationTracker};
use crate::steps::StepTracker;
use crate::types::{
    magnitude, AccelData, GyroData, LocationData, MagData, SensorKind, SensorSample, StepData, Vec3,
};
use crate::window::SlidingWindow;
use crate::worker::WindowJob;

pub const CALIBRATE_PROMPT: &str = "Please calibrate your sensors";

/// Text lines the display keeps, one per field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum TelemetryField {
    Accelerometer,
    Gyroscope,
    Magnetometer,
    Orientation,
    Pedometer,
}

#[derive(Debug, Clone)]
pub enum EngineEvent {
    CalibrationStarted { at: f64 },
    CalibrationComplete(Biases),
    /// A full window, ready for the inference worker.
    WindowReady(WindowJob),
    Telemetry { field: TelemetryField, text: String },
    /// Status line for the prediction area.
    Status(String),
    /// Consecutive location fixes moved at least the configured distance.
    MovingViaLocation,
}

/// Snapshot of the engine for status reporting.
#[derive(Debug, Clone, Serialize)]
pub struct EngineStatus {
    pub calibration: CalibrationState,
    pub calibrated: bool,
    pub running: bool,
    pub run_id: u64,
    pub accel_samples: u64,
    pub gyro_samples: u64,
    pub mag_samples: u64,
    pub step_readings: u64,
    pub location_fixes: u64,
    pub windows_dispatched: u64,
    /// Filter updates skipped on a singular innovation covariance, all sensors.
    pub filter_skips: u64,
    pub steps_since_start: Option<f64>,
    pub azimuth_deg: Option<f64>,
    pub orientation: OrientationState,
    pub biases: Option<Biases>,
}

pub struct MotionEngine {
    config: EngineConfig,
    bank: SensorFilterBank,
    calibration: CalibrationSession,
    biases: Option<Biases>,
    orientation: OrientationTracker,
    steps: StepTracker,
    window: SlidingWindow,
    location: LocationMonitor,

    latest_accel: Option<Vec3>,
    latest_mag: Option<Vec3>,
    latest_gyro_magnitude: f32,

    running: bool,
    run_id: u64,
    window_seq: u64,
    prompted: bool,

    accel_samples: u64,
    gyro_samples: u64,
    mag_samples: u64,
    step_readings: u64,
    windows_dispatched: u64,
}

impl MotionEngine {
    pub fn new(config: EngineConfig) -> WResult<Self> {
        config.validate()?;
        Ok(Self {
            bank: SensorFilterBank::new(&config),
            calibration: CalibrationSession::new(config.calibration_duration_secs, config.gravity),
            biases: None,
            orientation: OrientationTracker::new(&config),
            steps: StepTracker::new(),
            window: SlidingWindow::new(config.window_size),
            location: LocationMonitor::new(config.location_movement_threshold_m),
            latest_accel: None,
            latest_mag: None,
            latest_gyro_magnitude: 0.0,
            running: false,
            run_id: 0,
            window_seq: 0,
            prompted: false,
            accel_samples: 0,
            gyro_samples: 0,
            mag_samples: 0,
            step_readings: 0,
            windows_dispatched: 0,
            config,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// "Not available" lines for sensors the platform lacks.
    pub fn sensor_availability(&self) -> Vec<EngineEvent> {
        let mut events = Vec::new();
        if !self.config.sensors.accelerometer {
            events.push(telemetry(TelemetryField::Accelerometer, "Accelerometer: Not available".to_string()));
        }
        if !self.config.sensors.step_counter {
            events.push(telemetry(TelemetryField::Pedometer, "Pedometer: Not available".to_string()));
        }
        events
    }

    // ─── Control ────────────────────────────────────────────────────────────

    /// Begin a calibration window at `now`. Until it completes every
    /// accel/gyro/mag sample goes to calibration only.
    pub fn start_calibration(&mut self, now: f64) -> WResult<Vec<EngineEvent>> {
        self.calibration.start(now)?;
        Ok(vec![EngineEvent::CalibrationStarted { at: now }])
    }

    /// Complete calibration if its window has elapsed at `now`.
    pub fn poll(&mut self, now: f64) -> Vec<EngineEvent> {
        let mut events = Vec::new();
        if self.calibration.is_due(now) {
            match self.calibration.finish() {
                Ok(biases) => {
                    self.biases = Some(biases);
                    self.prompted = false;
                    events.push(EngineEvent::CalibrationComplete(biases));
                }
                Err(e) => warn!("Calibration could not complete: {}", e),
            }
        }
        events
    }

    /// Start classifying. Returns the new run id.
    pub fn start(&mut self) -> WResult<u64> {
        if self.biases.is_none() {
            return Err(WalkStandError::NotCalibrated);
        }
        if self.running {
            return Err(WalkStandError::AlreadyRunning);
        }
        self.run_id += 1;
        self.window_seq = 0;
        self.window.reset();
        // Steps taken before the run must not count toward the first window
        self.steps.take_delta();
        self.running = true;
        info!("Run {} started", self.run_id);
        Ok(self.run_id)
    }

    pub fn stop(&mut self) -> WResult<()> {
        if !self.running {
            return Err(WalkStandError::NotRunning);
        }
        self.running = false;
        self.window.reset();
        self.location.reset();
        info!("Run {} stopped after {} windows", self.run_id, self.window_seq);
        Ok(())
    }

    /// Hand back the step delta of a window the worker never accepted.
    ///
    /// Only applies to the current run; a job from an earlier run carries
    /// steps that were already rebased away by `start`.
    pub fn restore_step_delta(&mut self, run_id: u64, step_delta: f64) {
        if run_id == self.run_id && step_delta > 0.0 {
            debug!("Window dropped, returning {} steps", step_delta);
            self.steps.restore_delta(step_delta);
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn is_calibrated(&self) -> bool {
        self.biases.is_some()
    }

    pub fn biases(&self) -> Option<Biases> {
        self.biases
    }

    pub fn status(&self) -> EngineStatus {
        EngineStatus {
            calibration: self.calibration.state(),
            calibrated: self.is_calibrated(),
            running: self.running,
            run_id: self.run_id,
            accel_samples: self.accel_samples,
            gyro_samples: self.gyro_samples,
            mag_samples: self.mag_samples,
            step_readings: self.step_readings,
            location_fixes: self.location.fixes(),
            windows_dispatched: self.windows_dispatched,
            filter_skips: [SensorKind::Accelerometer, SensorKind::Gyroscope, SensorKind::Magnetometer]
                .into_iter()
                .map(|kind| self.bank.filter(kind).singular_skips())
                .sum(),
            steps_since_start: self.steps.steps_since_start(),
            azimuth_deg: self.orientation.current_azimuth(),
            orientation: self.orientation.state(),
            biases: self.biases,
        }
    }

    // ─── Sample intake ──────────────────────────────────────────────────────

    pub fn feed(&mut self, sample: &SensorSample) -> Vec<EngineEvent> {
        match sample {
            SensorSample::Accel(s) => self.feed_accel(s),
            SensorSample::Gyro(s) => self.feed_gyro(s),
            SensorSample::Mag(s) => self.feed_mag(s),
            SensorSample::Steps(s) => self.feed_steps(s),
            SensorSample::Location(s) => self.feed_location(s),
        }
    }

    pub fn feed_accel(&mut self, accel: &AccelData) -> Vec<EngineEvent> {
        if !self.config.sensors.accelerometer {
            return Vec::new();
        }
        self.accel_samples += 1;
        let (mut events, biases) = match self.intake(SensorKind::Accelerometer, &accel.vector(), accel.timestamp) {
            Intake::Consumed(events) => return events,
            Intake::Process(events, biases) => (events, biases),
        };

        let calibrated = biases.apply(SensorKind::Accelerometer, &accel.vector());
        let filtered = self.bank.update(SensorKind::Accelerometer, &calibrated);
        events.push(telemetry(
            TelemetryField::Accelerometer,
            format!("Accelerometer Filtered: x={:.2}, y={:.2}, z={:.2}", filtered.x, filtered.y, filtered.z),
        ));
        self.latest_accel = Some(filtered);

        events.extend(self.update_orientation(accel.timestamp));
        events
    }

    pub fn feed_gyro(&mut self, gyro: &GyroData) -> Vec<EngineEvent> {
        self.gyro_samples += 1;
        let (mut events, biases) = match self.intake(SensorKind::Gyroscope, &gyro.vector(), gyro.timestamp) {
            Intake::Consumed(events) => return events,
            Intake::Process(events, biases) => (events, biases),
        };

        let calibrated = biases.apply(SensorKind::Gyroscope, &gyro.vector());
        let filtered = self.bank.update(SensorKind::Gyroscope, &calibrated);
        self.latest_gyro_magnitude = magnitude(&filtered) as f32;
        events.push(telemetry(
            TelemetryField::Gyroscope,
            format!("Gyroscope Filtered: x={:.2}, y={:.2}, z={:.2}", filtered.x, filtered.y, filtered.z),
        ));
        events
    }

    pub fn feed_mag(&mut self, mag: &MagData) -> Vec<EngineEvent> {
        self.mag_samples += 1;
        let (mut events, biases) = match self.intake(SensorKind::Magnetometer, &mag.vector(), mag.timestamp) {
            Intake::Consumed(events) => return events,
            Intake::Process(events, biases) => (events, biases),
        };

        let calibrated = biases.apply(SensorKind::Magnetometer, &mag.vector());
        let filtered = self.bank.update(SensorKind::Magnetometer, &calibrated);
        events.push(telemetry(
            TelemetryField::Magnetometer,
            format!("Magnetometer Filtered: x={:.2}, y={:.2}, z={:.2}", filtered.x, filtered.y, filtered.z),
        ));
        self.latest_mag = Some(filtered);

        if self.running {
            if let Some(features) = self.window.push(magnitude(&filtered) as f32, self.latest_gyro_magnitude) {
                events.push(EngineEvent::WindowReady(self.dispatch(features)));
            }
        }

        events.extend(self.update_orientation(mag.timestamp));
        events
    }

    pub fn feed_steps(&mut self, steps: &StepData) -> Vec<EngineEvent> {
        if !self.config.sensors.step_counter {
            return Vec::new();
        }
        let mut events = self.poll(steps.timestamp);
        if self.calibration.is_collecting() {
            return events;
        }
        if !self.is_calibrated() {
            events.extend(self.prompt());
            return events;
        }

        self.step_readings += 1;
        self.steps.record(steps.steps);
        if let Some(total) = self.steps.steps_since_start() {
            events.push(telemetry(TelemetryField::Pedometer, format!("Pedometer: {:.0} steps", total)));
        }
        events
    }

    pub fn feed_location(&mut self, fix: &LocationData) -> Vec<EngineEvent> {
        let mut events = self.poll(fix.timestamp);
        if !self.running {
            return events;
        }
        if self.location.update(fix) {
            events.push(EngineEvent::MovingViaLocation);
        }
        events
    }

    // ─── Internals ──────────────────────────────────────────────────────────

    /// Common front half of every triple sample: calibration bookkeeping and
    /// the calibrated gate.
    fn intake(&mut self, kind: SensorKind, raw: &Vec3, timestamp: f64) -> Intake {
        let mut events = self.poll(timestamp);
        if self.calibration.is_collecting() {
            self.calibration.push(kind, *raw);
            return Intake::Consumed(events);
        }
        match self.biases {
            Some(biases) => Intake::Process(events, biases),
            None => {
                events.extend(self.prompt());
                Intake::Consumed(events)
            }
        }
    }

    fn prompt(&mut self) -> Option<EngineEvent> {
        if self.prompted {
            return None;
        }
        self.prompted = true;
        Some(EngineEvent::Status(CALIBRATE_PROMPT.to_string()))
    }

    fn dispatch(&mut self, features: Vec<f32>) -> WindowJob {
        let evidence = FusionEvidence {
            step_delta: self.steps.take_delta(),
            current_azimuth_deg: self.orientation.current_azimuth(),
            standing_azimuth_deg: self.orientation.standing_azimuth(),
        };
        let job = WindowJob { features, evidence, window_seq: self.window_seq, run_id: self.run_id };
        debug!("Window {} ready (step delta {})", self.window_seq, evidence.step_delta);
        self.window_seq += 1;
        self.windows_dispatched += 1;
        job
    }

    fn update_orientation(&mut self, now: f64) -> Option<EngineEvent> {
        let (accel, mag) = (self.latest_accel?, self.latest_mag?);
        let azimuth = self.orientation.update(&accel, &mag, now)?;
        Some(telemetry(TelemetryField::Orientation, format!("Orientation (Azimuth): {:.2}°", azimuth)))
    }
}

enum Intake {
    Consumed(Vec<EngineEvent>),
    Process(Vec<EngineEvent>, Biases),
}

fn telemetry(field: TelemetryField, text: String) -> EngineEvent {
    EngineEvent::Telemetry { field, text }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::STANDARD_GRAVITY;
    use approx::assert_relative_eq;

    const DT: f64 = 0.02;

    fn engine() -> MotionEngine {
        MotionEngine::new(EngineConfig::default()).unwrap()
    }

    /// Mag offset seen during calibration, removed again by the bias.
    const MAG_OFFSET: (f64, f64, f64) = (1.0, 2.0, 3.0);

    fn feed_still(engine: &mut MotionEngine, t: f64, mag: (f64, f64, f64)) -> Vec<EngineEvent> {
        let mut events = engine.feed_accel(&AccelData::new(0.05, -0.02, 9.85, t));
        events.extend(engine.feed_gyro(&GyroData::new(0.01, 0.0, -0.01, t)));
        events.extend(engine.feed_mag(&MagData::new(mag.0, mag.1, mag.2, t)));
        events
    }

    /// Level, still device facing north once the offset is removed.
    fn feed_level_still(engine: &mut MotionEngine, t: f64) -> Vec<EngineEvent> {
        let (ox, oy, oz) = MAG_OFFSET;
        feed_still(engine, t, (ox, oy + 22.0, oz - 40.0))
    }

    /// Calibrate on a level, still device over the default 5 s window.
    fn calibrated() -> MotionEngine {
        let mut engine = engine();
        engine.start_calibration(0.0).unwrap();
        let mut t = 0.0;
        while engine.status().calibration == CalibrationState::Collecting {
            feed_still(&mut engine, t, MAG_OFFSET);
            t += DT;
        }
        engine
    }

    fn jobs(events: &[EngineEvent]) -> Vec<&WindowJob> {
        events
            .iter()
            .filter_map(|e| match e {
                EngineEvent::WindowReady(job) => Some(job),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_uncalibrated_prompts_once() {
        let mut engine = engine();
        let events = feed_level_still(&mut engine, 0.0);
        let prompts = events
            .iter()
            .filter(|e| matches!(e, EngineEvent::Status(s) if s == CALIBRATE_PROMPT))
            .count();
        assert_eq!(prompts, 1);
        assert_eq!(engine.start(), Err(WalkStandError::NotCalibrated));
    }

    #[test]
    fn test_calibration_completes_on_sample_time() {
        let mut engine = engine();
        engine.start_calibration(10.0).unwrap();
        assert!(engine.feed_accel(&AccelData::new(0.1, 0.0, 9.9, 10.0)).is_empty());
        engine.feed_mag(&MagData::new(20.0, 0.0, -40.0, 12.0));
        assert!(!engine.is_calibrated());

        let events = engine.feed_gyro(&GyroData::new(0.0, 0.0, 0.0, 15.0));
        let biases = events
            .iter()
            .find_map(|e| match e {
                EngineEvent::CalibrationComplete(b) => Some(*b),
                _ => None,
            })
            .unwrap();
        assert_relative_eq!(biases.accel.x, 0.1);
        assert_relative_eq!(biases.accel.z, 9.9 - STANDARD_GRAVITY, epsilon = 1e-12);
        assert_relative_eq!(biases.mag.x, 20.0);
        // No gyro sample was collected before the deadline
        assert_eq!(biases.gyro, Vec3::zeros());
        // The triggering sample is processed normally
        assert!(events.iter().any(|e| matches!(e, EngineEvent::Telemetry { field: TelemetryField::Gyroscope, .. })));
    }

    #[test]
    fn test_poll_completes_without_samples() {
        let mut engine = engine();
        engine.start_calibration(0.0).unwrap();
        assert!(engine.poll(4.0).is_empty());
        assert!(matches!(engine.poll(5.0).as_slice(), [EngineEvent::CalibrationComplete(_)]));
        assert!(engine.is_calibrated());
    }

    #[test]
    fn test_recalibration_rejected_while_collecting() {
        let mut engine = engine();
        engine.start_calibration(0.0).unwrap();
        assert!(matches!(engine.start_calibration(1.0), Err(WalkStandError::CalibrationInProgress)));
    }

    #[test]
    fn test_no_windows_until_started() {
        let mut engine = calibrated();
        let t0 = 6.0;
        let mut events = Vec::new();
        for i in 0..150 {
            events.extend(feed_level_still(&mut engine, t0 + i as f64 * DT));
        }
        assert!(jobs(&events).is_empty());
        assert!(events.iter().any(|e| matches!(e, EngineEvent::Telemetry { field: TelemetryField::Orientation, .. })));
    }

    #[test]
    fn test_window_dispatch_every_hundred_mag_samples() {
        let mut engine = calibrated();
        let run = engine.start().unwrap();
        assert_eq!(engine.start(), Err(WalkStandError::AlreadyRunning));

        let mut events = Vec::new();
        for i in 0..250 {
            events.extend(feed_level_still(&mut engine, 6.0 + i as f64 * DT));
        }
        let dispatched = jobs(&events);
        assert_eq!(dispatched.len(), 2);
        assert_eq!(dispatched[0].window_seq, 0);
        assert_eq!(dispatched[1].window_seq, 1);
        assert!(dispatched.iter().all(|j| j.run_id == run && j.features.len() == 200));
        assert_eq!(engine.status().windows_dispatched, 2);
    }

    #[test]
    fn test_evidence_snapshot_at_dispatch() {
        let mut engine = calibrated();
        engine.feed_steps(&StepData { timestamp: 5.5, steps: 500.0 });
        engine.start().unwrap();
        engine.feed_steps(&StepData { timestamp: 6.0, steps: 504.0 });

        let mut events = Vec::new();
        for i in 0..100 {
            events.extend(feed_level_still(&mut engine, 6.0 + i as f64 * DT));
        }
        let job = jobs(&events)[0].clone();
        assert_eq!(job.evidence.step_delta, 4.0);
        assert!(job.evidence.current_azimuth_deg.is_some());
        // Held still for two seconds: the heading latched
        assert!(job.evidence.standing_azimuth_deg.is_some());

        // Delta was consumed by the first window
        let mut events = Vec::new();
        for i in 100..200 {
            events.extend(feed_level_still(&mut engine, 6.0 + i as f64 * DT));
        }
        assert_eq!(jobs(&events)[0].evidence.step_delta, 0.0);
    }

    #[test]
    fn test_dropped_window_returns_its_steps() {
        let mut engine = calibrated();
        engine.start().unwrap();
        engine.feed_steps(&StepData { timestamp: 6.0, steps: 100.0 });
        engine.feed_steps(&StepData { timestamp: 6.1, steps: 105.0 });

        let mut events = Vec::new();
        for i in 0..100 {
            events.extend(feed_level_still(&mut engine, 6.0 + i as f64 * DT));
        }
        let dropped = jobs(&events)[0].clone();
        assert_eq!(dropped.evidence.step_delta, 5.0);
        // Worker queue was full
        engine.restore_step_delta(dropped.run_id, dropped.evidence.step_delta);

        engine.feed_steps(&StepData { timestamp: 8.1, steps: 106.0 });
        let mut events = Vec::new();
        for i in 100..200 {
            events.extend(feed_level_still(&mut engine, 6.0 + i as f64 * DT));
        }
        assert_eq!(jobs(&events)[0].evidence.step_delta, 6.0);
    }

    #[test]
    fn test_stale_run_delta_not_restored() {
        let mut engine = calibrated();
        engine.start().unwrap();
        engine.feed_steps(&StepData { timestamp: 6.0, steps: 10.0 });
        engine.feed_steps(&StepData { timestamp: 6.1, steps: 14.0 });
        let mut events = Vec::new();
        for i in 0..100 {
            events.extend(feed_level_still(&mut engine, 6.0 + i as f64 * DT));
        }
        let old = jobs(&events)[0].clone();
        engine.stop().unwrap();
        engine.start().unwrap();
        engine.restore_step_delta(old.run_id, old.evidence.step_delta);

        let mut events = Vec::new();
        for i in 100..200 {
            events.extend(feed_level_still(&mut engine, 6.0 + i as f64 * DT));
        }
        assert_eq!(jobs(&events)[0].evidence.step_delta, 0.0);
    }

    #[test]
    fn test_steps_before_start_do_not_count() {
        let mut engine = calibrated();
        engine.feed_steps(&StepData { timestamp: 5.5, steps: 10.0 });
        engine.feed_steps(&StepData { timestamp: 5.6, steps: 30.0 });
        engine.start().unwrap();

        let mut events = Vec::new();
        for i in 0..100 {
            events.extend(feed_level_still(&mut engine, 6.0 + i as f64 * DT));
        }
        assert_eq!(jobs(&events)[0].evidence.step_delta, 0.0);
        assert_eq!(engine.status().steps_since_start, Some(20.0));
    }

    #[test]
    fn test_stop_resets_window_and_bumps_run() {
        let mut engine = calibrated();
        let first = engine.start().unwrap();
        for i in 0..60 {
            feed_level_still(&mut engine, 6.0 + i as f64 * DT);
        }
        engine.stop().unwrap();
        assert_eq!(engine.stop(), Err(WalkStandError::NotRunning));

        let second = engine.start().unwrap();
        assert_eq!(second, first + 1);
        let mut events = Vec::new();
        for i in 0..99 {
            events.extend(feed_level_still(&mut engine, 8.0 + i as f64 * DT));
        }
        // Partial window from the first run was discarded
        assert!(jobs(&events).is_empty());
    }

    #[test]
    fn test_missing_sensors() {
        let mut config = EngineConfig::default();
        config.sensors.accelerometer = false;
        config.sensors.step_counter = false;
        let mut engine = MotionEngine::new(config).unwrap();

        let lines: Vec<String> = engine
            .sensor_availability()
            .into_iter()
            .filter_map(|e| match e {
                EngineEvent::Telemetry { text, .. } => Some(text),
                _ => None,
            })
            .collect();
        assert_eq!(lines, vec!["Accelerometer: Not available", "Pedometer: Not available"]);

        assert!(engine.feed_accel(&AccelData::new(0.0, 0.0, 9.8, 0.0)).is_empty());
        assert!(engine.feed_steps(&StepData { timestamp: 0.0, steps: 3.0 }).is_empty());
        assert_eq!(engine.status().accel_samples, 0);
    }

    #[test]
    fn test_no_orientation_without_accelerometer() {
        let mut config = EngineConfig::default();
        config.sensors.accelerometer = false;
        let mut engine = MotionEngine::new(config).unwrap();
        engine.start_calibration(0.0).unwrap();
        engine.poll(5.0);
        engine.start().unwrap();

        let mut events = Vec::new();
        for i in 0..100 {
            events.extend(engine.feed_mag(&MagData::new(0.0, 22.0, -40.0, 5.0 + i as f64 * DT)));
        }
        let job = jobs(&events)[0];
        assert_eq!(job.evidence.current_azimuth_deg, None);
        assert_eq!(job.evidence.standing_azimuth_deg, None);
    }

    #[test]
    fn test_location_movement_only_while_running() {
        let mut engine = calibrated();
        let fix = |t: f64, lat: f64| LocationData { timestamp: t, latitude: lat, longitude: 0.0, accuracy: 3.0 };
        engine.feed_location(&fix(6.0, 10.0));
        assert!(engine.feed_location(&fix(7.0, 10.001)).is_empty());

        engine.start().unwrap();
        engine.feed_location(&fix(8.0, 10.0));
        let events = engine.feed_location(&fix(9.0, 10.001));
        assert!(matches!(events.as_slice(), [EngineEvent::MovingViaLocation]));
    }

    #[test]
    fn test_pedometer_telemetry() {
        let mut engine = calibrated();
        engine.feed_steps(&StepData { timestamp: 6.0, steps: 1000.0 });
        let events = engine.feed_steps(&StepData { timestamp: 6.5, steps: 1007.0 });
        match events.as_slice() {
            [EngineEvent::Telemetry { field: TelemetryField::Pedometer, text }] => {
                assert_eq!(text, "Pedometer: 7 steps")
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = EngineConfig { window_size: 0, ..Default::default() };
        assert!(matches!(MotionEngine::new(config), Err(WalkStandError::InvalidParameters(_))));
    }
}
