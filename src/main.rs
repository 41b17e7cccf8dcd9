use anyhow::Result;
use chrono::Utc;
use clap::Parser;
use crossbeam::channel::Receiver;
use log::{info, warn};
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;

use walkstand_rs::display::{DisplayState, OutputSink};
use walkstand_rs::engine::{EngineEvent, TelemetryField};
use walkstand_rs::live_status::{self, LiveStatus};
use walkstand_rs::sensors::{self, Phase, SessionLog, SyntheticMotion, SyntheticSource};
use walkstand_rs::types::SensorSample;
use walkstand_rs::{
    DisplayColor, EngineConfig, FusionEngine, GyroEnergyClassifier, InferenceOutcome, InferenceWorker,
    MotionEngine,
};

#[derive(Parser, Debug)]
#[command(name = "walkstand")]
#[command(about = "Walking / standing detection from inertial and magnetic sensors", long_about = None)]
struct Args {
    /// Replay a recorded session log (.json or .json.gz) instead of synthetic data
    #[arg(long)]
    replay: Option<PathBuf>,

    /// Synthetic motion phases, in order
    #[arg(long, value_enum, value_delimiter = ',', default_value = "standing,walking,standing")]
    pattern: Vec<SyntheticMotion>,

    /// Seconds per synthetic phase
    #[arg(long, default_value = "10.0")]
    phase_secs: f64,

    /// Heading the synthetic device faces, degrees
    #[arg(long, default_value = "90.0")]
    heading: f64,

    /// Playback speed (1.0 = real time); omit to process as fast as possible
    #[arg(long, value_parser = parse_speed)]
    speed: Option<f64>,

    /// Engine configuration (JSON); flags below override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// Calibration window in seconds
    #[arg(long)]
    calibration_secs: Option<f64>,

    /// Steps per window above which the label is forced to Walking
    #[arg(long)]
    min_step_delta: Option<f64>,

    /// Heading change (degrees) that breaks orientation stability
    #[arg(long)]
    orientation_threshold: Option<f64>,

    /// Heading distance (degrees) under which Walking is overridden to Standing
    #[arg(long)]
    orientation_override: Option<f64>,

    /// Treat the device as having no accelerometer
    #[arg(long)]
    no_accelerometer: bool,

    /// Treat the device as having no step counter
    #[arg(long)]
    no_step_counter: bool,

    /// Save the synthetic stream as a session log (.json or .json.gz)
    #[arg(long)]
    record: Option<PathBuf>,

    /// Output directory for live status snapshots
    #[arg(long, default_value = "walkstand_sessions")]
    output_dir: String,
}

/// Terminal sink: prints label changes, logs everything else.
struct ConsoleSink {
    last_text: String,
}

impl OutputSink for ConsoleSink {
    fn on_prediction(&mut self, text: &str, color: DisplayColor) {
        if text != self.last_text {
            println!("[{}] {:<24} ({:?})", ts_now(), if text.is_empty() { "-" } else { text }, color);
            self.last_text = text.to_string();
        }
    }

    fn on_telemetry(&mut self, field: TelemetryField, text: &str) {
        log::trace!("{:?}: {}", field, text);
    }

    fn on_status(&mut self, text: &str) {
        println!("[{}] {}", ts_now(), text);
    }
}

fn parse_speed(text: &str) -> Result<f64, String> {
    let speed: f64 = text.parse().map_err(|e| format!("{e}"))?;
    if speed.is_finite() && speed > 0.0 {
        Ok(speed)
    } else {
        Err(format!("speed must be a positive number, got {speed}"))
    }
}

fn build_config(args: &Args) -> Result<EngineConfig> {
    let mut config = match &args.config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };
    if let Some(secs) = args.calibration_secs {
        config.calibration_duration_secs = secs;
    }
    if let Some(delta) = args.min_step_delta {
        config.min_step_delta = delta;
    }
    if let Some(deg) = args.orientation_threshold {
        config.orientation_threshold_deg = deg;
    }
    if let Some(deg) = args.orientation_override {
        config.orientation_override_deg = deg;
    }
    if args.no_accelerometer {
        config.sensors.accelerometer = false;
    }
    if args.no_step_counter {
        config.sensors.step_counter = false;
    }
    config.validate()?;
    Ok(config)
}

fn load_samples(args: &Args, config: &EngineConfig) -> Result<Vec<SensorSample>> {
    if let Some(path) = &args.replay {
        return sensors::load_log(path);
    }

    // Calibrate facing north, then run the requested pattern
    let mut phases = vec![Phase {
        motion: SyntheticMotion::Standing,
        duration_secs: config.calibration_duration_secs + 0.5,
        heading_deg: 0.0,
    }];
    phases.extend(args.pattern.iter().map(|&motion| Phase {
        motion,
        duration_secs: args.phase_secs,
        heading_deg: args.heading,
    }));
    let samples: Vec<SensorSample> = SyntheticSource::new(phases, 50.0, live_status::current_timestamp()).collect();

    if let Some(path) = &args.record {
        let log = SessionLog { started_at: Some(Utc::now().to_rfc3339()), samples: samples.clone() };
        sensors::save_log(path, &log)?;
        info!("Recorded {} samples to {}", samples.len(), path.display());
    }
    Ok(samples)
}

fn drain_outcomes(results: &Receiver<InferenceOutcome>, display: &mut DisplayState<ConsoleSink>) {
    while let Ok(outcome) = results.try_recv() {
        display.handle_outcome(&outcome);
    }
}

fn write_status(
    path: &Path,
    engine: &MotionEngine,
    worker: &InferenceWorker,
    display: &DisplayState<ConsoleSink>,
    started: f64,
) {
    let mut status = LiveStatus::new().with_engine(&engine.status());
    status.uptime_seconds = (status.timestamp - started).max(0.0) as u64;
    status.windows_dropped = worker.dropped();
    status.windows_classified = display.predictions();
    status.classification_failures = display.failures();
    status.stale_outputs = display.stale_outputs();
    status.last_label = display.last_label();
    status.display_color = display.color();
    if let Err(e) = status.save(path) {
        warn!("Failed to write {}: {}", path.display(), e);
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();
    let config = build_config(&args)?;

    println!("[{}] WalkStand Starting", ts_now());
    println!("  Source: {}", args.replay.as_ref().map_or("synthetic".to_string(), |p| p.display().to_string()));
    println!("  Calibration: {:.1} s", config.calibration_duration_secs);
    println!("  Output Dir: {}", args.output_dir);

    std::fs::create_dir_all(&args.output_dir)?;
    let status_path = PathBuf::from(&args.output_dir).join("live_status.json");
    let started = live_status::current_timestamp();

    let samples = load_samples(&args, &config)?;
    let Some(first_ts) = samples.first().map(SensorSample::timestamp) else {
        anyhow::bail!("sample source is empty");
    };

    let mut engine = MotionEngine::new(config.clone())?;
    let (mut worker, results) = InferenceWorker::spawn(
        Box::new(GyroEnergyClassifier::default()),
        FusionEngine::new(&config),
        config.inference_queue_depth,
    )?;
    let mut display = DisplayState::new(ConsoleSink { last_text: String::new() });

    for event in engine.sensor_availability() {
        display.handle_event(&event);
    }
    for event in engine.start_calibration(first_ts)? {
        display.handle_event(&event);
    }

    let (tx, mut rx) = mpsc::channel::<SensorSample>(500);
    let _pump_handle = tokio::spawn(sensors::pump(samples, tx, args.speed));

    let mut last_status_ts = first_ts;
    while let Some(sample) = rx.recv().await {
        for event in engine.feed(&sample) {
            match event {
                EngineEvent::WindowReady(job) => {
                    let (run_id, step_delta) = (job.run_id, job.evidence.step_delta);
                    if !worker.submit(job)? {
                        engine.restore_step_delta(run_id, step_delta);
                    }
                }
                EngineEvent::CalibrationComplete(_) => {
                    display.handle_event(&event);
                    let run_id = engine.start()?;
                    display.begin_run(run_id);
                }
                other => display.handle_event(&other),
            }
        }
        drain_outcomes(&results, &mut display);

        if sample.timestamp() - last_status_ts >= 2.0 {
            write_status(&status_path, &engine, &worker, &display, started);
            last_status_ts = sample.timestamp();
        }
    }

    // Let queued windows finish before closing the run
    worker.shutdown();
    drain_outcomes(&results, &mut display);
    if engine.is_running() {
        engine.stop()?;
    }
    display.end_run();

    let final_path = PathBuf::from(&args.output_dir).join("live_status_final.json");
    write_status(&final_path, &engine, &worker, &display, started);

    let status = engine.status();
    println!("\n=== Final Stats ===");
    println!("Samples: accel={} gyro={} mag={}", status.accel_samples, status.gyro_samples, status.mag_samples);
    println!(
        "Windows: dispatched={} classified={} dropped={} failed={}",
        status.windows_dispatched,
        display.predictions(),
        worker.dropped(),
        display.failures()
    );
    if let Some(steps) = status.steps_since_start {
        println!("Steps: {:.0}", steps);
    }
    println!("Status: {}", final_path.display());

    Ok(())
}

fn ts_now() -> String {
    Utc::now().format("%H:%M:%S").to_string()
}
