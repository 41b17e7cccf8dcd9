//! Sample sources: recorded session logs and a synthetic generator, plus the
//! async pump that feeds either one into a channel.

use anyhow::Context;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::f64::consts::PI;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use tokio::sync::mpsc::Sender;
use tokio::time::{sleep, Duration};

use crate::config::STANDARD_GRAVITY;
use crate::types::{AccelData, GyroData, LocationData, MagData, SensorSample, StepData};

// ─── Session logs ────────────────────────────────────────────────────────────

#[derive(Serialize, Deserialize, Default)]
pub struct SessionLog {
    #[serde(default)]
    pub started_at: Option<String>,
    pub samples: Vec<SensorSample>,
}

fn is_gzip(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some("gz")
}

/// Load a `.json` or `.json.gz` session log, ordered by timestamp.
pub fn load_log(path: &Path) -> anyhow::Result<Vec<SensorSample>> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let log: SessionLog = if is_gzip(path) {
        serde_json::from_reader(BufReader::new(GzDecoder::new(file)))?
    } else {
        serde_json::from_reader(BufReader::new(file))?
    };

    let mut samples = log.samples;
    samples.sort_by(|a, b| a.timestamp().total_cmp(&b.timestamp()));
    info!("Loaded {} samples from {}", samples.len(), path.display());
    Ok(samples)
}

pub fn save_log(path: &Path, log: &SessionLog) -> anyhow::Result<()> {
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    if is_gzip(path) {
        let mut encoder = GzEncoder::new(BufWriter::new(file), Compression::default());
        serde_json::to_writer(&mut encoder, log)?;
        encoder.finish()?.flush()?;
    } else {
        let mut writer = BufWriter::new(file);
        serde_json::to_writer(&mut writer, log)?;
        writer.flush()?;
    }
    Ok(())
}

// ─── Synthetic source ────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum SyntheticMotion {
    Standing,
    Walking,
}

/// One phase of a synthetic scenario.
#[derive(Clone, Copy, Debug)]
pub struct Phase {
    pub motion: SyntheticMotion,
    pub duration_secs: f64,
    /// Compass heading the device faces, degrees.
    pub heading_deg: f64,
}

const HORIZONTAL_FIELD_UT: f64 = 22.0;
const VERTICAL_FIELD_UT: f64 = -40.0;
const STEP_HZ: f64 = 1.8;
const WALK_SPEED_MPS: f64 = 1.3;
const METRES_PER_DEG_LAT: f64 = 111_195.0;

/// Deterministic sensor stream for a level phone held by a person who
/// alternates between standing and walking.
///
/// Accelerometer, gyroscope and magnetometer tick at `rate_hz`; the step
/// counter reports once per second and location every three seconds.
pub struct SyntheticSource {
    phases: Vec<Phase>,
    rate_hz: f64,
    t0: f64,
    tick: u64,
    steps: f64,
    latitude: f64,
    longitude: f64,
    pending: VecDeque<SensorSample>,
}

impl SyntheticSource {
    pub fn new(phases: Vec<Phase>, rate_hz: f64, t0: f64) -> Self {
        Self {
            phases,
            rate_hz,
            t0,
            tick: 0,
            steps: 5_000.0,
            latitude: 37.7749,
            longitude: -122.4194,
            pending: VecDeque::new(),
        }
    }

    pub fn total_duration(&self) -> f64 {
        self.phases.iter().map(|p| p.duration_secs).sum()
    }

    fn phase_at(&self, elapsed: f64) -> Option<Phase> {
        let mut end = 0.0;
        for phase in &self.phases {
            end += phase.duration_secs;
            if elapsed < end {
                return Some(*phase);
            }
        }
        None
    }

    fn generate_tick(&mut self) -> bool {
        let dt = 1.0 / self.rate_hz;
        let elapsed = self.tick as f64 * dt;
        let Some(phase) = self.phase_at(elapsed) else {
            return false;
        };
        let t = self.t0 + elapsed;
        let walking = phase.motion == SyntheticMotion::Walking;

        // Small sensor jitter, different per axis
        let jitter = |f: f64| 0.02 * (elapsed * f * 2.0 * PI).sin();

        let (bounce, sway, rate) = if walking {
            let step_phase = elapsed * STEP_HZ * 2.0 * PI;
            (2.5 * step_phase.sin(), 1.2 * (step_phase / 2.0).sin(), 1.4 * (step_phase / 2.0).cos())
        } else {
            (0.0, 0.0, 0.0)
        };

        // Walking swings the heading well past the stability band
        let heading = if walking {
            phase.heading_deg + 35.0 * (elapsed * 0.5 * 2.0 * PI).sin()
        } else {
            phase.heading_deg
        }
        .to_radians();

        self.pending.push_back(SensorSample::Accel(AccelData::new(
            sway + jitter(3.1),
            0.4 * bounce + jitter(2.3),
            STANDARD_GRAVITY + bounce + jitter(1.7),
            t,
        )));
        self.pending.push_back(SensorSample::Gyro(GyroData::new(
            0.6 * rate + jitter(4.3),
            0.3 * rate + jitter(3.7),
            rate + jitter(2.9),
            t,
        )));
        self.pending.push_back(SensorSample::Mag(MagData::new(
            -HORIZONTAL_FIELD_UT * heading.sin() + 10.0 * jitter(1.3),
            HORIZONTAL_FIELD_UT * heading.cos() + 10.0 * jitter(1.9),
            VERTICAL_FIELD_UT + 10.0 * jitter(0.7),
            t,
        )));

        if walking {
            self.steps += STEP_HZ * dt;
            self.latitude += WALK_SPEED_MPS * dt / METRES_PER_DEG_LAT;
        }

        let ticks_per_sec = self.rate_hz.round().max(1.0) as u64;
        if self.tick % ticks_per_sec == 0 {
            self.pending.push_back(SensorSample::Steps(StepData { timestamp: t, steps: self.steps.floor() }));
        }
        if self.tick % (3 * ticks_per_sec) == 0 {
            self.pending.push_back(SensorSample::Location(LocationData {
                timestamp: t,
                latitude: self.latitude,
                longitude: self.longitude,
                accuracy: 4.0,
            }));
        }

        self.tick += 1;
        true
    }
}

impl Iterator for SyntheticSource {
    type Item = SensorSample;

    fn next(&mut self) -> Option<SensorSample> {
        if self.pending.is_empty() && !self.generate_tick() {
            return None;
        }
        self.pending.pop_front()
    }
}

// ─── Pump ────────────────────────────────────────────────────────────────────

/// Push samples into the channel in order.
///
/// With `speed` set, sleeps between samples to reproduce their timestamps
/// (`1.0` = real time); otherwise sends as fast as the receiver drains.
pub async fn pump<I>(samples: I, tx: Sender<SensorSample>, speed: Option<f64>)
where
    I: IntoIterator<Item = SensorSample>,
{
    let mut sample_count = 0u64;
    let mut last_ts: Option<f64> = None;

    for sample in samples {
        if let (Some(speed), Some(prev)) = (speed, last_ts) {
            let gap = (sample.timestamp() - prev) / speed;
            if gap > 0.0 && gap.is_finite() {
                sleep(Duration::from_secs_f64(gap)).await;
            }
        }
        last_ts = Some(sample.timestamp());

        if tx.send(sample).await.is_err() {
            debug!("[pump] Channel closed after {} samples", sample_count);
            return;
        }
        sample_count += 1;
        if sample_count % 5_000 == 0 {
            debug!("[pump] {} samples", sample_count);
        }
    }
    info!("[pump] Source exhausted after {} samples", sample_count);
}
