use log::warn;

use crate::config::EngineConfig;
use crate::filters::vector_kalman::VectorKalmanFilter;
use crate::types::{SensorKind, Vec3, AXIS_DIM};

/// Noise retuning applied per axis before each update.
#[derive(Clone, Copy, Debug)]
enum AdaptiveRule {
    None,
    /// Raise process noise on axes whose raw value exceeds the threshold.
    ProcessNoise { threshold: f64, calm: f64, dynamic: f64 },
    /// Raise measurement noise on axes whose raw value exceeds the threshold.
    MeasurementNoise { threshold: f64, calm: f64, dynamic: f64 },
}

struct Channel {
    filter: VectorKalmanFilter,
    rule: AdaptiveRule,
}

impl Channel {
    fn update(&mut self, kind: SensorKind, raw: &Vec3) -> Vec3 {
        for axis in 0..AXIS_DIM {
            let large = raw[axis].abs() > self.threshold();
            match self.rule {
                AdaptiveRule::None => {}
                AdaptiveRule::ProcessNoise { calm, dynamic, .. } => {
                    self.filter.set_process_noise_axis(axis, if large { dynamic } else { calm });
                }
                AdaptiveRule::MeasurementNoise { calm, dynamic, .. } => {
                    self.filter
                        .set_measurement_noise_axis(axis, if large { dynamic } else { calm });
                }
            }
        }

        match self.filter.update(raw) {
            Ok(x) => x,
            Err(e) => {
                warn!("{} filter update skipped: {}", kind.label(), e);
                self.filter.state()
            }
        }
    }

    fn threshold(&self) -> f64 {
        match self.rule {
            AdaptiveRule::None => f64::INFINITY,
            AdaptiveRule::ProcessNoise { threshold, .. }
            | AdaptiveRule::MeasurementNoise { threshold, .. } => threshold,
        }
    }
}

/// One diagonal three-axis Kalman filter per sensor.
pub struct SensorFilterBank {
    accel: Channel,
    gyro: Channel,
    mag: Channel,
}

impl SensorFilterBank {
    pub fn new(config: &EngineConfig) -> Self {
        let (accel_rule, gyro_rule) = if config.adaptive_noise {
            (
                AdaptiveRule::ProcessNoise {
                    threshold: config.accel_dynamic_threshold,
                    calm: config.accel_q,
                    dynamic: config.accel_dynamic_q,
                },
                AdaptiveRule::MeasurementNoise {
                    threshold: config.gyro_dynamic_threshold,
                    calm: config.gyro_r,
                    dynamic: config.gyro_dynamic_r,
                },
            )
        } else {
            (AdaptiveRule::None, AdaptiveRule::None)
        };

        Self {
            accel: Channel {
                filter: VectorKalmanFilter::diagonal(config.accel_q, config.accel_r),
                rule: accel_rule,
            },
            gyro: Channel {
                filter: VectorKalmanFilter::diagonal(config.gyro_q, config.gyro_r),
                rule: gyro_rule,
            },
            mag: Channel {
                filter: VectorKalmanFilter::diagonal(config.mag_q, config.mag_r),
                rule: AdaptiveRule::None,
            },
        }
    }

    /// Filter a calibrated sample; a skipped update returns the prior estimate.
    pub fn update(&mut self, kind: SensorKind, calibrated: &Vec3) -> Vec3 {
        match kind {
            SensorKind::Accelerometer => self.accel.update(kind, calibrated),
            SensorKind::Gyroscope => self.gyro.update(kind, calibrated),
            SensorKind::Magnetometer => self.mag.update(kind, calibrated),
        }
    }

    pub fn filter(&self, kind: SensorKind) -> &VectorKalmanFilter {
        match kind {
            SensorKind::Accelerometer => &self.accel.filter,
            SensorKind::Gyroscope => &self.gyro.filter,
            SensorKind::Magnetometer => &self.mag.filter,
        }
    }
}
