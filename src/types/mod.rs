pub mod linalg;

pub use linalg::*;

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AccelData {
    pub timestamp: f64,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GyroData {
    pub timestamp: f64,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MagData {
    pub timestamp: f64,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// Cumulative step count as reported by the platform pedometer.
///
/// The counter is monotonically non-decreasing since device boot, so only
/// differences between two readings carry meaning.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StepData {
    pub timestamp: f64,
    pub steps: f64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LocationData {
    pub timestamp: f64,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub accuracy: f64,
}

macro_rules! impl_triple {
    ($($ty:ident),*) => {
        $(
            impl $ty {
                pub fn new(x: f64, y: f64, z: f64, timestamp: f64) -> Self {
                    Self { timestamp, x, y, z }
                }

                pub fn vector(&self) -> Vec3 {
                    Vec3::new(self.x, self.y, self.z)
                }
            }
        )*
    };
}

impl_triple!(AccelData, GyroData, MagData);

/// Which three-axis sensor a triple came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SensorKind {
    Accelerometer,
    Gyroscope,
    Magnetometer,
}

impl SensorKind {
    pub fn label(self) -> &'static str {
        match self {
            SensorKind::Accelerometer => "Accelerometer",
            SensorKind::Gyroscope => "Gyroscope",
            SensorKind::Magnetometer => "Magnetometer",
        }
    }
}

/// One sample as delivered by a sensor source, in arrival order.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SensorSample {
    Accel(AccelData),
    Gyro(GyroData),
    Mag(MagData),
    Steps(StepData),
    Location(LocationData),
}

impl SensorSample {
    pub fn timestamp(&self) -> f64 {
        match self {
            SensorSample::Accel(s) => s.timestamp,
            SensorSample::Gyro(s) => s.timestamp,
            SensorSample::Mag(s) => s.timestamp,
            SensorSample::Steps(s) => s.timestamp,
            SensorSample::Location(s) => s.timestamp,
        }
    }
}
