use log::debug;

use crate::types::LocationData;

const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Great-circle distance in metres between two WGS84 coordinates.
pub fn haversine_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lon = (lon2 - lon1).to_radians();
    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).max(0.0).sqrt());
    EARTH_RADIUS_M * c
}

/// Flags movement between consecutive location fixes.
///
/// Purely informational: the verdict goes to the display, never into fusion.
#[derive(Debug, Clone)]
pub struct LocationMonitor {
    threshold_m: f64,
    last_fix: Option<LocationData>,
    fixes: u64,
}

impl LocationMonitor {
    pub fn new(threshold_m: f64) -> Self {
        Self { threshold_m, last_fix: None, fixes: 0 }
    }

    /// Record a fix; true when it lies at least the threshold away from the
    /// previous one. The first fix never counts as movement.
    pub fn update(&mut self, fix: &LocationData) -> bool {
        self.fixes += 1;
        let moving = match &self.last_fix {
            Some(prev) => {
                let distance = haversine_distance(prev.latitude, prev.longitude, fix.latitude, fix.longitude);
                debug!("Location moved {:.2} m", distance);
                distance >= self.threshold_m
            }
            None => false,
        };
        self.last_fix = Some(fix.clone());
        moving
    }

    pub fn fixes(&self) -> u64 {
        self.fixes
    }

    pub fn reset(&mut self) {
        self.last_fix = None;
    }
}
