use std::fmt;

use serde::{Deserialize, Serialize};

use crate::geodesy::{Ecef, Geodetic};

/// One ephemeris sample for one satellite, as seen from the observer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawObservation {
    pub position: Geodetic,
    pub azimuth_deg: f64,
    pub elevation_deg: f64,
    /// UTC epoch seconds
    pub timestamp: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SatelliteId {
    pub catalog_id: u32,
    pub name: String,
}

impl SatelliteId {
    pub fn new(catalog_id: u32, name: impl Into<String>) -> Self {
        Self {
            catalog_id,
            name: name.into(),
        }
    }
}

impl fmt::Display for SatelliteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.catalog_id)
    }
}

/// Metrics derived from two consecutive observations of one satellite,
/// tagged with the timestamp of the earlier one.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DerivedMetric {
    pub timestamp: i64,
    pub time_interval: i64,
    /// deg/s
    pub angular_velocity_az: f64,
    /// deg/s
    pub angular_velocity_el: f64,
    pub doppler_shift_hz: f64,
    pub slant_range_m: f64,
    pub time_delay_s: f64,
    pub visible: bool,
    /// dB-Hz, 0 below the horizon
    pub snr: f64,
    /// Observer-to-satellite, ECEF
    pub unit_vector: Ecef,
    pub sat_ecef: Ecef,
}
