use serde::{Deserialize, Serialize};

use super::ecef::{to_ecef, Ecef};

/// Latitude/longitude in degrees, altitude above the WGS84 ellipsoid in meters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Geodetic {
    pub latitude_deg: f64,
    pub longitude_deg: f64,
    pub altitude_m: f64,
}

impl Geodetic {
    pub fn new(latitude_deg: f64, longitude_deg: f64, altitude_m: f64) -> Self {
        Self {
            latitude_deg,
            longitude_deg,
            altitude_m,
        }
    }

    /// Parses `"lat, lon"` as written in the config file.
    pub fn from_coordinates(coordinates: &str, altitude_m: Option<f64>) -> Option<Self> {
        let parts: Vec<_> = coordinates.split(',').map(|s| s.trim()).collect();
        if parts.len() != 2 {
            return None;
        }
        let lat = parts[0].parse().ok()?;
        let lon = parts[1].parse().ok()?;
        Some(Self::new(lat, lon, altitude_m.unwrap_or(0.0)))
    }

    pub fn to_ecef(&self) -> Ecef {
        to_ecef(self.latitude_deg, self.longitude_deg, self.altitude_m)
    }
}
