//! Fixtures shared by unit tests.

use crate::geodesy::Geodetic;
use crate::store::SatelliteSeries;
use crate::telemetry::{DerivedMetric, RawObservation, SatelliteId};

pub fn metric(timestamp: i64) -> DerivedMetric {
    DerivedMetric {
        timestamp,
        time_interval: 1,
        angular_velocity_az: 0.0,
        angular_velocity_el: 0.0,
        doppler_shift_hz: 0.0,
        slant_range_m: 1_000_000.0,
        time_delay_s: 0.0033,
        visible: true,
        snr: 60.0,
        unit_vector: [1.0, 0.0, 0.0],
        sat_ecef: [7_378_137.0, 0.0, 0.0],
    }
}

pub fn series(catalog_id: u32, name: &str, stamps: impl IntoIterator<Item = i64>) -> SatelliteSeries {
    SatelliteSeries::from_metrics(
        SatelliteId::new(catalog_id, name),
        300,
        stamps.into_iter().map(metric),
    )
}

/// A straight pass over the observer, one sample per second.
pub fn pass(start: i64, samples: usize) -> Vec<RawObservation> {
    (0..samples)
        .map(|i| RawObservation {
            position: Geodetic::new(10.0 + i as f64 * 0.05, -70.0, 500_000.0),
            azimuth_deg: (350.0 + i as f64).rem_euclid(360.0),
            elevation_deg: 20.0 + i as f64 * 0.1,
            timestamp: start + i as i64,
        })
        .collect()
}
