use crate::geodesy::{distance, unit_line_of_sight, Geodetic};

use super::snr::LinkBudget;
use super::types::{DerivedMetric, RawObservation};

pub const SPEED_OF_LIGHT_M_S: f64 = 299_792_458.0;
pub const GPS_L1_HZ: f64 = 1_575.42e6;

/// Signed angular rate in deg/s. The difference is wrapped into (-180, 180]
/// first, so crossing 0/360 never produces a near-full-turn jump.
/// Callers guarantee `dt_s > 0`.
pub fn angular_velocity(angle1_deg: f64, angle2_deg: f64, dt_s: f64) -> f64 {
    let mut diff = (angle2_deg - angle1_deg).rem_euclid(360.0);
    if diff > 180.0 {
        diff -= 360.0;
    }
    diff / dt_s
}

/// Doppler shift in Hz from the range rate between two samples.
/// A receding satellite (growing range) yields a negative shift.
pub fn doppler_shift(range1_m: f64, range2_m: f64, dt_s: f64, carrier_hz: f64) -> f64 {
    let range_rate = (range2_m - range1_m) / dt_s;
    -range_rate * carrier_hz / SPEED_OF_LIGHT_M_S
}

pub fn slant_range(satellite: &Geodetic, observer: &Geodetic) -> f64 {
    distance(satellite.to_ecef(), observer.to_ecef())
}

/// One-way propagation delay in seconds.
pub fn time_delay(range_m: f64) -> f64 {
    range_m / SPEED_OF_LIGHT_M_S
}

pub fn is_visible(elevation_deg: f64) -> bool {
    elevation_deg > 0.0
}

/// Turns raw observation pairs into [`DerivedMetric`] records for one observer.
#[derive(Debug, Clone, Copy)]
pub struct MetricEngine {
    observer: Geodetic,
    carrier_hz: f64,
    link: LinkBudget,
}

impl MetricEngine {
    pub fn new(observer: Geodetic) -> Self {
        Self {
            observer,
            carrier_hz: GPS_L1_HZ,
            link: LinkBudget::default(),
        }
    }

    pub fn with_carrier(mut self, carrier_hz: f64) -> Self {
        self.carrier_hz = carrier_hz;
        self
    }

    pub fn with_link_budget(mut self, link: LinkBudget) -> Self {
        self.link = link;
        self
    }

    pub fn observer(&self) -> &Geodetic {
        &self.observer
    }

    /// One record per consecutive pair, in input order.
    ///
    /// Pairs with a non-positive interval are dropped, as are pairs that start
    /// before the last emitted record, so the output is always in
    /// non-decreasing timestamp order.
    pub fn derive(&self, observations: &[RawObservation]) -> Vec<DerivedMetric> {
        let mut metrics = Vec::with_capacity(observations.len().saturating_sub(1));
        let mut last_timestamp: Option<i64> = None;

        for pair in observations.windows(2) {
            let (first, second) = (&pair[0], &pair[1]);
            let dt = second.timestamp - first.timestamp;
            if dt <= 0 {
                continue;
            }
            if last_timestamp.is_some_and(|t| first.timestamp < t) {
                continue;
            }

            metrics.push(self.derive_pair(first, second, dt));
            last_timestamp = Some(first.timestamp);
        }

        metrics
    }

    fn derive_pair(&self, first: &RawObservation, second: &RawObservation, dt: i64) -> DerivedMetric {
        let dt_s = dt as f64;
        let range1 = slant_range(&first.position, &self.observer);
        let range2 = slant_range(&second.position, &self.observer);

        DerivedMetric {
            timestamp: first.timestamp,
            time_interval: dt,
            angular_velocity_az: angular_velocity(first.azimuth_deg, second.azimuth_deg, dt_s),
            angular_velocity_el: angular_velocity(first.elevation_deg, second.elevation_deg, dt_s),
            doppler_shift_hz: doppler_shift(range1, range2, dt_s, self.carrier_hz),
            slant_range_m: range1,
            time_delay_s: time_delay(range1),
            visible: is_visible(first.elevation_deg),
            snr: self
                .link
                .snr_db_hz(first.elevation_deg, self.carrier_hz, range1),
            unit_vector: unit_line_of_sight(&first.position, &self.observer),
            sat_ecef: first.position.to_ecef(),
        }
    }
}
