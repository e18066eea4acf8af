use serde::Deserialize;

use super::derive::SPEED_OF_LIGHT_M_S;

pub const BOLTZMANN_J_K: f64 = 1.380_649e-23;

const ATMOSPHERE_KNEE_DEG: f64 = 10.0;
const ATMOSPHERE_FLAT_LOSS_DB: f64 = 2.0;
const ATMOSPHERE_SLOPE_DB_PER_DEG: f64 = 0.5;

/// Receiver and transmitter assumptions for the SNR estimate.
///
/// This is an illustrative link budget, not a validated one: free-space path
/// loss, a crude low-elevation atmospheric penalty and a thermal noise floor.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct LinkBudget {
    pub noise_temp_k: f64,
    pub bandwidth_hz: f64,
    pub eirp_dbw: f64,
    pub antenna_gain_dbi: f64,
}

impl Default for LinkBudget {
    fn default() -> Self {
        Self {
            noise_temp_k: 290.0,
            bandwidth_hz: 1e6,
            eirp_dbw: 50.0,
            antenna_gain_dbi: 30.0,
        }
    }
}

impl LinkBudget {
    /// SNR in dB-Hz. Exactly 0 when the satellite is at or below the horizon.
    pub fn snr_db_hz(&self, elevation_deg: f64, frequency_hz: f64, slant_range_m: f64) -> f64 {
        if elevation_deg <= 0.0 {
            return 0.0;
        }

        let wavelength = SPEED_OF_LIGHT_M_S / frequency_hz;
        let fspl_db = 20.0 * (4.0 * std::f64::consts::PI * slant_range_m / wavelength).log10();

        let atmospheric_loss_db = if elevation_deg > ATMOSPHERE_KNEE_DEG {
            ATMOSPHERE_FLAT_LOSS_DB
        } else {
            ATMOSPHERE_FLAT_LOSS_DB
                + (ATMOSPHERE_KNEE_DEG - elevation_deg) * ATMOSPHERE_SLOPE_DB_PER_DEG
        };

        let gain_loss_db = (10.0 * elevation_deg.to_radians().sin().log10()).max(0.0);

        let received_dbw = self.eirp_dbw + self.antenna_gain_dbi - fspl_db - atmospheric_loss_db
            + gain_loss_db;
        let noise_dbw = 10.0 * (BOLTZMANN_J_K * self.noise_temp_k * self.bandwidth_hz).log10();

        received_dbw - noise_dbw
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::GPS_L1_HZ;

    fn estimate_snr(elevation_deg: f64, frequency_hz: f64, slant_range_m: f64) -> f64 {
        LinkBudget::default().snr_db_hz(elevation_deg, frequency_hz, slant_range_m)
    }

    #[test]
    fn test_snr_zero_at_and_below_horizon() {
        for elevation in [0.0, -0.001, -5.0, -90.0] {
            for range in [1.0, 500_000.0, 40_000_000.0] {
                assert_eq!(estimate_snr(elevation, GPS_L1_HZ, range), 0.0);
            }
        }
        let loud = LinkBudget {
            eirp_dbw: 90.0,
            ..LinkBudget::default()
        };
        assert_eq!(loud.snr_db_hz(0.0, 2.2e9, 1_000.0), 0.0);
    }

    #[test]
    fn test_snr_pinned_values() {
        assert!((estimate_snr(45.0, GPS_L1_HZ, 1_000_000.0) - 65.579_476_881_372_27).abs() < 1e-9);
        assert!((estimate_snr(90.0, GPS_L1_HZ, 500_000.0) - 71.600_076_794_651_9).abs() < 1e-9);
        // below the atmospheric knee
        assert!((estimate_snr(5.0, GPS_L1_HZ, 2_000_000.0) - 57.058_876_968_092_65).abs() < 1e-9);
    }

    #[test]
    fn test_snr_flat_above_knee() {
        let at_knee = estimate_snr(10.0, GPS_L1_HZ, 1_000_000.0);
        let above = estimate_snr(45.0, GPS_L1_HZ, 1_000_000.0);
        assert!((at_knee - above).abs() < 1e-12);
    }

    #[test]
    fn test_snr_drops_with_range() {
        let near = estimate_snr(30.0, GPS_L1_HZ, 1_000_000.0);
        let far = estimate_snr(30.0, GPS_L1_HZ, 2_000_000.0);
        // doubling the distance costs 20*log10(2) dB of path loss
        assert!((near - far - 20.0 * 2f64.log10()).abs() < 1e-9);
    }
}
