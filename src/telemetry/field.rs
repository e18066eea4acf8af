use chrono::DateTime;
use serde::{Deserialize, Serialize};

use super::types::DerivedMetric;

/// A derived-metric column the dashboard can show.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum, strum_macros::Display,
)]
#[serde(rename_all = "snake_case")]
#[value(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum MetricField {
    Visible,
    AngularVelocityAz,
    AngularVelocityEl,
    DopplerShiftHz,
    SlantRangeM,
    TimeDelayS,
    Snr,
    UnitVector,
    Timestamp,
}

impl MetricField {
    pub const ALL: [MetricField; 9] = [
        MetricField::Visible,
        MetricField::AngularVelocityAz,
        MetricField::AngularVelocityEl,
        MetricField::DopplerShiftHz,
        MetricField::SlantRangeM,
        MetricField::TimeDelayS,
        MetricField::Snr,
        MetricField::UnitVector,
        MetricField::Timestamp,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            MetricField::Visible => "Visible",
            MetricField::AngularVelocityAz => "Az vel",
            MetricField::AngularVelocityEl => "El vel",
            MetricField::DopplerShiftHz => "Doppler",
            MetricField::SlantRangeM => "Range",
            MetricField::TimeDelayS => "Delay",
            MetricField::Snr => "SNR",
            MetricField::UnitVector => "VectorTo",
            MetricField::Timestamp => "Timestamp",
        }
    }

    pub fn format(&self, metric: &DerivedMetric) -> String {
        match self {
            MetricField::Visible => metric.visible.to_string(),
            MetricField::AngularVelocityAz => format!("{:.2} °/s", metric.angular_velocity_az),
            MetricField::AngularVelocityEl => format!("{:.2} °/s", metric.angular_velocity_el),
            MetricField::DopplerShiftHz => format!("{:.0} Hz", metric.doppler_shift_hz),
            MetricField::SlantRangeM => format!("{:.0} m", metric.slant_range_m),
            MetricField::TimeDelayS => format!("{:.6} s", metric.time_delay_s),
            MetricField::Snr => format!("{:.0} dB-Hz", metric.snr),
            MetricField::UnitVector => {
                let [x, y, z] = metric.unit_vector;
                format!("{:.1}|{:.1}|{:.1}", x, y, z)
            }
            MetricField::Timestamp => DateTime::from_timestamp(metric.timestamp, 0)
                .map(|t| t.format("%H:%M:%S").to_string())
                .unwrap_or_else(|| "-".to_string()),
        }
    }
}
