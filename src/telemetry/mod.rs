mod derive;
mod field;
mod snr;
mod types;

pub use derive::{MetricEngine, GPS_L1_HZ};
pub use field::MetricField;
pub use snr::LinkBudget;
pub use types::{DerivedMetric, RawObservation, SatelliteId};
