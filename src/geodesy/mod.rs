mod ecef;
mod types;

pub use ecef::{distance, line_of_sight, unit_line_of_sight, Ecef};
pub use types::Geodetic;
