pub mod pacing;
pub mod runner;

pub use pacing::PacingPolicy;
pub use runner::{CycleReport, PollError, PollState, Scheduler};
