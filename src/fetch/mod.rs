mod error;
mod n2yo;

use std::future::Future;

use crate::geodesy::Geodetic;
use crate::telemetry::{RawObservation, SatelliteId};

pub use error::FetchError;
pub use n2yo::{N2yoClient, DEFAULT_BASE_URL, MAX_WINDOW_SECONDS};

/// One upstream answer: a window of positions for one satellite.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchedPass {
    pub id: SatelliteId,
    pub observations: Vec<RawObservation>,
    pub quota_used: Option<u32>,
}

/// Supplies raw satellite positions as seen from an observer.
pub trait PositionSource: Send + Sync {
    fn fetch(
        &self,
        catalog_id: u32,
        observer: &Geodetic,
        seconds: u32,
    ) -> impl Future<Output = Result<FetchedPass, FetchError>> + Send;
}
