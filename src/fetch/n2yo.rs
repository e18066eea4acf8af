use std::time::Duration;

use serde::Deserialize;

use super::{FetchError, FetchedPass, PositionSource};
use crate::geodesy::Geodetic;
use crate::telemetry::{RawObservation, SatelliteId};

pub const DEFAULT_BASE_URL: &str = "https://api.n2yo.com/rest/v1/satellite";
/// Upper bound the positions endpoint accepts per request.
pub const MAX_WINDOW_SECONDS: u32 = 300;

/// Client for the N2YO "positions" endpoint.
pub struct N2yoClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl N2yoClient {
    pub fn new(base_url: &str, api_key: &str, timeout: Duration) -> Result<Self, FetchError> {
        if api_key.trim().is_empty() {
            return Err(FetchError::MissingApiKey);
        }
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }

    fn positions_path(&self, catalog_id: u32, observer: &Geodetic, seconds: u32) -> String {
        format!(
            "{}/positions/{}/{}/{}/{}/{}/",
            self.base_url,
            catalog_id,
            observer.latitude_deg,
            observer.longitude_deg,
            observer.altitude_m,
            seconds.min(MAX_WINDOW_SECONDS),
        )
    }
}

impl PositionSource for N2yoClient {
    async fn fetch(
        &self,
        catalog_id: u32,
        observer: &Geodetic,
        seconds: u32,
    ) -> Result<FetchedPass, FetchError> {
        let path = self.positions_path(catalog_id, observer, seconds);
        log::debug!("GET {}", path);

        // reqwest errors carry the request URL, which holds the key
        let response = self
            .http
            .get(format!("{}&apiKey={}", path, self.api_key))
            .send()
            .await
            .map_err(|e| FetchError::Http(e.without_url()))?;

        if !response.status().is_success() {
            return Err(FetchError::Status(response.status()));
        }

        let body = response
            .text()
            .await
            .map_err(|e| FetchError::Http(e.without_url()))?;
        parse_positions(&body)
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Envelope {
    Positions(PositionsResponse),
    Error { error: String },
}

#[derive(Debug, Deserialize)]
struct PositionsResponse {
    info: PositionsInfo,
    #[serde(default)]
    positions: Vec<Position>,
}

#[derive(Debug, Deserialize)]
struct PositionsInfo {
    satname: String,
    satid: u32,
    transactionscount: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct Position {
    satlatitude: f64,
    satlongitude: f64,
    /// km
    sataltitude: f64,
    azimuth: f64,
    elevation: f64,
    timestamp: i64,
}

impl From<Position> for RawObservation {
    fn from(p: Position) -> Self {
        RawObservation {
            position: Geodetic::new(p.satlatitude, p.satlongitude, p.sataltitude * 1000.0),
            azimuth_deg: p.azimuth,
            elevation_deg: p.elevation,
            timestamp: p.timestamp,
        }
    }
}

fn parse_positions(body: &str) -> Result<FetchedPass, FetchError> {
    match serde_json::from_str::<Envelope>(body)? {
        Envelope::Error { error } => Err(FetchError::Api(error)),
        Envelope::Positions(response) => Ok(FetchedPass {
            id: SatelliteId::new(response.info.satid, response.info.satname.trim()),
            observations: response.positions.into_iter().map(Into::into).collect(),
            quota_used: response.info.transactionscount,
        }),
    }
}
