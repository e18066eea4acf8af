use serde::{Deserialize, Deserializer};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::fetch::{DEFAULT_BASE_URL, MAX_WINDOW_SECONDS};
use crate::geodesy::Geodetic;
use crate::telemetry::{LinkBudget, MetricField, GPS_L1_HZ};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid observer coordinates {0:?}, expected \"lat, lon\"")]
    Coordinates(String),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// ISS, HST, TERRA and AQUA first, then a mix of weather and navigation birds.
const DEFAULT_SATELLITES: [u32; 36] = [
    25544, 20580, 25994, 27424, 62339, 28474, 40294, 43873, 35752, 39741, 32711, 40730, 40105,
    41019, 48859, 29601, 24876, 46826, 32260, 27663, 28874, 44506, 28190, 26360, 64202, 26407,
    45854, 38833, 36585, 40534, 39166, 55268, 32384, 39533, 29486, 41328,
];

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub observer: ObserverConfig,
    pub api: ApiConfig,
    pub window_seconds: u32,
    pub satellites: Vec<u32>,
    pub carrier_frequency_hz: f64,
    pub link_budget: LinkBudget,
    pub show: Vec<MetricField>,
    pub dashboard: DashboardConfig,
    pub archive: ArchiveConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ObserverConfig {
    pub coordinates: String,
    pub altitude_m: f64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub key: Option<String>,
    pub base_url: String,
    #[serde(deserialize_with = "deserialize_duration")]
    pub timeout: Duration,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    #[serde(deserialize_with = "deserialize_duration")]
    pub refresh: Duration,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ArchiveConfig {
    pub enabled: bool,
    pub folder: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub folder: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            observer: ObserverConfig::default(),
            api: ApiConfig::default(),
            window_seconds: MAX_WINDOW_SECONDS,
            satellites: DEFAULT_SATELLITES.to_vec(),
            carrier_frequency_hz: GPS_L1_HZ,
            link_budget: LinkBudget::default(),
            show: MetricField::ALL.to_vec(),
            dashboard: DashboardConfig::default(),
            archive: ArchiveConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for ObserverConfig {
    fn default() -> Self {
        Self {
            coordinates: "40.0, -74.0".to_string(),
            altitude_m: 0.0,
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            refresh: Duration::from_secs(1),
        }
    }
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            folder: PathBuf::from("data"),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            folder: PathBuf::from("logs"),
        }
    }
}

fn deserialize_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    humantime::parse_duration(s.trim()).map_err(serde::de::Error::custom)
}

impl Config {
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_yaml::from_str(content)?;
        Ok(config)
    }

    pub fn observer_position(&self) -> Result<Geodetic, ConfigError> {
        Geodetic::from_coordinates(&self.observer.coordinates, Some(self.observer.altitude_m))
            .ok_or_else(|| ConfigError::Coordinates(self.observer.coordinates.clone()))
    }

    pub fn set_observer_position(&mut self, position: Geodetic) {
        self.observer.coordinates = format!("{}, {}", position.latitude_deg, position.longitude_deg);
        self.observer.altitude_m = position.altitude_m;
    }

    /// The API key, with surrounding whitespace removed. Required for polling.
    pub fn api_key(&self) -> Result<&str, ConfigError> {
        self.api
            .key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or_else(|| {
                ConfigError::Invalid(
                    "api.key is required (or pass --api-key / set N2YO_API_KEY)".to_string(),
                )
            })
    }

    /// Checks everything except the API key, which only `run` needs.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(2..=MAX_WINDOW_SECONDS).contains(&self.window_seconds) {
            return Err(ConfigError::Invalid(format!(
                "window_seconds must be between 2 and {}, got {}",
                MAX_WINDOW_SECONDS, self.window_seconds
            )));
        }
        if self.satellites.is_empty() {
            return Err(ConfigError::Invalid("satellites must not be empty".to_string()));
        }
        if !(self.carrier_frequency_hz.is_finite() && self.carrier_frequency_hz > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "carrier_frequency_hz must be positive, got {}",
                self.carrier_frequency_hz
            )));
        }
        if self.dashboard.refresh.is_zero() {
            return Err(ConfigError::Invalid("dashboard.refresh must be non-zero".to_string()));
        }

        let position = self.observer_position()?;
        if !(-90.0..=90.0).contains(&position.latitude_deg) {
            return Err(ConfigError::Invalid(format!(
                "latitude must be within [-90, 90], got {}",
                position.latitude_deg
            )));
        }
        if !(-180.0..=180.0).contains(&position.longitude_deg) {
            return Err(ConfigError::Invalid(format!(
                "longitude must be within [-180, 180], got {}",
                position.longitude_deg
            )));
        }
        Ok(())
    }
}
