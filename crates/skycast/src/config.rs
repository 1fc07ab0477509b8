use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::reading::DEFAULT_RETENTION;

/// Config file read when no path is given and it exists.
pub const DEFAULT_CONFIG_PATH: &str = "skycast.yaml";

/// Environment variable overriding `endpoint_url`.
pub const ENV_ENDPOINT_URL: &str = "SKYCAST_ENDPOINT_URL";

/// Environment variable overriding `history_path`.
pub const ENV_HISTORY_PATH: &str = "SKYCAST_HISTORY_PATH";

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config '{path}': {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Invalid config: {0}")]
    Invalid(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Station and forecaster configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Sensor endpoint returning `{"temp", "humidity", "pressure"}` JSON.
    pub endpoint_url: String,

    /// Station latitude, stored with every reading.
    pub latitude: f64,

    /// Station longitude, stored with every reading.
    pub longitude: f64,

    /// Seconds between fetch + forecast cycles.
    pub fetch_interval_secs: u64,

    /// Number of readings kept in the history file.
    pub retention_readings: usize,

    /// Width of the resample grid in minutes. Must divide 60.
    pub resample_interval_minutes: u32,

    /// Path to the CSV history file.
    pub history_path: PathBuf,

    /// Hours projected by the forecaster.
    pub horizon_hours: u32,

    /// HTTP timeout for the sensor request.
    pub request_timeout_secs: u64,

    /// Seasonal period of the smoothing model, in grid steps.
    /// Unset means one day of `resample_interval_minutes` steps.
    pub season_length: Option<usize>,

    /// Trend damping of the smoothing model, in (0, 1].
    pub trend_damping: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint_url: "http://weather-station.local:81/weather".to_string(),
            latitude: 54.6872,
            longitude: 25.2797,
            fetch_interval_secs: 600,
            retention_readings: DEFAULT_RETENTION,
            resample_interval_minutes: 10,
            history_path: PathBuf::from("weather_data.csv"),
            horizon_hours: 6,
            request_timeout_secs: 10,
            season_length: None,
            trend_damping: 1.0,
        }
    }
}

impl Config {
    /// Load configuration from a YAML file. Missing keys take defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        serde_yaml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    /// Load `path` if given, else `skycast.yaml` when present, else defaults;
    /// then apply env overrides and validate.
    pub fn resolve(path: Option<&Path>) -> Result<Self> {
        Self::resolve_with(path, Path::new(DEFAULT_CONFIG_PATH), |key| {
            std::env::var(key).ok()
        })
    }

    fn resolve_with(
        path: Option<&Path>,
        default_path: &Path,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let mut config = match path {
            Some(p) => Self::load(p)?,
            None if default_path.is_file() => {
                log::info!("Using config {}", default_path.display());
                Self::load(default_path)?
            }
            None => Self::default(),
        };
        config.apply_env_overrides(lookup);
        config.validate()?;
        Ok(config)
    }

    /// Override fields from the environment. `lookup` abstracts `std::env::var`.
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup(ENV_ENDPOINT_URL).filter(|v| !v.is_empty()) {
            log::info!("Endpoint overridden by {}: {}", ENV_ENDPOINT_URL, url);
            self.endpoint_url = url;
        }
        if let Some(path) = lookup(ENV_HISTORY_PATH).filter(|v| !v.is_empty()) {
            log::info!("History path overridden by {}: {}", ENV_HISTORY_PATH, path);
            self.history_path = PathBuf::from(path);
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.endpoint_url.starts_with("http://") || self.endpoint_url.starts_with("https://"))
        {
            return Err(ConfigError::Invalid(format!(
                "endpoint_url must be an http(s) URL, got '{}'",
                self.endpoint_url
            )));
        }
        if !(-90.0..=90.0).contains(&self.latitude) {
            return Err(ConfigError::Invalid(format!(
                "latitude out of range: {}",
                self.latitude
            )));
        }
        if !(-180.0..=180.0).contains(&self.longitude) {
            return Err(ConfigError::Invalid(format!(
                "longitude out of range: {}",
                self.longitude
            )));
        }
        if self.fetch_interval_secs == 0 {
            return Err(ConfigError::Invalid(
                "fetch_interval_secs must be positive".into(),
            ));
        }
        if self.retention_readings == 0 {
            return Err(ConfigError::Invalid(
                "retention_readings must be positive".into(),
            ));
        }
        let interval = self.resample_interval_minutes;
        if interval == 0 || interval > 60 || 60 % interval != 0 {
            return Err(ConfigError::Invalid(format!(
                "resample_interval_minutes must divide 60, got {}",
                interval
            )));
        }
        if self.horizon_hours == 0 {
            return Err(ConfigError::Invalid("horizon_hours must be at least 1".into()));
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "request_timeout_secs must be positive".into(),
            ));
        }
        if self.season_length == Some(0) {
            return Err(ConfigError::Invalid(
                "season_length must be positive when set".into(),
            ));
        }
        if !(self.trend_damping > 0.0 && self.trend_damping <= 1.0) {
            return Err(ConfigError::Invalid(format!(
                "trend_damping must be in (0, 1], got {}",
                self.trend_damping
            )));
        }
        Ok(())
    }

    /// Seasonal period in grid steps, one day unless overridden.
    pub fn season_steps(&self) -> usize {
        self.season_length.unwrap_or_else(|| {
            (24 * 60 / self.resample_interval_minutes.max(1)) as usize
        })
    }

    pub fn fetch_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.fetch_interval_secs)
    }

    pub fn request_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.request_timeout_secs)
    }
}
