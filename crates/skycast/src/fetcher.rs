//! Sensor endpoint client.
//!
//! Fetches one `{"temp", "humidity", "pressure"}` sample, stamps it with the
//! local time and station location, and appends it to the history store.

use chrono::{Local, NaiveDateTime, SubsecRound};
use serde::Deserialize;
use std::time::Duration;

use crate::config::Config;
use crate::reading::Reading;
use crate::store::{HistoryStore, StoreError};

/// Errors from a fetch attempt. All are non-fatal to the run loop.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected status {0}")]
    Status(u16),

    #[error("malformed body: {0}")]
    Body(String),

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

pub type Result<T> = std::result::Result<T, FetchError>;

/// Raw body returned by the sensor endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct SensorSample {
    pub temp: f64,
    pub humidity: f64,
    pub pressure: f64,
}

impl SensorSample {
    /// Parse and sanity-check an endpoint body.
    pub fn parse(body: &str) -> Result<Self> {
        let sample: SensorSample =
            serde_json::from_str(body).map_err(|e| FetchError::Body(e.to_string()))?;
        if !(sample.temp.is_finite() && sample.humidity.is_finite() && sample.pressure.is_finite())
        {
            return Err(FetchError::Body("non-finite sensor value".into()));
        }
        Ok(sample)
    }
}

/// Source of sensor samples.
#[async_trait::async_trait]
pub trait SensorSource: Send + Sync {
    async fn sample(&self) -> Result<SensorSample>;
}

/// HTTP GET against the weather-station endpoint.
pub struct HttpSensor {
    client: reqwest::Client,
    url: String,
}

impl HttpSensor {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(config.endpoint_url.clone(), config.request_timeout())
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait::async_trait]
impl SensorSource for HttpSensor {
    async fn sample(&self) -> Result<SensorSample> {
        log::debug!("Connecting to {}", self.url);
        let response = self.client.get(&self.url).send().await?;
        let status = response.status();
        let body = response.text().await?;
        log::debug!(
            "Status {}, raw response: {}",
            status.as_u16(),
            body.chars().take(100).collect::<String>()
        );

        if status != reqwest::StatusCode::OK {
            return Err(FetchError::Status(status.as_u16()));
        }
        SensorSample::parse(&body)
    }
}

/// Turns sensor samples into stored readings.
pub struct Fetcher<S> {
    source: S,
    latitude: f64,
    longitude: f64,
}

impl<S: SensorSource> Fetcher<S> {
    pub fn new(source: S, latitude: f64, longitude: f64) -> Self {
        Self {
            source,
            latitude,
            longitude,
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Enrich a sample into a reading stamped at `time`.
    pub fn enrich(&self, sample: SensorSample, time: NaiveDateTime) -> Reading {
        Reading::new(
            time,
            sample.temp,
            sample.humidity,
            sample.pressure,
            self.latitude,
            self.longitude,
        )
    }

    /// Fetch one sample and append it to `store`.
    ///
    /// Returns the stored reading and the history length afterwards.
    pub async fn fetch_and_store(&self, store: &HistoryStore) -> Result<(Reading, usize)> {
        let sample = self.source.sample().await?;
        // the history file keeps microsecond precision
        let now = Local::now().naive_local().trunc_subsecs(6);
        let reading = self.enrich(sample, now);
        let total = store.append(reading.clone())?;
        log::info!(
            "Fetched {:.1}°C, {:.1}%, {:.1} hPa (total {} readings)",
            reading.temp,
            reading.humidity,
            reading.pressure,
            total
        );
        Ok((reading, total))
    }
}
