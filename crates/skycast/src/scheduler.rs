//! Fetch + forecast loop.
//!
//! One cycle runs at a time: fetch a reading and append it, then forecast
//! from the stored history and print the report. Both the cycle and the wait
//! that follows race the shutdown channel, so Ctrl+C ends the loop promptly.
//! History writes are synchronous and atomic, so a cancelled cycle never
//! leaves a partial file behind.

use chrono::Local;
use std::time::Duration;
use tokio::sync::watch;

use crate::config::Config;
use crate::fetcher::{FetchError, Fetcher, HttpSensor, SensorSource};
use crate::forecast::{ExponentialSmoothing, Forecast, ForecastError, ForecastModel, Forecaster};
use crate::reading::Reading;
use crate::report;
use crate::store::{HistoryStore, StoreError};

/// Failures that abort a single cycle. Logged by the loop, never fatal.
#[derive(Debug, thiserror::Error)]
pub enum CycleError {
    #[error("history error: {0}")]
    Store(#[from] StoreError),

    #[error("forecast error: {0}")]
    Forecast(#[from] ForecastError),
}

pub type Result<T> = std::result::Result<T, CycleError>;

/// What one cycle produced.
#[derive(Debug, Default)]
pub struct CycleOutcome {
    /// `None` when the fetch failed.
    pub reading: Option<Reading>,
    /// `None` when there was no history or not enough of it.
    pub forecast: Option<Forecast>,
}

/// Everything a cycle needs: sensor, store and forecaster.
pub struct Station<S, M = ExponentialSmoothing> {
    pub fetcher: Fetcher<S>,
    pub store: HistoryStore,
    pub forecaster: Forecaster<M>,
    pub horizon_hours: u32,
}

impl Station<HttpSensor, ExponentialSmoothing> {
    pub fn from_config(config: &Config) -> std::result::Result<Self, FetchError> {
        Ok(Self {
            fetcher: Fetcher::new(
                HttpSensor::from_config(config)?,
                config.latitude,
                config.longitude,
            ),
            store: HistoryStore::new(config.history_path.clone(), config.retention_readings),
            forecaster: Forecaster::from_config(config),
            horizon_hours: config.horizon_hours,
        })
    }
}

impl<S: SensorSource, M: ForecastModel> Station<S, M> {
    /// Fetch and store one reading. Failures are logged and swallowed.
    pub async fn fetch(&self) -> Option<Reading> {
        match self.fetcher.fetch_and_store(&self.store).await {
            Ok((reading, total)) => {
                println!(
                    "✓ Fetched: {:.1}°C, {:.1}%, {:.1}hPa (total: {} readings)",
                    reading.temp, reading.humidity, reading.pressure, total
                );
                Some(reading)
            }
            Err(e) => {
                log::warn!("Fetch failed: {}", e);
                println!("❌ Fetch failed: {}", e);
                None
            }
        }
    }

    /// Forecast from stored history.
    ///
    /// Absent history and insufficient data are reported and yield `Ok(None)`.
    pub fn forecast(&self) -> Result<Option<Forecast>> {
        if !self.store.exists() {
            println!("❌ No history yet!");
            return Ok(None);
        }
        let readings = self.store.load_all()?;
        match self.forecaster.forecast(&readings, self.horizon_hours) {
            Ok(forecast) => Ok(Some(forecast)),
            Err(e) if e.is_insufficient_data() => {
                log::info!("Skipping forecast: {}", e);
                println!("⚠️ {}", e);
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// One fetch + forecast cycle.
    pub async fn run_cycle(&self) -> Result<CycleOutcome> {
        println!("[{}]", Local::now().format("%Y-%m-%d %H:%M:%S"));
        let reading = self.fetch().await;
        let forecast = self.forecast()?;
        if let Some(f) = &forecast {
            println!("{}", report::render_table(f));
        }
        Ok(CycleOutcome { reading, forecast })
    }
}

/// Run cycles every `interval` until `shutdown` fires.
///
/// Returns the number of cycles that ran to completion (successful or not).
pub async fn run_loop<S: SensorSource, M: ForecastModel>(
    station: &Station<S, M>,
    interval: Duration,
    mut shutdown: watch::Receiver<()>,
) -> usize {
    let every = report::describe_interval(interval);
    let mut cycles = 0;

    loop {
        tokio::select! {
            biased;
            _ = shutdown.changed() => break,
            result = station.run_cycle() => {
                cycles += 1;
                match result {
                    Ok(_) => println!("\n⏳ Next update in {}...\n", every),
                    Err(e) => {
                        log::error!("Cycle failed: {}", e);
                        println!("⚠️ Error: {}\nRetrying in {}...", e, every);
                    }
                }
            }
        }

        tokio::select! {
            biased;
            _ = shutdown.changed() => break,
            _ = tokio::time::sleep(interval) => {}
        }
    }

    log::info!("Run loop stopped after {} cycles", cycles);
    println!("\n👋 Stopped!");
    cycles
}
