//! Skycast - sensor-polling weather forecaster
//!
//! Polls a weather-station endpoint for temperature, humidity and pressure,
//! keeps a rolling CSV history, and produces a short-horizon forecast that
//! combines exponential smoothing with a rule-based condition classifier.
//!
//! # Architecture
//!
//! ```text
//! sensor endpoint ──► Fetcher ──► HistoryStore (CSV, rolling 1008 rows)
//!                                      │
//!                                      ▼
//!                 Forecaster: resample ─► fit/predict ─► classify
//!                                      │
//!                                      ▼
//!                                 console report
//! ```
//!
//! # Modules
//!
//! - [`classifier`] - ordered rule ladder mapping a snapshot to a condition.
//! - [`config`] - YAML configuration with defaults and env overrides.
//! - [`fetcher`] - HTTP sensor client and reading enrichment.
//! - [`forecast`] - resampling, smoothing model and outlook assembly.
//! - [`reading`] - the `Reading` record and the capped `History` buffer.
//! - [`report`] - table/JSON/YAML rendering of a forecast.
//! - [`scheduler`] - the fetch + forecast loop with graceful shutdown.
//! - [`store`] - CSV-backed history persistence.

pub mod classifier;
pub mod config;
pub mod fetcher;
pub mod forecast;
pub mod reading;
pub mod report;
pub mod scheduler;
pub mod store;

pub use classifier::{classify, Condition, ConditionAssessment, PressureTrend};
pub use config::{Config, ConfigError};
pub use fetcher::{FetchError, Fetcher, HttpSensor, SensorSample, SensorSource};
pub use forecast::{Forecast, ForecastError, Forecaster};
pub use reading::{History, Reading};
pub use scheduler::{run_loop, Station};
pub use store::{HistoryStore, StoreError};
