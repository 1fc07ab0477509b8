//! Forecasting pipeline: resample, fit, project, classify.
//!
//! Each channel (temperature, humidity, pressure) is fitted independently on
//! the resampled grid. The current snapshot and up to three representative
//! future steps (about +1h, +2h, +3h) are run through the classifier; future
//! steps use their projected pressure minus the *current* pressure as the
//! pressure change.

pub mod model;
pub mod resample;

use serde::Serialize;

use crate::classifier::{classify, ConditionAssessment};
use crate::config::Config;
use crate::reading::Reading;

pub use model::{ExponentialSmoothing, FittedModel, ForecastModel, ModelError};
pub use resample::{resample, ResampledSeries, SeriesPoint};

/// Raw readings required before a forecast is attempted.
pub const MIN_RAW_READINGS: usize = 6;

/// Resampled points required for the model.
pub const MIN_RESAMPLED_POINTS: usize = 3;

/// Outlook is sampled at 1, 2 and 3 hours ahead.
const OUTLOOK_HOURS: [usize; 3] = [1, 2, 3];

/// Which precondition was not met.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataStage {
    Raw,
    Resampled,
}

/// Errors from the forecasting pipeline.
#[derive(Debug, thiserror::Error)]
pub enum ForecastError {
    #[error("insufficient data: {count} {stage:?} readings, need {required}")]
    InsufficientData {
        stage: DataStage,
        count: usize,
        required: usize,
    },

    #[error("horizon must be at least one hour")]
    InvalidHorizon,

    #[error("model error: {0}")]
    Model(#[from] ModelError),
}

impl ForecastError {
    /// Not enough history yet; expected early in a station's life.
    pub fn is_insufficient_data(&self) -> bool {
        matches!(self, ForecastError::InsufficientData { .. })
    }
}

pub type Result<T> = std::result::Result<T, ForecastError>;

/// Latest resampled conditions.
#[derive(Debug, Clone, Serialize)]
pub struct CurrentConditions {
    pub point: SeriesPoint,
    /// Pressure delta across the last hour of the grid (0 when too short).
    pub pressure_change: f64,
    pub assessment: ConditionAssessment,
}

/// One classified future step.
#[derive(Debug, Clone, Serialize)]
pub struct OutlookEntry {
    /// 0-based index into the projection.
    pub step_index: usize,
    pub offset_hours: usize,
    pub point: SeriesPoint,
    /// Projected pressure minus current pressure.
    pub pressure_change: f64,
    pub assessment: ConditionAssessment,
}

/// Result of one forecasting pass.
#[derive(Debug, Clone, Serialize)]
pub struct Forecast {
    pub raw_readings: usize,
    pub resampled_points: usize,
    pub horizon_hours: u32,
    pub current: CurrentConditions,
    pub outlook: Vec<OutlookEntry>,
    pub projection: Vec<SeriesPoint>,
}

/// Runs the forecasting pipeline with a pluggable model.
#[derive(Debug, Clone)]
pub struct Forecaster<M = ExponentialSmoothing> {
    model: M,
    interval_minutes: u32,
}

impl Forecaster<ExponentialSmoothing> {
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            ExponentialSmoothing {
                season_length: config.season_steps(),
                damping: config.trend_damping,
            },
            config.resample_interval_minutes,
        )
    }
}

impl<M: ForecastModel> Forecaster<M> {
    pub fn new(model: M, interval_minutes: u32) -> Self {
        Self {
            model,
            interval_minutes: interval_minutes.max(1),
        }
    }

    /// Grid steps per hour; also the pressure look-back in steps.
    pub fn steps_per_hour(&self) -> usize {
        (60 / self.interval_minutes).max(1) as usize
    }

    /// Forecast `horizon_hours` ahead from `readings` (chronological).
    pub fn forecast(&self, readings: &[Reading], horizon_hours: u32) -> Result<Forecast> {
        if horizon_hours == 0 {
            return Err(ForecastError::InvalidHorizon);
        }
        if readings.len() < MIN_RAW_READINGS {
            return Err(ForecastError::InsufficientData {
                stage: DataStage::Raw,
                count: readings.len(),
                required: MIN_RAW_READINGS,
            });
        }

        let series = resample(readings, self.interval_minutes);
        let current_point = match series.last() {
            Some(point) if series.len() >= MIN_RESAMPLED_POINTS => *point,
            _ => {
                return Err(ForecastError::InsufficientData {
                    stage: DataStage::Resampled,
                    count: series.len(),
                    required: MIN_RESAMPLED_POINTS,
                })
            }
        };
        log::debug!(
            "Resampled {} readings to {} points at {} min",
            readings.len(),
            series.len(),
            self.interval_minutes
        );

        let sph = self.steps_per_hour();
        let steps = horizon_hours as usize * sph;
        let projection = self.project(&series, steps)?;

        let pressure_change = self.recent_pressure_change(&series);
        let current = CurrentConditions {
            point: current_point,
            pressure_change,
            assessment: classify(
                current_point.temp,
                current_point.humidity,
                current_point.pressure,
                pressure_change,
            ),
        };

        let outlook = outlook_indices(projection.len(), sph)
            .into_iter()
            .map(|i| {
                let point = projection[i];
                let change = point.pressure - current_point.pressure;
                OutlookEntry {
                    step_index: i,
                    offset_hours: (i + 1) / sph,
                    point,
                    pressure_change: change,
                    assessment: classify(point.temp, point.humidity, point.pressure, change),
                }
            })
            .collect();

        Ok(Forecast {
            raw_readings: readings.len(),
            resampled_points: series.len(),
            horizon_hours,
            current,
            outlook,
            projection,
        })
    }

    fn project(&self, series: &ResampledSeries, steps: usize) -> Result<Vec<SeriesPoint>> {
        let temps = self.model.fit(&series.temperatures())?.predict(steps);
        let humidities = self.model.fit(&series.humidities())?.predict(steps);
        let pressures = self.model.fit(&series.pressures())?.predict(steps);

        let Some(last) = series.last() else {
            return Ok(Vec::new());
        };
        let interval = series.interval();
        Ok((0..steps)
            .map(|k| SeriesPoint {
                time: last.time + interval * (k as i32 + 1),
                temp: temps[k],
                humidity: humidities[k],
                pressure: pressures[k],
            })
            .collect())
    }

    /// Latest pressure minus the pressure `steps_per_hour` points back,
    /// counting the latest point. Zero when the grid is shorter than that.
    fn recent_pressure_change(&self, series: &ResampledSeries) -> f64 {
        let points = series.points();
        let lookback = self.steps_per_hour();
        if points.len() < lookback {
            return 0.0;
        }
        let latest = points[points.len() - 1].pressure;
        let earlier = points[points.len() - lookback].pressure;
        latest - earlier
    }
}

/// Indices at +1h, +2h and min(last, +3h); out-of-range ones are skipped.
fn outlook_indices(len: usize, steps_per_hour: usize) -> Vec<usize> {
    let Some(last) = len.checked_sub(1) else {
        return Vec::new();
    };
    let mut indices: Vec<usize> = Vec::with_capacity(OUTLOOK_HOURS.len());
    for (n, hours) in OUTLOOK_HOURS.iter().enumerate() {
        let mut index = hours * steps_per_hour;
        if n == OUTLOOK_HOURS.len() - 1 {
            index = index.min(last);
        }
        if index < len {
            indices.push(index);
        }
    }
    indices
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::{Condition, PressureTrend};
    use chrono::{Duration, NaiveDate, NaiveDateTime};

    fn start() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 7, 15)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    fn readings(values: &[(i64, f64, f64)]) -> Vec<Reading> {
        values
            .iter()
            .map(|&(minute, pressure, humidity)| {
                Reading::new(
                    start() + Duration::minutes(minute),
                    20.0,
                    humidity,
                    pressure,
                    54.6872,
                    25.2797,
                )
            })
            .collect()
    }

    fn forecaster() -> Forecaster {
        Forecaster::new(ExponentialSmoothing::default(), 10)
    }

    #[test]
    fn test_outlook_indices_default_grid() {
        assert_eq!(outlook_indices(36, 6), vec![6, 12, 18]);
        assert_eq!(outlook_indices(12, 6), vec![6, 11]);
        assert_eq!(outlook_indices(6, 6), vec![5]);
        assert!(outlook_indices(0, 6).is_empty());
    }

    #[test]
    fn test_five_readings_is_insufficient() {
        let r = readings(&[
            (0, 1013.0, 50.0),
            (10, 1013.0, 50.0),
            (20, 1013.0, 50.0),
            (30, 1013.0, 50.0),
            (40, 1013.0, 50.0),
        ]);
        let err = forecaster().forecast(&r, 6).unwrap_err();
        assert!(err.is_insufficient_data());
        assert!(matches!(
            err,
            ForecastError::InsufficientData {
                stage: DataStage::Raw,
                count: 5,
                required: 6
            }
        ));
    }

    #[test]
    fn test_too_few_buckets_is_insufficient() {
        // six readings, all inside two 10-minute buckets
        let r = readings(&[
            (0, 1013.0, 50.0),
            (2, 1013.0, 50.0),
            (4, 1013.0, 50.0),
            (11, 1013.0, 50.0),
            (13, 1013.0, 50.0),
            (15, 1013.0, 50.0),
        ]);
        let err = forecaster().forecast(&r, 6).unwrap_err();
        assert!(matches!(
            err,
            ForecastError::InsufficientData {
                stage: DataStage::Resampled,
                count: 2,
                ..
            }
        ));
    }

    #[test]
    fn test_zero_horizon_rejected() {
        let r = readings(&[(0, 1013.0, 50.0); 6]);
        assert!(matches!(
            forecaster().forecast(&r, 0),
            Err(ForecastError::InvalidHorizon)
        ));
    }

    #[test]
    fn test_rising_pressure_is_sunny() {
        let r = readings(&[
            (0, 1022.0, 55.0),
            (10, 1022.0, 55.0),
            (20, 1022.0, 54.0),
            (30, 1023.0, 53.0),
            (40, 1023.0, 52.0),
            (50, 1024.0, 50.0),
        ]);
        let forecast = forecaster().forecast(&r, 6).unwrap();
        assert_eq!(forecast.raw_readings, 6);
        assert_eq!(forecast.resampled_points, 6);
        assert!((forecast.current.pressure_change - 2.0).abs() < 1e-9);
        assert_eq!(forecast.current.assessment.condition, Condition::Sunny);
        assert_eq!(forecast.current.assessment.confidence, 80);
        assert_eq!(
            forecast.current.assessment.pressure_trend,
            PressureTrend::Rising
        );

        assert_eq!(forecast.projection.len(), 36);
        let indices: Vec<usize> = forecast.outlook.iter().map(|o| o.step_index).collect();
        assert_eq!(indices, vec![6, 12, 18]);
        let hours: Vec<usize> = forecast.outlook.iter().map(|o| o.offset_hours).collect();
        assert_eq!(hours, vec![1, 2, 3]);
    }

    #[test]
    fn test_outlook_uses_change_from_current_pressure() {
        let r = readings(&[
            (0, 1022.0, 55.0),
            (10, 1022.0, 55.0),
            (20, 1022.0, 54.0),
            (30, 1023.0, 53.0),
            (40, 1023.0, 52.0),
            (50, 1024.0, 50.0),
        ]);
        let forecast = forecaster().forecast(&r, 6).unwrap();
        for entry in &forecast.outlook {
            let expected = entry.point.pressure - forecast.current.point.pressure;
            assert!((entry.pressure_change - expected).abs() < 1e-9);
        }
    }

    #[test]
    fn test_projection_timestamps_follow_grid() {
        let r = readings(&[
            (3, 1010.0, 60.0),
            (13, 1010.5, 60.0),
            (23, 1011.0, 60.0),
            (33, 1011.5, 60.0),
            (43, 1012.0, 60.0),
            (53, 1012.5, 60.0),
        ]);
        let forecast = forecaster().forecast(&r, 1).unwrap();
        assert_eq!(forecast.current.point.time, start() + Duration::minutes(50));
        assert_eq!(forecast.projection.len(), 6);
        assert_eq!(
            forecast.projection[0].time,
            start() + Duration::minutes(60)
        );
        assert_eq!(
            forecast.projection[5].time,
            start() + Duration::minutes(110)
        );
        // +1h and +2h fall outside a one-hour horizon; the last step stands in for +3h
        assert_eq!(forecast.outlook.len(), 1);
        assert_eq!(forecast.outlook[0].step_index, 5);
        assert_eq!(forecast.outlook[0].offset_hours, 1);
    }

    #[test]
    fn test_short_grid_has_zero_pressure_change() {
        let r = readings(&[
            (0, 1000.0, 50.0),
            (1, 1000.0, 50.0),
            (10, 1004.0, 50.0),
            (11, 1004.0, 50.0),
            (20, 1008.0, 50.0),
            (21, 1008.0, 50.0),
        ]);
        let forecast = forecaster().forecast(&r, 2).unwrap();
        assert_eq!(forecast.resampled_points, 3);
        assert_eq!(forecast.current.pressure_change, 0.0);
        assert_eq!(
            forecast.current.assessment.pressure_trend,
            PressureTrend::Stable
        );
    }
}
