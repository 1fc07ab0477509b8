//! Exponential-smoothing forecast model.
//!
//! The forecaster only depends on [`ForecastModel`] / [`FittedModel`]; the
//! default implementation is additive Holt-Winters with a fallback to Holt's
//! linear trend when the series is shorter than two seasons.

/// Errors from model fitting.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("series too short to fit: {len} points, need at least {required}")]
    TooShort { len: usize, required: usize },

    #[error("series contains non-finite values")]
    NonFinite,
}

pub type Result<T> = std::result::Result<T, ModelError>;

/// Something that can be fitted to a univariate, evenly spaced series.
pub trait ForecastModel {
    type Fitted: FittedModel;

    fn fit(&self, series: &[f64]) -> Result<Self::Fitted>;
}

/// A fitted model able to extrapolate past the end of its training series.
pub trait FittedModel {
    /// Values for steps `1..=steps` after the last observation.
    fn predict(&self, steps: usize) -> Vec<f64>;
}

/// Candidate smoothing parameters searched during fitting.
const PARAM_GRID: [f64; 9] = [0.05, 0.1, 0.2, 0.3, 0.4, 0.5, 0.6, 0.8, 0.95];

/// Additive trend / additive seasonality exponential smoothing.
#[derive(Debug, Clone)]
pub struct ExponentialSmoothing {
    /// Steps per season; 0 disables the seasonal component.
    pub season_length: usize,
    /// Trend damping factor in (0, 1]; 1.0 is an undamped linear trend.
    pub damping: f64,
}

impl Default for ExponentialSmoothing {
    fn default() -> Self {
        Self {
            season_length: 144,
            damping: 1.0,
        }
    }
}

/// Smoothing state after the last observation.
#[derive(Debug, Clone)]
pub struct SmoothingFit {
    pub alpha: f64,
    pub beta: f64,
    /// `None` when the seasonal component was not fitted.
    pub gamma: Option<f64>,
    pub damping: f64,
    pub level: f64,
    pub trend: f64,
    seasonals: Vec<f64>,
    observed: usize,
    /// Sum of squared one-step-ahead errors over the training series.
    pub sse: f64,
}

impl SmoothingFit {
    pub fn is_seasonal(&self) -> bool {
        !self.seasonals.is_empty()
    }
}

impl FittedModel for SmoothingFit {
    fn predict(&self, steps: usize) -> Vec<f64> {
        let m = self.seasonals.len();
        let mut damped_sum = 0.0;
        let mut phi_k = 1.0;
        (1..=steps)
            .map(|k| {
                phi_k *= self.damping;
                damped_sum += phi_k;
                let seasonal = if m > 0 {
                    self.seasonals[(self.observed + k - 1) % m]
                } else {
                    0.0
                };
                self.level + damped_sum * self.trend + seasonal
            })
            .collect()
    }
}

impl ForecastModel for ExponentialSmoothing {
    type Fitted = SmoothingFit;

    fn fit(&self, series: &[f64]) -> Result<SmoothingFit> {
        if series.len() < 2 {
            return Err(ModelError::TooShort {
                len: series.len(),
                required: 2,
            });
        }
        if series.iter().any(|v| !v.is_finite()) {
            return Err(ModelError::NonFinite);
        }

        let m = self.season_length;
        let seasonal = m > 1 && series.len() >= 2 * m;
        let gammas: &[f64] = if seasonal { &PARAM_GRID } else { &[0.0] };

        let mut best: Option<SmoothingFit> = None;
        for &alpha in &PARAM_GRID {
            for &beta in &PARAM_GRID {
                for &gamma in gammas {
                    let candidate = if seasonal {
                        run_holt_winters(series, m, alpha, beta, gamma, self.damping)
                    } else {
                        run_holt(series, alpha, beta, self.damping)
                    };
                    if best.as_ref().map_or(true, |b| candidate.sse < b.sse) {
                        best = Some(candidate);
                    }
                }
            }
        }

        // The grid is never empty, so at least one candidate exists.
        best.ok_or(ModelError::TooShort {
            len: series.len(),
            required: 2,
        })
    }
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

fn run_holt(series: &[f64], alpha: f64, beta: f64, phi: f64) -> SmoothingFit {
    let mut level = series[0];
    let mut trend = series[1] - series[0];
    let mut sse = 0.0;

    for &y in &series[1..] {
        let forecast = level + phi * trend;
        sse += (y - forecast).powi(2);
        let prev_level = level;
        level = alpha * y + (1.0 - alpha) * (level + phi * trend);
        trend = beta * (level - prev_level) + (1.0 - beta) * phi * trend;
    }

    SmoothingFit {
        alpha,
        beta,
        gamma: None,
        damping: phi,
        level,
        trend,
        seasonals: Vec::new(),
        observed: series.len(),
        sse,
    }
}

fn run_holt_winters(
    series: &[f64],
    m: usize,
    alpha: f64,
    beta: f64,
    gamma: f64,
    phi: f64,
) -> SmoothingFit {
    let first = mean(&series[..m]);
    let second = mean(&series[m..2 * m]);
    let mut level = first;
    let mut trend = (second - first) / m as f64;
    let mut seasonals: Vec<f64> = series[..m].iter().map(|y| y - first).collect();
    let mut sse = 0.0;

    for (t, &y) in series.iter().enumerate() {
        let s = seasonals[t % m];
        let forecast = level + phi * trend + s;
        sse += (y - forecast).powi(2);
        let prev_level = level;
        level = alpha * (y - s) + (1.0 - alpha) * (level + phi * trend);
        trend = beta * (level - prev_level) + (1.0 - beta) * phi * trend;
        seasonals[t % m] = gamma * (y - level) + (1.0 - gamma) * s;
    }

    SmoothingFit {
        alpha,
        beta,
        gamma: Some(gamma),
        damping: phi,
        level,
        trend,
        seasonals,
        observed: series.len(),
        sse,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_too_short() {
        let model = ExponentialSmoothing::default();
        assert!(matches!(
            model.fit(&[1.0]),
            Err(ModelError::TooShort { len: 1, .. })
        ));
    }

    #[test]
    fn test_non_finite_rejected() {
        let model = ExponentialSmoothing::default();
        assert!(matches!(
            model.fit(&[1.0, f64::NAN, 2.0]),
            Err(ModelError::NonFinite)
        ));
    }

    #[test]
    fn test_constant_series_stays_flat() {
        let model = ExponentialSmoothing::default();
        let fit = model.fit(&[1013.0; 20]).unwrap();
        assert!(!fit.is_seasonal());
        for v in fit.predict(12) {
            assert!((v - 1013.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_linear_trend_is_extrapolated() {
        let series: Vec<f64> = (0..30).map(|i| 1000.0 + 0.5 * i as f64).collect();
        let fit = ExponentialSmoothing::default().fit(&series).unwrap();
        let forecast = fit.predict(6);
        assert_eq!(forecast.len(), 6);
        // next value is 1015.0, sixth is 1017.5
        assert!((forecast[0] - 1015.0).abs() < 1e-6, "got {}", forecast[0]);
        assert!((forecast[5] - 1017.5).abs() < 1e-6, "got {}", forecast[5]);
    }

    #[test]
    fn test_damped_trend_flattens() {
        let series: Vec<f64> = (0..30).map(|i| 10.0 + i as f64).collect();
        let model = ExponentialSmoothing {
            season_length: 0,
            damping: 0.8,
        };
        let forecast = model.fit(&series).unwrap().predict(50);
        let late_step = forecast[49] - forecast[48];
        assert!(late_step.abs() < 1e-3);
        assert!(forecast.windows(2).all(|w| w[1] >= w[0]));
    }

    #[test]
    fn test_seasonal_pattern_is_repeated() {
        let pattern = [0.0, 2.0, 4.0, 2.0];
        let series: Vec<f64> = (0..24).map(|i| 20.0 + pattern[i % 4]).collect();
        let model = ExponentialSmoothing {
            season_length: 4,
            damping: 1.0,
        };
        let fit = model.fit(&series).unwrap();
        assert!(fit.is_seasonal());
        let forecast = fit.predict(8);
        for (k, v) in forecast.iter().enumerate() {
            let expected = 20.0 + pattern[(24 + k) % 4];
            assert!((v - expected).abs() < 1e-6, "step {}: {} vs {}", k, v, expected);
        }
    }

    #[test]
    fn test_short_series_skips_seasonality() {
        let series: Vec<f64> = (0..10).map(|i| i as f64).collect();
        let model = ExponentialSmoothing {
            season_length: 6,
            damping: 1.0,
        };
        assert!(!model.fit(&series).unwrap().is_seasonal());
    }
}
