//! Additive trend + seasonality model
//!
//! The history is decomposed into a piecewise-linear trend and Fourier
//! seasonal terms, fitted jointly by penalised least squares on scaled time
//! and scaled values. Forecasts extend the fitted curve past the last
//! observation only; no historical points are returned.

use crate::config::{ForecastConfig, SeasonalConfig};
use crate::data::Series;
use crate::error::{ForecastError, Result};
use crate::models::{check_length, FitOutcome, ForecastModel, ForecastPoint};
use crate::utils::future_dates;
use chrono::NaiveDate;
use std::f64::consts::PI;
use vigie_math::regression::{penalized_least_squares, RegressionFit};
use vigie_math::stats::{abs_max, two_sided_z};

pub(crate) const NAME: &str = "Prophet";

const DAILY_PERIOD: f64 = 1.0;
const WEEKLY_PERIOD: f64 = 7.0;
const YEARLY_PERIOD: f64 = 365.25;
/// Columns whose spread over the history is below this are not identifiable
const MIN_COLUMN_SPREAD: f64 = 1e-9;

/// Seasonal cycle fitted by the model
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Seasonality {
    /// Cycle name
    pub name: &'static str,
    /// Period in days
    pub period: f64,
    /// Fourier order
    pub order: usize,
}

/// Additive seasonal model in the style of Prophet
#[derive(Debug, Clone)]
pub struct SeasonalModel {
    min_data_points: usize,
    config: SeasonalConfig,
    fit: Option<SeasonalFit>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Term {
    Intercept,
    Slope,
    /// Slope change at a scaled time
    Hinge(f64),
    Sin { period: f64, k: usize },
    Cos { period: f64, k: usize },
}

impl Term {
    /// Value at `days` after the first observation, `t` being scaled time
    fn value(&self, days: f64, t: f64) -> f64 {
        match *self {
            Term::Intercept => 1.0,
            Term::Slope => t,
            Term::Hinge(at) => (t - at).max(0.0),
            Term::Sin { period, k } => (2.0 * PI * k as f64 * days / period).sin(),
            Term::Cos { period, k } => (2.0 * PI * k as f64 * days / period).cos(),
        }
    }
}

#[derive(Debug, Clone)]
struct SeasonalFit {
    terms: Vec<Term>,
    regression: RegressionFit,
    span_days: f64,
    y_scale: f64,
    noise_variance: f64,
    changepoint_count: usize,
    mean_abs_delta: f64,
    z: f64,
    last_date: NaiveDate,
}

impl SeasonalModel {
    /// Create the model with default components and thresholds
    pub fn new() -> Self {
        Self::from_config(&ForecastConfig::default())
    }

    /// Create the model from the engine configuration
    pub fn from_config(config: &ForecastConfig) -> Self {
        Self {
            min_data_points: config.advanced_min_points,
            config: config.seasonal.clone(),
            fit: None,
        }
    }

    /// Seasonal cycles enabled by the configuration
    pub fn seasonalities(&self) -> Vec<Seasonality> {
        let mut cycles = Vec::new();
        if self.config.daily {
            cycles.push(Seasonality {
                name: "daily",
                period: DAILY_PERIOD,
                order: self.config.daily_order,
            });
        }
        if self.config.weekly {
            cycles.push(Seasonality {
                name: "weekly",
                period: WEEKLY_PERIOD,
                order: self.config.weekly_order,
            });
        }
        if self.config.yearly {
            cycles.push(Seasonality {
                name: "yearly",
                period: YEARLY_PERIOD,
                order: self.config.yearly_order,
            });
        }
        cycles
    }

    /// Trend changepoints kept by the last successful training
    pub fn changepoint_count(&self) -> Option<usize> {
        self.fit.as_ref().map(|f| f.changepoint_count)
    }

    /// Whether a cycle contributed identifiable terms to the fit
    pub fn fitted_cycle(&self, period: f64) -> bool {
        self.fit.as_ref().map_or(false, |f| {
            f.terms.iter().any(|t| match *t {
                Term::Sin { period: p, .. } | Term::Cos { period: p, .. } => p == period,
                _ => false,
            })
        })
    }

    /// Changepoint locations in scaled time over the first part of the history
    fn changepoints(&self, scaled_times: &[f64]) -> Vec<f64> {
        let history =
            (scaled_times.len() as f64 * self.config.changepoint_range).floor() as usize;
        let count = self.config.n_changepoints.min(history.saturating_sub(1));
        if count == 0 {
            return Vec::new();
        }

        let mut points: Vec<f64> = (1..=count)
            .map(|i| {
                let row = (i as f64 * (history - 1) as f64 / count as f64).round() as usize;
                scaled_times[row]
            })
            .collect();
        points.dedup();
        points
    }

    fn fit(&self, series: &Series) -> Result<SeasonalFit> {
        check_length(NAME, self.min_data_points, series)?;

        let fail = |reason: String| ForecastError::FitFailed {
            model: NAME.to_string(),
            reason,
        };

        let (first, last) = match (series.first(), series.last()) {
            (Some(first), Some(last)) => (first.date, last.date),
            _ => return Err(fail("empty series".to_string())),
        };
        let span_days = series.span_days() as f64;
        if span_days <= 0.0 {
            return Err(fail("history spans less than one day".to_string()));
        }

        let days: Vec<f64> = series
            .dates()
            .iter()
            .map(|d| (*d - first).num_days() as f64)
            .collect();
        let scaled_times: Vec<f64> = days.iter().map(|d| d / span_days).collect();
        let values = series.values();
        let y_scale = match abs_max(&values) {
            m if m > 0.0 => m,
            _ => 1.0,
        };
        let y: Vec<f64> = values.iter().map(|v| v / y_scale).collect();

        let changepoints = self.changepoints(&scaled_times);
        let mut candidates = vec![Term::Intercept, Term::Slope];
        candidates.extend(changepoints.iter().map(|&at| Term::Hinge(at)));
        for cycle in self.seasonalities() {
            for k in 1..=cycle.order {
                candidates.push(Term::Sin {
                    period: cycle.period,
                    k,
                });
                candidates.push(Term::Cos {
                    period: cycle.period,
                    k,
                });
            }
        }

        // Terms that are constant over the history (e.g. a daily cycle sampled
        // once a day) cannot be separated from the intercept.
        let terms: Vec<Term> = candidates
            .into_iter()
            .filter(|term| {
                if matches!(term, Term::Intercept) {
                    return true;
                }
                let (lo, hi) = days.iter().zip(&scaled_times).fold(
                    (f64::INFINITY, f64::NEG_INFINITY),
                    |(lo, hi), (&d, &t)| {
                        let v = term.value(d, t);
                        (lo.min(v), hi.max(v))
                    },
                );
                hi - lo > MIN_COLUMN_SPREAD
            })
            .collect();

        let design: Vec<Vec<f64>> = days
            .iter()
            .zip(&scaled_times)
            .map(|(&d, &t)| terms.iter().map(|term| term.value(d, t)).collect())
            .collect();
        let penalties: Vec<f64> = terms
            .iter()
            .map(|term| match term {
                Term::Intercept | Term::Slope => 0.0,
                Term::Hinge(_) => self.config.changepoint_penalty,
                Term::Sin { .. } | Term::Cos { .. } => self.config.seasonality_penalty,
            })
            .collect();

        let regression = penalized_least_squares(&design, &y, &penalties)
            .map_err(|e| fail(e.to_string()))?;

        let deltas: Vec<f64> = terms
            .iter()
            .zip(&regression.coefficients)
            .filter(|(term, _)| matches!(term, Term::Hinge(_)))
            .map(|(_, c)| c.abs())
            .collect();
        let changepoint_count = deltas.len();
        let mean_abs_delta = if deltas.is_empty() {
            0.0
        } else {
            deltas.iter().sum::<f64>() / deltas.len() as f64
        };
        let noise_variance = regression.residual_variance();

        if !(noise_variance.is_finite() && mean_abs_delta.is_finite()) {
            return Err(fail("non-finite residual variance".to_string()));
        }

        Ok(SeasonalFit {
            terms,
            regression,
            span_days,
            y_scale,
            noise_variance,
            changepoint_count,
            mean_abs_delta,
            z: two_sided_z(self.config.interval_width)?,
            last_date: last,
        })
    }
}

impl Default for SeasonalModel {
    fn default() -> Self {
        Self::new()
    }
}

impl SeasonalFit {
    /// Variance of future trend changes at scaled time `t` past the history
    ///
    /// Changes arrive at the historical changepoint rate with Laplace
    /// magnitudes of scale `mean_abs_delta`; a change at `s` moves the trend
    /// at `t` by `delta * (t - s)`.
    fn trend_variance(&self, t: f64) -> f64 {
        let ahead = (t - 1.0).max(0.0);
        let rate = self.changepoint_count as f64;
        rate * 2.0 * self.mean_abs_delta.powi(2) * ahead.powi(3) / 3.0
    }
}

impl ForecastModel for SeasonalModel {
    fn name(&self) -> &str {
        NAME
    }

    fn min_data_points(&self) -> usize {
        self.min_data_points
    }

    fn is_trained(&self) -> bool {
        self.fit.is_some()
    }

    fn train(&mut self, series: &Series) -> FitOutcome {
        let (fit, outcome) = FitOutcome::from_result(self.fit(series));
        self.fit = fit;
        outcome
    }

    fn predict(&self, horizon: usize) -> Result<Vec<ForecastPoint>> {
        let fit = self
            .fit
            .as_ref()
            .ok_or_else(|| ForecastError::UntrainedModel(NAME.to_string()))?;

        future_dates(fit.last_date, horizon)
            .into_iter()
            .enumerate()
            .map(|(i, date)| {
                let days = fit.span_days + (i + 1) as f64;
                let t = days / fit.span_days;
                let row: Vec<f64> = fit
                    .terms
                    .iter()
                    .map(|term| term.value(days, t))
                    .collect();
                let estimate = fit.regression.predict_row(&row)? * fit.y_scale;
                let half_width =
                    fit.z * (fit.noise_variance + fit.trend_variance(t)).sqrt() * fit.y_scale;
                ForecastPoint::clamped(
                    NAME,
                    date,
                    estimate,
                    estimate - half_width,
                    estimate + half_width,
                )
            })
            .collect()
    }
}
