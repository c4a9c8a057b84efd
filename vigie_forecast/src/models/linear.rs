//! Linear extrapolation from the average daily growth rate

use crate::config::ForecastConfig;
use crate::data::Series;
use crate::error::{ForecastError, Result};
use crate::models::{check_length, FitOutcome, ForecastModel, ForecastPoint};
use crate::utils::future_dates;
use chrono::NaiveDate;

pub(crate) const NAME: &str = "Linear Extrapolation";

/// Always-available fallback model
///
/// Training takes the average growth between the first and the last
/// observation; prediction continues that line from the last value, with a
/// fixed relative band around each estimate.
#[derive(Debug, Clone)]
pub struct LinearExtrapolation {
    min_data_points: usize,
    band: f64,
    fit: Option<LinearFit>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct LinearFit {
    growth_rate: f64,
    last_value: f64,
    last_date: NaiveDate,
}

impl LinearExtrapolation {
    /// Create the model with the default 2-point minimum and ±20% band
    pub fn new() -> Self {
        Self::from_config(&ForecastConfig::default())
    }

    /// Create the model from the engine configuration
    pub fn from_config(config: &ForecastConfig) -> Self {
        Self {
            min_data_points: config.linear_min_points,
            band: config.linear_band,
            fit: None,
        }
    }

    /// Fitted cases-per-day growth rate
    pub fn growth_rate(&self) -> Option<f64> {
        self.fit.map(|f| f.growth_rate)
    }

    fn fit(&self, series: &Series) -> Result<LinearFit> {
        check_length(NAME, self.min_data_points, series)?;

        let (first, last) = match (series.first(), series.last()) {
            (Some(first), Some(last)) => (first, last),
            _ => {
                return Err(ForecastError::FitFailed {
                    model: NAME.to_string(),
                    reason: "empty series".to_string(),
                })
            }
        };

        let days = series.span_days();
        let growth_rate = if days > 0 {
            (last.value - first.value) / days as f64
        } else {
            0.0
        };

        Ok(LinearFit {
            growth_rate,
            last_value: last.value,
            last_date: last.date,
        })
    }
}

impl Default for LinearExtrapolation {
    fn default() -> Self {
        Self::new()
    }
}

impl ForecastModel for LinearExtrapolation {
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
            .ok_or_else(|| ForecastError::UntrainedModel(NAME.to_string()))?;

        future_dates(fit.last_date, horizon)
            .into_iter()
            .enumerate()
            .map(|(i, date)| {
                let estimate = (fit.last_value + fit.growth_rate * (i + 1) as f64).max(0.0);
                ForecastPoint::clamped(
                    NAME,
                    date,
                    estimate,
                    estimate * (1.0 - self.band),
                    estimate * (1.0 + self.band),
                )
            })
            .collect()
    }
}
