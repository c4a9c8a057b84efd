//! Forecasting models for case-count series
//!
//! The family is closed: [`Model`] enumerates every variant the selector can
//! build, and each variant implements the shared [`ForecastModel`]
//! capability.

use crate::data::Series;
use crate::error::{ForecastError, Result};
use chrono::NaiveDate;
use serde::Serialize;
use std::fmt;

pub mod arima;
pub mod linear;
pub mod seasonal;

pub use arima::ArimaModel;
pub use linear::LinearExtrapolation;
pub use seasonal::SeasonalModel;

/// One forecast day with its uncertainty bounds
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ForecastPoint {
    /// Forecast date
    pub date: NaiveDate,
    /// Point estimate
    pub point: f64,
    /// Lower bound
    pub lower: f64,
    /// Upper bound
    pub upper: f64,
}

impl ForecastPoint {
    /// Build a point clamped to non-negative counts with ordered bounds
    ///
    /// Fails when any input is not finite.
    pub fn clamped(
        model: &str,
        date: NaiveDate,
        point: f64,
        lower: f64,
        upper: f64,
    ) -> Result<Self> {
        if !(point.is_finite() && lower.is_finite() && upper.is_finite()) {
            return Err(ForecastError::PredictionFailed {
                model: model.to_string(),
                reason: format!("non-finite forecast on {}", date),
            });
        }

        let point = point.max(0.0);
        Ok(Self {
            date,
            point,
            lower: lower.max(0.0).min(point),
            upper: upper.max(point),
        })
    }
}

/// Result of training one model
#[derive(Debug, Clone, PartialEq)]
pub enum FitOutcome {
    /// The model is ready to predict
    Trained,
    /// The model could not be fitted; it takes no part in prediction
    FitFailed(String),
}

impl FitOutcome {
    /// Whether training succeeded
    pub fn is_trained(&self) -> bool {
        matches!(self, FitOutcome::Trained)
    }

    pub(crate) fn from_result<T>(result: Result<T>) -> (Option<T>, Self) {
        match result {
            Ok(state) => (Some(state), FitOutcome::Trained),
            Err(err) => (None, FitOutcome::FitFailed(err.to_string())),
        }
    }
}

/// Capability shared by every forecasting model
pub trait ForecastModel: fmt::Debug {
    /// Display name reported in `models_used`
    fn name(&self) -> &str;

    /// Smallest series length the model accepts
    fn min_data_points(&self) -> usize;

    /// Whether a series of `n` points is long enough to train on
    fn can_train(&self, n: usize) -> bool {
        n >= self.min_data_points()
    }

    /// Whether the last call to `train` succeeded
    fn is_trained(&self) -> bool;

    /// Fit the model; failures are reported, never raised
    fn train(&mut self, series: &Series) -> FitOutcome;

    /// Forecast `horizon` days following the last observation
    fn predict(&self, horizon: usize) -> Result<Vec<ForecastPoint>>;
}

/// Variants known to the selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ModelKind {
    /// Average-growth-rate extrapolation
    Linear,
    /// Autoregressive integrated moving average with order search
    Arima,
    /// Additive trend plus seasonality
    Seasonal,
}

impl ModelKind {
    /// Every variant, in selection order
    pub const ALL: [ModelKind; 3] = [
        ModelKind::Linear,
        ModelKind::Arima,
        ModelKind::Seasonal,
    ];

    /// Display name of the variant
    pub fn name(&self) -> &'static str {
        match self {
            ModelKind::Linear => linear::NAME,
            ModelKind::Arima => arima::NAME,
            ModelKind::Seasonal => seasonal::NAME,
        }
    }

    /// Short identifier used as a key in status reports
    pub fn key(&self) -> &'static str {
        match self {
            ModelKind::Linear => "linear",
            ModelKind::Arima => "arima",
            ModelKind::Seasonal => "prophet",
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A model instance of any known variant
#[derive(Debug, Clone)]
pub enum Model {
    Linear(LinearExtrapolation),
    Arima(ArimaModel),
    Seasonal(SeasonalModel),
}

impl Model {
    /// Variant of this instance
    pub fn kind(&self) -> ModelKind {
        match self {
            Model::Linear(_) => ModelKind::Linear,
            Model::Arima(_) => ModelKind::Arima,
            Model::Seasonal(_) => ModelKind::Seasonal,
        }
    }

    fn inner(&self) -> &dyn ForecastModel {
        match self {
            Model::Linear(m) => m,
            Model::Arima(m) => m,
            Model::Seasonal(m) => m,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn ForecastModel {
        match self {
            Model::Linear(m) => m,
            Model::Arima(m) => m,
            Model::Seasonal(m) => m,
        }
    }
}

impl ForecastModel for Model {
    fn name(&self) -> &str {
        self.inner().name()
    }

    fn min_data_points(&self) -> usize {
        self.inner().min_data_points()
    }

    fn is_trained(&self) -> bool {
        self.inner().is_trained()
    }

    fn train(&mut self, series: &Series) -> FitOutcome {
        self.inner_mut().train(series)
    }

    fn predict(&self, horizon: usize) -> Result<Vec<ForecastPoint>> {
        self.inner().predict(horizon)
    }
}

impl From<LinearExtrapolation> for Model {
    fn from(model: LinearExtrapolation) -> Self {
        Model::Linear(model)
    }
}

impl From<ArimaModel> for Model {
    fn from(model: ArimaModel) -> Self {
        Model::Arima(model)
    }
}

impl From<SeasonalModel> for Model {
    fn from(model: SeasonalModel) -> Self {
        Model::Seasonal(model)
    }
}

/// Reject training on a series shorter than the model's minimum
pub(crate) fn check_length(name: &str, min_points: usize, series: &Series) -> Result<()> {
    if series.len() < min_points {
        return Err(ForecastError::FitFailed {
            model: name.to_string(),
            reason: format!(
                "requires at least {} data points, got {}",
                min_points,
                series.len()
            ),
        });
    }
    Ok(())
}
