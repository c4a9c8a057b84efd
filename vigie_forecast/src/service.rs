//! Public entry point: selection, training, prediction and reporting

use crate::config::ForecastConfig;
use crate::data::{Population, Series};
use crate::ensemble::{Contribution, FailedModel};
use crate::error::{ForecastError, Result};
use crate::models::ModelKind;
use crate::selector::ModelSelector;
use chrono::{Days, NaiveDate};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::info;

/// Key and display name of the deep-learning tier reported by `status`
const DEEP_LEARNING_KEY: &str = "lstm";
const DEEP_LEARNING_NAME: &str = "LSTM";

/// Whether only the fallback model could be used
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ForecastMode {
    /// Fewer points than the advanced threshold: Linear Extrapolation only
    Fallback,
    /// Advanced models are eligible
    FullEnsemble,
}

/// One forecast day as integer case counts
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PredictionRow {
    /// Forecast date, serialised as ISO 8601
    pub date: NaiveDate,
    /// Point estimate
    pub predicted_cases: u64,
    /// Lower bound
    pub lower_bound: u64,
    /// Upper bound, never below `lower_bound`
    pub upper_bound: u64,
}

/// Eligibility of each model tier for the current data volume
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModelsAvailable {
    pub linear: bool,
    pub arima: bool,
    pub prophet: bool,
    pub lstm: bool,
}

/// Forecast result returned to API consumers
#[derive(Debug, Clone, Serialize)]
pub struct ForecastReport {
    /// Region name, or "National" for the aggregate
    pub region: String,
    /// Models whose forecast went into the combination
    ///
    /// A model that trained but failed to predict is listed in
    /// `models_failed` instead, so this can be narrower than the trained set.
    pub models_used: Vec<String>,
    /// Models that were attempted but dropped, with the reason
    pub models_failed: Vec<FailedModel>,
    /// Renormalised weight of each model used
    pub weights: Vec<Contribution>,
    /// Length of the input series
    pub data_points: usize,
    /// Which tiers the data volume allows
    pub models_available: ModelsAvailable,
    /// Fallback or full-ensemble operation
    pub mode: ForecastMode,
    /// One row per horizon day
    pub predictions: Vec<PredictionRow>,
    /// Human-readable mode and threshold summary
    pub message: String,
}

/// Eligibility of one model
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModelStatus {
    /// Display name
    pub name: String,
    /// Whether the model is part of the engine
    pub implemented: bool,
    /// Whether the current data volume reaches the threshold
    pub available: bool,
    /// Threshold in data points
    pub min_required: usize,
    /// Points still missing before the threshold is reached
    pub points_needed: usize,
    /// Short status text
    pub status: String,
}

/// Result of the status query
#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    /// Region name, or "National" for the aggregate
    pub region: String,
    /// Length of the series
    pub data_points: usize,
    /// Status keyed by model identifier
    pub models: BTreeMap<String, ModelStatus>,
    /// Human-readable summary
    pub message: String,
}

/// Forecasting engine facade
///
/// Every call builds, trains and discards its own models; nothing is shared
/// between requests.
#[derive(Debug, Clone, Default)]
pub struct ForecastService {
    selector: ModelSelector,
}

impl ForecastService {
    /// Create a service over a validated configuration
    pub fn new(config: ForecastConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            selector: ModelSelector::new(config),
        })
    }

    /// The configuration in use
    pub fn config(&self) -> &ForecastConfig {
        self.selector.config()
    }

    /// Forecast the national aggregate
    pub fn forecast(&self, series: &Series, horizon: usize) -> Result<ForecastReport> {
        self.forecast_for(&Population::National, series, horizon)
    }

    /// Forecast `horizon` days for a population's series
    pub fn forecast_for(
        &self,
        population: &Population,
        series: &Series,
        horizon: usize,
    ) -> Result<ForecastReport> {
        if horizon == 0 {
            return Err(ForecastError::InvalidHorizon(horizon));
        }
        if let Some(last) = series.last() {
            if last.date.checked_add_days(Days::new(horizon as u64)).is_none() {
                return Err(ForecastError::DataError(format!(
                    "{} days after {} is past the last representable date",
                    horizon, last.date
                )));
            }
        }

        let mut ensemble = self.selector.select(series)?;
        ensemble.train(series);
        let combined = ensemble.predict(horizon)?;

        let predictions: Vec<PredictionRow> = combined
            .points
            .iter()
            .map(|p| {
                let lower = to_count(p.lower);
                let predicted = to_count(p.point).max(lower);
                PredictionRow {
                    date: p.date,
                    predicted_cases: predicted,
                    lower_bound: lower,
                    upper_bound: to_count(p.upper).max(predicted),
                }
            })
            .collect();

        let models_used: Vec<String> = combined
            .contributions
            .iter()
            .map(|c| c.model.clone())
            .collect();
        let data_points = series.len();
        let mode = self.mode(data_points);
        let message = self.message(population, data_points, mode, &models_used);

        info!(
            region = %population,
            data_points,
            horizon,
            models = ?models_used,
            "forecast generated"
        );

        Ok(ForecastReport {
            region: population.to_string(),
            models_used,
            models_failed: combined.failures,
            weights: combined.contributions,
            data_points,
            models_available: self.models_available(data_points),
            mode,
            predictions,
            message,
        })
    }

    /// Report per-model eligibility without training anything
    pub fn status(&self, population: &Population, series: &Series) -> StatusReport {
        let n = series.len();
        let mut models = BTreeMap::new();

        for rung in self.selector.ladder() {
            models.insert(
                rung.kind.key().to_string(),
                model_status(rung.kind.name(), true, n, rung.min_points),
            );
        }
        models.insert(
            DEEP_LEARNING_KEY.to_string(),
            model_status(
                DEEP_LEARNING_NAME,
                false,
                n,
                self.config().deep_learning_min_points,
            ),
        );

        let message = format!(
            "{}{} data points currently available. Keep importing bulletins to enable the advanced models ({} points).",
            region_prefix(population),
            n,
            self.config().advanced_min_points
        );

        StatusReport {
            region: population.to_string(),
            data_points: n,
            models,
            message,
        }
    }

    /// Operating mode for a series length
    pub fn mode(&self, data_points: usize) -> ForecastMode {
        if data_points >= self.config().advanced_min_points {
            ForecastMode::FullEnsemble
        } else {
            ForecastMode::Fallback
        }
    }

    fn models_available(&self, n: usize) -> ModelsAvailable {
        let eligible = self.selector.eligible(n);
        ModelsAvailable {
            linear: eligible.contains(&ModelKind::Linear),
            arima: eligible.contains(&ModelKind::Arima),
            prophet: eligible.contains(&ModelKind::Seasonal),
            lstm: n >= self.config().deep_learning_min_points,
        }
    }

    fn message(
        &self,
        population: &Population,
        n: usize,
        mode: ForecastMode,
        models_used: &[String],
    ) -> String {
        let config = self.config();
        match mode {
            ForecastMode::Fallback => format!(
                "{}Fallback mode: {} only ({} data points). {} and {} activate automatically from {} data points, {} from {}.",
                region_prefix(population),
                ModelKind::Linear.name(),
                n,
                ModelKind::Arima.name(),
                ModelKind::Seasonal.name(),
                config.advanced_min_points,
                DEEP_LEARNING_NAME,
                config.deep_learning_min_points
            ),
            ForecastMode::FullEnsemble => format!(
                "{}Full ensemble mode: advanced models active ({} data points). Forecast based on {}.",
                region_prefix(population),
                n,
                models_used.join(", ")
            ),
        }
    }
}

/// Clamp at zero and truncate to a whole case count
///
/// Values within 1e-9 below an integer count as that integer.
fn to_count(value: f64) -> u64 {
    (value.max(0.0) + 1e-9).trunc() as u64
}

fn region_prefix(population: &Population) -> String {
    match population.region() {
        Some(name) => format!("{}: ", name),
        None => String::new(),
    }
}

fn model_status(
    name: &str,
    implemented: bool,
    n: usize,
    min_required: usize,
) -> ModelStatus {
    let available = n >= min_required;
    let status = match (implemented, available) {
        (false, _) => "not implemented".to_string(),
        (true, true) => "active".to_string(),
        (true, false) => format!("waiting ({}/{})", n, min_required),
    };

    ModelStatus {
        name: name.to_string(),
        implemented,
        available,
        min_required,
        points_needed: min_required.saturating_sub(n),
        status,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series(values: &[f64]) -> Series {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        Series::from_pairs(
            values
                .iter()
                .enumerate()
                .map(|(i, &v)| (start + Days::new(i as u64), v)),
        )
        .unwrap()
    }

    #[test]
    fn test_to_count_truncates_and_clamps() {
        assert_eq!(to_count(12.9), 12);
        assert_eq!(to_count(-3.2), 0);
        assert_eq!(to_count(0.0), 0);
        assert_eq!(to_count(60.0 * (1.0 - 0.2)), 48);
        assert_eq!(to_count(47.999_999_999_999_99), 48);
    }

    #[test]
    fn test_zero_horizon_fails_fast() {
        let service = ForecastService::default();
        let result = service.forecast(&series(&[1.0, 2.0]), 0);
        assert!(matches!(result, Err(ForecastError::InvalidHorizon(0))));
    }

    #[test]
    fn test_horizon_past_calendar_end() {
        let series = Series::from_pairs(vec![
            (NaiveDate::MAX.pred_opt().unwrap(), 10.0),
            (NaiveDate::MAX, 20.0),
        ])
        .unwrap();

        let result = ForecastService::default().forecast(&series, 1);
        assert!(matches!(result, Err(ForecastError::DataError(_))));
    }

    #[test]
    fn test_fallback_message_mentions_threshold() {
        let service = ForecastService::default();
        let report = service.forecast(&series(&[10.0, 20.0]), 3).unwrap();
        assert_eq!(report.mode, ForecastMode::Fallback);
        assert!(report.message.contains("30"));
        assert!(report.message.contains("Linear Extrapolation"));
        assert_eq!(report.region, "National");
    }

    #[test]
    fn test_regional_message_prefix() {
        let service = ForecastService::default();
        let population = Population::Region("Saint-Louis".to_string());
        let report = service
            .forecast_for(&population, &series(&[4.0, 6.0, 9.0]), 2)
            .unwrap();
        assert_eq!(report.region, "Saint-Louis");
        assert!(report.message.starts_with("Saint-Louis: "));
    }

    #[test]
    fn test_status_counts_missing_points() {
        let service = ForecastService::default();
        let report = service.status(&Population::National, &series(&[1.0; 12]));

        assert_eq!(report.data_points, 12);
        assert!(report.models["linear"].available);
        assert_eq!(report.models["arima"].points_needed, 18);
        assert_eq!(report.models["prophet"].status, "waiting (12/30)");
        assert_eq!(report.models["lstm"].points_needed, 88);
        assert!(!report.models["lstm"].implemented);
    }

    #[test]
    fn test_invalid_configuration_is_rejected() {
        let config = ForecastConfig {
            linear_weight: -1.0,
            ..ForecastConfig::default()
        };
        assert!(matches!(
            ForecastService::new(config),
            Err(ForecastError::ConfigError(_))
        ));
    }
}
