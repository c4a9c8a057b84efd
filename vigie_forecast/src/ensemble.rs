//! Weighted combination of independently trained models

use crate::data::Series;
use crate::error::{ForecastError, Result};
use crate::models::{FitOutcome, ForecastModel, ForecastPoint, Model, ModelKind};
use serde::Serialize;
use tracing::warn;

/// One model of the ensemble with its prior weight
#[derive(Debug, Clone)]
pub struct Member {
    model: Model,
    weight: f64,
    outcome: Option<FitOutcome>,
}

impl Member {
    /// The wrapped model
    pub fn model(&self) -> &Model {
        &self.model
    }

    /// Prior weight as configured
    pub fn weight(&self) -> f64 {
        self.weight
    }

    /// Training outcome, `None` before `Ensemble::train`
    pub fn outcome(&self) -> Option<&FitOutcome> {
        self.outcome.as_ref()
    }
}

/// Share of the combined forecast contributed by one model
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Contribution {
    /// Model name
    pub model: String,
    /// Renormalised weight; contributions sum to 1
    pub weight: f64,
}

/// A model that was attempted but produced no forecast
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailedModel {
    /// Model name
    pub model: String,
    /// Why it was excluded
    pub reason: String,
}

/// Combined forecast together with what went into it
#[derive(Debug, Clone)]
pub struct EnsembleForecast {
    /// One point per horizon day
    pub points: Vec<ForecastPoint>,
    /// Models that produced output, with their renormalised weights
    pub contributions: Vec<Contribution>,
    /// Models that failed to train or predict
    pub failures: Vec<FailedModel>,
}

/// Weighted collection of forecasting models
#[derive(Debug, Clone, Default)]
pub struct Ensemble {
    members: Vec<Member>,
}

impl Ensemble {
    /// Create an empty ensemble
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a model with a strictly positive prior weight
    pub fn add_model<M: Into<Model>>(&mut self, model: M, weight: f64) -> Result<()> {
        if !(weight.is_finite() && weight > 0.0) {
            return Err(ForecastError::ConfigError(format!(
                "Ensemble weights must be positive, got {}",
                weight
            )));
        }

        self.members.push(Member {
            model: model.into(),
            weight,
            outcome: None,
        });
        Ok(())
    }

    /// All members, trained or not
    pub fn members(&self) -> &[Member] {
        &self.members
    }

    /// Variants present in the ensemble, in insertion order
    pub fn kinds(&self) -> Vec<ModelKind> {
        self.members.iter().map(|m| m.model.kind()).collect()
    }

    /// Number of members
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Whether the ensemble has no members
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Train every member independently
    ///
    /// A member that fails stays in the list with its failure recorded and
    /// is left out of prediction.
    pub fn train(&mut self, series: &Series) {
        for member in &mut self.members {
            let outcome = if member.model.can_train(series.len()) {
                member.model.train(series)
            } else {
                FitOutcome::FitFailed(format!(
                    "requires at least {} data points, got {}",
                    member.model.min_data_points(),
                    series.len()
                ))
            };

            if let FitOutcome::FitFailed(reason) = &outcome {
                warn!(model = member.model.name(), %reason, "model excluded after failed training");
            }
            member.outcome = Some(outcome);
        }
    }

    /// Names of members whose training succeeded
    pub fn trained_model_names(&self) -> Vec<String> {
        self.members
            .iter()
            .filter(|m| m.model.is_trained())
            .map(|m| m.model.name().to_string())
            .collect()
    }

    /// Combine the forecasts of every trained member
    ///
    /// Point estimates and both bounds are weighted sums with weights
    /// renormalised over the members that produced a forecast. Dates come
    /// from the first such member.
    pub fn predict(&self, horizon: usize) -> Result<EnsembleForecast> {
        let mut forecasts: Vec<(&Member, Vec<ForecastPoint>)> = Vec::new();
        let mut failures = Vec::new();

        for member in &self.members {
            let name = member.model.name();
            if !member.model.is_trained() {
                let reason = match &member.outcome {
                    Some(FitOutcome::FitFailed(reason)) => reason.clone(),
                    _ => "not trained".to_string(),
                };
                failures.push(FailedModel {
                    model: name.to_string(),
                    reason,
                });
                continue;
            }

            match member.model.predict(horizon) {
                Ok(points) if points.len() == horizon => forecasts.push((member, points)),
                Ok(points) => {
                    let reason = format!(
                        "returned {} points for a horizon of {}",
                        points.len(),
                        horizon
                    );
                    warn!(model = name, %reason, "model excluded from combination");
                    failures.push(FailedModel {
                        model: name.to_string(),
                        reason,
                    });
                }
                Err(err) => {
                    warn!(model = name, error = %err, "model excluded from combination");
                    failures.push(FailedModel {
                        model: name.to_string(),
                        reason: err.to_string(),
                    });
                }
            }
        }

        if forecasts.is_empty() {
            return Err(ForecastError::EnsembleFailure(
                "no model could generate a forecast".to_string(),
            ));
        }

        let total: f64 = forecasts.iter().map(|(m, _)| m.weight).sum();
        let contributions: Vec<Contribution> = forecasts
            .iter()
            .map(|(m, _)| Contribution {
                model: m.model.name().to_string(),
                weight: m.weight / total,
            })
            .collect();

        let points = (0..horizon)
            .map(|h| {
                let mut combined = ForecastPoint {
                    date: forecasts[0].1[h].date,
                    point: 0.0,
                    lower: 0.0,
                    upper: 0.0,
                };
                for ((_, points), share) in forecasts.iter().zip(&contributions) {
                    combined.point += points[h].point * share.weight;
                    combined.lower += points[h].lower * share.weight;
                    combined.upper += points[h].upper * share.weight;
                }
                combined
            })
            .collect();

        Ok(EnsembleForecast {
            points,
            contributions,
            failures,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ForecastConfig;
    use crate::models::{ArimaModel, LinearExtrapolation, SeasonalModel};
    use approx::assert_relative_eq;
    use chrono::{Days, NaiveDate};

    fn daily_series(n: usize) -> Series {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        Series::from_pairs((0..n).map(|i| {
            let v = 100.0 + 3.0 * i as f64 + 5.0 * (i as f64 * 0.9).cos();
            (start + Days::new(i as u64), v)
        }))
        .unwrap()
    }

    #[test]
    fn test_rejects_non_positive_weight() {
        let mut ensemble = Ensemble::new();
        assert!(ensemble.add_model(LinearExtrapolation::new(), 0.0).is_err());
        assert!(ensemble
            .add_model(LinearExtrapolation::new(), f64::NAN)
            .is_err());
        assert!(ensemble.is_empty());
    }

    #[test]
    fn test_single_member_passes_through() {
        let series = daily_series(5);
        let mut ensemble = Ensemble::new();
        ensemble.add_model(LinearExtrapolation::new(), 1.0).unwrap();
        ensemble.train(&series);

        let mut alone = LinearExtrapolation::new();
        alone.train(&series);

        let combined = ensemble.predict(4).unwrap();
        assert_eq!(combined.points, alone.predict(4).unwrap());
        assert_eq!(combined.contributions.len(), 1);
        assert_relative_eq!(combined.contributions[0].weight, 1.0);
    }

    #[test]
    fn test_failed_member_weights_are_renormalised() {
        let series = daily_series(40);
        let strict = ForecastConfig {
            advanced_min_points: 1000,
            ..ForecastConfig::default()
        };

        let mut ensemble = Ensemble::new();
        ensemble.add_model(LinearExtrapolation::new(), 1.0).unwrap();
        ensemble.add_model(ArimaModel::new(), 2.0).unwrap();
        ensemble.add_model(SeasonalModel::from_config(&strict), 2.0).unwrap();
        ensemble.train(&series);

        assert_eq!(
            ensemble.trained_model_names(),
            vec!["Linear Extrapolation", "ARIMA"]
        );
        assert!(matches!(
            ensemble.members()[2].outcome(),
            Some(FitOutcome::FitFailed(_))
        ));

        let combined = ensemble.predict(5).unwrap();
        let weights: Vec<f64> = combined.contributions.iter().map(|c| c.weight).collect();
        assert_relative_eq!(weights.iter().sum::<f64>(), 1.0, epsilon = 1e-12);
        assert_relative_eq!(weights[1] / weights[0], 2.0, epsilon = 1e-12);
        assert_eq!(combined.failures.len(), 1);
        assert_eq!(combined.failures[0].model, "Prophet");
    }

    #[test]
    fn test_weighted_average_of_members() {
        let series = daily_series(35);
        let mut linear = LinearExtrapolation::new();
        let mut arima = ArimaModel::new();
        linear.train(&series);
        arima.train(&series);
        let a = linear.predict(3).unwrap();
        let b = arima.predict(3).unwrap();

        let mut ensemble = Ensemble::new();
        ensemble.add_model(LinearExtrapolation::new(), 1.0).unwrap();
        ensemble.add_model(ArimaModel::new(), 2.0).unwrap();
        ensemble.train(&series);
        let combined = ensemble.predict(3).unwrap();

        for h in 0..3 {
            assert_eq!(combined.points[h].date, a[h].date);
            assert_relative_eq!(
                combined.points[h].point,
                (a[h].point + 2.0 * b[h].point) / 3.0,
                epsilon = 1e-9
            );
            assert_relative_eq!(
                combined.points[h].upper,
                (a[h].upper + 2.0 * b[h].upper) / 3.0,
                epsilon = 1e-9
            );
        }
    }

    #[test]
    fn test_no_trained_member_is_an_ensemble_failure() {
        let mut ensemble = Ensemble::new();
        ensemble.add_model(ArimaModel::new(), 2.0).unwrap();
        ensemble.train(&daily_series(3));

        assert!(ensemble.trained_model_names().is_empty());
        assert!(matches!(
            ensemble.predict(2),
            Err(ForecastError::EnsembleFailure(_))
        ));
    }
}
