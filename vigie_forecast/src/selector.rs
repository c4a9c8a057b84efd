//! Data-sufficiency policy deciding which models take part in a forecast

use crate::config::ForecastConfig;
use crate::data::Series;
use crate::ensemble::Ensemble;
use crate::error::{ForecastError, Result};
use crate::models::{ArimaModel, LinearExtrapolation, Model, ModelKind, SeasonalModel};
use tracing::info;

/// One step of the eligibility ladder
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rung {
    /// Model variant
    pub kind: ModelKind,
    /// Series length from which the variant is admitted
    pub min_points: usize,
    /// Prior weight inside the ensemble
    pub weight: f64,
}

/// Builds an ensemble of every model the series is long enough for
#[derive(Debug, Clone, Default)]
pub struct ModelSelector {
    config: ForecastConfig,
}

impl ModelSelector {
    /// Create a selector over a configuration
    pub fn new(config: ForecastConfig) -> Self {
        Self { config }
    }

    /// The configuration in use
    pub fn config(&self) -> &ForecastConfig {
        &self.config
    }

    /// Thresholds and weights of every variant, in selection order
    pub fn ladder(&self) -> Vec<Rung> {
        ModelKind::ALL
            .iter()
            .map(|&kind| match kind {
                ModelKind::Linear => Rung {
                    kind,
                    min_points: self.config.linear_min_points,
                    weight: self.config.linear_weight,
                },
                ModelKind::Arima => Rung {
                    kind,
                    min_points: self.config.advanced_min_points,
                    weight: self.config.arima_weight,
                },
                ModelKind::Seasonal => Rung {
                    kind,
                    min_points: self.config.advanced_min_points,
                    weight: self.config.seasonal_weight,
                },
            })
            .collect()
    }

    /// Variants eligible for a series of `n` points
    pub fn eligible(&self, n: usize) -> Vec<ModelKind> {
        self.ladder()
            .into_iter()
            .filter(|rung| n >= rung.min_points)
            .map(|rung| rung.kind)
            .collect()
    }

    /// Fresh, untrained instance of a variant
    pub fn build(&self, kind: ModelKind) -> Model {
        match kind {
            ModelKind::Linear => LinearExtrapolation::from_config(&self.config).into(),
            ModelKind::Arima => ArimaModel::from_config(&self.config).into(),
            ModelKind::Seasonal => SeasonalModel::from_config(&self.config).into(),
        }
    }

    /// Build the ensemble for a series
    ///
    /// Fails only when the series is shorter than the fallback threshold.
    pub fn select(&self, series: &Series) -> Result<Ensemble> {
        let n = series.len();
        if n < self.config.linear_min_points {
            return Err(ForecastError::InsufficientData {
                needed: self.config.linear_min_points,
                got: n,
            });
        }

        info!(data_points = n, "selecting forecast models");

        let mut ensemble = Ensemble::new();
        for rung in self.ladder() {
            if n >= rung.min_points {
                info!(model = rung.kind.name(), weight = rung.weight, "model enabled");
                ensemble.add_model(self.build(rung.kind), rung.weight)?;
            } else {
                info!(
                    model = rung.kind.name(),
                    needed = rung.min_points,
                    available = n,
                    "model disabled: not enough data"
                );
            }
        }

        Ok(ensemble)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Days, NaiveDate};
    use rstest::rstest;

    fn series(n: usize) -> Series {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        Series::from_pairs((0..n).map(|i| (start + Days::new(i as u64), i as f64)))
            .unwrap()
    }

    #[rstest]
    #[case(2, vec![ModelKind::Linear])]
    #[case(29, vec![ModelKind::Linear])]
    #[case(30, vec![ModelKind::Linear, ModelKind::Arima, ModelKind::Seasonal])]
    #[case(150, vec![ModelKind::Linear, ModelKind::Arima, ModelKind::Seasonal])]
    fn test_ladder(#[case] n: usize, #[case] expected: Vec<ModelKind>) {
        let selector = ModelSelector::default();
        assert_eq!(selector.eligible(n), expected);
        assert_eq!(selector.select(&series(n)).unwrap().kinds(), expected);
    }

    #[rstest]
    #[case(0)]
    #[case(1)]
    fn test_too_few_points(#[case] n: usize) {
        let result = ModelSelector::default().select(&series(n));
        assert!(matches!(
            result,
            Err(ForecastError::InsufficientData { needed: 2, got }) if got == n
        ));
    }

    #[test]
    fn test_weights_follow_configuration() {
        let ensemble = ModelSelector::default().select(&series(30)).unwrap();
        let weights: Vec<f64> = ensemble.members().iter().map(|m| m.weight()).collect();
        assert_eq!(weights, vec![1.0, 2.0, 2.0]);
    }

    #[test]
    fn test_overridden_threshold() {
        let selector = ModelSelector::new(ForecastConfig {
            advanced_min_points: 10,
            ..ForecastConfig::default()
        });
        assert_eq!(selector.eligible(10).len(), 3);
        assert_eq!(selector.eligible(9), vec![ModelKind::Linear]);
    }
}
