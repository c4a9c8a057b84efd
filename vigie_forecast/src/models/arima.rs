//! ARIMA model with a bounded order search
//!
//! Every `(p, d, q)` in the configured grid is fitted by conditional sum of
//! squares; the candidate with the lowest AIC is kept. Iteration runs over
//! `p`, then `d`, then `q`, and only a strictly lower AIC replaces the
//! current best, so ties go to the first candidate found.

use crate::config::{ArimaConfig, ForecastConfig};
use crate::data::Series;
use crate::error::{ForecastError, Result};
use crate::models::{check_length, FitOutcome, ForecastModel, ForecastPoint};
use crate::utils::future_dates;
use chrono::NaiveDate;
use std::fmt;
use tracing::debug;
use vigie_math::differencing::{difference, differencing_polynomial, integrate};
use vigie_math::optimization::{nelder_mead, NelderMeadConfig};
use vigie_math::stats::{mean, two_sided_z};

pub(crate) const NAME: &str = "ARIMA";

/// Smallest residual variance used in the likelihood
const MIN_VARIANCE: f64 = 1e-12;
/// Stationarity/invertibility box for AR and MA coefficients
const COEFFICIENT_BOUND: f64 = 0.99;

/// Model order `(p, d, q)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ArimaOrder {
    /// Autoregressive order
    pub p: usize,
    /// Differencing order
    pub d: usize,
    /// Moving-average order
    pub q: usize,
}

impl ArimaOrder {
    /// Create a new order
    pub fn new(p: usize, d: usize, q: usize) -> Self {
        Self { p, d, q }
    }

    /// Estimated parameters: AR + MA + intercept
    pub fn num_params(&self) -> usize {
        self.p + self.q + 1
    }
}

impl fmt::Display for ArimaOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{},{})", self.p, self.d, self.q)
    }
}

/// ARIMA model whose order is chosen by AIC at training time
#[derive(Debug, Clone)]
pub struct ArimaModel {
    min_data_points: usize,
    config: ArimaConfig,
    fit: Option<ArimaFit>,
}

/// Fitted parameters for one order
#[derive(Debug, Clone)]
struct ArimaFit {
    order: ArimaOrder,
    intercept: f64,
    ar: Vec<f64>,
    ma: Vec<f64>,
    original: Vec<f64>,
    differenced: Vec<f64>,
    residuals: Vec<f64>,
    sigma2: f64,
    aic: f64,
    last_date: NaiveDate,
}

impl ArimaModel {
    /// Create the model with default thresholds and grid
    pub fn new() -> Self {
        Self::from_config(&ForecastConfig::default())
    }

    /// Create the model from the engine configuration
    pub fn from_config(config: &ForecastConfig) -> Self {
        Self {
            min_data_points: config.advanced_min_points,
            config: config.arima.clone(),
            fit: None,
        }
    }

    /// Order selected by the last successful training
    pub fn order(&self) -> Option<ArimaOrder> {
        self.fit.as_ref().map(|f| f.order)
    }

    /// AIC of the selected order
    pub fn aic(&self) -> Option<f64> {
        self.fit.as_ref().map(|f| f.aic)
    }

    /// Fitted AR coefficients
    pub fn ar_coefficients(&self) -> Option<&[f64]> {
        self.fit.as_ref().map(|f| f.ar.as_slice())
    }

    /// Fitted MA coefficients
    pub fn ma_coefficients(&self) -> Option<&[f64]> {
        self.fit.as_ref().map(|f| f.ma.as_slice())
    }

    /// Fit one specific order to a series of values
    pub fn fit_order(
        values: &[f64],
        order: ArimaOrder,
        optimizer: NelderMeadConfig,
    ) -> Result<f64> {
        fit_candidate(values, order, optimizer).map(|c| c.aic)
    }

    fn search(&self, series: &Series) -> Result<ArimaFit> {
        check_length(NAME, self.min_data_points, series)?;

        let last_date = series
            .last()
            .map(|o| o.date)
            .ok_or_else(|| ForecastError::FitFailed {
                model: NAME.to_string(),
                reason: "empty series".to_string(),
            })?;
        let values = series.values();
        let optimizer = self.config.optimizer();

        let mut best: Option<Candidate> = None;
        for p in 0..=self.config.max_p {
            for d in 0..=self.config.max_d {
                for q in 0..=self.config.max_q {
                    let order = ArimaOrder::new(p, d, q);
                    match fit_candidate(&values, order, optimizer) {
                        Ok(candidate) => {
                            debug!(order = %order, aic = candidate.aic, "ARIMA candidate fitted");
                            if best.as_ref().map_or(true, |b| candidate.aic < b.aic) {
                                best = Some(candidate);
                            }
                        }
                        Err(err) => debug!(order = %order, error = %err, "ARIMA candidate skipped"),
                    }
                }
            }
        }

        let best = best.ok_or_else(|| ForecastError::FitFailed {
            model: NAME.to_string(),
            reason: "no candidate order could be fitted".to_string(),
        })?;
        debug!(order = %best.order, aic = best.aic, "ARIMA order selected");

        Ok(ArimaFit {
            order: best.order,
            intercept: best.intercept,
            ar: best.ar,
            ma: best.ma,
            original: values,
            differenced: best.differenced,
            residuals: best.residuals,
            sigma2: best.sigma2,
            aic: best.aic,
            last_date,
        })
    }
}

impl Default for ArimaModel {
    fn default() -> Self {
        Self::new()
    }
}

impl ForecastModel for ArimaModel {
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
        let (fit, outcome) = FitOutcome::from_result(self.search(series));
        self.fit = fit;
        outcome
    }

    fn predict(&self, horizon: usize) -> Result<Vec<ForecastPoint>> {
        let fit = self
            .fit
            .as_ref()
            .ok_or_else(|| ForecastError::UntrainedModel(NAME.to_string()))?;

        let means = fit.forecast_mean(horizon);
        let z = two_sided_z(self.config.confidence)?;
        let psi = fit.psi_weights(horizon);

        let mut cumulative = 0.0;
        future_dates(fit.last_date, horizon)
            .into_iter()
            .zip(means)
            .zip(psi)
            .map(|((date, estimate), weight)| {
                cumulative += weight * weight;
                let half_width = z * (fit.sigma2 * cumulative).sqrt();
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

impl ArimaFit {
    /// Point forecasts on the original scale
    fn forecast_mean(&self, horizon: usize) -> Vec<f64> {
        let mut extended = self.differenced.clone();
        let mut errors = self.residuals.clone();

        for _ in 0..horizon {
            let t = extended.len();
            let mut next = self.intercept;
            for (i, phi) in self.ar.iter().enumerate() {
                if t > i {
                    next += phi * (extended[t - 1 - i] - self.intercept);
                }
            }
            for (i, theta) in self.ma.iter().enumerate() {
                if t > i {
                    next += theta * errors[t - 1 - i];
                }
            }
            extended.push(next);
            errors.push(0.0);
        }

        let forecast = &extended[self.differenced.len()..];
        integrate(forecast, &self.original, self.order.d)
    }

    /// MA(infinity) weights of the integrated model, psi_0 = 1
    fn psi_weights(&self, horizon: usize) -> Vec<f64> {
        // phi(B) (1 - B)^d written as 1 - sum phi*_j B^j
        let ar_poly: Vec<f64> = std::iter::once(1.0)
            .chain(self.ar.iter().map(|a| -a))
            .collect();
        let diff_poly: Vec<f64> = std::iter::once(1.0)
            .chain(differencing_polynomial(self.order.d).into_iter().map(|c| -c))
            .collect();
        let mut product = vec![0.0; ar_poly.len() + diff_poly.len() - 1];
        for (i, a) in ar_poly.iter().enumerate() {
            for (j, b) in diff_poly.iter().enumerate() {
                product[i + j] += a * b;
            }
        }
        let phi_star: Vec<f64> = product.iter().skip(1).map(|c| -c).collect();

        let mut psi = Vec::with_capacity(horizon);
        for j in 0..horizon {
            if j == 0 {
                psi.push(1.0);
                continue;
            }
            let mut value = self.ma.get(j - 1).copied().unwrap_or(0.0);
            for (i, phi) in phi_star.iter().enumerate().take(j) {
                value += phi * psi[j - 1 - i];
            }
            psi.push(value);
        }
        psi
    }
}

#[derive(Debug, Clone)]
struct Candidate {
    order: ArimaOrder,
    intercept: f64,
    ar: Vec<f64>,
    ma: Vec<f64>,
    differenced: Vec<f64>,
    residuals: Vec<f64>,
    sigma2: f64,
    aic: f64,
}

fn fit_candidate(
    values: &[f64],
    order: ArimaOrder,
    optimizer: NelderMeadConfig,
) -> Result<Candidate> {
    let ArimaOrder { p, d, q } = order;
    let differenced = difference(values, d);
    let start = p.max(q);

    if differenced.len() < start + 2 {
        return Err(ForecastError::FitFailed {
            model: NAME.to_string(),
            reason: format!("series too short for order {}", order),
        });
    }

    let level = mean(&differenced)?;
    let (intercept, ar, ma) = if p == 0 && q == 0 {
        (level, Vec::new(), Vec::new())
    } else {
        let mut initial = Vec::with_capacity(p + q + 1);
        initial.push(level);
        initial.extend((0..p).map(|i| 0.1 / (i + 1) as f64));
        initial.extend((0..q).map(|i| 0.1 / (i + 1) as f64));

        let mut bounds = vec![(f64::NEG_INFINITY, f64::INFINITY)];
        bounds.extend(
            std::iter::repeat((-COEFFICIENT_BOUND, COEFFICIENT_BOUND)).take(p + q),
        );

        let minimum = nelder_mead(
            |params| {
                let (ar, ma) = params[1..].split_at(p);
                conditional_residuals(&differenced, params[0], ar, ma).0
            },
            &initial,
            Some(&bounds),
            optimizer,
        );
        if !minimum.converged {
            debug!(
                order = %order,
                iterations = minimum.iterations,
                "ARIMA optimiser hit its iteration cap"
            );
        }

        let point = minimum.point;
        (point[0], point[1..1 + p].to_vec(), point[1 + p..].to_vec())
    };

    let (css, residuals) = conditional_residuals(&differenced, intercept, &ar, &ma);
    let n_eff = (differenced.len() - start) as f64;
    let sigma2 = (css / n_eff).max(MIN_VARIANCE);
    let log_likelihood = -0.5 * n_eff * (1.0 + (2.0 * std::f64::consts::PI * sigma2).ln());
    let aic = -2.0 * log_likelihood + 2.0 * order.num_params() as f64;

    let coefficients_finite = ar.iter().chain(&ma).all(|c| c.is_finite());
    if !(css.is_finite() && aic.is_finite() && coefficients_finite) {
        return Err(ForecastError::FitFailed {
            model: NAME.to_string(),
            reason: format!("non-finite fit for order {}", order),
        });
    }

    Ok(Candidate {
        order,
        intercept,
        ar,
        ma,
        differenced,
        residuals,
        sigma2,
        aic,
    })
}

/// Conditional sum of squares and the residual sequence
fn conditional_residuals(
    series: &[f64],
    intercept: f64,
    ar: &[f64],
    ma: &[f64],
) -> (f64, Vec<f64>) {
    let start = ar.len().max(ma.len());
    let mut residuals = vec![0.0; series.len()];
    let mut css = 0.0;

    for t in start..series.len() {
        let mut prediction = intercept;
        for (i, phi) in ar.iter().enumerate() {
            prediction += phi * (series[t - 1 - i] - intercept);
        }
        for (i, theta) in ma.iter().enumerate() {
            prediction += theta * residuals[t - 1 - i];
        }
        let error = series[t] - prediction;
        residuals[t] = error;
        css += error * error;
    }

    (css, residuals)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Days;

    fn series_from(values: &[f64]) -> Series {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        Series::from_pairs(
            values
                .iter()
                .enumerate()
                .map(|(i, &v)| (start + Days::new(i as u64), v)),
        )
        .unwrap()
    }

    fn wavy_trend(n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| 20.0 + 1.5 * i as f64 + 4.0 * (i as f64 * 0.7).sin())
            .collect()
    }

    #[test]
    fn test_order_search_selects_within_grid() {
        let mut model = ArimaModel::new();
        assert_eq!(
            model.train(&series_from(&wavy_trend(40))),
            FitOutcome::Trained
        );

        let order = model.order().unwrap();
        assert!(order.p <= 2 && order.d <= 1 && order.q <= 2);
        assert!(model.aic().unwrap().is_finite());
        assert_eq!(model.ar_coefficients().unwrap().len(), order.p);
        assert_eq!(model.ma_coefficients().unwrap().len(), order.q);
    }

    #[test]
    fn test_selected_order_has_lowest_aic() {
        let values = wavy_trend(40);
        let mut model = ArimaModel::new();
        model.train(&series_from(&values));
        let best = model.aic().unwrap();

        let optimizer = ArimaConfig::default().optimizer();
        for p in 0..=2 {
            for d in 0..=1 {
                for q in 0..=2 {
                    let order = ArimaOrder::new(p, d, q);
                    if let Ok(aic) = ArimaModel::fit_order(&values, order, optimizer) {
                        assert!(best <= aic + 1e-9);
                    }
                }
            }
        }
    }

    #[test]
    fn test_prediction_shape_and_bounds() {
        let mut model = ArimaModel::new();
        model.train(&series_from(&wavy_trend(45)));

        let points = model.predict(10).unwrap();
        assert_eq!(points.len(), 10);
        assert_eq!(points[0].date, NaiveDate::from_ymd_opt(2024, 2, 15).unwrap());
        for pair in points.windows(2) {
            assert_eq!(pair[1].date - pair[0].date, chrono::Duration::days(1));
        }
        for p in &points {
            assert!(p.lower <= p.point && p.point <= p.upper);
            assert!(p.lower >= 0.0);
        }
    }

    #[test]
    fn test_interval_widens_with_horizon() {
        let mut model = ArimaModel::new();
        model.train(&series_from(&wavy_trend(60)));

        let points = model.predict(8).unwrap();
        let first = points[0].upper - points[0].lower;
        let last = points[7].upper - points[7].lower;
        assert!(last >= first);
    }

    #[test]
    fn test_random_walk_psi_weights_are_ones() {
        let fit = ArimaFit {
            order: ArimaOrder::new(0, 1, 0),
            intercept: 0.0,
            ar: vec![],
            ma: vec![],
            original: vec![1.0, 2.0],
            differenced: vec![1.0],
            residuals: vec![0.0],
            sigma2: 1.0,
            aic: 0.0,
            last_date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
        };
        assert_eq!(fit.psi_weights(4), vec![1.0, 1.0, 1.0, 1.0]);
    }

    #[test]
    fn test_short_series_is_rejected() {
        let mut model = ArimaModel::new();
        let outcome = model.train(&series_from(&wavy_trend(29)));
        assert!(matches!(outcome, FitOutcome::FitFailed(_)));
        assert!(matches!(
            model.predict(3),
            Err(ForecastError::UntrainedModel(_))
        ));
    }

    #[test]
    fn test_order_display() {
        assert_eq!(ArimaOrder::new(2, 1, 0).to_string(), "(2,1,0)");
        assert_eq!(ArimaOrder::new(2, 1, 1).num_params(), 4);
    }
}
