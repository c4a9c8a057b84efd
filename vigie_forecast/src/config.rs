//! Engine configuration
//!
//! Every threshold, prior weight and model setting the selector and models
//! use lives here, so that none of them is hard-coded in model code.

use crate::error::{ForecastError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use vigie_math::optimization::NelderMeadConfig;

/// Top-level configuration passed to the selector and the service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastConfig {
    /// Minimum points for Linear Extrapolation and for any forecast at all
    pub linear_min_points: usize,
    /// Minimum points for ARIMA and the seasonal model
    pub advanced_min_points: usize,
    /// Threshold reported for a deep-learning model by the status query
    pub deep_learning_min_points: usize,
    /// Prior weight of Linear Extrapolation
    pub linear_weight: f64,
    /// Prior weight of ARIMA
    pub arima_weight: f64,
    /// Prior weight of the seasonal model
    pub seasonal_weight: f64,
    /// Relative half-width of the Linear Extrapolation band
    pub linear_band: f64,
    /// ARIMA order search settings
    pub arima: ArimaConfig,
    /// Seasonal model settings
    pub seasonal: SeasonalConfig,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            linear_min_points: 2,
            advanced_min_points: 30,
            deep_learning_min_points: 100,
            linear_weight: 1.0,
            arima_weight: 2.0,
            seasonal_weight: 2.0,
            linear_band: 0.2,
            arima: ArimaConfig::default(),
            seasonal: SeasonalConfig::default(),
        }
    }
}

impl ForecastConfig {
    /// Load a configuration from a JSON file; missing fields take defaults
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Parse a configuration from a JSON string; missing fields take defaults
    pub fn from_json_str(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that thresholds, weights and levels are usable
    pub fn validate(&self) -> Result<()> {
        if self.linear_min_points < 2 {
            return Err(ForecastError::ConfigError(format!(
                "linear_min_points must be at least 2, got {}",
                self.linear_min_points
            )));
        }
        if self.advanced_min_points < self.linear_min_points {
            return Err(ForecastError::ConfigError(format!(
                "advanced_min_points ({}) is below linear_min_points ({})",
                self.advanced_min_points, self.linear_min_points
            )));
        }

        for (name, weight) in [
            ("linear_weight", self.linear_weight),
            ("arima_weight", self.arima_weight),
            ("seasonal_weight", self.seasonal_weight),
        ] {
            if !(weight.is_finite() && weight > 0.0) {
                return Err(ForecastError::ConfigError(format!(
                    "{} must be positive, got {}",
                    name, weight
                )));
            }
        }

        if !(self.linear_band.is_finite() && (0.0..1.0).contains(&self.linear_band)) {
            return Err(ForecastError::ConfigError(format!(
                "linear_band must be in [0, 1), got {}",
                self.linear_band
            )));
        }

        self.arima.validate()?;
        self.seasonal.validate()
    }
}

/// Bounds of the ARIMA order grid and fitting controls
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArimaConfig {
    /// Largest autoregressive order tried
    pub max_p: usize,
    /// Largest differencing order tried
    pub max_d: usize,
    /// Largest moving-average order tried
    pub max_q: usize,
    /// Central coverage of the forecast interval
    pub confidence: f64,
    /// Iteration cap for each candidate fit
    pub max_iterations: usize,
    /// Relative convergence tolerance for each candidate fit
    pub tolerance: f64,
}

impl Default for ArimaConfig {
    fn default() -> Self {
        Self {
            max_p: 2,
            max_d: 1,
            max_q: 2,
            confidence: 0.95,
            max_iterations: 1000,
            tolerance: 1e-8,
        }
    }
}

impl ArimaConfig {
    /// Optimiser settings for one candidate fit
    pub fn optimizer(&self) -> NelderMeadConfig {
        NelderMeadConfig {
            max_iterations: self.max_iterations,
            tolerance: self.tolerance,
            ..NelderMeadConfig::default()
        }
    }

    fn validate(&self) -> Result<()> {
        if !(self.confidence > 0.0 && self.confidence < 1.0) {
            return Err(ForecastError::ConfigError(format!(
                "arima.confidence must be in (0, 1), got {}",
                self.confidence
            )));
        }
        if self.max_iterations == 0 || !(self.tolerance > 0.0) {
            return Err(ForecastError::ConfigError(
                "arima.max_iterations and arima.tolerance must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Components and priors of the additive seasonal model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeasonalConfig {
    /// Fit a within-day cycle (period of one day)
    pub daily: bool,
    /// Fit a day-of-week cycle (period of seven days)
    pub weekly: bool,
    /// Fit an annual cycle; off because outbreak histories are short
    pub yearly: bool,
    /// Central coverage of the uncertainty interval
    pub interval_width: f64,
    /// Fourier order of the daily cycle
    pub daily_order: usize,
    /// Fourier order of the weekly cycle
    pub weekly_order: usize,
    /// Fourier order of the yearly cycle
    pub yearly_order: usize,
    /// Potential trend changepoints
    pub n_changepoints: usize,
    /// Share of the history in which changepoints may be placed
    pub changepoint_range: f64,
    /// Ridge penalty on changepoint slope adjustments
    pub changepoint_penalty: f64,
    /// Ridge penalty on Fourier coefficients
    pub seasonality_penalty: f64,
}

impl Default for SeasonalConfig {
    fn default() -> Self {
        Self {
            daily: true,
            weekly: true,
            yearly: false,
            interval_width: 0.95,
            daily_order: 4,
            weekly_order: 3,
            yearly_order: 10,
            n_changepoints: 25,
            changepoint_range: 0.8,
            changepoint_penalty: 1.0,
            seasonality_penalty: 0.01,
        }
    }
}

impl SeasonalConfig {
    fn validate(&self) -> Result<()> {
        if !(self.interval_width > 0.0 && self.interval_width < 1.0) {
            return Err(ForecastError::ConfigError(format!(
                "seasonal.interval_width must be in (0, 1), got {}",
                self.interval_width
            )));
        }
        if !(self.changepoint_range > 0.0 && self.changepoint_range <= 1.0) {
            return Err(ForecastError::ConfigError(format!(
                "seasonal.changepoint_range must be in (0, 1], got {}",
                self.changepoint_range
            )));
        }
        if !(self.changepoint_penalty >= 0.0 && self.seasonality_penalty >= 0.0) {
            return Err(ForecastError::ConfigError(
                "seasonal penalties must be non-negative".to_string(),
            ));
        }
        Ok(())
    }
}
