//! # Vigie Forecast
//!
//! Adaptive multi-model forecasting of daily outbreak case counts.
//!
//! ## Features
//!
//! - Case-count loading from CSV (national aggregate or per region)
//! - Linear Extrapolation, usable from two observations
//! - ARIMA with AIC order selection and a Prophet-style seasonal model,
//!   enabled once enough history has accumulated
//! - Weighted ensemble that drops any model failing to train or predict
//! - JSON reports with integer predictions and uncertainty bounds
//!
//! ## Model ladder
//!
//! The models taking part in a forecast depend only on the series length:
//!
//! | Data points | Models                                  |
//! |-------------|-----------------------------------------|
//! | < 2         | none, the request fails                 |
//! | 2 to 29     | Linear Extrapolation (fallback mode)    |
//! | 30 and more | Linear Extrapolation, ARIMA and Prophet |
//!
//! Thresholds and weights come from [`ForecastConfig`].
//!
//! ## Quick Start
//!
//! ```rust
//! use vigie_forecast::{ForecastService, Series};
//! use chrono::NaiveDate;
//!
//! let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
//! let series = Series::from_pairs(vec![
//!     (start, 30.0),
//!     (start.succ_opt().unwrap(), 40.0),
//!     (start.succ_opt().unwrap().succ_opt().unwrap(), 50.0),
//! ])?;
//!
//! let report = ForecastService::default().forecast(&series, 3)?;
//! assert_eq!(report.models_used, vec!["Linear Extrapolation"]);
//! assert_eq!(report.predictions[0].predicted_cases, 60);
//! # Ok::<(), vigie_forecast::ForecastError>(())
//! ```

pub mod config;
pub mod data;
pub mod ensemble;
pub mod error;
pub mod models;
pub mod selector;
pub mod service;
pub mod utils;

// Re-export commonly used types
pub use crate::config::{ArimaConfig, ForecastConfig, SeasonalConfig};
pub use crate::data::{CaseRecord, CaseTable, DataLoader, Observation, Population, Series};
pub use crate::ensemble::{Ensemble, EnsembleForecast};
pub use crate::error::{ForecastError, Result};
pub use crate::models::{FitOutcome, ForecastModel, ForecastPoint, Model, ModelKind};
pub use crate::selector::ModelSelector;
pub use crate::service::{
    ForecastMode, ForecastReport, ForecastService, PredictionRow, StatusReport,
};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
