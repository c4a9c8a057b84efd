//! # Vigie
//!
//! `vigie` bundles the outbreak forecasting engine and its numerical
//! building blocks.
//!
//! ## Example
//!
//! ```
//! use chrono::NaiveDate;
//! use vigie::forecast::{ForecastMode, ForecastService, Series};
//!
//! let day = |d| NaiveDate::from_ymd_opt(2024, 4, d).unwrap();
//! let series = Series::from_pairs(vec![(day(1), 12.0), (day(2), 18.0)]).unwrap();
//!
//! let report = ForecastService::default().forecast(&series, 2).unwrap();
//! assert_eq!(report.mode, ForecastMode::Fallback);
//! assert_eq!(report.predictions[1].predicted_cases, 30);
//! ```

/// Forecasting engine: data loading, models, ensemble and reports
pub use vigie_forecast as forecast;

/// Numerical routines shared by the models
pub use vigie_math as math;
