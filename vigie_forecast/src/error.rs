//! Error types for the vigie_forecast crate

use thiserror::Error;
use vigie_math::MathError;

/// Custom error types for the vigie_forecast crate
#[derive(Debug, Error)]
pub enum ForecastError {
    /// Fewer observations than the engine can work with
    #[error("Insufficient data: at least {needed} data points required, got {got}")]
    InsufficientData { needed: usize, got: usize },

    /// Requested horizon is not a positive number of days
    #[error("Invalid horizon: {0} (must be at least 1 day)")]
    InvalidHorizon(usize),

    /// Prediction requested from a model that has not been trained
    #[error("Model '{0}' has not been trained")]
    UntrainedModel(String),

    /// A model could not be fitted to the series
    #[error("Fitting {model} failed: {reason}")]
    FitFailed { model: String, reason: String },

    /// A trained model could not produce a usable forecast
    #[error("Prediction with {model} failed: {reason}")]
    PredictionFailed { model: String, reason: String },

    /// No member of the ensemble produced a forecast
    #[error("Ensemble failure: {0}")]
    EnsembleFailure(String),

    /// Error related to data validation or processing
    #[error("Data error: {0}")]
    DataError(String),

    /// Error related to configuration values
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Error from numerical routines
    #[error("Math error: {0}")]
    Math(#[from] MathError),

    /// Error from IO operations
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Error from CSV parsing
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    /// Error from JSON (de)serialization
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// Result type with our custom error
pub type Result<T> = std::result::Result<T, ForecastError>;
