//! # Vigie Math
//!
//! Numerical building blocks for the case-count forecasting models.
//! This crate provides descriptive statistics, differencing, penalised
//! least squares and a derivative-free minimiser.

use thiserror::Error;

pub mod differencing;
pub mod optimization;
pub mod regression;
pub mod stats;

/// Errors that can occur in numerical calculations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MathError {
    #[error("Insufficient data for calculation: {0}")]
    InsufficientData(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Calculation error: {0}")]
    CalculationError(String),

    #[error("Matrix is singular or not positive definite")]
    SingularMatrix,
}

/// Result type for numerical operations
pub type Result<T> = std::result::Result<T, MathError>;
