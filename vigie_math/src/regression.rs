//! Penalised linear least squares
//!
//! Solves `min ||y - X b||^2 + sum_j lambda_j b_j^2` through the normal
//! equations and a Cholesky factorisation. A zero penalty leaves a
//! coefficient unregularised.

use crate::{MathError, Result};

/// Jitter added to the diagonal so that collinear designs stay solvable
const DIAGONAL_JITTER: f64 = 1e-10;

/// Fitted regression coefficients with in-sample diagnostics
#[derive(Debug, Clone)]
pub struct RegressionFit {
    /// One coefficient per design column
    pub coefficients: Vec<f64>,
    /// Fitted values for each design row
    pub fitted: Vec<f64>,
    /// Residuals `y - fitted`
    pub residuals: Vec<f64>,
}

impl RegressionFit {
    /// Evaluate the fitted model on a new design row
    pub fn predict_row(&self, row: &[f64]) -> Result<f64> {
        if row.len() != self.coefficients.len() {
            return Err(MathError::InvalidInput(format!(
                "Row has {} columns, model has {} coefficients",
                row.len(),
                self.coefficients.len()
            )));
        }
        Ok(dot(row, &self.coefficients))
    }

    /// Mean squared residual
    pub fn residual_variance(&self) -> f64 {
        if self.residuals.is_empty() {
            return 0.0;
        }
        self.residuals.iter().map(|r| r * r).sum::<f64>() / self.residuals.len() as f64
    }
}

/// Ordinary least squares on a row-major design matrix
pub fn least_squares(design: &[Vec<f64>], y: &[f64]) -> Result<RegressionFit> {
    let columns = design.first().map(Vec::len).unwrap_or(0);
    penalized_least_squares(design, y, &vec![0.0; columns])
}

/// Ridge-style least squares with one penalty per column
pub fn penalized_least_squares(
    design: &[Vec<f64>],
    y: &[f64],
    penalties: &[f64],
) -> Result<RegressionFit> {
    let n = y.len();
    if n == 0 || design.len() != n {
        return Err(MathError::InvalidInput(format!(
            "Design has {} rows but target has {} values",
            design.len(),
            n
        )));
    }

    let k = penalties.len();
    if k == 0 {
        return Err(MathError::InvalidInput(
            "Design matrix has no columns".to_string(),
        ));
    }
    if design.iter().any(|row| row.len() != k) {
        return Err(MathError::InvalidInput(format!(
            "Every design row must have {} columns",
            k
        )));
    }
    if penalties.iter().any(|p| !p.is_finite() || *p < 0.0) {
        return Err(MathError::InvalidInput(
            "Penalties must be finite and non-negative".to_string(),
        ));
    }

    let mut xtx = vec![vec![0.0; k]; k];
    let mut xty = vec![0.0; k];
    for (row, &target) in design.iter().zip(y) {
        for i in 0..k {
            xty[i] += row[i] * target;
            for j in 0..=i {
                xtx[i][j] += row[i] * row[j];
            }
        }
    }
    for i in 0..k {
        for j in 0..i {
            xtx[j][i] = xtx[i][j];
        }
        xtx[i][i] += penalties[i] + DIAGONAL_JITTER;
    }

    let coefficients = solve_symmetric(&xtx, &xty)?;
    if coefficients.iter().any(|c| !c.is_finite()) {
        return Err(MathError::CalculationError(
            "Regression produced non-finite coefficients".to_string(),
        ));
    }

    let fitted: Vec<f64> = design.iter().map(|row| dot(row, &coefficients)).collect();
    let residuals = y.iter().zip(&fitted).map(|(a, f)| a - f).collect();

    Ok(RegressionFit {
        coefficients,
        fitted,
        residuals,
    })
}

/// Solve `A x = b` for symmetric positive definite `A`
pub fn solve_symmetric(a: &[Vec<f64>], b: &[f64]) -> Result<Vec<f64>> {
    let n = b.len();
    if n == 0 || a.len() != n || a.iter().any(|row| row.len() != n) {
        return Err(MathError::InvalidInput(
            "Matrix and vector dimensions do not agree".to_string(),
        ));
    }

    // A = L L'
    let mut l = vec![vec![0.0; n]; n];
    for i in 0..n {
        for j in 0..=i {
            let mut sum = a[i][j];
            for k in 0..j {
                sum -= l[i][k] * l[j][k];
            }

            if i == j {
                if sum <= 0.0 || !sum.is_finite() {
                    return Err(MathError::SingularMatrix);
                }
                l[i][j] = sum.sqrt();
            } else {
                l[i][j] = sum / l[j][j];
            }
        }
    }

    let mut z = vec![0.0; n];
    for i in 0..n {
        let mut sum = b[i];
        for j in 0..i {
            sum -= l[i][j] * z[j];
        }
        z[i] = sum / l[i][i];
    }

    let mut x = vec![0.0; n];
    for i in (0..n).rev() {
        let mut sum = z[i];
        for j in (i + 1)..n {
            sum -= l[j][i] * x[j];
        }
        x[i] = sum / l[i][i];
    }

    Ok(x)
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}
