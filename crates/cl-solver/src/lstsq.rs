//! Ordinary least squares through the normal equations.

use crate::error::{SolverError, SolverResult};
use crate::gauss::solve_linear_system;
use nalgebra::{DMatrix, DVector};
use tracing::debug;

/// Normal-equation form `(ΦᵀΦ)·θ = ΦᵀY` of a regression problem.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalEquations {
    /// Gram matrix `ΦᵀΦ` (square, `cols x cols`).
    pub gram: DMatrix<f64>,
    /// Projected targets `ΦᵀY`.
    pub rhs: DVector<f64>,
}

impl NormalEquations {
    /// Build the normal equations for regressors `phi` (one row per sample)
    /// and targets `y`.
    pub fn from_regression(phi: &DMatrix<f64>, y: &DVector<f64>) -> SolverResult<Self> {
        if phi.nrows() != y.len() {
            return Err(SolverError::Dimension {
                what: "target length must match regressor rows",
                expected: phi.nrows(),
                got: y.len(),
            });
        }
        if phi.nrows() < phi.ncols() {
            return Err(SolverError::Underdetermined {
                rows: phi.nrows(),
                cols: phi.ncols(),
            });
        }
        Ok(Self {
            gram: phi.tr_mul(phi),
            rhs: phi.tr_mul(y),
        })
    }

    /// Solve for the parameter vector θ.
    pub fn solve(&self) -> SolverResult<DVector<f64>> {
        solve_linear_system(&self.gram, &self.rhs)
    }
}

/// Least-squares estimate θ minimizing `‖Φθ − Y‖²`.
pub fn least_squares(phi: &DMatrix<f64>, y: &DVector<f64>) -> SolverResult<DVector<f64>> {
    let normal = NormalEquations::from_regression(phi, y)?;
    let theta = normal.solve()?;
    debug!(
        rows = phi.nrows(),
        params = phi.ncols(),
        "least-squares solve complete"
    );
    Ok(theta)
}
