//! Gaussian elimination with partial pivoting.

use crate::error::{SolverError, SolverResult};
use cl_core::ensure_finite;
use nalgebra::{DMatrix, DVector};
use tracing::debug;

/// A pivot is treated as zero when `|pivot| <= PIVOT_REL_TOL * max|A_ij|`.
pub const PIVOT_REL_TOL: f64 = 1e-12;

/// Solve the square system `A·x = b`.
///
/// At every elimination step the row with the largest absolute value in the
/// current column (among the rows not yet eliminated) is swapped into the
/// pivot position. The inputs are left untouched; elimination runs on a copy
/// owned by this call.
///
/// # Errors
///
/// - [`SolverError::Dimension`] if `A` is not square or `b` has the wrong length
/// - [`SolverError::SingularSystem`] if a pivot is (numerically) zero
/// - [`SolverError::Numeric`] if any entry is NaN or infinite
pub fn solve_linear_system(a: &DMatrix<f64>, b: &DVector<f64>) -> SolverResult<DVector<f64>> {
    let n = a.nrows();
    if a.ncols() != n {
        return Err(SolverError::Dimension {
            what: "matrix must be square",
            expected: n,
            got: a.ncols(),
        });
    }
    if b.len() != n {
        return Err(SolverError::Dimension {
            what: "right-hand side length",
            expected: n,
            got: b.len(),
        });
    }
    if n == 0 {
        return Ok(DVector::zeros(0));
    }
    for v in a.iter() {
        ensure_finite(*v, "matrix entry")?;
    }
    for v in b.iter() {
        ensure_finite(*v, "right-hand side entry")?;
    }

    let mut m = a.clone();
    let mut rhs = b.clone();
    let threshold = PIVOT_REL_TOL * m.amax();

    // Forward elimination
    for col in 0..n {
        let mut pivot_row = col;
        let mut pivot_abs = m[(col, col)].abs();
        for row in (col + 1)..n {
            let candidate = m[(row, col)].abs();
            if candidate > pivot_abs {
                pivot_row = row;
                pivot_abs = candidate;
            }
        }

        if pivot_abs <= threshold {
            debug!(column = col, pivot = pivot_abs, threshold, "singular pivot");
            return Err(SolverError::SingularSystem {
                column: col,
                pivot: m[(pivot_row, col)],
            });
        }

        if pivot_row != col {
            m.swap_rows(col, pivot_row);
            rhs.swap_rows(col, pivot_row);
        }

        let pivot = m[(col, col)];
        for row in (col + 1)..n {
            let factor = m[(row, col)] / pivot;
            if factor == 0.0 {
                continue;
            }
            for j in col..n {
                let upper = m[(col, j)];
                m[(row, j)] -= factor * upper;
            }
            let upper_rhs = rhs[col];
            rhs[row] -= factor * upper_rhs;
        }
    }

    // Back substitution
    let mut x = DVector::zeros(n);
    for i in (0..n).rev() {
        let mut acc = rhs[i];
        for j in (i + 1)..n {
            acc -= m[(i, j)] * x[j];
        }
        x[i] = acc / m[(i, i)];
    }

    Ok(x)
}
