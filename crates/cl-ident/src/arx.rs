//! ARX model structure, regression and re-simulation.
//!
//! ```text
//! y[k] + a1·y[k−1] + … + a_na·y[k−na] = b1·u[k−nk] + … + b_nb·u[k−nk−nb+1]
//! ```

use crate::error::{IdentError, IdentResult};
use cl_solver::least_squares;
use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Model orders: `na` output lags, `nb` input taps, `nk` input delay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArxOrders {
    pub na: usize,
    pub nb: usize,
    pub nk: usize,
}

impl ArxOrders {
    pub fn new(na: usize, nb: usize, nk: usize) -> IdentResult<Self> {
        let orders = Self { na, nb, nk };
        orders.validate()?;
        Ok(orders)
    }

    pub fn validate(&self) -> IdentResult<()> {
        if self.nb == 0 {
            return Err(IdentError::InvalidParameter {
                what: "nb must be at least 1",
            });
        }
        Ok(())
    }

    /// First sample index with a complete regressor row.
    pub fn first_row(&self) -> usize {
        self.na.max(self.nb + self.nk - 1)
    }

    pub fn parameter_count(&self) -> usize {
        self.na + self.nb
    }
}

impl Default for ArxOrders {
    fn default() -> Self {
        Self {
            na: 2,
            nb: 1,
            nk: 1,
        }
    }
}

/// Regressor matrix Φ and target vector Y.
///
/// Row for sample k (starting at [`ArxOrders::first_row`]):
/// `[−y[k−1] … −y[k−na], u[k−nk] … u[k−nk−nb+1]]`, target `y[k]`.
pub fn build_regression(
    output: &[f64],
    input: &[f64],
    orders: &ArxOrders,
) -> IdentResult<(DMatrix<f64>, DVector<f64>)> {
    orders.validate()?;
    if output.len() != input.len() {
        return Err(IdentError::LengthMismatch {
            what: "input/output records",
            left: input.len(),
            right: output.len(),
        });
    }
    let start = orders.first_row();
    let n = output.len();
    if n <= start {
        return Err(IdentError::TooFewSamples {
            needed: start + 1,
            got: n,
        });
    }

    let rows = n - start;
    let cols = orders.parameter_count();
    let mut phi = DMatrix::zeros(rows, cols);
    let mut y = DVector::zeros(rows);
    for (row, k) in (start..n).enumerate() {
        for i in 0..orders.na {
            phi[(row, i)] = -output[k - (i + 1)];
        }
        for j in 0..orders.nb {
            phi[(row, orders.na + j)] = input[k - (j + orders.nk)];
        }
        y[row] = output[k];
    }
    Ok((phi, y))
}

/// Fitted ARX model. Immutable once fitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArxModel {
    pub orders: ArxOrders,
    /// `[a1, …, a_na]`
    pub a: Vec<f64>,
    /// `[b1, …, b_nb]`
    pub b: Vec<f64>,
}

impl ArxModel {
    /// Least-squares fit of `orders` to an input/output record.
    pub fn fit(output: &[f64], input: &[f64], orders: &ArxOrders) -> IdentResult<Self> {
        let (phi, y) = build_regression(output, input, orders)?;
        let theta = least_squares(&phi, &y)?;
        let a = theta.rows(0, orders.na).iter().copied().collect();
        let b = theta.rows(orders.na, orders.nb).iter().copied().collect();
        let model = Self {
            orders: *orders,
            a,
            b,
        };
        debug!(a = ?model.a, b = ?model.b, rows = phi.nrows(), "ARX fit");
        Ok(model)
    }

    /// Open-loop response to `input`.
    ///
    /// The first [`ArxOrders::first_row`] samples are copied from `seed`;
    /// after that only past simulated outputs are fed back.
    pub fn simulate(&self, input: &[f64], seed: &[f64]) -> IdentResult<Vec<f64>> {
        let start = self.orders.first_row();
        let n = input.len();
        if seed.len() < start.min(n) {
            return Err(IdentError::TooFewSamples {
                needed: start.min(n),
                got: seed.len(),
            });
        }
        let mut y = vec![0.0; n];
        y[..start.min(n)].copy_from_slice(&seed[..start.min(n)]);
        for k in start..n {
            let ar: f64 = self
                .a
                .iter()
                .enumerate()
                .map(|(i, a)| a * y[k - (i + 1)])
                .sum();
            let x: f64 = self
                .b
                .iter()
                .enumerate()
                .map(|(j, b)| b * input[k - (j + self.orders.nk)])
                .sum();
            y[k] = x - ar;
        }
        Ok(y)
    }
}
