//! Integration tests for the dense solvers.

use approx::assert_relative_eq;
use cl_solver::{SolverError, least_squares, solve_linear_system};
use nalgebra::{DMatrix, DVector};

#[test]
fn reference_two_by_two() {
    let a = DMatrix::from_row_slice(2, 2, &[2.0, 1.0, 1.0, 3.0]);
    let b = DVector::from_vec(vec![3.0, 5.0]);
    let x = solve_linear_system(&a, &b).unwrap();
    assert_relative_eq!(x[0], 0.8, epsilon = 1e-12);
    assert_relative_eq!(x[1], 1.4, epsilon = 1e-12);
}

#[test]
fn hilbert_three_by_three() {
    // Moderately ill-conditioned but well within double precision.
    let mut a = DMatrix::zeros(3, 3);
    for i in 0..3 {
        for j in 0..3 {
            a[(i, j)] = 1.0 / (i + j + 1) as f64;
        }
    }
    let expected = DVector::from_vec(vec![1.0, -2.0, 3.0]);
    let b = &a * &expected;
    let x = solve_linear_system(&a, &b).unwrap();
    for i in 0..3 {
        assert_relative_eq!(x[i], expected[i], epsilon = 1e-9);
    }
}

#[test]
fn quadratic_regression_recovers_coefficients() {
    let n = 20;
    let mut phi = DMatrix::zeros(n, 3);
    let mut y = DVector::zeros(n);
    for i in 0..n {
        let t = i as f64 * 0.5;
        phi[(i, 0)] = t * t;
        phi[(i, 1)] = t;
        phi[(i, 2)] = 1.0;
        y[i] = 0.25 * t * t - 1.5 * t + 4.0;
    }
    let theta = least_squares(&phi, &y).unwrap();
    assert_relative_eq!(theta[0], 0.25, epsilon = 1e-9);
    assert_relative_eq!(theta[1], -1.5, epsilon = 1e-9);
    assert_relative_eq!(theta[2], 4.0, epsilon = 1e-9);
}

#[test]
fn singular_error_reports_column() {
    let a = DMatrix::from_row_slice(3, 3, &[1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0]);
    let b = DVector::from_vec(vec![1.0, 1.0, 1.0]);
    match solve_linear_system(&a, &b) {
        Err(SolverError::SingularSystem { column, pivot }) => {
            assert_eq!(column, 2);
            assert_eq!(pivot, 0.0);
        }
        other => panic!("expected singular system, got {other:?}"),
    }
}
