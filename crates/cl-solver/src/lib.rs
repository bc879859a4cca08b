//! Dense linear-system and least-squares solvers.
//!
//! This crate provides Gaussian elimination with partial pivoting on
//! `nalgebra` dense storage, and an ordinary least-squares solve built on the
//! normal equations `ΦᵀΦ·θ = ΦᵀY`.

pub mod error;
pub mod gauss;
pub mod lstsq;

pub use error::{SolverError, SolverResult};
pub use gauss::{PIVOT_REL_TOL, solve_linear_system};
pub use lstsq::{NormalEquations, least_squares};
