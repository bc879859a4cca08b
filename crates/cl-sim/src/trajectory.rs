//! Immutable record of one simulation run.

use serde::Serialize;

/// Sampled time, output, control and error of one run.
///
/// All series have the same length and index `k` corresponds to time
/// `k·dt`. Built once by the engine; read-only afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trajectory {
    reference: f64,
    dt: f64,
    time: Vec<f64>,
    output: Vec<f64>,
    control: Vec<f64>,
    error: Vec<f64>,
}

impl Trajectory {
    pub(crate) fn new(
        reference: f64,
        dt: f64,
        output: Vec<f64>,
        control: Vec<f64>,
        error: Vec<f64>,
    ) -> Self {
        debug_assert!(output.len() == control.len() && control.len() == error.len());
        let time = (0..output.len()).map(|k| k as f64 * dt).collect();
        Self {
            reference,
            dt,
            time,
            output,
            control,
            error,
        }
    }

    pub fn reference(&self) -> f64 {
        self.reference
    }

    pub fn dt(&self) -> f64 {
        self.dt
    }

    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    pub fn time(&self) -> &[f64] {
        &self.time
    }

    pub fn output(&self) -> &[f64] {
        &self.output
    }

    pub fn control(&self) -> &[f64] {
        &self.control
    }

    pub fn error(&self) -> &[f64] {
        &self.error
    }

    pub fn final_output(&self) -> Option<f64> {
        self.output.last().copied()
    }

    pub fn final_control(&self) -> Option<f64> {
        self.control.last().copied()
    }

    pub fn final_error(&self) -> Option<f64> {
        self.error.last().copied()
    }
}
