//! Diffusion coefficient estimation from per-step squared displacements.

use crate::error::SimulationError;
use crate::params::ResolvedParameters;
use crate::DIMENSIONS;
use serde::Serialize;

/// Estimated D with its statistical uncertainty.
///
/// A large `relative_error` is an informative outcome, not a failure.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DiffusionEstimate {
    pub estimate: f64,
    pub standard_error: f64,
    pub relative_error: f64,
    /// Mean of the per-step squared displacement.
    pub mean_step_squared: f64,
}

impl DiffusionEstimate {
    /// `Dhat = mean / (2·dims·τ)`, `SE = std / (2·dims·τ·sqrt(N−1))`.
    ///
    /// `std` is the sample standard deviation (divide by count − 1). A single
    /// step has no spread to measure and gets a standard error of zero.
    /// Statistics are taken on the squares divided by D·τ, so steps whose
    /// squares are near the float limit still give a finite spread. A result
    /// that is still not finite is reported as `NumericOverflow`.
    pub fn from_step_squared(
        step_squared: &[f64],
        params: &ResolvedParameters,
    ) -> Result<Self, SimulationError> {
        if step_squared.is_empty() {
            return Err(SimulationError::invalid(
                "at least one step is required to estimate the diffusion coefficient",
            ));
        }

        let count = step_squared.len();
        let d = params.diffusion_coefficient;
        let unit = d * params.time_step;
        let normalised: Vec<f64> = step_squared.iter().map(|v| v / unit).collect();
        let (mean, std) = mean_and_std(&normalised);

        // unit / (2·dims·τ) = D / (2·dims)
        let per_unit = d / (2.0 * DIMENSIONS as f64);
        let estimate = mean * per_unit;
        let standard_error = std * per_unit / (count as f64).sqrt();
        let relative_error = (d - estimate).abs() / d;
        let mean_step_squared = mean * unit;

        for value in [estimate, standard_error, relative_error, mean_step_squared] {
            if !value.is_finite() {
                return Err(SimulationError::NumericOverflow { step: count, value });
            }
        }

        Ok(Self {
            estimate,
            standard_error,
            relative_error,
            mean_step_squared,
        })
    }

    /// Whether the mean squared step lies within `k` standard errors of its
    /// expectation 2·dims·D·τ.
    pub fn within_standard_errors(&self, params: &ResolvedParameters, k: f64) -> bool {
        let scale = 2.0 * DIMENSIONS as f64 * params.time_step;
        let deviation = (self.mean_step_squared - params.expected_step_squared()).abs();
        deviation < k * self.standard_error * scale
    }
}

/// Mean and sample standard deviation. Fewer than two values have zero spread.
pub(crate) fn mean_and_std(data: &[f64]) -> (f64, f64) {
    let n = data.len();
    let mean = data.iter().sum::<f64>() / n as f64;
    if n < 2 {
        return (mean, 0.0);
    }
    let variance = data.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
    (mean, variance.sqrt())
}
