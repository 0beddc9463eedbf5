//! Trajectory generation: independent Gaussian increments accumulated into
//! absolute 2D positions starting at the origin.

use crate::error::SimulationError;
use crate::params::ResolvedParameters;
use rand::Rng;
use rand_distr::StandardNormal;
use serde::Serialize;

/// A complete walk of N points. Built in one pass and never mutated.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trajectory {
    x: Vec<f64>,
    y: Vec<f64>,
    dx: Vec<f64>,
    dy: Vec<f64>,
}

impl Trajectory {
    /// Draws a trajectory for already resolved parameters.
    pub fn generate<R: Rng + ?Sized>(
        params: &ResolvedParameters,
        rng: &mut R,
    ) -> Result<Self, SimulationError> {
        generate(params.steps, params.step_scale, rng)
    }

    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    pub fn x(&self) -> &[f64] {
        &self.x
    }

    pub fn y(&self) -> &[f64] {
        &self.y
    }

    /// Per-step x increments, `dx[i] = x[i + 1] - x[i]` (length N−1).
    pub fn dx(&self) -> &[f64] {
        &self.dx
    }

    /// Per-step y increments (length N−1).
    pub fn dy(&self) -> &[f64] {
        &self.dy
    }

    /// Iterator over `(x, y)` points.
    pub fn points(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.x.iter().copied().zip(self.y.iter().copied())
    }
}

/// Generates `steps` points with per-axis step standard deviation `step_scale`.
///
/// Every step consumes two fresh standard-normal samples, one per axis.
/// A scale of zero yields a particle resting at the origin.
pub fn generate<R: Rng + ?Sized>(
    steps: usize,
    step_scale: f64,
    rng: &mut R,
) -> Result<Trajectory, SimulationError> {
    if steps < 2 {
        return Err(SimulationError::invalid(format!(
            "steps must be at least 2, got {steps}"
        )));
    }
    if !step_scale.is_finite() || step_scale < 0.0 {
        return Err(SimulationError::invalid(format!(
            "step scale must be finite and non-negative, got {step_scale}"
        )));
    }

    let mut dx = Vec::with_capacity(steps - 1);
    let mut dy = Vec::with_capacity(steps - 1);
    for _ in 1..steps {
        let zx: f64 = rng.sample(StandardNormal);
        let zy: f64 = rng.sample(StandardNormal);
        dx.push(step_scale * zx);
        dy.push(step_scale * zy);
    }

    let x = accumulate(&dx)?;
    let y = accumulate(&dy)?;

    // Squared radii feed the displacement series; keep them finite too.
    for (step, (px, py)) in x.iter().zip(&y).enumerate() {
        let radius_squared = px * px + py * py;
        if !radius_squared.is_finite() {
            return Err(SimulationError::NumericOverflow { step, value: radius_squared });
        }
    }

    Ok(Trajectory { x, y, dx, dy })
}

/// Running sum of the increments, prefixed by the origin.
fn accumulate(increments: &[f64]) -> Result<Vec<f64>, SimulationError> {
    let mut positions = Vec::with_capacity(increments.len() + 1);
    positions.push(0.0);
    increments
        .iter()
        .enumerate()
        .try_fold(0.0_f64, |position, (i, delta)| {
            let next = position + delta;
            if !next.is_finite() {
                return Err(SimulationError::NumericOverflow { step: i + 1, value: next });
            }
            positions.push(next);
            Ok(next)
        })?;
    Ok(positions)
}
