//! Squared displacement series derived from a trajectory, and the matching
//! theoretical mean square displacement curves.

use crate::params::ResolvedParameters;
use crate::trajectory::Trajectory;
use crate::DIMENSIONS;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisplacementSeries {
    /// `dx² + dy²` for every step (length N−1).
    pub step_squared: Vec<f64>,
    /// `x² + y²` at every time index (length N), zero at the origin.
    pub cumulative_squared: Vec<f64>,
    /// Theoretical MSD `2·dims·D·t·τ` at every time index (length N).
    pub msd_theory: Vec<f64>,
}

impl DisplacementSeries {
    pub fn compute(trajectory: &Trajectory, params: &ResolvedParameters) -> Self {
        let step_squared = trajectory
            .dx()
            .iter()
            .zip(trajectory.dy())
            .map(|(dx, dy)| dx * dx + dy * dy)
            .collect();
        let cumulative_squared = trajectory.points().map(|(x, y)| x * x + y * y).collect();

        Self {
            step_squared,
            cumulative_squared,
            msd_theory: theoretical_msd(
                trajectory.len(),
                params.diffusion_coefficient,
                params.time_step,
            ),
        }
    }
}

/// Elapsed time `t·τ` at each of `steps` indices.
pub fn times(steps: usize, time_step: f64) -> Vec<f64> {
    (0..steps).map(|t| t as f64 * time_step).collect()
}

/// `msd[t] = 2·dims·D·(t·τ)`; independent of any random draw.
pub fn theoretical_msd(steps: usize, diffusion_coefficient: f64, time_step: f64) -> Vec<f64> {
    let slope = 2.0 * DIMENSIONS as f64 * diffusion_coefficient;
    times(steps, time_step).into_iter().map(|t| slope * t).collect()
}

/// Sliding-window MSD of a single trajectory.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeAveragedMsd {
    /// Lag times `l·τ` for l = 1..=L.
    pub lag_times: Vec<f64>,
    pub observed: Vec<f64>,
    pub theory: Vec<f64>,
}

impl TimeAveragedMsd {
    /// Averages `|r(t + l) − r(t)|²` over every start index t, for lags 1..=`max_lag`.
    /// The window is clamped to N−1 so every lag has at least one pair.
    pub fn compute(trajectory: &Trajectory, params: &ResolvedParameters, max_lag: usize) -> Self {
        let n = trajectory.len();
        let max_lag = max_lag.min(n.saturating_sub(1));
        let x = trajectory.x();
        let y = trajectory.y();

        let observed = (1..=max_lag)
            .map(|lag| {
                let pairs = n - lag;
                let sum: f64 = (0..pairs)
                    .map(|t| {
                        let ddx = x[t + lag] - x[t];
                        let ddy = y[t + lag] - y[t];
                        ddx * ddx + ddy * ddy
                    })
                    .sum();
                sum / pairs as f64
            })
            .collect();

        let lag_times: Vec<f64> = (1..=max_lag).map(|l| l as f64 * params.time_step).collect();
        let slope = 2.0 * DIMENSIONS as f64 * params.diffusion_coefficient;
        let theory = lag_times.iter().map(|t| slope * t).collect();

        Self { lag_times, observed, theory }
    }

    /// Least-squares slope through the origin of observed MSD vs lag time,
    /// divided by 2·dims. `None` when there are no lags.
    pub fn fitted_diffusion_coefficient(&self) -> Option<f64> {
        let (num, den) = self
            .lag_times
            .iter()
            .zip(&self.observed)
            .fold((0.0, 0.0), |(num, den), (t, msd)| (num + t * msd, den + t * t));
        if den > 0.0 {
            Some(num / den / (2.0 * DIMENSIONS as f64))
        } else {
            None
        }
    }
}
