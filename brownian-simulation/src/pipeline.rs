//! Resolver → Generator → Calculator → Estimator, executed once per run.

use crate::autocorrelation::{Autocorrelation, IndependenceCheck};
use crate::displacement::{times, DisplacementSeries, TimeAveragedMsd};
use crate::error::SimulationError;
use crate::estimate::DiffusionEstimate;
use crate::params::{resolve, Configuration, ResolvedParameters};
use crate::trajectory::Trajectory;
use log::debug;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Coverage threshold used by replicate validation, in standard errors.
pub const COVERAGE_STANDARD_ERRORS: f64 = 5.0;

/// Default autocorrelation window. Each lag costs one pass over the series.
pub const DEFAULT_MAX_LAG: usize = 200;

fn default_max_lag() -> usize { DEFAULT_MAX_LAG }
fn default_tamsd_max_lag() -> usize { 100 }

/// Knobs for the validation stage that do not change the physics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisOptions {
    /// Autocorrelation window, clamped to the lags the series supports.
    #[serde(default = "default_max_lag")]
    pub max_lag: usize,
    /// Use every lag the series supports and ignore `max_lag`.
    /// Quadratic in the number of steps.
    #[serde(default)]
    pub full_window: bool,
    #[serde(default = "default_tamsd_max_lag")]
    pub tamsd_max_lag: usize,
}

impl AnalysisOptions {
    pub fn windowed(max_lag: usize, tamsd_max_lag: usize) -> Self {
        Self {
            max_lag,
            full_window: false,
            tamsd_max_lag,
        }
    }

    /// Window handed to the autocorrelation; `None` means every lag.
    pub fn autocorrelation_window(&self) -> Option<usize> {
        if self.full_window {
            None
        } else {
            Some(self.max_lag)
        }
    }
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            max_lag: default_max_lag(),
            full_window: false,
            tamsd_max_lag: default_tamsd_max_lag(),
        }
    }
}

/// Everything one run produces. Created once, read-only afterwards.
#[derive(Debug, Clone, Serialize)]
pub struct SimulationRun {
    pub seed: Option<u64>,
    pub parameters: ResolvedParameters,
    pub times: Vec<f64>,
    pub trajectory: Trajectory,
    pub displacement: DisplacementSeries,
    pub estimate: DiffusionEstimate,
    pub time_averaged_msd: TimeAveragedMsd,
    pub fitted_diffusion_coefficient: Option<f64>,
    pub autocorrelation: Autocorrelation,
    pub independence: IndependenceCheck,
}

/// Runs the full pipeline with a caller-supplied random source.
///
/// Fails fast: an error in any stage stops the run and nothing later executes.
pub fn run<R: Rng + ?Sized>(
    config: &Configuration,
    options: &AnalysisOptions,
    rng: &mut R,
) -> Result<SimulationRun, SimulationError> {
    let parameters = resolve(config)?;
    let trajectory = Trajectory::generate(&parameters, rng)?;
    let displacement = DisplacementSeries::compute(&trajectory, &parameters);
    let estimate = DiffusionEstimate::from_step_squared(&displacement.step_squared, &parameters)?;

    let time_averaged_msd =
        TimeAveragedMsd::compute(&trajectory, &parameters, options.tamsd_max_lag);
    let fitted_diffusion_coefficient = time_averaged_msd.fitted_diffusion_coefficient();
    let autocorrelation =
        Autocorrelation::compute(trajectory.dx(), options.autocorrelation_window());
    let independence = autocorrelation.independence_check();

    debug!(
        "Run complete: N = {}, Dhat = {:e} ± {:e}, independence fraction = {:.3}",
        parameters.steps,
        estimate.estimate,
        estimate.standard_error,
        independence.fraction_within_band
    );

    Ok(SimulationRun {
        seed: None,
        times: times(parameters.steps, parameters.time_step),
        parameters,
        trajectory,
        displacement,
        estimate,
        time_averaged_msd,
        fitted_diffusion_coefficient,
        autocorrelation,
        independence,
    })
}

/// Runs the pipeline with a fresh `ChaCha8Rng` seeded from `seed`.
pub fn run_seeded(
    config: &Configuration,
    options: &AnalysisOptions,
    seed: u64,
) -> Result<SimulationRun, SimulationError> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut run = run(config, options, &mut rng)?;
    run.seed = Some(seed);
    Ok(run)
}

/// Generator for replicate `index`: same seed, its own ChaCha stream.
pub fn replicate_rng(seed: u64, index: u64) -> ChaCha8Rng {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    rng.set_stream(index);
    rng
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ReplicateOutcome {
    pub index: u64,
    pub estimate: DiffusionEstimate,
    pub fitted_diffusion_coefficient: Option<f64>,
    pub within_coverage: bool,
    pub independent: bool,
}

/// Per-replicate estimates plus how often they pass validation.
#[derive(Debug, Clone, Serialize)]
pub struct ReplicateSummary {
    pub seed: u64,
    pub parameters: ResolvedParameters,
    pub outcomes: Vec<ReplicateOutcome>,
    /// Share of replicates with `|mean − 2·dims·D·τ| < 5·SE`.
    pub coverage_fraction: f64,
    /// Share of replicates passing the autocorrelation check.
    pub independence_fraction: f64,
}

/// Runs `count` independent simulations in parallel, each with its own
/// generator stream. Parameters are resolved once up front so an invalid
/// configuration fails before any draw.
pub fn run_replicates(
    config: &Configuration,
    options: &AnalysisOptions,
    seed: u64,
    count: usize,
) -> Result<ReplicateSummary, SimulationError> {
    if count == 0 {
        return Err(SimulationError::invalid("replicate count must be at least 1"));
    }
    let parameters = resolve(config)?;

    let outcomes = (0..count as u64)
        .into_par_iter()
        .map(|index| -> Result<ReplicateOutcome, SimulationError> {
            let mut rng = replicate_rng(seed, index);
            let run = run(config, options, &mut rng)?;
            Ok(ReplicateOutcome {
                index,
                within_coverage: run
                    .estimate
                    .within_standard_errors(&parameters, COVERAGE_STANDARD_ERRORS),
                independent: run.independence.consistent,
                estimate: run.estimate,
                fitted_diffusion_coefficient: run.fitted_diffusion_coefficient,
            })
        })
        .collect::<Result<Vec<_>, SimulationError>>()?;

    let total = outcomes.len() as f64;
    let coverage_fraction = outcomes.iter().filter(|o| o.within_coverage).count() as f64 / total;
    let independence_fraction = outcomes.iter().filter(|o| o.independent).count() as f64 / total;

    Ok(ReplicateSummary {
        seed,
        parameters,
        outcomes,
        coverage_fraction,
        independence_fraction,
    })
}
