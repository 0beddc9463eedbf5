//! Parameter resolution: turns a [`Configuration`] into the diffusion
//! coefficient and per-axis step scale used by the rest of the pipeline.

use crate::error::SimulationError;
use crate::DIMENSIONS;
use log::debug;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Boltzmann constant in J/K.
pub const BOLTZMANN_CONSTANT: f64 = 1.380649e-23;

fn default_boltzmann_constant() -> f64 { BOLTZMANN_CONSTANT }
fn default_consistency_tolerance() -> f64 { 1e-6 }

/// Physical description of a spherical particle in a viscous fluid (SI units).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhysicalParameters {
    /// Particle diameter in metres.
    pub diameter: f64,
    /// Dynamic viscosity of the fluid in Pa·s.
    pub viscosity: f64,
    /// Absolute temperature in kelvin.
    pub temperature: f64,
    #[serde(default = "default_boltzmann_constant")]
    pub boltzmann_constant: f64,
}

impl PhysicalParameters {
    pub fn new(diameter: f64, viscosity: f64, temperature: f64) -> Self {
        Self {
            diameter,
            viscosity,
            temperature,
            boltzmann_constant: BOLTZMANN_CONSTANT,
        }
    }
}

/// Immutable description of one simulation run.
///
/// Exactly one of `diffusion_coefficient` and `physical` is normally given.
/// When both are present they must agree within `consistency_tolerance`
/// (relative), otherwise resolution fails.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Configuration {
    /// Number of trajectory points N, including the origin.
    pub steps: usize,
    /// Time between consecutive points (τ), in seconds.
    pub time_step: f64,
    #[serde(default)]
    pub diffusion_coefficient: Option<f64>,
    #[serde(default)]
    pub physical: Option<PhysicalParameters>,
    #[serde(default = "default_consistency_tolerance")]
    pub consistency_tolerance: f64,
}

impl Configuration {
    /// Configuration with a directly supplied diffusion coefficient.
    pub fn direct(steps: usize, time_step: f64, diffusion_coefficient: f64) -> Self {
        Self {
            steps,
            time_step,
            diffusion_coefficient: Some(diffusion_coefficient),
            physical: None,
            consistency_tolerance: default_consistency_tolerance(),
        }
    }

    /// Configuration deriving the diffusion coefficient via Stokes–Einstein.
    pub fn physical(steps: usize, time_step: f64, physical: PhysicalParameters) -> Self {
        Self {
            steps,
            time_step,
            diffusion_coefficient: None,
            physical: Some(physical),
            consistency_tolerance: default_consistency_tolerance(),
        }
    }
}

/// Intermediate Stokes–Einstein quantities, kept for reporting.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StokesEinstein {
    /// kB·T in joules.
    pub thermal_energy: f64,
    /// 3π·η·d in kg/s.
    pub drag_coefficient: f64,
    pub diffusion_coefficient: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionPath {
    Direct,
    StokesEinstein,
}

/// Output of the resolver: everything the generator and estimators need.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedParameters {
    pub steps: usize,
    pub time_step: f64,
    pub diffusion_coefficient: f64,
    /// Per-axis standard deviation k of a single step.
    pub step_scale: f64,
    pub path: ResolutionPath,
    pub stokes_einstein: Option<StokesEinstein>,
}

impl ResolvedParameters {
    /// Expected squared length of one 2D step, 2·dims·D·τ.
    pub fn expected_step_squared(&self) -> f64 {
        2.0 * DIMENSIONS as f64 * self.diffusion_coefficient * self.time_step
    }
}

fn require_positive(name: &str, value: f64) -> Result<f64, SimulationError> {
    if !value.is_finite() || value <= 0.0 {
        return Err(SimulationError::invalid(format!(
            "{name} must be finite and strictly positive, got {value}"
        )));
    }
    Ok(value)
}

/// Stokes–Einstein relation for a sphere: D = kB·T / (3π·η·d).
pub fn stokes_einstein(physical: &PhysicalParameters) -> Result<StokesEinstein, SimulationError> {
    let diameter = require_positive("diameter", physical.diameter)?;
    let viscosity = require_positive("viscosity", physical.viscosity)?;
    let temperature = require_positive("temperature", physical.temperature)?;
    let boltzmann = require_positive("boltzmann_constant", physical.boltzmann_constant)?;

    let thermal_energy = boltzmann * temperature;
    let drag_coefficient = 3.0 * PI * viscosity * diameter;
    let diffusion_coefficient = thermal_energy / drag_coefficient;
    require_positive("derived diffusion coefficient", diffusion_coefficient)?;

    Ok(StokesEinstein {
        thermal_energy,
        drag_coefficient,
        diffusion_coefficient,
    })
}

/// Per-axis Gaussian standard deviation, k = sqrt(2·D·τ).
pub fn step_scale(diffusion_coefficient: f64, time_step: f64) -> f64 {
    (2.0 * diffusion_coefficient * time_step).sqrt()
}

/// Validates a configuration and derives D and k from it.
///
/// Runs before any random draw. Deterministic: identical inputs give
/// bit-identical outputs.
pub fn resolve(config: &Configuration) -> Result<ResolvedParameters, SimulationError> {
    if config.steps < 2 {
        return Err(SimulationError::invalid(format!(
            "steps must be at least 2, got {}",
            config.steps
        )));
    }
    let time_step = require_positive("time_step", config.time_step)?;

    let derived = config.physical.as_ref().map(stokes_einstein).transpose()?;

    let (diffusion_coefficient, path) = match (config.diffusion_coefficient, derived) {
        (Some(direct), None) => (
            require_positive("diffusion_coefficient", direct)?,
            ResolutionPath::Direct,
        ),
        (None, Some(se)) => (se.diffusion_coefficient, ResolutionPath::StokesEinstein),
        (Some(direct), Some(se)) => {
            let direct = require_positive("diffusion_coefficient", direct)?;
            let tolerance = config.consistency_tolerance;
            if !tolerance.is_finite() || tolerance < 0.0 {
                return Err(SimulationError::invalid(format!(
                    "consistency_tolerance must be finite and non-negative, got {tolerance}"
                )));
            }
            let mismatch = (direct - se.diffusion_coefficient).abs() / direct;
            if mismatch > tolerance {
                return Err(SimulationError::invalid(format!(
                    "diffusion_coefficient {direct} disagrees with Stokes–Einstein value {} \
                     (relative mismatch {mismatch:.3e} > {tolerance:.3e})",
                    se.diffusion_coefficient
                )));
            }
            (direct, ResolutionPath::Direct)
        }
        (None, None) => {
            return Err(SimulationError::invalid(
                "either diffusion_coefficient or physical parameters must be supplied",
            ))
        }
    };

    let scale = step_scale(diffusion_coefficient, time_step);
    if !scale.is_finite() {
        return Err(SimulationError::invalid(format!(
            "step scale sqrt(2·D·τ) is not finite \
             for D = {diffusion_coefficient}, τ = {time_step}"
        )));
    }
    if scale == 0.0 {
        return Err(SimulationError::invalid(format!(
            "step scale sqrt(2·D·τ) underflows to zero \
             for D = {diffusion_coefficient}, τ = {time_step}"
        )));
    }

    debug!(
        "Resolved D = {:e} via {:?}, k = {:e}, N = {}, τ = {}",
        diffusion_coefficient, path, scale, config.steps, time_step
    );

    Ok(ResolvedParameters {
        steps: config.steps,
        time_step,
        diffusion_coefficient,
        step_scale: scale,
        path,
        stokes_einstein: derived,
    })
}
