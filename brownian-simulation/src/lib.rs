//! Two-dimensional Brownian motion of a single particle, validated against
//! the diffusion law.
//!
//! The engine is a strict forward pipeline of pure stages:
//!
//! 1. [`params::resolve`] turns a [`Configuration`] into D and the step scale k.
//! 2. [`Trajectory::generate`] draws independent Gaussian steps from an
//!    injected random source and accumulates them from the origin.
//! 3. [`DisplacementSeries::compute`] derives squared displacements and the
//!    theoretical MSD curve.
//! 4. [`DiffusionEstimate`] and [`Autocorrelation`] estimate D and test the
//!    independence of successive steps.
//!
//! [`run`] chains the four stages; [`run_replicates`] repeats independent
//! runs in parallel for validation.

pub mod autocorrelation;
pub mod displacement;
pub mod error;
pub mod estimate;
pub mod params;
pub mod pipeline;
pub mod trajectory;

/// Spatial dimensions of the walk.
pub const DIMENSIONS: usize = 2;

pub use autocorrelation::{Autocorrelation, AutocorrelationPoint, IndependenceCheck};
pub use displacement::{theoretical_msd, times, DisplacementSeries, TimeAveragedMsd};
pub use error::SimulationError;
pub use estimate::DiffusionEstimate;
pub use params::{
    resolve, stokes_einstein, Configuration, PhysicalParameters, ResolutionPath,
    ResolvedParameters, StokesEinstein, BOLTZMANN_CONSTANT,
};
pub use pipeline::{
    replicate_rng, run, run_replicates, run_seeded, AnalysisOptions, ReplicateOutcome,
    ReplicateSummary, SimulationRun, DEFAULT_MAX_LAG,
};
pub use trajectory::Trajectory;
