//! Statistical properties of the random walk engine.
//!
//! Every test uses fixed ChaCha seeds, so results are reproducible. The
//! thresholds are statistical bounds (several standard errors wide), never
//! exact recovery of D.

use brownian_simulation::{
    run, run_replicates, run_seeded, theoretical_msd, AnalysisOptions, Autocorrelation,
    Configuration, PhysicalParameters, SimulationError, Trajectory,
};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

fn direct(steps: usize) -> Configuration {
    Configuration::direct(steps, 0.01, 1.0)
}

fn windowed(max_lag: usize) -> AnalysisOptions {
    AnalysisOptions::windowed(max_lag, 20)
}

#[test]
fn walks_start_at_origin_for_many_shapes() {
    for (steps, seed) in [(2, 1), (3, 2), (17, 3), (1000, 4)] {
        let run = run_seeded(&direct(steps), &windowed(5), seed).unwrap();
        assert_eq!(run.trajectory.x()[0], 0.0);
        assert_eq!(run.trajectory.y()[0], 0.0);
        assert_eq!(run.trajectory.x().len(), steps);
        assert_eq!(run.trajectory.y().len(), steps);
        assert_eq!(run.displacement.step_squared.len(), steps - 1);
    }
}

#[test]
fn mean_step_squared_matches_four_d_tau() {
    let run = run_seeded(&direct(100_000), &windowed(10), 2024).unwrap();
    let expected = 4.0 * 1.0 * 0.01;
    let scale = 4.0 * 0.01;
    let deviation = (run.estimate.mean_step_squared - expected).abs();
    assert!(
        deviation < 5.0 * run.estimate.standard_error * scale,
        "mean {} vs {}",
        run.estimate.mean_step_squared,
        expected
    );
}

#[test]
fn coverage_holds_across_seeds() {
    let summary = run_replicates(&direct(10_000), &windowed(10), 77, 40).unwrap();
    assert_eq!(summary.outcomes.len(), 40);
    assert!(
        summary.coverage_fraction >= 0.95,
        "coverage {}",
        summary.coverage_fraction
    );
}

#[test]
fn standard_error_shrinks_as_inverse_sqrt_n() {
    let options = windowed(5);
    let errors: Vec<f64> = [500, 2_000, 8_000]
        .iter()
        .map(|&n| run_seeded(&direct(n), &options, 314).unwrap().estimate.standard_error)
        .collect();
    for pair in errors.windows(2) {
        // Quadrupling N should halve the standard error.
        let ratio = pair[0] / pair[1];
        assert!((1.5..2.5).contains(&ratio), "ratio {ratio}");
    }
}

#[test]
fn identical_seeds_are_bit_identical() {
    let options = windowed(10);
    let a = run_seeded(&direct(5_000), &options, 9).unwrap();
    let b = run_seeded(&direct(5_000), &options, 9).unwrap();
    let bits = |v: &[f64]| v.iter().map(|f| f.to_bits()).collect::<Vec<_>>();
    assert_eq!(bits(a.trajectory.x()), bits(b.trajectory.x()));
    assert_eq!(bits(a.trajectory.y()), bits(b.trajectory.y()));
    assert_eq!(bits(&a.displacement.step_squared), bits(&b.displacement.step_squared));
    assert_eq!(a.estimate.estimate.to_bits(), b.estimate.estimate.to_bits());
}

#[test]
fn injected_generator_drives_the_run() {
    let config = direct(300);
    let options = windowed(5);
    let mut rng = ChaCha8Rng::seed_from_u64(12);
    let injected = run(&config, &options, &mut rng).unwrap();
    let seeded = run_seeded(&config, &options, 12).unwrap();
    assert_eq!(injected.trajectory, seeded.trajectory);
    assert_eq!(injected.seed, None);
}

#[test]
fn independent_steps_have_flat_autocorrelation() {
    let run = run_seeded(&direct(10_000), &windowed(50), 4242).unwrap();
    let acf = &run.autocorrelation;
    assert_eq!(acf.at(0), Some(1.0));
    assert!(acf.fraction_within(0.05, 50) >= 0.95);
    for lag in 1..=50 {
        assert_eq!(acf.at(lag), acf.at(-lag));
    }
}

#[test]
fn reused_samples_are_detected() {
    // Build a broken walk whose increments repeat each draw three times.
    let mut rng = ChaCha8Rng::seed_from_u64(8);
    let honest = Trajectory::generate(
        &brownian_simulation::resolve(&direct(3_001)).unwrap(),
        &mut rng,
    )
    .unwrap();
    let reused: Vec<f64> = honest
        .dx()
        .iter()
        .step_by(3)
        .flat_map(|v| std::iter::repeat(*v).take(3))
        .collect();
    let acf = Autocorrelation::compute(&reused, Some(20));
    assert!(acf.at(1).unwrap() > 0.5);
    assert!(!acf.independence_check().consistent);
}

#[test]
fn two_point_walk_is_well_defined() {
    let run = run_seeded(&direct(2), &AnalysisOptions::default(), 1).unwrap();
    assert_eq!(run.displacement.step_squared.len(), 1);
    assert!(!run.estimate.standard_error.is_nan());
    assert!(!run.estimate.estimate.is_nan());
    assert_eq!(run.autocorrelation.points().len(), 1);
}

#[test]
fn huge_coefficient_keeps_a_finite_standard_error() {
    // Squared steps near 1e160 square to past the float limit.
    let run = run_seeded(&Configuration::direct(100, 1.0, 1e160), &windowed(5), 8).unwrap();
    let estimate = &run.estimate;
    assert!(estimate.estimate.is_finite());
    assert!(estimate.standard_error.is_finite());
    assert!(estimate.standard_error > 0.0);
    assert!(estimate.relative_error < 0.6, "Dhat = {:e}", estimate.estimate);
}

#[test]
fn invalid_inputs_are_rejected_before_drawing() {
    let water = || PhysicalParameters::new(1.0e-6, 1.0e-3, 298.0);
    let mut zero_d = water();
    zero_d.diameter = 0.0;
    let mut zero_eta = water();
    zero_eta.viscosity = 0.0;
    let mut zero_t = water();
    zero_t.temperature = 0.0;

    let bad = [
        Configuration::direct(100, 0.01, 0.0),
        Configuration::physical(100, 0.01, zero_d),
        Configuration::physical(100, 0.01, zero_eta),
        Configuration::physical(100, 0.01, zero_t),
        Configuration::direct(1, 0.01, 1.0),
        Configuration::direct(10, 1e-200, 1e-200),
    ];
    for config in &bad {
        let result = run_seeded(config, &AnalysisOptions::default(), 3);
        assert!(matches!(result, Err(SimulationError::InvalidParameter(_))));
        let replicates = run_replicates(config, &AnalysisOptions::default(), 3, 4);
        assert!(matches!(replicates, Err(SimulationError::InvalidParameter(_))));
    }
}

#[test]
fn reference_scenario() {
    let config = direct(2_000);
    let options = AnalysisOptions::default();
    let run = run_seeded(&config, &options, 20_240_101).unwrap();

    assert!((run.parameters.step_scale - 0.1414).abs() < 1e-4);
    assert!((run.displacement.msd_theory[1999] - 79.96).abs() < 1e-9);
    assert!((theoretical_msd(2_000, 1.0, 0.01)[1999] - 79.96).abs() < 1e-9);
    assert!(run.estimate.relative_error < 0.1, "Dhat = {}", run.estimate.estimate);

    let again = run_seeded(&config, &options, 20_240_101).unwrap();
    assert_eq!(run.estimate.estimate.to_bits(), again.estimate.estimate.to_bits());
}

#[test]
fn runs_serialize_to_json() {
    let run = run_seeded(&direct(50), &windowed(3), 6).unwrap();
    let value = serde_json::to_value(&run).unwrap();
    assert_eq!(value["trajectory"]["x"].as_array().unwrap().len(), 50);
    assert_eq!(value["parameters"]["path"], "direct");
    assert_eq!(value["autocorrelation"]["points"].as_array().unwrap().len(), 7);
}
