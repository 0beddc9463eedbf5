use brownian_config::{load_config, Config, ConfigError, OutputFormat};
use brownian_report::{
    JsonSerializer, ReportError, Sender, Serializer, StdioSender, SummarySerializer,
};
use brownian_simulation::{run_replicates, run_seeded, SimulationError};
use clap::{Parser, ValueEnum};
use log::{error, info, warn};
use std::path::PathBuf;
use std::process;
use thiserror::Error;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Simulate 2D Brownian motion and check it against the diffusion law",
    long_about = None
)]
struct Args {
    /// Path to the simulation configuration file (JSON or TOML)
    #[arg(short, long, default_value = "config.json")]
    config: PathBuf,

    /// Seed for the random generator; overrides the config file
    #[arg(short, long)]
    seed: Option<u64>,

    /// Number of trajectory points; overrides the config file
    #[arg(short = 'n', long)]
    steps: Option<usize>,

    /// Number of independent replicate runs; overrides the config file
    #[arg(short, long)]
    replicates: Option<usize>,

    /// Output format; overrides the config file
    #[arg(short, long, value_enum)]
    format: Option<FormatArg>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum FormatArg {
    Summary,
    Json,
}

impl From<FormatArg> for OutputFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Summary => OutputFormat::Summary,
            FormatArg::Json => OutputFormat::Json,
        }
    }
}

#[derive(Error, Debug)]
enum RunnerError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Simulation(#[from] SimulationError),

    #[error(transparent)]
    Report(#[from] ReportError),
}

fn main() {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    if let Err(e) = run(&args) {
        error!("{}", e);
        process::exit(1);
    }
}

fn run(args: &Args) -> Result<(), RunnerError> {
    // Load configuration
    let mut config = load_config(&args.config)?;
    info!("Using configuration from {}", args.config.display());

    apply_overrides(&mut config, args);
    brownian_config::validate(&config)?;

    let seed = config.seed.unwrap_or_else(rand::random::<u64>);
    info!("Seed: {} (pass --seed {} to reproduce)", seed, seed);

    let output = simulate(&config, seed)?;

    let mut sender = StdioSender::new();
    sender.send(output.as_bytes())?;
    Ok(())
}

/// Command line values take precedence over the file.
fn apply_overrides(config: &mut Config, args: &Args) {
    if let Some(seed) = args.seed {
        config.seed = Some(seed);
    }
    if let Some(steps) = args.steps {
        config.simulation.steps = steps;
    }
    if let Some(count) = args.replicates {
        config.replicates.count = count;
    }
    if let Some(format) = args.format {
        config.output.format = format.into();
    }
}

fn create_serializer(format: OutputFormat) -> Box<dyn Serializer> {
    match format {
        OutputFormat::Summary => Box::new(SummarySerializer),
        OutputFormat::Json => Box::new(JsonSerializer { pretty: true }),
    }
}

/// Runs a single simulation or a replicate batch and renders the result.
fn simulate(config: &Config, seed: u64) -> Result<String, RunnerError> {
    let serializer = create_serializer(config.output.format);

    if config.replicates.count > 1 {
        info!("Running {} independent replicates", config.replicates.count);
        let summary = run_replicates(
            &config.simulation,
            &config.analysis,
            seed,
            config.replicates.count,
        )?;
        info!(
            "{:.1}% of replicates within 5 standard errors of the theory",
            summary.coverage_fraction * 100.0
        );
        return Ok(serializer.serialize_replicates(&summary)?);
    }

    info!("Simulating {} steps", config.simulation.steps);
    let run = run_seeded(&config.simulation, &config.analysis, seed)?;
    info!(
        "Estimated D = {:e} (true {:e}, relative error {:.2}%)",
        run.estimate.estimate,
        run.parameters.diffusion_coefficient,
        run.estimate.relative_error * 100.0
    );
    if !run.independence.consistent {
        warn!(
            "Only {:.1}% of autocorrelation coefficients lie inside +/-{:.4}",
            run.independence.fraction_within_band * 100.0,
            run.independence.band
        );
    }
    Ok(serializer.serialize(&run)?)
}
