use brownian_simulation::{ResolutionPath, ReplicateSummary, SimulationRun};
use std::fmt::Write as _;
use std::io::{self, Write};
use thiserror::Error;

// --- Error Type ---
#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Output failed: {0}")]
    Io(#[from] io::Error),

    #[error("Formatting failed: {0}")]
    Format(#[from] std::fmt::Error),
}

// --- Traits ---
/// Renders simulation output as text.
pub trait Serializer: Send + Sync {
    fn serialize(&self, run: &SimulationRun) -> Result<String, ReportError>;
    fn serialize_replicates(&self, summary: &ReplicateSummary) -> Result<String, ReportError>;
}

/// Sends serialized data to a destination.
pub trait Sender {
    fn send(&mut self, data: &[u8]) -> Result<(), ReportError>;
}

// --- Serializers ---

/// Full run as JSON: every array plus the scalar results.
pub struct JsonSerializer {
    pub pretty: bool,
}

impl Serializer for JsonSerializer {
    fn serialize(&self, run: &SimulationRun) -> Result<String, ReportError> {
        let text = if self.pretty {
            serde_json::to_string_pretty(run)?
        } else {
            serde_json::to_string(run)?
        };
        Ok(text)
    }

    fn serialize_replicates(&self, summary: &ReplicateSummary) -> Result<String, ReportError> {
        let text = if self.pretty {
            serde_json::to_string_pretty(summary)?
        } else {
            serde_json::to_string(summary)?
        };
        Ok(text)
    }
}

/// Human-readable summary of the scalar results.
pub struct SummarySerializer;

fn path_name(path: ResolutionPath) -> &'static str {
    match path {
        ResolutionPath::Direct => "direct coefficient",
        ResolutionPath::StokesEinstein => "Stokes-Einstein relation",
    }
}

fn verdict(ok: bool) -> &'static str {
    if ok { "consistent" } else { "NOT consistent" }
}

impl Serializer for SummarySerializer {
    fn serialize(&self, run: &SimulationRun) -> Result<String, ReportError> {
        let p = &run.parameters;
        let e = &run.estimate;
        let mut out = String::new();

        writeln!(out, "Brownian motion in 2D")?;
        if let Some(seed) = run.seed {
            writeln!(out, "  seed                     {seed}")?;
        }
        writeln!(out, "  steps (N)                {}", p.steps)?;
        writeln!(out, "  time step (tau)          {:e} s", p.time_step)?;
        writeln!(out, "  resolved via             {}", path_name(p.path))?;
        if let Some(se) = &p.stokes_einstein {
            writeln!(out, "  thermal energy kB*T      {:e} J", se.thermal_energy)?;
            writeln!(out, "  drag 3*pi*eta*d          {:e} kg/s", se.drag_coefficient)?;
            writeln!(out, "  Stokes-Einstein D        {:e}", se.diffusion_coefficient)?;
        }
        writeln!(out, "  diffusion coefficient D  {:e}", p.diffusion_coefficient)?;
        writeln!(out, "  step scale k             {:e}", p.step_scale)?;
        writeln!(out)?;

        writeln!(out, "Diffusion estimate")?;
        writeln!(out, "  D estimate               {:e}", e.estimate)?;
        writeln!(out, "  standard error           {:e}", e.standard_error)?;
        writeln!(out, "  relative error           {:.2}%", e.relative_error * 100.0)?;
        if let Some(fitted) = run.fitted_diffusion_coefficient {
            writeln!(out, "  D from MSD slope fit     {:e}", fitted)?;
        }
        let last = p.steps - 1;
        writeln!(
            out,
            "  final r^2 / theory       {:e} / {:e}",
            run.displacement.cumulative_squared[last], run.displacement.msd_theory[last]
        )?;
        writeln!(out)?;

        let check = &run.independence;
        writeln!(out, "Step independence")?;
        writeln!(out, "  lags checked             {}", check.lags_checked)?;
        writeln!(out, "  band                     +/-{:.4}", check.band)?;
        writeln!(
            out,
            "  inside band              {:.1}% ({})",
            check.fraction_within_band * 100.0,
            verdict(check.consistent)
        )?;

        Ok(out)
    }

    fn serialize_replicates(&self, summary: &ReplicateSummary) -> Result<String, ReportError> {
        let p = &summary.parameters;
        let mut out = String::new();

        writeln!(out, "Replicate validation")?;
        writeln!(out, "  base seed                {}", summary.seed)?;
        writeln!(out, "  replicates               {}", summary.outcomes.len())?;
        writeln!(out, "  steps (N)                {}", p.steps)?;
        writeln!(out, "  diffusion coefficient D  {:e}", p.diffusion_coefficient)?;
        writeln!(out)?;
        writeln!(
            out,
            "  {:>5}  {:>14}  {:>14}  {:>10}  {:>6}  {:>6}",
            "run", "D estimate", "std error", "rel err", "5 SE", "indep"
        )?;
        for o in &summary.outcomes {
            writeln!(
                out,
                "  {:>5}  {:>14.6e}  {:>14.6e}  {:>9.2}%  {:>6}  {:>6}",
                o.index,
                o.estimate.estimate,
                o.estimate.standard_error,
                o.estimate.relative_error * 100.0,
                if o.within_coverage { "yes" } else { "no" },
                if o.independent { "yes" } else { "no" },
            )?;
        }
        writeln!(out)?;
        writeln!(out, "  within 5 SE              {:.1}%", summary.coverage_fraction * 100.0)?;
        writeln!(out, "  independent steps        {:.1}%", summary.independence_fraction * 100.0)?;

        Ok(out)
    }
}

// --- Senders ---

/// Sends data to standard output.
pub struct StdioSender {
    stdout: io::Stdout,
}

impl StdioSender {
    pub fn new() -> Self {
        StdioSender { stdout: io::stdout() }
    }
}

impl Sender for StdioSender {
    fn send(&mut self, data: &[u8]) -> Result<(), ReportError> {
        let mut lock = self.stdout.lock();
        lock.write_all(data)?;
        if !data.ends_with(b"\n") {
            lock.write_all(b"\n")?;
        }
        lock.flush()?;
        Ok(())
    }
}

impl Default for StdioSender {
    fn default() -> Self {
        Self::new()
    }
}

/// Sends data to any writer; used for tests and piping.
pub struct WriterSender<W: Write> {
    writer: W,
}

impl<W: Write> WriterSender<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> Sender for WriterSender<W> {
    fn send(&mut self, data: &[u8]) -> Result<(), ReportError> {
        self.writer.write_all(data)?;
        if !data.ends_with(b"\n") {
            self.writer.write_all(b"\n")?;
        }
        self.writer.flush()?;
        Ok(())
    }
}
