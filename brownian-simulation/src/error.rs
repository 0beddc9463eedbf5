use thiserror::Error;

/// Failures raised by the simulation pipeline.
///
/// A run that fails never yields partial output: the stage that raised the
/// error stops the pipeline and nothing downstream executes.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SimulationError {
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Numeric overflow at step {step}: value became {value}")]
    NumericOverflow { step: usize, value: f64 },
}

impl SimulationError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        SimulationError::InvalidParameter(message.into())
    }
}
