use brownian_simulation::{AnalysisOptions, Configuration};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use thiserror::Error;

// --- Error Type ---
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("Failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("Unsupported config file extension: {0}")]
    UnsupportedFormat(String),

    #[error("Invalid configuration: {0}")]
    Validation(String),
}

// --- Enums for Choices ---
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Summary,
    Json,
}

// --- Configuration Sections ---

#[derive(Deserialize, Debug, Clone)]
pub struct ReplicateSettings {
    #[serde(default = "default_replicate_count")]
    pub count: usize,
}

fn default_replicate_count() -> usize { 1 }

impl Default for ReplicateSettings {
    fn default() -> Self {
        Self {
            count: default_replicate_count(),
        }
    }
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct OutputSettings {
    #[serde(default)]
    pub format: OutputFormat,
}

// --- Top-Level Config Struct ---

#[derive(Deserialize, Debug, Clone)]
pub struct Config {
    /// Physical and numerical parameters of the walk. Their values are
    /// checked by the simulation's resolver, not here.
    pub simulation: Configuration,
    /// Absent means the runner picks a fresh seed and logs it.
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default)]
    pub analysis: AnalysisOptions,
    #[serde(default)]
    pub replicates: ReplicateSettings,
    #[serde(default)]
    pub output: OutputSettings,
}

// --- Loading Functions ---

/// Parses a config from text. `extension` selects the format: `toml` or `json`.
pub fn parse_config(content: &str, extension: &str) -> Result<Config, ConfigError> {
    let config: Config = match extension {
        "json" => serde_json::from_str(content)?,
        "toml" => toml::from_str(content)?,
        other => return Err(ConfigError::UnsupportedFormat(other.to_string())),
    };
    validate(&config)?;
    Ok(config)
}

/// Reads, parses and validates a config file. Files without an extension
/// are treated as JSON.
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = fs::read_to_string(path)?;
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_else(|| "json".to_string());
    parse_config(&content, &extension)
}

/// Structural checks that do not depend on the physics.
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    if config.replicates.count == 0 {
        return Err(ConfigError::Validation(
            "Replicate count must be greater than 0".to_string(),
        ));
    }

    if config.analysis.max_lag == 0 && !config.analysis.full_window {
        return Err(ConfigError::Validation(
            "Autocorrelation max_lag must be greater than 0".to_string(),
        ));
    }

    if config.analysis.tamsd_max_lag == 0 {
        return Err(ConfigError::Validation(
            "Time-averaged MSD max lag must be greater than 0".to_string(),
        ));
    }

    Ok(())
}
