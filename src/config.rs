//! Run configuration.
//!
//! Every section has defaults, so an empty TOML document is a valid config:
//! flat Lambda-CDM, the standard priors, four chains and the default
//! quadrature settings.
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::cosmology::{DistanceModel, EPSILON, FLAT_TOLERANCE, GRID_POINTS};
use crate::model::{Bounds, PriorBounds, Variant};

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub variant: Variant,

    #[serde(default)]
    pub priors: PriorBounds,

    #[serde(default)]
    pub sampler: SamplerConfig,

    #[serde(default)]
    pub integration: IntegrationConfig,
}

/// NUTS chain settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SamplerConfig {
    /// Number of independent chains.
    #[serde(default = "default_chains")]
    pub chains: u64,

    /// Adaptation draws, discarded.
    #[serde(default = "default_tuning")]
    pub tuning: u64,

    /// Kept draws per chain.
    #[serde(default = "default_samples")]
    pub samples: u64,

    /// Seed of the first chain; chain `k` uses `seed + k`.
    #[serde(default = "default_seed")]
    pub seed: u64,
}

fn default_chains() -> u64 {
    4
}

fn default_tuning() -> u64 {
    1000
}

fn default_samples() -> u64 {
    1000
}

fn default_seed() -> u64 {
    42
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            chains: default_chains(),
            tuning: default_tuning(),
            samples: default_samples(),
            seed: default_seed(),
        }
    }
}

/// Quadrature and clamping settings of the distance model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntegrationConfig {
    #[serde(default = "default_grid_points")]
    pub grid_points: usize,

    #[serde(default = "default_epsilon")]
    pub epsilon: f64,

    #[serde(default = "default_flat_tolerance")]
    pub flat_tolerance: f64,
}

fn default_grid_points() -> usize {
    GRID_POINTS
}

fn default_epsilon() -> f64 {
    EPSILON
}

fn default_flat_tolerance() -> f64 {
    FLAT_TOLERANCE
}

impl Default for IntegrationConfig {
    fn default() -> Self {
        Self {
            grid_points: default_grid_points(),
            epsilon: default_epsilon(),
            flat_tolerance: default_flat_tolerance(),
        }
    }
}

impl IntegrationConfig {
    pub fn distance_model(&self) -> DistanceModel {
        DistanceModel {
            grid_points: self.grid_points,
            epsilon: self.epsilon,
            flat_tolerance: self.flat_tolerance,
        }
    }
}

impl Config {
    /// Load and validate a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.to_owned(),
            source: e,
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseFile {
            path: path.to_owned(),
            source: e,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn distance_model(&self) -> DistanceModel {
        self.integration.distance_model()
    }

    /// Reject settings that would make sampling or integration meaningless.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let check_bounds = |name: &str, b: &Bounds| {
            if !(b.lower.is_finite() && b.upper.is_finite() && b.lower < b.upper) {
                return Err(ConfigError::Invalid(format!(
                    "prior `{name}` needs finite lower < upper, got [{}, {}]",
                    b.lower, b.upper
                )));
            }
            Ok(())
        };
        check_bounds("h0", &self.priors.h0)?;
        check_bounds("om", &self.priors.om)?;
        check_bounds("ok", &self.priors.ok)?;

        if self.priors.h0.lower <= 0.0 {
            return Err(ConfigError::Invalid(
                "prior `h0` must be strictly positive".to_string(),
            ));
        }
        if self.sampler.chains == 0 {
            return Err(ConfigError::Invalid("at least one chain is required".to_string()));
        }
        if self.sampler.samples == 0 {
            return Err(ConfigError::Invalid("at least one sample is required".to_string()));
        }
        if self.integration.grid_points < 2 {
            return Err(ConfigError::Invalid(format!(
                "grid_points must be at least 2, got {}",
                self.integration.grid_points
            )));
        }
        if !(self.integration.epsilon > 0.0) || !(self.integration.flat_tolerance >= 0.0) {
            return Err(ConfigError::Invalid(
                "epsilon must be positive and flat_tolerance non-negative".to_string(),
            ));
        }
        Ok(())
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    ParseFile {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}
