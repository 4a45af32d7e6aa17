//! Optimization run configuration.
//!
//! Loaded from TOML or assembled with [`OptConfig::builder`]:
//!
//! ```toml
//! hour_sample = [0, 1, 2, 3]
//! year_sample = [0, 1, 2]
//! year_aggregates = [1.0, 5.0, 1.0]
//! money_scale = 1000.0
//! ens_penalty = 1e4
//! solver = "clarabel"
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
    #[error("unknown solver '{0}' (expected one of: clarabel, highs)")]
    UnknownSolver(String),
    #[error("solver '{0}' is not enabled in this build")]
    SolverUnavailable(String),
}

/// Settings of one optimization run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptConfig {
    /// Hour labels (0-based, within `n_hours`) to model
    pub hour_sample: Vec<usize>,
    /// Year labels (0-based, within `n_years`) to model
    pub year_sample: Vec<usize>,
    /// Weight of every sampled year in the objective; all ones when absent
    #[serde(default)]
    pub year_aggregates: Option<Vec<f64>>,
    /// Yearly discount rate indexed by year label; missing years use zero
    #[serde(default)]
    pub discount_rate: Vec<f64>,
    /// Every monetary input is divided by this value
    #[serde(default = "default_money_scale")]
    pub money_scale: f64,
    /// Scale per-hour costs by `n_hours / |sampled hours|`
    #[serde(default = "default_true")]
    pub use_hourly_scale: bool,
    /// Model stack fractions as binary choices
    #[serde(default)]
    pub binary_fraction: bool,
    /// Cost of energy not served; zero disables the ENS variables
    #[serde(default)]
    pub ens_penalty: f64,
    #[serde(default = "default_solver")]
    pub solver: String,
}

fn default_money_scale() -> f64 {
    1.0
}

fn default_true() -> bool {
    true
}

fn default_solver() -> String {
    "clarabel".to_string()
}

impl OptConfig {
    pub fn builder(hour_sample: Vec<usize>, year_sample: Vec<usize>) -> OptConfigBuilder {
        OptConfigBuilder {
            config: OptConfig {
                hour_sample,
                year_sample,
                year_aggregates: None,
                discount_rate: Vec::new(),
                money_scale: default_money_scale(),
                use_hourly_scale: true,
                binary_fraction: false,
                ens_penalty: 0.0,
                solver: default_solver(),
            },
        }
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: OptConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.money_scale.is_finite() && self.money_scale > 0.0) {
            return Err(ConfigError::InvalidValue {
                field: "money_scale",
                reason: format!("must be positive, got {}", self.money_scale),
            });
        }
        if !(self.ens_penalty.is_finite() && self.ens_penalty >= 0.0) {
            return Err(ConfigError::InvalidValue {
                field: "ens_penalty",
                reason: format!("must be non-negative, got {}", self.ens_penalty),
            });
        }
        if let Some(r) = self.discount_rate.iter().find(|r| **r <= -1.0) {
            return Err(ConfigError::InvalidValue {
                field: "discount_rate",
                reason: format!("rates must exceed -1, got {r}"),
            });
        }
        Ok(())
    }
}

/// Copy-with builder for [`OptConfig`]
#[derive(Debug, Clone)]
pub struct OptConfigBuilder {
    config: OptConfig,
}

impl OptConfigBuilder {
    pub fn year_aggregates(mut self, weights: Vec<f64>) -> Self {
        self.config.year_aggregates = Some(weights);
        self
    }

    pub fn discount_rate(mut self, rates: Vec<f64>) -> Self {
        self.config.discount_rate = rates;
        self
    }

    pub fn money_scale(mut self, scale: f64) -> Self {
        self.config.money_scale = scale;
        self
    }

    pub fn use_hourly_scale(mut self, enabled: bool) -> Self {
        self.config.use_hourly_scale = enabled;
        self
    }

    pub fn binary_fraction(mut self, enabled: bool) -> Self {
        self.config.binary_fraction = enabled;
        self
    }

    pub fn ens_penalty(mut self, penalty: f64) -> Self {
        self.config.ens_penalty = penalty;
        self
    }

    pub fn solver(mut self, name: impl Into<String>) -> Self {
        self.config.solver = name.into();
        self
    }

    pub fn build(self) -> OptConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_minimal_toml() {
        let config = OptConfig::from_toml_str("hour_sample = [0, 1]\nyear_sample = [0]\n").unwrap();
        assert_eq!(config.money_scale, 1.0);
        assert!(config.use_hourly_scale);
        assert!(!config.binary_fraction);
        assert_eq!(config.solver, "clarabel");
        assert!(config.year_aggregates.is_none());
    }

    #[test]
    fn test_builder_matches_toml() {
        let built = OptConfig::builder(vec![0, 1], vec![0, 1, 2])
            .year_aggregates(vec![1.0, 5.0, 1.0])
            .money_scale(1000.0)
            .build();
        let parsed = OptConfig::from_toml_str(
            "hour_sample = [0, 1]\nyear_sample = [0, 1, 2]\nyear_aggregates = [1.0, 5.0, 1.0]\nmoney_scale = 1000.0\n",
        )
        .unwrap();
        assert_eq!(built, parsed);
    }

    #[test]
    fn test_invalid_money_scale() {
        let err = OptConfig::builder(vec![0], vec![0])
            .money_scale(0.0)
            .build()
            .validate()
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { field: "money_scale", .. }));
    }

    #[test]
    fn test_negative_ens_penalty() {
        let result = OptConfig::from_toml_str("hour_sample = [0]\nyear_sample = [0]\nens_penalty = -1.0\n");
        assert!(matches!(
            result,
            Err(ConfigError::InvalidValue { field: "ens_penalty", .. })
        ));
    }

    #[test]
    fn test_missing_sample_is_parse_error() {
        let result = OptConfig::from_toml_str("year_sample = [0]\n");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }
}
