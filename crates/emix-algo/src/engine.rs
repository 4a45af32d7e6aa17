//! One optimization run: validate, index, parametrize, assemble, solve, read back.

use crate::config::{ConfigError, OptConfig};
use crate::model::{ModelBuilder, ModelError};
use crate::preprocessing::{IndexError, Indices, ModelParameters, ParameterError};
use crate::results::{Results, ResultsError};
use crate::solver::{GoodLpAdapter, SolveAdapter, SolveStatus};
use emix_core::{EmixError, Network};
use std::time::Instant;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OptimizationError {
    #[error("network validation failed: {0}")]
    Validation(String),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Index(#[from] IndexError),
    #[error(transparent)]
    Parameter(#[from] ParameterError),
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error(transparent)]
    Results(#[from] ResultsError),
}

impl From<OptimizationError> for EmixError {
    fn from(err: OptimizationError) -> Self {
        match err {
            OptimizationError::Validation(msg) => EmixError::Validation(msg),
            OptimizationError::Config(ConfigError::Io { source, .. }) => EmixError::Io(source),
            OptimizationError::Config(ConfigError::Parse(e)) => EmixError::Parse(e.to_string()),
            OptimizationError::Config(e) => EmixError::Config(e.to_string()),
            OptimizationError::Index(e) => EmixError::Index(e.to_string()),
            OptimizationError::Parameter(e) => EmixError::Parameter(e.to_string()),
            OptimizationError::Model(e) => EmixError::Solver(e.to_string()),
            OptimizationError::Results(e) => EmixError::Solver(e.to_string()),
        }
    }
}

/// Everything a run produced.
///
/// `results` is present only when the solve reached an optimum.
#[derive(Debug)]
pub struct EngineRun {
    pub indices: Indices,
    pub parameters: ModelParameters,
    pub status: SolveStatus,
    pub results: Option<Results>,
    pub message: Option<String>,
}

pub struct OptimizationEngine;

impl OptimizationEngine {
    /// Runs with the backend named in `config.solver`
    pub fn run(network: &Network, config: &OptConfig) -> Result<EngineRun, OptimizationError> {
        let adapter = GoodLpAdapter::from_config(config)?;
        Self::run_with(network, config, &adapter)
    }

    pub fn run_with(
        network: &Network,
        config: &OptConfig,
        adapter: &dyn SolveAdapter,
    ) -> Result<EngineRun, OptimizationError> {
        let span = tracing::info_span!(
            "optimization",
            hours = config.hour_sample.len(),
            years = config.year_sample.len()
        );
        let _guard = span.enter();
        let start = Instant::now();

        config.validate()?;

        let diagnostics = network.validate();
        for warning in diagnostics.warnings() {
            tracing::warn!(category = %warning.category, "{}", warning.message);
        }
        if diagnostics.has_errors() {
            let messages = diagnostics.messages().join("; ");
            tracing::error!(errors = diagnostics.error_count(), "network validation failed");
            return Err(OptimizationError::Validation(messages));
        }

        let indices = Indices::new(
            network,
            &config.hour_sample,
            &config.year_sample,
            config.year_aggregates.as_deref(),
        )?;
        tracing::debug!(
            buses = indices.bus.len(),
            generators = indices.gen.len(),
            storages = indices.stor.len(),
            lines = indices.line.len(),
            "indices built"
        );

        let parameters = ModelParameters::new(network, &indices, config)?;
        tracing::debug!(
            hourly_scale = parameters.scale.hourly_scale,
            money_scale = parameters.scale.money_scale,
            "parameters built"
        );

        let model = ModelBuilder::new(&indices, &parameters, config).build()?;
        let variables = model.variables.clone();

        let outcome = adapter.solve(model);
        let results = match outcome.status {
            SolveStatus::Optimal => Some(Results::from_solution(
                &indices,
                &parameters,
                &variables,
                &outcome,
            )?),
            _ => None,
        };

        tracing::info!(
            status = %outcome.status,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "optimization finished"
        );

        Ok(EngineRun {
            indices,
            parameters,
            status: outcome.status,
            results,
            message: outcome.message,
        })
    }
}
