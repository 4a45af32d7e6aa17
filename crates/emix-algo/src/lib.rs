//! # emix-algo: Multi-Year Energy-Mix Planning
//!
//! Builds and solves a linear program that chooses capacity investments and
//! hourly dispatch for an [`emix_core::Network`] over a sampled horizon.
//!
//! ## Pipeline
//!
//! | Stage | Entry point | Output |
//! |-------|-------------|--------|
//! | Indexing | [`Indices::new`] | dense ordinals and relation maps |
//! | Parameters | [`ModelParameters::new`] | sampled, money-scaled arrays |
//! | Assembly | [`ModelBuilder::build`] | variables, tagged constraints, objective |
//! | Solve | [`SolveAdapter::solve`] | [`SolveOutcome`] |
//! | Read-back | [`Results::from_solution`] | name-keyed tables |
//!
//! [`OptimizationEngine`] runs all of them for one [`OptConfig`].
//!
//! ## Solvers
//!
//! Backends come from `good_lp`: Clarabel by default, HiGHS behind the
//! `solver-highs` feature. Clarabel is continuous-only, so a model with binary
//! stack fractions needs HiGHS.
//!
//! ## Example
//!
//! ```ignore
//! use emix_algo::{OptConfig, OptimizationEngine};
//!
//! let network = emix_algo::test_utils::fixture_network()?;
//! let config = OptConfig::builder((0..24).collect(), vec![0, 1, 2]).build();
//!
//! let run = OptimizationEngine::run(&network, &config)?;
//! if let Some(results) = &run.results {
//!     println!("total cost: {:.2}", results.objective_value);
//! }
//! ```

pub mod config;
pub mod engine;
pub mod logging;
pub mod model;
pub mod preprocessing;
pub mod results;
pub mod solver;
pub mod test_utils;

pub use config::{ConfigError, OptConfig, OptConfigBuilder};
pub use engine::{EngineRun, OptimizationEngine, OptimizationError};
pub use model::{AssembledModel, ModelBuilder, ModelError, ModelVariables};
pub use preprocessing::{
    get_index_from_prop, resolve_index_from_prop, IndexError, Indices, IndexingSet,
    ModelParameters, ParameterError,
};
pub use results::{
    BusesResults, CapacityResults, FractionsResults, GeneratorsResults, HourYearTable,
    LinesResults, Results, ResultsError, StoragesResults, YearMatrix, YearSeries,
};
pub use solver::{GoodLpAdapter, SolveAdapter, SolveOutcome, SolveStatus, SolverKind};
