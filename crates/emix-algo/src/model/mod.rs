//! LP assembly.
//!
//! [`ModelBuilder`] turns [`Indices`] and [`ModelParameters`] into an
//! [`AssembledModel`]: backend variables registered in a [`VariableRegistry`],
//! tagged constraints and the objective expression.
//!
//! # Formulation
//!
//! - capacity evolution per global unit and per (aggregated consumer, type) pair
//! - device power of local units scaled by the consumers their stacks serve
//! - generation split into per-carrier output and dump
//! - hourly energy balance at every bus, including conversion inputs
//! - storage state of charge carried across hours and years
//! - stack fractions of each aggregated consumer's demand
//!
//! The objective is the discounted, year-weighted sum of capital, operating,
//! fuel and emission costs, generation compensation, and the ENS,
//! transmission and DSR penalties.

pub mod balance;
pub mod capacity;
pub mod fraction;
pub mod generation;
pub mod objective;
pub mod storage;
pub mod variables;

use crate::config::OptConfig;
use crate::preprocessing::{Indices, ModelParameters};
use good_lp::{Constraint, Expression, ProblemVariables, Variable};
use std::time::Instant;
use thiserror::Error;

pub use capacity::{s_range, t_range, CapacityEvolution};
pub use variables::{HourYear, ModelVariables, VarId, VariableRegistry};

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ModelError {
    #[error("inconsistent model input, missing index: {0}")]
    MissingIndex(String),
    #[error("invalid model parameter: {0}")]
    InvalidParameter(String),
}

/// Constraints with a stable, human-readable tag each
#[derive(Default)]
pub struct ConstraintSet {
    constraints: Vec<Constraint>,
    tags: Vec<String>,
}

impl ConstraintSet {
    pub fn add(&mut self, tag: String, constraint: Constraint) {
        self.tags.push(tag);
        self.constraints.push(constraint);
    }

    pub fn len(&self) -> usize {
        self.constraints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.constraints.is_empty()
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }
}

/// Shared state while constraints are added
pub(crate) struct ModelContext<'a> {
    pub indices: &'a Indices,
    pub params: &'a ModelParameters,
    pub registry: VariableRegistry,
    pub constraints: ConstraintSet,
}

/// Backend-facing part of the model, consumed by a solve
pub struct LpProblem {
    pub variables: ProblemVariables,
    /// Backend handles in registry order
    pub handles: Vec<Variable>,
    pub objective: Expression,
    pub constraints: Vec<Constraint>,
    pub has_integer: bool,
}

/// Fully assembled model, ready for a [`SolveAdapter`](crate::solver::SolveAdapter)
pub struct AssembledModel {
    pub problem: LpProblem,
    pub variables: ModelVariables,
    pub tags: Vec<String>,
}

impl AssembledModel {
    pub fn n_variables(&self) -> usize {
        self.problem.handles.len()
    }

    pub fn n_constraints(&self) -> usize {
        self.problem.constraints.len()
    }
}

impl std::fmt::Debug for AssembledModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssembledModel")
            .field("n_variables", &self.n_variables())
            .field("n_constraints", &self.n_constraints())
            .field("has_integer", &self.problem.has_integer)
            .finish()
    }
}

pub struct ModelBuilder<'a> {
    indices: &'a Indices,
    params: &'a ModelParameters,
    config: &'a OptConfig,
}

impl<'a> ModelBuilder<'a> {
    pub fn new(indices: &'a Indices, params: &'a ModelParameters, config: &'a OptConfig) -> Self {
        Self {
            indices,
            params,
            config,
        }
    }

    pub fn build(self) -> Result<AssembledModel, ModelError> {
        let start = Instant::now();
        let mut ctx = ModelContext {
            indices: self.indices,
            params: self.params,
            registry: VariableRegistry::new(),
            constraints: ConstraintSet::default(),
        };
        let vars = ModelVariables::new(
            &mut ctx.registry,
            self.indices,
            self.params,
            self.config.binary_fraction,
        );

        capacity::add_constraints(&mut ctx, &vars)?;
        generation::add_constraints(&mut ctx, &vars)?;
        storage::add_constraints(&mut ctx, &vars)?;
        fraction::add_constraints(&mut ctx, &vars)?;
        balance::add_constraints(&mut ctx, &vars)?;
        let objective = objective::build_objective(&ctx, &vars)?;

        let ModelContext {
            registry,
            constraints,
            ..
        } = ctx;
        let (variables, handles, has_integer) = registry.into_parts();

        tracing::info!(
            n_variables = handles.len(),
            n_constraints = constraints.len(),
            has_integer,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "model assembled"
        );

        Ok(AssembledModel {
            problem: LpProblem {
                variables,
                handles,
                objective,
                constraints: constraints.constraints,
                has_integer,
            },
            variables: vars,
            tags: constraints.tags,
        })
    }
}
