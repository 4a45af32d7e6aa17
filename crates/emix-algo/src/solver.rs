//! Solve adapter: hands an [`AssembledModel`] to a `good_lp` backend and
//! reads the solution back in registry order.

use crate::config::{ConfigError, OptConfig};
use crate::model::{AssembledModel, LpProblem};
use good_lp::solvers::{ResolutionError, Solution, Solver, SolverModel};
use serde::Serialize;
use std::fmt;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SolveStatus {
    Optimal,
    Infeasible,
    Unbounded,
    Error,
}

impl SolveStatus {
    pub fn is_success(self) -> bool {
        self == SolveStatus::Optimal
    }
}

impl fmt::Display for SolveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SolveStatus::Optimal => "optimal",
            SolveStatus::Infeasible => "infeasible",
            SolveStatus::Unbounded => "unbounded",
            SolveStatus::Error => "error",
        };
        f.write_str(s)
    }
}

/// What a backend reports back.
///
/// `values` is indexed by [`VarId`](crate::model::VarId) and is empty unless
/// the status is [`SolveStatus::Optimal`].
#[derive(Debug, Clone)]
pub struct SolveOutcome {
    pub status: SolveStatus,
    pub values: Vec<f64>,
    pub objective: f64,
    pub message: Option<String>,
    pub solve_time: Duration,
}

impl SolveOutcome {
    pub fn optimal(values: Vec<f64>, objective: f64) -> Self {
        Self {
            status: SolveStatus::Optimal,
            values,
            objective,
            message: None,
            solve_time: Duration::ZERO,
        }
    }

    pub fn failed(status: SolveStatus, message: impl Into<String>) -> Self {
        Self {
            status,
            values: Vec::new(),
            objective: f64::NAN,
            message: Some(message.into()),
            solve_time: Duration::ZERO,
        }
    }
}

pub trait SolveAdapter {
    /// Consumes the model; backend state is dropped on every return path.
    fn solve(&self, model: AssembledModel) -> SolveOutcome;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SolverKind {
    Clarabel,
    Highs,
}

impl SolverKind {
    pub fn from_name(name: &str) -> Result<Self, ConfigError> {
        match name.trim().to_ascii_lowercase().as_str() {
            "clarabel" => {
                if cfg!(feature = "solver-clarabel") {
                    Ok(SolverKind::Clarabel)
                } else {
                    Err(ConfigError::SolverUnavailable(name.to_string()))
                }
            }
            "highs" => {
                if cfg!(feature = "solver-highs") {
                    Ok(SolverKind::Highs)
                } else {
                    Err(ConfigError::SolverUnavailable(name.to_string()))
                }
            }
            _ => Err(ConfigError::UnknownSolver(name.to_string())),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SolverKind::Clarabel => "clarabel",
            SolverKind::Highs => "highs",
        }
    }

    /// Whether the backend can branch on integer variables
    pub fn supports_integer(self) -> bool {
        matches!(self, SolverKind::Highs)
    }
}

/// [`SolveAdapter`] backed by `good_lp`
#[derive(Debug, Clone, Copy)]
pub struct GoodLpAdapter {
    kind: SolverKind,
}

impl GoodLpAdapter {
    pub fn new(kind: SolverKind) -> Self {
        Self { kind }
    }

    pub fn from_config(config: &OptConfig) -> Result<Self, ConfigError> {
        Ok(Self::new(SolverKind::from_name(&config.solver)?))
    }

    pub fn kind(&self) -> SolverKind {
        self.kind
    }
}

impl SolveAdapter for GoodLpAdapter {
    fn solve(&self, model: AssembledModel) -> SolveOutcome {
        let start = Instant::now();
        let problem = model.problem;
        let n_variables = problem.handles.len();
        let n_constraints = problem.constraints.len();
        tracing::info!(
            solver = self.kind.as_str(),
            n_variables,
            n_constraints,
            "solving"
        );

        let mut outcome = if problem.has_integer && !self.kind.supports_integer() {
            SolveOutcome::failed(
                SolveStatus::Error,
                format!(
                    "{} cannot solve models with integer variables; use the highs solver",
                    self.kind.as_str()
                ),
            )
        } else {
            match self.kind {
                SolverKind::Clarabel => solve_clarabel(problem),
                SolverKind::Highs => solve_highs(problem),
            }
        };
        outcome.solve_time = start.elapsed();

        match outcome.status {
            SolveStatus::Optimal => tracing::info!(
                objective = outcome.objective,
                elapsed_ms = outcome.solve_time.as_millis() as u64,
                "solve finished"
            ),
            status => tracing::warn!(
                %status,
                message = outcome.message.as_deref().unwrap_or(""),
                "solve did not reach an optimum"
            ),
        }
        outcome
    }
}

#[cfg(feature = "solver-clarabel")]
fn solve_clarabel(problem: LpProblem) -> SolveOutcome {
    solve_with(problem, good_lp::solvers::clarabel::clarabel)
}

#[cfg(not(feature = "solver-clarabel"))]
fn solve_clarabel(_problem: LpProblem) -> SolveOutcome {
    SolveOutcome::failed(SolveStatus::Error, "clarabel is not enabled in this build")
}

#[cfg(feature = "solver-highs")]
fn solve_highs(problem: LpProblem) -> SolveOutcome {
    solve_with(problem, good_lp::solvers::highs::highs)
}

#[cfg(not(feature = "solver-highs"))]
fn solve_highs(_problem: LpProblem) -> SolveOutcome {
    SolveOutcome::failed(SolveStatus::Error, "highs is not enabled in this build")
}

#[cfg_attr(
    not(any(feature = "solver-clarabel", feature = "solver-highs")),
    allow(dead_code)
)]
fn solve_with<S>(problem: LpProblem, solver: S) -> SolveOutcome
where
    S: Solver,
    S::Model: SolverModel<Error = ResolutionError>,
{
    let LpProblem {
        variables,
        handles,
        objective,
        constraints,
        ..
    } = problem;

    let cost = objective.clone();
    let model = constraints
        .into_iter()
        .fold(variables.minimise(objective).using(solver), |model, c| model.with(c));

    match model.solve() {
        Ok(solution) => {
            let values = handles.iter().map(|&v| solution.value(v)).collect();
            SolveOutcome::optimal(values, cost.eval_with(&solution))
        }
        Err(ResolutionError::Infeasible) => {
            SolveOutcome::failed(SolveStatus::Infeasible, "problem is infeasible")
        }
        Err(ResolutionError::Unbounded) => {
            SolveOutcome::failed(SolveStatus::Unbounded, "problem is unbounded")
        }
        Err(e) => SolveOutcome::failed(SolveStatus::Error, e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_solver_names() {
        assert_eq!(SolverKind::from_name("clarabel").unwrap(), SolverKind::Clarabel);
        assert_eq!(SolverKind::from_name(" Clarabel ").unwrap(), SolverKind::Clarabel);
        assert!(matches!(
            SolverKind::from_name("cplex"),
            Err(ConfigError::UnknownSolver(name)) if name == "cplex"
        ));
    }

    #[cfg(not(feature = "solver-highs"))]
    #[test]
    fn test_highs_unavailable_without_feature() {
        assert!(matches!(
            SolverKind::from_name("highs"),
            Err(ConfigError::SolverUnavailable(_))
        ));
    }

    #[test]
    fn test_status_display() {
        assert_eq!(SolveStatus::Infeasible.to_string(), "infeasible");
        assert!(SolveStatus::Optimal.is_success());
        assert!(!SolveStatus::Error.is_success());
    }

    #[test]
    fn test_failed_outcome_has_no_values() {
        let outcome = SolveOutcome::failed(SolveStatus::Unbounded, "unbounded");
        assert!(outcome.values.is_empty());
        assert!(outcome.objective.is_nan());
        assert_eq!(outcome.message.as_deref(), Some("unbounded"));
    }
}
