//! The MILP engine seam
//!
//! The model builder produces an engine-agnostic [`Problem`]; everything a
//! backend must provide to solve one is the narrow [`MilpEngine`] trait.
//! Backends:
//! - [`microlp`]: pure Rust, always available, no time limit support
//! - [`scip`]: the SCIP solver via russcip, behind the `scip` feature
pub mod microlp;

#[cfg(feature = "scip")]
pub mod scip;

use std::time::Duration;

use thiserror::Error;

use crate::optimize::objective::Objective;
use crate::optimize::problem::Problem;
use crate::optimize::variable::VariableRef;

/// A mixed integer linear programming engine
///
/// Implementations load the accumulated problem and objective, run their
/// optimizer under the wall-clock `time_limit`, and report the outcome.
/// Infeasibility and hitting the time limit are *outcomes*, carried in the
/// returned [`EngineSolution`]; only an actual engine failure is an `Err`.
pub trait MilpEngine {
    /// Human readable backend name, used in logs and diagnostics
    fn name(&self) -> &'static str;

    /// Solve `problem` under `objective` within `time_limit`
    fn solve(
        &mut self,
        problem: &Problem,
        objective: &Objective,
        time_limit: Duration,
    ) -> Result<EngineSolution, EngineError>;
}

/// Status of a finished solve, as reported by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineStatus {
    /// The engine proved the reported solution optimal
    Optimal,
    /// The time limit was hit; the reported solution is the best incumbent
    TimeLimit,
    /// The problem admits no feasible solution
    Infeasible,
    /// The engine finished without producing any feasible solution
    NoSolution,
}

/// Result of a single engine run
#[derive(Debug, Clone)]
pub struct EngineSolution {
    /// Final engine status
    pub status: EngineStatus,
    /// Objective value of the incumbent, if one exists
    pub objective_value: Option<f64>,
    /// Relative optimality gap of the incumbent (0.0 when proven optimal)
    pub gap: Option<f64>,
    /// Number of feasible solutions the engine encountered
    pub solution_count: usize,
    /// Values of all problem variables in the incumbent, indexed like the
    /// problem's variables; `None` when no incumbent exists
    values: Option<Vec<f64>>,
}

impl EngineSolution {
    /// Build a solution-carrying result
    pub fn with_incumbent(
        status: EngineStatus,
        objective_value: f64,
        gap: f64,
        solution_count: usize,
        values: Vec<f64>,
    ) -> Self {
        EngineSolution {
            status,
            objective_value: Some(objective_value),
            gap: Some(gap),
            solution_count,
            values: Some(values),
        }
    }

    /// Build a result without any incumbent
    pub fn without_incumbent(status: EngineStatus) -> Self {
        EngineSolution {
            status,
            objective_value: None,
            gap: None,
            solution_count: 0,
            values: None,
        }
    }

    /// Whether an incumbent solution can be extracted
    pub fn has_incumbent(&self) -> bool {
        self.values.is_some()
    }

    /// Value of a single variable in the incumbent
    pub fn value(&self, var: VariableRef) -> Option<f64> {
        self.values.as_ref().and_then(|v| v.get(var.index())).copied()
    }

    /// Whether a binary variable is set in the incumbent (0.5 rounding threshold)
    pub fn is_set(&self, var: VariableRef) -> bool {
        self.value(var).map(|v| v > 0.5).unwrap_or(false)
    }
}

/// Failure of the external MILP engine itself
///
/// These are propagated unchanged to the caller; they are never folded into
/// the infeasible/no-solution outcomes.
#[derive(Error, Debug)]
pub enum EngineError {
    /// The engine cannot represent a variable of the given type
    #[error("engine {engine} does not support variable {variable}")]
    UnsupportedVariable {
        /// Backend name
        engine: &'static str,
        /// Display form of the offending variable
        variable: String,
    },
    /// The problem is unbounded in the objective direction
    ///
    /// A purely binary model is always bounded, so for ISP models this
    /// indicates a bug in model generation rather than bad input.
    #[error("engine {0} reported the problem as unbounded")]
    Unbounded(&'static str),
    /// Any other backend failure, with the backend's own message
    #[error("engine {engine} failed: {message}")]
    Backend {
        /// Backend name
        engine: &'static str,
        /// Backend-provided failure description
        message: String,
    },
}
