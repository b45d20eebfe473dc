//! Pure Rust MILP backend using the microlp crate
//!
//! microlp runs simplex plus branch-and-bound to completion: it either proves
//! optimality, proves infeasibility, or errors out. It has no time limit
//! parameter, so this backend never reports
//! [`EngineStatus::TimeLimit`](super::EngineStatus::TimeLimit) and a returned
//! optimum always carries a gap of 0.
use std::time::Duration;

use log::debug;
use microlp::{ComparisonOp, OptimizationDirection};

use crate::optimize::constraint::Relation;
use crate::optimize::objective::{Objective, ObjectiveSense};
use crate::optimize::problem::Problem;
use crate::optimize::solvers::{EngineError, EngineSolution, EngineStatus, MilpEngine};
use crate::optimize::variable::VariableType;

/// MILP engine backed by [`microlp`]
#[derive(Debug, Default)]
pub struct MicrolpEngine;

impl MicrolpEngine {
    /// Create a new microlp engine
    pub fn new() -> Self {
        MicrolpEngine
    }
}

impl MilpEngine for MicrolpEngine {
    fn name(&self) -> &'static str {
        "microlp"
    }

    fn solve(
        &mut self,
        problem: &Problem,
        objective: &Objective,
        _time_limit: Duration,
    ) -> Result<EngineSolution, EngineError> {
        // A model with no variables has the empty assignment as its optimum;
        // don't hand the degenerate case to the simplex.
        if problem.num_variables() == 0 {
            return Ok(EngineSolution::with_incumbent(
                EngineStatus::Optimal,
                0.0,
                0.0,
                1,
                Vec::new(),
            ));
        }

        let direction = match objective.sense() {
            ObjectiveSense::Maximize => OptimizationDirection::Maximize,
            ObjectiveSense::Minimize => OptimizationDirection::Minimize,
        };
        let mut lp = microlp::Problem::new(direction);

        // microlp takes objective coefficients at variable creation
        let mut lp_vars = Vec::with_capacity(problem.num_variables());
        for (var_ref, var) in problem.variables() {
            match var.variable_type {
                VariableType::Binary => {
                    lp_vars.push(lp.add_binary_var(objective.coefficient_of(var_ref)));
                }
                VariableType::Integer | VariableType::Continuous => {
                    return Err(EngineError::UnsupportedVariable {
                        engine: self.name(),
                        variable: var.to_string(),
                    });
                }
            }
        }

        for cons in problem.constraints() {
            let op = match cons.relation {
                Relation::LessEqual => ComparisonOp::Le,
                Relation::GreaterEqual => ComparisonOp::Ge,
                Relation::Equal => ComparisonOp::Eq,
            };
            lp.add_constraint(
                cons.terms
                    .iter()
                    .map(|t| (lp_vars[t.variable.index()], t.coefficient)),
                op,
                cons.rhs,
            );
        }

        debug!(
            "microlp: solving {} variables / {} constraints",
            problem.num_variables(),
            problem.num_constraints()
        );

        match lp.solve() {
            Ok(solution) => {
                let values = lp_vars.iter().map(|v| *solution.var_value(*v)).collect();
                Ok(EngineSolution::with_incumbent(
                    EngineStatus::Optimal,
                    solution.objective(),
                    0.0,
                    1,
                    values,
                ))
            }
            Err(microlp::Error::Infeasible) => {
                Ok(EngineSolution::without_incumbent(EngineStatus::Infeasible))
            }
            Err(microlp::Error::Unbounded) => Err(EngineError::Unbounded(self.name())),
            Err(e) => Err(EngineError::Backend {
                engine: self.name(),
                message: e.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quick_solve(problem: &Problem, objective: &Objective) -> EngineSolution {
        MicrolpEngine::new()
            .solve(problem, objective, Duration::from_secs(10))
            .unwrap()
    }

    #[test]
    fn solve_small_max() {
        // max x + y  s.t.  x + y <= 1
        let mut problem = Problem::new();
        let x = problem.add_binary_variable("x").unwrap();
        let y = problem.add_binary_variable("y").unwrap();
        problem
            .add_linear_constraint("cap", &[x, y], &[1.0, 1.0], Relation::LessEqual, 1.0)
            .unwrap();

        let mut objective = Objective::new_maximize();
        objective.add_linear_terms([x, y], 1.0);

        let solution = quick_solve(&problem, &objective);
        assert_eq!(solution.status, EngineStatus::Optimal);
        assert_eq!(solution.gap, Some(0.0));
        assert!((solution.objective_value.unwrap() - 1.0).abs() < 1e-6);
        // Exactly one of the two variables is set
        assert!(solution.is_set(x) ^ solution.is_set(y));
    }

    #[test]
    fn solve_infeasible() {
        // x >= 1 and x <= 0 together are contradictory
        let mut problem = Problem::new();
        let x = problem.add_binary_variable("x").unwrap();
        problem
            .add_linear_constraint("force_on", &[x], &[1.0], Relation::GreaterEqual, 1.0)
            .unwrap();
        problem
            .add_linear_constraint("force_off", &[x], &[1.0], Relation::LessEqual, 0.0)
            .unwrap();

        let objective = Objective::new_maximize();
        let solution = quick_solve(&problem, &objective);
        assert_eq!(solution.status, EngineStatus::Infeasible);
        assert!(!solution.has_incumbent());
    }

    #[test]
    fn solve_empty_problem() {
        let problem = Problem::new();
        let objective = Objective::new_maximize();
        let solution = quick_solve(&problem, &objective);
        assert_eq!(solution.status, EngineStatus::Optimal);
        assert_eq!(solution.objective_value, Some(0.0));
    }

    #[test]
    fn solve_equality() {
        // max x - y  s.t.  x + y = 1  ->  x = 1, y = 0
        let mut problem = Problem::new();
        let x = problem.add_binary_variable("x").unwrap();
        let y = problem.add_binary_variable("y").unwrap();
        problem
            .add_linear_constraint("pick_one", &[x, y], &[1.0, 1.0], Relation::Equal, 1.0)
            .unwrap();

        let mut objective = Objective::new_maximize();
        objective.add_linear_term(x, 1.0);
        objective.add_linear_term(y, -1.0);

        let solution = quick_solve(&problem, &objective);
        assert_eq!(solution.status, EngineStatus::Optimal);
        assert!(solution.is_set(x));
        assert!(!solution.is_set(y));
    }
}
