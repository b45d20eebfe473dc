//! SCIP MILP backend via the russcip bindings, behind the `scip` feature
//!
//! Unlike the microlp backend this one honors the wall-clock time limit and
//! can return an incumbent together with [`EngineStatus::TimeLimit`]. The
//! relative gap of a time-limited incumbent is not read back through the
//! bindings; SCIP's own log carries it.
use std::time::Duration;

use log::debug;
use russcip::model::{Model, ObjSense};
use russcip::status::Status;
use russcip::variable::VarType;

use crate::optimize::constraint::Relation;
use crate::optimize::objective::{Objective, ObjectiveSense};
use crate::optimize::problem::Problem;
use crate::optimize::solvers::{EngineError, EngineSolution, EngineStatus, MilpEngine};
use crate::optimize::variable::VariableType;

/// MILP engine backed by SCIP
#[derive(Debug, Default)]
pub struct ScipEngine;

impl ScipEngine {
    /// Create a new SCIP engine
    pub fn new() -> Self {
        ScipEngine
    }
}

impl MilpEngine for ScipEngine {
    fn name(&self) -> &'static str {
        "scip"
    }

    fn solve(
        &mut self,
        problem: &Problem,
        objective: &Objective,
        time_limit: Duration,
    ) -> Result<EngineSolution, EngineError> {
        if problem.num_variables() == 0 {
            return Ok(EngineSolution::with_incumbent(
                EngineStatus::Optimal,
                0.0,
                0.0,
                1,
                Vec::new(),
            ));
        }

        let sense = match objective.sense() {
            ObjectiveSense::Maximize => ObjSense::Maximize,
            ObjectiveSense::Minimize => ObjSense::Minimize,
        };
        let mut model = Model::new()
            .hide_output()
            .include_default_plugins()
            .create_prob("isp")
            .set_obj_sense(sense)
            .set_real_param("limits/time", time_limit.as_secs_f64())
            .map_err(|rc| EngineError::Backend {
                engine: "scip",
                message: format!("setting time limit failed: {:?}", rc),
            })?;

        let mut scip_vars = Vec::with_capacity(problem.num_variables());
        for (var_ref, var) in problem.variables() {
            let var_type = match var.variable_type {
                VariableType::Binary => VarType::Binary,
                VariableType::Integer => VarType::Integer,
                VariableType::Continuous => VarType::Continuous,
            };
            scip_vars.push(model.add_var(
                0.0,
                1.0,
                objective.coefficient_of(var_ref),
                &var.id,
                var_type,
            ));
        }

        for cons in problem.constraints() {
            let vars = cons
                .terms
                .iter()
                .map(|t| scip_vars[t.variable.index()].clone())
                .collect::<Vec<_>>();
            let coefs = cons.terms.iter().map(|t| t.coefficient).collect::<Vec<_>>();
            let (lhs, rhs) = match cons.relation {
                Relation::LessEqual => (f64::NEG_INFINITY, cons.rhs),
                Relation::GreaterEqual => (cons.rhs, f64::INFINITY),
                Relation::Equal => (cons.rhs, cons.rhs),
            };
            model.add_cons(vars, &coefs, lhs, rhs, &cons.id);
        }

        debug!(
            "scip: solving {} variables / {} constraints, time limit {:?}",
            problem.num_variables(),
            problem.num_constraints(),
            time_limit
        );

        let solved = model.solve();
        let solution_count = solved.n_sols();
        match solved.status() {
            Status::Optimal => {
                let sol = solved.best_sol().ok_or_else(|| EngineError::Backend {
                    engine: "scip",
                    message: "optimal status without a solution".to_string(),
                })?;
                let values = scip_vars.iter().map(|v| sol.val(v.clone())).collect();
                Ok(EngineSolution::with_incumbent(
                    EngineStatus::Optimal,
                    solved.obj_val(),
                    0.0,
                    solution_count,
                    values,
                ))
            }
            Status::TimeLimit => match solved.best_sol() {
                Some(sol) => {
                    let values = scip_vars.iter().map(|v| sol.val(v.clone())).collect();
                    Ok(EngineSolution {
                        status: EngineStatus::TimeLimit,
                        objective_value: Some(solved.obj_val()),
                        gap: None,
                        solution_count,
                        values: Some(values),
                    })
                }
                None => Ok(EngineSolution::without_incumbent(EngineStatus::NoSolution)),
            },
            Status::Infeasible => Ok(EngineSolution::without_incumbent(EngineStatus::Infeasible)),
            Status::Unbounded => Err(EngineError::Unbounded("scip")),
            other => Err(EngineError::Backend {
                engine: "scip",
                message: format!("solver stopped with status {:?}", other),
            }),
        }
    }
}
