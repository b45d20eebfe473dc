//! Drives a MILP engine over a built model and projects the raw variable
//! values back into a readable schedule
//!
//! Timeout and infeasibility are outcomes carried in [`SolveResult`], not
//! errors; only a failure of the engine itself is returned as `Err`. A
//! solution is extracted exclusively from optimal or time-limited incumbent
//! states, never from an infeasible or failed solve.
use std::time::Instant;

use log::info;
use serde::Serialize;

use crate::model::{IspModel, ObjectiveFunction};
use crate::optimize::solvers::{EngineError, EngineSolution, EngineStatus, MilpEngine};

/// Outcome of one solve call
#[derive(Debug, Clone)]
pub enum SolveResult {
    /// The engine proved the extracted schedule optimal
    Optimal(ScheduleSolution),
    /// The time budget ran out; the extracted schedule is the best incumbent
    /// found, with its optimality gap when the engine reports one
    TimeLimitReached(ScheduleSolution),
    /// The model admits no feasible assignment under this configuration
    Infeasible {
        /// Readable description for the caller
        diagnostic: String,
    },
    /// The engine stopped without any feasible solution
    NoSolutionFound {
        /// Readable description for the caller
        diagnostic: String,
    },
}

impl SolveResult {
    /// The extracted schedule, if any
    pub fn solution(&self) -> Option<&ScheduleSolution> {
        match self {
            SolveResult::Optimal(solution) | SolveResult::TimeLimitReached(solution) => {
                Some(solution)
            }
            _ => None,
        }
    }

    /// Objective value of the extracted schedule, if any
    pub fn objective_value(&self) -> Option<f64> {
        self.solution().map(|s| s.objective_value)
    }
}

/// One interpreter-to-session assignment
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Assignment {
    /// Assigned interpreter
    pub interpreter: String,
    /// Session the interpreter attends
    pub session: String,
}

/// A directly covered language pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CoveredPair {
    /// Session the pair belongs to
    pub session: String,
    /// Covering interpreter
    pub interpreter: String,
    /// First language of the canonical pair
    pub first_language: String,
    /// Second language of the canonical pair
    pub second_language: String,
}

/// A pair covered indirectly through a bridge language
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BridgeUse {
    /// Session the bridged pair belongs to
    pub session: String,
    /// The intermediate language
    pub bridge_language: String,
    /// First language of the bridged pair
    pub first_language: String,
    /// Second language of the bridged pair
    pub second_language: String,
}

/// The human-readable projection of a solved model
#[derive(Debug, Clone, Serialize)]
pub struct ScheduleSolution {
    /// Objective the model was solved under
    pub objective: String,
    /// Value of that objective
    pub objective_value: f64,
    /// Relative optimality gap in percent; 0 for proven optima, `None` when
    /// the engine does not report one
    pub gap_percent: Option<f64>,
    /// All active interpreter-to-session assignments
    pub assignments: Vec<Assignment>,
    /// All directly covered pairs
    pub covered_pairs: Vec<CoveredPair>,
    /// All bridged pairs (empty unless bridging was enabled)
    pub bridges: Vec<BridgeUse>,
    /// Sessions with every required language covered
    pub fully_covered_sessions: Vec<String>,
}

/// Solve a built model under one objective with the given engine
///
/// The wall-clock budget is taken from the model's configuration. The model
/// itself is untouched; the same model can be solved again under the other
/// objective, or with another engine.
pub fn solve<E: MilpEngine>(
    model: &IspModel<'_>,
    of: ObjectiveFunction,
    engine: &mut E,
) -> Result<SolveResult, EngineError> {
    let objective = model.objective(of);
    info!(
        "solving {} with {} ({} variables, {} constraints, limit {:?})",
        of,
        engine.name(),
        model.problem().num_variables(),
        model.problem().num_constraints(),
        model.config().time_limit
    );
    let start = Instant::now();
    let outcome = engine.solve(model.problem(), &objective, model.config().time_limit)?;
    info!(
        "engine finished in {:.2?} with {} solution(s)",
        start.elapsed(),
        outcome.solution_count
    );

    Ok(match outcome.status {
        EngineStatus::Optimal => SolveResult::Optimal(extract(model, of, &outcome)),
        EngineStatus::TimeLimit if outcome.has_incumbent() => {
            SolveResult::TimeLimitReached(extract(model, of, &outcome))
        }
        EngineStatus::TimeLimit => SolveResult::NoSolutionFound {
            diagnostic: format!(
                "time limit of {:?} reached before any feasible assignment was found",
                model.config().time_limit
            ),
        },
        EngineStatus::Infeasible => SolveResult::Infeasible {
            diagnostic: "no feasible assignment exists for this instance and configuration"
                .to_string(),
        },
        EngineStatus::NoSolution => SolveResult::NoSolutionFound {
            diagnostic: format!("engine {} found no solution", engine.name()),
        },
    })
}

/// Project an incumbent's variable values into names and lists
fn extract(
    model: &IspModel<'_>,
    of: ObjectiveFunction,
    outcome: &EngineSolution,
) -> ScheduleSolution {
    let instance = model.instance();

    let assignments = model
        .assignment_vars()
        .filter(|(_, var)| outcome.is_set(*var))
        .map(|((i, s), _)| Assignment {
            interpreter: instance.interpreter_name(i).to_string(),
            session: instance.session_name(s).to_string(),
        })
        .collect();

    let covered_pairs = model
        .coverage_vars()
        .filter(|(_, var)| outcome.is_set(*var))
        .map(|((i, s, l1, l2), _)| CoveredPair {
            session: instance.session_name(s).to_string(),
            interpreter: instance.interpreter_name(i).to_string(),
            first_language: instance.language_name(l1).to_string(),
            second_language: instance.language_name(l2).to_string(),
        })
        .collect();

    let bridges = model
        .bridge_vars()
        .filter(|(_, var)| outcome.is_set(*var))
        .map(|((s, l0, l1, l2), _)| BridgeUse {
            session: instance.session_name(s).to_string(),
            bridge_language: instance.language_name(l0).to_string(),
            first_language: instance.language_name(l1).to_string(),
            second_language: instance.language_name(l2).to_string(),
        })
        .collect();

    let fully_covered_sessions = model
        .completeness_vars()
        .filter(|(_, var)| outcome.is_set(*var))
        .map(|(s, _)| instance.session_name(s).to_string())
        .collect();

    ScheduleSolution {
        objective: of.to_string(),
        objective_value: outcome.objective_value.unwrap_or_default(),
        gap_percent: outcome.gap.map(|g| g * 100.0),
        assignments,
        covered_pairs,
        bridges,
        fully_covered_sessions,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::configuration::{IspConfig, IspConfigBuilder};
    use crate::instance::Instance;
    use crate::model::builder::ModelBuilder;
    use crate::optimize::solvers::microlp::MicrolpEngine;
    use indexmap::IndexMap;
    use std::collections::HashSet;

    fn relation(entries: &[(&str, &[&str])]) -> IndexMap<String, Vec<String>> {
        entries
            .iter()
            .map(|(k, vs)| {
                (
                    k.to_string(),
                    vs.iter().map(|v| v.to_string()).collect::<Vec<_>>(),
                )
            })
            .collect()
    }

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|n| n.to_string()).collect()
    }

    fn solve_value(instance: &Instance, config: IspConfig, of: ObjectiveFunction) -> f64 {
        let model = ModelBuilder::new(instance, config).build().unwrap();
        let result = solve(&model, of, &mut MicrolpEngine::new()).unwrap();
        match result {
            SolveResult::Optimal(solution) => solution.objective_value,
            other => panic!("expected an optimal solve, got {:?}", other),
        }
    }

    /// Two sessions over the same two languages; only interpreter "a" knows
    /// both of them, interpreter "idle" knows none
    fn one_capable_interpreter(blocks: &[(&str, &[&str])]) -> Instance {
        Instance::new(
            names(&["a", "idle"]),
            names(&["en", "fr"]),
            names(&["s1", "s2"]),
            blocks.iter().map(|(b, _)| b.to_string()).collect(),
            &relation(&[("a", &["en", "fr"]), ("idle", &[])]),
            &relation(&[("s1", &["en", "fr"]), ("s2", &["en", "fr"])]),
            &relation(blocks),
        )
        .unwrap()
    }

    #[test]
    fn shared_block_limits_one_interpreter_to_one_session() {
        let instance = one_capable_interpreter(&[("b1", &["s1", "s2"])]);
        assert_eq!(
            solve_value(&instance, IspConfig::default(), ObjectiveFunction::CoveredPairs),
            1.0
        );
        assert_eq!(
            solve_value(
                &instance,
                IspConfig::default(),
                ObjectiveFunction::CoveredSessions
            ),
            1.0
        );
    }

    #[test]
    fn separate_blocks_allow_both_sessions() {
        let instance = one_capable_interpreter(&[("b1", &["s1"]), ("b2", &["s2"])]);
        assert_eq!(
            solve_value(&instance, IspConfig::default(), ObjectiveFunction::CoveredPairs),
            2.0
        );
        assert_eq!(
            solve_value(
                &instance,
                IspConfig::default(),
                ObjectiveFunction::CoveredSessions
            ),
            2.0
        );
    }

    #[test]
    fn block_exclusivity_holds_in_extraction() {
        let instance = one_capable_interpreter(&[("b1", &["s1", "s2"])]);
        let model = ModelBuilder::new(&instance, IspConfig::default()).build().unwrap();
        let result = solve(&model, ObjectiveFunction::CoveredPairs, &mut MicrolpEngine::new())
            .unwrap();
        let solution = result.solution().unwrap();
        // "a" may appear in at most one of the two concurrent sessions
        let sessions_of_a: Vec<_> = solution
            .assignments
            .iter()
            .filter(|a| a.interpreter == "a")
            .collect();
        assert_eq!(sessions_of_a.len(), 1);
        // "idle" appears nowhere
        assert!(solution.assignments.iter().all(|a| a.interpreter != "idle"));
    }

    /// Nobody knows both en and fr, but "left" and "right" share nl
    fn bridge_instance() -> Instance {
        Instance::new(
            names(&["left", "right"]),
            names(&["en", "fr", "nl"]),
            names(&["s1"]),
            names(&["b1"]),
            &relation(&[("left", &["nl", "en"]), ("right", &["nl", "fr"])]),
            &relation(&[("s1", &["en", "fr"])]),
            &relation(&[("b1", &["s1"])]),
        )
        .unwrap()
    }

    #[test]
    fn bridge_covers_otherwise_uncoverable_pair() {
        let instance = bridge_instance();
        let config = IspConfigBuilder::default().bridging(true).build().unwrap();
        let model = ModelBuilder::new(&instance, config).build().unwrap();

        let result = solve(&model, ObjectiveFunction::CoveredPairs, &mut MicrolpEngine::new())
            .unwrap();
        let solution = result.solution().unwrap();
        assert_eq!(solution.objective_value, 1.0);
        assert_eq!(solution.bridges.len(), 1);
        assert_eq!(solution.bridges[0].bridge_language, "nl");
        assert!(solution.covered_pairs.is_empty());
        // Both side interpreters are assigned
        assert_eq!(solution.assignments.len(), 2);

        let result = solve(
            &model,
            ObjectiveFunction::CoveredSessions,
            &mut MicrolpEngine::new(),
        )
        .unwrap();
        assert_eq!(result.objective_value(), Some(1.0));
        assert_eq!(
            result.solution().unwrap().fully_covered_sessions,
            vec!["s1".to_string()]
        );
    }

    #[test]
    fn without_bridging_the_pair_stays_uncovered() {
        let instance = bridge_instance();
        assert_eq!(
            solve_value(&instance, IspConfig::default(), ObjectiveFunction::CoveredPairs),
            0.0
        );
        assert_eq!(
            solve_value(
                &instance,
                IspConfig::default(),
                ObjectiveFunction::CoveredSessions
            ),
            0.0
        );
    }

    #[test]
    fn bridging_never_hurts_the_pair_objective() {
        for instance in [
            bridge_instance(),
            one_capable_interpreter(&[("b1", &["s1", "s2"])]),
        ] {
            let base = solve_value(
                &instance,
                IspConfig::default(),
                ObjectiveFunction::CoveredPairs,
            );
            let bridged = solve_value(
                &instance,
                IspConfigBuilder::default().bridging(true).build().unwrap(),
                ObjectiveFunction::CoveredPairs,
            );
            assert!(bridged >= base);
        }
    }

    #[test]
    fn language_coverage_definition_of_completeness() {
        // en-fr and de-fr are coverable, de-en is not; all three languages
        // are still coverable, so the session counts as fully covered
        let instance = Instance::new(
            names(&["i1", "i2"]),
            names(&["en", "fr", "de"]),
            names(&["s1"]),
            names(&["b1"]),
            &relation(&[("i1", &["en", "fr"]), ("i2", &["de", "fr"])]),
            &relation(&[("s1", &["en", "fr", "de"])]),
            &relation(&[("b1", &["s1"])]),
        )
        .unwrap();
        assert_eq!(
            solve_value(&instance, IspConfig::default(), ObjectiveFunction::CoveredPairs),
            2.0
        );
        assert_eq!(
            solve_value(
                &instance,
                IspConfig::default(),
                ObjectiveFunction::CoveredSessions
            ),
            1.0
        );
    }

    #[test]
    fn single_language_session_cannot_be_complete() {
        let instance = Instance::new(
            names(&["i1"]),
            names(&["en"]),
            names(&["s1"]),
            names(&["b1"]),
            &relation(&[("i1", &["en"])]),
            &relation(&[("s1", &["en"])]),
            &relation(&[("b1", &["s1"])]),
        )
        .unwrap();
        assert_eq!(
            solve_value(
                &instance,
                IspConfig::default(),
                ObjectiveFunction::CoveredSessions
            ),
            0.0
        );
    }

    /// One fully capable interpreter, five single-session blocks
    fn five_block_instance() -> Instance {
        Instance::new(
            names(&["a"]),
            names(&["en", "fr"]),
            names(&["s1", "s2", "s3", "s4", "s5"]),
            names(&["b1", "b2", "b3", "b4", "b5"]),
            &relation(&[("a", &["en", "fr"])]),
            &relation(&[
                ("s1", &["en", "fr"]),
                ("s2", &["en", "fr"]),
                ("s3", &["en", "fr"]),
                ("s4", &["en", "fr"]),
                ("s5", &["en", "fr"]),
            ]),
            &relation(&[
                ("b1", &["s1"]),
                ("b2", &["s2"]),
                ("b3", &["s3"]),
                ("b4", &["s4"]),
                ("b5", &["s5"]),
            ]),
        )
        .unwrap()
    }

    #[test]
    fn consecutive_block_window_caps_workload() {
        let instance = five_block_instance();
        // Unconstrained: all five sessions
        assert_eq!(
            solve_value(&instance, IspConfig::default(), ObjectiveFunction::CoveredPairs),
            5.0
        );
        // Any four adjacent blocks allow at most three worked: best is four
        // sessions total (e.g. resting in b4)
        let config = IspConfigBuilder::default()
            .operational_limits(true)
            .build()
            .unwrap();
        assert_eq!(
            solve_value(&instance, config, ObjectiveFunction::CoveredPairs),
            4.0
        );
    }

    #[test]
    fn session_cap_limits_total_assignments() {
        let instance = five_block_instance();
        let config = IspConfigBuilder::default()
            .operational_limits(true)
            .max_sessions_per_interpreter(2)
            .build()
            .unwrap();
        assert_eq!(
            solve_value(&instance, config, ObjectiveFunction::CoveredPairs),
            2.0
        );
    }

    #[test]
    fn each_pair_covered_by_one_mechanism() {
        // Both a direct interpreter and a bridge are available for (en, fr);
        // the extraction may contain only one covering mechanism for it
        let instance = Instance::new(
            names(&["direct", "left", "right"]),
            names(&["en", "fr", "nl"]),
            names(&["s1"]),
            names(&["b1"]),
            &relation(&[
                ("direct", &["en", "fr"]),
                ("left", &["nl", "en"]),
                ("right", &["nl", "fr"]),
            ]),
            &relation(&[("s1", &["en", "fr"])]),
            &relation(&[("b1", &["s1"])]),
        )
        .unwrap();
        let config = IspConfigBuilder::default().bridging(true).build().unwrap();
        let model = ModelBuilder::new(&instance, config).build().unwrap();
        let result = solve(&model, ObjectiveFunction::CoveredPairs, &mut MicrolpEngine::new())
            .unwrap();
        let solution = result.solution().unwrap();

        let mut mechanisms: HashSet<(String, String, String)> = HashSet::new();
        for pair in &solution.covered_pairs {
            assert!(mechanisms.insert((
                pair.session.clone(),
                pair.first_language.clone(),
                pair.second_language.clone()
            )));
        }
        for bridge in &solution.bridges {
            assert!(mechanisms.insert((
                bridge.session.clone(),
                bridge.first_language.clone(),
                bridge.second_language.clone()
            )));
        }
        // The single pair is covered exactly once in total
        assert_eq!(solution.objective_value, 1.0);
        assert_eq!(mechanisms.len(), 1);
    }

    #[test]
    fn completeness_implies_language_coverage() {
        let instance = Instance::new(
            names(&["i1", "i2"]),
            names(&["en", "fr", "de"]),
            names(&["s1", "s2"]),
            names(&["b1", "b2"]),
            &relation(&[("i1", &["en", "fr", "de"]), ("i2", &["en", "de"])]),
            &relation(&[("s1", &["en", "fr", "de"]), ("s2", &["en", "de"])]),
            &relation(&[("b1", &["s1"]), ("b2", &["s2"])]),
        )
        .unwrap();
        let model = ModelBuilder::new(&instance, IspConfig::default()).build().unwrap();
        let result = solve(
            &model,
            ObjectiveFunction::CoveredSessions,
            &mut MicrolpEngine::new(),
        )
        .unwrap();
        let solution = result.solution().unwrap();

        for session in &solution.fully_covered_sessions {
            let s = instance
                .sessions()
                .iter()
                .position(|name| name == session)
                .unwrap();
            for &l in instance.required_languages(s) {
                let lang = instance.language_name(l);
                let touched = solution.covered_pairs.iter().any(|p| {
                    p.session == *session
                        && (p.first_language == lang || p.second_language == lang)
                }) || solution.bridges.iter().any(|b| {
                    b.session == *session
                        && (b.first_language == lang || b.second_language == lang)
                });
                assert!(touched, "{} not covered in complete session {}", lang, session);
            }
        }
    }

    #[test]
    fn repeated_solves_are_deterministic() {
        let instance = five_block_instance();
        let config = IspConfigBuilder::default()
            .operational_limits(true)
            .build()
            .unwrap();
        let first = solve_value(&instance, config.clone(), ObjectiveFunction::CoveredPairs);
        let second = solve_value(&instance, config, ObjectiveFunction::CoveredPairs);
        assert_eq!(first, second);
    }

    #[test]
    fn both_objectives_on_one_model() {
        // The model is built once and solved under both objectives
        let instance = one_capable_interpreter(&[("b1", &["s1"]), ("b2", &["s2"])]);
        let model = ModelBuilder::new(&instance, IspConfig::default()).build().unwrap();
        let mut engine = MicrolpEngine::new();
        let of1 = solve(&model, ObjectiveFunction::CoveredPairs, &mut engine).unwrap();
        let of2 = solve(&model, ObjectiveFunction::CoveredSessions, &mut engine).unwrap();
        assert_eq!(of1.objective_value(), Some(2.0));
        assert_eq!(of2.objective_value(), Some(2.0));
    }
}
