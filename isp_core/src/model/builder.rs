//! Builds the sparse ISP model from a validated instance
//!
//! The builder works in two phases. First it computes the reusable indexes
//! (canonical pair lists, compatible pairs, capable interpreters, bridge
//! candidates) exactly once; every variable and constraint family reads from
//! these instead of rescanning the instance. Then it creates all decision
//! variables, and only afterwards the constraint families, so constraints
//! only ever reference existing variables.
//!
//! Variable generation is sparse throughout: a coverage variable exists only
//! when the interpreter knows both languages of the pair, an assignment
//! variable only when the interpreter can do some work in the session, and a
//! bridge variable only when both sides can plausibly be served. Infeasible
//! combinations are encoded by absence, not by extra `= 0` constraints.
use indexmap::IndexMap;
use log::{debug, info};

use crate::configuration::IspConfig;
use crate::instance::{Instance, InterpreterIdx, LanguageIdx, SessionIdx};
use crate::model::{IspModel, VariableRegistry};
use crate::optimize::constraint::Relation;
use crate::optimize::problem::{Problem, ProblemError};
use crate::optimize::variable::VariableRef;

/// An unordered language pair in canonical order
/// (lexicographically smaller language name first)
pub(crate) type Pair = (LanguageIdx, LanguageIdx);

/// A candidate indirect coverage of `pair` through `bridge` in one session
///
/// Only candidates that can plausibly be served survive: both sides have at
/// least one capable interpreter, and not solely the same single interpreter
/// on both sides.
#[derive(Debug, Clone)]
pub(crate) struct BridgeCandidate {
    /// The bridge language
    pub bridge: LanguageIdx,
    /// The covered pair, canonical
    pub pair: Pair,
    /// Interpreters knowing `bridge` and the first pair language
    pub first_side: Vec<InterpreterIdx>,
    /// Interpreters knowing `bridge` and the second pair language
    pub second_side: Vec<InterpreterIdx>,
    /// Interpreters capable of both sides (self-bridge candidates)
    pub both_sides: Vec<InterpreterIdx>,
}

/// The precomputed lookup structures shared by all constraint families
///
/// Computed once per build; recomputing any of these inside a constraint
/// family is a bug, not a style issue, because generation is
/// O(sessions × interpreters × pairs) in the worst case.
#[derive(Debug, Clone, Default)]
pub(crate) struct ModelIndexes {
    /// Per session, the canonical pair list over its required languages
    pub session_pairs: Vec<Vec<Pair>>,
    /// Per (interpreter, session), the pairs the interpreter can cover;
    /// absent key means none
    pub compatible_pairs: IndexMap<(InterpreterIdx, SessionIdx), Vec<Pair>>,
    /// Per (session, pair), the interpreters able to cover it directly;
    /// absent key means none
    pub capable_interpreters: IndexMap<(SessionIdx, Pair), Vec<InterpreterIdx>>,
    /// Per session, the surviving bridge candidates (empty unless bridging)
    pub bridges: Vec<Vec<BridgeCandidate>>,
    /// Per (interpreter, session), positions into `bridges[session]` of the
    /// candidates the interpreter can serve a side of
    pub bridge_service: IndexMap<(InterpreterIdx, SessionIdx), Vec<usize>>,
}

impl ModelIndexes {
    /// Compute all indexes for an instance under a configuration
    pub(crate) fn compute(instance: &Instance, config: &IspConfig) -> Self {
        let mut indexes = ModelIndexes {
            session_pairs: canonical_session_pairs(instance),
            ..ModelIndexes::default()
        };

        for s in 0..instance.num_sessions() {
            for &pair in &indexes.session_pairs[s] {
                let mut capable = Vec::new();
                for i in 0..instance.num_interpreters() {
                    if instance.knows(i, pair.0) && instance.knows(i, pair.1) {
                        capable.push(i);
                        indexes
                            .compatible_pairs
                            .entry((i, s))
                            .or_default()
                            .push(pair);
                    }
                }
                if !capable.is_empty() {
                    indexes.capable_interpreters.insert((s, pair), capable);
                }
            }
        }

        if config.bridging {
            indexes.bridges = bridge_candidates(instance, &indexes.session_pairs);
            for (s, candidates) in indexes.bridges.iter().enumerate() {
                for (position, candidate) in candidates.iter().enumerate() {
                    for &i in candidate.first_side.iter().chain(&candidate.second_side) {
                        let served = indexes.bridge_service.entry((i, s)).or_default();
                        if served.last() != Some(&position) {
                            served.push(position);
                        }
                    }
                }
            }
        } else {
            indexes.bridges = vec![Vec::new(); instance.num_sessions()];
        }

        indexes
    }
}

/// Canonical, deduplicated pair list per session
fn canonical_session_pairs(instance: &Instance) -> Vec<Vec<Pair>> {
    (0..instance.num_sessions())
        .map(|s| {
            let langs = instance.required_languages(s);
            let mut pairs = Vec::with_capacity(langs.len() * langs.len().saturating_sub(1) / 2);
            for (a, &l1) in langs.iter().enumerate() {
                for &l2 in &langs[a + 1..] {
                    pairs.push(canonical_pair(instance, l1, l2));
                }
            }
            pairs
        })
        .collect()
}

/// Order a pair so the lexicographically smaller language name comes first
pub(crate) fn canonical_pair(instance: &Instance, l1: LanguageIdx, l2: LanguageIdx) -> Pair {
    if instance.language_name(l1) <= instance.language_name(l2) {
        (l1, l2)
    } else {
        (l2, l1)
    }
}

/// Enumerate the surviving bridge candidates of every session
fn bridge_candidates(instance: &Instance, session_pairs: &[Vec<Pair>]) -> Vec<Vec<BridgeCandidate>> {
    session_pairs
        .iter()
        .map(|pairs| {
            let mut candidates = Vec::new();
            for &pair in pairs {
                for bridge in 0..instance.languages().len() {
                    if bridge == pair.0 || bridge == pair.1 {
                        continue;
                    }
                    let first_side: Vec<_> = (0..instance.num_interpreters())
                        .filter(|&i| instance.knows(i, bridge) && instance.knows(i, pair.0))
                        .collect();
                    if first_side.is_empty() {
                        continue;
                    }
                    let second_side: Vec<_> = (0..instance.num_interpreters())
                        .filter(|&i| instance.knows(i, bridge) && instance.knows(i, pair.1))
                        .collect();
                    if second_side.is_empty() {
                        continue;
                    }
                    // A bridge whose only conceivable server of either side
                    // is one single interpreter can never be active: the
                    // self-bridge rule would force it to zero.
                    if first_side.len() == 1
                        && second_side.len() == 1
                        && first_side[0] == second_side[0]
                    {
                        continue;
                    }
                    let both_sides = first_side
                        .iter()
                        .copied()
                        .filter(|i| second_side.contains(i))
                        .collect();
                    candidates.push(BridgeCandidate {
                        bridge,
                        pair,
                        first_side,
                        second_side,
                        both_sides,
                    });
                }
            }
            candidates
        })
        .collect()
}

/// Builds an [`IspModel`] from an instance and a configuration
///
/// # Examples
/// ```no_run
/// use isp_core::configuration::IspConfig;
/// use isp_core::instance::Instance;
/// use isp_core::model::builder::ModelBuilder;
/// # fn run() -> Result<(), Box<dyn std::error::Error>> {
/// let instance = Instance::from_json_file("instance.json")?;
/// let model = ModelBuilder::new(&instance, IspConfig::default()).build()?;
/// # Ok(())
/// # }
/// ```
pub struct ModelBuilder<'a> {
    instance: &'a Instance,
    config: IspConfig,
}

impl<'a> ModelBuilder<'a> {
    /// Create a builder for one instance and configuration
    pub fn new(instance: &'a Instance, config: IspConfig) -> Self {
        ModelBuilder { instance, config }
    }

    /// Build the complete model: all variables, then all constraint families
    ///
    /// # Errors
    /// A [`ProblemError`] here means an internal contract was violated (for
    /// example a duplicated variable id); it cannot be triggered by instance
    /// content, which is fully validated at load time.
    pub fn build(self) -> Result<IspModel<'a>, ProblemError> {
        let indexes = ModelIndexes::compute(self.instance, &self.config);
        let mut problem = Problem::new();
        let mut vars = VariableRegistry::default();

        self.create_variables(&mut problem, &mut vars, &indexes)?;
        debug!(
            "created {} variables ({} assignment, {} coverage, {} bridge)",
            problem.num_variables(),
            vars.x.len(),
            vars.y.len(),
            vars.z.len()
        );

        self.add_block_exclusivity(&mut problem, &vars)?;
        self.add_assignment_coverage_link(&mut problem, &vars, &indexes)?;
        self.add_pair_uniqueness(&mut problem, &vars, &indexes)?;
        self.add_language_coverage(&mut problem, &vars, &indexes)?;
        self.add_session_completeness(&mut problem, &vars)?;
        if self.config.bridging {
            self.add_bridging_legality(&mut problem, &vars, &indexes)?;
        }
        if self.config.operational_limits {
            self.add_operational_limits(&mut problem, &vars)?;
        }

        info!(
            "model built: {} variables, {} constraints (bridging: {}, operational limits: {})",
            problem.num_variables(),
            problem.num_constraints(),
            self.config.bridging,
            self.config.operational_limits
        );
        Ok(IspModel::new(self.instance, self.config, problem, vars))
    }

    // region Variable creation
    /// Create every decision variable, sparsely, before any constraint exists
    fn create_variables(
        &self,
        problem: &mut Problem,
        vars: &mut VariableRegistry,
        indexes: &ModelIndexes,
    ) -> Result<(), ProblemError> {
        let inst = self.instance;

        // x[i,s]: only when the interpreter can contribute to the session,
        // directly or as a bridge side
        for i in 0..inst.num_interpreters() {
            for s in 0..inst.num_sessions() {
                if indexes.compatible_pairs.contains_key(&(i, s))
                    || indexes.bridge_service.contains_key(&(i, s))
                {
                    let id = format!("x[{},{}]", inst.interpreter_name(i), inst.session_name(s));
                    vars.x.insert((i, s), problem.add_binary_variable(&id)?);
                }
            }
        }

        // y[i,s,l1,l2]: only when i knows both languages of the pair
        for ((i, s), pairs) in &indexes.compatible_pairs {
            for &(l1, l2) in pairs {
                let id = format!(
                    "y[{},{},{},{}]",
                    inst.interpreter_name(*i),
                    inst.session_name(*s),
                    inst.language_name(l1),
                    inst.language_name(l2)
                );
                vars.y
                    .insert((*i, *s, l1, l2), problem.add_binary_variable(&id)?);
            }
        }

        // z[s,l0,l1,l2]: one per surviving bridge candidate
        for (s, candidates) in indexes.bridges.iter().enumerate() {
            for candidate in candidates {
                let id = format!(
                    "z[{},{},{},{}]",
                    inst.session_name(s),
                    inst.language_name(candidate.bridge),
                    inst.language_name(candidate.pair.0),
                    inst.language_name(candidate.pair.1)
                );
                let var = problem.add_binary_variable(&id)?;
                vars.z
                    .insert((s, candidate.bridge, candidate.pair.0, candidate.pair.1), var);
            }
        }

        // u[s,l] for required languages, and c[s] per session
        for s in 0..inst.num_sessions() {
            for &l in inst.required_languages(s) {
                let id = format!("u[{},{}]", inst.session_name(s), inst.language_name(l));
                vars.u.insert((s, l), problem.add_binary_variable(&id)?);
            }
            let id = format!("c[{}]", inst.session_name(s));
            vars.c.insert(s, problem.add_binary_variable(&id)?);
        }

        // w[i,b]: only when the interpreter has any assignable session in b
        if self.config.operational_limits {
            for b in 0..inst.num_blocks() {
                for i in 0..inst.num_interpreters() {
                    if inst
                        .block_sessions(b)
                        .iter()
                        .any(|&s| vars.x.contains_key(&(i, s)))
                    {
                        let id = format!("w[{},{}]", inst.interpreter_name(i), inst.block_name(b));
                        vars.w.insert((i, b), problem.add_binary_variable(&id)?);
                    }
                }
            }
        }

        Ok(())
    }
    // endregion Variable creation

    // region Constraint families
    /// Family 1: an interpreter attends at most one session per block
    fn add_block_exclusivity(
        &self,
        problem: &mut Problem,
        vars: &VariableRegistry,
    ) -> Result<(), ProblemError> {
        let inst = self.instance;
        for b in 0..inst.num_blocks() {
            for i in 0..inst.num_interpreters() {
                let terms: Vec<VariableRef> = inst
                    .block_sessions(b)
                    .iter()
                    .filter_map(|&s| vars.x.get(&(i, s)).copied())
                    .collect();
                // With a single term the bound is implied by binarity
                if terms.len() < 2 {
                    continue;
                }
                let id = format!(
                    "one_session_per_block[{},{}]",
                    inst.interpreter_name(i),
                    inst.block_name(b)
                );
                let coefs = vec![1.0; terms.len()];
                problem.add_linear_constraint(&id, &terms, &coefs, Relation::LessEqual, 1.0)?;
            }
        }
        Ok(())
    }

    /// Family 2: assignment and coverage imply each other
    ///
    /// Two halves per (interpreter, session): the interpreter covers at most
    /// one pair and only while assigned (`Σ y ≤ x`), and an assigned
    /// interpreter must be doing something
    /// (`x ≤ Σ y + Σ servable bridges`). Without bridging the conjunction is
    /// exactly `Σ y = x`.
    fn add_assignment_coverage_link(
        &self,
        problem: &mut Problem,
        vars: &VariableRegistry,
        indexes: &ModelIndexes,
    ) -> Result<(), ProblemError> {
        let inst = self.instance;
        for (&(i, s), &x) in &vars.x {
            let covers: Vec<VariableRef> = indexes
                .compatible_pairs
                .get(&(i, s))
                .into_iter()
                .flatten()
                .map(|&(l1, l2)| vars.y[&(i, s, l1, l2)])
                .collect();

            if !covers.is_empty() {
                let mut terms = covers.clone();
                let mut coefs = vec![1.0; terms.len()];
                terms.push(x);
                coefs.push(-1.0);
                let id = format!(
                    "covers_at_most_one_pair[{},{}]",
                    inst.interpreter_name(i),
                    inst.session_name(s)
                );
                problem.add_linear_constraint(&id, &terms, &coefs, Relation::LessEqual, 0.0)?;
            }

            let serving: Vec<VariableRef> = indexes
                .bridge_service
                .get(&(i, s))
                .into_iter()
                .flatten()
                .map(|&position| {
                    let candidate = &indexes.bridges[s][position];
                    vars.z[&(s, candidate.bridge, candidate.pair.0, candidate.pair.1)]
                })
                .collect();

            let mut terms = vec![x];
            let mut coefs = vec![1.0];
            terms.extend(covers.iter().copied().chain(serving.iter().copied()));
            coefs.extend(std::iter::repeat(-1.0).take(terms.len() - 1));
            let id = format!(
                "no_idle_assignment[{},{}]",
                inst.interpreter_name(i),
                inst.session_name(s)
            );
            problem.add_linear_constraint(&id, &terms, &coefs, Relation::LessEqual, 0.0)?;
        }
        Ok(())
    }

    /// Family 3: each pair is covered at most once, by exactly one mechanism
    fn add_pair_uniqueness(
        &self,
        problem: &mut Problem,
        vars: &VariableRegistry,
        indexes: &ModelIndexes,
    ) -> Result<(), ProblemError> {
        let inst = self.instance;
        for s in 0..inst.num_sessions() {
            for &pair in &indexes.session_pairs[s] {
                let mut terms: Vec<VariableRef> = indexes
                    .capable_interpreters
                    .get(&(s, pair))
                    .into_iter()
                    .flatten()
                    .map(|&i| vars.y[&(i, s, pair.0, pair.1)])
                    .collect();
                terms.extend(
                    indexes.bridges[s]
                        .iter()
                        .filter(|candidate| candidate.pair == pair)
                        .map(|candidate| vars.z[&(s, candidate.bridge, pair.0, pair.1)]),
                );
                if terms.len() < 2 {
                    continue;
                }
                let id = format!(
                    "pair_covered_once[{},{},{}]",
                    inst.session_name(s),
                    inst.language_name(pair.0),
                    inst.language_name(pair.1)
                );
                let coefs = vec![1.0; terms.len()];
                problem.add_linear_constraint(&id, &terms, &coefs, Relation::LessEqual, 1.0)?;
            }
        }
        Ok(())
    }

    /// Family 4: a language counts as covered only if some active mechanism
    /// covers a pair containing it (the bridge language itself does not count)
    fn add_language_coverage(
        &self,
        problem: &mut Problem,
        vars: &VariableRegistry,
        indexes: &ModelIndexes,
    ) -> Result<(), ProblemError> {
        let inst = self.instance;
        for (&(s, l), &u) in &vars.u {
            let mut terms = vec![u];
            let mut coefs = vec![1.0];
            for &pair in &indexes.session_pairs[s] {
                if pair.0 != l && pair.1 != l {
                    continue;
                }
                for &i in indexes
                    .capable_interpreters
                    .get(&(s, pair))
                    .into_iter()
                    .flatten()
                {
                    terms.push(vars.y[&(i, s, pair.0, pair.1)]);
                    coefs.push(-1.0);
                }
                for candidate in indexes.bridges[s].iter().filter(|c| c.pair == pair) {
                    terms.push(vars.z[&(s, candidate.bridge, pair.0, pair.1)]);
                    coefs.push(-1.0);
                }
            }
            let id = format!(
                "language_covered[{},{}]",
                inst.session_name(s),
                inst.language_name(l)
            );
            problem.add_linear_constraint(&id, &terms, &coefs, Relation::LessEqual, 0.0)?;
        }
        Ok(())
    }

    /// Family 5: a session is complete only if every required language is
    /// covered, as a counting threshold to keep the model linear
    fn add_session_completeness(
        &self,
        problem: &mut Problem,
        vars: &VariableRegistry,
    ) -> Result<(), ProblemError> {
        let inst = self.instance;
        for (&s, &c) in &vars.c {
            let required = inst.required_languages(s);
            let mut terms: Vec<VariableRef> =
                required.iter().map(|&l| vars.u[&(s, l)]).collect();
            let mut coefs = vec![1.0; terms.len()];
            terms.push(c);
            coefs.push(-(required.len() as f64));
            let id = format!("session_completeness[{}]", inst.session_name(s));
            problem.add_linear_constraint(&id, &terms, &coefs, Relation::GreaterEqual, 0.0)?;
        }
        Ok(())
    }

    /// Family 6: a bridge needs an assigned interpreter on each side, and no
    /// interpreter may stand on both sides of the same active bridge
    fn add_bridging_legality(
        &self,
        problem: &mut Problem,
        vars: &VariableRegistry,
        indexes: &ModelIndexes,
    ) -> Result<(), ProblemError> {
        let inst = self.instance;
        for (s, candidates) in indexes.bridges.iter().enumerate() {
            for candidate in candidates {
                let z = vars.z[&(s, candidate.bridge, candidate.pair.0, candidate.pair.1)];
                let tag = format!(
                    "{},{},{},{}",
                    inst.session_name(s),
                    inst.language_name(candidate.bridge),
                    inst.language_name(candidate.pair.0),
                    inst.language_name(candidate.pair.1)
                );

                for (side, label) in [
                    (&candidate.first_side, "first"),
                    (&candidate.second_side, "second"),
                ] {
                    let mut terms = vec![z];
                    let mut coefs = vec![1.0];
                    for &i in side.iter() {
                        terms.push(vars.x[&(i, s)]);
                        coefs.push(-1.0);
                    }
                    let id = format!("bridge_{}_side[{}]", label, tag);
                    problem.add_linear_constraint(&id, &terms, &coefs, Relation::LessEqual, 0.0)?;
                }

                for &i in &candidate.both_sides {
                    let id = format!("no_self_bridge[{},{}]", inst.interpreter_name(i), tag);
                    problem.add_linear_constraint(
                        &id,
                        &[z, vars.x[&(i, s)]],
                        &[1.0, 1.0],
                        Relation::LessEqual,
                        1.0,
                    )?;
                }
            }
        }
        Ok(())
    }

    /// Family 7: per-interpreter workload caps
    ///
    /// Total assigned sessions are capped, block occupancy `w` is linked to
    /// the per-session assignments of the block, and no window of
    /// `consecutive_block_window` adjacent blocks may be fully worked.
    fn add_operational_limits(
        &self,
        problem: &mut Problem,
        vars: &VariableRegistry,
    ) -> Result<(), ProblemError> {
        let inst = self.instance;

        for i in 0..inst.num_interpreters() {
            let assigned: Vec<VariableRef> = (0..inst.num_sessions())
                .filter_map(|s| vars.x.get(&(i, s)).copied())
                .collect();
            if assigned.len() > self.config.max_sessions_per_interpreter {
                let id = format!("session_cap[{}]", inst.interpreter_name(i));
                let coefs = vec![1.0; assigned.len()];
                problem.add_linear_constraint(
                    &id,
                    &assigned,
                    &coefs,
                    Relation::LessEqual,
                    self.config.max_sessions_per_interpreter as f64,
                )?;
            }
        }

        // w[i,b] = 1 iff the interpreter works some session of the block:
        // lower-bounded by every single assignment, upper-bounded by their sum
        for (&(i, b), &w) in &vars.w {
            let assigned: Vec<VariableRef> = inst
                .block_sessions(b)
                .iter()
                .filter_map(|&s| vars.x.get(&(i, s)).copied())
                .collect();
            for &s in inst.block_sessions(b) {
                if let Some(&x) = vars.x.get(&(i, s)) {
                    let id = format!(
                        "works_block_lb[{},{},{}]",
                        inst.interpreter_name(i),
                        inst.block_name(b),
                        inst.session_name(s)
                    );
                    problem.add_linear_constraint(
                        &id,
                        &[w, x],
                        &[1.0, -1.0],
                        Relation::GreaterEqual,
                        0.0,
                    )?;
                }
            }
            let mut terms = vec![w];
            let mut coefs = vec![1.0];
            terms.extend(assigned.iter().copied());
            coefs.extend(std::iter::repeat(-1.0).take(assigned.len()));
            let id = format!(
                "works_block_ub[{},{}]",
                inst.interpreter_name(i),
                inst.block_name(b)
            );
            problem.add_linear_constraint(&id, &terms, &coefs, Relation::LessEqual, 0.0)?;
        }

        // Sliding window over the block order
        let window = self.config.consecutive_block_window;
        let cap = self.config.max_worked_blocks_in_window;
        if inst.num_blocks() >= window {
            for i in 0..inst.num_interpreters() {
                for j in 0..=(inst.num_blocks() - window) {
                    let terms: Vec<VariableRef> = (j..j + window)
                        .filter_map(|b| vars.w.get(&(i, b)).copied())
                        .collect();
                    // Fewer occupiable blocks than the cap cannot violate it
                    if terms.len() <= cap {
                        continue;
                    }
                    let id = format!(
                        "consecutive_blocks[{},{}]",
                        inst.interpreter_name(i),
                        inst.block_name(j)
                    );
                    let coefs = vec![1.0; terms.len()];
                    problem.add_linear_constraint(
                        &id,
                        &terms,
                        &coefs,
                        Relation::LessEqual,
                        cap as f64,
                    )?;
                }
            }
        }
        Ok(())
    }
    // endregion Constraint families
}
