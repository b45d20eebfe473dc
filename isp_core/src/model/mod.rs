//! The ISP optimization model: sparse decision variables over a validated
//! instance, the constraint families tying them together, and the two
//! selectable objectives
//!
//! [`builder::ModelBuilder`] turns an [`Instance`](crate::instance::Instance)
//! plus an [`IspConfig`](crate::configuration::IspConfig) into an
//! [`IspModel`]. The model is objective-agnostic: both objectives are built
//! on demand over the already-created variables, so switching between them
//! never rebuilds variables or constraints.
pub mod builder;

use indexmap::IndexMap;
use std::fmt::{Display, Formatter};

use crate::configuration::IspConfig;
use crate::instance::{BlockIdx, Instance, InterpreterIdx, LanguageIdx, SessionIdx};
use crate::optimize::objective::Objective;
use crate::optimize::problem::Problem;
use crate::optimize::variable::VariableRef;

/// The two alternative objective functions of the ISP
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectiveFunction {
    /// OF1: maximize the number of covered language pairs, direct plus bridged
    CoveredPairs,
    /// OF2: maximize the number of fully covered sessions
    CoveredSessions,
}

impl Display for ObjectiveFunction {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ObjectiveFunction::CoveredPairs => write!(f, "OF1"),
            ObjectiveFunction::CoveredSessions => write!(f, "OF2"),
        }
    }
}

/// Handles of every decision variable family, keyed by their instance indices
///
/// Only feasible combinations get a variable; absence of a key means the
/// combination is structurally zero. Language pairs are always stored in
/// canonical order (lexicographically smaller language name first).
#[derive(Debug, Clone, Default)]
pub(crate) struct VariableRegistry {
    /// x[i,s]: interpreter i assigned to session s
    pub x: IndexMap<(InterpreterIdx, SessionIdx), VariableRef>,
    /// y[i,s,l1,l2]: interpreter i covers pair (l1,l2) in session s
    pub y: IndexMap<(InterpreterIdx, SessionIdx, LanguageIdx, LanguageIdx), VariableRef>,
    /// z[s,l0,l1,l2]: pair (l1,l2) covered in session s via bridge language l0
    pub z: IndexMap<(SessionIdx, LanguageIdx, LanguageIdx, LanguageIdx), VariableRef>,
    /// u[s,l]: language l is covered in session s
    pub u: IndexMap<(SessionIdx, LanguageIdx), VariableRef>,
    /// c[s]: session s is fully covered
    pub c: IndexMap<SessionIdx, VariableRef>,
    /// w[i,b]: interpreter i works during block b (operational variant only)
    pub w: IndexMap<(InterpreterIdx, BlockIdx), VariableRef>,
}

/// A fully built ISP model, ready to be solved under either objective
#[derive(Debug, Clone)]
pub struct IspModel<'a> {
    /// The instance the model was built from
    instance: &'a Instance,
    /// The configuration the model was built under
    config: IspConfig,
    /// The accumulated variable and constraint set
    problem: Problem,
    /// Decision variable handles
    vars: VariableRegistry,
}

impl<'a> IspModel<'a> {
    pub(crate) fn new(
        instance: &'a Instance,
        config: IspConfig,
        problem: Problem,
        vars: VariableRegistry,
    ) -> Self {
        IspModel {
            instance,
            config,
            problem,
            vars,
        }
    }

    /// The instance this model encodes
    pub fn instance(&self) -> &Instance {
        self.instance
    }

    /// The configuration this model was built under
    pub fn config(&self) -> &IspConfig {
        &self.config
    }

    /// The underlying variable and constraint set
    pub fn problem(&self) -> &Problem {
        &self.problem
    }

    /// Build the linear objective for the given objective function
    ///
    /// OF1 sums all direct pair coverage variables plus all bridge variables;
    /// OF2 sums the session completeness variables. Both only reference
    /// existing variables; the model itself is untouched.
    pub fn objective(&self, of: ObjectiveFunction) -> Objective {
        let mut objective = Objective::new_maximize();
        match of {
            ObjectiveFunction::CoveredPairs => {
                objective.add_linear_terms(self.vars.y.values().copied(), 1.0);
                objective.add_linear_terms(self.vars.z.values().copied(), 1.0);
            }
            ObjectiveFunction::CoveredSessions => {
                objective.add_linear_terms(self.vars.c.values().copied(), 1.0);
            }
        }
        objective
    }

    // region Variable access
    /// Assignment variables, as `((interpreter, session), handle)`
    pub fn assignment_vars(
        &self,
    ) -> impl Iterator<Item = ((InterpreterIdx, SessionIdx), VariableRef)> + '_ {
        self.vars.x.iter().map(|(k, v)| (*k, *v))
    }

    /// Direct pair coverage variables, as `((interpreter, session, l1, l2), handle)`
    pub fn coverage_vars(
        &self,
    ) -> impl Iterator<
        Item = (
            (InterpreterIdx, SessionIdx, LanguageIdx, LanguageIdx),
            VariableRef,
        ),
    > + '_ {
        self.vars.y.iter().map(|(k, v)| (*k, *v))
    }

    /// Bridge variables, as `((session, bridge, l1, l2), handle)`
    pub fn bridge_vars(
        &self,
    ) -> impl Iterator<
        Item = (
            (SessionIdx, LanguageIdx, LanguageIdx, LanguageIdx),
            VariableRef,
        ),
    > + '_ {
        self.vars.z.iter().map(|(k, v)| (*k, *v))
    }

    /// Session completeness variables, as `(session, handle)`
    pub fn completeness_vars(&self) -> impl Iterator<Item = (SessionIdx, VariableRef)> + '_ {
        self.vars.c.iter().map(|(k, v)| (*k, *v))
    }

    /// Block occupancy variables, as `((interpreter, block), handle)`;
    /// empty unless the model was built with operational limits
    pub fn occupancy_vars(
        &self,
    ) -> impl Iterator<Item = ((InterpreterIdx, BlockIdx), VariableRef)> + '_ {
        self.vars.w.iter().map(|(k, v)| (*k, *v))
    }

    /// Handle of one assignment variable, if it exists
    pub fn assignment_var(&self, i: InterpreterIdx, s: SessionIdx) -> Option<VariableRef> {
        self.vars.x.get(&(i, s)).copied()
    }

    /// Handle of one direct coverage variable, if it exists
    pub fn coverage_var(
        &self,
        i: InterpreterIdx,
        s: SessionIdx,
        l1: LanguageIdx,
        l2: LanguageIdx,
    ) -> Option<VariableRef> {
        self.vars.y.get(&(i, s, l1, l2)).copied()
    }
    // endregion Variable access
}
