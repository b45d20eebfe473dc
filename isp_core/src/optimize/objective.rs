//! Provides struct for representing an optimization problem's objective

use crate::optimize::variable::VariableRef;

/// Represents the objective of an optimization problem
///
/// Objectives are linear and are built over the variable handles of an
/// existing problem; building a new objective never touches the variables or
/// constraints themselves, so a model can be re-solved under a different
/// objective without being rebuilt.
#[derive(Debug, Clone)]
pub struct Objective {
    /// Terms included in the objective (see [`ObjectiveTerm`])
    terms: Vec<ObjectiveTerm>,
    /// Sense of the objective (maximize, or minimize), see [`ObjectiveSense`]
    sense: ObjectiveSense,
}

impl Objective {
    /// Create a new empty objective, with a given sense
    pub fn new(sense: ObjectiveSense) -> Self {
        Self {
            terms: Vec::new(),
            sense,
        }
    }

    /// Create a new empty maximization objective
    pub fn new_maximize() -> Self {
        Self::new(ObjectiveSense::Maximize)
    }

    /// Create a new empty minimization objective
    pub fn new_minimize() -> Self {
        Self::new(ObjectiveSense::Minimize)
    }

    /// Change the sense of the objective
    pub fn set_sense(&mut self, sense: ObjectiveSense) {
        self.sense = sense;
    }

    /// The sense of the objective
    pub fn sense(&self) -> ObjectiveSense {
        self.sense
    }

    /// Add a new linear term to the objective
    pub fn add_linear_term(&mut self, variable: VariableRef, coefficient: f64) {
        self.terms.push(ObjectiveTerm {
            variable,
            coefficient,
        });
    }

    /// Add a series of linear terms to the objective, all with the same coefficient
    pub fn add_linear_terms(&mut self, variables: impl IntoIterator<Item = VariableRef>, coefficient: f64) {
        self.terms.extend(variables.into_iter().map(|variable| ObjectiveTerm {
            variable,
            coefficient,
        }));
    }

    /// Terms of the objective
    pub fn terms(&self) -> &[ObjectiveTerm] {
        &self.terms
    }

    /// Objective coefficient of a single variable (0 when the variable does not appear)
    pub fn coefficient_of(&self, variable: VariableRef) -> f64 {
        self.terms
            .iter()
            .filter(|t| t.variable == variable)
            .map(|t| t.coefficient)
            .sum()
    }
}

/// Represents the sense of the objective, whether it should be maximized or minimized
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectiveSense {
    /// The objective should be minimized
    Minimize,
    /// The objective should be maximized
    Maximize,
}

/// A linear term in the objective
#[derive(Debug, Clone)]
pub struct ObjectiveTerm {
    /// Variable in the objective term
    pub variable: VariableRef,
    /// Coefficient for the linear term
    pub coefficient: f64,
}
