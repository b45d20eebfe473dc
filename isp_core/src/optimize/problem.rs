//! Provides struct representing an optimization problem
//!
//! A [`Problem`] accumulates an append-only variable and constraint set. The
//! ISP model builder fills one in a single pass and afterwards hands it,
//! immutable, to the solve driver together with an
//! [`Objective`](crate::optimize::objective::Objective); no cross-phase
//! mutation of the model is possible once solving starts.
use indexmap::IndexMap;
use thiserror::Error;

use crate::optimize::constraint::{Constraint, Relation};
use crate::optimize::variable::{Variable, VariableRef, VariableType};

/// An optimization problem over binary/integer/continuous variables with
/// linear constraints
#[derive(Debug, Clone, Default)]
pub struct Problem {
    /// Variables of the optimization problem, keyed by id, in insertion order
    variables: IndexMap<String, Variable>,
    /// Constraints of the optimization problem, keyed by id, in insertion order
    constraints: IndexMap<String, Constraint>,
}

impl Problem {
    /// Create a new empty optimization problem
    pub fn new() -> Self {
        Self::default()
    }

    // region Adding Variables
    /// Add a variable to the optimization problem
    ///
    /// # Returns
    /// A [`VariableRef`] handle for use in constraints and objectives
    pub fn add_variable(&mut self, variable: Variable) -> Result<VariableRef, ProblemError> {
        if self.variables.contains_key(&variable.id) {
            return Err(ProblemError::VariableIdAlreadyExists(variable.id));
        }
        let index = self.variables.len();
        self.variables.insert(variable.id.clone(), variable);
        Ok(VariableRef(index))
    }

    /// Create a new binary variable and add it to the optimization problem
    pub fn add_binary_variable(&mut self, id: &str) -> Result<VariableRef, ProblemError> {
        self.add_variable(Variable::new(id, VariableType::Binary))
    }
    // endregion Adding Variables

    // region Adding Constraints
    /// Add a constraint to the problem
    ///
    /// Fails if a constraint with the same id already exists, or if the
    /// constraint references a variable that is not part of this problem.
    pub fn add_constraint(&mut self, constraint: Constraint) -> Result<(), ProblemError> {
        if self.constraints.contains_key(&constraint.id) {
            return Err(ProblemError::ConstraintAlreadyExists(constraint.id));
        }
        for var in constraint.variables() {
            if var.index() >= self.variables.len() {
                return Err(ProblemError::NonExistentVariableInConstraint(
                    constraint.id.clone(),
                ));
            }
        }
        self.constraints.insert(constraint.id.clone(), constraint);
        Ok(())
    }

    /// Create a new linear constraint and add it to the problem
    pub fn add_linear_constraint(
        &mut self,
        id: &str,
        variables: &[VariableRef],
        coefficients: &[f64],
        relation: Relation,
        rhs: f64,
    ) -> Result<(), ProblemError> {
        self.add_constraint(Constraint::new(id, variables, coefficients, relation, rhs))
    }
    // endregion Adding Constraints

    // region Accessors
    /// Number of variables in the problem
    pub fn num_variables(&self) -> usize {
        self.variables.len()
    }

    /// Number of constraints in the problem
    pub fn num_constraints(&self) -> usize {
        self.constraints.len()
    }

    /// Look up a variable handle by id
    pub fn variable_by_id(&self, id: &str) -> Option<VariableRef> {
        self.variables.get_index_of(id).map(VariableRef)
    }

    /// The variable behind a handle
    ///
    /// # Panics
    /// Panics if the handle does not belong to this problem.
    pub fn variable(&self, var: VariableRef) -> &Variable {
        &self.variables[var.index()]
    }

    /// Iterate over the variables in insertion order
    pub fn variables(&self) -> impl Iterator<Item = (VariableRef, &Variable)> {
        self.variables
            .values()
            .enumerate()
            .map(|(i, v)| (VariableRef(i), v))
    }

    /// Iterate over the constraints in insertion order
    pub fn constraints(&self) -> impl Iterator<Item = &Constraint> {
        self.constraints.values()
    }

    /// Whether any variable is integer or binary
    pub fn has_integer_variables(&self) -> bool {
        self.variables
            .values()
            .any(|v| matches!(v.variable_type, VariableType::Integer | VariableType::Binary))
    }
    // endregion Accessors
}

impl std::ops::Index<usize> for Problem {
    type Output = Variable;

    fn index(&self, index: usize) -> &Variable {
        &self.variables[index]
    }
}

/// Errors associated with assembling a [`Problem`]
#[derive(Error, Debug, Clone)]
pub enum ProblemError {
    /// Error when trying to add a variable with the same id as an existing variable
    #[error("tried to add a variable with an id that already exists: {0}")]
    VariableIdAlreadyExists(String),
    /// Error when trying to add a constraint with the same id as an existing constraint
    #[error("tried to add a constraint with an id that already exists: {0}")]
    ConstraintAlreadyExists(String),
    /// Error when trying to add a constraint that contains variables not in the problem
    #[error("constraint {0} references a variable that is not part of the problem")]
    NonExistentVariableInConstraint(String),
}
