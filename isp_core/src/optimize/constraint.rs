//! Provides struct for representing a linear constraint in an optimization problem
use std::fmt::{Display, Formatter};

use crate::optimize::variable::VariableRef;

/// A single linear constraint, `Σ coefficient·variable  relation  rhs`
#[derive(Debug, Clone)]
pub struct Constraint {
    /// Identifier of the constraint, unique within its problem
    pub id: String,
    /// Linear terms which are added together, see [`ConstraintTerm`]
    pub terms: Vec<ConstraintTerm>,
    /// Relation between the term sum and the right hand side
    pub relation: Relation,
    /// Right hand side constant
    pub rhs: f64,
}

impl Constraint {
    /// Create a new constraint from parallel slices of variables and coefficients
    ///
    /// # Parameters
    /// - `id`: Identifier for the constraint
    /// - `variables`: A slice of variable handles
    /// - `coefficients`: A slice of coefficients for the variables
    /// - `relation`: Whether the sum is `<=`, `>=` or `=` the right hand side
    /// - `rhs`: The right hand side of the constraint
    pub fn new(
        id: impl Into<String>,
        variables: &[VariableRef],
        coefficients: &[f64],
        relation: Relation,
        rhs: f64,
    ) -> Self {
        Constraint {
            id: id.into(),
            terms: Constraint::zip_into_terms(variables, coefficients),
            relation,
            rhs,
        }
    }

    /// Take a slice of variable handles and a slice of coefficients and zip
    /// them together into a vec of ConstraintTerms
    fn zip_into_terms(variables: &[VariableRef], coefficients: &[f64]) -> Vec<ConstraintTerm> {
        variables
            .iter()
            .zip(coefficients)
            .map(|(var, coef)| ConstraintTerm {
                variable: *var,
                coefficient: *coef,
            })
            .collect()
    }

    /// Variables referenced by this constraint
    pub fn variables(&self) -> impl Iterator<Item = VariableRef> + '_ {
        self.terms.iter().map(|t| t.variable)
    }
}

impl Display for Constraint {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let terms = self
            .terms
            .iter()
            .map(|t| format!("{}", t))
            .collect::<Vec<_>>()
            .join(" + ");
        write!(f, "{} {} {}", terms, self.relation, self.rhs)
    }
}

/// Relation between the linear term sum and the right hand side
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    /// Sum of the terms must be at most the right hand side
    LessEqual,
    /// Sum of the terms must be at least the right hand side
    GreaterEqual,
    /// Sum of the terms must equal the right hand side
    Equal,
}

impl Display for Relation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Relation::LessEqual => write!(f, "<="),
            Relation::GreaterEqual => write!(f, ">="),
            Relation::Equal => write!(f, "="),
        }
    }
}

/// Represents a single term in a constraint, specifically
/// the multiplication of the `variable` by the `coefficient`
#[derive(Debug, Clone)]
pub struct ConstraintTerm {
    /// A handle to a [`Variable`](crate::optimize::variable::Variable)
    pub variable: VariableRef,
    /// The coefficient for the variable
    pub coefficient: f64,
}

impl Display for ConstraintTerm {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}*v{}", self.coefficient, self.variable.index())
    }
}
