//! Module providing representation of optimization problem variables
use std::fmt::{Display, Formatter};

/// A decision variable in an optimization problem
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub struct Variable {
    /// Identifier of the variable, unique within a [`Problem`](crate::optimize::problem::Problem)
    pub id: String,
    /// Type of the variable (see [`VariableType`])
    pub variable_type: VariableType,
}

impl Variable {
    /// Create a new variable
    pub fn new(id: impl Into<String>, variable_type: VariableType) -> Variable {
        Variable {
            id: id.into(),
            variable_type,
        }
    }

    /// Create a new binary variable
    pub fn new_binary(id: impl Into<String>) -> Variable {
        Variable::new(id, VariableType::Binary)
    }
}

impl Display for Variable {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.id, self.variable_type)
    }
}

/// A cheap copyable handle referencing a variable inside a problem
///
/// The handle is the position of the variable within its problem, assigned
/// when the variable is added and never changed afterwards. Constraints and
/// objectives refer to variables through these handles only.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct VariableRef(pub(crate) usize);

impl VariableRef {
    /// Position of the referenced variable in its problem
    pub fn index(&self) -> usize {
        self.0
    }
}

/// Represents the type of variable in an optimization problem
///
/// # Notes:
/// The ISP encoding is purely binary; the other types remain so the solver
/// seam stays usable for general MILP models.
#[derive(Debug, PartialEq, Clone, Copy, Hash, Eq)]
pub enum VariableType {
    /// Continuous variable
    Continuous,
    /// Integer variable
    Integer,
    /// Binary Variable
    Binary,
}

impl Display for VariableType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            VariableType::Continuous => write!(f, "CONTINUOUS"),
            VariableType::Integer => write!(f, "INTEGER"),
            VariableType::Binary => write!(f, "BINARY"),
        }
    }
}
