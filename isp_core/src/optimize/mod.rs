//! Engine-agnostic MILP substrate: variables, constraints, objectives, and
//! the problem container the ISP model builder fills in
pub mod constraint;
pub mod objective;
pub mod problem;
pub mod solvers;
pub mod variable;
