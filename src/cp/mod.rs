//! Constraint-programming layer.
//!
//! [`CpModel`] is the description every schedule component writes into:
//! integer and boolean variables, linear constraints (optionally enforced
//! by literals), all-different, value equivalences, clauses, and a single
//! minimization objective. [`CpSolver`] is the boundary to any engine;
//! [`MilpSolver`] is the built-in one, lowering the model to a 0/1 integer
//! program for `good_lp`.
//!
//! # Reference
//! - Rossi, van Beek, Walsh (2006), "Handbook of Constraint Programming"
//! - Laborie et al. (2018), "IBM ILOG CP Optimizer for Scheduling"

mod milp;
mod model;
mod solver;

pub use milp::MilpSolver;
pub use model::{BoolVar, CpModel, IntVar, LinearExpr, Lit};
pub use solver::{CpSolution, CpSolver, SearchStats, SolveStatus, SolverConfig};
