//! Solver boundary: configuration, status, and solution types.
//!
//! Any engine that accepts a [`CpModel`] and returns a status plus
//! variable values can stand behind [`CpSolver`].

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::model::{BoolVar, CpModel, IntVar, Lit};

/// Outcome of a solve call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SolveStatus {
    /// A solution was found and proven optimal (or, without an objective,
    /// simply found).
    Optimal,
    /// A solution was found but the time budget expired before optimality
    /// was proven. Accepted as an answer.
    Feasible,
    /// The model was proven to have no solution.
    Infeasible,
    /// The model is structurally malformed.
    ModelInvalid,
    /// The time budget expired before any solution was found.
    Unknown,
}

impl SolveStatus {
    /// Whether the status carries a usable assignment.
    #[inline]
    pub fn is_success(self) -> bool {
        matches!(self, SolveStatus::Optimal | SolveStatus::Feasible)
    }
}

impl std::fmt::Display for SolveStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SolveStatus::Optimal => "optimal",
            SolveStatus::Feasible => "feasible",
            SolveStatus::Infeasible => "infeasible",
            SolveStatus::ModelInvalid => "model-invalid",
            SolveStatus::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// Solver parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolverConfig {
    /// Wall-clock budget. The only cancellation mechanism.
    pub time_limit: Duration,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            time_limit: Duration::from_secs(10),
        }
    }
}

impl SolverConfig {
    /// Creates the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the wall-clock budget.
    pub fn with_time_limit(mut self, time_limit: Duration) -> Self {
        self.time_limit = time_limit;
        self
    }
}

/// Size of the solved program and time spent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchStats {
    pub columns: usize,
    pub rows: usize,
    pub wall_time: Duration,
}

/// Result of a solve call.
#[derive(Debug, Clone)]
pub struct CpSolution {
    /// Terminal status.
    pub status: SolveStatus,
    /// Objective value of the returned assignment, if any.
    pub objective: Option<i64>,
    /// Engine counters.
    pub stats: SearchStats,
    values: Vec<i64>,
}

impl CpSolution {
    /// A solution carrying an assignment.
    pub fn with_values(status: SolveStatus, values: Vec<i64>, objective: Option<i64>) -> Self {
        Self {
            status,
            objective,
            stats: SearchStats::default(),
            values,
        }
    }

    /// A solution without an assignment.
    pub fn without_values(status: SolveStatus) -> Self {
        Self {
            status,
            objective: None,
            stats: SearchStats::default(),
            values: Vec::new(),
        }
    }

    /// Whether the status carries a usable assignment.
    pub fn is_solution_found(&self) -> bool {
        self.status.is_success()
    }

    /// Value of an integer variable. `None` without an assignment.
    pub fn value(&self, var: IntVar) -> Option<i64> {
        self.values.get(var.index()).copied()
    }

    /// Value of a boolean variable.
    pub fn bool_value(&self, var: BoolVar) -> Option<bool> {
        self.values.get(var.index()).map(|&v| v != 0)
    }

    /// Value of a literal.
    pub fn lit_value(&self, lit: Lit) -> Option<bool> {
        self.values
            .get(lit.var_index())
            .map(|&v| (v != 0) != lit.is_negated())
    }

    /// The raw assignment indexed by variable.
    pub fn values(&self) -> &[i64] {
        &self.values
    }
}

/// A constraint solving engine.
///
/// Implementations must be deterministic for a fixed `(model, config)`.
pub trait CpSolver: Send + Sync {
    /// Engine name, for logs.
    fn name(&self) -> &str;

    /// Solves the model within the configured budget. Never panics on
    /// infeasible or malformed models; those are statuses.
    fn solve(&self, model: &CpModel, config: &SolverConfig) -> CpSolution;
}
