//! Error types shared across the crate.
//!
//! Infeasibility is *not* an error: a solve that proves the model
//! unsatisfiable is reported through [`SolveStatus`](crate::cp::SolveStatus)
//! and the pipeline's terminal state. Everything here is either a
//! configuration defect, a misuse of the API, or a broken invariant.

use thiserror::Error;

use crate::models::Assignment;
use crate::validation::ConfigIssue;

/// Crate-wide error type.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LeagueError {
    /// The facilities configuration is invalid. Fatal at construction.
    #[error("invalid facilities configuration: {}", join_messages(issues.iter().map(|i| i.message.as_str())))]
    Config { issues: Vec<ConfigIssue> },

    /// A report was requested before a successful solve.
    #[error("schedule has not been solved successfully")]
    NotSolved,

    /// One or more validators rejected the solved schedule.
    #[error("{} validation violation(s): {}", violations.len(), join_messages(violations.iter().map(|v| v.message.as_str())))]
    Validation { violations: Vec<Violation> },

    /// Schedule text could not be parsed.
    #[error("line {line}: {message}")]
    Parse { line: usize, message: String },

    /// Two different post-processors rewrote the same match.
    #[error("match {match_id} already reassigned by '{previous}', '{owner}' may not override it")]
    OverlayConflict {
        match_id: usize,
        owner: String,
        previous: String,
    },

    /// A post-processor wrote a triple that is not one of the validated
    /// games at the match's instant.
    #[error(
        "match {match_id}: {} v {} r {} is not a validated game at its instant",
        assignment.home, assignment.away, assignment.referee
    )]
    OverlayNotPermutation {
        match_id: usize,
        assignment: Assignment,
    },

    /// A report row names a team outside `[0, total_teams)`.
    #[error("match {match_id} names team {team}, outside [0, {total_teams})")]
    TeamOutOfRange {
        match_id: usize,
        team: usize,
        total_teams: usize,
    },

    /// A match id outside the facilities' slot list.
    #[error("unknown match slot {0}")]
    UnknownMatch(usize),

    /// `minimize` was called a second time on the same schedule.
    #[error("objective already set for this schedule")]
    ObjectiveAlreadySet,

    /// The pipeline was asked to move between states out of order.
    #[error("illegal pipeline transition {from} -> {to}")]
    IllegalTransition { from: String, to: String },
}

/// A single violated invariant found by a validator.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Violation {
    /// Name of the component whose validator reported it.
    pub component: String,
    /// Name of the validator.
    pub validator: String,
    /// Human-readable description.
    pub message: String,
}

impl Violation {
    /// Creates a violation. Component and validator names are filled in by
    /// the pipeline when empty.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            component: String::new(),
            validator: String::new(),
            message: message.into(),
        }
    }

    pub(crate) fn tagged(mut self, component: &str, validator: &str) -> Self {
        if self.component.is_empty() {
            self.component = component.to_string();
        }
        if self.validator.is_empty() {
            self.validator = validator.to_string();
        }
        self
    }
}

/// Result type for league operations.
pub type Result<T> = std::result::Result<T, LeagueError>;

fn join_messages<'a>(messages: impl Iterator<Item = &'a str>) -> String {
    messages.collect::<Vec<_>>().join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_message_lists_all() {
        let err = LeagueError::Validation {
            violations: vec![Violation::new("first"), Violation::new("second")],
        };
        let text = err.to_string();
        assert!(text.starts_with("2 validation violation(s)"));
        assert!(text.contains("first"));
        assert!(text.contains("second"));
    }

    #[test]
    fn test_violation_tagging_keeps_existing() {
        let v = Violation::new("x").tagged("core", "roles");
        assert_eq!(v.component, "core");
        assert_eq!(v.validator, "roles");

        let again = v.clone().tagged("other", "other");
        assert_eq!(again, v);
    }
}
