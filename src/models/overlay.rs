//! Reassignment overlay.
//!
//! Post-processors may report a different, equally valid arrangement than
//! the solver chose (for example, a different court for the same game)
//! without re-solving. The overlay maps a match id to its alternate role
//! assignment and remembers which post-processor wrote it.
//!
//! # Conflict Policy
//! A match may be rewritten any number of times by the post-processor that
//! first claimed it. A write by a *different* post-processor is rejected
//! with [`LeagueError::OverlayConflict`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::report::Assignment;
use crate::error::{LeagueError, Result};

/// An overlay entry: the alternate assignment and its writer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverlayEntry {
    pub owner: String,
    pub assignment: Assignment,
}

/// Map from match id to alternate role assignment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Overlay {
    entries: BTreeMap<usize, OverlayEntry>,
}

impl Overlay {
    /// Creates an empty overlay.
    pub fn new() -> Self {
        Self::default()
    }

    /// Alternate assignment of a match, if any.
    pub fn get(&self, match_id: usize) -> Option<&Assignment> {
        self.entries.get(&match_id).map(|e| &e.assignment)
    }

    /// Writer of a match's entry, if any.
    pub fn owner(&self, match_id: usize) -> Option<&str> {
        self.entries.get(&match_id).map(|e| e.owner.as_str())
    }

    /// Number of rewritten matches.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing has been rewritten.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in match id order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &OverlayEntry)> {
        self.entries.iter().map(|(&id, e)| (id, e))
    }

    /// Records an alternate assignment, enforcing the conflict policy.
    pub(crate) fn insert(
        &mut self,
        owner: &str,
        match_id: usize,
        assignment: Assignment,
    ) -> Result<()> {
        if let Some(existing) = self.entries.get(&match_id) {
            if existing.owner != owner {
                return Err(LeagueError::OverlayConflict {
                    match_id,
                    owner: owner.to_string(),
                    previous: existing.owner.clone(),
                });
            }
        }
        self.entries.insert(
            match_id,
            OverlayEntry {
                owner: owner.to_string(),
                assignment,
            },
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_owner_may_rewrite() {
        let mut o = Overlay::new();
        o.insert("courts", 3, Assignment::new(0, 1, 2)).unwrap();
        o.insert("courts", 3, Assignment::new(1, 0, 2)).unwrap();
        assert_eq!(o.len(), 1);
        assert_eq!(o.get(3), Some(&Assignment::new(1, 0, 2)));
        assert_eq!(o.owner(3), Some("courts"));
    }

    #[test]
    fn test_other_owner_conflicts() {
        let mut o = Overlay::new();
        o.insert("courts", 3, Assignment::new(0, 1, 2)).unwrap();
        let err = o.insert("swap", 3, Assignment::new(1, 0, 2)).unwrap_err();
        assert_eq!(
            err,
            LeagueError::OverlayConflict {
                match_id: 3,
                owner: "swap".into(),
                previous: "courts".into(),
            }
        );
        assert_eq!(o.get(3), Some(&Assignment::new(0, 1, 2)));
    }
}
