//! Report models: the two canonical tables of a solved schedule.
//!
//! The Game Report has one row per match slot, the Team Report one row per
//! team. Both are plain derived data; they are built by
//! [`Schedule`](crate::schedule::Schedule) from solved values (and the
//! reassignment overlay) and never mutated afterwards.

use serde::{Deserialize, Serialize};

use super::facilities::{Facilities, Team};
use crate::error::{LeagueError, Result};

/// Role assignment of one match: who plays home, away, and referees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Assignment {
    pub home: Team,
    pub away: Team,
    pub referee: Team,
}

impl Assignment {
    /// Creates an assignment.
    pub fn new(home: Team, away: Team, referee: Team) -> Self {
        Self {
            home,
            away,
            referee,
        }
    }

    /// Whether the team plays in this match.
    #[inline]
    pub fn plays(&self, team: Team) -> bool {
        self.home == team || self.away == team
    }

    /// Whether the team plays or referees in this match.
    #[inline]
    pub fn involves(&self, team: Team) -> bool {
        self.plays(team) || self.referee == team
    }

    /// Whether the three roles are held by three different teams.
    pub fn roles_distinct(&self) -> bool {
        self.home != self.away && self.home != self.referee && self.away != self.referee
    }
}

/// One row of the Game Report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameRow {
    pub match_id: usize,
    pub weekend_index: usize,
    pub date: chrono::NaiveDate,
    pub location: u32,
    pub time: String,
    pub time_index: usize,
    pub home: Team,
    pub away: Team,
    pub referee: Team,
}

impl GameRow {
    /// The row's role assignment.
    pub fn assignment(&self) -> Assignment {
        Assignment::new(self.home, self.away, self.referee)
    }
}

/// Game Report: one row per match slot, sorted by
/// `(weekend_index, date, location, time_index)`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameReport {
    rows: Vec<GameRow>,
    /// `position[match_id]` = row index.
    position: Vec<usize>,
}

impl GameReport {
    /// Builds the report from one assignment per match slot.
    ///
    /// `assignments[i]` belongs to `facilities.match_slots()[i]`.
    pub fn build(facilities: &Facilities, assignments: &[Assignment]) -> Self {
        let mut rows: Vec<GameRow> = facilities
            .match_slots()
            .iter()
            .zip(assignments)
            .map(|(slot, a)| GameRow {
                match_id: slot.id,
                weekend_index: slot.weekend_index,
                date: slot.date,
                location: slot.location,
                time: slot.time.clone(),
                time_index: slot.time_index,
                home: a.home,
                away: a.away,
                referee: a.referee,
            })
            .collect();
        rows.sort_by(|a, b| {
            (a.weekend_index, a.date, a.location, a.time_index).cmp(&(
                b.weekend_index,
                b.date,
                b.location,
                b.time_index,
            ))
        });

        let mut position = vec![0; rows.len()];
        for (i, row) in rows.iter().enumerate() {
            if let Some(p) = position.get_mut(row.match_id) {
                *p = i;
            }
        }
        Self { rows, position }
    }

    /// All rows in report order.
    pub fn rows(&self) -> &[GameRow] {
        &self.rows
    }

    /// The row of a match slot.
    pub fn row(&self, match_id: usize) -> Option<&GameRow> {
        self.position.get(match_id).and_then(|&i| self.rows.get(i))
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the report has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows in chronological order `(weekend, date, time, location)`.
    pub fn chronological(&self) -> Vec<&GameRow> {
        let mut rows: Vec<&GameRow> = self.rows.iter().collect();
        rows.sort_by_key(|r| (r.weekend_index, r.date, r.time_index, r.location));
        rows
    }
}

/// One row of the Team Report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamRow {
    pub team: Team,
    pub total_play: usize,
    pub total_ref: usize,
    /// Games against every team, indexed by opponent (own entry is 0).
    pub vs: Vec<usize>,
}

/// Team Report: one row per team index.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamReport {
    rows: Vec<TeamRow>,
}

impl TeamReport {
    /// Derives per-team totals and head-to-head counts from a game report.
    ///
    /// Each match increments both directions of its pairing, so the result
    /// does not depend on row order.
    ///
    /// # Errors
    /// [`LeagueError::TeamOutOfRange`] for a row naming a team outside
    /// `[0, total_teams)`.
    pub fn from_games(total_teams: usize, games: &GameReport) -> Result<Self> {
        let mut rows: Vec<TeamRow> = (0..total_teams)
            .map(|team| TeamRow {
                team,
                total_play: 0,
                total_ref: 0,
                vs: vec![0; total_teams],
            })
            .collect();

        for g in games.rows() {
            if let Some(&team) = [g.home, g.away, g.referee].iter().find(|&&t| t >= total_teams) {
                return Err(LeagueError::TeamOutOfRange {
                    match_id: g.match_id,
                    team,
                    total_teams,
                });
            }
            rows[g.home].total_play += 1;
            rows[g.away].total_play += 1;
            rows[g.referee].total_ref += 1;
            if g.home != g.away {
                rows[g.home].vs[g.away] += 1;
                rows[g.away].vs[g.home] += 1;
            }
        }
        Ok(Self { rows })
    }

    /// All rows, indexed by team.
    pub fn rows(&self) -> &[TeamRow] {
        &self.rows
    }

    /// Row of a team.
    pub fn row(&self, team: Team) -> Option<&TeamRow> {
        self.rows.get(team)
    }

    /// Games between two teams.
    pub fn head_to_head(&self, a: Team, b: Team) -> usize {
        self.rows
            .get(a)
            .and_then(|r| r.vs.get(b))
            .copied()
            .unwrap_or(0)
    }

    /// Sum of `total_ref` over all teams.
    pub fn total_refs(&self) -> usize {
        self.rows.iter().map(|r| r.total_ref).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FacilitiesConfig;

    fn facilities() -> Facilities {
        Facilities::new(
            FacilitiesConfig::new(vec![4])
                .with_date("2024-01-06")
                .with_time_slot("18:00", vec![2, 1])
                .with_time_slot("19:00", vec![1]),
        )
        .unwrap()
    }

    #[test]
    fn test_game_report_sorted_by_location_then_time() {
        let f = facilities();
        let assignments = vec![
            Assignment::new(0, 1, 2),
            Assignment::new(2, 3, 0),
            Assignment::new(1, 3, 2),
        ];
        let report = GameReport::build(&f, &assignments);
        let order: Vec<(u32, usize)> = report.rows().iter().map(|r| (r.location, r.time_index)).collect();
        assert_eq!(order, vec![(1, 0), (1, 1), (2, 0)]);
        assert_eq!(report.row(1).map(|r| r.home), Some(2));
        assert_eq!(report.chronological()[2].match_id, 2);
    }

    #[test]
    fn test_team_report_counts() {
        let f = facilities();
        let assignments = vec![
            Assignment::new(0, 1, 2),
            Assignment::new(2, 3, 0),
            Assignment::new(1, 0, 3),
        ];
        let games = GameReport::build(&f, &assignments);
        let teams = TeamReport::from_games(4, &games).unwrap();
        assert_eq!(teams.row(0).map(|r| r.total_play), Some(2));
        assert_eq!(teams.row(0).map(|r| r.total_ref), Some(1));
        assert_eq!(teams.head_to_head(0, 1), 2);
        assert_eq!(teams.head_to_head(1, 0), 2);
        assert_eq!(teams.head_to_head(0, 0), 0);
        assert_eq!(teams.total_refs(), 3);
    }

    #[test]
    fn test_team_report_order_independent() {
        let f = facilities();
        let a = vec![
            Assignment::new(0, 1, 2),
            Assignment::new(2, 3, 0),
            Assignment::new(1, 3, 2),
        ];
        let mut b = a.clone();
        b.reverse();
        let ta = TeamReport::from_games(4, &GameReport::build(&f, &a)).unwrap();
        let tb = TeamReport::from_games(4, &GameReport::build(&f, &b)).unwrap();
        assert_eq!(ta.total_refs(), tb.total_refs());
        for t in 0..4 {
            assert_eq!(ta.row(t).map(|r| r.total_play), tb.row(t).map(|r| r.total_play));
        }
    }

    #[test]
    fn test_team_report_rejects_out_of_range_team() {
        let f = facilities();
        let assignments = vec![
            Assignment::new(0, 1, 2),
            Assignment::new(7, 7, 99),
            Assignment::new(1, 3, 2),
        ];
        let err = TeamReport::from_games(4, &GameReport::build(&f, &assignments)).unwrap_err();
        assert_eq!(
            err,
            LeagueError::TeamOutOfRange {
                match_id: 1,
                team: 7,
                total_teams: 4,
            }
        );
    }

    #[test]
    fn test_assignment_roles() {
        let a = Assignment::new(0, 1, 2);
        assert!(a.roles_distinct());
        assert!(a.plays(1));
        assert!(!a.plays(2));
        assert!(a.involves(2));
        assert!(!Assignment::new(1, 1, 2).roles_distinct());
    }
}
