//! Validators: executable statements of the invariants a solved schedule
//! must satisfy.
//!
//! Each check scans the pre-overlay reports and returns every violation it
//! finds. A violation here means a constraint was encoded wrongly; it is
//! never an acceptable runtime state.

use std::collections::HashMap;

use super::{SolvedView, Validator};
use crate::error::Violation;

/// Home, away, and referee are three different teams within range.
#[derive(Debug, Clone, Copy, Default)]
pub struct RolesCheck;

impl Validator for RolesCheck {
    fn name(&self) -> &str {
        "roles"
    }

    fn validate(&self, view: &SolvedView<'_>) -> Vec<Violation> {
        let teams = view.facilities.total_teams();
        let mut out = Vec::new();
        for g in view.games.rows() {
            let a = g.assignment();
            if !a.roles_distinct() {
                out.push(Violation::new(format!(
                    "match {}: roles not distinct ({} v {} r {})",
                    g.match_id, a.home, a.away, a.referee
                )));
            }
            if [a.home, a.away, a.referee].iter().any(|&t| t >= teams) {
                out.push(Violation::new(format!(
                    "match {}: team out of range [0, {teams})",
                    g.match_id
                )));
            }
        }
        out
    }
}

/// Every team plays exactly the season target.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlayTargetCheck {
    target: Option<usize>,
}

impl PlayTargetCheck {
    /// Checks against the facilities' `games_per_season`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Checks against an explicit target.
    pub fn with_target(target: usize) -> Self {
        Self {
            target: Some(target),
        }
    }
}

impl Validator for PlayTargetCheck {
    fn name(&self) -> &str {
        "play-target"
    }

    fn validate(&self, view: &SolvedView<'_>) -> Vec<Violation> {
        let target = self
            .target
            .unwrap_or_else(|| view.facilities.games_per_season());
        view.teams
            .rows()
            .iter()
            .filter(|r| r.total_play != target)
            .map(|r| {
                Violation::new(format!(
                    "team {} plays {} games, expected {target}",
                    r.team, r.total_play
                ))
            })
            .collect()
    }
}

/// No team holds two roles at the same instant.
#[derive(Debug, Clone, Copy, Default)]
pub struct DoubleBookingCheck;

impl Validator for DoubleBookingCheck {
    fn name(&self) -> &str {
        "double-booking"
    }

    fn validate(&self, view: &SolvedView<'_>) -> Vec<Violation> {
        let slots = view.facilities.match_slots();
        let mut seen: HashMap<(usize, usize), usize> = HashMap::new();
        for g in view.games.rows() {
            let instant = slots[g.match_id].instant;
            for t in [g.home, g.away, g.referee] {
                *seen.entry((instant, t)).or_default() += 1;
            }
        }
        let mut out: Vec<(usize, usize, usize)> = seen
            .into_iter()
            .filter(|&(_, n)| n > 1)
            .map(|((i, t), n)| (i, t, n))
            .collect();
        out.sort_unstable();
        out.into_iter()
            .map(|(i, t, n)| Violation::new(format!("team {t} holds {n} roles at instant {i}")))
            .collect()
    }
}

/// Home, away, and referee come from one division.
#[derive(Debug, Clone, Copy, Default)]
pub struct DivisionIntegrityCheck;

impl Validator for DivisionIntegrityCheck {
    fn name(&self) -> &str {
        "division-integrity"
    }

    fn validate(&self, view: &SolvedView<'_>) -> Vec<Violation> {
        let f = view.facilities;
        let teams = f.total_teams();
        view.games
            .rows()
            .iter()
            // out-of-range teams are reported by RolesCheck
            .filter(|g| g.home < teams && g.away < teams && g.referee < teams)
            .filter(|g| !(f.same_division(g.home, g.away) && f.same_division(g.home, g.referee)))
            .map(|g| {
                Violation::new(format!(
                    "match {} crosses divisions ({} v {} r {})",
                    g.match_id, g.home, g.away, g.referee
                ))
            })
            .collect()
    }
}

/// One referee per match: the referee tally equals the match count.
#[derive(Debug, Clone, Copy, Default)]
pub struct RefereeTallyCheck;

impl Validator for RefereeTallyCheck {
    fn name(&self) -> &str {
        "referee-tally"
    }

    fn validate(&self, view: &SolvedView<'_>) -> Vec<Violation> {
        let refs = view.teams.total_refs();
        let matches = view.games.len();
        if refs == matches {
            Vec::new()
        } else {
            vec![Violation::new(format!(
                "{refs} referee assignments for {matches} matches"
            ))]
        }
    }
}

/// A referee plays at an adjacent instant.
#[derive(Debug, Clone, Copy, Default)]
pub struct RefereeNearbyCheck;

impl Validator for RefereeNearbyCheck {
    fn name(&self) -> &str {
        "referee-nearby"
    }

    fn validate(&self, view: &SolvedView<'_>) -> Vec<Violation> {
        let f = view.facilities;
        let plays_at = |instant: usize, team: usize| {
            f.instants()[instant].matches.iter().any(|&m| {
                view.games
                    .row(m)
                    .is_some_and(|r| r.assignment().plays(team))
            })
        };
        view.games
            .rows()
            .iter()
            .filter(|g| {
                let instant = &f.instants()[f.match_slots()[g.match_id].instant];
                !instant.neighbours().any(|n| plays_at(n, g.referee))
            })
            .map(|g| {
                Violation::new(format!(
                    "team {} referees match {} without playing next to it",
                    g.referee, g.match_id
                ))
            })
            .collect()
    }
}

/// No team plays more than the per-date cap.
#[derive(Debug, Clone, Copy, Default)]
pub struct DailyCapCheck {
    cap: Option<usize>,
}

impl DailyCapCheck {
    /// Checks against the facilities' `games_per_day`.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cap(cap: usize) -> Self {
        Self { cap: Some(cap) }
    }
}

impl Validator for DailyCapCheck {
    fn name(&self) -> &str {
        "daily-cap"
    }

    fn validate(&self, view: &SolvedView<'_>) -> Vec<Violation> {
        let cap = self.cap.unwrap_or_else(|| view.facilities.games_per_day());
        let mut plays: HashMap<(chrono::NaiveDate, usize), usize> = HashMap::new();
        for g in view.games.rows() {
            *plays.entry((g.date, g.home)).or_default() += 1;
            *plays.entry((g.date, g.away)).or_default() += 1;
        }
        let mut over: Vec<_> = plays.into_iter().filter(|&(_, n)| n > cap).collect();
        over.sort_unstable();
        over.into_iter()
            .map(|((date, team), n)| {
                Violation::new(format!("team {team} plays {n} games on {date}, cap {cap}"))
            })
            .collect()
    }
}

/// Every same-division pair meets between `min` and `max` times.
#[derive(Debug, Clone, Copy)]
pub struct HeadToHeadCheck {
    min: usize,
    max: usize,
}

impl HeadToHeadCheck {
    pub fn new(min: usize, max: usize) -> Self {
        Self { min, max }
    }
}

impl Validator for HeadToHeadCheck {
    fn name(&self) -> &str {
        "head-to-head"
    }

    fn validate(&self, view: &SolvedView<'_>) -> Vec<Violation> {
        let f = view.facilities;
        let mut out = Vec::new();
        for d in 0..f.division_count() {
            let teams = f.division_teams(d);
            for a in teams.clone() {
                for b in (a + 1)..teams.end {
                    let n = view.teams.head_to_head(a, b);
                    if n < self.min || n > self.max {
                        out.push(Violation::new(format!(
                            "teams {a} and {b} meet {n} times, expected {}..={}",
                            self.min, self.max
                        )));
                    }
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Assignment, Facilities, FacilitiesConfig, GameReport, TeamReport};

    fn facilities() -> Facilities {
        Facilities::new(
            FacilitiesConfig::new(vec![3, 3])
                .with_games_per_season(1)
                .with_games_per_day(1)
                .with_date("2024-01-06")
                .with_time_slot("18:00", vec![1, 2])
                .with_time_slot("19:00", vec![1]),
        )
        .unwrap()
    }

    fn check<V: Validator>(v: V, assignments: &[Assignment]) -> Vec<Violation> {
        let f = facilities();
        let games = GameReport::build(&f, assignments);
        let teams = TeamReport::from_games(f.total_teams(), &games).unwrap_or_default();
        v.validate(&SolvedView {
            facilities: &f,
            games: &games,
            teams: &teams,
        })
    }

    // match 0: 18:00 court 1, match 1: 18:00 court 2, match 2: 19:00 court 1
    fn good() -> Vec<Assignment> {
        vec![
            Assignment::new(0, 1, 2),
            Assignment::new(3, 4, 5),
            Assignment::new(2, 0, 1),
        ]
    }

    #[test]
    fn test_good_schedule_passes_structural_checks() {
        assert!(check(RolesCheck, &good()).is_empty());
        assert!(check(DoubleBookingCheck, &good()).is_empty());
        assert!(check(DivisionIntegrityCheck, &good()).is_empty());
        assert!(check(RefereeTallyCheck, &good()).is_empty());
    }

    #[test]
    fn test_roles_check_reports_all() {
        let bad = vec![
            Assignment::new(0, 0, 2),
            Assignment::new(3, 4, 9),
            Assignment::new(2, 0, 1),
        ];
        assert_eq!(check(RolesCheck, &bad).len(), 2);
    }

    #[test]
    fn test_double_booking() {
        let bad = vec![
            Assignment::new(0, 1, 2),
            Assignment::new(3, 4, 0),
            Assignment::new(2, 0, 1),
        ];
        let v = check(DoubleBookingCheck, &bad);
        assert_eq!(v.len(), 1);
        assert!(v[0].message.contains("team 0"));
    }

    #[test]
    fn test_division_integrity() {
        let bad = vec![
            Assignment::new(0, 3, 2),
            Assignment::new(3, 4, 5),
            Assignment::new(2, 0, 1),
        ];
        assert_eq!(check(DivisionIntegrityCheck, &bad).len(), 1);
    }

    #[test]
    fn test_play_target_and_daily_cap() {
        // team 0 plays twice on the one date, team 5 never plays
        let v = check(PlayTargetCheck::new(), &good());
        assert_eq!(v.len(), 2);
        assert_eq!(check(PlayTargetCheck::with_target(2), &good()).len(), 5);
        assert_eq!(check(DailyCapCheck::new(), &good()).len(), 1);
        assert!(check(DailyCapCheck::with_cap(2), &good()).is_empty());
    }

    #[test]
    fn test_referee_nearby() {
        // ref 2 at 18:00 plays 19:00; ref 5 at 18:00 idles; ref 1 at 19:00 played 18:00
        let v = check(RefereeNearbyCheck, &good());
        assert_eq!(v.len(), 1);
        assert!(v[0].message.contains("team 5"));
    }

    #[test]
    fn test_head_to_head() {
        // (1,2) never meet in division 0; (3,5) and (4,5) never meet in division 1
        let v = check(HeadToHeadCheck::new(1, 1), &good());
        assert_eq!(v.len(), 3);
        assert!(check(HeadToHeadCheck::new(0, 1), &good()).is_empty());
    }
}
