//! Decision and derived variable tables.
//!
//! Built exactly once per schedule. Every derived indicator is wired to
//! its defining expression with a full equivalence (both directions), so a
//! constraint written against an indicator constrains the underlying
//! assignment and vice versa:
//!
//! | table | entry | definition |
//! |-------|-------|------------|
//! | match | `home`, `away`, `referee` | team ids, pairwise distinct |
//! | match × team | `is_home` | `home = t` |
//! | | `is_away` | `away = t` |
//! | | `is_ref` | `referee = t` |
//! | | `is_playing` | `is_home ∨ is_away` |
//! | | `is_busy` | `is_playing ∨ is_ref` |
//! | instant × team | `busy_count` | `Σ is_busy` over the instant's matches |
//! | | `busy` | `busy_count ≥ 1` |
//! | | `playing` | `∨ is_playing` |
//! | | `reffing` | `∨ is_ref` |
//! | | `playing_around` | `∨ playing` over adjacent instants |
//! | weekend × team | `games` | `Σ is_playing` over the weekend's matches |
//! | | `busy_count` | `Σ is_busy` over the weekend's matches |

use crate::cp::{BoolVar, CpModel, IntVar, LinearExpr, Lit};
use crate::models::{Facilities, Team};

/// Role variables of one match slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchVars {
    pub home: IntVar,
    pub away: IntVar,
    pub referee: IntVar,
}

/// Indicators of one (match, team) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchTeamVars {
    pub is_home: BoolVar,
    pub is_away: BoolVar,
    pub is_ref: BoolVar,
    pub is_playing: BoolVar,
    pub is_busy: BoolVar,
}

/// Indicators of one (instant, team) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InstantTeamVars {
    pub busy_count: IntVar,
    pub busy: BoolVar,
    pub playing: BoolVar,
    pub reffing: BoolVar,
    pub playing_around: BoolVar,
}

/// Aggregates of one (weekend, team) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeekendTeamVars {
    pub games: IntVar,
    pub busy_count: IntVar,
}

/// Read-only variable tables of a schedule.
#[derive(Debug, Clone)]
pub struct ScheduleVars {
    total_teams: usize,
    matches: Vec<MatchVars>,
    match_team: Vec<MatchTeamVars>,
    instant_team: Vec<InstantTeamVars>,
    weekend_team: Vec<WeekendTeamVars>,
}

impl ScheduleVars {
    /// Allocates every table and posts its defining constraints.
    pub(crate) fn build(facilities: &Facilities, model: &mut CpModel) -> Self {
        let teams = facilities.total_teams();
        let top = teams as i64 - 1;

        let mut matches = Vec::with_capacity(facilities.match_count());
        let mut match_team = Vec::with_capacity(facilities.match_count() * teams);
        for slot in facilities.match_slots() {
            let m = slot.id;
            let mv = MatchVars {
                home: model.new_int_var(0, top, format!("home[{m}]")),
                away: model.new_int_var(0, top, format!("away[{m}]")),
                referee: model.new_int_var(0, top, format!("ref[{m}]")),
            };
            model.add_all_different(&[mv.home, mv.away, mv.referee]);

            let (mut homes, mut aways, mut refs) = (Vec::new(), Vec::new(), Vec::new());
            for t in 0..teams {
                let is_home = model.new_bool_var(format!("is_home[{m},{t}]"));
                let is_away = model.new_bool_var(format!("is_away[{m},{t}]"));
                let is_ref = model.new_bool_var(format!("is_ref[{m},{t}]"));
                let is_playing = model.new_bool_var(format!("is_playing[{m},{t}]"));
                let is_busy = model.new_bool_var(format!("is_busy[{m},{t}]"));
                model.add_value_equivalence(is_home, mv.home, t as i64);
                model.add_value_equivalence(is_away, mv.away, t as i64);
                model.add_value_equivalence(is_ref, mv.referee, t as i64);
                model.add_or_equivalence(is_playing, &[is_home.lit(), is_away.lit()]);
                model.add_or_equivalence(is_busy, &[is_playing.lit(), is_ref.lit()]);
                homes.push(is_home);
                aways.push(is_away);
                refs.push(is_ref);
                match_team.push(MatchTeamVars {
                    is_home,
                    is_away,
                    is_ref,
                    is_playing,
                    is_busy,
                });
            }
            // Exactly one team per role.
            model.add_eq(LinearExpr::sum_lits(homes), 1);
            model.add_eq(LinearExpr::sum_lits(aways), 1);
            model.add_eq(LinearExpr::sum_lits(refs), 1);
            matches.push(mv);
        }

        let at = |m: usize, t: Team| match_team[m * teams + t];

        let mut instant_team = Vec::with_capacity(facilities.instants().len() * teams);
        for instant in facilities.instants() {
            let i = instant.id;
            let cap = instant.matches.len() as i64;
            for t in 0..teams {
                let busy_count = model.new_int_var(0, cap, format!("busy_count[{i},{t}]"));
                let busy = model.new_bool_var(format!("busy[{i},{t}]"));
                let playing = model.new_bool_var(format!("playing[{i},{t}]"));
                let reffing = model.new_bool_var(format!("reffing[{i},{t}]"));
                let playing_around = model.new_bool_var(format!("playing_around[{i},{t}]"));

                let busy_sum = LinearExpr::sum_lits(instant.matches.iter().map(|&m| at(m, t).is_busy));
                model.add_eq(busy_sum.with_int(busy_count, -1), 0);
                model.add_at_least_equivalence(busy, LinearExpr::sum_ints([busy_count]), 1);
                let plays: Vec<Lit> = instant.matches.iter().map(|&m| at(m, t).is_playing.lit()).collect();
                let reffs: Vec<Lit> = instant.matches.iter().map(|&m| at(m, t).is_ref.lit()).collect();
                model.add_or_equivalence(playing, &plays);
                model.add_or_equivalence(reffing, &reffs);

                instant_team.push(InstantTeamVars {
                    busy_count,
                    busy,
                    playing,
                    reffing,
                    playing_around,
                });
            }
        }
        // Second pass: neighbours' `playing` now exists.
        for instant in facilities.instants() {
            for t in 0..teams {
                let around: Vec<Lit> = instant
                    .neighbours()
                    .map(|n| instant_team[n * teams + t].playing.lit())
                    .collect();
                let target = instant_team[instant.id * teams + t].playing_around;
                model.add_or_equivalence(target, &around);
            }
        }

        let mut weekend_team = Vec::with_capacity(facilities.weekend_count() * teams);
        for w in 0..facilities.weekend_count() {
            let ids = facilities.weekend_matches(w);
            let cap = ids.len() as i64;
            for t in 0..teams {
                let games = model.new_int_var(0, cap, format!("games[{w},{t}]"));
                let busy_count = model.new_int_var(0, cap, format!("weekend_busy[{w},{t}]"));
                let plays = LinearExpr::sum_lits(ids.iter().map(|&m| at(m, t).is_playing));
                model.add_eq(plays.with_int(games, -1), 0);
                let busy = LinearExpr::sum_lits(ids.iter().map(|&m| at(m, t).is_busy));
                model.add_eq(busy.with_int(busy_count, -1), 0);
                weekend_team.push(WeekendTeamVars { games, busy_count });
            }
        }

        Self {
            total_teams: teams,
            matches,
            match_team,
            instant_team,
            weekend_team,
        }
    }

    /// Number of teams the tables are sized for.
    pub fn total_teams(&self) -> usize {
        self.total_teams
    }

    /// Role variables of every match, indexed by match id.
    pub fn matches(&self) -> &[MatchVars] {
        &self.matches
    }

    /// Role variables of one match.
    ///
    /// # Panics
    /// If `match_id` is out of range.
    #[inline]
    pub fn match_vars(&self, match_id: usize) -> MatchVars {
        self.matches[match_id]
    }

    #[inline]
    pub fn match_team(&self, match_id: usize, team: Team) -> MatchTeamVars {
        self.match_team[match_id * self.total_teams + team]
    }

    #[inline]
    pub fn instant_team(&self, instant: usize, team: Team) -> InstantTeamVars {
        self.instant_team[instant * self.total_teams + team]
    }

    #[inline]
    pub fn weekend_team(&self, weekend: usize, team: Team) -> WeekendTeamVars {
        self.weekend_team[weekend * self.total_teams + team]
    }
}
