//! Relations between decision variables.
//!
//! [`MatchRelation`] relates two roles of the same match (for example,
//! the referee comes from the home team's division). [`InstantImplication`]
//! relates two per-(instant, team) indicators (for example, a team that
//! referees at an instant plays right before or after it).

use serde::{Deserialize, Serialize};

use super::ScheduleConstraint;
use crate::cp::{BoolVar, LinearExpr};
use crate::models::Team;
use crate::schedule::{InstantTeamVars, MatchTeamVars, ModelContext};

/// A role within a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Home,
    Away,
    Referee,
}

impl Role {
    fn indicator(self, vars: MatchTeamVars) -> BoolVar {
        match self {
            Role::Home => vars.is_home,
            Role::Away => vars.is_away,
            Role::Referee => vars.is_ref,
        }
    }
}

/// How two roles relate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RoleRelation {
    /// Both roles are held by teams of one division.
    SameDivision,
    /// The roles are held by teams of different divisions.
    DifferentDivision,
}

/// Relates two roles in every match.
///
/// Encoded per (match, team `t`): `role_a = t ⇒ Σ role_b over the
/// forbidden teams ≤ 0`, where the forbidden teams are those outside (or
/// inside) `t`'s division.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchRelation {
    name: String,
    a: Role,
    b: Role,
    relation: RoleRelation,
}

impl MatchRelation {
    pub fn new(a: Role, b: Role, relation: RoleRelation) -> Self {
        Self {
            name: format!("{b:?}-{relation:?}-as-{a:?}").to_lowercase(),
            a,
            b,
            relation,
        }
    }

    /// The away team plays in the home team's division.
    pub fn away_in_home_division() -> Self {
        Self::new(Role::Home, Role::Away, RoleRelation::SameDivision).with_name("away-division")
    }

    /// The referee comes from the home team's division.
    pub fn referee_in_home_division() -> Self {
        Self::new(Role::Home, Role::Referee, RoleRelation::SameDivision)
            .with_name("referee-division")
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

impl ScheduleConstraint for MatchRelation {
    fn name(&self) -> &str {
        &self.name
    }

    fn apply(&self, ctx: &mut ModelContext<'_>) {
        let facilities = ctx.facilities();
        let vars = ctx.vars();
        let teams = facilities.total_teams();
        for m in 0..facilities.match_count() {
            for t in 0..teams {
                let forbidden: Vec<Team> = (0..teams)
                    .filter(|&o| match self.relation {
                        RoleRelation::SameDivision => !facilities.same_division(t, o),
                        RoleRelation::DifferentDivision => facilities.same_division(t, o),
                    })
                    .collect();
                if forbidden.is_empty() {
                    continue;
                }
                let guard = self.a.indicator(vars.match_team(m, t));
                let others =
                    LinearExpr::sum_lits(forbidden.iter().map(|&o| self.b.indicator(vars.match_team(m, o))));
                ctx.add_linear_if(others, i64::MIN, 0, &[guard.lit()]);
            }
        }
    }
}

/// A per-(instant, team) indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InstantIndicator {
    Busy,
    Playing,
    Reffing,
    PlayingAround,
}

impl InstantIndicator {
    fn of(self, vars: InstantTeamVars) -> BoolVar {
        match self {
            InstantIndicator::Busy => vars.busy,
            InstantIndicator::Playing => vars.playing,
            InstantIndicator::Reffing => vars.reffing,
            InstantIndicator::PlayingAround => vars.playing_around,
        }
    }
}

/// Posts `premise ⇒ conclusion` for every instant and team.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstantImplication {
    name: String,
    premise: InstantIndicator,
    conclusion: InstantIndicator,
}

impl InstantImplication {
    pub fn new(premise: InstantIndicator, conclusion: InstantIndicator) -> Self {
        Self {
            name: format!("{premise:?}-implies-{conclusion:?}").to_lowercase(),
            premise,
            conclusion,
        }
    }

    /// A team referees only right before or after one of its own games.
    pub fn referee_nearby() -> Self {
        Self::new(InstantIndicator::Reffing, InstantIndicator::PlayingAround)
            .with_name("referee-nearby")
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

impl ScheduleConstraint for InstantImplication {
    fn name(&self) -> &str {
        &self.name
    }

    fn apply(&self, ctx: &mut ModelContext<'_>) {
        let facilities = ctx.facilities();
        let vars = ctx.vars();
        for instant in facilities.instants() {
            for t in 0..facilities.total_teams() {
                let it = vars.instant_team(instant.id, t);
                ctx.add_implication(self.premise.of(it), self.conclusion.of(it));
            }
        }
    }
}
