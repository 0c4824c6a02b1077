//! Schedule: variables, solve, and cached reports.
//!
//! A [`Schedule`] is built once per solve attempt. Construction allocates
//! the complete variable set (see [`ScheduleVars`]); components then add
//! constraints through a [`ModelContext`], a single objective may be set,
//! and [`Schedule::solve`] fixes values. Reports are derived lazily from
//! the solved values, with the reassignment overlay taking precedence.
//!
//! # Lifecycle
//! ```text
//! new ──► model_context()* ──► minimize()? ──► solve() ──► game_report() / team_report()
//!                                                    └──► overlay_assign()* (invalidates reports)
//! ```

mod context;
mod objective;
mod vars;

pub use context::ModelContext;
pub use objective::ObjectiveAccumulator;
pub use vars::{InstantTeamVars, MatchTeamVars, MatchVars, ScheduleVars, WeekendTeamVars};

use std::cell::OnceCell;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::cp::{BoolVar, CpModel, CpSolution, CpSolver, IntVar, LinearExpr, MilpSolver, SolveStatus, SolverConfig};
use crate::error::{LeagueError, Result};
use crate::models::{Assignment, Facilities, FacilitiesConfig, GameReport, Overlay, TeamReport};

/// One solve attempt over a facilities instance.
///
/// Single-owner: the report caches are not thread-safe, so `Schedule` is
/// `Send` but not `Sync`.
#[derive(Debug)]
pub struct Schedule {
    facilities: Arc<Facilities>,
    model: CpModel,
    vars: ScheduleVars,
    objective_set: bool,
    solution: Option<CpSolution>,
    overlay: Overlay,
    games: OnceCell<GameReport>,
    teams: OnceCell<TeamReport>,
}

impl Schedule {
    /// Allocates every decision and derived variable.
    pub fn new(facilities: Arc<Facilities>) -> Self {
        let mut model = CpModel::new("league");
        let vars = ScheduleVars::build(&facilities, &mut model);
        debug!(
            matches = facilities.match_count(),
            teams = facilities.total_teams(),
            vars = model.var_count(),
            constraints = model.constraint_count(),
            "schedule variables built"
        );
        Self {
            facilities,
            model,
            vars,
            objective_set: false,
            solution: None,
            overlay: Overlay::new(),
            games: OnceCell::new(),
            teams: OnceCell::new(),
        }
    }

    /// Validates a configuration, builds facilities, and allocates the
    /// schedule.
    ///
    /// # Errors
    /// [`LeagueError::Config`] before any variable is allocated.
    pub fn from_config(config: FacilitiesConfig) -> Result<Self> {
        Ok(Self::new(Arc::new(Facilities::new(config)?)))
    }

    pub fn facilities(&self) -> &Arc<Facilities> {
        &self.facilities
    }

    pub fn vars(&self) -> &ScheduleVars {
        &self.vars
    }

    /// The underlying constraint model.
    pub fn model(&self) -> &CpModel {
        &self.model
    }

    /// Context for constraint and optimizer functions.
    pub fn model_context(&mut self) -> ModelContext<'_> {
        ModelContext::new(&self.facilities, &self.vars, &mut self.model)
    }

    /// Sets the minimization objective.
    ///
    /// # Errors
    /// [`LeagueError::ObjectiveAlreadySet`] on a second call.
    pub fn minimize(&mut self, expr: LinearExpr) -> Result<()> {
        if self.objective_set {
            return Err(LeagueError::ObjectiveAlreadySet);
        }
        self.objective_set = true;
        self.model.minimize(expr);
        Ok(())
    }

    /// Solves with the built-in engine.
    pub fn solve(&mut self, config: &SolverConfig) -> SolveStatus {
        self.solve_with(&MilpSolver::new(), config)
    }

    /// Solves with any engine. Never errors: infeasibility and timeouts are
    /// statuses. A new solve discards the previous assignment, the overlay,
    /// and cached reports.
    pub fn solve_with(&mut self, solver: &dyn CpSolver, config: &SolverConfig) -> SolveStatus {
        info!(
            solver = solver.name(),
            time_limit_ms = config.time_limit.as_millis() as u64,
            "solving schedule"
        );
        let solution = solver.solve(&self.model, config);
        let status = solution.status;
        if !status.is_success() {
            warn!(%status, "schedule solve did not produce an assignment");
        }
        self.solution = Some(solution);
        self.overlay = Overlay::new();
        self.invalidate_reports();
        status
    }

    /// Status of the last solve, if any.
    pub fn status(&self) -> Option<SolveStatus> {
        self.solution.as_ref().map(|s| s.status)
    }

    /// Whether the last solve produced an assignment.
    pub fn is_solved(&self) -> bool {
        self.solution.as_ref().is_some_and(CpSolution::is_solution_found)
    }

    /// Objective value of the solved assignment.
    pub fn objective_value(&self) -> Option<i64> {
        self.solved().ok().and_then(|s| s.objective)
    }

    /// Full solver result of the last solve.
    pub fn solution(&self) -> Option<&CpSolution> {
        self.solution.as_ref()
    }

    /// Solved value of an integer variable.
    pub fn value(&self, var: IntVar) -> Option<i64> {
        self.solved().ok().and_then(|s| s.value(var))
    }

    /// Solved value of a boolean variable.
    pub fn bool_value(&self, var: BoolVar) -> Option<bool> {
        self.solved().ok().and_then(|s| s.bool_value(var))
    }

    /// Raw solved assignment of a match, ignoring the overlay.
    ///
    /// # Errors
    /// [`LeagueError::NotSolved`] or [`LeagueError::UnknownMatch`].
    pub fn solved_assignment(&self, match_id: usize) -> Result<Assignment> {
        let solution = self.solved()?;
        let mv = self
            .vars
            .matches()
            .get(match_id)
            .ok_or(LeagueError::UnknownMatch(match_id))?;
        let team = |var: IntVar| {
            solution
                .value(var)
                .and_then(|v| usize::try_from(v).ok())
                .ok_or(LeagueError::NotSolved)
        };
        Ok(Assignment::new(team(mv.home)?, team(mv.away)?, team(mv.referee)?))
    }

    /// Current assignment of a match: the overlay entry if present, the
    /// solved values otherwise.
    pub fn assignment(&self, match_id: usize) -> Result<Assignment> {
        match self.overlay.get(match_id) {
            Some(a) => Ok(*a),
            None => self.solved_assignment(match_id),
        }
    }

    /// Game Report of the current (overlay-adjusted) schedule.
    ///
    /// # Errors
    /// [`LeagueError::NotSolved`] before a successful solve.
    pub fn game_report(&self) -> Result<&GameReport> {
        self.solved()?;
        if let Some(report) = self.games.get() {
            return Ok(report);
        }
        let assignments = (0..self.facilities.match_count())
            .map(|m| self.assignment(m))
            .collect::<Result<Vec<_>>>()?;
        Ok(self
            .games
            .get_or_init(|| GameReport::build(&self.facilities, &assignments)))
    }

    /// Team Report of the current (overlay-adjusted) schedule.
    ///
    /// # Errors
    /// [`LeagueError::NotSolved`] before a successful solve.
    pub fn team_report(&self) -> Result<&TeamReport> {
        if let Some(report) = self.teams.get() {
            return Ok(report);
        }
        let report = TeamReport::from_games(self.facilities.total_teams(), self.game_report()?)?;
        Ok(self.teams.get_or_init(|| report))
    }

    /// Rewrites the reported assignment of one match and invalidates both
    /// report caches.
    ///
    /// The new triple must be one of the solved games at the same instant:
    /// post-processing rearranges validated games, it never invents them.
    ///
    /// # Errors
    /// - [`LeagueError::NotSolved`] before a successful solve
    /// - [`LeagueError::UnknownMatch`] for an id outside the slot list
    /// - [`LeagueError::OverlayNotPermutation`] for a triple not solved at
    ///   the match's instant
    /// - [`LeagueError::OverlayConflict`] when another post-processor
    ///   already rewrote this match
    pub fn overlay_assign(&mut self, owner: &str, match_id: usize, assignment: Assignment) -> Result<()> {
        self.solved()?;
        let slot = self
            .facilities
            .match_slots()
            .get(match_id)
            .ok_or(LeagueError::UnknownMatch(match_id))?;
        let siblings = self
            .facilities
            .instants()
            .get(slot.instant)
            .map(|i| i.matches.as_slice())
            .unwrap_or_default();
        let mut validated = false;
        for &m in siblings {
            if self.solved_assignment(m)? == assignment {
                validated = true;
                break;
            }
        }
        if !validated {
            return Err(LeagueError::OverlayNotPermutation { match_id, assignment });
        }
        self.overlay.insert(owner, match_id, assignment)?;
        self.invalidate_reports();
        Ok(())
    }

    /// The reassignment overlay.
    pub fn overlay(&self) -> &Overlay {
        &self.overlay
    }

    fn invalidate_reports(&mut self) {
        self.games.take();
        self.teams.take();
    }

    fn solved(&self) -> Result<&CpSolution> {
        self.solution
            .as_ref()
            .filter(|s| s.is_solution_found())
            .ok_or(LeagueError::NotSolved)
    }
}
