//! The creator pipeline: build → solve → validate → post-process → report.
//!
//! # States
//!
//! ```text
//! Building → Solving → Failed
//!                    → Solved → Validating → Validated → PostProcessing → Done
//! ```
//!
//! A solve that ends in anything other than `Optimal` or `Feasible` stops
//! the run in `Failed`; that is a normal outcome returned as data, and no
//! validator, post-processor, or reporter runs. Validator violations, on the
//! other hand, are a broken constraint encoding and abort the run with a
//! single [`LeagueError::Validation`] listing all of them.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::component::{Component, PostProcessContext, SolvedView};
use crate::cp::{CpSolver, MilpSolver, SolveStatus, SolverConfig};
use crate::error::{LeagueError, Result, Violation};
use crate::models::{Facilities, FacilitiesConfig};
use crate::schedule::{ObjectiveAccumulator, Schedule};

/// Pipeline state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PipelineState {
    Building,
    Solving,
    /// Terminal: the solve produced no usable assignment.
    Failed,
    Solved,
    Validating,
    Validated,
    PostProcessing,
    /// Terminal: reports rendered.
    Done,
}

impl PipelineState {
    /// Whether `next` directly follows `self`.
    pub fn can_transition_to(self, next: PipelineState) -> bool {
        use PipelineState::*;
        matches!(
            (self, next),
            (Building, Solving)
                | (Solving, Failed)
                | (Solving, Solved)
                | (Solved, Validating)
                | (Validating, Validated)
                | (Validated, PostProcessing)
                | (PostProcessing, Done)
        )
    }

    /// Whether no further transition exists.
    pub fn is_terminal(self) -> bool {
        matches!(self, PipelineState::Failed | PipelineState::Done)
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PipelineState::Building => "building",
            PipelineState::Solving => "solving",
            PipelineState::Failed => "failed",
            PipelineState::Solved => "solved",
            PipelineState::Validating => "validating",
            PipelineState::Validated => "validated",
            PipelineState::PostProcessing => "post-processing",
            PipelineState::Done => "done",
        };
        f.write_str(s)
    }
}

/// Checked state holder.
#[derive(Debug)]
struct Pipeline {
    state: PipelineState,
}

impl Pipeline {
    fn new() -> Self {
        Self {
            state: PipelineState::Building,
        }
    }

    fn advance(&mut self, next: PipelineState) -> Result<()> {
        if !self.state.can_transition_to(next) {
            return Err(LeagueError::IllegalTransition {
                from: self.state.to_string(),
                to: next.to_string(),
            });
        }
        debug!(from = %self.state, to = %next, "pipeline transition");
        self.state = next;
        Ok(())
    }
}

/// Result of one pipeline run.
#[derive(Debug)]
pub struct CreatorRun {
    state: PipelineState,
    status: SolveStatus,
    schedule: Schedule,
    report: String,
}

impl CreatorRun {
    /// `Done` or `Failed`.
    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// Solver status of the run.
    pub fn status(&self) -> SolveStatus {
        self.status
    }

    /// Whether the run reached `Done`.
    pub fn is_done(&self) -> bool {
        self.state == PipelineState::Done
    }

    pub fn schedule(&self) -> &Schedule {
        &self.schedule
    }

    pub fn into_schedule(self) -> Schedule {
        self.schedule
    }

    /// Concatenated reporter output; empty for a failed run.
    pub fn report(&self) -> &str {
        &self.report
    }
}

/// Runs registered components against a facilities instance.
///
/// # Example
/// ```
/// use std::time::Duration;
/// use u_league::component::standard;
/// use u_league::cp::SolverConfig;
/// use u_league::creator::{Creator, PipelineState};
/// use u_league::models::FacilitiesConfig;
///
/// let config = FacilitiesConfig::new(vec![3])
///     .with_games_per_season(2)
///     .with_date("2024-03-02")
///     .with_date("2024-03-09")
///     .with_date("2024-03-16")
///     .with_time_slot("10:00", vec![1]);
///
/// let run = Creator::new()
///     .with_component(standard::core_rules())
///     .with_component(standard::season_target())
///     .with_solver_config(SolverConfig::new().with_time_limit(Duration::from_secs(5)))
///     .run_config(config)
///     .unwrap();
/// assert_eq!(run.state(), PipelineState::Done);
/// ```
pub struct Creator {
    components: Vec<Component>,
    config: SolverConfig,
    solver: Arc<dyn CpSolver>,
}

impl fmt::Debug for Creator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Creator")
            .field("components", &self.components)
            .field("config", &self.config)
            .field("solver", &self.solver.name())
            .finish()
    }
}

impl Default for Creator {
    fn default() -> Self {
        Self::new()
    }
}

impl Creator {
    /// Creates a creator with no components and the built-in solver.
    pub fn new() -> Self {
        Self {
            components: Vec::new(),
            config: SolverConfig::default(),
            solver: Arc::new(MilpSolver::new()),
        }
    }

    /// Registers a component. Components run in registration order.
    pub fn with_component(mut self, component: Component) -> Self {
        self.components.push(component);
        self
    }

    pub fn with_components(mut self, components: impl IntoIterator<Item = Component>) -> Self {
        self.components.extend(components);
        self
    }

    pub fn with_solver_config(mut self, config: SolverConfig) -> Self {
        self.config = config;
        self
    }

    /// Replaces the built-in engine.
    pub fn with_solver(mut self, solver: Arc<dyn CpSolver>) -> Self {
        self.solver = solver;
        self
    }

    pub fn components(&self) -> &[Component] {
        &self.components
    }

    /// Validates a configuration, then runs the pipeline.
    ///
    /// # Errors
    /// [`LeagueError::Config`] before any variable is allocated, otherwise
    /// as [`run`](Self::run).
    pub fn run_config(&self, config: FacilitiesConfig) -> Result<CreatorRun> {
        self.run(Arc::new(Facilities::new(config)?))
    }

    /// Runs the full pipeline.
    ///
    /// # Errors
    /// - [`LeagueError::Validation`] listing every violation of every
    ///   validator.
    /// - Any error a post-processor or reporter returns, including
    ///   [`LeagueError::OverlayConflict`].
    pub fn run(&self, facilities: Arc<Facilities>) -> Result<CreatorRun> {
        let mut pipeline = Pipeline::new();
        info!(
            components = self.components.len(),
            teams = facilities.total_teams(),
            matches = facilities.match_count(),
            "creator run started"
        );

        let mut schedule = Schedule::new(facilities);
        self.build(&mut schedule)?;

        pipeline.advance(PipelineState::Solving)?;
        let status = schedule.solve_with(self.solver.as_ref(), &self.config);
        if !status.is_success() {
            pipeline.advance(PipelineState::Failed)?;
            warn!(%status, "solve failed, pipeline stopped");
            return Ok(CreatorRun {
                state: pipeline.state,
                status,
                schedule,
                report: String::new(),
            });
        }
        pipeline.advance(PipelineState::Solved)?;
        info!(%status, objective = ?schedule.objective_value(), "schedule solved");

        pipeline.advance(PipelineState::Validating)?;
        self.validate(&schedule)?;
        pipeline.advance(PipelineState::Validated)?;

        pipeline.advance(PipelineState::PostProcessing)?;
        for (ci, component) in self.components.iter().enumerate() {
            for (pi, post) in component.post_processors().iter().enumerate() {
                // registration identity; names alone may repeat
                let owner = format!("{}#{ci}:{}#{pi}", component.name(), post.name());
                debug!(%owner, "post-processing");
                post.process(&mut PostProcessContext::new(&owner, &mut schedule))?;
            }
        }

        let report = self.render(&schedule)?;
        pipeline.advance(PipelineState::Done)?;
        info!(overlay = schedule.overlay().len(), "creator run done");

        Ok(CreatorRun {
            state: pipeline.state,
            status,
            schedule,
            report,
        })
    }

    fn build(&self, schedule: &mut Schedule) -> Result<()> {
        let mut objective = ObjectiveAccumulator::new();
        {
            let mut ctx = schedule.model_context();
            for component in &self.components {
                for constraint in component.constraints() {
                    let before = ctx.constraint_count();
                    constraint.apply(&mut ctx);
                    debug!(
                        component = component.name(),
                        constraint = constraint.name(),
                        posted = ctx.constraint_count() - before,
                        "constraint applied"
                    );
                }
                for optimizer in component.optimizers() {
                    optimizer.contribute(&mut ctx, &mut objective);
                    debug!(component = component.name(), optimizer = optimizer.name(), "objective terms added");
                }
            }
        }
        if let Some(expr) = objective.into_objective() {
            schedule.minimize(expr)?;
        }
        Ok(())
    }

    fn validate(&self, schedule: &Schedule) -> Result<()> {
        let view = SolvedView {
            facilities: schedule.facilities(),
            games: schedule.game_report()?,
            teams: schedule.team_report()?,
        };
        let mut violations: Vec<Violation> = Vec::new();
        for component in &self.components {
            for validator in component.validators() {
                violations.extend(
                    validator
                        .validate(&view)
                        .into_iter()
                        .map(|v| v.tagged(component.name(), validator.name())),
                );
            }
        }
        if violations.is_empty() {
            Ok(())
        } else {
            warn!(count = violations.len(), "validation failed");
            Err(LeagueError::Validation { violations })
        }
    }

    fn render(&self, schedule: &Schedule) -> Result<String> {
        let mut out = String::new();
        for component in &self.components {
            if component.reporters().is_empty() {
                continue;
            }
            out.push_str(&format!("== {} ==\n", component.name()));
            for reporter in component.reporters() {
                out.push_str(&reporter.report(schedule)?);
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::standard;
    use crate::models::Assignment;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;

    fn solver_config() -> SolverConfig {
        SolverConfig::new().with_time_limit(Duration::from_secs(10))
    }

    /// Divisions of 10, 10 and 8 playing six games each: 84 match slots
    /// over three weekends of seven times on four courts.
    fn scenario_a() -> FacilitiesConfig {
        let mut config = FacilitiesConfig::new(vec![10, 10, 8])
            .with_games_per_season(6)
            .with_date("2024-03-02")
            .with_date("2024-03-09")
            .with_date("2024-03-16");
        for hour in 12..19 {
            config = config.with_time_slot(format!("{hour}:00"), vec![1, 2, 3, 4]);
        }
        config
    }

    /// Two divisions of three on two courts at one time: one game per
    /// division each weekend.
    fn small_league() -> FacilitiesConfig {
        FacilitiesConfig::new(vec![3, 3])
            .with_date("2024-03-02")
            .with_date("2024-03-09")
            .with_time_slot("18:00", vec![1, 2])
    }

    /// Three teams, one slot per week for three weeks.
    fn three_slots() -> FacilitiesConfig {
        FacilitiesConfig::new(vec![3])
            .with_date("2024-03-02")
            .with_date("2024-03-09")
            .with_date("2024-03-16")
            .with_time_slot("10:00", vec![1])
    }

    #[test]
    fn test_transitions() {
        use PipelineState::*;
        assert!(Building.can_transition_to(Solving));
        assert!(Solving.can_transition_to(Failed));
        assert!(!Building.can_transition_to(Validating));
        assert!(!Failed.can_transition_to(Validating));
        assert!(!Done.can_transition_to(Building));
        assert!(Done.is_terminal() && Failed.is_terminal());

        let mut p = Pipeline::new();
        let err = p.advance(PostProcessing).unwrap_err();
        assert!(matches!(err, LeagueError::IllegalTransition { .. }));
        assert_eq!(p.state, Building);
    }

    #[test]
    fn test_scenario_a_play_target_and_referee_tally() {
        let run = Creator::new()
            .with_component(standard::core_rules())
            .with_component(standard::season_target())
            .with_solver_config(SolverConfig::new().with_time_limit(Duration::from_secs(120)))
            .run_config(scenario_a())
            .unwrap();
        assert!(run.is_done());
        assert!(run.status().is_success());

        let s = run.schedule();
        assert_eq!(s.facilities().match_count(), 84);
        let teams = s.team_report().unwrap();
        assert_eq!(teams.rows().len(), 28);
        for row in teams.rows() {
            assert_eq!(row.total_play, 6);
        }
        assert_eq!(teams.total_refs(), 84);
    }

    #[test]
    fn test_scenario_b_zero_teams() {
        let err = Creator::new()
            .with_component(standard::core_rules())
            .run_config(FacilitiesConfig::new(vec![0]))
            .unwrap_err();
        assert!(matches!(err, LeagueError::Config { .. }));
    }

    #[test]
    fn test_scenario_c_infeasible_stops_pipeline() {
        static VALIDATED: AtomicBool = AtomicBool::new(false);
        static POST_PROCESSED: AtomicBool = AtomicBool::new(false);

        let watcher = Component::new("watcher")
            .with_validator_fn("flag", |_| {
                VALIDATED.store(true, Ordering::SeqCst);
                Vec::new()
            })
            .with_post_processor_fn("flag", |_| {
                POST_PROCESSED.store(true, Ordering::SeqCst);
                Ok(())
            })
            .with_reporter_fn("never", |_| Ok("unreachable".to_string()));

        let run = Creator::new()
            .with_component(standard::head_to_head(2, 3))
            .with_component(watcher)
            .with_solver_config(solver_config())
            .run_config(three_slots())
            .unwrap();

        assert_eq!(run.state(), PipelineState::Failed);
        assert_eq!(run.status(), SolveStatus::Infeasible);
        assert!(run.report().is_empty());
        assert!(!VALIDATED.load(Ordering::SeqCst));
        assert!(!POST_PROCESSED.load(Ordering::SeqCst));
        assert!(matches!(run.schedule().game_report(), Err(LeagueError::NotSolved)));
    }

    #[test]
    fn test_validation_aggregates_all_violations() {
        let a = Component::new("a").with_validator_fn("two", |_| {
            vec![Violation::new("first"), Violation::new("second")]
        });
        let b = Component::new("b").with_validator_fn("one", |_| vec![Violation::new("third")]);

        let err = Creator::new()
            .with_component(a)
            .with_component(b)
            .with_solver_config(solver_config())
            .run_config(three_slots())
            .unwrap_err();

        let LeagueError::Validation { violations } = err else {
            panic!("expected validation error, got {err:?}");
        };
        assert_eq!(violations.len(), 3);
        assert_eq!((violations[0].component.as_str(), violations[0].validator.as_str()), ("a", "two"));
        assert_eq!(violations[2].component, "b");
        assert_eq!(violations[2].message, "third");
    }

    #[test]
    fn test_court_ordering_twice_is_stable() {
        let once = Creator::new()
            .with_component(standard::core_rules())
            .with_component(standard::court_ordering())
            .with_solver_config(solver_config())
            .run_config(small_league())
            .unwrap();
        let twice = Creator::new()
            .with_component(standard::core_rules())
            .with_component(standard::court_ordering())
            .with_component(standard::court_ordering())
            .with_solver_config(solver_config())
            .run_config(small_league())
            .unwrap();

        assert!(once.is_done() && twice.is_done());
        assert_eq!(
            once.schedule().game_report().unwrap(),
            twice.schedule().game_report().unwrap()
        );
    }

    fn rewrite_first_match(ctx: &mut PostProcessContext<'_>) -> Result<()> {
        let current = ctx.assignment(0)?;
        ctx.assign(0, current)
    }

    fn invent_first_match(ctx: &mut PostProcessContext<'_>) -> Result<()> {
        ctx.assign(0, Assignment::new(7, 7, 99))
    }

    #[test]
    fn test_overlay_conflict_between_post_processors() {
        let err = Creator::new()
            .with_component(Component::new("first").with_post_processor_fn("p1", rewrite_first_match))
            .with_component(Component::new("second").with_post_processor_fn("p2", rewrite_first_match))
            .with_solver_config(solver_config())
            .run_config(three_slots())
            .unwrap_err();
        assert_eq!(
            err,
            LeagueError::OverlayConflict {
                match_id: 0,
                owner: "second#1:p2#0".into(),
                previous: "first#0:p1#0".into(),
            }
        );
    }

    #[test]
    fn test_same_named_post_processors_still_conflict() {
        let err = Creator::new()
            .with_component(Component::new("a").with_post_processor_fn("p", rewrite_first_match))
            .with_component(Component::new("b").with_post_processor_fn("p", rewrite_first_match))
            .with_solver_config(solver_config())
            .run_config(three_slots())
            .unwrap_err();
        assert!(matches!(
            err,
            LeagueError::OverlayConflict { match_id: 0, ref owner, ref previous }
                if owner == "b#1:p#0" && previous == "a#0:p#0"
        ));

        let same_component = Component::new("a")
            .with_post_processor_fn("p", rewrite_first_match)
            .with_post_processor_fn("p", rewrite_first_match);
        let err = Creator::new()
            .with_component(same_component)
            .with_solver_config(solver_config())
            .run_config(three_slots())
            .unwrap_err();
        assert!(matches!(err, LeagueError::OverlayConflict { match_id: 0, .. }));
    }

    #[test]
    fn test_post_processor_cannot_invent_games() {
        let err = Creator::new()
            .with_component(standard::core_rules())
            .with_component(Component::new("rogue").with_post_processor_fn("invent", invent_first_match))
            .with_solver_config(solver_config())
            .run_config(three_slots())
            .unwrap_err();
        assert_eq!(
            err,
            LeagueError::OverlayNotPermutation {
                match_id: 0,
                assignment: Assignment::new(7, 7, 99),
            }
        );
    }

    #[test]
    fn test_reports_headed_by_component() {
        let run = Creator::new()
            .with_component(standard::core_rules())
            .with_component(standard::debug_reports())
            .with_solver_config(solver_config())
            .run_config(three_slots())
            .unwrap();
        assert!(run.is_done());
        assert!(run.report().starts_with("== reports ==\n"));
        assert!(run.report().contains("week_idx: 0"));
        assert!(run.report().contains("team 02"));
    }
}
