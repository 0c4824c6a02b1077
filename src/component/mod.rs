//! Components: the extension point of the scheduler.
//!
//! A [`Component`] is a named bundle of five independently typed function
//! collections, applied by the [`Creator`](crate::creator::Creator) at
//! fixed points of the pipeline:
//!
//! | kind | runs | access |
//! |------|------|--------|
//! | [`ScheduleConstraint`] | before solving | add-only model |
//! | [`Optimizer`] | before solving | add-only model + append-only objective |
//! | [`Validator`] | after solving, before post-processing | read-only reports |
//! | [`PostProcessor`] | after validation | overlay writes |
//! | [`Reporter`] | at the end | read-only schedule |
//!
//! Two components combine by concatenating their lists in registration
//! order ([`Component::extend`]).
//!
//! # Usage
//!
//! ```
//! use u_league::component::{standard, Component};
//!
//! let rules = standard::core_rules()
//!     .merged(standard::season_target())
//!     .merged(Component::new("custom").with_validator_fn("nothing", |_| Vec::new()));
//! assert_eq!(rules.validators().len(), 6);
//! ```

mod checks;
mod court_order;
mod head_to_head;
mod penalty;
mod relation;
mod reporters;
pub mod standard;
mod window;

pub use checks::{
    DailyCapCheck, DivisionIntegrityCheck, DoubleBookingCheck, HeadToHeadCheck, PlayTargetCheck,
    RefereeNearbyCheck, RefereeTallyCheck, RolesCheck,
};
pub use court_order::CourtOrdering;
pub use head_to_head::HeadToHeadBound;
pub use penalty::{IdleWaitPenalty, Outcome, OutcomePenalty};
pub use relation::{InstantImplication, InstantIndicator, MatchRelation, Role, RoleRelation};
pub use reporters::{KpiReporter, ScheduleTextReporter, TeamSummaryReporter};
pub use window::{Metric, Window, WindowBound};

use std::fmt;
use std::sync::Arc;

use crate::error::{Result, Violation};
use crate::models::{Assignment, Facilities, GameReport, TeamReport};
use crate::schedule::{ModelContext, ObjectiveAccumulator, Schedule};

/// Adds restrictions to the model before solving.
pub trait ScheduleConstraint: Send + Sync {
    fn name(&self) -> &str;

    /// Posts constraints. May create component-scoped helper variables.
    fn apply(&self, ctx: &mut ModelContext<'_>);
}

/// Contributes weighted terms to the objective before solving.
pub trait Optimizer: Send + Sync {
    fn name(&self) -> &str;

    /// Appends objective terms; may create indicator variables.
    fn contribute(&self, ctx: &mut ModelContext<'_>, objective: &mut ObjectiveAccumulator);
}

/// Checks an invariant of the solved schedule.
pub trait Validator: Send + Sync {
    fn name(&self) -> &str;

    /// Returns every violation found; empty means the invariant holds.
    fn validate(&self, view: &SolvedView<'_>) -> Vec<Violation>;
}

/// Rewrites reported assignments through the overlay.
pub trait PostProcessor: Send + Sync {
    fn name(&self) -> &str;

    fn process(&self, ctx: &mut PostProcessContext<'_>) -> Result<()>;
}

/// Renders human-readable text about a solved schedule.
pub trait Reporter: Send + Sync {
    fn name(&self) -> &str;

    fn report(&self, schedule: &Schedule) -> Result<String>;
}

/// Read-only view handed to validators.
#[derive(Debug, Clone, Copy)]
pub struct SolvedView<'a> {
    pub facilities: &'a Facilities,
    pub games: &'a GameReport,
    pub teams: &'a TeamReport,
}

/// Overlay access handed to a post-processor. Writes are attributed to the
/// post-processor's registration identity.
pub struct PostProcessContext<'a> {
    owner: &'a str,
    schedule: &'a mut Schedule,
}

impl<'a> PostProcessContext<'a> {
    pub(crate) fn new(owner: &'a str, schedule: &'a mut Schedule) -> Self {
        Self { owner, schedule }
    }

    pub fn facilities(&self) -> &Arc<Facilities> {
        self.schedule.facilities()
    }

    /// The current (possibly already rewritten) Game Report.
    pub fn games(&self) -> Result<&GameReport> {
        self.schedule.game_report()
    }

    /// Current assignment of one match.
    pub fn assignment(&self, match_id: usize) -> Result<Assignment> {
        self.schedule.assignment(match_id)
    }

    /// Rewrites a match's reported assignment.
    pub fn assign(&mut self, match_id: usize, assignment: Assignment) -> Result<()> {
        self.schedule.overlay_assign(self.owner, match_id, assignment)
    }
}

/// A named bundle of constraint, optimizer, validator, post-processor, and
/// reporter functions.
#[derive(Clone, Default)]
pub struct Component {
    name: String,
    constraints: Vec<Arc<dyn ScheduleConstraint>>,
    optimizers: Vec<Arc<dyn Optimizer>>,
    validators: Vec<Arc<dyn Validator>>,
    post_processors: Vec<Arc<dyn PostProcessor>>,
    reporters: Vec<Arc<dyn Reporter>>,
}

impl fmt::Debug for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn names<T: ?Sized>(items: &[Arc<T>], name: impl Fn(&T) -> &str) -> Vec<&str> {
            items.iter().map(|i| name(i.as_ref())).collect()
        }
        f.debug_struct("Component")
            .field("name", &self.name)
            .field("constraints", &names(&self.constraints, |c| c.name()))
            .field("optimizers", &names(&self.optimizers, |o| o.name()))
            .field("validators", &names(&self.validators, |v| v.name()))
            .field("post_processors", &names(&self.post_processors, |p| p.name()))
            .field("reporters", &names(&self.reporters, |r| r.name()))
            .finish()
    }
}

impl Component {
    /// Creates an empty component.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn with_constraint<C: ScheduleConstraint + 'static>(mut self, constraint: C) -> Self {
        self.constraints.push(Arc::new(constraint));
        self
    }

    pub fn with_optimizer<O: Optimizer + 'static>(mut self, optimizer: O) -> Self {
        self.optimizers.push(Arc::new(optimizer));
        self
    }

    pub fn with_validator<V: Validator + 'static>(mut self, validator: V) -> Self {
        self.validators.push(Arc::new(validator));
        self
    }

    pub fn with_post_processor<P: PostProcessor + 'static>(mut self, post_processor: P) -> Self {
        self.post_processors.push(Arc::new(post_processor));
        self
    }

    pub fn with_reporter<R: Reporter + 'static>(mut self, reporter: R) -> Self {
        self.reporters.push(Arc::new(reporter));
        self
    }

    /// Adds a constraint function from a closure.
    pub fn with_constraint_fn<F>(self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&mut ModelContext<'_>) + Send + Sync + 'static,
    {
        self.with_constraint(FnConstraint { name: name.into(), f })
    }

    /// Adds an optimizer function from a closure.
    pub fn with_optimizer_fn<F>(self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&mut ModelContext<'_>, &mut ObjectiveAccumulator) + Send + Sync + 'static,
    {
        self.with_optimizer(FnOptimizer { name: name.into(), f })
    }

    /// Adds a validator function from a closure.
    pub fn with_validator_fn<F>(self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&SolvedView<'_>) -> Vec<Violation> + Send + Sync + 'static,
    {
        self.with_validator(FnValidator { name: name.into(), f })
    }

    /// Adds a post-processor function from a closure.
    pub fn with_post_processor_fn<F>(self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&mut PostProcessContext<'_>) -> Result<()> + Send + Sync + 'static,
    {
        self.with_post_processor(FnPostProcessor { name: name.into(), f })
    }

    /// Adds a reporter function from a closure.
    pub fn with_reporter_fn<F>(self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&Schedule) -> Result<String> + Send + Sync + 'static,
    {
        self.with_reporter(FnReporter { name: name.into(), f })
    }

    /// Appends every list of `other` after this component's lists.
    pub fn extend(&mut self, other: Component) {
        self.constraints.extend(other.constraints);
        self.optimizers.extend(other.optimizers);
        self.validators.extend(other.validators);
        self.post_processors.extend(other.post_processors);
        self.reporters.extend(other.reporters);
    }

    /// Builder form of [`extend`](Self::extend).
    pub fn merged(mut self, other: Component) -> Self {
        self.extend(other);
        self
    }

    pub fn constraints(&self) -> &[Arc<dyn ScheduleConstraint>] {
        &self.constraints
    }

    pub fn optimizers(&self) -> &[Arc<dyn Optimizer>] {
        &self.optimizers
    }

    pub fn validators(&self) -> &[Arc<dyn Validator>] {
        &self.validators
    }

    pub fn post_processors(&self) -> &[Arc<dyn PostProcessor>] {
        &self.post_processors
    }

    pub fn reporters(&self) -> &[Arc<dyn Reporter>] {
        &self.reporters
    }

    /// Whether every list is empty.
    pub fn is_empty(&self) -> bool {
        self.constraints.is_empty()
            && self.optimizers.is_empty()
            && self.validators.is_empty()
            && self.post_processors.is_empty()
            && self.reporters.is_empty()
    }
}

struct FnConstraint<F> {
    name: String,
    f: F,
}

impl<F> ScheduleConstraint for FnConstraint<F>
where
    F: Fn(&mut ModelContext<'_>) + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn apply(&self, ctx: &mut ModelContext<'_>) {
        (self.f)(ctx)
    }
}

struct FnOptimizer<F> {
    name: String,
    f: F,
}

impl<F> Optimizer for FnOptimizer<F>
where
    F: Fn(&mut ModelContext<'_>, &mut ObjectiveAccumulator) + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn contribute(&self, ctx: &mut ModelContext<'_>, objective: &mut ObjectiveAccumulator) {
        (self.f)(ctx, objective)
    }
}

struct FnValidator<F> {
    name: String,
    f: F,
}

impl<F> Validator for FnValidator<F>
where
    F: Fn(&SolvedView<'_>) -> Vec<Violation> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn validate(&self, view: &SolvedView<'_>) -> Vec<Violation> {
        (self.f)(view)
    }
}

struct FnPostProcessor<F> {
    name: String,
    f: F,
}

impl<F> PostProcessor for FnPostProcessor<F>
where
    F: Fn(&mut PostProcessContext<'_>) -> Result<()> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn process(&self, ctx: &mut PostProcessContext<'_>) -> Result<()> {
        (self.f)(ctx)
    }
}

struct FnReporter<F> {
    name: String,
    f: F,
}

impl<F> Reporter for FnReporter<F>
where
    F: Fn(&Schedule) -> Result<String> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn report(&self, schedule: &Schedule) -> Result<String> {
        (self.f)(schedule)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extend_preserves_order() {
        let a = Component::new("a")
            .with_validator_fn("v1", |_| Vec::new())
            .with_reporter_fn("r1", |_| Ok(String::new()));
        let b = Component::new("b")
            .with_validator_fn("v2", |_| Vec::new())
            .with_constraint_fn("c1", |_| {});

        let merged = a.merged(b);
        assert_eq!(merged.name(), "a");
        let names: Vec<&str> = merged.validators().iter().map(|v| v.name()).collect();
        assert_eq!(names, vec!["v1", "v2"]);
        assert_eq!(merged.constraints().len(), 1);
        assert_eq!(merged.reporters().len(), 1);
    }

    #[test]
    fn test_empty_component() {
        let c = Component::new("nothing");
        assert!(c.is_empty());
        assert!(!c.with_constraint_fn("x", |_| {}).is_empty());
    }

    #[test]
    fn test_debug_lists_names() {
        let c = Component::new("dbg").with_optimizer_fn("opt", |_, _| {});
        let text = format!("{c:?}");
        assert!(text.contains("dbg"));
        assert!(text.contains("opt"));
    }
}
