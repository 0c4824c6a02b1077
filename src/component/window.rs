//! Window bounds: "for every team and every window, keep a metric within
//! `[min, max]`".
//!
//! One declarative constraint covers the season play target, the per-date
//! cap, no double-booking at an instant, weekly balance, and similar
//! per-team rules. Where the schedule already carries a named aggregate for
//! a (metric, window) pair it is used directly:
//!
//! | window | plays | busy |
//! |--------|-------|------|
//! | instant | Σ `is_playing` | `busy_count` |
//! | weekend | `games` | `busy_count` |
//! | other | Σ `is_playing` | Σ `is_busy` |

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::ScheduleConstraint;
use crate::cp::LinearExpr;
use crate::models::{Facilities, Team};
use crate::schedule::{ModelContext, ScheduleVars};

/// Quantity counted per team.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Metric {
    /// Games played (home or away).
    Plays,
    /// Games refereed.
    Refs,
    /// Games played or refereed.
    Busy,
}

/// Grouping of match slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Window {
    /// All match slots.
    Season,
    /// Match slots of one weekend.
    Weekend,
    /// Match slots of one date.
    Date,
    /// Match slots sharing a date and time.
    Instant,
    /// Match slots at one time of day, across the season.
    TimeOfDay,
}

impl Window {
    /// Match ids of every group of this window, in calendar order.
    pub fn groups(self, facilities: &Facilities) -> Vec<Vec<usize>> {
        match self {
            Window::Season => vec![(0..facilities.match_count()).collect()],
            Window::Weekend => (0..facilities.weekend_count())
                .map(|w| facilities.weekend_matches(w).to_vec())
                .collect(),
            Window::Date => (0..facilities.dates().len())
                .map(|d| facilities.date_matches(d).to_vec())
                .collect(),
            Window::Instant => facilities
                .instants()
                .iter()
                .map(|i| i.matches.clone())
                .collect(),
            Window::TimeOfDay => (0..facilities.time_labels().len())
                .map(|t| facilities.time_of_day_matches(t))
                .collect(),
        }
    }
}

/// Linear expression for a team's metric over one window group.
///
/// `group` indexes into [`Window::groups`]; `matches` is that group.
pub(crate) fn metric_expr(
    vars: &ScheduleVars,
    metric: Metric,
    window: Window,
    group: usize,
    matches: &[usize],
    team: Team,
) -> LinearExpr {
    match (window, metric) {
        (Window::Instant, Metric::Busy) => {
            LinearExpr::sum_ints([vars.instant_team(group, team).busy_count])
        }
        (Window::Weekend, Metric::Plays) => LinearExpr::sum_ints([vars.weekend_team(group, team).games]),
        (Window::Weekend, Metric::Busy) => {
            LinearExpr::sum_ints([vars.weekend_team(group, team).busy_count])
        }
        (_, Metric::Plays) => LinearExpr::sum_lits(matches.iter().map(|&m| vars.match_team(m, team).is_playing)),
        (_, Metric::Refs) => LinearExpr::sum_lits(matches.iter().map(|&m| vars.match_team(m, team).is_ref)),
        (_, Metric::Busy) => LinearExpr::sum_lits(matches.iter().map(|&m| vars.match_team(m, team).is_busy)),
    }
}

/// Bounds a per-team metric within every group of a window.
///
/// # Example
/// ```
/// use u_league::component::{Metric, Window, WindowBound};
///
/// // Nobody plays more than one game per date.
/// let cap = WindowBound::new(Metric::Plays, Window::Date).with_max(1);
/// assert_eq!(cap.bounds(), (None, Some(1)));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowBound {
    name: String,
    metric: Metric,
    window: Window,
    min: Option<i64>,
    max: Option<i64>,
}

impl WindowBound {
    /// Creates an unbounded rule; add bounds with the builders.
    pub fn new(metric: Metric, window: Window) -> Self {
        Self {
            name: format!("{metric:?}-per-{window:?}").to_lowercase(),
            metric,
            window,
            min: None,
            max: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_min(mut self, min: i64) -> Self {
        self.min = Some(min);
        self
    }

    pub fn with_max(mut self, max: i64) -> Self {
        self.max = Some(max);
        self
    }

    /// Sets both bounds; `with_range(k, k)` pins the metric to `k`.
    pub fn with_range(self, min: i64, max: i64) -> Self {
        self.with_min(min).with_max(max)
    }

    pub fn metric(&self) -> Metric {
        self.metric
    }

    pub fn window(&self) -> Window {
        self.window
    }

    pub fn bounds(&self) -> (Option<i64>, Option<i64>) {
        (self.min, self.max)
    }
}

impl ScheduleConstraint for WindowBound {
    fn name(&self) -> &str {
        &self.name
    }

    fn apply(&self, ctx: &mut ModelContext<'_>) {
        if self.min.is_none() && self.max.is_none() {
            return;
        }
        let facilities = ctx.facilities();
        let vars = ctx.vars();
        let groups = self.window.groups(facilities);
        let before = ctx.constraint_count();
        for team in 0..facilities.total_teams() {
            for (g, matches) in groups.iter().enumerate() {
                let expr = metric_expr(vars, self.metric, self.window, g, matches, team);
                ctx.add_linear(expr, self.min.unwrap_or(i64::MIN), self.max.unwrap_or(i64::MAX));
            }
        }
        debug!(
            rule = %self.name,
            posted = ctx.constraint_count() - before,
            "window bound applied"
        );
    }
}
