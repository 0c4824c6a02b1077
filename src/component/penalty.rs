//! Outcome penalties: "minimize a weighted count of bad outcomes".
//!
//! For every team and every group of a window, an indicator `b` is tied to
//! a threshold test on the team's metric with a full equivalence
//! (`b ⇔ metric ≥ k` or `b ⇔ metric ≤ k`) and `weight · b` is appended to
//! the objective. [`IdleWaitPenalty`] does the same for instants a team
//! spends waiting at the venue between two duties.

use serde::{Deserialize, Serialize};

use super::window::{metric_expr, Metric, Window};
use super::Optimizer;
use crate::cp::{BoolVar, Lit};
use crate::schedule::{ModelContext, ObjectiveAccumulator};


/// Threshold test defining a bad outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    /// Metric reaches at least `k`.
    AtLeast(i64),
    /// Metric stays at or below `k`.
    AtMost(i64),
}

/// Penalizes every (team, window group) where an outcome occurs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomePenalty {
    name: String,
    metric: Metric,
    window: Window,
    outcome: Outcome,
    weight: i64,
}

impl OutcomePenalty {
    pub fn new(name: impl Into<String>, metric: Metric, window: Window, outcome: Outcome, weight: i64) -> Self {
        Self {
            name: name.into(),
            metric,
            window,
            outcome,
            weight,
        }
    }

    /// A team is busy (playing or refereeing) three or more times in one
    /// weekend.
    pub fn triple_busy_weekend(weight: i64) -> Self {
        Self::new("triple-busy-weekend", Metric::Busy, Window::Weekend, Outcome::AtLeast(3), weight)
    }

    /// A team has no game in a weekend.
    pub fn bye_weekend(weight: i64) -> Self {
        Self::new("bye-weekend", Metric::Plays, Window::Weekend, Outcome::AtMost(0), weight)
    }

    /// A team plays at the same time of day `threshold` or more times.
    pub fn repeated_time_of_day(threshold: i64, weight: i64) -> Self {
        Self::new(
            "repeated-time-of-day",
            Metric::Plays,
            Window::TimeOfDay,
            Outcome::AtLeast(threshold),
            weight,
        )
    }

    pub fn weight(&self) -> i64 {
        self.weight
    }
}

impl Optimizer for OutcomePenalty {
    fn name(&self) -> &str {
        &self.name
    }

    fn contribute(&self, ctx: &mut ModelContext<'_>, objective: &mut ObjectiveAccumulator) {
        if self.weight == 0 {
            return;
        }
        let facilities = ctx.facilities();
        let vars = ctx.vars();
        let groups = self.window.groups(facilities);
        for team in 0..facilities.total_teams() {
            for (g, matches) in groups.iter().enumerate() {
                // The metric never exceeds the group size.
                if let Outcome::AtLeast(k) = self.outcome {
                    if k > matches.len() as i64 {
                        continue;
                    }
                }
                let expr = metric_expr(vars, self.metric, self.window, g, matches, team);
                let bad = ctx.new_bool_var(format!("{}[{g},{team}]", self.name));
                match self.outcome {
                    Outcome::AtLeast(k) => ctx.add_at_least_equivalence(bad, expr, k),
                    Outcome::AtMost(k) => ctx.add_at_most_equivalence(bad, expr, k),
                }
                objective.add_indicator(self.name.as_str(), self.weight, bad);
            }
        }
    }
}

/// Penalizes every instant a team is idle while busy both earlier and
/// later on the same date.
///
/// Per (date, team) two chains of indicators run over the date's instants
/// in time order: `before[k] ⇔ before[k-1] ∨ busy[k-1]` and
/// `after[k] ⇔ after[k+1] ∨ busy[k+1]`. Then
/// `stuck[k] ⇔ before[k] ∧ ¬busy[k] ∧ after[k]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdleWaitPenalty {
    weight: i64,
}

impl IdleWaitPenalty {
    pub fn new(weight: i64) -> Self {
        Self { weight }
    }

    pub fn weight(&self) -> i64 {
        self.weight
    }
}

impl Optimizer for IdleWaitPenalty {
    fn name(&self) -> &str {
        "stuck-at-venue"
    }

    fn contribute(&self, ctx: &mut ModelContext<'_>, objective: &mut ObjectiveAccumulator) {
        if self.weight == 0 {
            return;
        }
        let facilities = ctx.facilities();
        let vars = ctx.vars();
        let mut days: Vec<Vec<usize>> = vec![Vec::new(); facilities.dates().len()];
        for instant in facilities.instants() {
            days[instant.date_index].push(instant.id);
        }
        for day in &mut days {
            day.sort_by_key(|&i| facilities.instants()[i].time_index);
        }

        for team in 0..facilities.total_teams() {
            for day in days.iter().filter(|d| d.len() >= 3) {
                let busy: Vec<Lit> = day.iter().map(|&i| vars.instant_team(i, team).busy.lit()).collect();
                let n = day.len();

                let mut before: Vec<Option<BoolVar>> = vec![None; n];
                for k in 1..n {
                    let b = ctx.new_bool_var(format!("busy_before[{},{team}]", day[k]));
                    let mut lits = vec![busy[k - 1]];
                    lits.extend(before[k - 1].map(BoolVar::lit));
                    ctx.add_or_equivalence(b, &lits);
                    before[k] = Some(b);
                }
                let mut after: Vec<Option<BoolVar>> = vec![None; n];
                for k in (0..n - 1).rev() {
                    let a = ctx.new_bool_var(format!("busy_after[{},{team}]", day[k]));
                    let mut lits = vec![busy[k + 1]];
                    lits.extend(after[k + 1].map(BoolVar::lit));
                    ctx.add_or_equivalence(a, &lits);
                    after[k] = Some(a);
                }

                for k in 1..n - 1 {
                    let (Some(b), Some(a)) = (before[k], after[k]) else {
                        continue;
                    };
                    let stuck = ctx.new_bool_var(format!("stuck[{},{team}]", day[k]));
                    ctx.add_and_equivalence(stuck, &[b.lit(), !busy[k], a.lit()]);
                    objective.add_indicator(self.name(), self.weight, stuck);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cp::{LinearExpr, SolverConfig};
    use crate::kpi::ScheduleKpi;
    use crate::models::FacilitiesConfig;
    use crate::schedule::Schedule;
    use std::time::Duration;

    /// Four teams, one court, three consecutive times on one date: one
    /// team sits out each game.
    fn three_times() -> Schedule {
        Schedule::from_config(
            FacilitiesConfig::new(vec![4])
                .with_date("2024-01-06")
                .with_time_slot("18:00", vec![1])
                .with_time_slot("19:00", vec![1])
                .with_time_slot("20:00", vec![1]),
        )
        .unwrap()
    }

    fn solve_with_idle_penalty(s: &mut Schedule, weight: i64) {
        let mut acc = ObjectiveAccumulator::new();
        {
            let mut ctx = s.model_context();
            IdleWaitPenalty::new(weight).contribute(&mut ctx, &mut acc);
        }
        s.minimize(acc.into_objective().unwrap()).unwrap();
        let status = s.solve(&SolverConfig::new().with_time_limit(Duration::from_secs(10)));
        assert!(status.is_success());
    }

    #[test]
    fn test_idle_wait_avoided_when_possible() {
        let mut s = three_times();
        solve_with_idle_penalty(&mut s, 7);
        assert_eq!(s.objective_value(), Some(0));
        let kpi = ScheduleKpi::calculate(s.facilities(), s.game_report().unwrap());
        assert_eq!(kpi.stuck_at_venue, 0);
    }

    #[test]
    fn test_idle_wait_counted_when_forced() {
        let mut s = three_times();
        {
            // team 0 busy at 18:00 and 20:00, free at 19:00
            let mut ctx = s.model_context();
            let busy = |i: usize| ctx.vars().instant_team(i, 0).busy;
            let (first, middle, last) = (busy(0), busy(1), busy(2));
            ctx.add_eq(LinearExpr::sum_lits([first, last]), 2);
            ctx.add_eq(LinearExpr::sum_lits([middle]), 0);
        }
        solve_with_idle_penalty(&mut s, 7);
        assert_eq!(s.objective_value(), Some(7));
        let kpi = ScheduleKpi::calculate(s.facilities(), s.game_report().unwrap());
        assert_eq!(kpi.stuck_at_venue, 1);
    }

    #[test]
    fn test_bye_penalty_counts_idle_weekends() {
        // Two matches over two weekends: whatever the assignment, 4 of the
        // 8 (team, weekend) cells are byes.
        let mut s = Schedule::from_config(
            FacilitiesConfig::new(vec![4])
                .with_date("2024-01-06")
                .with_date("2024-01-13")
                .with_time_slot("18:00", vec![1]),
        )
        .unwrap();
        let mut acc = ObjectiveAccumulator::new();
        {
            let mut ctx = s.model_context();
            OutcomePenalty::bye_weekend(1).contribute(&mut ctx, &mut acc);
        }
        let objective = acc.into_objective().unwrap();
        s.minimize(objective).unwrap();

        let status = s.solve(&SolverConfig::new().with_time_limit(Duration::from_secs(5)));
        assert!(status.is_success());
        assert_eq!(s.objective_value(), Some(4));
    }

    #[test]
    fn test_impossible_threshold_adds_nothing() {
        let mut s = Schedule::from_config(
            FacilitiesConfig::new(vec![3])
                .with_date("2024-01-06")
                .with_time_slot("18:00", vec![1]),
        )
        .unwrap();
        let mut acc = ObjectiveAccumulator::new();
        {
            let mut ctx = s.model_context();
            OutcomePenalty::triple_busy_weekend(5).contribute(&mut ctx, &mut acc);
        }
        assert!(acc.into_objective().is_none());
    }
}
