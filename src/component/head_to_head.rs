//! Head-to-head bounds between teams of one division.

use serde::{Deserialize, Serialize};

use super::ScheduleConstraint;
use crate::cp::{LinearExpr, Lit};
use crate::schedule::ModelContext;

/// Bounds how often every same-division pair meets over the season.
///
/// For each pair `(a, b)` and match `m` a helper indicator
/// `meets ⇔ is_playing[m, a] ∧ is_playing[m, b]` is created, then
/// `min ≤ Σ meets ≤ max`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeadToHeadBound {
    name: String,
    min: i64,
    max: i64,
}

impl HeadToHeadBound {
    pub fn new(min: i64, max: i64) -> Self {
        Self {
            name: "head-to-head".to_string(),
            min,
            max,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn bounds(&self) -> (i64, i64) {
        (self.min, self.max)
    }
}

impl ScheduleConstraint for HeadToHeadBound {
    fn name(&self) -> &str {
        &self.name
    }

    fn apply(&self, ctx: &mut ModelContext<'_>) {
        let facilities = ctx.facilities();
        let vars = ctx.vars();
        for division in 0..facilities.division_count() {
            let teams = facilities.division_teams(division);
            for a in teams.clone() {
                for b in (a + 1)..teams.end {
                    let mut meetings = LinearExpr::new();
                    for m in 0..facilities.match_count() {
                        let meets = ctx.new_bool_var(format!("{}[{a},{b},{m}]", self.name));
                        let both: [Lit; 2] = [
                            vars.match_team(m, a).is_playing.lit(),
                            vars.match_team(m, b).is_playing.lit(),
                        ];
                        ctx.add_and_equivalence(meets, &both);
                        meetings.add_lit(meets, 1);
                    }
                    ctx.add_linear(meetings, self.min, self.max);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cp::{SolveStatus, SolverConfig};
    use crate::models::FacilitiesConfig;
    use crate::schedule::Schedule;
    use std::time::Duration;

    fn three_team_schedule(slots: usize) -> Schedule {
        let mut config = FacilitiesConfig::new(vec![3]);
        for day in 0..slots {
            config = config.with_date(format!("2024-02-{:02}", 3 + 7 * day));
        }
        Schedule::from_config(config.with_time_slot("10:00", vec![1])).unwrap()
    }

    #[test]
    fn test_round_robin_bound() {
        let mut s = three_team_schedule(3);
        {
            let mut ctx = s.model_context();
            HeadToHeadBound::new(1, 1).apply(&mut ctx);
        }
        let status = s.solve(&SolverConfig::new().with_time_limit(Duration::from_secs(5)));
        assert!(status.is_success());
        let teams = s.team_report().unwrap();
        assert_eq!(teams.head_to_head(0, 1), 1);
        assert_eq!(teams.head_to_head(0, 2), 1);
        assert_eq!(teams.head_to_head(1, 2), 1);
    }

    #[test]
    fn test_unsatisfiable_bound_is_infeasible() {
        let mut s = three_team_schedule(3);
        {
            let mut ctx = s.model_context();
            HeadToHeadBound::new(2, 3).apply(&mut ctx);
        }
        let status = s.solve(&SolverConfig::new().with_time_limit(Duration::from_secs(5)));
        assert_eq!(status, SolveStatus::Infeasible);
    }
}
