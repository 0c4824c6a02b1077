//! Ready-made components for a typical recreational league.
//!
//! Each preset is an ordinary [`Component`]; combine them with
//! [`Component::merged`] and register the result with a
//! [`Creator`](crate::creator::Creator).

use super::{
    Component, CourtOrdering, DailyCapCheck, DivisionIntegrityCheck, DoubleBookingCheck,
    HeadToHeadBound, HeadToHeadCheck, IdleWaitPenalty, InstantImplication, KpiReporter,
    MatchRelation, Metric, OutcomePenalty, PlayTargetCheck, RefereeNearbyCheck, RefereeTallyCheck,
    RolesCheck, ScheduleConstraint, ScheduleTextReporter, TeamSummaryReporter, Window, WindowBound,
};

/// Hard structure every league needs: no team holds two roles at one
/// instant, and away team and referee come from the home team's division.
pub fn core_rules() -> Component {
    Component::new("core")
        .with_constraint(
            WindowBound::new(Metric::Busy, Window::Instant)
                .with_max(1)
                .with_name("no-double-booking"),
        )
        .with_constraint(MatchRelation::away_in_home_division())
        .with_constraint(MatchRelation::referee_in_home_division())
        .with_validator(RolesCheck)
        .with_validator(DoubleBookingCheck)
        .with_validator(DivisionIntegrityCheck)
        .with_validator(RefereeTallyCheck)
}

/// Every team plays exactly `games_per_season` games.
pub fn season_target() -> Component {
    Component::new("season-target")
        .with_constraint_fn("season-target", |ctx| {
            let target = ctx.facilities().games_per_season() as i64;
            WindowBound::new(Metric::Plays, Window::Season)
                .with_range(target, target)
                .with_name("season-target")
                .apply(ctx);
        })
        .with_validator(PlayTargetCheck::new())
}

/// No team plays more than `games_per_day` games on one date.
pub fn daily_cap() -> Component {
    Component::new("daily-cap")
        .with_constraint_fn("daily-cap", |ctx| {
            let cap = ctx.facilities().games_per_day() as i64;
            WindowBound::new(Metric::Plays, Window::Date)
                .with_max(cap)
                .with_name("daily-cap")
                .apply(ctx);
        })
        .with_validator(DailyCapCheck::new())
}

/// Referees play right before or after the game they officiate.
pub fn referee_rules() -> Component {
    Component::new("referee")
        .with_constraint(InstantImplication::referee_nearby())
        .with_validator(RefereeNearbyCheck)
}

/// Every same-division pair meets between `min` and `max` times.
pub fn head_to_head(min: usize, max: usize) -> Component {
    Component::new("head-to-head")
        .with_constraint(HeadToHeadBound::new(min as i64, max as i64))
        .with_validator(HeadToHeadCheck::new(min, max))
}

/// Weighted soft goals: avoid triple-busy weekends, bye weekends, waits
/// at the venue between duties, and playing at the same time of day too
/// often.
pub fn soft_goals() -> Component {
    Component::new("soft-goals")
        .with_optimizer(OutcomePenalty::triple_busy_weekend(10))
        .with_optimizer(OutcomePenalty::bye_weekend(5))
        .with_optimizer(IdleWaitPenalty::new(2))
        .with_optimizer(OutcomePenalty::repeated_time_of_day(3, 1))
}

/// Lower divisions on lower-numbered courts.
pub fn court_ordering() -> Component {
    Component::new("court-ordering").with_post_processor(CourtOrdering)
}

/// Schedule text, team summary, and KPI reports.
pub fn debug_reports() -> Component {
    Component::new("reports")
        .with_reporter(ScheduleTextReporter)
        .with_reporter(TeamSummaryReporter)
        .with_reporter(KpiReporter)
}

/// The usual combination: core rules, season target, daily cap, referee
/// rules, soft goals, and court ordering.
pub fn season_defaults() -> Vec<Component> {
    vec![
        core_rules(),
        season_target(),
        daily_cap(),
        referee_rules(),
        soft_goals(),
        court_ordering(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preset_contents() {
        let core = core_rules();
        assert_eq!(core.constraints().len(), 3);
        assert_eq!(core.validators().len(), 4);
        assert!(core.optimizers().is_empty());

        assert_eq!(soft_goals().optimizers().len(), 4);
        assert_eq!(soft_goals().optimizers()[2].name(), "stuck-at-venue");
        assert_eq!(court_ordering().post_processors().len(), 1);
        assert_eq!(debug_reports().reporters().len(), 3);
        assert_eq!(head_to_head(1, 2).validators()[0].name(), "head-to-head");
    }

    #[test]
    fn test_season_defaults_names() {
        let names: Vec<String> = season_defaults().iter().map(|c| c.name().to_string()).collect();
        assert_eq!(
            names,
            vec!["core", "season-target", "daily-cap", "referee", "soft-goals", "court-ordering"]
        );
    }
}
