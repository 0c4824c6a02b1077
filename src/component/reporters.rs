//! Text reporters.

use std::fmt::Write as _;

use super::Reporter;
use crate::error::Result;
use crate::kpi::ScheduleKpi;
use crate::schedule::Schedule;
use crate::text::render_schedule;

/// Renders the (post-processed) Game Report as schedule text.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScheduleTextReporter;

impl Reporter for ScheduleTextReporter {
    fn name(&self) -> &str {
        "schedule-text"
    }

    fn report(&self, schedule: &Schedule) -> Result<String> {
        Ok(render_schedule(schedule.game_report()?))
    }
}

/// One line per team: games played, refereed, and head-to-head counts.
#[derive(Debug, Clone, Copy, Default)]
pub struct TeamSummaryReporter;

impl Reporter for TeamSummaryReporter {
    fn name(&self) -> &str {
        "team-summary"
    }

    fn report(&self, schedule: &Schedule) -> Result<String> {
        let facilities = schedule.facilities();
        let teams = schedule.team_report()?;
        let mut out = String::new();
        for row in teams.rows() {
            let vs: Vec<String> = row
                .vs
                .iter()
                .enumerate()
                .filter(|&(o, _)| o != row.team)
                .map(|(o, n)| format!("{o:02}:{n}"))
                .collect();
            let _ = writeln!(
                out,
                "team {:02} (div {}): play {} ref {} vs [{}]",
                row.team,
                facilities.division_of(row.team),
                row.total_play,
                row.total_ref,
                vs.join(" ")
            );
        }
        Ok(out)
    }
}

/// Soft-goal KPIs of the season.
#[derive(Debug, Clone, Copy, Default)]
pub struct KpiReporter;

impl Reporter for KpiReporter {
    fn name(&self) -> &str {
        "kpi"
    }

    fn report(&self, schedule: &Schedule) -> Result<String> {
        let kpi = ScheduleKpi::calculate(schedule.facilities(), schedule.game_report()?);
        let mut out = String::new();
        if let Some(objective) = schedule.objective_value() {
            let _ = writeln!(out, "objective: {objective}");
        }
        let _ = writeln!(out, "bye weekends: {}", kpi.bye_weekends);
        let _ = writeln!(out, "triple-busy weekends: {}", kpi.triple_busy_weekends);
        let _ = writeln!(out, "stuck at venue: {}", kpi.stuck_at_venue);
        let _ = writeln!(out, "max same time of day: {}", kpi.max_same_time_of_day);
        let _ = writeln!(out, "avg time-of-day spread: {:.2}", kpi.avg_time_of_day_spread);
        let _ = writeln!(out, "plays: {}..={}", kpi.min_play, kpi.max_play);
        let _ = writeln!(out, "refs: {}..={}", kpi.min_ref, kpi.max_ref);
        Ok(out)
    }
}
