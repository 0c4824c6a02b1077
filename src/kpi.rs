//! Schedule quality metrics (KPIs).
//!
//! Computes the soft-goal indicators of a league season from a Game
//! Report. None of them is a hard rule; they measure how pleasant the
//! season is for the teams.
//!
//! # Metrics
//!
//! | Metric | Definition |
//! |--------|-----------|
//! | Bye weekends | (team, weekend) cells with no game played |
//! | Triple-busy weekends | (team, weekend) cells with 3+ games played or refereed |
//! | Stuck at venue | Idle times on a date between a team's first and last duty |
//! | Same time of day | Most games one team plays at one time of day |
//! | Play / ref range | Min and max per-team games played / refereed |

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::models::{Facilities, GameReport};

/// Season quality indicators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleKpi {
    /// Weekends (with at least one match) on which a team does not play.
    pub bye_weekends: usize,
    /// Weekends on which a team is busy three or more times.
    pub triple_busy_weekends: usize,
    /// Idle instants a team waits through between duties on one date.
    pub stuck_at_venue: usize,
    /// Largest count of games one team plays at a single time of day.
    pub max_same_time_of_day: usize,
    /// Mean number of distinct times of day a team plays at.
    pub avg_time_of_day_spread: f64,
    /// Fewest games played by a team.
    pub min_play: usize,
    /// Most games played by a team.
    pub max_play: usize,
    /// Fewest games refereed by a team.
    pub min_ref: usize,
    /// Most games refereed by a team.
    pub max_ref: usize,
}

impl ScheduleKpi {
    /// Computes KPIs from a Game Report.
    ///
    /// Rows naming teams outside `[0, total_teams)` are ignored.
    pub fn calculate(facilities: &Facilities, games: &GameReport) -> Self {
        let teams = facilities.total_teams();
        let weekends = facilities.weekend_count();
        let times = facilities.time_labels().len();
        let dates = facilities.dates().len();

        let mut week_plays = vec![vec![0usize; weekends]; teams];
        let mut week_busy = vec![vec![0usize; weekends]; teams];
        let mut time_plays = vec![vec![0usize; times]; teams];
        let mut duties: Vec<Vec<BTreeSet<usize>>> = vec![vec![BTreeSet::new(); dates]; teams];
        let mut plays = vec![0usize; teams];
        let mut refs = vec![0usize; teams];

        let slots = facilities.match_slots();
        for row in games.rows() {
            let Some(slot) = slots.get(row.match_id) else {
                continue;
            };
            let a = row.assignment();
            if [a.home, a.away, a.referee].iter().any(|&t| t >= teams) {
                continue;
            }
            for t in [a.home, a.away] {
                plays[t] += 1;
                week_plays[t][row.weekend_index] += 1;
                time_plays[t][row.time_index] += 1;
            }
            refs[a.referee] += 1;
            for t in [a.home, a.away, a.referee] {
                week_busy[t][row.weekend_index] += 1;
                duties[t][slot.date_index].insert(row.time_index);
            }
        }

        let active_weekends: Vec<usize> = (0..weekends)
            .filter(|&w| !facilities.weekend_matches(w).is_empty())
            .collect();
        let bye_weekends = (0..teams)
            .map(|t| active_weekends.iter().filter(|&&w| week_plays[t][w] == 0).count())
            .sum();
        let triple_busy_weekends = week_busy
            .iter()
            .map(|row| row.iter().filter(|&&n| n >= 3).count())
            .sum();

        // time indices that actually hold games on each date
        let mut date_times: Vec<BTreeSet<usize>> = vec![BTreeSet::new(); dates];
        for instant in facilities.instants() {
            date_times[instant.date_index].insert(instant.time_index);
        }
        let mut stuck_at_venue = 0;
        for per_date in &duties {
            for (d, busy) in per_date.iter().enumerate() {
                if let (Some(&first), Some(&last)) = (busy.first(), busy.last()) {
                    stuck_at_venue += date_times[d]
                        .range(first..=last)
                        .filter(|&&ti| !busy.contains(&ti))
                        .count();
                }
            }
        }

        let max_same_time_of_day = time_plays
            .iter()
            .flat_map(|row| row.iter().copied())
            .max()
            .unwrap_or(0);
        let avg_time_of_day_spread = if teams == 0 {
            0.0
        } else {
            let spread: usize = time_plays
                .iter()
                .map(|row| row.iter().filter(|&&n| n > 0).count())
                .sum();
            spread as f64 / teams as f64
        };

        Self {
            bye_weekends,
            triple_busy_weekends,
            stuck_at_venue,
            max_same_time_of_day,
            avg_time_of_day_spread,
            min_play: plays.iter().copied().min().unwrap_or(0),
            max_play: plays.iter().copied().max().unwrap_or(0),
            min_ref: refs.iter().copied().min().unwrap_or(0),
            max_ref: refs.iter().copied().max().unwrap_or(0),
        }
    }

    /// Whether every team plays the same number of games.
    pub fn is_play_balanced(&self) -> bool {
        self.min_play == self.max_play
    }

    /// Whether the season stays within the given soft-goal limits.
    pub fn meets_thresholds(&self, max_byes: usize, max_triple_busy: usize) -> bool {
        self.bye_weekends <= max_byes && self.triple_busy_weekends <= max_triple_busy
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Assignment, FacilitiesConfig};

    // 4 teams, two weekends of one date each, three times on one court.
    fn facilities() -> Facilities {
        Facilities::new(
            FacilitiesConfig::new(vec![4])
                .with_date("2024-01-06")
                .with_date("2024-01-13")
                .with_time_slot("18:00", vec![1])
                .with_time_slot("19:00", vec![1])
                .with_time_slot("20:00", vec![1]),
        )
        .unwrap()
    }

    #[test]
    fn test_kpi_basic() {
        let f = facilities();
        let assignments = vec![
            // weekend 0
            Assignment::new(0, 1, 2),
            Assignment::new(2, 3, 0),
            Assignment::new(0, 2, 1),
            // weekend 1
            Assignment::new(1, 3, 0),
            Assignment::new(0, 3, 2),
            Assignment::new(1, 2, 3),
        ];
        let kpi = ScheduleKpi::calculate(&f, &GameReport::build(&f, &assignments));

        assert_eq!(kpi.bye_weekends, 0);
        // weekend 0: team 0 busy 3x, team 2 busy 3x; weekend 1: team 3 busy 3x
        assert_eq!(kpi.triple_busy_weekends, 3);
        // team 1 is busy at 18:00 and 20:00 on both dates, idle at 19:00
        assert_eq!(kpi.stuck_at_venue, 2);
        assert_eq!((kpi.min_play, kpi.max_play), (3, 3));
        assert_eq!((kpi.min_ref, kpi.max_ref), (1, 2));
        assert!(kpi.is_play_balanced());
    }

    #[test]
    fn test_kpi_bye_and_time_of_day() {
        let f = facilities();
        let assignments = vec![
            Assignment::new(0, 1, 2),
            Assignment::new(0, 1, 2),
            Assignment::new(0, 1, 2),
            Assignment::new(0, 1, 2),
            Assignment::new(0, 1, 2),
            Assignment::new(0, 1, 2),
        ];
        let kpi = ScheduleKpi::calculate(&f, &GameReport::build(&f, &assignments));
        // teams 2 and 3 never play in either weekend
        assert_eq!(kpi.bye_weekends, 4);
        assert_eq!(kpi.max_same_time_of_day, 2);
        assert!((kpi.avg_time_of_day_spread - 1.5).abs() < 1e-10);
        assert!(!kpi.is_play_balanced());
        assert!(kpi.meets_thresholds(4, 6));
        assert!(!kpi.meets_thresholds(3, 6));
    }

    #[test]
    fn test_kpi_empty() {
        let f = Facilities::new(FacilitiesConfig::new(vec![3])).unwrap();
        let kpi = ScheduleKpi::calculate(&f, &GameReport::default());
        assert_eq!(kpi.bye_weekends, 0);
        assert_eq!(kpi.stuck_at_venue, 0);
        assert_eq!((kpi.min_play, kpi.max_play), (0, 0));
    }
}
