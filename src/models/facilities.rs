//! Facilities: the immutable scheduling universe.
//!
//! Holds division sizes, the season play target, the per-day cap, and the
//! fully enumerated set of match slots. Built once per run; every other
//! type treats it as read-only and shares it through `Arc`.
//!
//! # Calendar Model
//! Dates are grouped into weekends by ISO week. Within a date, time slots
//! keep their configured order (`time_index`), and each time slot lists the
//! courts (`location`s) active at that time. A match slot is one
//! (date, time, court) cell.
//!
//! An *instant* is the set of match slots sharing a date and time. Two
//! instants are adjacent when they share a date and their `time_index`
//! differs by one.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{LeagueError, Result};
use crate::validation::{validate_config, DATE_FORMAT};

/// Team identity, numbered across divisions in order.
pub type Team = usize;

/// Division ordinal.
pub type Division = usize;

/// One configured time of day and the courts active at it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSlotConfig {
    /// Label, e.g. `"18:30"`.
    pub time: String,
    /// Courts in use at this time.
    pub active_locations: Vec<u32>,
}

impl TimeSlotConfig {
    /// Creates a time slot.
    pub fn new(time: impl Into<String>, active_locations: Vec<u32>) -> Self {
        Self {
            time: time.into(),
            active_locations,
        }
    }
}

/// Raw facilities input, as loaded from configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacilitiesConfig {
    /// Teams per division.
    pub team_counts: Vec<i64>,
    /// Games every team plays over the season.
    pub games_per_season: i64,
    /// Maximum games a team plays on one date.
    pub games_per_day: i64,
    /// Calendar dates as `YYYY-MM-DD`.
    pub dates: Vec<String>,
    /// Time slots applied to every date.
    pub time_slots: Vec<TimeSlotConfig>,
}

impl FacilitiesConfig {
    /// Creates a configuration with the given divisions and an empty
    /// calendar.
    pub fn new(team_counts: Vec<i64>) -> Self {
        Self {
            team_counts,
            games_per_season: 0,
            games_per_day: 1,
            dates: Vec::new(),
            time_slots: Vec::new(),
        }
    }

    /// Sets the season play target.
    pub fn with_games_per_season(mut self, games: i64) -> Self {
        self.games_per_season = games;
        self
    }

    /// Sets the per-day play cap.
    pub fn with_games_per_day(mut self, games: i64) -> Self {
        self.games_per_day = games;
        self
    }

    /// Adds a calendar date.
    pub fn with_date(mut self, date: impl Into<String>) -> Self {
        self.dates.push(date.into());
        self
    }

    /// Adds a time slot.
    pub fn with_time_slot(mut self, time: impl Into<String>, locations: Vec<u32>) -> Self {
        self.time_slots.push(TimeSlotConfig::new(time, locations));
        self
    }
}

/// One (date, time, court) opportunity for exactly one game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchSlot {
    /// Dense index into [`Facilities::match_slots`].
    pub id: usize,
    pub weekend_index: usize,
    /// Index into [`Facilities::dates`].
    pub date_index: usize,
    pub date: NaiveDate,
    pub location: u32,
    pub time: String,
    /// Position of `time` in the configured time slot list.
    pub time_index: usize,
    /// Index into [`Facilities::instants`].
    pub instant: usize,
}

/// Match slots sharing a date and time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instant {
    pub id: usize,
    pub weekend_index: usize,
    pub date_index: usize,
    pub time_index: usize,
    /// Match slot ids in court order.
    pub matches: Vec<usize>,
    /// Adjacent earlier instant on the same date.
    pub prev: Option<usize>,
    /// Adjacent later instant on the same date.
    pub next: Option<usize>,
}

impl Instant {
    /// Adjacent instants (zero, one, or two).
    pub fn neighbours(&self) -> impl Iterator<Item = usize> + '_ {
        self.prev.into_iter().chain(self.next)
    }
}

/// Calendar view: one weekend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Weekend {
    pub index: usize,
    pub days: Vec<CalendarDay>,
}

/// Calendar view: one date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarDay {
    pub date: NaiveDate,
    pub times: Vec<CalendarTime>,
}

/// Calendar view: one time on one date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarTime {
    pub time: String,
    pub time_index: usize,
    pub locations: Vec<u32>,
}

/// Validated, immutable scheduling universe.
#[derive(Debug, Clone)]
pub struct Facilities {
    team_counts: Vec<usize>,
    team_division: Vec<Division>,
    division_offsets: Vec<usize>,
    games_per_season: usize,
    games_per_day: usize,
    time_labels: Vec<String>,
    dates: Vec<NaiveDate>,
    calendar: Vec<Weekend>,
    match_slots: Vec<MatchSlot>,
    instants: Vec<Instant>,
    weekend_matches: Vec<Vec<usize>>,
    date_matches: Vec<Vec<usize>>,
}

impl Facilities {
    /// Validates the configuration and enumerates every match slot.
    ///
    /// # Errors
    /// [`LeagueError::Config`] listing every configuration issue.
    pub fn new(config: FacilitiesConfig) -> Result<Self> {
        validate_config(&config).map_err(|issues| LeagueError::Config { issues })?;

        let team_counts: Vec<usize> = config
            .team_counts
            .iter()
            .map(|&c| usize::try_from(c).unwrap_or(0))
            .collect();
        let mut team_division = Vec::new();
        let mut division_offsets = Vec::with_capacity(team_counts.len());
        for (d, &count) in team_counts.iter().enumerate() {
            division_offsets.push(team_division.len());
            team_division.extend(std::iter::repeat(d).take(count));
        }

        let mut dates: Vec<NaiveDate> = config
            .dates
            .iter()
            .filter_map(|raw| NaiveDate::parse_from_str(raw, DATE_FORMAT).ok())
            .collect();
        dates.sort_unstable();

        let time_labels: Vec<String> = config.time_slots.iter().map(|t| t.time.clone()).collect();

        let mut calendar: Vec<Weekend> = Vec::new();
        let mut match_slots = Vec::new();
        let mut instants: Vec<Instant> = Vec::new();
        let mut weekend_matches: Vec<Vec<usize>> = Vec::new();
        let mut date_matches = Vec::with_capacity(dates.len());
        let mut last_week = None;

        for (date_index, &date) in dates.iter().enumerate() {
            let iso = date.iso_week();
            let week_key = (iso.year(), iso.week());
            if last_week != Some(week_key) {
                last_week = Some(week_key);
                calendar.push(Weekend {
                    index: calendar.len(),
                    days: Vec::new(),
                });
                weekend_matches.push(Vec::new());
            }
            let weekend_index = calendar.len() - 1;

            let mut day = CalendarDay {
                date,
                times: Vec::new(),
            };
            let mut on_date = Vec::new();
            let mut prev_instant: Option<(usize, usize)> = None;

            for (time_index, slot) in config.time_slots.iter().enumerate() {
                day.times.push(CalendarTime {
                    time: slot.time.clone(),
                    time_index,
                    locations: slot.active_locations.clone(),
                });
                if slot.active_locations.is_empty() {
                    continue;
                }

                let instant_id = instants.len();
                let mut locations = slot.active_locations.clone();
                locations.sort_unstable();
                let mut ids = Vec::with_capacity(locations.len());
                for location in locations {
                    let id = match_slots.len();
                    match_slots.push(MatchSlot {
                        id,
                        weekend_index,
                        date_index,
                        date,
                        location,
                        time: slot.time.clone(),
                        time_index,
                        instant: instant_id,
                    });
                    ids.push(id);
                }
                on_date.extend_from_slice(&ids);

                let prev = prev_instant
                    .filter(|&(_, ti)| ti + 1 == time_index)
                    .map(|(id, _)| id);
                if let Some(p) = prev {
                    instants[p].next = Some(instant_id);
                }
                instants.push(Instant {
                    id: instant_id,
                    weekend_index,
                    date_index,
                    time_index,
                    matches: ids,
                    prev,
                    next: None,
                });
                prev_instant = Some((instant_id, time_index));
            }

            weekend_matches[weekend_index].extend_from_slice(&on_date);
            date_matches.push(on_date);
            calendar[weekend_index].days.push(day);
        }

        if match_slots.is_empty() {
            warn!("facilities calendar has no match slots; schedule will be empty");
        }
        debug!(
            divisions = team_counts.len(),
            teams = team_division.len(),
            weekends = calendar.len(),
            matches = match_slots.len(),
            "facilities built"
        );

        Ok(Self {
            team_counts,
            team_division,
            division_offsets,
            games_per_season: usize::try_from(config.games_per_season).unwrap_or(0),
            games_per_day: usize::try_from(config.games_per_day).unwrap_or(0),
            time_labels,
            dates,
            calendar,
            match_slots,
            instants,
            weekend_matches,
            date_matches,
        })
    }

    /// Parses a JSON configuration and builds facilities from it.
    ///
    /// # Errors
    /// [`LeagueError::Parse`] for malformed JSON, [`LeagueError::Config`]
    /// for an invalid configuration.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: FacilitiesConfig =
            serde_json::from_str(json).map_err(|e| LeagueError::Parse {
                line: e.line(),
                message: e.to_string(),
            })?;
        Self::new(config)
    }

    /// All match slots in `(weekend, date, time, court)` order.
    pub fn match_slots(&self) -> &[MatchSlot] {
        &self.match_slots
    }

    /// Number of match slots.
    pub fn match_count(&self) -> usize {
        self.match_slots.len()
    }

    /// Teams per division.
    pub fn team_counts(&self) -> &[usize] {
        &self.team_counts
    }

    /// Total number of teams.
    pub fn total_teams(&self) -> usize {
        self.team_division.len()
    }

    /// Division of a team.
    ///
    /// # Panics
    /// If `team >= total_teams()`.
    #[inline]
    pub fn division_of(&self, team: Team) -> Division {
        self.team_division[team]
    }

    /// Teams belonging to a division.
    pub fn division_teams(&self, division: Division) -> std::ops::Range<Team> {
        match (self.division_offsets.get(division), self.team_counts.get(division)) {
            (Some(&start), Some(&count)) => start..start + count,
            _ => 0..0,
        }
    }

    /// Number of divisions.
    pub fn division_count(&self) -> usize {
        self.team_counts.len()
    }

    /// Season play target per team.
    pub fn games_per_season(&self) -> usize {
        self.games_per_season
    }

    /// Maximum games per team per date.
    pub fn games_per_day(&self) -> usize {
        self.games_per_day
    }

    /// Configured time labels, indexed by `time_index`.
    pub fn time_labels(&self) -> &[String] {
        &self.time_labels
    }

    /// Sorted calendar dates, indexed by `date_index`.
    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    /// Weekends → dates → times → active courts.
    pub fn calendar(&self) -> &[Weekend] {
        &self.calendar
    }

    /// Number of weekends.
    pub fn weekend_count(&self) -> usize {
        self.calendar.len()
    }

    /// All instants in chronological order.
    pub fn instants(&self) -> &[Instant] {
        &self.instants
    }

    /// Match ids on a weekend.
    pub fn weekend_matches(&self, weekend: usize) -> &[usize] {
        self.weekend_matches.get(weekend).map_or(&[], Vec::as_slice)
    }

    /// Match ids on a date.
    pub fn date_matches(&self, date_index: usize) -> &[usize] {
        self.date_matches.get(date_index).map_or(&[], Vec::as_slice)
    }

    /// Match ids at a time of day, across the whole season.
    pub fn time_of_day_matches(&self, time_index: usize) -> Vec<usize> {
        self.match_slots
            .iter()
            .filter(|m| m.time_index == time_index)
            .map(|m| m.id)
            .collect()
    }

    /// Whether two teams belong to the same division.
    #[inline]
    pub fn same_division(&self, a: Team, b: Team) -> bool {
        self.team_division[a] == self.team_division[b]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_config() -> FacilitiesConfig {
        FacilitiesConfig::new(vec![3, 2])
            .with_games_per_season(2)
            .with_games_per_day(1)
            // Sat/Sun of one ISO week, then the following Saturday.
            .with_date("2024-01-13")
            .with_date("2024-01-06")
            .with_date("2024-01-07")
            .with_time_slot("18:00", vec![2, 1])
            .with_time_slot("19:00", vec![1])
            .with_time_slot("20:00", vec![])
    }

    #[test]
    fn test_team_numbering() {
        let f = Facilities::new(sample_config()).unwrap();
        assert_eq!(f.total_teams(), 5);
        assert_eq!(f.division_count(), 2);
        assert_eq!(f.division_of(2), 0);
        assert_eq!(f.division_of(3), 1);
        assert_eq!(f.division_teams(1), 3..5);
        assert_eq!(f.division_teams(9), 0..0);
        assert!(f.same_division(3, 4));
        assert!(!f.same_division(0, 4));
    }

    #[test]
    fn test_weekend_grouping() {
        let f = Facilities::new(sample_config()).unwrap();
        assert_eq!(f.weekend_count(), 2);
        assert_eq!(f.calendar()[0].days.len(), 2);
        assert_eq!(f.calendar()[1].days.len(), 1);
        assert_eq!(f.dates()[0], NaiveDate::from_ymd_opt(2024, 1, 6).unwrap());
    }

    #[test]
    fn test_match_enumeration_order() {
        let f = Facilities::new(sample_config()).unwrap();
        // 3 dates × (2 + 1) courts
        assert_eq!(f.match_count(), 9);
        let first = &f.match_slots()[0];
        assert_eq!((first.weekend_index, first.time_index, first.location), (0, 0, 1));
        assert_eq!(f.match_slots()[1].location, 2);
        assert_eq!(f.match_slots()[2].time, "19:00");
        for (i, m) in f.match_slots().iter().enumerate() {
            assert_eq!(m.id, i);
        }
        assert_eq!(f.weekend_matches(0).len(), 6);
        assert_eq!(f.date_matches(2).len(), 3);
        assert_eq!(f.time_of_day_matches(1).len(), 3);
    }

    #[test]
    fn test_instant_adjacency() {
        let f = Facilities::new(sample_config()).unwrap();
        assert_eq!(f.instants().len(), 6);
        let i0 = &f.instants()[0];
        let i1 = &f.instants()[1];
        assert_eq!(i0.next, Some(1));
        assert_eq!(i1.prev, Some(0));
        assert_eq!(i1.next, None);
        // next date does not link back
        assert_eq!(f.instants()[2].prev, None);
        assert_eq!(i1.neighbours().collect::<Vec<_>>(), vec![0]);
    }

    #[test]
    fn test_zero_teams_rejected() {
        let err = Facilities::new(FacilitiesConfig::new(vec![0])).unwrap_err();
        assert!(matches!(err, LeagueError::Config { .. }));
    }

    #[test]
    fn test_empty_calendar() {
        let f = Facilities::new(FacilitiesConfig::new(vec![4])).unwrap();
        assert_eq!(f.match_count(), 0);
        assert!(f.instants().is_empty());
        assert_eq!(f.weekend_count(), 0);
    }

    #[test]
    fn test_from_json() {
        let json = r#"{
            "team_counts": [2, 2],
            "games_per_season": 1,
            "games_per_day": 1,
            "dates": ["2024-03-02"],
            "time_slots": [{"time": "10:00", "active_locations": [1, 2]}]
        }"#;
        let f = Facilities::from_json_str(json).unwrap();
        assert_eq!(f.total_teams(), 4);
        assert_eq!(f.match_count(), 2);

        let err = Facilities::from_json_str("{ not json").unwrap_err();
        assert!(matches!(err, LeagueError::Parse { .. }));
    }
}
