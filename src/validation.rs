//! Input validation for facilities configurations.
//!
//! Checks structural integrity of a [`FacilitiesConfig`] before any
//! variable is allocated. Detects:
//! - Missing divisions or teams, or too few teams to fill a match
//! - Negative counts and targets
//! - Unparseable or duplicate dates
//! - Duplicate time labels and duplicate courts within a time slot
//!
//! Every issue is collected; nothing stops at the first problem.

use std::collections::HashSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::FacilitiesConfig;

/// Date format accepted in configurations.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Validation result.
pub type ValidationResult = Result<(), Vec<ConfigIssue>>;

/// A configuration issue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigIssue {
    /// Issue category.
    pub kind: ConfigIssueKind,
    /// Human-readable description.
    pub message: String,
}

/// Categories of configuration issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigIssueKind {
    /// `team_counts` is empty.
    NoDivisions,
    /// A division has a negative team count.
    NegativeTeamCount,
    /// Divisions exist but hold zero teams in total.
    NoTeams,
    /// Match slots exist but fewer than three teams can fill the roles.
    TooFewTeams,
    /// `games_per_season` or `games_per_day` is negative.
    NegativeTarget,
    /// A date does not parse as `YYYY-MM-DD`.
    InvalidDate,
    /// The same date is listed twice.
    DuplicateDate,
    /// Two time slots share a label.
    DuplicateTime,
    /// A time slot lists the same court twice.
    DuplicateLocation,
}

impl ConfigIssue {
    fn new(kind: ConfigIssueKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Validates a facilities configuration.
///
/// # Returns
/// `Ok(())` if all checks pass, `Err(issues)` with every detected issue.
pub fn validate_config(config: &FacilitiesConfig) -> ValidationResult {
    let mut issues = Vec::new();

    if config.team_counts.is_empty() {
        issues.push(ConfigIssue::new(
            ConfigIssueKind::NoDivisions,
            "configuration defines no divisions",
        ));
    } else {
        let mut any_negative = false;
        for (d, &count) in config.team_counts.iter().enumerate() {
            if count < 0 {
                any_negative = true;
                issues.push(ConfigIssue::new(
                    ConfigIssueKind::NegativeTeamCount,
                    format!("division {d} has negative team count {count}"),
                ));
            }
        }
        let total: i64 = config.team_counts.iter().sum();
        if !any_negative && total == 0 {
            issues.push(ConfigIssue::new(
                ConfigIssueKind::NoTeams,
                "at least one team is required",
            ));
        } else if !any_negative && total < 3 && has_match_slots(config) {
            issues.push(ConfigIssue::new(
                ConfigIssueKind::TooFewTeams,
                format!("each match needs home, away and referee teams, only {total} configured"),
            ));
        }
    }

    if config.games_per_season < 0 {
        issues.push(ConfigIssue::new(
            ConfigIssueKind::NegativeTarget,
            format!("games_per_season is negative ({})", config.games_per_season),
        ));
    }
    if config.games_per_day < 0 {
        issues.push(ConfigIssue::new(
            ConfigIssueKind::NegativeTarget,
            format!("games_per_day is negative ({})", config.games_per_day),
        ));
    }

    let mut dates = HashSet::new();
    for raw in &config.dates {
        match NaiveDate::parse_from_str(raw, DATE_FORMAT) {
            Ok(date) => {
                if !dates.insert(date) {
                    issues.push(ConfigIssue::new(
                        ConfigIssueKind::DuplicateDate,
                        format!("date {raw} listed more than once"),
                    ));
                }
            }
            Err(e) => issues.push(ConfigIssue::new(
                ConfigIssueKind::InvalidDate,
                format!("date '{raw}' is not YYYY-MM-DD: {e}"),
            )),
        }
    }

    let mut times = HashSet::new();
    for slot in &config.time_slots {
        if !times.insert(slot.time.as_str()) {
            issues.push(ConfigIssue::new(
                ConfigIssueKind::DuplicateTime,
                format!("time slot '{}' listed more than once", slot.time),
            ));
        }
        let mut courts = HashSet::new();
        for &loc in &slot.active_locations {
            if !courts.insert(loc) {
                issues.push(ConfigIssue::new(
                    ConfigIssueKind::DuplicateLocation,
                    format!("time slot '{}' lists court {loc} twice", slot.time),
                ));
            }
        }
    }

    if issues.is_empty() {
        Ok(())
    } else {
        Err(issues)
    }
}

fn has_match_slots(config: &FacilitiesConfig) -> bool {
    !config.dates.is_empty() && config.time_slots.iter().any(|t| !t.active_locations.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TimeSlotConfig;

    fn sample_config() -> FacilitiesConfig {
        FacilitiesConfig {
            team_counts: vec![4, 4],
            games_per_season: 2,
            games_per_day: 1,
            dates: vec!["2024-01-06".into(), "2024-01-07".into()],
            time_slots: vec![
                TimeSlotConfig::new("18:00", vec![1, 2]),
                TimeSlotConfig::new("19:00", vec![1, 2]),
            ],
        }
    }

    #[test]
    fn test_valid_config() {
        assert!(validate_config(&sample_config()).is_ok());
    }

    #[test]
    fn test_zero_teams() {
        let mut config = sample_config();
        config.team_counts = vec![0];
        let issues = validate_config(&config).unwrap_err();
        assert!(issues.iter().any(|i| i.kind == ConfigIssueKind::NoTeams));
    }

    #[test]
    fn test_too_few_teams_for_roles() {
        let mut config = sample_config();
        config.team_counts = vec![2];
        let issues = validate_config(&config).unwrap_err();
        assert_eq!(issues[0].kind, ConfigIssueKind::TooFewTeams);

        config.dates.clear();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_no_divisions() {
        let mut config = sample_config();
        config.team_counts.clear();
        let issues = validate_config(&config).unwrap_err();
        assert_eq!(issues[0].kind, ConfigIssueKind::NoDivisions);
    }

    #[test]
    fn test_negative_team_count() {
        let mut config = sample_config();
        config.team_counts = vec![4, -1];
        let issues = validate_config(&config).unwrap_err();
        assert!(issues
            .iter()
            .any(|i| i.kind == ConfigIssueKind::NegativeTeamCount && i.message.contains("division 1")));
        assert!(!issues.iter().any(|i| i.kind == ConfigIssueKind::NoTeams));
    }

    #[test]
    fn test_bad_and_duplicate_dates() {
        let mut config = sample_config();
        config.dates = vec!["2024-01-06".into(), "2024-13-40".into(), "2024-01-06".into()];
        let issues = validate_config(&config).unwrap_err();
        assert!(issues.iter().any(|i| i.kind == ConfigIssueKind::InvalidDate));
        assert!(issues.iter().any(|i| i.kind == ConfigIssueKind::DuplicateDate));
    }

    #[test]
    fn test_duplicate_time_and_court() {
        let mut config = sample_config();
        config.time_slots = vec![
            TimeSlotConfig::new("18:00", vec![1, 1]),
            TimeSlotConfig::new("18:00", vec![2]),
        ];
        let issues = validate_config(&config).unwrap_err();
        assert!(issues.iter().any(|i| i.kind == ConfigIssueKind::DuplicateTime));
        assert!(issues
            .iter()
            .any(|i| i.kind == ConfigIssueKind::DuplicateLocation));
    }

    #[test]
    fn test_empty_calendar_is_valid() {
        let mut config = sample_config();
        config.dates.clear();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_multiple_issues() {
        let config = FacilitiesConfig {
            team_counts: vec![0],
            games_per_season: -1,
            games_per_day: -1,
            dates: vec!["someday".into()],
            time_slots: vec![],
        };
        let issues = validate_config(&config).unwrap_err();
        assert_eq!(issues.len(), 4);
    }
}
