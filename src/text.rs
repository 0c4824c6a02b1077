//! Human-readable schedule text.
//!
//! # Format
//! ```text
//! week_idx: 0
//! date: 2024-01-06
//! time 18:00
//! 00 v 01 r 02 - 03 v 04 r 05
//! time 19:00
//! 02 v 00 r 01
//! ```
//!
//! One `week_idx` header per weekend, one `date` header per date, one
//! `time` header per time of day, then a single line of game tokens
//! `HH v AA r RR` joined by ` - ` in location order. Locations themselves
//! are not written; a parsed game carries its position on the line.
//!
//! Lines that match none of these shapes are administrative and skipped.
//! A header line, or a line whose first token carries the `v` and `r` role
//! markers, that does not parse is an error.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{LeagueError, Result};
use crate::models::{Assignment, GameReport, Team};
use crate::validation::DATE_FORMAT;

const WEEK_HEADER: &str = "week_idx:";
const DATE_HEADER: &str = "date:";
const TIME_HEADER: &str = "time ";
const TOKEN_SEPARATOR: &str = " - ";

/// One game reconstructed from schedule text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedGame {
    pub weekend_index: usize,
    pub date: NaiveDate,
    pub time: String,
    /// Position on the game line (location order).
    pub position: usize,
    pub home: Team,
    pub away: Team,
    pub referee: Team,
}

impl ParsedGame {
    pub fn assignment(&self) -> Assignment {
        Assignment::new(self.home, self.away, self.referee)
    }
}

/// Renders a Game Report as schedule text.
pub fn render_schedule(games: &GameReport) -> String {
    let mut out = String::new();
    let mut week: Option<usize> = None;
    let mut date: Option<NaiveDate> = None;
    let mut time: Option<usize> = None;
    let mut tokens: Vec<String> = Vec::new();

    for row in games.chronological() {
        let new_week = week != Some(row.weekend_index);
        let new_date = new_week || date != Some(row.date);
        let new_time = new_date || time != Some(row.time_index);

        if new_time {
            flush_tokens(&mut out, &mut tokens);
        }
        if new_week {
            week = Some(row.weekend_index);
            out.push_str(&format!("{WEEK_HEADER} {}\n", row.weekend_index));
        }
        if new_date {
            date = Some(row.date);
            out.push_str(&format!("{DATE_HEADER} {}\n", row.date.format(DATE_FORMAT)));
        }
        if new_time {
            time = Some(row.time_index);
            out.push_str(&format!("{TIME_HEADER}{}\n", row.time));
        }
        tokens.push(format!("{:02} v {:02} r {:02}", row.home, row.away, row.referee));
    }
    flush_tokens(&mut out, &mut tokens);
    out
}

fn flush_tokens(out: &mut String, tokens: &mut Vec<String>) {
    if tokens.is_empty() {
        return;
    }
    out.push_str(&tokens.join(TOKEN_SEPARATOR));
    out.push('\n');
    tokens.clear();
}

/// Parses schedule text back into games, in text order.
///
/// # Errors
/// [`LeagueError::Parse`] with the 1-based line number for a malformed
/// header, a malformed game token, or a game line before its headers.
pub fn parse_schedule(text: &str) -> Result<Vec<ParsedGame>> {
    let mut games = Vec::new();
    let mut week: Option<usize> = None;
    let mut date: Option<NaiveDate> = None;
    let mut time: Option<String> = None;

    for (i, raw) in text.lines().enumerate() {
        let line_no = i + 1;
        let line = raw.trim();
        let fail = |message: String| LeagueError::Parse {
            line: line_no,
            message,
        };

        if let Some(rest) = line.strip_prefix(WEEK_HEADER) {
            let n = rest
                .trim()
                .parse()
                .map_err(|_| fail(format!("bad weekend index {:?}", rest.trim())))?;
            week = Some(n);
            date = None;
            time = None;
        } else if let Some(rest) = line.strip_prefix(DATE_HEADER) {
            let d = NaiveDate::parse_from_str(rest.trim(), DATE_FORMAT)
                .map_err(|e| fail(format!("bad date {:?}: {e}", rest.trim())))?;
            date = Some(d);
            time = None;
        } else if let Some(rest) = line.strip_prefix(TIME_HEADER) {
            let label = rest.trim();
            if label.is_empty() {
                return Err(fail("empty time label".to_string()));
            }
            time = Some(label.to_string());
        } else if is_game_line(line) {
            let (Some(weekend_index), Some(date), Some(time)) = (week, date, time.as_ref()) else {
                return Err(fail("game line before week, date, and time headers".to_string()));
            };
            for (position, token) in line.split(TOKEN_SEPARATOR).enumerate() {
                let a = parse_token(token.trim()).map_err(fail)?;
                games.push(ParsedGame {
                    weekend_index,
                    date,
                    time: time.clone(),
                    position,
                    home: a.home,
                    away: a.away,
                    referee: a.referee,
                });
            }
        }
    }
    Ok(games)
}

/// Whether the first token carries the `v` and `r` role markers, in order.
/// Other lines are administrative text.
fn is_game_line(line: &str) -> bool {
    let first = line.split(TOKEN_SEPARATOR).next().unwrap_or("");
    let words: Vec<&str> = first.split_whitespace().collect();
    match words.iter().position(|&w| w == "v") {
        Some(v) => words[v + 1..].contains(&"r"),
        None => false,
    }
}

fn parse_token(token: &str) -> std::result::Result<Assignment, String> {
    let parts: Vec<&str> = token.split_whitespace().collect();
    let team = |s: &str| {
        s.parse::<Team>()
            .map_err(|_| format!("bad team number {s:?} in {token:?}"))
    };
    match parts.as_slice() {
        [home, "v", away, "r", referee] => Ok(Assignment::new(team(home)?, team(away)?, team(referee)?)),
        _ => Err(format!("malformed game token {token:?}, expected `HH v AA r RR`")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Facilities, FacilitiesConfig};
    use proptest::prelude::*;

    fn facilities() -> Facilities {
        Facilities::new(
            FacilitiesConfig::new(vec![6])
                .with_date("2024-01-06")
                .with_date("2024-01-07")
                .with_date("2024-01-13")
                .with_time_slot("18:00", vec![2, 1])
                .with_time_slot("19:30", vec![1]),
        )
        .unwrap()
    }

    #[test]
    fn test_render_layout() {
        let f = facilities();
        let assignments: Vec<Assignment> = (0..f.match_count())
            .map(|m| Assignment::new(m % 6, (m + 1) % 6, (m + 2) % 6))
            .collect();
        let text = render_schedule(&GameReport::build(&f, &assignments));
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "week_idx: 0");
        assert_eq!(lines[1], "date: 2024-01-06");
        assert_eq!(lines[2], "time 18:00");
        assert_eq!(lines[3], "00 v 01 r 02 - 01 v 02 r 03");
        assert_eq!(lines[4], "time 19:30");
        assert_eq!(lines[5], "02 v 03 r 04");
        assert_eq!(text.matches("week_idx").count(), 2);
        assert_eq!(text.matches("date:").count(), 3);
    }

    #[test]
    fn test_empty_report_renders_nothing() {
        assert_eq!(render_schedule(&GameReport::default()), "");
        assert!(parse_schedule("").unwrap().is_empty());
    }

    #[test]
    fn test_administrative_lines_skipped() {
        let text = "Spring league\n\nweek_idx: 3\ndate: 2024-05-04\n# courts 1-2\ntime 10:00\n01 v 02 r 03\n";
        let games = parse_schedule(text).unwrap();
        assert_eq!(games.len(), 1);
        assert_eq!(games[0].weekend_index, 3);
        assert_eq!(games[0].time, "10:00");
        assert_eq!(games[0].assignment(), Assignment::new(1, 2, 3));
    }

    #[test]
    fn test_numeric_administrative_line_skipped() {
        let text = "2024 spring league\nweek_idx: 0\ndate: 2024-05-04\ntime 10:00\n01 v 02 r 03\n3 courts available\n";
        let games = parse_schedule(text).unwrap();
        assert_eq!(games.len(), 1);
        assert_eq!(games[0].assignment(), Assignment::new(1, 2, 3));
    }

    #[test]
    fn test_missing_home_team_fails() {
        let text = "week_idx: 0\ndate: 2024-05-04\ntime 10:00\nv 02 r 03\n";
        let err = parse_schedule(text).unwrap_err();
        assert!(matches!(err, LeagueError::Parse { line: 4, .. }));
    }

    #[test]
    fn test_missing_referee_fails() {
        let text = "week_idx: 0\ndate: 2024-05-04\ntime 10:00\n01 v 02 r 03 - 04 v 05\n";
        let err = parse_schedule(text).unwrap_err();
        assert!(matches!(err, LeagueError::Parse { line: 4, .. }));
    }

    #[test]
    fn test_malformed_headers_fail() {
        assert!(matches!(
            parse_schedule("week_idx: x\n"),
            Err(LeagueError::Parse { line: 1, .. })
        ));
        assert!(matches!(
            parse_schedule("week_idx: 0\ndate: 2024-13-40\n"),
            Err(LeagueError::Parse { line: 2, .. })
        ));
        assert!(matches!(
            parse_schedule("01 v 02 r 03\n"),
            Err(LeagueError::Parse { line: 1, .. })
        ));
    }

    proptest! {
        #[test]
        fn prop_render_parse_round_trip(
            teams in proptest::collection::vec((0usize..120, 0usize..120, 0usize..120), 9)
        ) {
            let f = facilities();
            let assignments: Vec<Assignment> =
                teams.iter().map(|&(h, a, r)| Assignment::new(h, a, r)).collect();
            let report = GameReport::build(&f, &assignments);
            let parsed = parse_schedule(&render_schedule(&report)).unwrap();

            let expected = report.chronological();
            prop_assert_eq!(parsed.len(), expected.len());
            for (p, row) in parsed.iter().zip(expected) {
                prop_assert_eq!(p.weekend_index, row.weekend_index);
                prop_assert_eq!(p.date, row.date);
                prop_assert_eq!(&p.time, &row.time);
                prop_assert_eq!(p.assignment(), row.assignment());
            }
        }
    }
}
