//! Court ordering post-processor.

use tracing::debug;

use super::{PostProcessContext, PostProcessor};
use crate::error::Result;
use crate::models::Assignment;

/// Reorders the games of every instant across its courts so that lower
/// divisions take the lower-numbered courts.
///
/// Games are sorted by `(division of home, home, away, referee)`, a total
/// order, so running the ordering twice leaves the second run with
/// nothing to write. Only matches whose assignment changes are written to
/// the overlay.
#[derive(Debug, Clone, Copy, Default)]
pub struct CourtOrdering;

impl PostProcessor for CourtOrdering {
    fn name(&self) -> &str {
        "court-ordering"
    }

    fn process(&self, ctx: &mut PostProcessContext<'_>) -> Result<()> {
        let facilities = ctx.facilities().clone();
        let mut moved = 0usize;
        for instant in facilities.instants() {
            let current: Vec<Assignment> = instant
                .matches
                .iter()
                .map(|&m| ctx.assignment(m))
                .collect::<Result<_>>()?;
            let mut ordered = current.clone();
            ordered.sort_by_key(|a| (facilities.division_of(a.home), a.home, a.away, a.referee));

            for ((&m, now), want) in instant.matches.iter().zip(&current).zip(ordered) {
                if *now != want {
                    ctx.assign(m, want)?;
                    moved += 1;
                }
            }
        }
        debug!(moved, "court ordering applied");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cp::SolverConfig;
    use crate::models::FacilitiesConfig;
    use crate::schedule::Schedule;
    use std::time::Duration;

    fn solved() -> Schedule {
        let mut s = Schedule::from_config(
            FacilitiesConfig::new(vec![3, 3, 3])
                .with_date("2024-01-06")
                .with_time_slot("18:00", vec![1, 2, 3]),
        )
        .unwrap();
        s.solve(&SolverConfig::new().with_time_limit(Duration::from_secs(5)));
        s
    }

    fn home_divisions(s: &Schedule) -> Vec<usize> {
        let f = s.facilities().clone();
        let mut rows: Vec<_> = s.game_report().unwrap().rows().to_vec();
        rows.sort_by_key(|r| r.location);
        rows.iter().map(|r| f.division_of(r.home)).collect()
    }

    #[test]
    fn test_orders_by_division() {
        let mut s = solved();
        CourtOrdering
            .process(&mut PostProcessContext::new("court-ordering", &mut s))
            .unwrap();
        let divisions = home_divisions(&s);
        let mut sorted = divisions.clone();
        sorted.sort_unstable();
        assert_eq!(divisions, sorted);
    }

    #[test]
    fn test_idempotent() {
        let mut s = solved();
        CourtOrdering
            .process(&mut PostProcessContext::new("court-ordering", &mut s))
            .unwrap();
        let first = s.game_report().unwrap().clone();
        let writes = s.overlay().len();

        CourtOrdering
            .process(&mut PostProcessContext::new("court-ordering", &mut s))
            .unwrap();
        assert_eq!(s.game_report().unwrap(), &first);
        assert_eq!(s.overlay().len(), writes);
    }
}
