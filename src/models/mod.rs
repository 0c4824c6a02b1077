//! League domain models.
//!
//! Provides the immutable scheduling universe ([`Facilities`]), the report
//! tables of a solved schedule, and the reassignment overlay used by
//! post-processors.
//!
//! # Domain Mappings
//!
//! | u-league | Recreational league | Tournament | Officiating pool |
//! |----------|--------------------|------------|------------------|
//! | Division | Skill tier | Bracket | Crew region |
//! | MatchSlot | Court booking | Field slot | Assignment slot |
//! | Weekend | Game week | Round | Duty week |
//! | Referee | Reffing team | Officials | Crew |

mod facilities;
mod overlay;
mod report;

pub use facilities::{
    CalendarDay, CalendarTime, Division, Facilities, FacilitiesConfig, Instant, MatchSlot, Team,
    TimeSlotConfig, Weekend,
};
pub use overlay::{Overlay, OverlayEntry};
pub use report::{Assignment, GameReport, GameRow, TeamReport, TeamRow};
