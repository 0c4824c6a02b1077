//! League season scheduling.
//!
//! Assigns teams to game slots across a season: for every (date, time,
//! court) match slot a home team, an away team, and a referee team.
//! Scheduling rules are not hard-coded; they arrive as pluggable
//! components that add constraints, objective terms, validators,
//! post-processors, and reports around one constraint model.
//!
//! # Modules
//!
//! - **`models`**: Domain types: `Facilities`, `MatchSlot`, `Instant`,
//!   `Assignment`, `GameReport`, `TeamReport`, `Overlay`
//! - **`validation`**: Facilities configuration checks (division sizes,
//!   dates, duplicate times and courts)
//! - **`cp`**: Constraint model and the built-in MILP solver (`good_lp`)
//! - **`schedule`**: Decision and derived variables over one facilities
//!   instance, solving, and report derivation
//! - **`component`**: Component traits, declarative constraint patterns,
//!   validators, post-processors, reporters, and presets
//! - **`creator`**: The build → solve → validate → post-process → report
//!   pipeline
//! - **`text`**: Human-readable schedule text (render and parse)
//! - **`kpi`**: Soft-goal quality indicators
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use u_league::component::standard;
//! use u_league::cp::SolverConfig;
//! use u_league::creator::Creator;
//! use u_league::models::FacilitiesConfig;
//!
//! let config = FacilitiesConfig::new(vec![3, 3])
//!     .with_games_per_season(2)
//!     .with_date("2024-03-02")
//!     .with_time_slot("10:00", vec![1, 2])
//!     .with_time_slot("11:00", vec![1, 2])
//!     .with_time_slot("12:00", vec![1, 2]);
//!
//! let run = Creator::new()
//!     .with_component(standard::core_rules())
//!     .with_component(standard::season_target())
//!     .with_component(standard::debug_reports())
//!     .with_solver_config(SolverConfig::new().with_time_limit(Duration::from_secs(5)))
//!     .run_config(config)
//!     .unwrap();
//!
//! assert!(run.is_done());
//! assert!(run.report().contains("week_idx: 0"));
//! ```
//!
//! # References
//!
//! - Rossi, van Beek, Walsh (2006), "Handbook of Constraint Programming"
//! - Wolsey (1998), "Integer Programming"
//! - Kendall et al. (2010), "Scheduling in sports: An annotated bibliography"

pub mod component;
pub mod cp;
pub mod creator;
pub mod error;
pub mod kpi;
pub mod models;
pub mod schedule;
pub mod text;
pub mod validation;

pub use creator::{Creator, CreatorRun, PipelineState};
pub use error::{LeagueError, Result, Violation};
