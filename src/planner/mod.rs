//! Weekly lesson placement.
//!
//! Turns a [`Roster`](crate::roster::Roster) into a [`Schedule`] in which
//! no two lessons overlap and every lesson lies inside one of its
//! student's availability ranges.
//!
//! # Engines
//!
//! - **Backtracking** ([`Backtracker`]): first feasible placement over an
//!   [`OccupancyGrid`], students in registration order, candidates in
//!   expansion order. No optimization.
//! - **Model** ([`PlannerModel`]): exactly-one groups per student, pairwise
//!   conflicts from a slot coverage index, and an objective made of wish
//!   rank, hole and skip costs, solved by any [`CpSolver`](crate::cp::CpSolver).
//!
//! [`Planner`] runs either engine from a [`SolveConfig`].

mod backtrack;
mod builder;
mod config;
mod extract;
mod holes;
mod runner;

pub use backtrack::{BacktrackOutcome, Backtracker, OccupancyGrid};
pub use builder::{CoverEntry, Coverage, PlannerModel, StudentVars};
pub use config::{LunchWindow, SolveConfig};
pub use extract::{Schedule, ScheduleAssignment, ScheduleStatus, SkipRecord, SolveStats};
pub use holes::{Envelope, HoleAnalysis, HoleAnalyzer, HoleRecord, HoleSlot};
pub use runner::{Planner, ScheduleStream};
