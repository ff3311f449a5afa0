//! Weekly lesson slot scheduling.
//!
//! Assigns every student of a roster one fixed-length weekly lesson inside
//! their declared availability, with no two lessons overlapping:
//!
//! - **Calendar**: the week as 10-minute [`TimeChunk`](calendar::TimeChunk)s.
//! - **Roster**: students, availability ranges and their expansion into
//!   candidate lesson starts.
//! - **CP (Constraint Programming)**: a boolean model with exactly-one,
//!   conflict and OR/AND-equality constraints, a linear objective, and the
//!   [`CpSolver`](cp::CpSolver) contract for optimizing backends.
//! - **Planner**: the placement model (preference, hole and skip costs),
//!   the backtracking engine, and schedule extraction.
//!
//! # Quick start
//!
//! ```
//! use lesson_planner::planner::{Planner, SolveConfig};
//! use lesson_planner::roster::{AvailabilityRecord, Roster, StudentRecord};
//!
//! let record = |id, name: &str| StudentRecord {
//!     id,
//!     name: name.into(),
//!     lesson_duration_minutes: 30,
//!     availabilities: vec![AvailabilityRecord::new("MONDAY", (9, 0), (10, 0))],
//! };
//! let roster = Roster::from_records(&[record(1, "A"), record(2, "B")]).unwrap();
//!
//! let schedule = Planner::new(&roster, SolveConfig::default()).backtrack().unwrap();
//! let (placed, _) = schedule.to_records(&roster).unwrap();
//! assert_eq!((placed[0].from_hour, placed[0].from_minute), (9, 0));
//! assert_eq!((placed[1].from_hour, placed[1].from_minute), (9, 30));
//! ```
//!
//! # Features
//!
//! - `parallel`: expand students concurrently with rayon
//! - `serde`: `Serialize`/`Deserialize` on records, configs and schedules

pub mod calendar;
pub mod cp;
pub mod error;
pub mod planner;
pub mod roster;

pub use error::{PlanError, Result};
