//! Students, their availability, and candidate lesson starts.
//!
//! - [`Roster`] owns the registered [`Student`]s for one solve.
//! - [`ExpansionPolicy`] turns each [`AvailabilityRange`] into a bounded,
//!   ordered sequence of candidate starts ([`Candidates`]).
//! - [`StudentRecord`] and friends are the caller-facing data shapes.

mod expansion;
mod records;
mod types;

pub use expansion::{Candidate, CandidateIter, Candidates, ExpansionPolicy};
pub use records::{AssignmentRecord, AvailabilityRecord, OmissionRecord, StudentRecord};
pub use types::{AvailabilityRange, Roster, Student};
