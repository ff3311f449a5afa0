//! Plain data shapes exchanged with callers.
//!
//! These mirror the roster input and schedule output documents. Reading and
//! writing them (JSON or otherwise) is left to the caller; with the `serde`
//! feature they derive `Serialize`/`Deserialize`.

use super::types::{AvailabilityRange, Roster};
use crate::calendar::{TimeChunk, Weekday, CHUNK_MINUTES};
use crate::error::{PlanError, Result};

/// One declared availability window.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AvailabilityRecord {
    /// Upper-case weekday name, e.g. `"MONDAY"`.
    pub day: String,
    pub from_hour: u32,
    pub from_minute: u32,
    pub to_hour: u32,
    pub to_minute: u32,
}

impl AvailabilityRecord {
    pub fn new(day: &str, from: (u32, u32), to: (u32, u32)) -> Self {
        Self {
            day: day.to_string(),
            from_hour: from.0,
            from_minute: from.1,
            to_hour: to.0,
            to_minute: to.1,
        }
    }

    /// Converts into a typed range. Any malformed field is a parse error.
    ///
    /// Minutes off the chunk grid shrink the range: the start rounds up to
    /// the next chunk, the end rounds down. A window narrower than a chunk
    /// becomes empty.
    pub fn to_range(&self) -> Result<AvailabilityRange> {
        let day: Weekday = self.day.parse()?;
        let start = TimeChunk::from_weekday_time(day, self.from_hour, self.from_minute)
            .map_err(into_parse)?;
        let end = TimeChunk::from_weekday_time(day, self.to_hour, self.to_minute)
            .map_err(into_parse)?;
        let mut range = AvailabilityRange::new(start, end)?;
        if self.from_minute % CHUNK_MINUTES != 0 {
            range.start = (range.start + 1).min(range.end);
        }
        Ok(range)
    }
}

/// One student as supplied by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StudentRecord {
    pub id: u64,
    pub name: String,
    pub lesson_duration_minutes: u32,
    pub availabilities: Vec<AvailabilityRecord>,
}

/// One placed lesson in the output document.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AssignmentRecord {
    pub student_id: u64,
    pub student_name: String,
    pub day: String,
    pub from_hour: u32,
    pub from_minute: u32,
    pub to_hour: u32,
    pub to_minute: u32,
}

/// One omitted student in the output document.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OmissionRecord {
    pub student_id: u64,
    pub student_name: String,
}

impl Roster {
    /// Builds a roster from input records, registering them in order.
    ///
    /// Fails with [`PlanError::Parse`] on unknown weekday names, invalid
    /// times, inverted ranges and durations that are zero or not a whole
    /// number of chunks.
    pub fn from_records(records: &[StudentRecord]) -> Result<Self> {
        let mut roster = Roster::new();
        for record in records {
            let minutes = record.lesson_duration_minutes;
            if minutes == 0 || minutes % CHUNK_MINUTES != 0 {
                return Err(PlanError::Parse(format!(
                    "lesson duration of {} must be a positive multiple of {CHUNK_MINUTES} minutes, but is {minutes}",
                    record.name
                )));
            }
            let ranges = record
                .availabilities
                .iter()
                .map(AvailabilityRecord::to_range)
                .collect::<Result<Vec<_>>>()?;
            roster.register(record.id, record.name.clone(), minutes / CHUNK_MINUTES, ranges)?;
        }
        log::debug!("registered {} students", roster.len());
        Ok(roster)
    }
}

fn into_parse(err: PlanError) -> PlanError {
    match err {
        PlanError::InvalidTime(msg) => PlanError::Parse(msg),
        other => other,
    }
}
