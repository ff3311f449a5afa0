//! Point-in-week time chunks.

use super::day::Weekday;
use crate::error::{PlanError, Result};
use std::fmt;
use std::ops::{Add, AddAssign, Sub};

/// Length of one chunk in minutes.
pub const CHUNK_MINUTES: u32 = 10;

/// Number of chunks in one day.
pub const CHUNKS_PER_DAY: u32 = 24 * 60 / CHUNK_MINUTES;

/// Number of chunks in one week (size of the time domain).
pub const CHUNKS_PER_WEEK: u32 = 7 * CHUNKS_PER_DAY;

/// A point in the week with [`CHUNK_MINUTES`] granularity.
///
/// Stored as the chunk offset from Monday 00:00. Arithmetic is in whole
/// chunks; ordering follows the offset.
///
/// # Examples
///
/// ```
/// use lesson_planner::calendar::{TimeChunk, Weekday};
///
/// let t = TimeChunk::from_weekday_time(Weekday::Tuesday, 9, 30).unwrap();
/// assert_eq!(t.weekday(), Weekday::Tuesday);
/// assert_eq!((t + 3).hour(), 10);
/// assert_eq!(t.to_string(), "TUESDAY 09:30");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TimeChunk(u32);

impl TimeChunk {
    /// Builds a chunk from a day and a wall-clock time.
    ///
    /// Minutes that are not a multiple of [`CHUNK_MINUTES`] are floored to
    /// the chunk that contains them.
    pub fn from_weekday_time(day: Weekday, hour: u32, minute: u32) -> Result<Self> {
        if hour >= 24 {
            return Err(PlanError::InvalidTime(format!(
                "hour needs to be in range 0-23, but is {hour}"
            )));
        }
        if minute >= 60 {
            return Err(PlanError::InvalidTime(format!(
                "minute needs to be in range 0-59, but is {minute}"
            )));
        }
        Ok(Self(((day.index() * 24 + hour) * 60 + minute) / CHUNK_MINUTES))
    }

    /// Builds a chunk from a raw offset. No validation.
    pub const fn from_index(index: u32) -> Self {
        Self(index)
    }

    /// Chunk offset from the start of the week.
    pub const fn index(self) -> u32 {
        self.0
    }

    /// Chunk offset from the start of this chunk's day.
    pub const fn chunk_of_day(self) -> u32 {
        self.0 % CHUNKS_PER_DAY
    }

    /// Day this chunk falls on. Offsets past the week clamp to Sunday.
    pub fn weekday(self) -> Weekday {
        Weekday::from_index(self.0 / CHUNKS_PER_DAY).unwrap_or(Weekday::Sunday)
    }

    pub fn hour(self) -> u32 {
        self.chunk_of_day() * CHUNK_MINUTES / 60
    }

    pub fn minute(self) -> u32 {
        self.chunk_of_day() * CHUNK_MINUTES % 60
    }

    /// Formats only the wall-clock part, e.g. `09:30`.
    pub fn clock(self) -> String {
        format!("{:02}:{:02}", self.hour(), self.minute())
    }
}

impl Add<u32> for TimeChunk {
    type Output = TimeChunk;

    /// Saturates instead of overflowing.
    fn add(self, chunks: u32) -> TimeChunk {
        TimeChunk(self.0.saturating_add(chunks))
    }
}

impl AddAssign<u32> for TimeChunk {
    fn add_assign(&mut self, chunks: u32) {
        *self = *self + chunks;
    }
}

impl Sub<u32> for TimeChunk {
    type Output = TimeChunk;

    /// Saturates at the start of the week.
    fn sub(self, chunks: u32) -> TimeChunk {
        TimeChunk(self.0.saturating_sub(chunks))
    }
}

impl fmt::Display for TimeChunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {:02}:{:02}", self.weekday(), self.hour(), self.minute())
    }
}
