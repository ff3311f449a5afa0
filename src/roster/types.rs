//! Students, availability ranges and the roster that owns them.

use crate::calendar::{TimeChunk, CHUNKS_PER_WEEK, CHUNK_MINUTES};
use crate::error::{PlanError, Result};

/// A contiguous window in which a student can take a lesson.
///
/// Invariant: `start <= end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AvailabilityRange {
    pub start: TimeChunk,
    pub end: TimeChunk,
}

impl AvailabilityRange {
    /// Creates a range, rejecting `end < start`.
    pub fn new(start: TimeChunk, end: TimeChunk) -> Result<Self> {
        if end < start {
            return Err(PlanError::Parse(format!(
                "availability ends ({end}) before it starts ({start})"
            )));
        }
        Ok(Self { start, end })
    }

    /// Length in chunks.
    pub fn len(&self) -> u32 {
        self.end.index() - self.start.index()
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Whether `[start, start + duration)` fits inside this range.
    pub fn contains_lesson(&self, start: TimeChunk, duration: u32) -> bool {
        self.start <= start && start + duration <= self.end
    }
}

/// A student to be scheduled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Student {
    /// Caller-supplied identifier.
    pub id: u64,
    /// Display name.
    pub name: String,
    /// Lesson length in chunks (> 0).
    pub duration: u32,
    /// Registration rank, 1 for the first registered student.
    pub priority_weight: u32,
    /// Declared availability, most wanted first.
    pub ranges: Vec<AvailabilityRange>,
}

impl Student {
    /// Lesson length in minutes.
    pub fn duration_minutes(&self) -> u32 {
        self.duration * CHUNK_MINUTES
    }

    /// Index of the first range that contains a lesson starting at `start`.
    ///
    /// This is the student's wish rank for that start (0 = first wish).
    pub fn preference_of(&self, start: TimeChunk) -> Option<usize> {
        self.ranges
            .iter()
            .position(|range| range.contains_lesson(start, self.duration))
    }
}

/// Ordered set of students taking part in one solve.
///
/// Registration order is significant: it fixes both the backtracking order
/// and every student's `priority_weight`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Roster {
    students: Vec<Student>,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a student and returns its index.
    ///
    /// `duration` is in chunks and must be positive and no longer than a
    /// week. The priority weight is assigned from the registration position.
    pub fn register(
        &mut self,
        id: u64,
        name: impl Into<String>,
        duration: u32,
        ranges: Vec<AvailabilityRange>,
    ) -> Result<usize> {
        let name = name.into();
        if duration == 0 || duration > CHUNKS_PER_WEEK {
            return Err(PlanError::Parse(format!(
                "lesson duration of {name} must be between 1 and {CHUNKS_PER_WEEK} chunks, but is {duration}"
            )));
        }
        let index = self.students.len();
        self.students.push(Student {
            id,
            name,
            duration,
            priority_weight: index as u32 + 1,
            ranges,
        });
        Ok(index)
    }

    pub fn students(&self) -> &[Student] {
        &self.students
    }

    pub fn get(&self, index: usize) -> Option<&Student> {
        self.students.get(index)
    }

    pub fn len(&self) -> usize {
        self.students.len()
    }

    pub fn is_empty(&self) -> bool {
        self.students.is_empty()
    }
}
