//! Availability expansion into candidate lesson starts.

use super::types::{AvailabilityRange, Roster, Student};
use crate::calendar::TimeChunk;
use crate::error::{PlanError, Result};

/// How availability ranges are sampled into candidate starts.
///
/// # Examples
///
/// ```
/// use lesson_planner::roster::ExpansionPolicy;
///
/// let policy = ExpansionPolicy::default()
///     .with_max_attempts(4)
///     .with_step(2);
/// assert!(policy.validate().is_ok());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ExpansionPolicy {
    /// Maximum candidates taken from one range. `None` = unbounded.
    pub max_attempts: Option<u32>,

    /// Distance between consecutive candidates, in chunks.
    pub step: u32,

    /// Expand students concurrently (requires the `parallel` feature).
    pub parallel: bool,
}

impl Default for ExpansionPolicy {
    fn default() -> Self {
        Self {
            max_attempts: None,
            step: 1,
            parallel: false,
        }
    }
}

impl ExpansionPolicy {
    pub fn with_max_attempts(mut self, n: u32) -> Self {
        self.max_attempts = Some(n);
        self
    }

    pub fn with_step(mut self, step: u32) -> Self {
        self.step = step;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Validates the policy.
    pub fn validate(&self) -> Result<()> {
        if self.step == 0 {
            return Err(PlanError::InvalidConfig("step must be at least 1".into()));
        }
        if self.max_attempts == Some(0) {
            return Err(PlanError::InvalidConfig(
                "max_attempts must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Candidate starts of one range for a lesson of `duration` chunks.
    pub fn expand(&self, range: AvailabilityRange, duration: u32) -> CandidateIter {
        CandidateIter {
            next: range.start,
            end: range.end,
            duration,
            step: self.step.max(1),
            remaining: self.max_attempts,
        }
    }
}

/// Ordered candidate starts within one availability range.
///
/// Finite and restartable: clone it before consuming to iterate again.
#[derive(Debug, Clone)]
pub struct CandidateIter {
    next: TimeChunk,
    end: TimeChunk,
    duration: u32,
    step: u32,
    remaining: Option<u32>,
}

impl Iterator for CandidateIter {
    type Item = TimeChunk;

    fn next(&mut self) -> Option<TimeChunk> {
        if self.remaining == Some(0) {
            return None;
        }
        let fits = self
            .next
            .index()
            .checked_add(self.duration)
            .is_some_and(|end| end <= self.end.index());
        if !fits {
            self.remaining = Some(0);
            return None;
        }
        let current = self.next;
        if let Some(n) = self.remaining.as_mut() {
            *n -= 1;
        }
        match current.index().checked_add(self.step) {
            Some(next) => self.next = TimeChunk::from_index(next),
            // The following start would leave the week.
            None => self.remaining = Some(0),
        }
        Some(current)
    }
}

/// One possible lesson start offered to the search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Candidate {
    pub slot: TimeChunk,
    /// Index of the range this start came from (0 = first wish).
    pub preference_index: u32,
}

/// Expanded candidates for every student of a roster, in roster order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Candidates {
    per_student: Vec<Vec<Candidate>>,
}

impl Candidates {
    /// Expands every student's ranges, in range order.
    pub fn expand(roster: &Roster, policy: &ExpansionPolicy) -> Result<Self> {
        policy.validate()?;
        Ok(Self {
            per_student: expand_all(roster, policy),
        })
    }

    /// Candidates of the student at `index` (empty if out of range).
    pub fn of(&self, index: usize) -> &[Candidate] {
        self.per_student.get(index).map_or(&[], Vec::as_slice)
    }

    /// Number of students covered.
    pub fn len(&self) -> usize {
        self.per_student.len()
    }

    pub fn is_empty(&self) -> bool {
        self.per_student.is_empty()
    }

    /// Total number of candidates across all students.
    pub fn total(&self) -> usize {
        self.per_student.iter().map(Vec::len).sum()
    }
}

#[cfg(feature = "parallel")]
fn expand_all(roster: &Roster, policy: &ExpansionPolicy) -> Vec<Vec<Candidate>> {
    use rayon::prelude::*;

    if policy.parallel {
        roster
            .students()
            .par_iter()
            .map(|student| expand_student(student, policy))
            .collect()
    } else {
        roster
            .students()
            .iter()
            .map(|student| expand_student(student, policy))
            .collect()
    }
}

#[cfg(not(feature = "parallel"))]
fn expand_all(roster: &Roster, policy: &ExpansionPolicy) -> Vec<Vec<Candidate>> {
    roster
        .students()
        .iter()
        .map(|student| expand_student(student, policy))
        .collect()
}

fn expand_student(student: &Student, policy: &ExpansionPolicy) -> Vec<Candidate> {
    student
        .ranges
        .iter()
        .enumerate()
        .flat_map(|(preference_index, range)| {
            policy
                .expand(*range, student.duration)
                .map(move |slot| Candidate {
                    slot,
                    preference_index: preference_index as u32,
                })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::Weekday;

    fn at(hour: u32, minute: u32) -> TimeChunk {
        TimeChunk::from_weekday_time(Weekday::Monday, hour, minute).unwrap()
    }

    fn range(from: (u32, u32), to: (u32, u32)) -> AvailabilityRange {
        AvailabilityRange::new(at(from.0, from.1), at(to.0, to.1)).unwrap()
    }

    #[test]
    fn test_attempt_cap() {
        let policy = ExpansionPolicy::default().with_step(1).with_max_attempts(2);
        let starts: Vec<_> = policy.expand(range((9, 0), (10, 0)), 2).collect();
        assert_eq!(starts, vec![at(9, 0), at(9, 10)]);
    }

    #[test]
    fn test_unbounded_stops_at_last_fit() {
        let policy = ExpansionPolicy::default();
        let starts: Vec<_> = policy.expand(range((9, 0), (10, 0)), 2).collect();
        assert_eq!(starts.len(), 5);
        assert_eq!(starts.last(), Some(&at(9, 40)));
    }

    #[test]
    fn test_step() {
        let policy = ExpansionPolicy::default().with_step(2);
        let starts: Vec<_> = policy.expand(range((9, 0), (10, 0)), 3).collect();
        assert_eq!(starts, vec![at(9, 0), at(9, 20)]);
    }

    #[test]
    fn test_short_range_is_empty() {
        let policy = ExpansionPolicy::default();
        assert_eq!(policy.expand(range((9, 0), (9, 20)), 3).count(), 0);
        assert_eq!(policy.expand(range((9, 0), (9, 30)), 3).count(), 1);
    }

    #[test]
    fn test_huge_step_stays_in_range() {
        let policy = ExpansionPolicy::default().with_step(u32::MAX - 10);
        assert!(policy.validate().is_ok());
        let starts: Vec<_> = policy.expand(range((9, 0), (10, 0)), 2).collect();
        assert_eq!(starts, vec![at(9, 0)]);
    }

    #[test]
    fn test_huge_duration_yields_nothing() {
        let policy = ExpansionPolicy::default();
        assert_eq!(policy.expand(range((9, 0), (10, 0)), u32::MAX).count(), 0);
    }

    #[test]
    fn test_restartable() {
        let iter = ExpansionPolicy::default().expand(range((9, 0), (9, 40)), 2);
        let first: Vec<_> = iter.clone().collect();
        let second: Vec<_> = iter.collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_validate() {
        assert!(ExpansionPolicy::default().validate().is_ok());
        assert!(ExpansionPolicy::default().with_step(0).validate().is_err());
        assert!(ExpansionPolicy::default()
            .with_max_attempts(0)
            .validate()
            .is_err());
    }

    #[test]
    fn test_expand_roster_keeps_preference_order() {
        let mut roster = Roster::new();
        roster
            .register(1, "A", 3, vec![range((14, 0), (14, 30)), range((9, 0), (9, 40))])
            .unwrap();
        roster.register(2, "B", 3, vec![range((9, 0), (9, 20))]).unwrap();

        let candidates = Candidates::expand(&roster, &ExpansionPolicy::default()).unwrap();
        assert_eq!(candidates.len(), 2);
        let a = candidates.of(0);
        assert_eq!(a.len(), 3);
        assert_eq!(a[0], Candidate { slot: at(14, 0), preference_index: 0 });
        assert_eq!(a[1], Candidate { slot: at(9, 0), preference_index: 1 });
        assert_eq!(a[2], Candidate { slot: at(9, 10), preference_index: 1 });
        assert!(candidates.of(1).is_empty());
        assert_eq!(candidates.total(), 3);
    }

    #[test]
    fn test_parallel_flag_matches_sequential() {
        let mut roster = Roster::new();
        for i in 0..8 {
            roster
                .register(i, format!("S{i}"), 2, vec![range((8, 0), (12, 0))])
                .unwrap();
        }
        let seq = Candidates::expand(&roster, &ExpansionPolicy::default()).unwrap();
        let par = Candidates::expand(
            &roster,
            &ExpansionPolicy::default().with_parallel(true),
        )
        .unwrap();
        assert_eq!(seq, par);
    }
}
