//! Exact backtracking over an occupancy grid.

use crate::calendar::{TimeChunk, CHUNKS_PER_WEEK};
use crate::cp::{Budget, Interrupt};
use crate::error::{PlanError, Result};
use crate::roster::{Candidates, Roster};

/// Owner of every chunk of the week.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OccupancyGrid {
    cells: Vec<Option<usize>>,
}

impl Default for OccupancyGrid {
    fn default() -> Self {
        Self::new()
    }
}

impl OccupancyGrid {
    pub fn new() -> Self {
        Self {
            cells: vec![None; CHUNKS_PER_WEEK as usize],
        }
    }

    /// Whether every chunk of `[start, start + duration)` is free and
    /// inside the week.
    pub fn is_free(&self, start: TimeChunk, duration: u32) -> bool {
        let from = start.index() as usize;
        let to = from + duration as usize;
        to <= self.cells.len() && self.cells[from..to].iter().all(Option::is_none)
    }

    /// Claims `[start, start + duration)` for `owner` if it is free.
    pub fn claim(&mut self, start: TimeChunk, duration: u32, owner: usize) -> bool {
        if !self.is_free(start, duration) {
            return false;
        }
        let from = start.index() as usize;
        for cell in &mut self.cells[from..from + duration as usize] {
            *cell = Some(owner);
        }
        true
    }

    /// Frees `[start, start + duration)`.
    pub fn release(&mut self, start: TimeChunk, duration: u32) {
        let from = (start.index() as usize).min(self.cells.len());
        let to = (from + duration as usize).min(self.cells.len());
        for cell in &mut self.cells[from..to] {
            *cell = None;
        }
    }

    pub fn owner(&self, slot: TimeChunk) -> Option<usize> {
        self.cells.get(slot.index() as usize).copied().flatten()
    }

    pub fn cells(&self) -> &[Option<usize>] {
        &self.cells
    }
}

/// Decision taken for one student.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Choice {
    Place(usize),
    Skip,
}

/// Final state of a successful backtracking search.
#[derive(Debug, Clone)]
pub struct BacktrackOutcome {
    pub grid: OccupancyGrid,
    /// Omitted students, in registration order.
    pub skipped: Vec<usize>,
    /// Placement attempts made.
    pub steps: u64,
    pub elapsed_ms: i64,
}

/// First-feasible placement search in registration order.
///
/// Candidates are tried in expansion order; with `allow_skip`, omitting
/// the student is tried last. The cursor stack holds, per student, the
/// next option to try.
///
/// # Examples
///
/// ```
/// use lesson_planner::calendar::{TimeChunk, Weekday};
/// use lesson_planner::planner::Backtracker;
/// use lesson_planner::roster::{AvailabilityRange, Candidates, ExpansionPolicy, Roster};
///
/// let at = |h, m| TimeChunk::from_weekday_time(Weekday::Monday, h, m).unwrap();
/// let mut roster = Roster::new();
/// let window = AvailabilityRange::new(at(9, 0), at(10, 0)).unwrap();
/// roster.register(1, "A", 3, vec![window]).unwrap();
/// roster.register(2, "B", 3, vec![window]).unwrap();
///
/// let candidates = Candidates::expand(&roster, &ExpansionPolicy::default()).unwrap();
/// let outcome = Backtracker::new(&roster, &candidates).search().unwrap();
/// assert_eq!(outcome.grid.owner(at(9, 0)), Some(0));
/// assert_eq!(outcome.grid.owner(at(9, 30)), Some(1));
/// ```
#[derive(Debug, Clone)]
pub struct Backtracker<'a> {
    roster: &'a Roster,
    candidates: &'a Candidates,
    allow_skip: bool,
}

impl<'a> Backtracker<'a> {
    pub fn new(roster: &'a Roster, candidates: &'a Candidates) -> Self {
        Self {
            roster,
            candidates,
            allow_skip: false,
        }
    }

    pub fn with_allow_skip(mut self, allow: bool) -> Self {
        self.allow_skip = allow;
        self
    }

    /// Runs without a budget.
    pub fn search(&self) -> Result<BacktrackOutcome> {
        self.search_with_budget(&Budget::new(0, 0, None))
    }

    /// Runs until every student is decided, the options run out
    /// ([`PlanError::Infeasible`]) or the budget stops it
    /// ([`PlanError::Timeout`] / [`PlanError::Unknown`]).
    pub(crate) fn search_with_budget(&self, budget: &Budget) -> Result<BacktrackOutcome> {
        let students = self.roster.students();
        let n = students.len();
        let mut grid = OccupancyGrid::new();
        let mut cursor = vec![0usize; n];
        let mut chosen: Vec<Option<Choice>> = vec![None; n];
        let mut depth = 0;
        let mut steps = 0u64;

        while depth < n {
            steps += 1;
            if let Some(reason) = budget.check(steps) {
                log::warn!("backtracking stopped after {steps} steps: {reason:?}");
                return Err(match reason {
                    Interrupt::Cancelled | Interrupt::Deadline => PlanError::Timeout,
                    Interrupt::Steps => PlanError::Unknown,
                });
            }

            let duration = students[depth].duration;
            let options = self.candidates.of(depth);
            let k = cursor[depth];
            cursor[depth] += 1;

            let decided = if k < options.len() {
                grid.claim(options[k].slot, duration, depth)
                    .then_some(Choice::Place(k))
            } else if k == options.len() && self.allow_skip {
                Some(Choice::Skip)
            } else {
                // Options exhausted: undo the previous student's choice.
                if depth == 0 {
                    return Err(PlanError::Infeasible);
                }
                depth -= 1;
                if let Some(Choice::Place(j)) = chosen[depth].take() {
                    let previous = self.candidates.of(depth)[j];
                    grid.release(previous.slot, students[depth].duration);
                }
                continue;
            };

            if let Some(choice) = decided {
                chosen[depth] = Some(choice);
                depth += 1;
                if depth < n {
                    cursor[depth] = 0;
                }
            }
        }

        let skipped: Vec<usize> = chosen
            .iter()
            .enumerate()
            .filter(|(_, c)| matches!(c, Some(Choice::Skip)))
            .map(|(i, _)| i)
            .collect();
        Ok(BacktrackOutcome {
            grid,
            skipped,
            steps,
            elapsed_ms: budget.elapsed_ms(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::Weekday;
    use crate::roster::{AvailabilityRange, ExpansionPolicy};
    use std::sync::atomic::AtomicBool;
    use std::sync::Arc;

    fn at(hour: u32, minute: u32) -> TimeChunk {
        TimeChunk::from_weekday_time(Weekday::Monday, hour, minute).unwrap()
    }

    fn range(from: (u32, u32), to: (u32, u32)) -> AvailabilityRange {
        AvailabilityRange::new(at(from.0, from.1), at(to.0, to.1)).unwrap()
    }

    fn expand(roster: &Roster) -> Candidates {
        Candidates::expand(roster, &ExpansionPolicy::default()).unwrap()
    }

    #[test]
    fn test_grid_claim_release() {
        let mut grid = OccupancyGrid::new();
        assert!(grid.claim(at(9, 0), 3, 0));
        assert!(!grid.claim(at(9, 20), 2, 1));
        assert!(grid.claim(at(9, 30), 2, 1));
        assert_eq!(grid.owner(at(9, 20)), Some(0));
        grid.release(at(9, 0), 3);
        assert_eq!(grid.owner(at(9, 20)), None);
        assert!(grid.claim(at(9, 20), 1, 2));
    }

    #[test]
    fn test_grid_rejects_past_week_end() {
        let mut grid = OccupancyGrid::new();
        let last = TimeChunk::from_index(CHUNKS_PER_WEEK - 1);
        assert!(grid.claim(last, 1, 0));
        assert!(!grid.is_free(last - 1, 3));
    }

    #[test]
    fn test_two_students_share_window() {
        let mut roster = Roster::new();
        roster.register(1, "A", 3, vec![range((9, 0), (10, 0))]).unwrap();
        roster.register(2, "B", 3, vec![range((9, 0), (10, 0))]).unwrap();
        let candidates = expand(&roster);

        let outcome = Backtracker::new(&roster, &candidates).search().unwrap();
        assert_eq!(outcome.grid.owner(at(9, 0)), Some(0));
        assert_eq!(outcome.grid.owner(at(9, 20)), Some(0));
        assert_eq!(outcome.grid.owner(at(9, 30)), Some(1));
        assert_eq!(outcome.grid.owner(at(9, 50)), Some(1));
        assert!(outcome.skipped.is_empty());
    }

    #[test]
    fn test_infeasible_when_range_too_short() {
        let mut roster = Roster::new();
        roster.register(1, "A", 3, vec![range((9, 0), (10, 0))]).unwrap();
        roster.register(2, "B", 3, vec![range((9, 0), (9, 20))]).unwrap();
        let candidates = expand(&roster);
        assert_eq!(
            Backtracker::new(&roster, &candidates).search().unwrap_err(),
            PlanError::Infeasible
        );
    }

    #[test]
    fn test_backtracks_earlier_student() {
        // A's first option blocks B's only option.
        let mut roster = Roster::new();
        roster
            .register(1, "A", 2, vec![range((9, 0), (9, 20)), range((10, 0), (10, 20))])
            .unwrap();
        roster.register(2, "B", 2, vec![range((9, 0), (9, 20))]).unwrap();
        let candidates = expand(&roster);

        let outcome = Backtracker::new(&roster, &candidates).search().unwrap();
        assert_eq!(outcome.grid.owner(at(10, 0)), Some(0));
        assert_eq!(outcome.grid.owner(at(9, 0)), Some(1));
        assert_eq!(outcome.grid.cells().iter().flatten().count(), 4);
    }

    #[test]
    fn test_skip_as_last_option() {
        let mut roster = Roster::new();
        roster.register(1, "A", 3, vec![range((9, 0), (9, 30))]).unwrap();
        roster.register(2, "B", 3, vec![range((9, 0), (9, 30))]).unwrap();
        roster.register(3, "C", 3, vec![range((11, 0), (11, 30))]).unwrap();
        let candidates = expand(&roster);

        let outcome = Backtracker::new(&roster, &candidates)
            .with_allow_skip(true)
            .search()
            .unwrap();
        assert_eq!(outcome.skipped, vec![1]);
        assert_eq!(outcome.grid.owner(at(9, 0)), Some(0));
        assert_eq!(outcome.grid.owner(at(11, 0)), Some(2));
    }

    #[test]
    fn test_empty_roster() {
        let roster = Roster::new();
        let candidates = expand(&roster);
        let outcome = Backtracker::new(&roster, &candidates).search().unwrap();
        assert!(outcome.grid.cells().iter().all(Option::is_none));
    }

    #[test]
    fn test_cancelled_is_timeout() {
        let mut roster = Roster::new();
        roster.register(1, "A", 3, vec![range((9, 0), (10, 0))]).unwrap();
        let candidates = expand(&roster);
        let budget = Budget::new(0, 0, Some(Arc::new(AtomicBool::new(true))));
        assert_eq!(
            Backtracker::new(&roster, &candidates)
                .search_with_budget(&budget)
                .unwrap_err(),
            PlanError::Timeout
        );
    }

    #[test]
    fn test_step_budget_is_unknown() {
        let mut roster = Roster::new();
        roster.register(1, "A", 3, vec![range((9, 0), (10, 0))]).unwrap();
        roster.register(2, "B", 3, vec![range((9, 0), (9, 20))]).unwrap();
        let candidates = expand(&roster);
        let budget = Budget::new(0, 2, None);
        assert_eq!(
            Backtracker::new(&roster, &candidates)
                .search_with_budget(&budget)
                .unwrap_err(),
            PlanError::Unknown
        );
    }

    #[test]
    fn test_deterministic() {
        let mut roster = Roster::new();
        for i in 0..5 {
            roster
                .register(i, format!("S{i}"), 2, vec![range((8, 0), (10, 0))])
                .unwrap();
        }
        let candidates = expand(&roster);
        let first = Backtracker::new(&roster, &candidates).search().unwrap();
        let second = Backtracker::new(&roster, &candidates).search().unwrap();
        assert_eq!(first.grid, second.grid);
    }
}
