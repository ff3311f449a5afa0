//! Schedules and their extraction from search results.

use super::backtrack::{BacktrackOutcome, OccupancyGrid};
use super::builder::PlannerModel;
use super::holes::HoleRecord;
use crate::calendar::TimeChunk;
use crate::cp::{CpSolution, SolverStatus};
use crate::error::{PlanError, Result};
use crate::roster::{AssignmentRecord, OmissionRecord, Roster};

/// How good a returned schedule is known to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ScheduleStatus {
    /// Proven optimal for the configured objective, or the only answer a
    /// satisfaction search needed.
    Optimal,
    /// Valid, but the budget ran out before optimality was proven.
    Feasible,
}

/// One placed lesson.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ScheduleAssignment {
    /// Registration index of the student.
    pub student: usize,
    pub start: TimeChunk,
    /// Exclusive end.
    pub end: TimeChunk,
    /// Wish rank of the range the lesson lies in.
    pub preference_index: u32,
}

impl ScheduleAssignment {
    pub fn overlaps(&self, other: &ScheduleAssignment) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// One omitted student.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SkipRecord {
    pub student: usize,
}

/// Search statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SolveStats {
    /// Model variables (0 for backtracking).
    pub variables: usize,
    /// Model constraints (0 for backtracking).
    pub constraints: usize,
    pub steps: u64,
    pub elapsed_ms: i64,
}

/// A successful solve.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Schedule {
    pub assignments: Vec<ScheduleAssignment>,
    /// Omitted students, in registration order.
    pub skipped: Vec<SkipRecord>,
    pub status: ScheduleStatus,
    /// Objective value, when the model had one.
    pub objective_value: Option<i64>,
    /// Per-slot hole state, when hole minimization was enabled.
    pub holes: Vec<HoleRecord>,
    pub stats: SolveStats,
}

impl Schedule {
    /// Builds a schedule from a finished backtracking search.
    ///
    /// Scans the grid left to right; each run of chunks owned by one
    /// student becomes one assignment.
    pub fn from_backtrack(roster: &Roster, outcome: &BacktrackOutcome) -> Result<Self> {
        let assignments = scan_grid(roster, &outcome.grid)?;
        Ok(Self {
            assignments,
            skipped: outcome
                .skipped
                .iter()
                .map(|&student| SkipRecord { student })
                .collect(),
            status: ScheduleStatus::Optimal,
            objective_value: None,
            holes: Vec::new(),
            stats: SolveStats {
                variables: 0,
                constraints: 0,
                steps: outcome.steps,
                elapsed_ms: outcome.elapsed_ms,
            },
        })
    }

    /// Builds a schedule from a solver solution of `planner`.
    ///
    /// Fails with [`PlanError::ResultInconsistency`] when a student that is
    /// not skipped has zero or several chosen candidates, and with the
    /// matching error when the solution carries no assignment.
    pub fn from_solution(
        roster: &Roster,
        planner: &PlannerModel,
        solution: &CpSolution,
    ) -> Result<Self> {
        let status = match solution.status {
            SolverStatus::Optimal => ScheduleStatus::Optimal,
            SolverStatus::Feasible => ScheduleStatus::Feasible,
            other => return Err(status_error(other)),
        };
        if solution.values.len() != planner.model.var_count() {
            return Err(PlanError::ResultInconsistency(format!(
                "solution has {} values for {} variables",
                solution.values.len(),
                planner.model.var_count()
            )));
        }

        let mut assignments = Vec::new();
        let mut skipped = Vec::new();
        for (index, vars) in planner.students.iter().enumerate() {
            let name = roster.get(index).map_or("?", |s| s.name.as_str());
            let duration = roster.get(index).map_or(0, |s| s.duration);
            let is_skipped = vars.skip.is_some_and(|v| solution.value(v));
            let mut chosen = vars
                .candidates
                .iter()
                .filter(|(_, var)| solution.value(*var));

            if is_skipped {
                if chosen.next().is_some() {
                    return Err(PlanError::ResultInconsistency(format!(
                        "{name} is both skipped and placed"
                    )));
                }
                skipped.push(SkipRecord { student: index });
                continue;
            }

            let (candidate, _) = chosen.next().ok_or_else(|| {
                PlanError::ResultInconsistency(format!("{name} has no chosen start"))
            })?;
            if chosen.next().is_some() {
                return Err(PlanError::ResultInconsistency(format!(
                    "{name} has several chosen starts"
                )));
            }
            assignments.push(ScheduleAssignment {
                student: index,
                start: candidate.slot,
                end: candidate.slot + duration,
                preference_index: candidate.preference_index,
            });
        }

        let holes = planner
            .holes
            .as_ref()
            .map(|analysis| analysis.records(solution))
            .unwrap_or_default();

        Ok(Self {
            assignments,
            skipped,
            status,
            objective_value: solution.objective_value,
            holes,
            stats: SolveStats {
                variables: planner.model.var_count(),
                constraints: planner.model.constraint_count(),
                steps: solution.steps,
                elapsed_ms: solution.solve_time_ms,
            },
        })
    }

    /// Whether no two assignments overlap.
    pub fn is_disjoint(&self) -> bool {
        self.assignments
            .iter()
            .enumerate()
            .all(|(i, a)| self.assignments[i + 1..].iter().all(|b| !a.overlaps(b)))
    }

    /// Assignment of the student at `index`, if placed.
    pub fn assignment_of(&self, index: usize) -> Option<&ScheduleAssignment> {
        self.assignments.iter().find(|a| a.student == index)
    }

    /// Number of hole slots in the schedule.
    pub fn hole_count(&self) -> usize {
        self.holes.iter().filter(|h| h.hole).count()
    }

    /// Output records: assignments in schedule order, then omissions.
    pub fn to_records(
        &self,
        roster: &Roster,
    ) -> Result<(Vec<AssignmentRecord>, Vec<OmissionRecord>)> {
        let student = |index: usize| {
            roster.get(index).ok_or_else(|| {
                PlanError::ResultInconsistency(format!("unknown student #{index}"))
            })
        };

        let mut placed = Vec::with_capacity(self.assignments.len());
        for a in &self.assignments {
            let s = student(a.student)?;
            placed.push(AssignmentRecord {
                student_id: s.id,
                student_name: s.name.clone(),
                day: a.start.weekday().name().to_string(),
                from_hour: a.start.hour(),
                from_minute: a.start.minute(),
                to_hour: a.end.hour(),
                to_minute: a.end.minute(),
            });
        }
        let mut omitted = Vec::with_capacity(self.skipped.len());
        for skip in &self.skipped {
            let s = student(skip.student)?;
            omitted.push(OmissionRecord {
                student_id: s.id,
                student_name: s.name.clone(),
            });
        }
        Ok((placed, omitted))
    }
}

/// Error for a solver status that carries no schedule.
pub(crate) fn status_error(status: SolverStatus) -> PlanError {
    match status {
        SolverStatus::Infeasible => PlanError::Infeasible,
        SolverStatus::Timeout => PlanError::Timeout,
        SolverStatus::Unknown => PlanError::Unknown,
        SolverStatus::ModelInvalid => {
            PlanError::ModelInvalid("rejected by the solver".to_string())
        }
        SolverStatus::Optimal | SolverStatus::Feasible => {
            PlanError::ResultInconsistency(format!("{status:?} solution without values"))
        }
    }
}

fn scan_grid(roster: &Roster, grid: &OccupancyGrid) -> Result<Vec<ScheduleAssignment>> {
    let mut assignments = Vec::new();
    let mut run: Option<(usize, usize)> = None;
    // A trailing None closes the last run.
    let cells = grid.cells().iter().copied().chain(std::iter::once(None));
    for (i, cell) in cells.enumerate() {
        match (run, cell) {
            (Some((owner, _)), Some(current)) if owner == current => continue,
            (Some((owner, from)), _) => {
                assignments.push(close_run(roster, owner, from, i)?);
                run = cell.map(|current| (current, i));
            }
            (None, _) => run = cell.map(|current| (current, i)),
        }
    }
    Ok(assignments)
}

fn close_run(roster: &Roster, owner: usize, from: usize, to: usize) -> Result<ScheduleAssignment> {
    let student = roster.get(owner).ok_or_else(|| {
        PlanError::ResultInconsistency(format!("grid names unknown student #{owner}"))
    })?;
    let start = TimeChunk::from_index(from as u32);
    let end = TimeChunk::from_index(to as u32);
    if (to - from) as u32 != student.duration {
        return Err(PlanError::ResultInconsistency(format!(
            "{} occupies {} chunks, expected {}",
            student.name,
            to - from,
            student.duration
        )));
    }
    let preference_index = student.preference_of(start).ok_or_else(|| {
        PlanError::ResultInconsistency(format!(
            "{} placed outside availability at {start}",
            student.name
        ))
    })?;
    Ok(ScheduleAssignment {
        student: owner,
        start,
        end,
        preference_index: preference_index as u32,
    })
}
