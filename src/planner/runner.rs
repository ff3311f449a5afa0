//! Solve entry points.

use super::backtrack::Backtracker;
use super::builder::PlannerModel;
use super::config::SolveConfig;
use super::extract::{status_error, Schedule, ScheduleStatus};
use crate::cp::{Budget, CpSolution, CpSolver, SolverStatus};
use crate::error::{PlanError, Result};
use crate::roster::{Candidates, Roster};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Schedules one roster under one configuration.
///
/// Two engines are available: [`backtrack`](Planner::backtrack) finds the
/// first feasible placement in registration order without optimizing, and
/// [`optimize`](Planner::optimize) hands the full placement model to a
/// [`CpSolver`]. Their results are not expected to match.
///
/// # Examples
///
/// ```
/// use lesson_planner::cp::ExhaustiveSolver;
/// use lesson_planner::planner::{Planner, SolveConfig};
/// use lesson_planner::roster::{AvailabilityRecord, Roster, StudentRecord};
///
/// let roster = Roster::from_records(&[StudentRecord {
///     id: 1,
///     name: "Alice".into(),
///     lesson_duration_minutes: 30,
///     availabilities: vec![AvailabilityRecord::new("MONDAY", (9, 0), (10, 0))],
/// }])
/// .unwrap();
///
/// let planner = Planner::new(&roster, SolveConfig::default());
/// let schedule = planner.optimize(&ExhaustiveSolver::new()).unwrap();
/// assert_eq!(schedule.assignments.len(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct Planner<'a> {
    roster: &'a Roster,
    config: SolveConfig,
}

impl<'a> Planner<'a> {
    pub fn new(roster: &'a Roster, config: SolveConfig) -> Self {
        Self { roster, config }
    }

    pub fn config(&self) -> &SolveConfig {
        &self.config
    }

    /// Expands every student's availability under the configured policy.
    pub fn candidates(&self) -> Result<Candidates> {
        Candidates::expand(self.roster, &self.config.expansion)
    }

    /// Builds the placement model handed to a solver.
    pub fn build_model(&self) -> Result<PlannerModel> {
        let candidates = self.candidates()?;
        PlannerModel::build(self.roster, &candidates, &self.config)
    }

    /// Runs the backtracking engine.
    pub fn backtrack(&self) -> Result<Schedule> {
        self.backtrack_with_cancel(None)
    }

    /// Runs the backtracking engine with an optional cancellation token.
    ///
    /// The token, the time limit and the step limit of
    /// `config.solver` are checked before every placement attempt.
    pub fn backtrack_with_cancel(&self, cancel: Option<Arc<AtomicBool>>) -> Result<Schedule> {
        self.config.validate()?;
        let candidates = self.candidates()?;
        let budget = Budget::from_config(&self.config.solver, cancel);

        let outcome = Backtracker::new(self.roster, &candidates)
            .with_allow_skip(self.config.allow_skip)
            .search_with_budget(&budget)?;
        let schedule = Schedule::from_backtrack(self.roster, &outcome)?;

        log::info!(
            "backtracking placed {} of {} students in {} steps ({} ms)",
            schedule.assignments.len(),
            self.roster.len(),
            outcome.steps,
            outcome.elapsed_ms
        );
        self.warn_skipped(&schedule);
        Ok(schedule)
    }

    /// Builds the model and solves it with `solver`.
    pub fn optimize<S: CpSolver + ?Sized>(&self, solver: &S) -> Result<Schedule> {
        self.optimize_with_cancel(solver, None)
    }

    /// [`optimize`](Planner::optimize) with an optional cancellation token.
    ///
    /// A schedule whose optimality was not proven before the budget ran out
    /// comes back with [`ScheduleStatus::Feasible`].
    pub fn optimize_with_cancel<S: CpSolver + ?Sized>(
        &self,
        solver: &S,
        cancel: Option<Arc<AtomicBool>>,
    ) -> Result<Schedule> {
        let planner = self.build_model()?;
        if cancel.as_ref().is_some_and(|flag| flag.load(Ordering::Relaxed)) {
            log::warn!("solve cancelled before the solver was invoked");
            return Err(PlanError::Timeout);
        }

        let solution = solver.solve_with_cancel(&planner.model, &self.config.solver, cancel);
        log::info!(
            "solved '{}': {:?}, {} variables, {} constraints, {} steps, {} ms",
            planner.model.name,
            solution.status,
            planner.model.var_count(),
            planner.model.constraint_count(),
            solution.steps,
            solution.solve_time_ms
        );
        if !solution.is_solution_found() {
            if matches!(solution.status, SolverStatus::Timeout | SolverStatus::Unknown) {
                log::warn!("solver budget exhausted without a schedule");
            }
            return Err(status_error(solution.status));
        }

        let schedule = Schedule::from_solution(self.roster, &planner, &solution)?;
        if schedule.status == ScheduleStatus::Feasible {
            log::warn!("schedule is feasible but not proven optimal");
        }
        self.warn_skipped(&schedule);
        Ok(schedule)
    }

    /// Lazily enumerates every valid schedule of the model.
    ///
    /// Each item is a [`ScheduleStatus::Feasible`] schedule; a budget or
    /// model failure ends the stream with one error item. Call again to
    /// restart.
    pub fn enumerate<S: CpSolver + ?Sized>(&self, solver: &S) -> Result<ScheduleStream<'a>> {
        let planner = self.build_model()?;
        let solutions = solver.enumerate(&planner.model, &self.config.solver);
        Ok(ScheduleStream {
            roster: self.roster,
            planner,
            solutions,
        })
    }

    fn warn_skipped(&self, schedule: &Schedule) {
        for skip in &schedule.skipped {
            if let Some(student) = self.roster.get(skip.student) {
                log::warn!("{} (id {}) was skipped", student.name, student.id);
            }
        }
    }
}

/// Lazy stream of schedules produced by [`Planner::enumerate`].
pub struct ScheduleStream<'a> {
    roster: &'a Roster,
    planner: PlannerModel,
    solutions: Box<dyn Iterator<Item = CpSolution> + Send>,
}

impl ScheduleStream<'_> {
    /// The model being enumerated.
    pub fn model(&self) -> &PlannerModel {
        &self.planner
    }
}

impl Iterator for ScheduleStream<'_> {
    type Item = Result<Schedule>;

    fn next(&mut self) -> Option<Self::Item> {
        let solution = self.solutions.next()?;
        if !solution.is_solution_found() {
            return Some(Err(status_error(solution.status)));
        }
        Some(Schedule::from_solution(self.roster, &self.planner, &solution))
    }
}
