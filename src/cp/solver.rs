//! CP solver interface.

use super::model::CpModel;
use super::variables::VarId;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Status of the solver after execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolverStatus {
    /// Proven optimal solution found.
    Optimal,
    /// Feasible (but not necessarily optimal) solution found.
    Feasible,
    /// No feasible solution exists.
    Infeasible,
    /// Model is invalid or malformed.
    ModelInvalid,
    /// Solver exceeded its time limit or was cancelled.
    Timeout,
    /// No solution found for unknown reasons (e.g. step budget).
    Unknown,
}

/// Solution from a CP solver.
#[derive(Debug, Clone)]
pub struct CpSolution {
    /// Solver status.
    pub status: SolverStatus,
    /// Objective function value (if the model has one and a solution exists).
    pub objective_value: Option<i64>,
    /// One value per model variable, indexed by [`VarId`]. Empty when no
    /// solution was found.
    pub values: Vec<bool>,
    /// Search steps spent.
    pub steps: u64,
    /// Solve time in milliseconds.
    pub solve_time_ms: i64,
}

impl CpSolution {
    /// Creates an empty solution with the given status.
    pub fn empty(status: SolverStatus) -> Self {
        Self {
            status,
            objective_value: None,
            values: Vec::new(),
            steps: 0,
            solve_time_ms: 0,
        }
    }

    /// Whether a feasible solution was found.
    pub fn is_solution_found(&self) -> bool {
        matches!(self.status, SolverStatus::Optimal | SolverStatus::Feasible)
    }

    /// Value of `var`, `false` when absent.
    pub fn value(&self, var: VarId) -> bool {
        self.values.get(var.index()).copied().unwrap_or(false)
    }
}

/// Solver configuration.
///
/// The budget is forwarded opaquely to the solver implementation.
#[derive(Debug, Clone, Default)]
pub struct SolverConfig {
    /// Maximum solve time in milliseconds. 0 = no limit.
    pub time_limit_ms: u64,
    /// Maximum search steps. 0 = no limit.
    pub max_steps: u64,
    /// Stop after finding the first feasible solution.
    pub stop_after_first: bool,
}

impl SolverConfig {
    pub fn with_time_limit_ms(mut self, ms: u64) -> Self {
        self.time_limit_ms = ms;
        self
    }

    pub fn with_max_steps(mut self, steps: u64) -> Self {
        self.max_steps = steps;
        self
    }

    pub fn with_stop_after_first(mut self, stop: bool) -> Self {
        self.stop_after_first = stop;
        self
    }
}

/// Trait for CP solver implementations.
///
/// Implementors provide the actual constraint solving logic. This can wrap
/// an external engine (e.g. a CP-SAT binding) or a custom search. The model
/// is read-only; solvers must not keep global state between calls.
pub trait CpSolver {
    /// Solves the model and returns a solution.
    fn solve(&self, model: &CpModel, config: &SolverConfig) -> CpSolution {
        self.solve_with_cancel(model, config, None)
    }

    /// Solves with an optional cancellation token.
    ///
    /// When the flag becomes `true` the solver stops at its next safe point
    /// and reports `Feasible` (incumbent found) or `Timeout`.
    fn solve_with_cancel(
        &self,
        model: &CpModel,
        config: &SolverConfig,
        cancel: Option<Arc<AtomicBool>>,
    ) -> CpSolution;

    /// Lazily enumerates every satisfying assignment, ignoring the objective.
    ///
    /// Each item is a `Feasible` solution. If the model is invalid or the
    /// budget runs out, a final item carries that status instead. Calling
    /// this again restarts the enumeration.
    fn enumerate(
        &self,
        model: &CpModel,
        config: &SolverConfig,
    ) -> Box<dyn Iterator<Item = CpSolution> + Send>;
}

/// Why a search stopped before finishing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Interrupt {
    Cancelled,
    Deadline,
    Steps,
}

impl Interrupt {
    /// Status reported when no solution was found before the interrupt.
    pub(crate) fn status(self) -> SolverStatus {
        match self {
            Interrupt::Cancelled | Interrupt::Deadline => SolverStatus::Timeout,
            Interrupt::Steps => SolverStatus::Unknown,
        }
    }
}

/// Resource budget checked at the safe points of a search.
#[derive(Debug, Clone)]
pub(crate) struct Budget {
    started: Instant,
    deadline: Option<Instant>,
    max_steps: u64,
    cancel: Option<Arc<AtomicBool>>,
}

impl Budget {
    pub(crate) fn new(time_limit_ms: u64, max_steps: u64, cancel: Option<Arc<AtomicBool>>) -> Self {
        let started = Instant::now();
        let deadline = (time_limit_ms > 0)
            .then(|| started.checked_add(Duration::from_millis(time_limit_ms)))
            .flatten();
        Self {
            started,
            deadline,
            max_steps,
            cancel,
        }
    }

    pub(crate) fn from_config(config: &SolverConfig, cancel: Option<Arc<AtomicBool>>) -> Self {
        Self::new(config.time_limit_ms, config.max_steps, cancel)
    }

    /// Returns the reason to stop, if any, after `steps` steps.
    pub(crate) fn check(&self, steps: u64) -> Option<Interrupt> {
        if let Some(ref flag) = self.cancel {
            if flag.load(Ordering::Relaxed) {
                return Some(Interrupt::Cancelled);
            }
        }
        if self.max_steps > 0 && steps > self.max_steps {
            return Some(Interrupt::Steps);
        }
        if let Some(deadline) = self.deadline {
            if Instant::now() >= deadline {
                return Some(Interrupt::Deadline);
            }
        }
        None
    }

    pub(crate) fn elapsed_ms(&self) -> i64 {
        self.started.elapsed().as_millis() as i64
    }
}
