//! Solve configuration.

use crate::calendar::{TimeChunk, Weekday};
use crate::cp::SolverConfig;
use crate::error::{PlanError, Result};
use crate::roster::ExpansionPolicy;

/// Daily window in which an empty slot counts as a lunch break.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LunchWindow {
    pub from_hour: u32,
    pub from_minute: u32,
    pub to_hour: u32,
    pub to_minute: u32,
}

impl Default for LunchWindow {
    fn default() -> Self {
        Self {
            from_hour: 12,
            from_minute: 0,
            to_hour: 13,
            to_minute: 0,
        }
    }
}

impl LunchWindow {
    pub fn new(from: (u32, u32), to: (u32, u32)) -> Self {
        Self {
            from_hour: from.0,
            from_minute: from.1,
            to_hour: to.0,
            to_minute: to.1,
        }
    }

    /// Validates the window: both ends are valid times and `from < to`.
    pub fn validate(&self) -> Result<()> {
        let (from, to) = self.bounds(Weekday::Monday)?;
        if from >= to {
            return Err(PlanError::InvalidConfig(format!(
                "lunch window {} - {} is empty",
                from.clock(),
                to.clock()
            )));
        }
        Ok(())
    }

    /// `[from, to)` of the window on `day`.
    pub fn bounds(&self, day: Weekday) -> Result<(TimeChunk, TimeChunk)> {
        let invalid = |e: PlanError| PlanError::InvalidConfig(format!("lunch window: {e}"));
        let from = TimeChunk::from_weekday_time(day, self.from_hour, self.from_minute)
            .map_err(invalid)?;
        let to = TimeChunk::from_weekday_time(day, self.to_hour, self.to_minute)
            .map_err(invalid)?;
        Ok((from, to))
    }

    /// Whether `t` lies inside the window of its own day.
    ///
    /// Both ends are floored to their chunk. An invalid window contains
    /// nothing.
    pub fn contains(&self, t: TimeChunk) -> bool {
        self.bounds(t.weekday())
            .is_ok_and(|(from, to)| from <= t && t < to)
    }
}

/// Configuration of one solve.
///
/// # Examples
///
/// ```
/// use lesson_planner::planner::SolveConfig;
///
/// let config = SolveConfig::default()
///     .with_step(2)
///     .with_max_attempts(3)
///     .with_allow_skip(true)
///     .with_time_limit_ms(5_000);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct SolveConfig {
    /// Candidate generation.
    pub expansion: ExpansionPolicy,

    /// Add the wish-rank preference cost to the objective.
    pub enable_preference_minimization: bool,

    /// Add hole penalties/rewards to the objective.
    pub enable_hole_minimization: bool,

    /// Multiplier applied to the wish rank before dividing by the
    /// student's priority weight.
    pub availability_index_scale: u32,

    /// Window in which holes are rewarded instead of penalized.
    pub lunch_window: LunchWindow,

    /// Cost of one hole slot outside the lunch window.
    pub hole_penalty_outside_lunch: u32,

    /// Reward (negative cost) of one hole slot inside the lunch window.
    pub hole_reward_inside_lunch: u32,

    /// Allow omitting students to keep the roster feasible.
    pub allow_skip: bool,

    /// Cost of omitting one student.
    pub skip_penalty: u32,

    /// Budget forwarded to the solver; `time_limit_ms` also bounds the
    /// backtracking search.
    pub solver: SolverConfig,
}

impl Default for SolveConfig {
    fn default() -> Self {
        Self {
            expansion: ExpansionPolicy::default(),
            enable_preference_minimization: true,
            enable_hole_minimization: true,
            availability_index_scale: 5,
            lunch_window: LunchWindow::default(),
            hole_penalty_outside_lunch: 150,
            hole_reward_inside_lunch: 10,
            allow_skip: false,
            skip_penalty: 1_000_000,
            solver: SolverConfig::default(),
        }
    }
}

impl SolveConfig {
    pub fn with_expansion(mut self, expansion: ExpansionPolicy) -> Self {
        self.expansion = expansion;
        self
    }

    pub fn with_max_attempts(mut self, n: u32) -> Self {
        self.expansion = self.expansion.with_max_attempts(n);
        self
    }

    pub fn with_step(mut self, step: u32) -> Self {
        self.expansion = self.expansion.with_step(step);
        self
    }

    pub fn with_preference_minimization(mut self, enabled: bool) -> Self {
        self.enable_preference_minimization = enabled;
        self
    }

    pub fn with_hole_minimization(mut self, enabled: bool) -> Self {
        self.enable_hole_minimization = enabled;
        self
    }

    pub fn with_availability_index_scale(mut self, scale: u32) -> Self {
        self.availability_index_scale = scale;
        self
    }

    pub fn with_lunch_window(mut self, window: LunchWindow) -> Self {
        self.lunch_window = window;
        self
    }

    pub fn with_hole_weights(mut self, penalty_outside: u32, reward_inside: u32) -> Self {
        self.hole_penalty_outside_lunch = penalty_outside;
        self.hole_reward_inside_lunch = reward_inside;
        self
    }

    pub fn with_allow_skip(mut self, allow: bool) -> Self {
        self.allow_skip = allow;
        self
    }

    pub fn with_skip_penalty(mut self, penalty: u32) -> Self {
        self.skip_penalty = penalty;
        self
    }

    pub fn with_time_limit_ms(mut self, ms: u64) -> Self {
        self.solver.time_limit_ms = ms;
        self
    }

    pub fn with_max_steps(mut self, steps: u64) -> Self {
        self.solver.max_steps = steps;
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<()> {
        self.expansion.validate()?;
        self.lunch_window.validate()?;
        Ok(())
    }
}
