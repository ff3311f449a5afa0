//! Exhaustive depth-first reference solver.

use super::model::{Constraint, CpModel};
use super::solver::{Budget, CpSolution, CpSolver, Interrupt, SolverConfig, SolverStatus};
use super::variables::Literal;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

/// A small exact solver for boolean models, for tests and tiny rosters.
///
/// Branches over every `ExactlyOne` group (choosing its true member) and
/// over every remaining free variable, checks conflicts incrementally,
/// then evaluates the equality definitions in model order. With an
/// objective it bounds each branch by the cheapest possible completion.
///
/// # Limitations
///
/// - Exponential in the number of groups; not a general SAT/ILP engine
/// - `ExactlyOne` groups must be disjoint and contain no fixed or defined
///   variables
/// - `Conflict` may only relate branch variables (not defined ones)
#[derive(Debug, Clone, Copy, Default)]
pub struct ExhaustiveSolver;

impl ExhaustiveSolver {
    pub fn new() -> Self {
        Self
    }
}

impl CpSolver for ExhaustiveSolver {
    fn solve_with_cancel(
        &self,
        model: &CpModel,
        config: &SolverConfig,
        cancel: Option<Arc<AtomicBool>>,
    ) -> CpSolution {
        let budget = Budget::from_config(config, cancel);
        let layout = match Layout::new(model) {
            Ok(layout) => layout,
            Err(reason) => {
                log::warn!("model '{}' rejected: {reason}", model.name);
                return CpSolution::empty(SolverStatus::ModelInvalid);
            }
        };
        let has_objective = layout.has_objective;
        let mut search = Search::new(layout);
        let mut best: Option<(i64, Vec<bool>)> = None;

        let status = loop {
            let bound = if has_objective {
                best.as_ref().map(|(cost, _)| *cost)
            } else {
                None
            };
            match search.advance(bound, &budget) {
                Step::Leaf(cost) => {
                    if best.as_ref().is_none_or(|(b, _)| cost < *b) {
                        best = Some((cost, search.values.clone()));
                    }
                    if !has_objective {
                        break SolverStatus::Optimal;
                    }
                    if config.stop_after_first {
                        break SolverStatus::Feasible;
                    }
                }
                Step::Exhausted => {
                    break if best.is_some() {
                        SolverStatus::Optimal
                    } else {
                        SolverStatus::Infeasible
                    };
                }
                Step::Interrupted(reason) => {
                    log::warn!("search of '{}' interrupted: {reason:?}", model.name);
                    break if best.is_some() {
                        SolverStatus::Feasible
                    } else {
                        reason.status()
                    };
                }
            }
        };

        let (objective_value, values) = match best {
            Some((cost, values)) => (has_objective.then_some(cost), values),
            None => (None, Vec::new()),
        };
        CpSolution {
            status,
            objective_value,
            values,
            steps: search.steps,
            solve_time_ms: budget.elapsed_ms(),
        }
    }

    fn enumerate(
        &self,
        model: &CpModel,
        config: &SolverConfig,
    ) -> Box<dyn Iterator<Item = CpSolution> + Send> {
        let budget = Budget::from_config(config, None);
        match Layout::new(model) {
            Ok(layout) => Box::new(SolutionIter {
                search: Search::new(layout),
                budget,
                done: false,
            }),
            Err(reason) => {
                log::warn!("model '{}' rejected: {reason}", model.name);
                Box::new(std::iter::once(CpSolution::empty(SolverStatus::ModelInvalid)))
            }
        }
    }
}

/// Lazy stream of every satisfying assignment.
struct SolutionIter {
    search: Search,
    budget: Budget,
    done: bool,
}

impl Iterator for SolutionIter {
    type Item = CpSolution;

    fn next(&mut self) -> Option<CpSolution> {
        if self.done {
            return None;
        }
        match self.search.advance(None, &self.budget) {
            Step::Leaf(cost) => Some(CpSolution {
                status: SolverStatus::Feasible,
                objective_value: self.search.layout.has_objective.then_some(cost),
                values: self.search.values.clone(),
                steps: self.search.steps,
                solve_time_ms: self.budget.elapsed_ms(),
            }),
            Step::Exhausted => {
                self.done = true;
                None
            }
            Step::Interrupted(reason) => {
                self.done = true;
                let mut last = CpSolution::empty(reason.status());
                last.steps = self.search.steps;
                last.solve_time_ms = self.budget.elapsed_ms();
                Some(last)
            }
        }
    }
}

/// One decision level of the search tree.
#[derive(Debug, Clone)]
enum Branch {
    /// Choose which member of an exactly-one group is true.
    Group(Vec<usize>),
    /// Choose false, then true, for an otherwise unconstrained variable.
    Free(usize),
}

impl Branch {
    fn options(&self) -> usize {
        match self {
            Branch::Group(members) => members.len(),
            Branch::Free(_) => 2,
        }
    }
}

#[derive(Debug, Clone)]
struct Definition {
    target: usize,
    literals: Vec<Literal>,
    conjunction: bool,
}

/// Solver-side view of a model, precomputed once per solve.
#[derive(Debug, Clone)]
struct Layout {
    var_count: usize,
    fixed: Vec<Option<bool>>,
    branches: Vec<Branch>,
    conflicts: Vec<Vec<usize>>,
    definitions: Vec<Definition>,
    weights: Vec<i64>,
    has_objective: bool,
    /// Objective contribution of fixed-true variables.
    constant: i64,
    /// Lowest possible contribution of all defined variables.
    defined_min: i64,
    /// `suffix_min[d]`: lowest possible contribution of branches `d..`.
    suffix_min: Vec<i64>,
}

impl Layout {
    fn new(model: &CpModel) -> Result<Self, String> {
        model.validate().map_err(|e| e.to_string())?;

        let n = model.var_count();
        let fixed: Vec<Option<bool>> = model.bool_vars.iter().map(|v| v.fixed).collect();
        let mut role = vec![Role::Free; n];
        let mut branches = Vec::new();
        let mut conflicts = vec![Vec::new(); n];
        let mut definitions = Vec::new();

        for (i, value) in fixed.iter().enumerate() {
            if value.is_some() {
                role[i] = Role::Fixed;
            }
        }
        for constraint in &model.constraints {
            if let Some(target) = constraint.target() {
                role[target.index()] = Role::Defined;
            }
        }

        for constraint in &model.constraints {
            match constraint {
                Constraint::ExactlyOne { vars } => {
                    let mut members = Vec::with_capacity(vars.len());
                    for var in vars {
                        let i = var.index();
                        if role[i] != Role::Free {
                            return Err(format!(
                                "'{}' cannot join an exactly-one group ({:?})",
                                model.bool_vars[i].name, role[i]
                            ));
                        }
                        role[i] = Role::Grouped;
                        members.push(i);
                    }
                    branches.push(Branch::Group(members));
                }
                Constraint::Conflict { a, b } => {
                    let (a, b) = (a.index(), b.index());
                    if role[a] == Role::Defined || role[b] == Role::Defined {
                        return Err("conflicts on defined variables are not supported".into());
                    }
                    conflicts[a].push(b);
                    conflicts[b].push(a);
                }
                Constraint::OrEquality { target, literals } => definitions.push(Definition {
                    target: target.index(),
                    literals: literals.clone(),
                    conjunction: false,
                }),
                Constraint::AndEquality { target, literals } => definitions.push(Definition {
                    target: target.index(),
                    literals: literals.clone(),
                    conjunction: true,
                }),
            }
        }
        for (i, r) in role.iter().enumerate() {
            if *r == Role::Free {
                branches.push(Branch::Free(i));
            }
        }

        let mut weights = vec![0i64; n];
        if let Some(objective) = &model.objective {
            for (var, weight) in &objective.terms {
                weights[var.index()] += weight;
            }
        }

        let constant = (0..n)
            .filter(|&i| fixed[i] == Some(true))
            .map(|i| weights[i])
            .sum();
        let defined_min = definitions
            .iter()
            .map(|d| weights[d.target].min(0))
            .sum();
        let mut suffix_min = vec![0i64; branches.len() + 1];
        for (d, branch) in branches.iter().enumerate().rev() {
            let cheapest = match branch {
                Branch::Group(members) => members.iter().map(|&m| weights[m]).min().unwrap_or(0),
                Branch::Free(v) => weights[*v].min(0),
            };
            suffix_min[d] = suffix_min[d + 1] + cheapest;
        }

        Ok(Self {
            var_count: n,
            fixed,
            branches,
            conflicts,
            definitions,
            weights,
            has_objective: model.objective.is_some(),
            constant,
            defined_min,
            suffix_min,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Role {
    Free,
    Fixed,
    Defined,
    Grouped,
}

enum Step {
    Leaf(i64),
    Exhausted,
    Interrupted(Interrupt),
}

/// Depth-first search state with an explicit cursor per level.
struct Search {
    layout: Layout,
    values: Vec<bool>,
    assigned: Vec<bool>,
    /// Next option to try at each depth.
    cursor: Vec<usize>,
    /// Objective contribution of branches `..d`.
    partial: Vec<i64>,
    depth: usize,
    pending_backtrack: bool,
    steps: u64,
}

impl Search {
    fn new(layout: Layout) -> Self {
        let n = layout.var_count;
        let mut values = vec![false; n];
        let mut assigned = vec![false; n];
        for (i, value) in layout.fixed.iter().enumerate() {
            if let Some(v) = value {
                values[i] = *v;
                assigned[i] = true;
            }
        }
        let depth_count = layout.branches.len();
        Self {
            layout,
            values,
            assigned,
            cursor: vec![0; depth_count + 1],
            partial: vec![0; depth_count + 1],
            depth: 0,
            pending_backtrack: false,
            steps: 0,
        }
    }

    /// Runs until the next complete assignment, exhaustion or interrupt.
    ///
    /// With a `bound`, branches whose best completion cannot beat it are
    /// skipped.
    fn advance(&mut self, bound: Option<i64>, budget: &Budget) -> Step {
        let n = self.layout.branches.len();
        loop {
            if self.pending_backtrack {
                self.pending_backtrack = false;
                if !self.pop() {
                    return Step::Exhausted;
                }
            }
            if self.depth == n {
                self.pending_backtrack = true;
                return Step::Leaf(self.evaluate_leaf());
            }

            let d = self.depth;
            let k = self.cursor[d];
            if k >= self.layout.branches[d].options() {
                if !self.pop() {
                    return Step::Exhausted;
                }
                continue;
            }
            self.cursor[d] += 1;

            self.steps += 1;
            if let Some(reason) = budget.check(self.steps) {
                return Step::Interrupted(reason);
            }

            if !self.apply(d, k) {
                continue;
            }
            if let Some(bound) = bound {
                let lower = self.partial[d + 1]
                    + self.layout.suffix_min[d + 1]
                    + self.layout.defined_min
                    + self.layout.constant;
                if lower >= bound {
                    self.undo(d);
                    continue;
                }
            }
            self.depth += 1;
            self.cursor[self.depth] = 0;
        }
    }

    /// Leaves the current depth; `false` once the root is exhausted.
    fn pop(&mut self) -> bool {
        if self.depth == 0 {
            return false;
        }
        self.depth -= 1;
        self.undo(self.depth);
        true
    }

    fn conflicts_with_true(&self, var: usize) -> bool {
        self.layout.conflicts[var]
            .iter()
            .any(|&other| self.assigned[other] && self.values[other])
    }

    fn apply(&mut self, d: usize, k: usize) -> bool {
        let cost = match &self.layout.branches[d] {
            Branch::Group(members) => {
                let chosen = members[k];
                if self.conflicts_with_true(chosen) {
                    return false;
                }
                for &m in members {
                    self.values[m] = m == chosen;
                    self.assigned[m] = true;
                }
                self.layout.weights[chosen]
            }
            Branch::Free(v) => {
                let v = *v;
                let value = k == 1;
                if value && self.conflicts_with_true(v) {
                    return false;
                }
                self.values[v] = value;
                self.assigned[v] = true;
                if value {
                    self.layout.weights[v]
                } else {
                    0
                }
            }
        };
        self.partial[d + 1] = self.partial[d] + cost;
        true
    }

    fn undo(&mut self, d: usize) {
        match &self.layout.branches[d] {
            Branch::Group(members) => {
                for &m in members {
                    self.values[m] = false;
                    self.assigned[m] = false;
                }
            }
            Branch::Free(v) => {
                self.values[*v] = false;
                self.assigned[*v] = false;
            }
        }
    }

    /// Settles every defined variable and returns the objective value.
    fn evaluate_leaf(&mut self) -> i64 {
        let mut cost = self.partial[self.layout.branches.len()] + self.layout.constant;
        for def in &self.layout.definitions {
            let mut lits = def.literals.iter().map(|l| l.eval(self.values[l.var.index()]));
            let value = if def.conjunction {
                lits.all(|b| b)
            } else {
                lits.any(|b| b)
            };
            self.values[def.target] = value;
            if value {
                cost += self.layout.weights[def.target];
            }
        }
        cost
    }
}
